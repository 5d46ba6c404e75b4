/// Buffer - Vulkan buffer with its gpu-allocator memory
///
/// `Buffer` is the owning wrapper used for every buffer the backend creates
/// (device-local targets, staging and read-back buffers). `DeviceBuffer` is
/// the uploaded resource handed to the application through the engine's
/// `Buffer` trait.

use orrery_engine::orrery::{Error, Result};
use orrery_engine::orrery::render::{Buffer as RendererBuffer, BufferUsage};
use orrery_engine::{engine_error, engine_fail};
use ash::vk;
use gpu_allocator::vulkan::{Allocation, AllocationCreateDesc, AllocationScheme};
use gpu_allocator::MemoryLocation;
use std::sync::Arc;

use crate::vulkan_context::GpuContext;

/// Owned VkBuffer plus its memory
pub struct Buffer {
    /// Vulkan buffer
    buffer: vk::Buffer,
    /// GPU memory allocation (taken on drop)
    allocation: Option<Allocation>,
    /// Requested size in bytes
    size: u64,
    /// Declared last: the device outlives the handle above
    ctx: Arc<GpuContext>,
}

impl Buffer {
    /// Create a buffer and bind freshly allocated memory to it
    ///
    /// # Arguments
    ///
    /// * `ctx` - Shared GPU context
    /// * `size` - Size in bytes (must be non-zero)
    /// * `usage` - Vulkan usage flags
    /// * `location` - Memory location (GpuOnly, CpuToGpu, GpuToCpu)
    /// * `name` - Allocation name for allocator diagnostics
    pub fn new(
        ctx: Arc<GpuContext>,
        size: u64,
        usage: vk::BufferUsageFlags,
        location: MemoryLocation,
        name: &str,
    ) -> Result<Self> {
        let device = ctx.device();

        let buffer_create_info = vk::BufferCreateInfo::default()
            .size(size)
            .usage(usage)
            .sharing_mode(vk::SharingMode::EXCLUSIVE);

        let buffer = unsafe { device.create_buffer(&buffer_create_info, None) }
            .map_err(|e| engine_fail!("orrery::vulkan", ResourceAllocationFailed, "vkCreateBuffer", e))?;

        let requirements = unsafe { device.get_buffer_memory_requirements(buffer) };

        let allocation = ctx.allocator().and_then(|mut allocator| {
            allocator
                .allocate(&AllocationCreateDesc {
                    name,
                    requirements,
                    location,
                    linear: true,
                    allocation_scheme: AllocationScheme::GpuAllocatorManaged,
                })
                .map_err(|e| {
                    let size_mb = requirements.size as f64 / (1024.0 * 1024.0);
                    engine_error!("orrery::vulkan", "Out of GPU memory for buffer '{}' ({:.2} MB)", name, size_mb);
                    Error::ResourceAllocationFailed {
                        operation: "gpu_allocator::allocate".to_string(),
                        status: format!("{:?}", e),
                    }
                })
        });

        let allocation = match allocation {
            Ok(allocation) => allocation,
            Err(e) => {
                unsafe { device.destroy_buffer(buffer, None) };
                return Err(e);
            }
        };

        if let Err(e) = unsafe { device.bind_buffer_memory(buffer, allocation.memory(), allocation.offset()) } {
            if let Ok(mut allocator) = ctx.allocator() {
                allocator.free(allocation).ok();
            }
            unsafe { device.destroy_buffer(buffer, None) };
            return Err(engine_fail!("orrery::vulkan", ResourceAllocationFailed, "vkBindBufferMemory", e));
        }

        Ok(Self {
            buffer,
            allocation: Some(allocation),
            size,
            ctx,
        })
    }

    /// Raw handle
    pub fn handle(&self) -> vk::Buffer {
        self.buffer
    }

    /// Requested size in bytes
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Host view of the memory, limited to the requested size
    ///
    /// Fails with `MapFailed` if the memory is not host visible.
    pub fn mapped_slice_mut(&mut self) -> Result<&mut [u8]> {
        let size = self.size as usize;
        self.allocation
            .as_mut()
            .and_then(|allocation| allocation.mapped_slice_mut())
            .map(|slice| &mut slice[..size])
            .ok_or_else(|| map_failed("write"))
    }

    /// Read-only host view of the memory, limited to the requested size
    pub fn mapped_slice(&self) -> Result<&[u8]> {
        let size = self.size as usize;
        self.allocation
            .as_ref()
            .and_then(|allocation| allocation.mapped_slice())
            .map(|slice| &slice[..size])
            .ok_or_else(|| map_failed("read"))
    }
}

fn map_failed(access: &str) -> Error {
    let error = Error::MapFailed {
        operation: format!("map buffer for {}", access),
        status: "allocation is not host visible".to_string(),
    };
    engine_error!("orrery::vulkan", "{}", error);
    error
}

impl Drop for Buffer {
    fn drop(&mut self) {
        unsafe {
            // Free GPU memory
            if let Some(allocation) = self.allocation.take() {
                // Don't panic if lock fails - we still need to destroy the buffer
                if let Ok(mut allocator) = self.ctx.allocator() {
                    allocator.free(allocation).ok();
                }
            }

            self.ctx.device().destroy_buffer(self.buffer, None);
        }
    }
}

/// Uploaded device-local buffer
pub struct DeviceBuffer {
    buffer: Buffer,
    usage: BufferUsage,
}

impl DeviceBuffer {
    pub(crate) fn new(buffer: Buffer, usage: BufferUsage) -> Self {
        Self { buffer, usage }
    }

    /// Raw handle (for binding as vertex/index/uniform/storage buffer)
    pub fn handle(&self) -> vk::Buffer {
        self.buffer.handle()
    }
}

impl RendererBuffer for DeviceBuffer {
    fn size(&self) -> u64 {
        self.buffer.size()
    }

    fn usage(&self) -> BufferUsage {
        self.usage
    }
}

/// Vulkan usage flags for a device-local buffer of the given engine usage
///
/// Device-local buffers are always transfer targets (upload) and transfer
/// sources (read-back).
pub fn buffer_usage_to_vk(usage: BufferUsage) -> vk::BufferUsageFlags {
    let usage_flags = match usage {
        BufferUsage::Vertex => vk::BufferUsageFlags::VERTEX_BUFFER,
        BufferUsage::Index => vk::BufferUsageFlags::INDEX_BUFFER,
        BufferUsage::Uniform => vk::BufferUsageFlags::UNIFORM_BUFFER,
        BufferUsage::Storage => vk::BufferUsageFlags::STORAGE_BUFFER,
    };
    usage_flags | vk::BufferUsageFlags::TRANSFER_DST | vk::BufferUsageFlags::TRANSFER_SRC
}
