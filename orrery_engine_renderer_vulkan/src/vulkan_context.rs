/// GpuContext - Shared device state for all Vulkan objects
///
/// Contains everything needed for GPU operations:
/// - Device for Vulkan API calls
/// - Allocator for memory management
/// - Graphics and present queues with their family indices
/// - The instance context it was created from
///
/// Every resource holds an `Arc<GpuContext>`, so the device is destroyed only
/// after the last buffer, texture and swapchain is gone.

use orrery_engine::orrery::Result;
use orrery_engine::orrery::render::Config;
use orrery_engine::{engine_err, engine_fail};
use ash::vk;
use gpu_allocator::vulkan::{Allocator, AllocatorCreateDesc};
use std::mem::ManuallyDrop;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::vulkan_device_selector::{select_device, AdapterReport};
use crate::vulkan_instance::InstanceContext;
use crate::vulkan_queue_families::{create_logical_device, negotiate_queue_families, QueueFamilyAssignment};

/// Shared device context
pub struct GpuContext {
    /// Vulkan logical device
    device: ash::Device,

    /// Selected physical device
    physical_device: vk::PhysicalDevice,

    /// Report of the selected adapter
    adapter: AdapterReport,

    /// GPU memory allocator
    /// Wrapped in ManuallyDrop so its memory blocks are freed BEFORE the device is destroyed
    allocator: ManuallyDrop<Mutex<Allocator>>,

    /// Negotiated queue families
    queue_families: QueueFamilyAssignment,

    /// Graphics queue (uploads and rendering)
    graphics_queue: vk::Queue,

    /// Present queue (may alias the graphics queue)
    present_queue: vk::Queue,

    /// Declared last: the instance, surface and window outlive the device
    instance: Arc<InstanceContext>,
}

impl GpuContext {
    /// Select an adapter, negotiate queues, create the logical device and the allocator
    pub fn new(instance: Arc<InstanceContext>, config: &Config) -> Result<Self> {
        let selected = select_device(&instance, config.min_api_version)?;
        let queue_families = negotiate_queue_families(&selected.report.queue_families)?;
        let logical = create_logical_device(instance.instance(), selected.physical_device, queue_families)?;

        let allocator = Allocator::new(&AllocatorCreateDesc {
            instance: instance.instance().clone(),
            device: logical.device.clone(),
            physical_device: selected.physical_device,
            debug_settings: Default::default(),
            buffer_device_address: false,
            allocation_sizes: Default::default(),
        });

        let allocator = match allocator {
            Ok(allocator) => allocator,
            Err(e) => {
                unsafe { logical.device.destroy_device(None) };
                return Err(engine_fail!("orrery::vulkan", DeviceCreationFailed, "gpu_allocator::Allocator::new", e));
            }
        };

        Ok(Self {
            device: logical.device,
            physical_device: selected.physical_device,
            adapter: selected.report,
            allocator: ManuallyDrop::new(Mutex::new(allocator)),
            queue_families,
            graphics_queue: logical.graphics_queue,
            present_queue: logical.present_queue,
            instance,
        })
    }

    /// Vulkan logical device
    pub fn device(&self) -> &ash::Device {
        &self.device
    }

    /// Instance context (instance, surface, window)
    pub fn instance(&self) -> &InstanceContext {
        &self.instance
    }

    pub fn physical_device(&self) -> vk::PhysicalDevice {
        self.physical_device
    }

    /// Report of the selected adapter (name, API version, class)
    pub fn adapter(&self) -> &AdapterReport {
        &self.adapter
    }

    pub fn queue_families(&self) -> QueueFamilyAssignment {
        self.queue_families
    }

    pub fn graphics_queue(&self) -> vk::Queue {
        self.graphics_queue
    }

    pub fn present_queue(&self) -> vk::Queue {
        self.present_queue
    }

    /// Lock the allocator
    pub fn allocator(&self) -> Result<MutexGuard<'_, Allocator>> {
        self.allocator
            .lock()
            .map_err(|_| engine_err!("orrery::vulkan", "GPU allocator mutex is poisoned"))
    }

    /// Format features of the selected adapter
    pub fn format_properties(&self, format: vk::Format) -> vk::FormatProperties {
        unsafe {
            self.instance
                .instance()
                .get_physical_device_format_properties(self.physical_device, format)
        }
    }

    /// Block until the device is idle
    pub fn wait_idle(&self) -> Result<()> {
        unsafe { self.device.device_wait_idle() }
            .map_err(|e| engine_fail!("orrery::vulkan", FenceWaitFailed, "vkDeviceWaitIdle", e))
    }
}

impl Drop for GpuContext {
    fn drop(&mut self) {
        unsafe {
            self.device.device_wait_idle().ok();

            // Free allocator memory blocks while the device is still alive
            ManuallyDrop::drop(&mut self.allocator);

            self.device.destroy_device(None);
        }
    }
}
