/// Texture - Vulkan implementation of the engine Texture trait

use orrery_engine::orrery::{Error, Result};
use orrery_engine::orrery::render::{Texture as RendererTexture, TextureInfo};
use orrery_engine::{engine_error, engine_fail};
use ash::vk;
use gpu_allocator::vulkan::{Allocation, AllocationCreateDesc, AllocationScheme};
use gpu_allocator::MemoryLocation;
use std::sync::Arc;

use crate::vulkan_context::GpuContext;

/// Vulkan texture implementation
pub struct Texture {
    /// Vulkan image
    image: vk::Image,
    /// Image view covering every mip level
    view: vk::ImageView,
    /// GPU memory allocation (taken on drop)
    allocation: Option<Allocation>,
    /// Read-only texture properties
    info: TextureInfo,
    /// Declared last: the device outlives the handles above
    ctx: Arc<GpuContext>,
}

impl Texture {
    /// Create a device-local 2D image with `info.mip_levels` levels and a view over all of them
    ///
    /// The image starts in `UNDEFINED` layout.
    pub fn new(ctx: Arc<GpuContext>, info: TextureInfo, format: vk::Format, usage: vk::ImageUsageFlags) -> Result<Self> {
        let device = ctx.device();

        let image_create_info = vk::ImageCreateInfo::default()
            .image_type(vk::ImageType::TYPE_2D)
            .format(format)
            .extent(vk::Extent3D {
                width: info.width,
                height: info.height,
                depth: 1,
            })
            .mip_levels(info.mip_levels)
            .array_layers(1)
            .samples(vk::SampleCountFlags::TYPE_1)
            .tiling(vk::ImageTiling::OPTIMAL)
            .usage(usage)
            .sharing_mode(vk::SharingMode::EXCLUSIVE)
            .initial_layout(vk::ImageLayout::UNDEFINED);

        let image = unsafe { device.create_image(&image_create_info, None) }
            .map_err(|e| engine_fail!("orrery::vulkan", ResourceAllocationFailed, "vkCreateImage", e))?;

        let requirements = unsafe { device.get_image_memory_requirements(image) };

        let allocation = ctx.allocator().and_then(|mut allocator| {
            allocator
                .allocate(&AllocationCreateDesc {
                    name: "texture",
                    requirements,
                    location: MemoryLocation::GpuOnly,
                    linear: false,
                    allocation_scheme: AllocationScheme::GpuAllocatorManaged,
                })
                .map_err(|e| {
                    let size_mb = requirements.size as f64 / (1024.0 * 1024.0);
                    engine_error!(
                        "orrery::vulkan",
                        "Out of GPU memory for texture (size: {}x{}, {} levels, {:.2} MB)",
                        info.width, info.height, info.mip_levels, size_mb
                    );
                    Error::ResourceAllocationFailed {
                        operation: "gpu_allocator::allocate".to_string(),
                        status: format!("{:?}", e),
                    }
                })
        });

        let allocation = match allocation {
            Ok(allocation) => allocation,
            Err(e) => {
                unsafe { device.destroy_image(image, None) };
                return Err(e);
            }
        };

        let free_all = |allocation: Allocation| {
            if let Ok(mut allocator) = ctx.allocator() {
                allocator.free(allocation).ok();
            }
            unsafe { device.destroy_image(image, None) };
        };

        if let Err(e) = unsafe { device.bind_image_memory(image, allocation.memory(), allocation.offset()) } {
            free_all(allocation);
            return Err(engine_fail!("orrery::vulkan", ResourceAllocationFailed, "vkBindImageMemory", e));
        }

        let view_create_info = vk::ImageViewCreateInfo::default()
            .image(image)
            .view_type(vk::ImageViewType::TYPE_2D)
            .format(format)
            .components(vk::ComponentMapping {
                r: vk::ComponentSwizzle::IDENTITY,
                g: vk::ComponentSwizzle::IDENTITY,
                b: vk::ComponentSwizzle::IDENTITY,
                a: vk::ComponentSwizzle::IDENTITY,
            })
            .subresource_range(vk::ImageSubresourceRange {
                aspect_mask: vk::ImageAspectFlags::COLOR,
                base_mip_level: 0,
                level_count: info.mip_levels,
                base_array_layer: 0,
                layer_count: 1,
            });

        let view = match unsafe { device.create_image_view(&view_create_info, None) } {
            Ok(view) => view,
            Err(e) => {
                free_all(allocation);
                return Err(engine_fail!("orrery::vulkan", ResourceAllocationFailed, "vkCreateImageView", e));
            }
        };

        Ok(Self {
            image,
            view,
            allocation: Some(allocation),
            info,
            ctx,
        })
    }

    /// Raw image handle
    pub fn image(&self) -> vk::Image {
        self.image
    }

    /// View over all mip levels (for sampling)
    pub fn view(&self) -> vk::ImageView {
        self.view
    }
}

impl RendererTexture for Texture {
    fn info(&self) -> &TextureInfo {
        &self.info
    }
}

impl Drop for Texture {
    fn drop(&mut self) {
        unsafe {
            let device = self.ctx.device();

            // Destroy image view
            device.destroy_image_view(self.view, None);

            // Free GPU memory
            if let Some(allocation) = self.allocation.take() {
                if let Ok(mut allocator) = self.ctx.allocator() {
                    allocator.free(allocation).ok();
                }
            }

            // Destroy image
            device.destroy_image(self.image, None);
        }
    }
}
