/*!
# Orrery Engine - Vulkan Backend

Vulkan implementation of the Orrery device layer.

This crate brings up a Vulkan device for a window (adapter selection, queue
negotiation, logical device, allocator), manages the swapchain and its
recreation, and moves buffers and textures into device-local memory through
host-visible staging buffers. Bindings come from `ash`, memory from
`gpu-allocator`.

# Example

```no_run
use orrery_engine::orrery::render::{BufferUsage, Config};
use orrery_engine::orrery::GraphicsDevice;
use orrery_engine_renderer_vulkan::orrery::VulkanGraphicsDevice;
use std::sync::Arc;
# fn run(window: Arc<winit::window::Window>) -> orrery_engine::orrery::Result<()> {
let mut device = VulkanGraphicsDevice::new(window, Config::default())?;
let swapchain = device.create_vulkan_swapchain()?;
let vertices = device.upload_buffer(BufferUsage::Vertex, &[0u8; 64])?;
# Ok(())
# }
```
*/

mod vulkan;
mod vulkan_context;
mod vulkan_instance;
mod vulkan_device_selector;
mod vulkan_queue_families;
mod vulkan_swapchain;
mod vulkan_sync;
mod vulkan_buffer;
mod vulkan_texture;
mod vulkan_upload;
mod vulkan_mip_chain;
mod vulkan_format;
mod debug;

/// Public Vulkan backend namespace
pub mod orrery {
    pub use crate::vulkan::VulkanGraphicsDevice;
    pub use crate::vulkan_context::GpuContext;
    pub use crate::vulkan_instance::InstanceContext;
    pub use crate::vulkan_device_selector::{AdapterReport, QueueFamilyReport, Rejection};
    pub use crate::vulkan_queue_families::QueueFamilyAssignment;
    pub use crate::vulkan_swapchain::Swapchain as VulkanSwapchain;
    pub use crate::vulkan_buffer::DeviceBuffer as VulkanBuffer;
    pub use crate::vulkan_texture::Texture as VulkanTexture;
    pub use crate::vulkan_upload::StagedUploader;
}

// Re-export debug utilities
pub use debug::{get_validation_stats, print_validation_stats_report};
