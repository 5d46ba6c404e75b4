/// VulkanGraphicsDevice - Vulkan implementation of the GraphicsDevice trait

use orrery_engine::orrery::{GraphicsDevice, Result};
use orrery_engine::orrery::render::{
    Buffer as RendererBuffer, BufferUsage, Config, FramebufferSource, Texture as RendererTexture, TextureDesc,
};
use orrery_engine::engine_info;
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use std::sync::Arc;

use crate::vulkan_buffer::DeviceBuffer;
use crate::vulkan_context::GpuContext;
use crate::vulkan_device_selector::AdapterReport;
use crate::vulkan_instance::InstanceContext;
use crate::vulkan_swapchain::Swapchain;
use crate::vulkan_texture::Texture;
use crate::vulkan_upload::StagedUploader;

/// Vulkan device
///
/// Brings up the instance, surface, adapter, logical device and allocator for
/// one window, then serves staged uploads. Swapchains are created separately
/// and share the same context.
pub struct VulkanGraphicsDevice {
    /// Staged transfer engine
    uploader: StagedUploader,
    /// Shared device context (also held by every resource)
    ctx: Arc<GpuContext>,
    config: Config,
}

impl VulkanGraphicsDevice {
    /// Create a device presenting to `window`
    ///
    /// # Arguments
    ///
    /// * `window` - Window to present to; kept alive until the last resource is dropped
    /// * `config` - Device configuration (validation, app info, minimum API version)
    pub fn new<W>(window: Arc<W>, config: Config) -> Result<Self>
    where
        W: HasDisplayHandle + HasWindowHandle + FramebufferSource + 'static,
    {
        let instance = Arc::new(InstanceContext::new(window, &config)?);
        let ctx = Arc::new(GpuContext::new(instance, &config)?);

        engine_info!(
            "orrery::vulkan",
            "Graphics device ready on {} (graphics family {}, present family {})",
            ctx.adapter().name,
            ctx.queue_families().graphics,
            ctx.queue_families().present
        );

        Ok(Self {
            uploader: StagedUploader::new(Arc::clone(&ctx)),
            ctx,
            config,
        })
    }

    /// Create a swapchain for the device's window surface
    pub fn create_vulkan_swapchain(&self) -> Result<Swapchain> {
        Swapchain::new(Arc::clone(&self.ctx))
    }

    /// Shared device context
    pub fn context(&self) -> &Arc<GpuContext> {
        &self.ctx
    }

    /// Report of the selected adapter
    pub fn adapter(&self) -> &AdapterReport {
        self.ctx.adapter()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Upload a buffer and keep its concrete type (for binding and read-back)
    pub fn upload_vulkan_buffer(&self, usage: BufferUsage, data: &[u8]) -> Result<Arc<DeviceBuffer>> {
        self.uploader.upload_buffer(usage, data).map(Arc::new)
    }

    /// Upload a texture and keep its concrete type (for sampling)
    pub fn upload_vulkan_texture(&self, desc: &TextureDesc) -> Result<Arc<Texture>> {
        self.uploader.upload_texture(desc).map(Arc::new)
    }

    /// Copy a device buffer back to host memory
    pub fn read_back_buffer(&self, buffer: &DeviceBuffer) -> Result<Vec<u8>> {
        self.uploader.read_back_buffer(buffer)
    }
}

impl GraphicsDevice for VulkanGraphicsDevice {
    fn upload_buffer(&mut self, usage: BufferUsage, data: &[u8]) -> Result<Arc<dyn RendererBuffer>> {
        let buffer: Arc<dyn RendererBuffer> = self.upload_vulkan_buffer(usage, data)?;
        Ok(buffer)
    }

    fn upload_texture(&mut self, desc: TextureDesc) -> Result<Arc<dyn RendererTexture>> {
        let texture: Arc<dyn RendererTexture> = self.upload_vulkan_texture(&desc)?;
        Ok(texture)
    }

    fn wait_idle(&self) -> Result<()> {
        self.ctx.wait_idle()
    }
}
