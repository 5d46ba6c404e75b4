/// Framebuffer size query used when the surface leaves the extent to the application

use winit::window::Window;

/// Source of the live framebuffer size in pixels
///
/// Swapchain creation falls back to this size when the surface reports an
/// undefined current extent (some window systems do).
pub trait FramebufferSource: Send + Sync {
    /// Current framebuffer size as (width, height) in physical pixels
    fn framebuffer_size(&self) -> (u32, u32);
}

impl FramebufferSource for Window {
    fn framebuffer_size(&self) -> (u32, u32) {
        let size = self.inner_size();
        (size.width, size.height)
    }
}
