/// Swapchain trait - presentation boundary and recreation reporting

use crate::error::Result;
use crate::graphics_device::TextureFormat;

/// Result of acquiring the next presentable image
///
/// Suboptimal and out-of-date are not errors: they tell the caller that the
/// chain no longer matches the surface and must be recreated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquireResult {
    /// Image acquired, chain matches the surface
    Ready(u32),
    /// Image acquired, but the chain no longer matches the surface exactly
    Suboptimal(u32),
    /// No image acquired, the chain can no longer be used
    OutOfDate,
}

impl AcquireResult {
    /// True when the chain should be recreated
    pub fn needs_recreate(&self) -> bool {
        !matches!(self, AcquireResult::Ready(_))
    }
}

/// Result of presenting an image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresentResult {
    /// Queued for presentation
    Presented,
    /// Queued, but the chain no longer matches the surface exactly
    Suboptimal,
    /// The chain can no longer be used
    OutOfDate,
}

impl PresentResult {
    /// True when the chain should be recreated
    pub fn needs_recreate(&self) -> bool {
        !matches!(self, PresentResult::Presented)
    }
}

/// What changed across a swapchain recreation
///
/// Consumers use this to rebuild only what depends on the changed property
/// (render passes depend on the format, framebuffers and depth targets on the size).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SwapchainChanges {
    pub changed_format: bool,
    pub changed_size: bool,
}

impl SwapchainChanges {
    /// Compare the format and extent before and after a recreation
    pub fn between<F: PartialEq>(
        old_format: F,
        old_extent: (u32, u32),
        new_format: F,
        new_extent: (u32, u32),
    ) -> Self {
        Self {
            changed_format: old_format != new_format,
            changed_size: old_extent != new_extent,
        }
    }

    /// True if anything changed
    pub fn any(&self) -> bool {
        self.changed_format || self.changed_size
    }
}

/// Swapchain for presenting rendered images to a window
///
/// After `recreate`, every cached value (extent, format, image count, views)
/// must be re-read by the caller.
pub trait Swapchain: Send + Sync {
    /// Acquire the next presentable image, blocking until one is available
    fn acquire_next_image(&mut self) -> Result<AcquireResult>;

    /// Queue the image at `image_index` for presentation
    fn present(&mut self, image_index: u32) -> Result<PresentResult>;

    /// Rebuild the chain against the current surface state
    ///
    /// On failure the previous chain is kept and remains owned by the swapchain.
    fn recreate(&mut self) -> Result<SwapchainChanges>;

    /// Get the number of images in the swapchain
    fn image_count(&self) -> usize;

    /// Get the width of the swapchain images in pixels
    fn width(&self) -> u32;

    /// Get the height of the swapchain images in pixels
    fn height(&self) -> u32;

    /// Get the pixel format of the swapchain images
    fn format(&self) -> TextureFormat;
}

#[cfg(test)]
#[path = "swapchain_tests.rs"]
mod tests;
