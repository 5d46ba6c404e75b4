/// FrameDriver - acquire / render / present protocol with deferred recreation

use crate::error::Result;
use crate::graphics_device::{AcquireResult, Swapchain, SwapchainChanges};

/// What happened during one call to [`FrameDriver::run_frame`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// The image was rendered and queued for presentation
    Presented { image_index: u32 },
    /// No frame was rendered and a recreation is pending: either the chain
    /// was stale at acquire time or the surface is minimized
    Skipped,
    /// A pending recreation ran instead of a frame
    Recreated(SwapchainChanges),
}

/// Drives frames through a swapchain and owns the "recreation pending" flag
///
/// Suboptimal or out-of-date results never fail a frame: they set the flag,
/// and the next call rebuilds the chain before acquiring again. A frame is
/// never retried, so a stale present costs exactly one recreation.
///
/// # Example
///
/// ```no_run
/// # use orrery_engine::orrery::frame::{FrameDriver, FrameOutcome};
/// # use orrery_engine::orrery::render::Swapchain;
/// # fn demo(swapchain: &mut dyn Swapchain) -> orrery_engine::orrery::Result<()> {
/// let mut driver = FrameDriver::new();
/// loop {
///     match driver.run_frame(swapchain, |_swapchain, _image_index| Ok(()))? {
///         FrameOutcome::Recreated(changes) if changes.changed_size => { /* rebuild framebuffers */ }
///         _ => {}
///     }
/// #   break;
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct FrameDriver {
    recreate_pending: bool,
    frames_presented: u64,
    recreations: u64,
}

impl FrameDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask for a recreation before the next frame (window resized, etc.)
    pub fn request_recreate(&mut self) {
        self.recreate_pending = true;
    }

    /// True if the next `run_frame` will recreate the chain
    pub fn recreate_pending(&self) -> bool {
        self.recreate_pending
    }

    /// Number of frames queued for presentation so far
    pub fn frames_presented(&self) -> u64 {
        self.frames_presented
    }

    /// Number of recreations performed so far
    pub fn recreations(&self) -> u64 {
        self.recreations
    }

    /// Run one iteration of the presentation protocol
    ///
    /// `render` receives the swapchain and the acquired image index; it records
    /// and submits the frame's work. Hard errors from acquire, render, present
    /// or recreation are returned unchanged. A minimized surface skips the
    /// frame and keeps the recreation pending.
    pub fn run_frame<S, F>(&mut self, swapchain: &mut S, render: F) -> Result<FrameOutcome>
    where
        S: Swapchain + ?Sized,
        F: FnOnce(&mut S, u32) -> Result<()>,
    {
        if self.recreate_pending {
            let changes = match swapchain.recreate() {
                Ok(changes) => changes,
                Err(e) if e.is_transient() => {
                    crate::engine_trace!("orrery::frame", "Recreation postponed: {}", e);
                    return Ok(FrameOutcome::Skipped);
                }
                Err(e) => return Err(e),
            };
            self.recreate_pending = false;
            self.recreations += 1;
            crate::engine_info!(
                "orrery::frame",
                "Swapchain recreated ({}x{}, {} images, format changed: {}, size changed: {})",
                swapchain.width(),
                swapchain.height(),
                swapchain.image_count(),
                changes.changed_format,
                changes.changed_size
            );
            return Ok(FrameOutcome::Recreated(changes));
        }

        let image_index = match swapchain.acquire_next_image()? {
            AcquireResult::Ready(index) => index,
            stale => {
                crate::engine_debug!("orrery::frame", "Acquire returned {:?}, skipping frame", stale);
                self.recreate_pending = true;
                return Ok(FrameOutcome::Skipped);
            }
        };

        render(swapchain, image_index)?;

        let presented = swapchain.present(image_index)?;
        if presented.needs_recreate() {
            crate::engine_debug!("orrery::frame", "Present returned {:?}, recreation pending", presented);
            self.recreate_pending = true;
        }
        self.frames_presented += 1;

        Ok(FrameOutcome::Presented { image_index })
    }
}

#[cfg(test)]
#[path = "frame_driver_tests.rs"]
mod tests;
