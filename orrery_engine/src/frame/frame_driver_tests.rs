//! Unit tests for FrameDriver
//!
//! Uses MockSwapchain to script acquire/present results.

use crate::error::Error;
use crate::frame::{FrameDriver, FrameOutcome};
use crate::graphics_device::mock_graphics_device::MockSwapchain;
use crate::graphics_device::{AcquireResult, PresentResult, SwapchainChanges};

fn ok_render(_swapchain: &mut MockSwapchain, _index: u32) -> crate::error::Result<()> {
    Ok(())
}

// ============================================================================
// STEADY STATE
// ============================================================================

#[test]
fn test_frames_present_in_order() {
    let mut swapchain = MockSwapchain::new(3, (800, 600));
    let mut driver = FrameDriver::new();

    for expected in [0, 1, 2, 0] {
        let outcome = driver.run_frame(&mut swapchain, ok_render).unwrap();
        assert_eq!(outcome, FrameOutcome::Presented { image_index: expected });
    }

    assert_eq!(swapchain.present_calls, vec![0, 1, 2, 0]);
    assert_eq!(swapchain.recreate_calls, 0);
    assert_eq!(driver.frames_presented(), 4);
}

#[test]
fn test_render_receives_acquired_index() {
    let mut swapchain = MockSwapchain::new(2, (800, 600));
    swapchain.acquire_script.push_back(Ok(AcquireResult::Ready(1)));
    let mut driver = FrameDriver::new();

    let mut seen = None;
    driver
        .run_frame(&mut swapchain, |_, index| {
            seen = Some(index);
            Ok(())
        })
        .unwrap();

    assert_eq!(seen, Some(1));
}

// ============================================================================
// RECREATION TRIGGERS
// ============================================================================

#[test]
fn test_suboptimal_present_triggers_exactly_one_recreation() {
    let mut swapchain = MockSwapchain::new(2, (800, 600));
    swapchain.present_script.push_back(Ok(PresentResult::Suboptimal));
    let mut driver = FrameDriver::new();
    let mut render_calls = 0;

    // Frame 1: presented, but the chain is stale
    let outcome = driver
        .run_frame(&mut swapchain, |_, _| {
            render_calls += 1;
            Ok(())
        })
        .unwrap();
    assert_eq!(outcome, FrameOutcome::Presented { image_index: 0 });
    assert!(driver.recreate_pending());

    // Frame 2: recreation only, no acquire
    let outcome = driver
        .run_frame(&mut swapchain, |_, _| {
            render_calls += 1;
            Ok(())
        })
        .unwrap();
    assert_eq!(outcome, FrameOutcome::Recreated(SwapchainChanges::default()));
    assert!(!driver.recreate_pending());

    // Frame 3: back to normal
    let outcome = driver
        .run_frame(&mut swapchain, |_, _| {
            render_calls += 1;
            Ok(())
        })
        .unwrap();
    assert!(matches!(outcome, FrameOutcome::Presented { .. }));

    assert_eq!(swapchain.recreate_calls, 1);
    assert_eq!(driver.recreations(), 1);
    // Each rendered frame was presented exactly once, none were retried
    assert_eq!(render_calls, 2);
    assert_eq!(swapchain.present_calls.len(), 2);
    assert_eq!(swapchain.acquire_calls, 2);
}

#[test]
fn test_out_of_date_acquire_skips_frame() {
    let mut swapchain = MockSwapchain::new(2, (800, 600));
    swapchain.acquire_script.push_back(Ok(AcquireResult::OutOfDate));
    let mut driver = FrameDriver::new();

    let outcome = driver
        .run_frame(&mut swapchain, |_, _| panic!("must not render a stale frame"))
        .unwrap();

    assert_eq!(outcome, FrameOutcome::Skipped);
    assert!(driver.recreate_pending());
    assert!(swapchain.present_calls.is_empty());
}

#[test]
fn test_suboptimal_acquire_abandons_frame() {
    let mut swapchain = MockSwapchain::new(2, (800, 600));
    swapchain.acquire_script.push_back(Ok(AcquireResult::Suboptimal(1)));
    let mut driver = FrameDriver::new();

    assert_eq!(driver.run_frame(&mut swapchain, ok_render).unwrap(), FrameOutcome::Skipped);
    assert!(swapchain.present_calls.is_empty());

    let outcome = driver.run_frame(&mut swapchain, ok_render).unwrap();
    assert!(matches!(outcome, FrameOutcome::Recreated(_)));
    assert_eq!(swapchain.recreate_calls, 1);
}

#[test]
fn test_out_of_date_present_sets_pending() {
    let mut swapchain = MockSwapchain::new(2, (800, 600));
    swapchain.present_script.push_back(Ok(PresentResult::OutOfDate));
    let mut driver = FrameDriver::new();

    driver.run_frame(&mut swapchain, ok_render).unwrap();
    assert!(driver.recreate_pending());
}

#[test]
fn test_request_recreate_reports_changes() {
    let mut swapchain = MockSwapchain::new(2, (800, 600));
    let changes = SwapchainChanges { changed_format: false, changed_size: true };
    swapchain.recreate_script.push_back(Ok(changes));
    let mut driver = FrameDriver::new();

    driver.request_recreate();
    assert_eq!(
        driver.run_frame(&mut swapchain, ok_render).unwrap(),
        FrameOutcome::Recreated(changes)
    );
}

// ============================================================================
// HARD ERRORS
// ============================================================================

#[test]
fn test_hard_acquire_error_propagates() {
    let mut swapchain = MockSwapchain::new(2, (800, 600));
    let error = Error::PresentationFailed {
        operation: "vkAcquireNextImageKHR".to_string(),
        status: "ERROR_DEVICE_LOST".to_string(),
    };
    swapchain.acquire_script.push_back(Err(error.clone()));
    let mut driver = FrameDriver::new();

    assert_eq!(driver.run_frame(&mut swapchain, ok_render), Err(error));
    assert!(!driver.recreate_pending());
}

#[test]
fn test_failed_recreation_stays_pending() {
    let mut swapchain = MockSwapchain::new(2, (800, 600));
    let error = Error::SwapchainCreationFailed {
        operation: "vkCreateSwapchainKHR".to_string(),
        status: "ERROR_NATIVE_WINDOW_IN_USE_KHR".to_string(),
    };
    swapchain.recreate_script.push_back(Err(error.clone()));
    let mut driver = FrameDriver::new();
    driver.request_recreate();

    assert_eq!(driver.run_frame(&mut swapchain, ok_render), Err(error));
    assert!(driver.recreate_pending());
    assert_eq!(driver.recreations(), 0);
}

#[test]
fn test_render_error_skips_present() {
    let mut swapchain = MockSwapchain::new(2, (800, 600));
    let mut driver = FrameDriver::new();

    let result = driver.run_frame(&mut swapchain, |_, _| {
        Err(Error::SubmitFailed {
            operation: "vkQueueSubmit".to_string(),
            status: "ERROR_DEVICE_LOST".to_string(),
        })
    });

    assert!(matches!(result, Err(Error::SubmitFailed { .. })));
    assert!(swapchain.present_calls.is_empty());
    assert_eq!(driver.frames_presented(), 0);
}

// ============================================================================
// MINIMIZED SURFACE
// ============================================================================

#[test]
fn test_minimized_surface_postpones_recreation() {
    let mut swapchain = MockSwapchain::new(2, (800, 600));
    swapchain.recreate_script.push_back(Err(Error::SurfaceMinimized));
    swapchain.recreate_script.push_back(Err(Error::SurfaceMinimized));
    let mut driver = FrameDriver::new();
    driver.request_recreate();

    for _ in 0..2 {
        assert_eq!(driver.run_frame(&mut swapchain, ok_render), Ok(FrameOutcome::Skipped));
        assert!(driver.recreate_pending());
    }
    assert_eq!(driver.recreations(), 0);
    assert!(swapchain.present_calls.is_empty());

    // Window restored: the postponed recreation now runs, then frames resume
    let outcome = driver.run_frame(&mut swapchain, ok_render).unwrap();
    assert_eq!(outcome, FrameOutcome::Recreated(SwapchainChanges::default()));
    assert_eq!(swapchain.recreate_calls, 3);
    assert!(!driver.recreate_pending());

    let outcome = driver.run_frame(&mut swapchain, ok_render).unwrap();
    assert!(matches!(outcome, FrameOutcome::Presented { .. }));
}
