/// Unit tests for MockGraphicsDevice and MockSwapchain.

use crate::error::Error;
use crate::graphics_device::mock_graphics_device::*;
use crate::graphics_device::{
    AcquireResult, BufferUsage, GraphicsDevice, MipmapMode, PresentResult, Swapchain,
    SwapchainChanges, TextureDesc, TextureFormat,
};

// ============================================================================
// MockGraphicsDevice Tests
// ============================================================================

#[test]
fn test_mock_device_records_buffer_upload() {
    let mut device = MockGraphicsDevice::new();
    let buffer = device.upload_buffer(BufferUsage::Vertex, &[1, 2, 3, 4]).unwrap();

    assert_eq!(buffer.size(), 4);
    assert_eq!(buffer.usage(), BufferUsage::Vertex);
    assert_eq!(device.buffer_uploads, vec![(BufferUsage::Vertex, vec![1, 2, 3, 4])]);
}

#[test]
fn test_mock_device_rejects_empty_buffer() {
    let mut device = MockGraphicsDevice::new();
    assert!(matches!(
        device.upload_buffer(BufferUsage::Index, &[]),
        Err(Error::InvalidResource(_))
    ));
}

#[test]
fn test_mock_device_texture_upload_reports_mip_levels() {
    let mut device = MockGraphicsDevice::new();
    let texture = device
        .upload_texture(TextureDesc {
            width: 512,
            height: 256,
            format: TextureFormat::R8G8B8A8_SRGB,
            mipmap: MipmapMode::Generate,
            data: vec![0; 512 * 256 * 4],
        })
        .unwrap();

    assert_eq!(texture.info().mip_levels, 10);
    assert_eq!(device.texture_uploads.len(), 1);
}

#[test]
fn test_mock_device_fail_next_upload() {
    let mut device = MockGraphicsDevice::new();
    device.fail_next_upload = Some(Error::NoSuitableDevice);

    assert_eq!(
        device.upload_buffer(BufferUsage::Uniform, &[0; 16]).err(),
        Some(Error::NoSuitableDevice)
    );
    assert!(device.upload_buffer(BufferUsage::Uniform, &[0; 16]).is_ok());
}

// ============================================================================
// MockSwapchain Tests
// ============================================================================

#[test]
fn test_mock_swapchain_default_playback() {
    let mut swapchain = MockSwapchain::new(3, (800, 600));

    let indices: Vec<AcquireResult> = (0..4)
        .map(|_| swapchain.acquire_next_image().unwrap())
        .collect();
    assert_eq!(
        indices,
        vec![
            AcquireResult::Ready(0),
            AcquireResult::Ready(1),
            AcquireResult::Ready(2),
            AcquireResult::Ready(0),
        ]
    );
    assert_eq!(swapchain.present(1).unwrap(), PresentResult::Presented);
    assert_eq!(swapchain.recreate().unwrap(), SwapchainChanges::default());
    assert_eq!(swapchain.image_count(), 3);
    assert_eq!((swapchain.width(), swapchain.height()), (800, 600));
}

#[test]
fn test_mock_swapchain_scripted_results() {
    let mut swapchain = MockSwapchain::new(2, (640, 480));
    swapchain.acquire_script.push_back(Ok(AcquireResult::OutOfDate));
    swapchain.present_script.push_back(Ok(PresentResult::Suboptimal));

    assert_eq!(swapchain.acquire_next_image().unwrap(), AcquireResult::OutOfDate);
    assert_eq!(swapchain.present(0).unwrap(), PresentResult::Suboptimal);
    assert_eq!(swapchain.present_calls, vec![0]);
}
