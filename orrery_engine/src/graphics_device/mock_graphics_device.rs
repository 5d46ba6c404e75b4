/// Mock graphics device and swapchain for unit tests (no GPU required)
///
/// The mock device keeps uploaded bytes in host memory so callers can check
/// exactly what would have reached the GPU. The mock swapchain plays back
/// scripted acquire/present results to drive the frame protocol.

use std::collections::VecDeque;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::graphics_device::{
    AcquireResult, Buffer, BufferUsage, GraphicsDevice, PresentResult, Swapchain,
    SwapchainChanges, Texture, TextureDesc, TextureFormat, TextureInfo,
};

// ============================================================================
// Mock Buffer
// ============================================================================

#[derive(Debug)]
pub struct MockBuffer {
    pub usage: BufferUsage,
    pub data: Vec<u8>,
}

impl MockBuffer {
    pub fn new(usage: BufferUsage, data: Vec<u8>) -> Self {
        Self { usage, data }
    }
}

impl Buffer for MockBuffer {
    fn size(&self) -> u64 {
        self.data.len() as u64
    }

    fn usage(&self) -> BufferUsage {
        self.usage
    }
}

// ============================================================================
// Mock Texture
// ============================================================================

#[derive(Debug)]
pub struct MockTexture {
    pub info: TextureInfo,
}

impl Texture for MockTexture {
    fn info(&self) -> &TextureInfo {
        &self.info
    }
}

// ============================================================================
// Mock Graphics Device
// ============================================================================

/// Records every upload; can be told to fail the next one
#[derive(Default)]
pub struct MockGraphicsDevice {
    pub buffer_uploads: Vec<(BufferUsage, Vec<u8>)>,
    pub texture_uploads: Vec<TextureInfo>,
    pub fail_next_upload: Option<Error>,
    pub wait_idle_calls: usize,
}

impl MockGraphicsDevice {
    pub fn new() -> Self {
        Self::default()
    }
}

impl GraphicsDevice for MockGraphicsDevice {
    fn upload_buffer(&mut self, usage: BufferUsage, data: &[u8]) -> Result<Arc<dyn Buffer>> {
        if let Some(error) = self.fail_next_upload.take() {
            return Err(error);
        }
        if data.is_empty() {
            return Err(Error::InvalidResource("Cannot upload an empty buffer".to_string()));
        }
        self.buffer_uploads.push((usage, data.to_vec()));
        Ok(Arc::new(MockBuffer::new(usage, data.to_vec())))
    }

    fn upload_texture(&mut self, desc: TextureDesc) -> Result<Arc<dyn Texture>> {
        if let Some(error) = self.fail_next_upload.take() {
            return Err(error);
        }
        desc.validate()?;
        let info = TextureInfo::from_desc(&desc);
        self.texture_uploads.push(info.clone());
        Ok(Arc::new(MockTexture { info }))
    }

    fn wait_idle(&self) -> Result<()> {
        Ok(())
    }
}

// ============================================================================
// Mock Swapchain
// ============================================================================

/// Swapchain that plays back scripted acquire and present results
///
/// When a script runs dry, acquire returns `Ready` on a rotating index and
/// present returns `Presented`.
pub struct MockSwapchain {
    pub acquire_script: VecDeque<Result<AcquireResult>>,
    pub present_script: VecDeque<Result<PresentResult>>,
    pub recreate_script: VecDeque<Result<SwapchainChanges>>,
    pub acquire_calls: usize,
    pub present_calls: Vec<u32>,
    pub recreate_calls: usize,
    pub image_count: usize,
    pub extent: (u32, u32),
    pub format: TextureFormat,
    next_image: u32,
}

impl MockSwapchain {
    pub fn new(image_count: usize, extent: (u32, u32)) -> Self {
        Self {
            acquire_script: VecDeque::new(),
            present_script: VecDeque::new(),
            recreate_script: VecDeque::new(),
            acquire_calls: 0,
            present_calls: Vec::new(),
            recreate_calls: 0,
            image_count,
            extent,
            format: TextureFormat::B8G8R8A8_SRGB,
            next_image: 0,
        }
    }
}

impl Swapchain for MockSwapchain {
    fn acquire_next_image(&mut self) -> Result<AcquireResult> {
        self.acquire_calls += 1;
        if let Some(result) = self.acquire_script.pop_front() {
            return result;
        }
        let index = self.next_image;
        self.next_image = (self.next_image + 1) % self.image_count.max(1) as u32;
        Ok(AcquireResult::Ready(index))
    }

    fn present(&mut self, image_index: u32) -> Result<PresentResult> {
        self.present_calls.push(image_index);
        self.present_script
            .pop_front()
            .unwrap_or(Ok(PresentResult::Presented))
    }

    fn recreate(&mut self) -> Result<SwapchainChanges> {
        self.recreate_calls += 1;
        self.recreate_script
            .pop_front()
            .unwrap_or(Ok(SwapchainChanges::default()))
    }

    fn image_count(&self) -> usize {
        self.image_count
    }

    fn width(&self) -> u32 {
        self.extent.0
    }

    fn height(&self) -> u32 {
        self.extent.1
    }

    fn format(&self) -> TextureFormat {
        self.format
    }
}
