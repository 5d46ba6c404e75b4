/// Texture trait, texture descriptor, texture info and mip-chain math

use crate::error::{Error, Result};

/// Pixel format of a texture or swapchain image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(non_camel_case_types)]
pub enum TextureFormat {
    R8G8B8A8_SRGB,
    R8G8B8A8_UNORM,
    B8G8R8A8_SRGB,
    B8G8R8A8_UNORM,

    /// A surface format the engine has no name for (raw driver value).
    /// Swapchains may report it; textures cannot be created with it.
    Unsupported(i32),
}

impl TextureFormat {
    /// Bytes per pixel, or None for formats the engine cannot upload
    pub fn bytes_per_pixel(&self) -> Option<u32> {
        match self {
            TextureFormat::R8G8B8A8_SRGB
            | TextureFormat::R8G8B8A8_UNORM
            | TextureFormat::B8G8R8A8_SRGB
            | TextureFormat::B8G8R8A8_UNORM => Some(4),
            TextureFormat::Unsupported(_) => None,
        }
    }

    /// True for the sRGB-encoded variants
    pub fn is_srgb(&self) -> bool {
        matches!(self, TextureFormat::R8G8B8A8_SRGB | TextureFormat::B8G8R8A8_SRGB)
    }
}

// ===== MIP CHAIN =====

/// Number of mip levels of a full chain for a `width` x `height` image
///
/// Equals `floor(log2(max(width, height))) + 1`, never less than 1.
pub fn mip_levels(width: u32, height: u32) -> u32 {
    (u32::BITS - (width | height).leading_zeros()).max(1)
}

/// Extent of mip `level` (each axis halves per level, clamped to 1)
pub fn mip_extent(width: u32, height: u32, level: u32) -> (u32, u32) {
    let halve = |size: u32| size.checked_shr(level).unwrap_or(0).max(1);
    (halve(width), halve(height))
}

/// How the mip chain of an uploaded texture is built
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MipmapMode {
    /// Single level, no mipmaps
    None,

    /// Full chain down to 1x1, generated on the GPU by successive blits
    #[default]
    Generate,
}

impl MipmapMode {
    /// Number of levels the image is created with
    pub fn mip_levels(&self, width: u32, height: u32) -> u32 {
        match self {
            MipmapMode::None => 1,
            MipmapMode::Generate => mip_levels(width, height),
        }
    }
}

// ===== TEXTURE DESC =====

/// Descriptor for uploading a texture
#[derive(Debug, Clone)]
pub struct TextureDesc {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Pixel format (4 bytes per pixel)
    pub format: TextureFormat,
    /// Mip chain construction
    pub mipmap: MipmapMode,
    /// Tightly packed level-0 pixels, `width * height * 4` bytes
    pub data: Vec<u8>,
}

impl TextureDesc {
    /// Check dimensions, format and payload size before any GPU work happens
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(Error::InvalidResource(format!(
                "Texture dimensions must be non-zero (got {}x{})",
                self.width, self.height
            )));
        }

        let bytes_per_pixel = self.format.bytes_per_pixel().ok_or_else(|| {
            Error::InvalidResource(format!("Texture format {:?} cannot be uploaded", self.format))
        })?;

        let expected = self.width as u64 * self.height as u64 * bytes_per_pixel as u64;
        if self.data.len() as u64 != expected {
            return Err(Error::InvalidResource(format!(
                "Texture payload is {} bytes, expected {} for {}x{}",
                self.data.len(),
                expected,
                self.width,
                self.height
            )));
        }

        Ok(())
    }
}

// ===== TEXTURE INFO =====

/// Read-only properties of an uploaded texture
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureInfo {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Pixel format
    pub format: TextureFormat,
    /// Number of mip levels, fixed at creation
    pub mip_levels: u32,
}

impl TextureInfo {
    /// Build the info for a descriptor
    pub fn from_desc(desc: &TextureDesc) -> Self {
        Self {
            width: desc.width,
            height: desc.height,
            format: desc.format,
            mip_levels: desc.mipmap.mip_levels(desc.width, desc.height),
        }
    }
}

// ===== TEXTURE TRAIT =====

/// Texture resource trait
///
/// Implemented by backend-specific texture types.
/// The image, its view and its memory are released when dropped.
pub trait Texture: Send + Sync {
    /// Get the read-only properties of this texture
    fn info(&self) -> &TextureInfo;
}

#[cfg(test)]
#[path = "texture_tests.rs"]
mod tests;
