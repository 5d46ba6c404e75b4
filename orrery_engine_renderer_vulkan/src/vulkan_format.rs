/// Format conversion between engine and Vulkan

use orrery_engine::orrery::render::TextureFormat;
use ash::vk;

/// Convert an engine TextureFormat to its Vulkan format
///
/// Returns None for `TextureFormat::Unsupported`, which has no Vulkan
/// counterpart the engine is allowed to create images with.
pub fn format_to_vk(format: TextureFormat) -> Option<vk::Format> {
    match format {
        TextureFormat::R8G8B8A8_SRGB => Some(vk::Format::R8G8B8A8_SRGB),
        TextureFormat::R8G8B8A8_UNORM => Some(vk::Format::R8G8B8A8_UNORM),
        TextureFormat::B8G8R8A8_SRGB => Some(vk::Format::B8G8R8A8_SRGB),
        TextureFormat::B8G8R8A8_UNORM => Some(vk::Format::B8G8R8A8_UNORM),
        TextureFormat::Unsupported(_) => None,
    }
}

/// Convert a Vulkan format to engine TextureFormat
///
/// Formats the engine has no name for keep their raw value.
pub fn vk_format_to_format(vk_format: vk::Format) -> TextureFormat {
    match vk_format {
        vk::Format::R8G8B8A8_SRGB => TextureFormat::R8G8B8A8_SRGB,
        vk::Format::R8G8B8A8_UNORM => TextureFormat::R8G8B8A8_UNORM,
        vk::Format::B8G8R8A8_SRGB => TextureFormat::B8G8R8A8_SRGB,
        vk::Format::B8G8R8A8_UNORM => TextureFormat::B8G8R8A8_UNORM,
        other => TextureFormat::Unsupported(other.as_raw()),
    }
}

#[cfg(test)]
#[path = "vulkan_format_tests.rs"]
mod tests;
