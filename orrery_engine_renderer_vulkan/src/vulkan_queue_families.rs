/// Queue family negotiation and logical device creation

use orrery_engine::orrery::{Error, Result};
use orrery_engine::{engine_error, engine_fail, engine_info};
use ash::vk;

use crate::vulkan_device_selector::QueueFamilyReport;

/// Index of the first family that supports all of `flags` (and can present, if asked)
///
/// An empty `flags` matches any family, which is how a present-only search is expressed.
pub fn find_queue_family(families: &[QueueFamilyReport], flags: vk::QueueFlags, need_present: bool) -> Option<u32> {
    families
        .iter()
        .position(|family| family.flags.contains(flags) && (!need_present || family.can_present))
        .map(|index| index as u32)
}

/// Queue families chosen for graphics and presentation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueFamilyAssignment {
    pub graphics: u32,
    pub present: u32,
}

impl QueueFamilyAssignment {
    /// True when one family does both graphics and presentation
    pub fn is_shared(&self) -> bool {
        self.graphics == self.present
    }

    /// Deduplicated family list, graphics first
    ///
    /// One entry means exclusive swapchain sharing, two mean concurrent.
    pub fn distinct_families(&self) -> Vec<u32> {
        if self.is_shared() {
            vec![self.graphics]
        } else {
            vec![self.graphics, self.present]
        }
    }
}

/// Pick graphics and present families
///
/// A single family that can do both is preferred; otherwise the first graphics
/// family is paired with the first family that can present.
pub fn negotiate_queue_families(families: &[QueueFamilyReport]) -> Result<QueueFamilyAssignment> {
    if let Some(shared) = find_queue_family(families, vk::QueueFlags::GRAPHICS, true) {
        return Ok(QueueFamilyAssignment { graphics: shared, present: shared });
    }

    let graphics = find_queue_family(families, vk::QueueFlags::GRAPHICS, false);
    let present = find_queue_family(families, vk::QueueFlags::empty(), true);

    match (graphics, present) {
        (Some(graphics), Some(present)) => Ok(QueueFamilyAssignment { graphics, present }),
        (graphics, present) => {
            let status = match (graphics, present) {
                (None, None) => "no graphics or present queue family",
                (None, _) => "no graphics queue family",
                _ => "no present queue family",
            };
            engine_error!("orrery::vulkan", "Queue family negotiation failed: {}", status);
            Err(Error::DeviceCreationFailed {
                operation: "queue family negotiation".to_string(),
                status: status.to_string(),
            })
        }
    }
}

/// Logical device plus the queues fetched from it
pub struct LogicalDevice {
    pub device: ash::Device,
    pub graphics_queue: vk::Queue,
    pub present_queue: vk::Queue,
}

/// Create the logical device with one queue per distinct family and VK_KHR_swapchain enabled
///
/// The present queue aliases the graphics queue when the families are shared.
pub fn create_logical_device(
    instance: &ash::Instance,
    physical_device: vk::PhysicalDevice,
    families: QueueFamilyAssignment,
) -> Result<LogicalDevice> {
    let queue_priorities = [1.0];
    let queue_create_infos: Vec<vk::DeviceQueueCreateInfo> = families
        .distinct_families()
        .into_iter()
        .map(|family| {
            vk::DeviceQueueCreateInfo::default()
                .queue_family_index(family)
                .queue_priorities(&queue_priorities)
        })
        .collect();

    let device_extension_names = [ash::khr::swapchain::NAME.as_ptr()];
    engine_info!(
        "orrery::vulkan",
        "Enabling device extension: {}",
        ash::khr::swapchain::NAME.to_string_lossy()
    );

    let device_features = vk::PhysicalDeviceFeatures::default();

    let device_create_info = vk::DeviceCreateInfo::default()
        .queue_create_infos(&queue_create_infos)
        .enabled_extension_names(&device_extension_names)
        .enabled_features(&device_features);

    let device = unsafe { instance.create_device(physical_device, &device_create_info, None) }
        .map_err(|e| engine_fail!("orrery::vulkan", DeviceCreationFailed, "vkCreateDevice", e))?;

    let graphics_queue = unsafe { device.get_device_queue(families.graphics, 0) };
    let present_queue = if families.is_shared() {
        graphics_queue
    } else {
        unsafe { device.get_device_queue(families.present, 0) }
    };

    engine_info!(
        "orrery::vulkan",
        "Queue families: graphics={}, present={}{}",
        families.graphics,
        families.present,
        if families.is_shared() { " (shared)" } else { "" }
    );

    Ok(LogicalDevice { device, graphics_queue, present_queue })
}

#[cfg(test)]
#[path = "vulkan_queue_families_tests.rs"]
mod tests;
