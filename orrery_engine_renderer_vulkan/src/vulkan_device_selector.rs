/// Device selection - queries every adapter, scores it and picks the best one
///
/// Querying (driver calls) and scoring (pure) are split so that the scoring
/// rules can be exercised without a GPU.

use orrery_engine::orrery::{Error, Result};
use orrery_engine::{engine_error, engine_fail, engine_info};
use ash::vk;
use std::fmt;

use crate::vulkan_instance::InstanceContext;
use crate::vulkan_queue_families::find_queue_family;

/// Capabilities of one queue family, as seen by the selector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueFamilyReport {
    /// Operations the family supports
    pub flags: vk::QueueFlags,
    /// True if the family can present to the window surface
    pub can_present: bool,
}

/// Everything the selector needs to know about one adapter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdapterReport {
    /// Driver-reported device name
    pub name: String,
    /// Packed Vulkan API version
    pub api_version: u32,
    /// Device class
    pub device_type: vk::PhysicalDeviceType,
    /// True if VK_KHR_swapchain is available
    pub has_swapchain: bool,
    /// Queue families in driver order
    pub queue_families: Vec<QueueFamilyReport>,
}

impl AdapterReport {
    /// API version as (major, minor, patch)
    pub fn api_version_triple(&self) -> (u32, u32, u32) {
        (
            vk::api_version_major(self.api_version),
            vk::api_version_minor(self.api_version),
            vk::api_version_patch(self.api_version),
        )
    }

    /// Human-readable device class
    pub fn device_class(&self) -> &'static str {
        match self.device_type {
            vk::PhysicalDeviceType::DISCRETE_GPU => "discrete GPU",
            vk::PhysicalDeviceType::INTEGRATED_GPU => "integrated GPU",
            vk::PhysicalDeviceType::VIRTUAL_GPU => "virtual GPU",
            vk::PhysicalDeviceType::CPU => "CPU",
            _ => "other",
        }
    }
}

impl fmt::Display for AdapterReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (major, minor, patch) = self.api_version_triple();
        write!(f, "{} ({}.{}.{}, {})", self.name, major, minor, patch, self.device_class())
    }
}

/// Why an adapter was discarded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// API version below the configured minimum
    ApiVersionTooLow { found: (u32, u32), required: (u32, u32) },
    /// VK_KHR_swapchain is not available
    MissingSwapchainExtension,
    /// No queue family can present to the surface
    NoPresentQueue,
    /// No queue family supports graphics
    NoGraphicsQueue,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::ApiVersionTooLow { found, required } => write!(
                f,
                "insufficient vulkan version ({}.{} < {}.{})",
                found.0, found.1, required.0, required.1
            ),
            Rejection::MissingSwapchainExtension => write!(f, "extension VK_KHR_swapchain missing"),
            Rejection::NoPresentQueue => write!(f, "can't present to surface"),
            Rejection::NoGraphicsQueue => write!(f, "no graphics queue family"),
        }
    }
}

/// Score an adapter, or say why it cannot be used
///
/// Checks run in a fixed order and the first failure is reported.
/// A usable adapter scores 500 if discrete, 100 if integrated, 0 otherwise.
pub fn score_adapter(report: &AdapterReport, min_api_version: (u32, u32)) -> std::result::Result<u32, Rejection> {
    let found = (
        vk::api_version_major(report.api_version),
        vk::api_version_minor(report.api_version),
    );
    if found < min_api_version {
        return Err(Rejection::ApiVersionTooLow { found, required: min_api_version });
    }

    if !report.has_swapchain {
        return Err(Rejection::MissingSwapchainExtension);
    }

    if find_queue_family(&report.queue_families, vk::QueueFlags::empty(), true).is_none() {
        return Err(Rejection::NoPresentQueue);
    }

    if find_queue_family(&report.queue_families, vk::QueueFlags::GRAPHICS, false).is_none() {
        return Err(Rejection::NoGraphicsQueue);
    }

    Ok(match report.device_type {
        vk::PhysicalDeviceType::DISCRETE_GPU => 500,
        vk::PhysicalDeviceType::INTEGRATED_GPU => 100,
        _ => 0,
    })
}

/// Index of the best score
///
/// Only a strictly greater score replaces the current best, so ties go to the
/// earlier adapter. None if every entry is None.
pub fn pick_best<I>(scores: I) -> Option<usize>
where
    I: IntoIterator<Item = Option<u32>>,
{
    let mut best: Option<(usize, u32)> = None;
    for (index, score) in scores.into_iter().enumerate() {
        if let Some(score) = score {
            if best.map_or(true, |(_, best_score)| score > best_score) {
                best = Some((index, score));
            }
        }
    }
    best.map(|(index, _)| index)
}

/// Query the driver for everything `score_adapter` looks at
///
/// # Safety
///
/// `physical_device` must come from `instance`, and `surface` must be a live
/// surface created from the same instance.
pub unsafe fn query_adapter(
    instance: &ash::Instance,
    surface_loader: &ash::khr::surface::Instance,
    surface: vk::SurfaceKHR,
    physical_device: vk::PhysicalDevice,
) -> Result<AdapterReport> {
    let properties = instance.get_physical_device_properties(physical_device);
    let name = properties
        .device_name_as_c_str()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|_| "<unnamed device>".to_string());

    let extensions = instance
        .enumerate_device_extension_properties(physical_device)
        .map_err(|e| {
            engine_fail!(
                "orrery::vulkan",
                DeviceCreationFailed,
                format!("vkEnumerateDeviceExtensionProperties for '{}'", name),
                e
            )
        })?;
    let has_swapchain = extensions
        .iter()
        .any(|ext| ext.extension_name_as_c_str().map_or(false, |n| n == ash::khr::swapchain::NAME));

    let queue_families = instance
        .get_physical_device_queue_family_properties(physical_device)
        .iter()
        .enumerate()
        .map(|(index, family)| QueueFamilyReport {
            flags: family.queue_flags,
            // A failed support query counts as "cannot present"
            can_present: surface_loader
                .get_physical_device_surface_support(physical_device, index as u32, surface)
                .unwrap_or(false),
        })
        .collect();

    Ok(AdapterReport {
        name,
        api_version: properties.api_version,
        device_type: properties.device_type,
        has_swapchain,
        queue_families,
    })
}

/// The adapter chosen by `select_device`
#[derive(Debug, Clone)]
pub struct SelectedAdapter {
    pub physical_device: vk::PhysicalDevice,
    pub report: AdapterReport,
}

/// Enumerate adapters and pick the highest-scoring one that can present to the surface
///
/// Every rejection is logged at Info. Fails with `NoSuitableDevice` if no adapter
/// passes all checks.
pub fn select_device(context: &InstanceContext, min_api_version: (u32, u32)) -> Result<SelectedAdapter> {
    let physical_devices = unsafe { context.instance().enumerate_physical_devices() }
        .map_err(|e| engine_fail!("orrery::vulkan", DeviceCreationFailed, "vkEnumeratePhysicalDevices", e))?;

    let mut candidates = Vec::with_capacity(physical_devices.len());
    for physical_device in physical_devices {
        let report = unsafe {
            query_adapter(context.instance(), context.surface_loader(), context.surface(), physical_device)?
        };
        candidates.push((physical_device, report));
    }

    let scores: Vec<Option<u32>> = candidates
        .iter()
        .map(|(_, report)| match score_adapter(report, min_api_version) {
            Ok(score) => Some(score),
            Err(rejection) => {
                engine_info!("orrery::vulkan", "Discarding device '{}': {}", report.name, rejection);
                None
            }
        })
        .collect();

    let best = pick_best(scores).ok_or_else(|| {
        engine_error!("orrery::vulkan", "No suitable physical device found");
        Error::NoSuitableDevice
    })?;

    let (physical_device, report) = candidates.swap_remove(best);
    engine_info!("orrery::vulkan", "Selected device: {}", report);

    Ok(SelectedAdapter { physical_device, report })
}

#[cfg(test)]
#[path = "vulkan_device_selector_tests.rs"]
mod tests;
