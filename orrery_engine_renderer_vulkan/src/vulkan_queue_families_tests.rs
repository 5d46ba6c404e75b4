//! Unit tests for queue family negotiation (no GPU required)

use ash::vk;
use orrery_engine::orrery::Error;

use crate::vulkan_device_selector::QueueFamilyReport;
use crate::vulkan_queue_families::{find_queue_family, negotiate_queue_families, QueueFamilyAssignment};

fn family(flags: vk::QueueFlags, can_present: bool) -> QueueFamilyReport {
    QueueFamilyReport { flags, can_present }
}

// ============================================================================
// FIND
// ============================================================================

#[test]
fn test_find_requires_all_flags() {
    let families = [
        family(vk::QueueFlags::TRANSFER, false),
        family(vk::QueueFlags::GRAPHICS | vk::QueueFlags::TRANSFER, false),
    ];
    assert_eq!(find_queue_family(&families, vk::QueueFlags::GRAPHICS | vk::QueueFlags::TRANSFER, false), Some(1));
    assert_eq!(find_queue_family(&families, vk::QueueFlags::TRANSFER, false), Some(0));
    assert_eq!(find_queue_family(&families, vk::QueueFlags::COMPUTE, false), None);
}

#[test]
fn test_find_empty_flags_is_present_only_search() {
    let families = [
        family(vk::QueueFlags::GRAPHICS, false),
        family(vk::QueueFlags::TRANSFER, true),
    ];
    assert_eq!(find_queue_family(&families, vk::QueueFlags::empty(), true), Some(1));
    assert_eq!(find_queue_family(&families, vk::QueueFlags::empty(), false), Some(0));
}

// ============================================================================
// NEGOTIATE
// ============================================================================

#[test]
fn test_prefers_shared_family() {
    let families = [
        family(vk::QueueFlags::GRAPHICS, false),
        family(vk::QueueFlags::TRANSFER, true),
        family(vk::QueueFlags::GRAPHICS | vk::QueueFlags::COMPUTE, true),
    ];
    let assignment = negotiate_queue_families(&families).unwrap();

    assert_eq!(assignment, QueueFamilyAssignment { graphics: 2, present: 2 });
    assert!(assignment.is_shared());
    assert_eq!(assignment.distinct_families(), vec![2]);
}

#[test]
fn test_falls_back_to_separate_families() {
    let families = [
        family(vk::QueueFlags::GRAPHICS, false),
        family(vk::QueueFlags::TRANSFER, true),
    ];
    let assignment = negotiate_queue_families(&families).unwrap();

    assert_eq!(assignment, QueueFamilyAssignment { graphics: 0, present: 1 });
    assert!(!assignment.is_shared());
    assert_eq!(assignment.distinct_families(), vec![0, 1]);
}

#[test]
fn test_no_present_family_fails() {
    let families = [family(vk::QueueFlags::GRAPHICS, false)];
    let err = negotiate_queue_families(&families).unwrap_err();

    assert!(matches!(err, Error::DeviceCreationFailed { .. }));
    assert_eq!(err.status(), Some("no present queue family"));
}

#[test]
fn test_no_families_fails() {
    let err = negotiate_queue_families(&[]).unwrap_err();
    assert_eq!(err.status(), Some("no graphics or present queue family"));
}
