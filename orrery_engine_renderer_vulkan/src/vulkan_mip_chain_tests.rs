//! Unit tests for mip chain planning
//!
//! The planned steps are replayed against a per-level layout tracker, the same
//! way the validation layer checks the recorded barriers.

use ash::vk;
use orrery_engine::orrery::render::mip_levels;
use orrery_engine::orrery::Error;

use crate::vulkan_mip_chain::{
    choose_blit_filter, initial_transition, plan_mip_chain, LevelTransition, MipBlit, MipChainStep,
};

/// Replay a transition, checking every level was in the expected layout
fn apply(layouts: &mut [vk::ImageLayout], transition: &LevelTransition) {
    let range = transition.base_level as usize..(transition.base_level + transition.level_count) as usize;
    for level in range {
        assert_eq!(
            layouts[level], transition.old_layout,
            "level {} expected {:?} before barrier",
            level, transition.old_layout
        );
        layouts[level] = transition.new_layout;
    }
}

/// Replay a full upload: initial barrier, level 0 copy, then the planned chain
fn simulate(width: u32, height: u32) -> (Vec<vk::ImageLayout>, Vec<MipBlit>) {
    let levels = mip_levels(width, height);
    let mut layouts = vec![vk::ImageLayout::UNDEFINED; levels as usize];
    let mut blits = Vec::new();

    apply(&mut layouts, &initial_transition(levels));
    assert_eq!(layouts[0], vk::ImageLayout::TRANSFER_DST_OPTIMAL, "level 0 copy target");

    for step in plan_mip_chain(width, height, levels) {
        match step {
            MipChainStep::Barrier(transition) => apply(&mut layouts, &transition),
            MipChainStep::Blit(blit) => {
                assert_eq!(layouts[blit.src_level as usize], vk::ImageLayout::TRANSFER_SRC_OPTIMAL);
                assert_eq!(layouts[blit.dst_level as usize], vk::ImageLayout::TRANSFER_DST_OPTIMAL);
                blits.push(blit);
            }
        }
    }

    (layouts, blits)
}

// ============================================================================
// LAYOUTS
// ============================================================================

#[test]
fn test_512x256_chain() {
    let (layouts, blits) = simulate(512, 256);

    assert_eq!(layouts.len(), 10);
    assert!(layouts.iter().all(|&l| l == vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL));

    assert_eq!(blits.len(), 9);
    assert_eq!(blits[0].src_extent, (512, 256));
    assert_eq!(blits[0].dst_extent, (256, 128));
    assert_eq!(blits[7].dst_extent, (2, 1));
    assert_eq!(blits[8].src_level, 8);
    assert_eq!(blits[8].dst_level, 9);
    assert_eq!(blits[8].dst_extent, (1, 1));
}

#[test]
fn test_non_power_of_two_chain() {
    let (layouts, blits) = simulate(300, 1);

    assert_eq!(layouts.len(), 9);
    assert!(layouts.iter().all(|&l| l == vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL));
    assert_eq!(blits[0].dst_extent, (150, 1));
    assert_eq!(blits[1].dst_extent, (75, 1));
    assert_eq!(blits[2].dst_extent, (37, 1));
    assert_eq!(blits.last().map(|b| b.dst_extent), Some((1, 1)));
}

#[test]
fn test_blits_are_sequential() {
    let (_, blits) = simulate(64, 64);
    for (i, blit) in blits.iter().enumerate() {
        assert_eq!(blit.src_level, i as u32);
        assert_eq!(blit.dst_level, i as u32 + 1);
    }
}

#[test]
fn test_single_level_chain() {
    let steps = plan_mip_chain(1, 1, 1);
    assert_eq!(steps.len(), 2);
    assert!(steps.iter().all(|s| matches!(s, MipChainStep::Barrier(_))));

    let (layouts, blits) = simulate(1, 1);
    assert_eq!(layouts, vec![vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL]);
    assert!(blits.is_empty());
}

#[test]
fn test_single_level_of_large_image() {
    // MipmapMode::None: one level regardless of size
    let steps = plan_mip_chain(512, 256, 1);
    let mut layouts = vec![vk::ImageLayout::UNDEFINED];
    apply(&mut layouts, &initial_transition(1));
    for step in &steps {
        match step {
            MipChainStep::Barrier(t) => apply(&mut layouts, t),
            MipChainStep::Blit(_) => panic!("no blit expected"),
        }
    }
    assert_eq!(layouts, vec![vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL]);
}

#[test]
fn test_final_barrier_targets_fragment_shader() {
    let steps = plan_mip_chain(16, 16, 5);
    match steps.last() {
        Some(MipChainStep::Barrier(t)) => {
            assert_eq!(t.base_level, 0);
            assert_eq!(t.level_count, 5);
            assert_eq!(t.src_stage, vk::PipelineStageFlags::TRANSFER);
            assert_eq!(t.dst_stage, vk::PipelineStageFlags::FRAGMENT_SHADER);
            assert_eq!(t.dst_access, vk::AccessFlags::SHADER_READ);
        }
        other => panic!("expected final barrier, got {:?}", other),
    }
}

// ============================================================================
// FILTER
// ============================================================================

fn props(features: vk::FormatFeatureFlags) -> vk::FormatProperties {
    vk::FormatProperties {
        optimal_tiling_features: features,
        ..Default::default()
    }
}

#[test]
fn test_linear_filter_when_supported() {
    let features = vk::FormatFeatureFlags::BLIT_SRC
        | vk::FormatFeatureFlags::BLIT_DST
        | vk::FormatFeatureFlags::SAMPLED_IMAGE_FILTER_LINEAR;
    assert_eq!(
        choose_blit_filter(vk::Format::R8G8B8A8_SRGB, props(features)),
        Ok(vk::Filter::LINEAR)
    );
}

#[test]
fn test_nearest_fallback_without_linear_support() {
    let features = vk::FormatFeatureFlags::BLIT_SRC | vk::FormatFeatureFlags::BLIT_DST;
    assert_eq!(
        choose_blit_filter(vk::Format::R8G8B8A8_SRGB, props(features)),
        Ok(vk::Filter::NEAREST)
    );
}

#[test]
fn test_missing_blit_support_is_rejected() {
    let features = vk::FormatFeatureFlags::BLIT_SRC | vk::FormatFeatureFlags::SAMPLED_IMAGE_FILTER_LINEAR;
    assert!(matches!(
        choose_blit_filter(vk::Format::R8G8B8A8_SRGB, props(features)),
        Err(Error::InvalidResource(_))
    ));
}
