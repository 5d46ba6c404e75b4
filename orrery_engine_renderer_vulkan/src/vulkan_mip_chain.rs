/// Mip chain generation by successive blits
///
/// The chain is first planned as a list of steps (pure, testable) and then
/// recorded into a command buffer. Recording assumes level 0 already holds the
/// uploaded pixels in `TRANSFER_DST_OPTIMAL` and every other level is also in
/// `TRANSFER_DST_OPTIMAL` (see `initial_transition`).

use orrery_engine::orrery::{Error, Result};
use orrery_engine::orrery::render::mip_extent;
use orrery_engine::{engine_error, engine_warn};
use ash::vk;

/// Layout change of a contiguous range of mip levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelTransition {
    pub base_level: u32,
    pub level_count: u32,
    pub old_layout: vk::ImageLayout,
    pub new_layout: vk::ImageLayout,
    pub src_access: vk::AccessFlags,
    pub dst_access: vk::AccessFlags,
    pub src_stage: vk::PipelineStageFlags,
    pub dst_stage: vk::PipelineStageFlags,
}

/// Downsampling blit from one level into the next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MipBlit {
    pub src_level: u32,
    pub dst_level: u32,
    pub src_extent: (u32, u32),
    pub dst_extent: (u32, u32),
}

/// One recorded command of the chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MipChainStep {
    Barrier(LevelTransition),
    Blit(MipBlit),
}

/// Move every level from `UNDEFINED` to `TRANSFER_DST_OPTIMAL` before the level-0 copy
pub fn initial_transition(levels: u32) -> LevelTransition {
    LevelTransition {
        base_level: 0,
        level_count: levels,
        old_layout: vk::ImageLayout::UNDEFINED,
        new_layout: vk::ImageLayout::TRANSFER_DST_OPTIMAL,
        src_access: vk::AccessFlags::empty(),
        dst_access: vk::AccessFlags::TRANSFER_WRITE,
        src_stage: vk::PipelineStageFlags::TOP_OF_PIPE,
        dst_stage: vk::PipelineStageFlags::TRANSFER,
    }
}

/// Level `level` finished being written, it becomes the next blit source
fn written_to_source(level: u32) -> LevelTransition {
    LevelTransition {
        base_level: level,
        level_count: 1,
        old_layout: vk::ImageLayout::TRANSFER_DST_OPTIMAL,
        new_layout: vk::ImageLayout::TRANSFER_SRC_OPTIMAL,
        src_access: vk::AccessFlags::TRANSFER_WRITE,
        dst_access: vk::AccessFlags::TRANSFER_READ,
        src_stage: vk::PipelineStageFlags::TRANSFER,
        dst_stage: vk::PipelineStageFlags::TRANSFER,
    }
}

/// Plan the chain for a `width` x `height` image with `levels` levels
///
/// 1. level 0: DST -> SRC
/// 2. for each level L >= 1: blit L-1 into L, then L: DST -> SRC
/// 3. all levels: SRC -> SHADER_READ_ONLY in one barrier
///
/// A single-level image gets steps 1 and 3 only.
pub fn plan_mip_chain(width: u32, height: u32, levels: u32) -> Vec<MipChainStep> {
    let levels = levels.max(1);
    let mut steps = Vec::with_capacity(2 * levels as usize + 1);

    steps.push(MipChainStep::Barrier(written_to_source(0)));

    for level in 1..levels {
        steps.push(MipChainStep::Blit(MipBlit {
            src_level: level - 1,
            dst_level: level,
            src_extent: mip_extent(width, height, level - 1),
            dst_extent: mip_extent(width, height, level),
        }));
        steps.push(MipChainStep::Barrier(written_to_source(level)));
    }

    steps.push(MipChainStep::Barrier(LevelTransition {
        base_level: 0,
        level_count: levels,
        old_layout: vk::ImageLayout::TRANSFER_SRC_OPTIMAL,
        new_layout: vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
        src_access: vk::AccessFlags::TRANSFER_READ,
        dst_access: vk::AccessFlags::SHADER_READ,
        src_stage: vk::PipelineStageFlags::TRANSFER,
        dst_stage: vk::PipelineStageFlags::FRAGMENT_SHADER,
    }));

    steps
}

/// Filter for the downsampling blits, from the format's optimal-tiling features
///
/// Blitting must be supported in both directions. Without linear filtering
/// support the chain falls back to nearest filtering.
pub fn choose_blit_filter(format: vk::Format, properties: vk::FormatProperties) -> Result<vk::Filter> {
    let features = properties.optimal_tiling_features;
    let blit = vk::FormatFeatureFlags::BLIT_SRC | vk::FormatFeatureFlags::BLIT_DST;

    if !features.contains(blit) {
        engine_error!("orrery::vulkan", "Format {:?} does not support blitting, cannot generate mipmaps", format);
        return Err(Error::InvalidResource(format!(
            "Format {:?} does not support blit source and destination",
            format
        )));
    }

    if features.contains(vk::FormatFeatureFlags::SAMPLED_IMAGE_FILTER_LINEAR) {
        Ok(vk::Filter::LINEAR)
    } else {
        engine_warn!("orrery::vulkan", "Format {:?} does not support linear filtering, mipmaps use nearest", format);
        Ok(vk::Filter::NEAREST)
    }
}

fn extent_offset((width, height): (u32, u32)) -> vk::Offset3D {
    vk::Offset3D {
        x: width as i32,
        y: height as i32,
        z: 1,
    }
}

/// Record a single layout transition of `image`
///
/// # Safety
///
/// `command_buffer` must be in the recording state.
pub unsafe fn record_transition(
    device: &ash::Device,
    command_buffer: vk::CommandBuffer,
    image: vk::Image,
    transition: &LevelTransition,
) {
    let barrier = vk::ImageMemoryBarrier::default()
        .old_layout(transition.old_layout)
        .new_layout(transition.new_layout)
        .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
        .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
        .image(image)
        .subresource_range(vk::ImageSubresourceRange {
            aspect_mask: vk::ImageAspectFlags::COLOR,
            base_mip_level: transition.base_level,
            level_count: transition.level_count,
            base_array_layer: 0,
            layer_count: 1,
        })
        .src_access_mask(transition.src_access)
        .dst_access_mask(transition.dst_access);

    device.cmd_pipeline_barrier(
        command_buffer,
        transition.src_stage,
        transition.dst_stage,
        vk::DependencyFlags::empty(),
        &[],
        &[],
        &[barrier],
    );
}

/// Record planned steps
///
/// # Safety
///
/// `command_buffer` must be in the recording state and `image` must have been
/// created with TRANSFER_SRC and TRANSFER_DST usage.
pub unsafe fn record_mip_chain(
    device: &ash::Device,
    command_buffer: vk::CommandBuffer,
    image: vk::Image,
    steps: &[MipChainStep],
    filter: vk::Filter,
) {
    for step in steps {
        match step {
            MipChainStep::Barrier(transition) => {
                record_transition(device, command_buffer, image, transition);
            }
            MipChainStep::Blit(blit) => {
                let region = vk::ImageBlit::default()
                    .src_subresource(vk::ImageSubresourceLayers {
                        aspect_mask: vk::ImageAspectFlags::COLOR,
                        mip_level: blit.src_level,
                        base_array_layer: 0,
                        layer_count: 1,
                    })
                    .src_offsets([vk::Offset3D::default(), extent_offset(blit.src_extent)])
                    .dst_subresource(vk::ImageSubresourceLayers {
                        aspect_mask: vk::ImageAspectFlags::COLOR,
                        mip_level: blit.dst_level,
                        base_array_layer: 0,
                        layer_count: 1,
                    })
                    .dst_offsets([vk::Offset3D::default(), extent_offset(blit.dst_extent)]);

                device.cmd_blit_image(
                    command_buffer,
                    image,
                    vk::ImageLayout::TRANSFER_SRC_OPTIMAL,
                    image,
                    vk::ImageLayout::TRANSFER_DST_OPTIMAL,
                    &[region],
                    filter,
                );
            }
        }
    }
}

/// Plan and record the whole chain, leaving every level in `SHADER_READ_ONLY_OPTIMAL`
///
/// # Safety
///
/// Same requirements as `record_mip_chain`.
pub unsafe fn generate_chain(
    device: &ash::Device,
    command_buffer: vk::CommandBuffer,
    image: vk::Image,
    width: u32,
    height: u32,
    levels: u32,
    filter: vk::Filter,
) {
    let steps = plan_mip_chain(width, height, levels);
    record_mip_chain(device, command_buffer, image, &steps, filter);
}

#[cfg(test)]
#[path = "vulkan_mip_chain_tests.rs"]
mod tests;
