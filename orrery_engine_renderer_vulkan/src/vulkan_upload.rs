/// Staged transfer engine - synchronous uploads through host-visible staging memory
///
/// Every upload follows the same protocol: create the device-local target,
/// fill an exact-size staging buffer, record a one-shot command buffer, submit
/// it on the graphics queue with a fence and wait for the fence. Staging
/// resources are released before the call returns.

use orrery_engine::orrery::{Error, Result};
use orrery_engine::orrery::render::{
    Buffer as RendererBuffer, BufferUsage, Texture as RendererTexture, TextureDesc, TextureInfo,
};
use orrery_engine::{engine_debug, engine_error, engine_fail};
use ash::vk;
use gpu_allocator::MemoryLocation;
use std::sync::Arc;

use crate::vulkan_buffer::{buffer_usage_to_vk, Buffer, DeviceBuffer};
use crate::vulkan_context::GpuContext;
use crate::vulkan_format::format_to_vk;
use crate::vulkan_mip_chain::{choose_blit_filter, generate_chain, initial_transition, record_transition};
use crate::vulkan_sync::Fence;
use crate::vulkan_texture::Texture;

// ============================================================================
// One-shot command buffer
// ============================================================================

/// Transient command pool with a single primary command buffer in recording state
///
/// The pool (and with it the command buffer) is destroyed on drop, whether or
/// not the commands were submitted.
pub struct OneShotCommands<'a> {
    ctx: &'a GpuContext,
    pool: vk::CommandPool,
    command_buffer: vk::CommandBuffer,
}

impl<'a> OneShotCommands<'a> {
    /// Create the pool on the graphics family and begin recording
    pub fn begin(ctx: &'a GpuContext) -> Result<Self> {
        let device = ctx.device();

        let pool_info = vk::CommandPoolCreateInfo::default()
            .queue_family_index(ctx.queue_families().graphics)
            .flags(vk::CommandPoolCreateFlags::TRANSIENT);

        let pool = unsafe { device.create_command_pool(&pool_info, None) }
            .map_err(|e| engine_fail!("orrery::vulkan", ResourceAllocationFailed, "vkCreateCommandPool", e))?;

        // From here on the pool is released by Drop
        let mut commands = Self {
            ctx,
            pool,
            command_buffer: vk::CommandBuffer::null(),
        };

        let alloc_info = vk::CommandBufferAllocateInfo::default()
            .command_pool(pool)
            .level(vk::CommandBufferLevel::PRIMARY)
            .command_buffer_count(1);

        let command_buffers = unsafe { device.allocate_command_buffers(&alloc_info) }
            .map_err(|e| engine_fail!("orrery::vulkan", ResourceAllocationFailed, "vkAllocateCommandBuffers", e))?;

        commands.command_buffer = command_buffers
            .first()
            .copied()
            .ok_or_else(|| engine_fail!("orrery::vulkan", ResourceAllocationFailed, "vkAllocateCommandBuffers", "empty result"))?;

        let begin_info = vk::CommandBufferBeginInfo::default()
            .flags(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT);

        unsafe { device.begin_command_buffer(commands.command_buffer, &begin_info) }
            .map_err(|e| engine_fail!("orrery::vulkan", SubmitFailed, "vkBeginCommandBuffer", e))?;

        Ok(commands)
    }

    /// Command buffer to record into
    pub fn command_buffer(&self) -> vk::CommandBuffer {
        self.command_buffer
    }

    /// End recording, submit on the graphics queue and block until the fence signals
    pub fn submit_and_wait(self) -> Result<()> {
        let device = self.ctx.device();

        unsafe { device.end_command_buffer(self.command_buffer) }
            .map_err(|e| engine_fail!("orrery::vulkan", SubmitFailed, "vkEndCommandBuffer", e))?;

        let fence = Fence::new(device, false)?;

        let command_buffers = [self.command_buffer];
        let submit_info = vk::SubmitInfo::default().command_buffers(&command_buffers);

        unsafe { device.queue_submit(self.ctx.graphics_queue(), &[submit_info], fence.handle()) }
            .map_err(|e| engine_fail!("orrery::vulkan", SubmitFailed, "vkQueueSubmit", e))?;

        fence.wait()
    }
}

impl Drop for OneShotCommands<'_> {
    fn drop(&mut self) {
        unsafe {
            self.ctx.device().destroy_command_pool(self.pool, None);
        }
    }
}

// ============================================================================
// Consumer barriers
// ============================================================================

/// Access mask and pipeline stage of the first consumer of a buffer
pub fn consumer_access(usage: BufferUsage) -> (vk::AccessFlags, vk::PipelineStageFlags) {
    match usage {
        BufferUsage::Vertex => (
            vk::AccessFlags::VERTEX_ATTRIBUTE_READ,
            vk::PipelineStageFlags::VERTEX_INPUT,
        ),
        BufferUsage::Index => (
            vk::AccessFlags::INDEX_READ,
            vk::PipelineStageFlags::VERTEX_INPUT,
        ),
        BufferUsage::Uniform => (
            vk::AccessFlags::UNIFORM_READ,
            vk::PipelineStageFlags::VERTEX_SHADER | vk::PipelineStageFlags::FRAGMENT_SHADER,
        ),
        BufferUsage::Storage => (
            vk::AccessFlags::SHADER_READ,
            vk::PipelineStageFlags::VERTEX_SHADER
                | vk::PipelineStageFlags::FRAGMENT_SHADER
                | vk::PipelineStageFlags::COMPUTE_SHADER,
        ),
    }
}

unsafe fn buffer_barrier(
    device: &ash::Device,
    command_buffer: vk::CommandBuffer,
    buffer: vk::Buffer,
    (src_access, src_stage): (vk::AccessFlags, vk::PipelineStageFlags),
    (dst_access, dst_stage): (vk::AccessFlags, vk::PipelineStageFlags),
) {
    let barrier = vk::BufferMemoryBarrier::default()
        .src_access_mask(src_access)
        .dst_access_mask(dst_access)
        .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
        .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
        .buffer(buffer)
        .offset(0)
        .size(vk::WHOLE_SIZE);

    device.cmd_pipeline_barrier(
        command_buffer,
        src_stage,
        dst_stage,
        vk::DependencyFlags::empty(),
        &[],
        &[barrier],
        &[],
    );
}

// ============================================================================
// Uploader
// ============================================================================

/// Synchronous staged uploads on the graphics queue
pub struct StagedUploader {
    ctx: Arc<GpuContext>,
}

impl StagedUploader {
    pub fn new(ctx: Arc<GpuContext>) -> Self {
        Self { ctx }
    }

    /// Host-visible staging buffer filled with `data`
    fn staging_buffer(&self, data: &[u8], name: &str) -> Result<Buffer> {
        let mut staging = Buffer::new(
            Arc::clone(&self.ctx),
            data.len() as u64,
            vk::BufferUsageFlags::TRANSFER_SRC,
            MemoryLocation::CpuToGpu,
            name,
        )?;
        staging.mapped_slice_mut()?.copy_from_slice(data);
        Ok(staging)
    }

    /// Upload `data` into a new device-local buffer
    ///
    /// Returns once the copy has completed and the consumer barrier executed.
    pub fn upload_buffer(&self, usage: BufferUsage, data: &[u8]) -> Result<DeviceBuffer> {
        if data.is_empty() {
            engine_error!("orrery::vulkan", "Rejected empty {:?} buffer upload", usage);
            return Err(Error::InvalidResource(format!("Cannot upload an empty {:?} buffer", usage)));
        }

        let size = data.len() as u64;
        let target = Buffer::new(
            Arc::clone(&self.ctx),
            size,
            buffer_usage_to_vk(usage),
            MemoryLocation::GpuOnly,
            "device_buffer",
        )?;
        let staging = self.staging_buffer(data, "staging_buffer")?;

        let commands = OneShotCommands::begin(&self.ctx)?;
        let device = self.ctx.device();
        let command_buffer = commands.command_buffer();

        unsafe {
            let region = vk::BufferCopy::default().src_offset(0).dst_offset(0).size(size);
            device.cmd_copy_buffer(command_buffer, staging.handle(), target.handle(), &[region]);

            buffer_barrier(
                device,
                command_buffer,
                target.handle(),
                (vk::AccessFlags::TRANSFER_WRITE, vk::PipelineStageFlags::TRANSFER),
                consumer_access(usage),
            );
        }

        commands.submit_and_wait()?;
        drop(staging);

        engine_debug!("orrery::vulkan", "Uploaded {:?} buffer ({} bytes)", usage, size);

        Ok(DeviceBuffer::new(target, usage))
    }

    /// Upload level 0 of `desc` and generate the remaining mip levels
    ///
    /// Every level of the returned texture is in `SHADER_READ_ONLY_OPTIMAL`.
    pub fn upload_texture(&self, desc: &TextureDesc) -> Result<Texture> {
        desc.validate().inspect_err(|e| engine_error!("orrery::vulkan", "{}", e))?;

        let format = format_to_vk(desc.format).ok_or_else(|| {
            Error::InvalidResource(format!("Texture format {:?} has no Vulkan equivalent", desc.format))
        })?;
        let filter = choose_blit_filter(format, self.ctx.format_properties(format))?;

        let info = TextureInfo::from_desc(desc);
        let texture = Texture::new(
            Arc::clone(&self.ctx),
            info.clone(),
            format,
            vk::ImageUsageFlags::SAMPLED | vk::ImageUsageFlags::TRANSFER_DST | vk::ImageUsageFlags::TRANSFER_SRC,
        )?;
        let staging = self.staging_buffer(&desc.data, "staging_texture")?;

        let commands = OneShotCommands::begin(&self.ctx)?;
        let device = self.ctx.device();
        let command_buffer = commands.command_buffer();

        unsafe {
            record_transition(device, command_buffer, texture.image(), &initial_transition(info.mip_levels));

            let region = vk::BufferImageCopy::default()
                .buffer_offset(0)
                .buffer_row_length(0)
                .buffer_image_height(0)
                .image_subresource(vk::ImageSubresourceLayers {
                    aspect_mask: vk::ImageAspectFlags::COLOR,
                    mip_level: 0,
                    base_array_layer: 0,
                    layer_count: 1,
                })
                .image_offset(vk::Offset3D::default())
                .image_extent(vk::Extent3D {
                    width: info.width,
                    height: info.height,
                    depth: 1,
                });

            device.cmd_copy_buffer_to_image(
                command_buffer,
                staging.handle(),
                texture.image(),
                vk::ImageLayout::TRANSFER_DST_OPTIMAL,
                &[region],
            );

            generate_chain(
                device,
                command_buffer,
                texture.image(),
                info.width,
                info.height,
                info.mip_levels,
                filter,
            );
        }

        commands.submit_and_wait()?;
        drop(staging);

        engine_debug!(
            "orrery::vulkan",
            "Uploaded texture {}x{} {:?} ({} levels, {} bytes)",
            texture.info().width,
            texture.info().height,
            texture.info().format,
            texture.info().mip_levels,
            desc.data.len()
        );

        Ok(texture)
    }

    /// Copy the contents of a device buffer back to host memory
    pub fn read_back_buffer(&self, buffer: &DeviceBuffer) -> Result<Vec<u8>> {
        let size = buffer.size();
        let readback = Buffer::new(
            Arc::clone(&self.ctx),
            size,
            vk::BufferUsageFlags::TRANSFER_DST,
            MemoryLocation::GpuToCpu,
            "readback_buffer",
        )?;

        let commands = OneShotCommands::begin(&self.ctx)?;
        let device = self.ctx.device();
        let command_buffer = commands.command_buffer();

        unsafe {
            buffer_barrier(
                device,
                command_buffer,
                buffer.handle(),
                consumer_access(buffer.usage()),
                (vk::AccessFlags::TRANSFER_READ, vk::PipelineStageFlags::TRANSFER),
            );

            let region = vk::BufferCopy::default().src_offset(0).dst_offset(0).size(size);
            device.cmd_copy_buffer(command_buffer, buffer.handle(), readback.handle(), &[region]);

            buffer_barrier(
                device,
                command_buffer,
                readback.handle(),
                (vk::AccessFlags::TRANSFER_WRITE, vk::PipelineStageFlags::TRANSFER),
                (vk::AccessFlags::HOST_READ, vk::PipelineStageFlags::HOST),
            );
        }

        commands.submit_and_wait()?;

        Ok(readback.mapped_slice()?.to_vec())
    }
}

#[cfg(test)]
#[path = "vulkan_upload_tests.rs"]
mod tests;
