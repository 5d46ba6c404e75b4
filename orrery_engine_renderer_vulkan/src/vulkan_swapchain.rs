/// Swapchain - Vulkan implementation of the engine Swapchain trait
///
/// Owns the chain, its image views and the per-image frame synchronisation.
/// Surface parameters are chosen by the pure `choose_*` functions below so the
/// selection rules can be tested without a device.

use orrery_engine::orrery::{Error, Result};
use orrery_engine::orrery::render::{
    AcquireResult, PresentResult, Swapchain as RendererSwapchain, SwapchainChanges, TextureFormat,
};
use orrery_engine::{engine_debug, engine_error, engine_fail, engine_info};
use ash::vk;
use std::sync::Arc;

use crate::vulkan_context::GpuContext;
use crate::vulkan_format::vk_format_to_format;
use crate::vulkan_queue_families::QueueFamilyAssignment;
use crate::vulkan_sync::{Fence, Semaphore};

// ============================================================================
// Surface parameter selection
// ============================================================================

/// Prefer an 8-bit sRGB format in the sRGB non-linear color space, else the first one
pub fn choose_surface_format(formats: &[vk::SurfaceFormatKHR]) -> Option<vk::SurfaceFormatKHR> {
    formats
        .iter()
        .find(|f| {
            (f.format == vk::Format::R8G8B8A8_SRGB || f.format == vk::Format::B8G8R8A8_SRGB)
                && f.color_space == vk::ColorSpaceKHR::SRGB_NONLINEAR
        })
        .or_else(|| formats.first())
        .copied()
}

/// FIFO_RELAXED when available, FIFO otherwise (always supported)
pub fn choose_present_mode(modes: &[vk::PresentModeKHR]) -> vk::PresentModeKHR {
    if modes.contains(&vk::PresentModeKHR::FIFO_RELAXED) {
        vk::PresentModeKHR::FIFO_RELAXED
    } else {
        vk::PresentModeKHR::FIFO
    }
}

/// One image more than the minimum, clamped to the maximum (0 means unbounded)
///
/// A surface reporting a maximum below its minimum is rejected.
pub fn choose_image_count(capabilities: &vk::SurfaceCapabilitiesKHR) -> Result<u32> {
    let min = capabilities.min_image_count;
    let max = capabilities.max_image_count;

    if max != 0 && max < min {
        return Err(Error::SwapchainCreationFailed {
            operation: "choose image count".to_string(),
            status: format!("surface reports maxImageCount {} below minImageCount {}", max, min),
        });
    }

    let count = (min + 1).max(2);
    Ok(if max != 0 { count.min(max) } else { count })
}

/// Current surface extent, or the framebuffer size clamped to the surface bounds
/// when the surface leaves the choice to the application
pub fn choose_extent(capabilities: &vk::SurfaceCapabilitiesKHR, framebuffer_size: (u32, u32)) -> vk::Extent2D {
    if capabilities.current_extent.width != u32::MAX {
        return capabilities.current_extent;
    }

    let (width, height) = framebuffer_size;
    vk::Extent2D {
        width: width.clamp(capabilities.min_image_extent.width, capabilities.max_image_extent.width),
        height: height.clamp(capabilities.min_image_extent.height, capabilities.max_image_extent.height),
    }
}

/// Image sharing mode and the family indices to list with it
pub fn choose_sharing(families: &QueueFamilyAssignment) -> (vk::SharingMode, Vec<u32>) {
    if families.is_shared() {
        (vk::SharingMode::EXCLUSIVE, Vec::new())
    } else {
        (vk::SharingMode::CONCURRENT, families.distinct_families())
    }
}

// ============================================================================
// Frame synchronisation
// ============================================================================

/// Semaphores and fences of one chain
///
/// Rebuilt on every recreation, which also discards an image-available
/// semaphore left signaled by an abandoned acquire.
struct FrameSync {
    /// Signaled by acquire, waited on by submit
    image_available: Semaphore,
    /// One per image: signaled by submit, waited on by present
    render_finished: Vec<Semaphore>,
    /// One per image, created signaled: guards reuse of that image's command buffer
    in_flight: Vec<Fence>,
}

impl FrameSync {
    fn new(device: &ash::Device, image_count: usize) -> Result<Self> {
        let image_available = Semaphore::new(device)?;
        let render_finished = (0..image_count)
            .map(|_| Semaphore::new(device))
            .collect::<Result<Vec<_>>>()?;
        let in_flight = (0..image_count)
            .map(|_| Fence::new(device, true))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            image_available,
            render_finished,
            in_flight,
        })
    }
}

// ============================================================================
// Swapchain
// ============================================================================

/// Freshly created chain before its images are fetched
struct ChainState {
    swapchain: vk::SwapchainKHR,
    surface_format: vk::SurfaceFormatKHR,
    present_mode: vk::PresentModeKHR,
    extent: vk::Extent2D,
}

/// Vulkan swapchain implementation
pub struct Swapchain {
    /// VK_KHR_swapchain device functions
    loader: ash::khr::swapchain::Device,
    /// Current chain
    swapchain: vk::SwapchainKHR,
    /// Chain images (owned by the chain)
    images: Vec<vk::Image>,
    /// One view per image
    views: Vec<vk::ImageView>,
    surface_format: vk::SurfaceFormatKHR,
    present_mode: vk::PresentModeKHR,
    extent: vk::Extent2D,
    sync: FrameSync,
    /// Declared last: the device outlives the chain
    ctx: Arc<GpuContext>,
}

impl Swapchain {
    /// Create a chain for the context's surface
    ///
    /// A zero surface extent (minimized window) fails with `SurfaceMinimized`.
    pub fn new(ctx: Arc<GpuContext>) -> Result<Self> {
        let loader = ash::khr::swapchain::Device::new(ctx.instance().instance(), ctx.device());

        let (chain, resources) = stage_replacement(
            || create_chain(&ctx, &loader, vk::SwapchainKHR::null()),
            |chain| build_resources(ctx.device(), &loader, chain),
            |chain| unsafe { loader.destroy_swapchain(chain.swapchain, None) },
        )?;

        engine_info!(
            "orrery::vulkan",
            "Swapchain created: {}x{}, {:?}, {:?}, {} images",
            chain.extent.width,
            chain.extent.height,
            chain.surface_format.format,
            chain.present_mode,
            resources.images.len()
        );

        Ok(Self {
            loader,
            swapchain: chain.swapchain,
            images: resources.images,
            views: resources.views,
            surface_format: chain.surface_format,
            present_mode: chain.present_mode,
            extent: chain.extent,
            sync: resources.sync,
            ctx,
        })
    }

    /// Raw chain handle
    pub fn handle(&self) -> vk::SwapchainKHR {
        self.swapchain
    }

    /// Chain images
    pub fn images(&self) -> &[vk::Image] {
        &self.images
    }

    /// One view per chain image, in image order
    pub fn image_views(&self) -> &[vk::ImageView] {
        &self.views
    }

    pub fn extent(&self) -> vk::Extent2D {
        self.extent
    }

    pub fn vk_format(&self) -> vk::Format {
        self.surface_format.format
    }

    pub fn color_space(&self) -> vk::ColorSpaceKHR {
        self.surface_format.color_space
    }

    pub fn present_mode(&self) -> vk::PresentModeKHR {
        self.present_mode
    }

    fn slot(&self, image_index: u32) -> Result<usize> {
        let slot = image_index as usize;
        if slot < self.images.len() {
            Ok(slot)
        } else {
            Err(Error::InvalidResource(format!(
                "Image index {} out of range (chain has {} images)",
                image_index,
                self.images.len()
            )))
        }
    }

    /// Block until the previous submission for this image has completed
    pub fn wait_for_frame(&self, image_index: u32) -> Result<()> {
        let slot = self.slot(image_index)?;
        self.sync.in_flight[slot].wait()
    }

    /// Submit rendering for an acquired image on the graphics queue
    ///
    /// Waits on image-available at the color attachment output stage and
    /// signals this image's render-finished semaphore and fence. If the submit
    /// is rejected, the image gets a fresh signaled fence so the next
    /// `wait_for_frame` on it does not block forever.
    pub fn submit(&mut self, image_index: u32, command_buffers: &[vk::CommandBuffer]) -> Result<()> {
        let slot = self.slot(image_index)?;
        self.sync.in_flight[slot].reset()?;

        let wait_semaphores = [self.sync.image_available.handle()];
        let wait_stages = [vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT];
        let signal_semaphores = [self.sync.render_finished[slot].handle()];

        let submit_info = vk::SubmitInfo::default()
            .wait_semaphores(&wait_semaphores)
            .wait_dst_stage_mask(&wait_stages)
            .command_buffers(command_buffers)
            .signal_semaphores(&signal_semaphores);

        let submitted = unsafe {
            self.ctx
                .device()
                .queue_submit(self.ctx.graphics_queue(), &[submit_info], self.sync.in_flight[slot].handle())
        };

        if let Err(e) = submitted {
            let error = engine_fail!("orrery::vulkan", SubmitFailed, "vkQueueSubmit", e);
            match Fence::new(self.ctx.device(), true) {
                Ok(fence) => self.sync.in_flight[slot] = fence,
                Err(_) => engine_error!("orrery::vulkan", "Fence of image {} left unsignaled after a failed submit", slot),
            }
            return Err(error);
        }

        Ok(())
    }

    fn destroy_views(&mut self) {
        let device = self.ctx.device();
        for view in self.views.drain(..) {
            unsafe { device.destroy_image_view(view, None) };
        }
    }
}

/// Images, views and frame sync derived from one chain
struct ChainResources {
    images: Vec<vk::Image>,
    views: Vec<vk::ImageView>,
    sync: FrameSync,
}

/// Create a replacement, then derive what depends on it
///
/// If `derive` fails the replacement goes to `discard` and the error is
/// returned, so the caller's current state is only swapped once both steps
/// have succeeded.
pub(crate) fn stage_replacement<C, R>(
    create: impl FnOnce() -> Result<C>,
    derive: impl FnOnce(&C) -> Result<R>,
    discard: impl FnOnce(C),
) -> Result<(C, R)> {
    let created = create()?;
    match derive(&created) {
        Ok(derived) => Ok((created, derived)),
        Err(e) => {
            discard(created);
            Err(e)
        }
    }
}

/// Fetch the chain's images and build their views and frame sync
///
/// Leaves nothing behind on failure. The chain itself is not destroyed.
fn build_resources(
    device: &ash::Device,
    loader: &ash::khr::swapchain::Device,
    chain: &ChainState,
) -> Result<ChainResources> {
    let images = unsafe { loader.get_swapchain_images(chain.swapchain) }
        .map_err(|e| engine_fail!("orrery::vulkan", SwapchainCreationFailed, "vkGetSwapchainImagesKHR", e))?;

    let views = create_views(device, &images, chain.surface_format.format)?;

    let sync = match FrameSync::new(device, images.len()) {
        Ok(sync) => sync,
        Err(e) => {
            for &view in &views {
                unsafe { device.destroy_image_view(view, None) };
            }
            return Err(e);
        }
    };

    Ok(ChainResources { images, views, sync })
}

/// Query the surface and create a chain, retiring `old_swapchain` if not null
fn create_chain(
    ctx: &GpuContext,
    loader: &ash::khr::swapchain::Device,
    old_swapchain: vk::SwapchainKHR,
) -> Result<ChainState> {
    let instance = ctx.instance();
    let surface_loader = instance.surface_loader();
    let surface = instance.surface();
    let physical_device = ctx.physical_device();

    let capabilities = unsafe { surface_loader.get_physical_device_surface_capabilities(physical_device, surface) }
        .map_err(|e| engine_fail!("orrery::vulkan", SwapchainCreationFailed, "vkGetPhysicalDeviceSurfaceCapabilitiesKHR", e))?;

    let formats = unsafe { surface_loader.get_physical_device_surface_formats(physical_device, surface) }
        .map_err(|e| engine_fail!("orrery::vulkan", SwapchainCreationFailed, "vkGetPhysicalDeviceSurfaceFormatsKHR", e))?;

    let present_modes = unsafe { surface_loader.get_physical_device_surface_present_modes(physical_device, surface) }
        .map_err(|e| engine_fail!("orrery::vulkan", SwapchainCreationFailed, "vkGetPhysicalDeviceSurfacePresentModesKHR", e))?;

    let surface_format = choose_surface_format(&formats).ok_or_else(|| {
        engine_fail!("orrery::vulkan", SwapchainCreationFailed, "choose surface format", "surface reports no formats")
    })?;
    let present_mode = choose_present_mode(&present_modes);
    let image_count = choose_image_count(&capabilities).inspect_err(|e| engine_error!("orrery::vulkan", "{}", e))?;
    let extent = choose_extent(&capabilities, instance.framebuffer_size());

    // Checked before vkCreateSwapchainKHR so the old chain is not retired
    if extent.width == 0 || extent.height == 0 {
        engine_debug!("orrery::vulkan", "Surface extent is {}x{}, skipping chain creation", extent.width, extent.height);
        return Err(Error::SurfaceMinimized);
    }

    let (sharing_mode, family_indices) = choose_sharing(&ctx.queue_families());

    let create_info = vk::SwapchainCreateInfoKHR::default()
        .surface(surface)
        .min_image_count(image_count)
        .image_format(surface_format.format)
        .image_color_space(surface_format.color_space)
        .image_extent(extent)
        .image_array_layers(1)
        .image_usage(vk::ImageUsageFlags::COLOR_ATTACHMENT)
        .image_sharing_mode(sharing_mode)
        .queue_family_indices(&family_indices)
        .pre_transform(capabilities.current_transform)
        .composite_alpha(vk::CompositeAlphaFlagsKHR::OPAQUE)
        .present_mode(present_mode)
        .clipped(true)
        .old_swapchain(old_swapchain);

    let swapchain = unsafe { loader.create_swapchain(&create_info, None) }
        .map_err(|e| engine_fail!("orrery::vulkan", SwapchainCreationFailed, "vkCreateSwapchainKHR", e))?;

    Ok(ChainState {
        swapchain,
        surface_format,
        present_mode,
        extent,
    })
}

/// One 2D color view per image; views created before a failure are destroyed
fn create_views(device: &ash::Device, images: &[vk::Image], format: vk::Format) -> Result<Vec<vk::ImageView>> {
    let mut views = Vec::with_capacity(images.len());

    for &image in images {
        let create_info = vk::ImageViewCreateInfo::default()
            .image(image)
            .view_type(vk::ImageViewType::TYPE_2D)
            .format(format)
            .components(vk::ComponentMapping {
                r: vk::ComponentSwizzle::IDENTITY,
                g: vk::ComponentSwizzle::IDENTITY,
                b: vk::ComponentSwizzle::IDENTITY,
                a: vk::ComponentSwizzle::IDENTITY,
            })
            .subresource_range(vk::ImageSubresourceRange {
                aspect_mask: vk::ImageAspectFlags::COLOR,
                base_mip_level: 0,
                level_count: 1,
                base_array_layer: 0,
                layer_count: 1,
            });

        match unsafe { device.create_image_view(&create_info, None) } {
            Ok(view) => views.push(view),
            Err(e) => {
                for view in views {
                    unsafe { device.destroy_image_view(view, None) };
                }
                return Err(engine_fail!("orrery::vulkan", SwapchainCreationFailed, "vkCreateImageView", e));
            }
        }
    }

    Ok(views)
}

impl RendererSwapchain for Swapchain {
    fn acquire_next_image(&mut self) -> Result<AcquireResult> {
        let result = unsafe {
            self.loader.acquire_next_image(
                self.swapchain,
                u64::MAX,
                self.sync.image_available.handle(),
                vk::Fence::null(),
            )
        };

        match result {
            Ok((index, false)) => Ok(AcquireResult::Ready(index)),
            Ok((index, true)) => Ok(AcquireResult::Suboptimal(index)),
            Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => Ok(AcquireResult::OutOfDate),
            Err(e) => Err(engine_fail!("orrery::vulkan", PresentationFailed, "vkAcquireNextImageKHR", e)),
        }
    }

    fn present(&mut self, image_index: u32) -> Result<PresentResult> {
        let slot = self.slot(image_index)?;

        let wait_semaphores = [self.sync.render_finished[slot].handle()];
        let swapchains = [self.swapchain];
        let image_indices = [image_index];

        let present_info = vk::PresentInfoKHR::default()
            .wait_semaphores(&wait_semaphores)
            .swapchains(&swapchains)
            .image_indices(&image_indices);

        match unsafe { self.loader.queue_present(self.ctx.present_queue(), &present_info) } {
            Ok(false) => Ok(PresentResult::Presented),
            Ok(true) => Ok(PresentResult::Suboptimal),
            Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => Ok(PresentResult::OutOfDate),
            Err(e) => Err(engine_fail!("orrery::vulkan", PresentationFailed, "vkQueuePresentKHR", e)),
        }
    }

    fn recreate(&mut self) -> Result<SwapchainChanges> {
        self.ctx.wait_idle()?;

        // The current chain, its views and sync stay untouched until the
        // replacement is complete. A retired chain reports OutOfDate on acquire,
        // which requests another recreation.
        let (chain, resources) = {
            let ctx = &self.ctx;
            let loader = &self.loader;
            let old_swapchain = self.swapchain;
            stage_replacement(
                || create_chain(ctx, loader, old_swapchain),
                |chain| build_resources(ctx.device(), loader, chain),
                |chain| unsafe { loader.destroy_swapchain(chain.swapchain, None) },
            )?
        };

        let old_format = self.surface_format.format;
        let old_extent = (self.extent.width, self.extent.height);

        self.destroy_views();
        unsafe { self.loader.destroy_swapchain(self.swapchain, None) };

        self.swapchain = chain.swapchain;
        self.surface_format = chain.surface_format;
        self.present_mode = chain.present_mode;
        self.extent = chain.extent;
        self.images = resources.images;
        self.views = resources.views;
        self.sync = resources.sync;

        let changes = SwapchainChanges::between(
            old_format,
            old_extent,
            self.surface_format.format,
            (self.extent.width, self.extent.height),
        );

        engine_info!(
            "orrery::vulkan",
            "Swapchain recreated: {}x{}, {:?}, {} images (format changed: {}, size changed: {})",
            self.extent.width,
            self.extent.height,
            self.surface_format.format,
            self.images.len(),
            changes.changed_format,
            changes.changed_size
        );

        Ok(changes)
    }

    fn image_count(&self) -> usize {
        self.images.len()
    }

    fn width(&self) -> u32 {
        self.extent.width
    }

    fn height(&self) -> u32 {
        self.extent.height
    }

    fn format(&self) -> TextureFormat {
        vk_format_to_format(self.surface_format.format)
    }
}

impl Drop for Swapchain {
    fn drop(&mut self) {
        self.ctx.wait_idle().ok();
        self.destroy_views();
        unsafe {
            self.loader.destroy_swapchain(self.swapchain, None);
        }
    }
}

#[cfg(test)]
#[path = "vulkan_swapchain_tests.rs"]
mod tests;
