/// Fence and Semaphore - owning wrappers around Vulkan sync primitives
///
/// Each wrapper keeps a clone of the device dispatch table so it can destroy
/// its handle exactly once on drop. The owner must keep the logical device
/// alive for as long as the wrapper exists.

use orrery_engine::orrery::Result;
use orrery_engine::engine_fail;
use ash::vk;

/// Owned VkFence
pub struct Fence {
    device: ash::Device,
    fence: vk::Fence,
}

impl Fence {
    /// Create a fence, optionally already signaled
    pub fn new(device: &ash::Device, signaled: bool) -> Result<Self> {
        let flags = if signaled {
            vk::FenceCreateFlags::SIGNALED
        } else {
            vk::FenceCreateFlags::empty()
        };
        let create_info = vk::FenceCreateInfo::default().flags(flags);

        let fence = unsafe { device.create_fence(&create_info, None) }
            .map_err(|e| engine_fail!("orrery::vulkan", ResourceAllocationFailed, "vkCreateFence", e))?;

        Ok(Self { device: device.clone(), fence })
    }

    /// Block until the fence is signaled (no timeout)
    pub fn wait(&self) -> Result<()> {
        unsafe { self.device.wait_for_fences(&[self.fence], true, u64::MAX) }
            .map_err(|e| engine_fail!("orrery::vulkan", FenceWaitFailed, "vkWaitForFences", e))
    }

    /// Return the fence to the unsignaled state
    pub fn reset(&self) -> Result<()> {
        unsafe { self.device.reset_fences(&[self.fence]) }
            .map_err(|e| engine_fail!("orrery::vulkan", FenceWaitFailed, "vkResetFences", e))
    }

    /// Raw handle
    pub fn handle(&self) -> vk::Fence {
        self.fence
    }
}

impl Drop for Fence {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_fence(self.fence, None);
        }
    }
}

/// Owned binary VkSemaphore
pub struct Semaphore {
    device: ash::Device,
    semaphore: vk::Semaphore,
}

impl Semaphore {
    pub fn new(device: &ash::Device) -> Result<Self> {
        let create_info = vk::SemaphoreCreateInfo::default();

        let semaphore = unsafe { device.create_semaphore(&create_info, None) }
            .map_err(|e| engine_fail!("orrery::vulkan", ResourceAllocationFailed, "vkCreateSemaphore", e))?;

        Ok(Self { device: device.clone(), semaphore })
    }

    /// Raw handle
    pub fn handle(&self) -> vk::Semaphore {
        self.semaphore
    }
}

impl Drop for Semaphore {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_semaphore(self.semaphore, None);
        }
    }
}
