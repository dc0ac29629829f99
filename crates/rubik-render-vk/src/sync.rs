// SPDX-License-Identifier: CEPL-1.0
use ash::vk;

use crate::VkError;

/// One frame in flight: acquire signal, render-done signal and the CPU-side fence.
pub(crate) struct FrameSync {
    device: ash::Device,
    pub(crate) image_available: vk::Semaphore,
    pub(crate) render_finished: vk::Semaphore,
    pub(crate) in_flight: vk::Fence,
}

impl FrameSync {
    pub(crate) fn new(device: &ash::Device) -> Result<Self, VkError> {
        let mut sync = Self {
            device: device.clone(),
            image_available: vk::Semaphore::null(),
            render_finished: vk::Semaphore::null(),
            in_flight: vk::Fence::null(),
        };
        let sem_ci = vk::SemaphoreCreateInfo::default();
        // Signaled so the first frame's wait returns immediately.
        let fence_ci = vk::FenceCreateInfo {
            s_type: vk::StructureType::FENCE_CREATE_INFO,
            flags: vk::FenceCreateFlags::SIGNALED,
            ..Default::default()
        };
        unsafe {
            sync.image_available = device
                .create_semaphore(&sem_ci, None)
                .map_err(VkError::SyncObjectCreationFailed)?;
            sync.render_finished = device
                .create_semaphore(&sem_ci, None)
                .map_err(VkError::SyncObjectCreationFailed)?;
            sync.in_flight = device
                .create_fence(&fence_ci, None)
                .map_err(VkError::SyncObjectCreationFailed)?;
        }
        Ok(sync)
    }

    /// Blocks without a timeout until the previous submission retires, then re-arms the fence.
    pub(crate) fn wait_and_reset(&self) -> Result<(), VkError> {
        let fences = [self.in_flight];
        unsafe {
            self.device
                .wait_for_fences(&fences, true, u64::MAX)
                .map_err(VkError::FenceWaitFailed)?;
            self.device
                .reset_fences(&fences)
                .map_err(VkError::FenceWaitFailed)?;
        }
        Ok(())
    }
}

impl Drop for FrameSync {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_fence(self.in_flight, None);
            self.device.destroy_semaphore(self.render_finished, None);
            self.device.destroy_semaphore(self.image_available, None);
        }
    }
}
