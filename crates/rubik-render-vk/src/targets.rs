// SPDX-License-Identifier: CEPL-1.0
use ash::vk;
use tracing::debug;

use crate::VkError;

/// Framebuffers are indexed like the swapchain images, so a miss means a bad image index.
pub fn framebuffer_for(
    framebuffers: &[vk::Framebuffer],
    image_index: u32,
) -> Result<vk::Framebuffer, VkError> {
    framebuffers
        .get(image_index as usize)
        .copied()
        .ok_or(VkError::MissingFramebuffer { image_index })
}

/// One framebuffer per swapchain image view.
pub(crate) struct RenderTargets {
    device: ash::Device,
    pub(crate) framebuffers: Vec<vk::Framebuffer>,
}

impl RenderTargets {
    pub(crate) fn new(
        device: &ash::Device,
        render_pass: vk::RenderPass,
        views: &[vk::ImageView],
        extent: vk::Extent2D,
    ) -> Result<Self, VkError> {
        let mut targets = Self {
            device: device.clone(),
            framebuffers: Vec::with_capacity(views.len()),
        };
        for view in views {
            let fb_info = vk::FramebufferCreateInfo {
                s_type: vk::StructureType::FRAMEBUFFER_CREATE_INFO,
                render_pass,
                attachment_count: 1,
                p_attachments: view,
                width: extent.width,
                height: extent.height,
                layers: 1,
                ..Default::default()
            };
            let fb = unsafe { device.create_framebuffer(&fb_info, None) }
                .map_err(VkError::FramebufferCreationFailed)?;
            targets.framebuffers.push(fb);
        }
        debug!(
            "{} framebuffers at {}x{}",
            targets.framebuffers.len(),
            extent.width,
            extent.height
        );
        Ok(targets)
    }

    pub(crate) fn get(&self, image_index: u32) -> Result<vk::Framebuffer, VkError> {
        framebuffer_for(&self.framebuffers, image_index)
    }
}

impl Drop for RenderTargets {
    fn drop(&mut self) {
        for &fb in &self.framebuffers {
            unsafe { self.device.destroy_framebuffer(fb, None) };
        }
    }
}
