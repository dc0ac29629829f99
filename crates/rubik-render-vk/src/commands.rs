// SPDX-License-Identifier: CEPL-1.0
use ash::vk;

use crate::VkError;

pub const CLEAR_COLOR: [f32; 4] = [0.0, 0.0, 0.0, 1.0];

/// Full-extent viewport with the standard 0..1 depth range.
pub fn viewport_for(extent: vk::Extent2D) -> vk::Viewport {
    vk::Viewport {
        x: 0.0,
        y: 0.0,
        width: extent.width as f32,
        height: extent.height as f32,
        min_depth: 0.0,
        max_depth: 1.0,
    }
}

pub fn scissor_for(extent: vk::Extent2D) -> vk::Rect2D {
    vk::Rect2D {
        offset: vk::Offset2D { x: 0, y: 0 },
        extent,
    }
}

/// Pool on the graphics family and the single primary buffer re-recorded every frame.
pub(crate) struct CommandRecorder {
    device: ash::Device,
    pool: vk::CommandPool,
    pub(crate) buffer: vk::CommandBuffer,
}

impl CommandRecorder {
    pub(crate) fn new(device: &ash::Device, graphics_family: u32) -> Result<Self, VkError> {
        let pool_info = vk::CommandPoolCreateInfo {
            s_type: vk::StructureType::COMMAND_POOL_CREATE_INFO,
            queue_family_index: graphics_family,
            flags: vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER,
            ..Default::default()
        };
        let pool = unsafe { device.create_command_pool(&pool_info, None) }
            .map_err(VkError::CommandPoolCreationFailed)?;
        let mut rec = Self {
            device: device.clone(),
            pool,
            buffer: vk::CommandBuffer::null(),
        };

        let alloc_info = vk::CommandBufferAllocateInfo {
            s_type: vk::StructureType::COMMAND_BUFFER_ALLOCATE_INFO,
            command_pool: pool,
            level: vk::CommandBufferLevel::PRIMARY,
            command_buffer_count: 1,
            ..Default::default()
        };
        let bufs = unsafe { device.allocate_command_buffers(&alloc_info) }
            .map_err(VkError::CommandBufferAllocationFailed)?;
        rec.buffer = bufs
            .first()
            .copied()
            .ok_or(VkError::CommandBufferAllocationFailed(vk::Result::ERROR_UNKNOWN))?;
        Ok(rec)
    }

    /// Resets and re-records the draw: clear, bind, full-extent viewport and scissor, 3 vertices.
    /// The previous submission of this buffer must have retired.
    pub(crate) fn record(
        &self,
        framebuffer: vk::Framebuffer,
        render_pass: vk::RenderPass,
        pipeline: vk::Pipeline,
        extent: vk::Extent2D,
    ) -> Result<(), VkError> {
        let cmd = self.buffer;
        let d = &self.device;
        unsafe {
            d.reset_command_buffer(cmd, vk::CommandBufferResetFlags::empty())
                .map_err(VkError::CommandRecordingFailed)?;

            let begin = vk::CommandBufferBeginInfo {
                s_type: vk::StructureType::COMMAND_BUFFER_BEGIN_INFO,
                ..Default::default()
            };
            d.begin_command_buffer(cmd, &begin)
                .map_err(VkError::CommandRecordingFailed)?;

            let clears = [vk::ClearValue {
                color: vk::ClearColorValue {
                    float32: CLEAR_COLOR,
                },
            }];
            let rp_begin = vk::RenderPassBeginInfo {
                s_type: vk::StructureType::RENDER_PASS_BEGIN_INFO,
                render_pass,
                framebuffer,
                render_area: scissor_for(extent),
                clear_value_count: clears.len() as u32,
                p_clear_values: clears.as_ptr(),
                ..Default::default()
            };
            d.cmd_begin_render_pass(cmd, &rp_begin, vk::SubpassContents::INLINE);
            d.cmd_bind_pipeline(cmd, vk::PipelineBindPoint::GRAPHICS, pipeline);
            d.cmd_set_viewport(cmd, 0, std::slice::from_ref(&viewport_for(extent)));
            d.cmd_set_scissor(cmd, 0, std::slice::from_ref(&scissor_for(extent)));
            d.cmd_draw(cmd, 3, 1, 0, 0);
            d.cmd_end_render_pass(cmd);

            d.end_command_buffer(cmd)
                .map_err(VkError::CommandRecordingFailed)?;
        }
        Ok(())
    }
}

impl Drop for CommandRecorder {
    fn drop(&mut self) {
        // Frees the buffer with it.
        unsafe { self.device.destroy_command_pool(self.pool, None) };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn viewport_covers_extent() {
        let vp = viewport_for(vk::Extent2D {
            width: 1080,
            height: 720,
        });
        assert_eq!((vp.x, vp.y), (0.0, 0.0));
        assert_eq!((vp.width, vp.height), (1080.0, 720.0));
        assert_eq!((vp.min_depth, vp.max_depth), (0.0, 1.0));
    }

    #[test]
    fn scissor_matches_extent_at_origin() {
        let extent = vk::Extent2D {
            width: 640,
            height: 480,
        };
        let sc = scissor_for(extent);
        assert_eq!((sc.offset.x, sc.offset.y), (0, 0));
        assert_eq!(sc.extent, extent);
    }

    #[test]
    fn clear_is_opaque_black() {
        assert_eq!(CLEAR_COLOR, [0.0, 0.0, 0.0, 1.0]);
    }
}
