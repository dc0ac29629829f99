// SPDX-License-Identifier: CEPL-1.0
//! Vulkan backend: one-time device chain bring-up and the per-frame steps the
//! [`rubik_render::FrameLoop`] drives.

mod commands;
mod debug;
mod device;
mod error;
mod instance;
mod pipeline;
mod probe;
mod select;
#[cfg(feature = "embed-shaders")]
mod shaders;
mod swapchain;
mod sync;
mod targets;

use ash::vk;
use raw_window_handle::{HasDisplayHandle, HasWindowHandle, RawDisplayHandle, RawWindowHandle};
use rubik_render::{FrameBackend, RenderSize, ShaderSource};
use tracing::{debug, info, trace};

pub use commands::{scissor_for, viewport_for, CLEAR_COLOR};
pub use debug::{missing_layer, Diagnostics, VALIDATION_LAYER};
pub use device::unique_queue_families;
pub use error::VkError;
pub use pipeline::parse_spirv;
pub use probe::{
    find_queue_families, missing_extensions, DeviceCandidate, QueueFamilyIndices,
    SwapchainSupport, REQUIRED_DEVICE_EXTENSIONS,
};
pub use select::{is_suitable, rate, select_device, DISCRETE_GPU_BONUS};
#[cfg(feature = "embed-shaders")]
pub use shaders::EmbeddedShaders;
pub use targets::framebuffer_for;
pub use swapchain::{
    choose_extent, choose_image_count, choose_present_mode, choose_sharing,
    choose_surface_format,
};

use commands::CommandRecorder;
use debug::DebugMessenger;
use device::LogicalDevice;
use instance::{Surface, VkInstance};
use pipeline::GraphicsPipeline;
use swapchain::PresentationChain;
use sync::FrameSync;
use targets::RenderTargets;

/// Shader file names the pipeline is built from.
#[derive(Clone, Copy, Debug)]
pub struct ShaderNames<'a> {
    pub vertex: &'a str,
    pub fragment: &'a str,
}

/// Everything the device chain owns.
// STRICT: fields drop top to bottom, which is the reverse of creation order.
// Objects that depend on the device must go before it; the instance goes last.
pub struct VkRenderer {
    sync: FrameSync,
    commands: CommandRecorder,
    targets: RenderTargets,
    pipeline: GraphicsPipeline,
    chain: PresentationChain,
    device: LogicalDevice,
    surface: Surface,
    _debug: Option<DebugMessenger>,
    _instance: VkInstance,
}

impl VkRenderer {
    pub fn new(
        window: &dyn HasWindowHandle,
        display: &dyn HasDisplayHandle,
        size: RenderSize,
        diagnostics: Diagnostics,
        shaders: &dyn ShaderSource,
        names: ShaderNames<'_>,
    ) -> Result<Self, VkError> {
        let dh: RawDisplayHandle = display.display_handle()?.as_raw();
        let wh: RawWindowHandle = window.window_handle()?.as_raw();

        let instance = VkInstance::new(dh, diagnostics)?;
        let debug = if diagnostics.enabled {
            Some(DebugMessenger::new(&instance.entry, &instance.instance)?)
        } else {
            None
        };
        let surface = Surface::new(&instance, dh, wh)?;

        let candidates = probe::probe_devices(&instance.instance, &surface)?;
        let picked = select_device(&candidates)?;
        let device = LogicalDevice::new(
            &instance.instance,
            picked.handle,
            picked.queue_families,
            diagnostics,
        )?;

        let support = probe::query_swapchain_support(&surface, picked.handle)?;
        let chain = PresentationChain::new(&instance, &device, &surface, &support, size)?;
        let pipeline = GraphicsPipeline::new(
            &device.device,
            chain.format.format,
            shaders,
            names.vertex,
            names.fragment,
        )?;
        let targets = RenderTargets::new(
            &device.device,
            pipeline.render_pass,
            &chain.image_views,
            chain.extent,
        )?;
        let commands = CommandRecorder::new(&device.device, device.graphics_family)?;
        let sync = FrameSync::new(&device.device)?;

        info!(
            "vulkan chain ready ({}x{}, {:?}, {:?}, {} images)",
            chain.extent.width,
            chain.extent.height,
            chain.format.format,
            chain.present_mode,
            chain.images.len()
        );

        Ok(Self {
            sync,
            commands,
            targets,
            pipeline,
            chain,
            device,
            surface,
            _debug: debug,
            _instance: instance,
        })
    }

    pub fn extent(&self) -> RenderSize {
        RenderSize {
            width: self.chain.extent.width,
            height: self.chain.extent.height,
        }
    }

    pub fn image_count(&self) -> usize {
        self.chain.images.len()
    }

    pub fn surface_format(&self) -> vk::SurfaceFormatKHR {
        self.chain.format
    }

    pub fn present_mode(&self) -> vk::PresentModeKHR {
        self.chain.present_mode
    }
}

impl FrameBackend for VkRenderer {
    type Error = VkError;

    fn wait_previous(&mut self) -> Result<(), VkError> {
        self.sync.wait_and_reset()
    }

    fn acquire_image(&mut self) -> Result<u32, VkError> {
        let (image_index, suboptimal) = unsafe {
            self.chain.loader.acquire_next_image(
                self.chain.swapchain,
                u64::MAX,
                self.sync.image_available,
                vk::Fence::null(),
            )
        }
        .map_err(VkError::AcquireImageFailed)?;
        if suboptimal {
            debug!("acquired image {image_index} is suboptimal for the surface");
        }
        trace!("acquired image {image_index}");
        Ok(image_index)
    }

    fn record_and_submit(&mut self, image_index: u32) -> Result<(), VkError> {
        let framebuffer = self.targets.get(image_index)?;
        self.commands.record(
            framebuffer,
            self.pipeline.render_pass,
            self.pipeline.pipeline,
            self.chain.extent,
        )?;

        let wait_semaphores = [self.sync.image_available];
        let wait_stages = [vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT];
        let signal_semaphores = [self.sync.render_finished];
        let cmd = self.commands.buffer;
        let submit = vk::SubmitInfo {
            s_type: vk::StructureType::SUBMIT_INFO,
            wait_semaphore_count: wait_semaphores.len() as u32,
            p_wait_semaphores: wait_semaphores.as_ptr(),
            p_wait_dst_stage_mask: wait_stages.as_ptr(),
            command_buffer_count: 1,
            p_command_buffers: &cmd,
            signal_semaphore_count: signal_semaphores.len() as u32,
            p_signal_semaphores: signal_semaphores.as_ptr(),
            ..Default::default()
        };
        unsafe {
            self.device.device.queue_submit(
                self.device.graphics_queue,
                std::slice::from_ref(&submit),
                self.sync.in_flight,
            )
        }
        .map_err(VkError::SubmitFailed)?;
        trace!("submitted image {image_index}");
        Ok(())
    }

    fn present(&mut self, image_index: u32) -> Result<(), VkError> {
        let wait_semaphores = [self.sync.render_finished];
        let present = vk::PresentInfoKHR {
            s_type: vk::StructureType::PRESENT_INFO_KHR,
            wait_semaphore_count: wait_semaphores.len() as u32,
            p_wait_semaphores: wait_semaphores.as_ptr(),
            swapchain_count: 1,
            p_swapchains: &self.chain.swapchain,
            p_image_indices: &image_index,
            ..Default::default()
        };
        let suboptimal = unsafe {
            self.chain
                .loader
                .queue_present(self.device.present_queue, &present)
        }
        .map_err(VkError::PresentFailed)?;
        if suboptimal {
            debug!("presented image {image_index} is suboptimal for the surface");
        }
        Ok(())
    }

    fn wait_idle(&mut self) -> Result<(), VkError> {
        unsafe { self.device.device.device_wait_idle() }.map_err(VkError::DeviceIdleFailed)
    }
}

impl Drop for VkRenderer {
    fn drop(&mut self) {
        // Nothing may be destroyed while the GPU still uses it.
        unsafe { self.device.device.device_wait_idle().ok() };
        debug!(
            "tearing down vulkan chain (surface {:?})",
            self.surface.handle
        );
    }
}
