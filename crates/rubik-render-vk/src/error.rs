// SPDX-License-Identifier: CEPL-1.0
use ash::vk;
use rubik_render::{ErrorKind, ShaderError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum VkError {
    #[error("vulkan loader unavailable: {0}")]
    LoaderUnavailable(#[from] ash::LoadingError),
    #[error("window handle unavailable: {0}")]
    WindowHandle(#[from] raw_window_handle::HandleError),
    #[error("failed to list instance layers: {0}")]
    LayerQueryFailed(vk::Result),
    #[error("validation layers requested, but {0} is unavailable")]
    ValidationLayerUnavailable(String),
    #[error("failed to create vulkan instance: {0}")]
    InstanceCreationFailed(vk::Result),
    #[error("failed to create debug messenger: {0}")]
    DebugMessengerCreationFailed(vk::Result),
    #[error("failed to create window surface: {0}")]
    SurfaceCreationFailed(vk::Result),

    #[error("device query `{what}` failed: {result}")]
    DeviceQueryFailed {
        what: &'static str,
        result: vk::Result,
    },
    #[error("failed to find a GPU with Vulkan support")]
    NoDevicesFound,
    #[error("failed to find a suitable GPU")]
    NoSuitableDevice,

    #[error("failed to create logical device: {0}")]
    DeviceCreationFailed(vk::Result),
    #[error("failed to create swapchain: {0}")]
    SwapchainCreationFailed(vk::Result),
    #[error("failed to create swapchain image view: {0}")]
    ImageViewCreationFailed(vk::Result),
    #[error(transparent)]
    Shader(#[from] ShaderError),
    #[error("shader `{name}` is not valid SPIR-V: {source}")]
    InvalidShaderBytecode {
        name: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to create shader module: {0}")]
    ShaderModuleCreationFailed(vk::Result),
    #[error("failed to create render pass: {0}")]
    RenderPassCreationFailed(vk::Result),
    #[error("failed to create pipeline layout: {0}")]
    PipelineLayoutCreationFailed(vk::Result),
    #[error("failed to create graphics pipeline: {0}")]
    GraphicsPipelineCreationFailed(vk::Result),
    #[error("failed to create framebuffer: {0}")]
    FramebufferCreationFailed(vk::Result),
    #[error("failed to create command pool: {0}")]
    CommandPoolCreationFailed(vk::Result),
    #[error("failed to allocate command buffer: {0}")]
    CommandBufferAllocationFailed(vk::Result),
    #[error("failed to create sync objects: {0}")]
    SyncObjectCreationFailed(vk::Result),

    #[error("failed to record command buffer: {0}")]
    CommandRecordingFailed(vk::Result),
    #[error("no framebuffer for swapchain image {image_index}")]
    MissingFramebuffer { image_index: u32 },

    #[error("waiting on the in-flight fence failed: {0}")]
    FenceWaitFailed(vk::Result),
    #[error("failed to acquire swapchain image: {0}")]
    AcquireImageFailed(vk::Result),
    #[error("failed to submit draw command buffer: {0}")]
    SubmitFailed(vk::Result),
    #[error("failed to present swapchain image: {0}")]
    PresentFailed(vk::Result),
    #[error("waiting for device idle failed: {0}")]
    DeviceIdleFailed(vk::Result),
}

impl VkError {
    pub fn kind(&self) -> ErrorKind {
        use VkError::*;
        match self {
            LoaderUnavailable(_)
            | WindowHandle(_)
            | LayerQueryFailed(_)
            | ValidationLayerUnavailable(_)
            | InstanceCreationFailed(_)
            | DebugMessengerCreationFailed(_)
            | SurfaceCreationFailed(_) => ErrorKind::Initialization,

            DeviceQueryFailed { .. } | NoDevicesFound | NoSuitableDevice => {
                ErrorKind::DeviceSelection
            }

            Shader(e) => e.kind(),

            DeviceCreationFailed(_)
            | SwapchainCreationFailed(_)
            | ImageViewCreationFailed(_)
            | InvalidShaderBytecode { .. }
            | ShaderModuleCreationFailed(_)
            | RenderPassCreationFailed(_)
            | PipelineLayoutCreationFailed(_)
            | GraphicsPipelineCreationFailed(_)
            | FramebufferCreationFailed(_)
            | CommandPoolCreationFailed(_)
            | CommandBufferAllocationFailed(_)
            | SyncObjectCreationFailed(_) => ErrorKind::ResourceCreation,

            CommandRecordingFailed(_) | MissingFramebuffer { .. } => ErrorKind::Recording,

            FenceWaitFailed(_)
            | AcquireImageFailed(_)
            | SubmitFailed(_)
            | PresentFailed(_)
            | DeviceIdleFailed(_) => ErrorKind::Frame,
        }
    }
}
