// SPDX-License-Identifier: CEPL-1.0
use ash::khr::swapchain;
use ash::vk;
use rubik_render::RenderSize;
use tracing::info;

use crate::device::LogicalDevice;
use crate::instance::{Surface, VkInstance};
use crate::probe::SwapchainSupport;
use crate::VkError;

/// Preferred 32-bit sRGB format, else whatever the surface lists first.
pub fn choose_surface_format(formats: &[vk::SurfaceFormatKHR]) -> Option<vk::SurfaceFormatKHR> {
    formats
        .iter()
        .copied()
        .find(|f| {
            f.format == vk::Format::B8G8R8A8_SRGB
                && f.color_space == vk::ColorSpaceKHR::SRGB_NONLINEAR
        })
        .or_else(|| formats.first().copied())
}

/// MAILBOX when offered, otherwise FIFO, which every implementation must support.
pub fn choose_present_mode(modes: &[vk::PresentModeKHR]) -> vk::PresentModeKHR {
    if modes.contains(&vk::PresentModeKHR::MAILBOX) {
        vk::PresentModeKHR::MAILBOX
    } else {
        vk::PresentModeKHR::FIFO
    }
}

/// `u32::MAX` in `current_extent` means the surface lets us pick.
pub fn choose_extent(caps: &vk::SurfaceCapabilitiesKHR, drawable: RenderSize) -> vk::Extent2D {
    if caps.current_extent.width != u32::MAX {
        caps.current_extent
    } else {
        vk::Extent2D {
            width: drawable
                .width
                .clamp(caps.min_image_extent.width, caps.max_image_extent.width),
            height: drawable
                .height
                .clamp(caps.min_image_extent.height, caps.max_image_extent.height),
        }
    }
}

/// One more than the minimum; a zero maximum means unbounded.
pub fn choose_image_count(caps: &vk::SurfaceCapabilitiesKHR) -> u32 {
    let want = caps.min_image_count + 1;
    if caps.max_image_count > 0 {
        want.min(caps.max_image_count)
    } else {
        want
    }
}

/// Concurrent sharing only when graphics and present live in different families.
pub fn choose_sharing(graphics_family: u32, present_family: u32) -> (vk::SharingMode, Vec<u32>) {
    if graphics_family != present_family {
        (
            vk::SharingMode::CONCURRENT,
            vec![graphics_family, present_family],
        )
    } else {
        (vk::SharingMode::EXCLUSIVE, Vec::new())
    }
}

/// Swapchain, its driver-owned images and our views onto them.
pub(crate) struct PresentationChain {
    device: ash::Device,
    pub(crate) loader: swapchain::Device,
    pub(crate) swapchain: vk::SwapchainKHR,
    pub(crate) images: Vec<vk::Image>,
    pub(crate) image_views: Vec<vk::ImageView>,
    pub(crate) format: vk::SurfaceFormatKHR,
    pub(crate) present_mode: vk::PresentModeKHR,
    pub(crate) extent: vk::Extent2D,
}

impl PresentationChain {
    pub(crate) fn new(
        instance: &VkInstance,
        gpu: &LogicalDevice,
        surface: &Surface,
        support: &SwapchainSupport,
        drawable: RenderSize,
    ) -> Result<Self, VkError> {
        let caps = &support.capabilities;
        let format = choose_surface_format(&support.formats)
            .ok_or(VkError::SwapchainCreationFailed(vk::Result::ERROR_FORMAT_NOT_SUPPORTED))?;
        let present_mode = choose_present_mode(&support.present_modes);
        let extent = choose_extent(caps, drawable);
        let image_count = choose_image_count(caps);
        let (sharing_mode, families) = choose_sharing(gpu.graphics_family, gpu.present_family);

        info!(
            "swapchain: format {:?} / {:?}, present_mode {:?}, extent {}x{}, images(min={} -> requested={})",
            format.format,
            format.color_space,
            present_mode,
            extent.width,
            extent.height,
            caps.min_image_count,
            image_count
        );

        let swap_info = vk::SwapchainCreateInfoKHR {
            s_type: vk::StructureType::SWAPCHAIN_CREATE_INFO_KHR,
            surface: surface.handle,
            min_image_count: image_count,
            image_format: format.format,
            image_color_space: format.color_space,
            image_extent: extent,
            image_array_layers: 1,
            image_usage: vk::ImageUsageFlags::COLOR_ATTACHMENT,
            image_sharing_mode: sharing_mode,
            queue_family_index_count: families.len() as u32,
            p_queue_family_indices: families.as_ptr(),
            pre_transform: caps.current_transform,
            composite_alpha: vk::CompositeAlphaFlagsKHR::OPAQUE,
            present_mode,
            clipped: vk::TRUE,
            old_swapchain: vk::SwapchainKHR::null(),
            ..Default::default()
        };

        let loader = swapchain::Device::new(&instance.instance, &gpu.device);
        let swapchain = unsafe { loader.create_swapchain(&swap_info, None) }
            .map_err(VkError::SwapchainCreationFailed)?;

        let mut chain = Self {
            device: gpu.device.clone(),
            loader,
            swapchain,
            images: Vec::new(),
            image_views: Vec::new(),
            format,
            present_mode,
            extent,
        };

        // The driver may hand back more images than requested.
        chain.images = unsafe { chain.loader.get_swapchain_images(chain.swapchain) }
            .map_err(VkError::SwapchainCreationFailed)?;

        for &image in &chain.images {
            let iv_info = vk::ImageViewCreateInfo {
                s_type: vk::StructureType::IMAGE_VIEW_CREATE_INFO,
                image,
                view_type: vk::ImageViewType::TYPE_2D,
                format: format.format,
                components: vk::ComponentMapping {
                    r: vk::ComponentSwizzle::IDENTITY,
                    g: vk::ComponentSwizzle::IDENTITY,
                    b: vk::ComponentSwizzle::IDENTITY,
                    a: vk::ComponentSwizzle::IDENTITY,
                },
                subresource_range: vk::ImageSubresourceRange {
                    aspect_mask: vk::ImageAspectFlags::COLOR,
                    base_mip_level: 0,
                    level_count: 1,
                    base_array_layer: 0,
                    layer_count: 1,
                },
                ..Default::default()
            };
            let view = unsafe { chain.device.create_image_view(&iv_info, None) }
                .map_err(VkError::ImageViewCreationFailed)?;
            chain.image_views.push(view);
        }

        info!("swapchain ready with {} images", chain.images.len());
        Ok(chain)
    }
}

impl Drop for PresentationChain {
    fn drop(&mut self) {
        unsafe {
            for &iv in &self.image_views {
                self.device.destroy_image_view(iv, None);
            }
            self.loader.destroy_swapchain(self.swapchain, None);
        }
    }
}
