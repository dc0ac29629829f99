// SPDX-License-Identifier: CEPL-1.0
//! Read-only device queries. Nothing here creates or mutates a Vulkan object.

use std::ffi::CStr;

use ash::khr::swapchain;
use ash::{vk, Instance};
use tracing::debug;

use crate::instance::Surface;
use crate::VkError;

/// Device extensions every candidate must offer.
pub const REQUIRED_DEVICE_EXTENSIONS: [&CStr; 1] = [swapchain::NAME];

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct QueueFamilyIndices {
    pub graphics: Option<u32>,
    pub present: Option<u32>,
}

impl QueueFamilyIndices {
    pub fn is_complete(&self) -> bool {
        self.graphics.is_some() && self.present.is_some()
    }
}

/// Surface capabilities for one device/surface pair. Re-derived per device, never cached.
#[derive(Clone, Debug, Default)]
pub struct SwapchainSupport {
    pub capabilities: vk::SurfaceCapabilitiesKHR,
    pub formats: Vec<vk::SurfaceFormatKHR>,
    pub present_modes: Vec<vk::PresentModeKHR>,
}

#[derive(Clone, Debug)]
pub struct DeviceCandidate {
    pub handle: vk::PhysicalDevice,
    pub name: String,
    pub device_type: vk::PhysicalDeviceType,
    pub max_image_dimension_2d: u32,
    pub geometry_shader: bool,
    pub queue_families: QueueFamilyIndices,
    pub extensions_supported: bool,
    /// Empty unless the required extensions are present.
    pub support: SwapchainSupport,
}

impl DeviceCandidate {
    pub fn supports_graphics_queue(&self) -> bool {
        self.queue_families.graphics.is_some()
    }

    pub fn supports_present_queue(&self) -> bool {
        self.queue_families.present.is_some()
    }

    pub fn has_formats(&self) -> bool {
        !self.support.formats.is_empty()
    }

    pub fn has_present_modes(&self) -> bool {
        !self.support.present_modes.is_empty()
    }
}

/// Walks the families in order, keeping the latest graphics-capable and
/// present-capable index, and stops once both are known.
pub fn find_queue_families(
    families: &[vk::QueueFamilyProperties],
    mut present_support: impl FnMut(u32) -> bool,
) -> QueueFamilyIndices {
    let mut indices = QueueFamilyIndices::default();
    for (i, family) in families.iter().enumerate() {
        let i = i as u32;
        if family.queue_flags.contains(vk::QueueFlags::GRAPHICS) {
            indices.graphics = Some(i);
        }
        if present_support(i) {
            indices.present = Some(i);
        }
        if indices.is_complete() {
            break;
        }
    }
    indices
}

pub fn missing_extensions<'a>(
    available: &[vk::ExtensionProperties],
    required: &[&'a CStr],
) -> Vec<&'a CStr> {
    required
        .iter()
        .copied()
        .filter(|want| {
            !available
                .iter()
                .any(|e| e.extension_name_as_c_str().is_ok_and(|name| name == *want))
        })
        .collect()
}

fn query_err(what: &'static str) -> impl FnOnce(vk::Result) -> VkError {
    move |result| VkError::DeviceQueryFailed { what, result }
}

pub(crate) fn query_swapchain_support(
    surface: &Surface,
    phys: vk::PhysicalDevice,
) -> Result<SwapchainSupport, VkError> {
    unsafe {
        let capabilities = surface
            .loader
            .get_physical_device_surface_capabilities(phys, surface.handle)
            .map_err(query_err("surface capabilities"))?;
        let formats = surface
            .loader
            .get_physical_device_surface_formats(phys, surface.handle)
            .map_err(query_err("surface formats"))?;
        let present_modes = surface
            .loader
            .get_physical_device_surface_present_modes(phys, surface.handle)
            .map_err(query_err("surface present modes"))?;
        Ok(SwapchainSupport {
            capabilities,
            formats,
            present_modes,
        })
    }
}

fn probe_one(
    instance: &Instance,
    surface: &Surface,
    phys: vk::PhysicalDevice,
) -> Result<DeviceCandidate, VkError> {
    let (props, features, families, extensions) = unsafe {
        (
            instance.get_physical_device_properties(phys),
            instance.get_physical_device_features(phys),
            instance.get_physical_device_queue_family_properties(phys),
            instance
                .enumerate_device_extension_properties(phys)
                .map_err(query_err("device extensions"))?,
        )
    };

    let queue_families = find_queue_families(&families, |i| unsafe {
        surface
            .loader
            .get_physical_device_surface_support(phys, i, surface.handle)
            .unwrap_or(false)
    });

    let missing = missing_extensions(&extensions, &REQUIRED_DEVICE_EXTENSIONS);
    let extensions_supported = missing.is_empty();
    let support = if extensions_supported {
        query_swapchain_support(surface, phys)?
    } else {
        SwapchainSupport::default()
    };

    let name = props
        .device_name_as_c_str()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|_| "<unnamed>".to_owned());

    debug!(
        "probed {name}: type={:?} max2d={} geometry={} queues={:?} missing_exts={:?} formats={} modes={}",
        props.device_type,
        props.limits.max_image_dimension2_d,
        features.geometry_shader == vk::TRUE,
        queue_families,
        missing,
        support.formats.len(),
        support.present_modes.len(),
    );

    Ok(DeviceCandidate {
        handle: phys,
        name,
        device_type: props.device_type,
        max_image_dimension_2d: props.limits.max_image_dimension2_d,
        geometry_shader: features.geometry_shader == vk::TRUE,
        queue_families,
        extensions_supported,
        support,
    })
}

/// One candidate per physical device, in enumeration order.
pub(crate) fn probe_devices(
    instance: &Instance,
    surface: &Surface,
) -> Result<Vec<DeviceCandidate>, VkError> {
    let devices = unsafe { instance.enumerate_physical_devices() }
        .map_err(query_err("physical devices"))?;
    if devices.is_empty() {
        return Err(VkError::NoDevicesFound);
    }
    devices
        .into_iter()
        .map(|phys| probe_one(instance, surface, phys))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::c_char;

    fn family(flags: vk::QueueFlags) -> vk::QueueFamilyProperties {
        vk::QueueFamilyProperties {
            queue_flags: flags,
            queue_count: 1,
            ..Default::default()
        }
    }

    fn ext(name: &CStr) -> vk::ExtensionProperties {
        let mut props = vk::ExtensionProperties::default();
        for (dst, &b) in props.extension_name.iter_mut().zip(name.to_bytes()) {
            *dst = b as c_char;
        }
        props
    }

    #[test]
    fn one_family_can_serve_both_roles() {
        let families = [family(vk::QueueFlags::GRAPHICS | vk::QueueFlags::COMPUTE)];
        let idx = find_queue_families(&families, |_| true);
        assert_eq!(
            idx,
            QueueFamilyIndices {
                graphics: Some(0),
                present: Some(0)
            }
        );
        assert!(idx.is_complete());
    }

    #[test]
    fn split_families_are_both_found() {
        let families = [
            family(vk::QueueFlags::GRAPHICS),
            family(vk::QueueFlags::TRANSFER),
            family(vk::QueueFlags::COMPUTE),
        ];
        let idx = find_queue_families(&families, |i| i == 2);
        assert_eq!(idx.graphics, Some(0));
        assert_eq!(idx.present, Some(2));
    }

    #[test]
    fn search_stops_once_complete() {
        let families = [
            family(vk::QueueFlags::GRAPHICS),
            family(vk::QueueFlags::GRAPHICS),
        ];
        let mut asked = Vec::new();
        let idx = find_queue_families(&families, |i| {
            asked.push(i);
            true
        });
        assert_eq!(idx.graphics, Some(0));
        assert_eq!(asked, [0]);
    }

    #[test]
    fn no_present_support_is_incomplete() {
        let families = [family(vk::QueueFlags::GRAPHICS)];
        let idx = find_queue_families(&families, |_| false);
        assert!(!idx.is_complete());
        assert_eq!(idx.present, None);
    }

    #[test]
    fn swapchain_extension_detection() {
        let with = [ext(c"VK_KHR_maintenance1"), ext(swapchain::NAME)];
        assert!(missing_extensions(&with, &REQUIRED_DEVICE_EXTENSIONS).is_empty());

        let without = [ext(c"VK_KHR_maintenance1")];
        assert_eq!(
            missing_extensions(&without, &REQUIRED_DEVICE_EXTENSIONS),
            [swapchain::NAME]
        );
    }
}
