// SPDX-License-Identifier: CEPL-1.0
use std::collections::BTreeSet;
use std::ffi::c_char;

use ash::{vk, Instance};
use tracing::info;

use crate::debug::Diagnostics;
use crate::probe::{QueueFamilyIndices, REQUIRED_DEVICE_EXTENSIONS};
use crate::VkError;

const QUEUE_PRIORITY: [f32; 1] = [1.0];

/// Families that need a queue request; graphics and present may coincide.
pub fn unique_queue_families(indices: QueueFamilyIndices) -> Vec<u32> {
    indices
        .graphics
        .into_iter()
        .chain(indices.present)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

pub(crate) struct LogicalDevice {
    pub(crate) device: ash::Device,
    pub(crate) graphics_queue: vk::Queue,
    pub(crate) present_queue: vk::Queue,
    pub(crate) graphics_family: u32,
    pub(crate) present_family: u32,
}

impl LogicalDevice {
    pub(crate) fn new(
        instance: &Instance,
        phys: vk::PhysicalDevice,
        indices: QueueFamilyIndices,
        diagnostics: Diagnostics,
    ) -> Result<Self, VkError> {
        let (Some(graphics_family), Some(present_family)) = (indices.graphics, indices.present)
        else {
            return Err(VkError::NoSuitableDevice);
        };

        let queue_infos: Vec<vk::DeviceQueueCreateInfo> = unique_queue_families(indices)
            .into_iter()
            .map(|family| vk::DeviceQueueCreateInfo {
                s_type: vk::StructureType::DEVICE_QUEUE_CREATE_INFO,
                queue_family_index: family,
                queue_count: 1,
                p_queue_priorities: QUEUE_PRIORITY.as_ptr(),
                ..Default::default()
            })
            .collect();

        let device_exts: Vec<*const c_char> =
            REQUIRED_DEVICE_EXTENSIONS.iter().map(|e| e.as_ptr()).collect();
        // Device layers are ignored by current loaders but older ones still read them.
        let layers: Vec<*const c_char> = diagnostics.layers().iter().map(|l| l.as_ptr()).collect();
        let features = vk::PhysicalDeviceFeatures::default();

        let dinfo = vk::DeviceCreateInfo {
            s_type: vk::StructureType::DEVICE_CREATE_INFO,
            queue_create_info_count: queue_infos.len() as u32,
            p_queue_create_infos: queue_infos.as_ptr(),
            enabled_extension_count: device_exts.len() as u32,
            pp_enabled_extension_names: device_exts.as_ptr(),
            enabled_layer_count: layers.len() as u32,
            pp_enabled_layer_names: layers.as_ptr(),
            p_enabled_features: &features,
            ..Default::default()
        };

        let device = unsafe { instance.create_device(phys, &dinfo, None) }
            .map_err(VkError::DeviceCreationFailed)?;

        let (graphics_queue, present_queue) = unsafe {
            (
                device.get_device_queue(graphics_family, 0),
                device.get_device_queue(present_family, 0),
            )
        };
        info!(
            "logical device ready (graphics family {}, present family {})",
            graphics_family, present_family
        );

        Ok(Self {
            device,
            graphics_queue,
            present_queue,
            graphics_family,
            present_family,
        })
    }
}

impl Drop for LogicalDevice {
    fn drop(&mut self) {
        unsafe { self.device.destroy_device(None) };
    }
}
