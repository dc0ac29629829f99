// SPDX-License-Identifier: CEPL-1.0
use std::ffi::{c_void, CStr};

use ash::ext::debug_utils;
use ash::{vk, Entry, Instance};
use tracing::{debug, error, info, trace, warn};

use crate::VkError;

pub const VALIDATION_LAYER: &CStr = c"VK_LAYER_KHRONOS_validation";

/// Diagnostics switch, threaded in explicitly at construction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Diagnostics {
    pub enabled: bool,
}

impl Default for Diagnostics {
    fn default() -> Self {
        Self {
            enabled: cfg!(debug_assertions),
        }
    }
}

impl Diagnostics {
    pub fn layers(&self) -> Vec<&'static CStr> {
        if self.enabled {
            vec![VALIDATION_LAYER]
        } else {
            Vec::new()
        }
    }

    pub fn instance_extensions(&self) -> Vec<&'static CStr> {
        if self.enabled {
            vec![debug_utils::NAME]
        } else {
            Vec::new()
        }
    }
}

/// First requested layer the loader does not offer, if any.
pub fn missing_layer<'a>(
    available: &[vk::LayerProperties],
    required: &[&'a CStr],
) -> Option<&'a CStr> {
    required.iter().copied().find(|want| {
        !available
            .iter()
            .any(|l| l.layer_name_as_c_str().is_ok_and(|name| name == *want))
    })
}

pub(crate) fn check_layer_support(entry: &Entry, diagnostics: Diagnostics) -> Result<(), VkError> {
    let required = diagnostics.layers();
    if required.is_empty() {
        return Ok(());
    }
    let available = unsafe { entry.enumerate_instance_layer_properties() }
        .map_err(VkError::LayerQueryFailed)?;
    match missing_layer(&available, &required) {
        Some(layer) => Err(VkError::ValidationLayerUnavailable(
            layer.to_string_lossy().into_owned(),
        )),
        None => Ok(()),
    }
}

unsafe extern "system" fn debug_callback(
    severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    types: vk::DebugUtilsMessageTypeFlagsEXT,
    data: *const vk::DebugUtilsMessengerCallbackDataEXT<'_>,
    _user: *mut c_void,
) -> vk::Bool32 {
    if data.is_null() {
        return vk::FALSE;
    }
    let msg = unsafe { (*data).message_as_c_str() }
        .map(CStr::to_string_lossy)
        .unwrap_or_default();

    match severity {
        vk::DebugUtilsMessageSeverityFlagsEXT::ERROR => {
            error!(target: "vulkan", "[{:?}] {}", types, msg)
        }
        vk::DebugUtilsMessageSeverityFlagsEXT::WARNING => {
            warn!(target: "vulkan", "[{:?}] {}", types, msg)
        }
        vk::DebugUtilsMessageSeverityFlagsEXT::INFO => {
            info!(target: "vulkan", "[{:?}] {}", types, msg)
        }
        _ => trace!(target: "vulkan", "[{:?}] {}", types, msg),
    }
    // Only layer developers return TRUE here.
    vk::FALSE
}

pub(crate) fn messenger_create_info() -> vk::DebugUtilsMessengerCreateInfoEXT<'static> {
    vk::DebugUtilsMessengerCreateInfoEXT {
        s_type: vk::StructureType::DEBUG_UTILS_MESSENGER_CREATE_INFO_EXT,
        message_severity: vk::DebugUtilsMessageSeverityFlagsEXT::VERBOSE
            | vk::DebugUtilsMessageSeverityFlagsEXT::WARNING
            | vk::DebugUtilsMessageSeverityFlagsEXT::ERROR,
        message_type: vk::DebugUtilsMessageTypeFlagsEXT::GENERAL
            | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION
            | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE,
        pfn_user_callback: Some(debug_callback),
        ..Default::default()
    }
}

pub(crate) struct DebugMessenger {
    loader: debug_utils::Instance,
    handle: vk::DebugUtilsMessengerEXT,
}

impl DebugMessenger {
    pub(crate) fn new(entry: &Entry, instance: &Instance) -> Result<Self, VkError> {
        let loader = debug_utils::Instance::new(entry, instance);
        let ci = messenger_create_info();
        let handle = unsafe { loader.create_debug_utils_messenger(&ci, None) }
            .map_err(VkError::DebugMessengerCreationFailed)?;
        debug!("debug messenger attached");
        Ok(Self { loader, handle })
    }
}

impl Drop for DebugMessenger {
    fn drop(&mut self) {
        unsafe {
            self.loader
                .destroy_debug_utils_messenger(self.handle, None);
        }
    }
}
