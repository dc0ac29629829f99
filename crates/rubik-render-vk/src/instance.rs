// SPDX-License-Identifier: CEPL-1.0
use std::ffi::{c_char, c_void, CStr};

use ash::khr::surface;
use ash::{vk, Entry, Instance};
use raw_window_handle::{RawDisplayHandle, RawWindowHandle};
use tracing::{debug, info};

use crate::debug::{check_layer_support, messenger_create_info, Diagnostics};
use crate::VkError;

const APP_NAME: &CStr = c"Rubik Rescue";
const ENGINE_NAME: &CStr = c"Rubik";

/// Loader entry plus the instance created from it. Destroyed last.
pub(crate) struct VkInstance {
    pub(crate) entry: Entry,
    pub(crate) instance: Instance,
}

impl VkInstance {
    pub(crate) fn new(display_raw: RawDisplayHandle, diagnostics: Diagnostics) -> Result<Self, VkError> {
        let entry = unsafe { Entry::load()? };
        check_layer_support(&entry, diagnostics)?;

        let app_info = vk::ApplicationInfo {
            s_type: vk::StructureType::APPLICATION_INFO,
            p_application_name: APP_NAME.as_ptr(),
            application_version: vk::make_api_version(0, 1, 0, 0),
            p_engine_name: ENGINE_NAME.as_ptr(),
            engine_version: vk::make_api_version(0, 1, 0, 0),
            api_version: vk::API_VERSION_1_0,
            ..Default::default()
        };

        let ext_slice = ash_window::enumerate_required_extensions(display_raw)
            .map_err(VkError::InstanceCreationFailed)?;
        let mut extensions: Vec<*const c_char> = ext_slice.to_vec();
        extensions.extend(diagnostics.instance_extensions().iter().map(|e| e.as_ptr()));

        let layers: Vec<*const c_char> = diagnostics.layers().iter().map(|l| l.as_ptr()).collect();

        // Chained so instance creation and destruction are covered by the callback too.
        let debug_ci = messenger_create_info();
        let p_next: *const c_void = if diagnostics.enabled {
            (&debug_ci as *const vk::DebugUtilsMessengerCreateInfoEXT).cast()
        } else {
            std::ptr::null()
        };

        let create_info = vk::InstanceCreateInfo {
            s_type: vk::StructureType::INSTANCE_CREATE_INFO,
            p_next,
            p_application_info: &app_info,
            enabled_extension_count: extensions.len() as u32,
            pp_enabled_extension_names: extensions.as_ptr(),
            enabled_layer_count: layers.len() as u32,
            pp_enabled_layer_names: layers.as_ptr(),
            ..Default::default()
        };

        let instance = unsafe { entry.create_instance(&create_info, None) }
            .map_err(VkError::InstanceCreationFailed)?;
        info!(
            "vulkan instance ready (diagnostics={})",
            diagnostics.enabled
        );

        if let Ok(available) = unsafe { entry.enumerate_instance_extension_properties(None) } {
            debug!("available instance extensions:");
            for ext in &available {
                if let Ok(name) = ext.extension_name_as_c_str() {
                    debug!("\t{}", name.to_string_lossy());
                }
            }
        }

        Ok(Self { entry, instance })
    }
}

impl Drop for VkInstance {
    fn drop(&mut self) {
        unsafe { self.instance.destroy_instance(None) };
    }
}

/// Presentation surface bound to the window.
pub(crate) struct Surface {
    pub(crate) loader: surface::Instance,
    pub(crate) handle: vk::SurfaceKHR,
}

impl Surface {
    pub(crate) fn new(
        instance: &VkInstance,
        display_raw: RawDisplayHandle,
        window_raw: RawWindowHandle,
    ) -> Result<Self, VkError> {
        let handle = unsafe {
            ash_window::create_surface(&instance.entry, &instance.instance, display_raw, window_raw, None)
        }
        .map_err(VkError::SurfaceCreationFailed)?;
        let loader = surface::Instance::new(&instance.entry, &instance.instance);
        Ok(Self { loader, handle })
    }
}

impl Drop for Surface {
    fn drop(&mut self) {
        unsafe { self.loader.destroy_surface(self.handle, None) };
    }
}
