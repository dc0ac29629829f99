// SPDX-License-Identifier: CEPL-1.0
use ash::vk;
use tracing::info;

use crate::probe::DeviceCandidate;
use crate::VkError;

pub const DISCRETE_GPU_BONUS: u32 = 1000;

/// Flat conjunction of the eligibility predicates, independent of scoring.
pub fn is_suitable(c: &DeviceCandidate) -> bool {
    c.geometry_shader
        && c.supports_graphics_queue()
        && c.supports_present_queue()
        && c.extensions_supported
        && c.has_formats()
        && c.has_present_modes()
}

/// Discrete GPUs get a flat bonus on top of their largest 2D image dimension.
/// Unsuitable devices score 0.
pub fn rate(c: &DeviceCandidate) -> u32 {
    if !is_suitable(c) {
        return 0;
    }
    let bonus = if c.device_type == vk::PhysicalDeviceType::DISCRETE_GPU {
        DISCRETE_GPU_BONUS
    } else {
        0
    };
    bonus.saturating_add(c.max_image_dimension_2d)
}

/// Highest-scoring candidate; the first one wins a tie.
pub fn select_device(candidates: &[DeviceCandidate]) -> Result<&DeviceCandidate, VkError> {
    let mut best: Option<(u32, &DeviceCandidate)> = None;
    for c in candidates {
        let score = rate(c);
        if best.map_or(true, |(top, _)| score > top) {
            best = Some((score, c));
        }
    }

    match best {
        None => Err(VkError::NoDevicesFound),
        Some((0, _)) => Err(VkError::NoSuitableDevice),
        Some((score, c)) => {
            info!("selected GPU {} ({:?}, score {})", c.name, c.device_type, score);
            Ok(c)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::{QueueFamilyIndices, SwapchainSupport};
    use ash::vk::Handle;
    use rubik_render::ErrorKind;

    fn candidate(raw: u64, device_type: vk::PhysicalDeviceType, max2d: u32) -> DeviceCandidate {
        DeviceCandidate {
            handle: vk::PhysicalDevice::from_raw(raw),
            name: format!("gpu{raw}"),
            device_type,
            max_image_dimension_2d: max2d,
            geometry_shader: true,
            queue_families: QueueFamilyIndices {
                graphics: Some(0),
                present: Some(0),
            },
            extensions_supported: true,
            support: SwapchainSupport {
                capabilities: vk::SurfaceCapabilitiesKHR::default(),
                formats: vec![vk::SurfaceFormatKHR {
                    format: vk::Format::B8G8R8A8_SRGB,
                    color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
                }],
                present_modes: vec![vk::PresentModeKHR::FIFO],
            },
        }
    }

    fn discrete(raw: u64, max2d: u32) -> DeviceCandidate {
        candidate(raw, vk::PhysicalDeviceType::DISCRETE_GPU, max2d)
    }

    fn integrated(raw: u64, max2d: u32) -> DeviceCandidate {
        candidate(raw, vk::PhysicalDeviceType::INTEGRATED_GPU, max2d)
    }

    /// Each knocks out exactly one eligibility predicate.
    fn breakers() -> Vec<fn(&mut DeviceCandidate)> {
        type Breaker = fn(&mut DeviceCandidate);
        vec![
            (|c: &mut DeviceCandidate| c.geometry_shader = false) as Breaker,
            |c: &mut DeviceCandidate| c.queue_families.graphics = None,
            |c: &mut DeviceCandidate| c.queue_families.present = None,
            |c: &mut DeviceCandidate| c.extensions_supported = false,
            |c: &mut DeviceCandidate| c.support.formats.clear(),
            |c: &mut DeviceCandidate| c.support.present_modes.clear(),
        ]
    }

    #[test]
    fn discrete_gpu_scores_bonus_plus_dimension() {
        assert_eq!(rate(&discrete(1, 16384)), 1000 + 16384);
        assert_eq!(rate(&integrated(1, 8192)), 8192);
    }

    #[test]
    fn each_failed_predicate_forces_zero() {
        for brk in breakers() {
            let mut c = discrete(1, 16384);
            brk(&mut c);
            assert!(!is_suitable(&c));
            assert_eq!(rate(&c), 0);
        }
    }

    #[test]
    fn empty_list_is_no_devices() {
        let err = select_device(&[]).unwrap_err();
        assert!(matches!(err, VkError::NoDevicesFound));
    }

    #[test]
    fn lone_device_without_geometry_is_unsuitable() {
        let mut c = discrete(1, 16384);
        c.geometry_shader = false;
        let err = select_device(&[c]).unwrap_err();
        assert!(matches!(err, VkError::NoSuitableDevice));
        assert_eq!(err.kind(), ErrorKind::DeviceSelection);
    }

    #[test]
    fn all_ineligible_never_selects() {
        let list: Vec<_> = breakers()
            .into_iter()
            .enumerate()
            .map(|(i, brk)| {
                let mut c = discrete(i as u64 + 1, 32768);
                brk(&mut c);
                c
            })
            .collect();
        assert!(matches!(
            select_device(&list),
            Err(VkError::NoSuitableDevice)
        ));
    }

    #[test]
    fn discrete_bonus_wins_at_equal_dimension() {
        let list = [integrated(1, 8192), discrete(2, 8192), integrated(3, 4096)];
        let picked = select_device(&list).unwrap();
        assert_eq!(picked.handle.as_raw(), 2);
        assert!(rate(picked) >= 1000 + 8192);
    }

    #[test]
    fn dimension_can_outweigh_the_bonus() {
        let list = [discrete(1, 4096), integrated(2, 16384)];
        assert_eq!(select_device(&list).unwrap().handle.as_raw(), 2);
    }

    #[test]
    fn ineligible_discrete_loses_to_eligible_integrated() {
        let mut big = discrete(1, 32768);
        big.support.present_modes.clear();
        let list = [big, integrated(2, 4096)];
        assert_eq!(select_device(&list).unwrap().handle.as_raw(), 2);
    }

    #[test]
    fn first_wins_a_tie() {
        let list = [discrete(7, 8192), discrete(8, 8192)];
        assert_eq!(select_device(&list).unwrap().handle.as_raw(), 7);
    }
}
