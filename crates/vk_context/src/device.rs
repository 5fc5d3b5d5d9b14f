//! Logical device and queue creation

use std::ffi::CStr;

use ash::{vk, Device, Instance};

use crate::error::{VulkanError, VulkanResult};
use crate::physical_device::PhysicalDeviceInfo;
use crate::queue_family::QueueFamilies;

const QUEUE_PRIORITIES: [f32; 1] = [1.0];

/// One queue request per distinct family, each with a single queue at
/// priority 1.0
pub fn queue_create_infos(families: QueueFamilies) -> Vec<vk::DeviceQueueCreateInfo> {
    families
        .unique()
        .into_iter()
        .map(|family| {
            vk::DeviceQueueCreateInfo::builder()
                .queue_family_index(family)
                .queue_priorities(&QUEUE_PRIORITIES)
                .build()
        })
        .collect()
}

/// Logical device wrapper with RAII cleanup
pub struct LogicalDevice {
    /// Vulkan logical device handle
    pub device: Device,
    /// Graphics operations queue
    pub graphics_queue: vk::Queue,
    /// Surface presentation queue
    pub present_queue: vk::Queue,
    /// Families the queues were taken from
    pub queue_families: QueueFamilies,
}

impl LogicalDevice {
    /// Create the device with no optional features and fetch queue 0 of each
    /// role's family
    pub fn new(
        instance: &Instance,
        physical_device: &PhysicalDeviceInfo,
        required_extensions: &[&CStr],
    ) -> VulkanResult<Self> {
        let families = physical_device.queue_families;
        let queue_infos = queue_create_infos(families);
        let extension_ptrs: Vec<*const std::os::raw::c_char> =
            required_extensions.iter().map(|ext| ext.as_ptr()).collect();
        let device_features = vk::PhysicalDeviceFeatures::default();

        let create_info = vk::DeviceCreateInfo::builder()
            .queue_create_infos(&queue_infos)
            .enabled_extension_names(&extension_ptrs)
            .enabled_features(&device_features);

        let device = unsafe {
            instance
                .create_device(physical_device.device, &create_info, None)
                .map_err(VulkanError::DeviceCreationFailed)?
        };

        let graphics_queue = unsafe { device.get_device_queue(families.graphics, 0) };
        let present_queue = unsafe { device.get_device_queue(families.present, 0) };

        log::info!(
            "Created logical device on {} ({} queue request(s))",
            physical_device.name,
            queue_infos.len()
        );

        Ok(Self {
            device,
            graphics_queue,
            present_queue,
            queue_families: families,
        })
    }

    /// Block until the device has finished all submitted work
    pub fn wait_idle(&self) -> VulkanResult<()> {
        unsafe { self.device.device_wait_idle() }.map_err(VulkanError::Api)
    }
}

impl Drop for LogicalDevice {
    fn drop(&mut self) {
        unsafe {
            let _ = self.device.device_wait_idle();
            self.device.destroy_device(None);
        }
    }
}
