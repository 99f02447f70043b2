use log::*;
use std::rc::Rc;
use vulkanalia::vk::{self, HasBuilder};

use super::adapter::Adapter;
use super::constants;
use super::driver::Driver;
use super::error::RenderError;
use super::handle::Owned;

/// The logical device and the queues the frame loop submits and presents on.
#[derive(Debug)]
pub struct VulkanDevice<D: Driver> {
    device: Owned<D, vk::Device>,
    pub graphics_queue: vk::Queue,
    pub present_queue: vk::Queue,
}

impl<D: Driver> VulkanDevice<D> {
    /// `layers` are the instance's validation layers, mirrored for drivers
    /// that still honour device layers.
    pub unsafe fn create(
        driver: &Rc<D>,
        adapter: &Adapter,
        layers: &[vk::ExtensionName],
        portability: bool,
    ) -> Result<Self, RenderError> {
        let queue_priorities = &[1.0];
        let queue_infos = adapter
            .families
            .unique()
            .into_iter()
            .map(|family| {
                vk::DeviceQueueCreateInfo::builder()
                    .queue_family_index(family)
                    .queue_priorities(queue_priorities)
            })
            .collect::<Vec<_>>();

        let layers = layers.iter().map(|l| l.as_ptr()).collect::<Vec<_>>();

        let mut extensions = constants::DEVICE_EXTENSIONS
            .iter()
            .map(|e| e.as_ptr())
            .collect::<Vec<_>>();

        // Required by Vulkan SDK on macOS since 1.3.216.
        if portability {
            extensions.push(vk::KHR_PORTABILITY_SUBSET_EXTENSION.name.as_ptr());
        }

        let features = vk::PhysicalDeviceFeatures::builder();

        let info = vk::DeviceCreateInfo::builder()
            .queue_create_infos(&queue_infos)
            .enabled_layer_names(&layers)
            .enabled_extension_names(&extensions)
            .enabled_features(&features);

        let device = driver
            .create_device(adapter.handle, &info)
            .map_err(RenderError::DeviceCreation)?;
        let device = Owned::new(driver, device);

        let graphics_queue = driver
            .device_queue(adapter.families.graphics, 0)
            .map_err(RenderError::DeviceCreation)?;
        let present_queue = driver
            .device_queue(adapter.families.present, 0)
            .map_err(RenderError::DeviceCreation)?;
        debug!(
            "Created logical device on `{}` (graphics family {}, present family {}).",
            adapter.name, adapter.families.graphics, adapter.families.present
        );

        Ok(Self {
            device,
            graphics_queue,
            present_queue,
        })
    }

    /// Blocks until every queue on the device is idle.
    pub unsafe fn wait_idle(&self, driver: &D) -> Result<(), RenderError> {
        driver.device_wait_idle().map_err(RenderError::DeviceWait)
    }
}
