use std::collections::HashSet;

use log::*;
use vulkanalia::vk;

use super::constants;
use super::driver::Driver;
use super::error::{RenderError, SuitabilityError};

/// The physical device picked for rendering and the queue families it will
/// be driven through. Enumerated, never destroyed.
#[derive(Clone, Debug)]
pub struct Adapter {
    pub handle: vk::PhysicalDevice,
    pub name: String,
    pub families: QueueFamilies,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct QueueFamilyIndices {
    pub graphics: Option<u32>,
    pub present: Option<u32>,
}

impl QueueFamilyIndices {
    /// Scans the adapter's queue families in order, taking every family that
    /// qualifies for a role until both roles are filled. A family that can do
    /// both therefore wins over an earlier present-only one.
    pub unsafe fn find<D: Driver>(
        driver: &D,
        physical_device: vk::PhysicalDevice,
        surface: vk::SurfaceKHR,
    ) -> Result<Self, RenderError> {
        let properties = driver
            .queue_family_properties(physical_device)
            .map_err(RenderError::AdapterQuery)?;

        let mut indices = Self::default();
        for (index, family) in properties.iter().enumerate() {
            let index = index as u32;

            if family.queue_flags.contains(vk::QueueFlags::GRAPHICS) {
                indices.graphics = Some(index);
            }

            if driver
                .surface_support(physical_device, index, surface)
                .map_err(RenderError::AdapterQuery)?
            {
                indices.present = Some(index);
            }

            if indices.is_complete() {
                break;
            }
        }

        Ok(indices)
    }

    pub fn is_complete(&self) -> bool {
        self.graphics.is_some() && self.present.is_some()
    }

    pub fn families(&self) -> Option<QueueFamilies> {
        Some(QueueFamilies {
            graphics: self.graphics?,
            present: self.present?,
        })
    }
}

/// Resolved queue roles; graphics and present may name the same family.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct QueueFamilies {
    pub graphics: u32,
    pub present: u32,
}

impl QueueFamilies {
    pub fn is_shared(&self) -> bool {
        self.graphics == self.present
    }

    /// Distinct family indices, graphics first.
    pub fn unique(&self) -> Vec<u32> {
        if self.is_shared() {
            vec![self.graphics]
        } else {
            vec![self.graphics, self.present]
        }
    }
}

#[derive(Clone, Debug)]
pub struct SwapchainSupport {
    pub capabilities: vk::SurfaceCapabilitiesKHR,
    pub formats: Vec<vk::SurfaceFormatKHR>,
    pub present_modes: Vec<vk::PresentModeKHR>,
}

impl SwapchainSupport {
    pub unsafe fn get<D: Driver>(
        driver: &D,
        physical_device: vk::PhysicalDevice,
        surface: vk::SurfaceKHR,
    ) -> Result<Self, vk::ErrorCode> {
        Ok(Self {
            capabilities: driver.surface_capabilities(physical_device, surface)?,
            formats: driver.surface_formats(physical_device, surface)?,
            present_modes: driver.surface_present_modes(physical_device, surface)?,
        })
    }

    pub fn is_adequate(&self) -> bool {
        !self.formats.is_empty() && !self.present_modes.is_empty()
    }
}

/// Required extensions the adapter does not advertise.
pub fn missing_extensions(
    required: &[vk::ExtensionName],
    available: &HashSet<vk::ExtensionName>,
) -> Vec<vk::ExtensionName> {
    required
        .iter()
        .filter(|e| !available.contains(*e))
        .copied()
        .collect()
}

/// Everything selection needs to know about one adapter.
#[derive(Clone, Debug)]
pub struct Suitability {
    pub indices: QueueFamilyIndices,
    pub extensions_supported: bool,
    pub swapchain_adequate: bool,
}

impl Suitability {
    pub unsafe fn assess<D: Driver>(
        driver: &D,
        physical_device: vk::PhysicalDevice,
        surface: vk::SurfaceKHR,
    ) -> Result<Self, RenderError> {
        let indices = QueueFamilyIndices::find(driver, physical_device, surface)?;

        let available = driver
            .device_extensions(physical_device)
            .map_err(RenderError::AdapterQuery)?;
        let extensions_supported =
            missing_extensions(constants::DEVICE_EXTENSIONS, &available).is_empty();

        // Surface queries are only meaningful once the swapchain extension exists.
        let swapchain_adequate = extensions_supported
            && SwapchainSupport::get(driver, physical_device, surface)
                .map_err(RenderError::AdapterQuery)?
                .is_adequate();

        Ok(Self {
            indices,
            extensions_supported,
            swapchain_adequate,
        })
    }

    pub fn check(&self) -> Result<QueueFamilies, SuitabilityError> {
        let families = self
            .indices
            .families()
            .ok_or(SuitabilityError("required queue families"))?;
        if !self.extensions_supported {
            return Err(SuitabilityError("required device extensions"));
        }
        if !self.swapchain_adequate {
            return Err(SuitabilityError("adequate swapchain support"));
        }
        Ok(families)
    }
}

/// Picks the first suitable adapter in enumeration order.
pub unsafe fn select_adapter<D: Driver>(
    driver: &D,
    surface: vk::SurfaceKHR,
) -> Result<Adapter, RenderError> {
    let physical_devices = driver
        .enumerate_physical_devices()
        .map_err(RenderError::AdapterQuery)?;

    if physical_devices.is_empty() {
        return Err(RenderError::NoAdapter);
    }

    for physical_device in physical_devices {
        let name = driver
            .physical_device_name(physical_device)
            .map_err(RenderError::AdapterQuery)?;

        match Suitability::assess(driver, physical_device, surface)?.check() {
            Err(error) => warn!("Skipping physical device (`{}`): {}", name, error),
            Ok(families) => {
                info!("Selected physical device (`{}`).", name);
                return Ok(Adapter {
                    handle: physical_device,
                    name,
                    families,
                });
            }
        }
    }

    Err(RenderError::NoSuitableAdapter)
}
