use log::*;
use std::rc::Rc;
use vulkanalia::vk::{self, Handle, HasBuilder};

use super::adapter::{Adapter, QueueFamilies, SwapchainSupport};
use super::driver::Driver;
use super::error::RenderError;
use super::handle::{Owned, OwnedSet};
use super::image;

/// The presentation chain and one view per image.
#[derive(Debug)]
pub struct VulkanSwapchain<D: Driver> {
    views: OwnedSet<D, vk::ImageView>,
    swapchain: Owned<D, vk::SwapchainKHR>,
    pub images: Vec<vk::Image>,
    pub format: vk::Format,
    pub extent: vk::Extent2D,
}

impl<D: Driver> VulkanSwapchain<D> {
    pub unsafe fn create(
        driver: &Rc<D>,
        adapter: &Adapter,
        surface: vk::SurfaceKHR,
        drawable_size: vk::Extent2D,
    ) -> Result<Self, RenderError> {
        let support = SwapchainSupport::get(&**driver, adapter.handle, surface)
            .map_err(RenderError::SwapchainCreation)?;

        let surface_format = choose_surface_format(&support.formats)
            .ok_or(RenderError::SwapchainCreation(vk::ErrorCode::FORMAT_NOT_SUPPORTED))?;
        let present_mode = choose_present_mode(&support.present_modes);
        let extent = choose_extent(&support.capabilities, drawable_size);
        let image_count = choose_image_count(&support.capabilities);
        let (image_sharing_mode, queue_family_indices) = sharing_mode(&adapter.families);

        info!(
            "Swapchain: {:?}/{:?}, {:?}, {}x{}, {} images requested.",
            surface_format.format,
            surface_format.color_space,
            present_mode,
            extent.width,
            extent.height,
            image_count
        );

        let info = vk::SwapchainCreateInfoKHR::builder()
            .surface(surface)
            .min_image_count(image_count)
            .image_format(surface_format.format)
            .image_color_space(surface_format.color_space)
            .image_extent(extent)
            .image_array_layers(1)
            .image_usage(vk::ImageUsageFlags::COLOR_ATTACHMENT)
            .image_sharing_mode(image_sharing_mode)
            .queue_family_indices(&queue_family_indices)
            .pre_transform(support.capabilities.current_transform)
            .composite_alpha(vk::CompositeAlphaFlagsKHR::OPAQUE)
            .present_mode(present_mode)
            .clipped(true)
            .old_swapchain(vk::SwapchainKHR::null());

        let swapchain = driver
            .create_swapchain(&info)
            .map_err(RenderError::SwapchainCreation)?;
        let swapchain = Owned::new(driver, swapchain);

        // The driver may hand back more images than requested.
        let images = driver
            .swapchain_images(swapchain.handle())
            .map_err(RenderError::SwapchainCreation)?;
        if images.len() as u32 != image_count {
            debug!("Swapchain created with {} images.", images.len());
        }

        let views = image::create_image_views(driver, &images, surface_format.format)?;

        Ok(Self {
            views,
            swapchain,
            images,
            format: surface_format.format,
            extent,
        })
    }

    pub fn handle(&self) -> vk::SwapchainKHR {
        self.swapchain.handle()
    }

    pub fn views(&self) -> &OwnedSet<D, vk::ImageView> {
        &self.views
    }
}

/// Prefers 8-bit BGRA sRGB in the sRGB non-linear colour space, else the
/// first format advertised.
pub fn choose_surface_format(formats: &[vk::SurfaceFormatKHR]) -> Option<vk::SurfaceFormatKHR> {
    formats
        .iter()
        .cloned()
        .find(|f| {
            f.format == vk::Format::B8G8R8A8_SRGB
                && f.color_space == vk::ColorSpaceKHR::SRGB_NONLINEAR
        })
        .or_else(|| formats.first().cloned())
}

/// Mailbox when available; FIFO is always supported.
pub fn choose_present_mode(present_modes: &[vk::PresentModeKHR]) -> vk::PresentModeKHR {
    present_modes
        .iter()
        .cloned()
        .find(|m| *m == vk::PresentModeKHR::MAILBOX)
        .unwrap_or(vk::PresentModeKHR::FIFO)
}

/// The surface's current extent, or the drawable size clamped into the
/// supported bounds when the surface leaves it to the swapchain.
pub fn choose_extent(
    capabilities: &vk::SurfaceCapabilitiesKHR,
    drawable_size: vk::Extent2D,
) -> vk::Extent2D {
    if capabilities.current_extent.width != u32::MAX {
        capabilities.current_extent
    } else {
        let clamp = |min: u32, max: u32, v: u32| min.max(max.min(v));
        vk::Extent2D::builder()
            .width(clamp(
                capabilities.min_image_extent.width,
                capabilities.max_image_extent.width,
                drawable_size.width,
            ))
            .height(clamp(
                capabilities.min_image_extent.height,
                capabilities.max_image_extent.height,
                drawable_size.height,
            ))
            .build()
    }
}

/// One more than the minimum, capped at the maximum. A maximum of zero
/// means unbounded.
pub fn choose_image_count(capabilities: &vk::SurfaceCapabilitiesKHR) -> u32 {
    let image_count = capabilities.min_image_count + 1;
    if capabilities.max_image_count != 0 && image_count > capabilities.max_image_count {
        capabilities.max_image_count
    } else {
        image_count
    }
}

/// Concurrent across both families when they differ, exclusive otherwise.
pub fn sharing_mode(families: &QueueFamilies) -> (vk::SharingMode, Vec<u32>) {
    if families.is_shared() {
        (vk::SharingMode::EXCLUSIVE, Vec::new())
    } else {
        (vk::SharingMode::CONCURRENT, families.unique())
    }
}
