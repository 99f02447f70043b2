use std::rc::Rc;

use vulkanalia::vk::{self, HasBuilder};

use super::driver::Driver;
use super::error::RenderError;
use super::handle::{Owned, OwnedSet};

/// Creates one 2D colour view per swapchain image, in image order.
///
/// Views created before a failure are released as the partial set drops.
pub unsafe fn create_image_views<D: Driver>(
    driver: &Rc<D>,
    images: &[vk::Image],
    format: vk::Format,
) -> Result<OwnedSet<D, vk::ImageView>, RenderError> {
    let components = vk::ComponentMapping::builder()
        .r(vk::ComponentSwizzle::IDENTITY)
        .g(vk::ComponentSwizzle::IDENTITY)
        .b(vk::ComponentSwizzle::IDENTITY)
        .a(vk::ComponentSwizzle::IDENTITY);

    let subresource_range = vk::ImageSubresourceRange::builder()
        .aspect_mask(vk::ImageAspectFlags::COLOR)
        .base_mip_level(0)
        .level_count(1)
        .base_array_layer(0)
        .layer_count(1);

    let mut views = OwnedSet::new();
    for (index, image) in images.iter().enumerate() {
        let info = vk::ImageViewCreateInfo::builder()
            .image(*image)
            .view_type(vk::ImageViewType::_2D)
            .format(format)
            .components(components)
            .subresource_range(subresource_range);

        let view = driver
            .create_image_view(&info)
            .map_err(|code| RenderError::ViewCreation { index, code })?;
        views.push(Owned::new(driver, view));
    }

    Ok(views)
}
