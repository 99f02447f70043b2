use std::rc::Rc;

use log::*;
use vulkanalia::vk;

use super::driver::Driver;
use super::error::RenderError;
use super::handle::Owned;

pub type VulkanSurface<D> = Owned<D, vk::SurfaceKHR>;

/// Creates the presentation surface for `window`. Must be dropped before the
/// instance it was created from.
pub unsafe fn create_surface<D: Driver>(
    driver: &Rc<D>,
    window: &D::Window,
) -> Result<VulkanSurface<D>, RenderError> {
    let surface = driver
        .create_surface(window)
        .map_err(RenderError::SurfaceCreation)?;
    debug!("Created window surface.");
    Ok(Owned::new(driver, surface))
}
