use std::rc::Rc;

use vulkanalia::vk::{self, HasBuilder};

use super::driver::Driver;
use super::error::RenderError;
use super::handle::{Owned, OwnedSet};

pub type VulkanFramebuffers<D> = OwnedSet<D, vk::Framebuffer>;

/// One framebuffer per swapchain view, indexed like the swapchain images.
pub unsafe fn create_framebuffers<D: Driver>(
    driver: &Rc<D>,
    render_pass: vk::RenderPass,
    views: impl IntoIterator<Item = vk::ImageView>,
    extent: vk::Extent2D,
) -> Result<VulkanFramebuffers<D>, RenderError> {
    let mut framebuffers = OwnedSet::new();
    for (index, view) in views.into_iter().enumerate() {
        let attachments = &[view];
        let create_info = vk::FramebufferCreateInfo::builder()
            .render_pass(render_pass)
            .attachments(attachments)
            .width(extent.width)
            .height(extent.height)
            .layers(1);

        let framebuffer = driver
            .create_framebuffer(&create_info)
            .map_err(|code| RenderError::FramebufferCreation { index, code })?;
        framebuffers.push(Owned::new(driver, framebuffer));
    }
    Ok(framebuffers)
}
