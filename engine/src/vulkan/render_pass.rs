use std::rc::Rc;

use log::*;
use vulkanalia::vk::{self, HasBuilder};

use super::driver::Driver;
use super::error::RenderError;
use super::handle::Owned;

pub type VulkanRenderPass<D> = Owned<D, vk::RenderPass>;

/// One colour attachment in the swapchain format, cleared on load and handed
/// to presentation at the end of the single subpass.
pub unsafe fn create_render_pass<D: Driver>(
    driver: &Rc<D>,
    format: vk::Format,
) -> Result<VulkanRenderPass<D>, RenderError> {
    // Attachments
    let color_attachment = vk::AttachmentDescription::builder()
        .format(format)
        .samples(vk::SampleCountFlags::_1)
        .load_op(vk::AttachmentLoadOp::CLEAR)
        .store_op(vk::AttachmentStoreOp::STORE)
        .stencil_load_op(vk::AttachmentLoadOp::DONT_CARE)
        .stencil_store_op(vk::AttachmentStoreOp::DONT_CARE)
        .initial_layout(vk::ImageLayout::UNDEFINED)
        .final_layout(vk::ImageLayout::PRESENT_SRC_KHR);

    // Subpasses
    let color_attachment_ref = vk::AttachmentReference::builder()
        .attachment(0)
        .layout(vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL);

    let color_attachments = &[color_attachment_ref];
    let subpass = vk::SubpassDescription::builder()
        .pipeline_bind_point(vk::PipelineBindPoint::GRAPHICS)
        .color_attachments(color_attachments);

    // The image is only ours once the acquire semaphore has been waited on
    // at the colour output stage.
    let dependency = vk::SubpassDependency::builder()
        .src_subpass(vk::SUBPASS_EXTERNAL)
        .dst_subpass(0)
        .src_stage_mask(vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT)
        .src_access_mask(vk::AccessFlags::empty())
        .dst_stage_mask(vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT)
        .dst_access_mask(vk::AccessFlags::COLOR_ATTACHMENT_WRITE);

    // Create
    let attachments = &[color_attachment];
    let subpasses = &[subpass];
    let dependencies = &[dependency];
    let info = vk::RenderPassCreateInfo::builder()
        .attachments(attachments)
        .subpasses(subpasses)
        .dependencies(dependencies);

    let render_pass = driver
        .create_render_pass(&info)
        .map_err(RenderError::RenderPassCreation)?;
    debug!("Created render pass for {:?}.", format);

    Ok(Owned::new(driver, render_pass))
}
