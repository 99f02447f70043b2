use std::rc::Rc;

use log::*;
use vulkanalia::vk::{self, HasBuilder};

use crate::config::RendererConfig;
use adapter::Adapter;
use command_buffer::VulkanCommandBuffer;
use device::VulkanDevice;
use driver::{Driver, RenderWindow};
use framebuffer::VulkanFramebuffers;
use instance::VulkanInstance;
use pipeline::VulkanPipeline;
use render_pass::VulkanRenderPass;
use surface::VulkanSurface;
use swapchain::VulkanSwapchain;
use sync::FrameSync;

pub use error::RenderError;
pub use loader::VulkanDriver;
pub use shader::ShaderBinaries;
pub use sync::FrameState;

mod adapter;
mod command_buffer;
mod constants;
mod device;
mod driver;
mod error;
mod framebuffer;
mod handle;
mod image;
mod instance;
mod loader;
#[cfg(test)]
mod mock;
mod pipeline;
mod render_pass;
mod shader;
mod surface;
mod swapchain;
mod sync;

/// Everything needed to draw the triangle, torn down in reverse creation
/// order when dropped.
pub struct VulkanRenderer<D: Driver> {
    sync: FrameSync<D>,
    commands: VulkanCommandBuffer<D>,
    framebuffers: VulkanFramebuffers<D>,
    pipeline: VulkanPipeline<D>,
    render_pass: VulkanRenderPass<D>,
    swapchain: VulkanSwapchain<D>,
    device: VulkanDevice<D>,
    surface: VulkanSurface<D>,
    instance: VulkanInstance<D>,
    adapter: Adapter,
    state: FrameState,
    frames: u64,
    driver: Rc<D>,
}

impl<D: Driver> VulkanRenderer<D> {
    pub unsafe fn new(
        driver: Rc<D>,
        window: &D::Window,
        config: &RendererConfig,
        shaders: &ShaderBinaries,
    ) -> Result<Self, RenderError> {
        let instance = VulkanInstance::create(&driver, window, config)?;
        let surface = surface::create_surface(&driver, window)?;
        let adapter = adapter::select_adapter(&*driver, surface.handle())?;
        let device = VulkanDevice::create(
            &driver,
            &adapter,
            instance.enabled_layers(),
            instance.portability(),
        )?;

        let swapchain =
            VulkanSwapchain::create(&driver, &adapter, surface.handle(), window.drawable_size())?;
        let render_pass = render_pass::create_render_pass(&driver, swapchain.format)?;
        let pipeline = VulkanPipeline::create(&driver, render_pass.handle(), shaders)?;
        let framebuffers = framebuffer::create_framebuffers(
            &driver,
            render_pass.handle(),
            swapchain.views().handles(),
            swapchain.extent,
        )?;

        let commands = VulkanCommandBuffer::create(&driver, adapter.families.graphics)?;
        let sync = FrameSync::create(&driver)?;
        info!("Renderer initialized on `{}`.", adapter.name);

        Ok(Self {
            sync,
            commands,
            framebuffers,
            pipeline,
            render_pass,
            swapchain,
            device,
            surface,
            instance,
            adapter,
            state: FrameState::Idle,
            frames: 0,
            driver,
        })
    }

    /// Draws and presents one frame. Blocks until the previous frame has
    /// finished on the device, so at most one frame is ever in flight.
    pub unsafe fn render(&mut self) -> Result<(), RenderError> {
        let driver = Rc::clone(&self.driver);
        let in_flight = self.sync.in_flight();

        self.state = FrameState::Waiting;
        driver
            .wait_for_fence(in_flight, constants::NO_TIMEOUT)
            .map_err(RenderError::FrameWait)?;
        driver.reset_fence(in_flight).map_err(RenderError::FrameWait)?;

        self.state = FrameState::Acquiring;
        let image_index = match driver.acquire_next_image(
            self.swapchain.handle(),
            constants::NO_TIMEOUT,
            self.sync.image_available(),
        ) {
            Ok((index, code)) => {
                if code == vk::SuccessCode::SUBOPTIMAL_KHR {
                    warn!("Swapchain is suboptimal for the surface.");
                }
                index
            }
            Err(vk::ErrorCode::OUT_OF_DATE_KHR) => return Err(RenderError::SurfaceOutOfDate),
            Err(code) => return Err(RenderError::Acquire(code)),
        };

        self.state = FrameState::Recording;
        let framebuffer = self.framebuffers.get(image_index as usize).ok_or(
            RenderError::ImageIndexOutOfRange {
                index: image_index,
                count: self.framebuffers.len(),
            },
        )?;
        self.commands.record(
            &driver,
            self.render_pass.handle(),
            framebuffer,
            self.pipeline.handle(),
            self.swapchain.extent,
        )?;

        let wait_semaphores = &[self.sync.image_available()];
        let wait_stages = &[vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT];
        let command_buffers = &[self.commands.handle()];
        let signal_semaphores = &[self.sync.render_finished()];
        let submit_info = vk::SubmitInfo::builder()
            .wait_semaphores(wait_semaphores)
            .wait_dst_stage_mask(wait_stages)
            .command_buffers(command_buffers)
            .signal_semaphores(signal_semaphores);

        driver
            .queue_submit(self.device.graphics_queue, &submit_info, in_flight)
            .map_err(RenderError::Submit)?;
        self.state = FrameState::Submitted;

        let swapchains = &[self.swapchain.handle()];
        let image_indices = &[image_index];
        let present_info = vk::PresentInfoKHR::builder()
            .wait_semaphores(signal_semaphores)
            .swapchains(swapchains)
            .image_indices(image_indices);

        self.state = FrameState::Presenting;
        match driver.queue_present(self.device.present_queue, &present_info) {
            Ok(vk::SuccessCode::SUBOPTIMAL_KHR) => warn!("Presented to a suboptimal swapchain."),
            Ok(_) => {}
            Err(vk::ErrorCode::OUT_OF_DATE_KHR) => return Err(RenderError::SurfaceOutOfDate),
            Err(code) => return Err(RenderError::Present(code)),
        }

        self.frames += 1;
        self.state = FrameState::Idle;
        trace!("Presented frame {} (image {}).", self.frames, image_index);

        Ok(())
    }

    pub fn state(&self) -> FrameState {
        self.state
    }

    /// Frames presented so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn adapter_name(&self) -> &str {
        &self.adapter.name
    }
}

impl<D: Driver> Drop for VulkanRenderer<D> {
    fn drop(&mut self) {
        // Nothing may be destroyed while the device still references it.
        if let Err(e) = unsafe { self.device.wait_idle(&self.driver) } {
            error!("{}", e);
        }
        debug!("Destroying renderer after {} frames.", self.frames);
    }
}
