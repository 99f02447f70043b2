use std::rc::Rc;

use log::*;
use vulkanalia::vk::{self, HasBuilder};

use super::constants;
use super::driver::Driver;
use super::error::RenderError;
use super::handle::Owned;

/// The command pool on the graphics family and the single primary command
/// buffer re-recorded every frame.
#[derive(Debug)]
pub struct VulkanCommandBuffer<D: Driver> {
    pool: Owned<D, vk::CommandPool>,
    command_buffer: vk::CommandBuffer,
}

impl<D: Driver> VulkanCommandBuffer<D> {
    pub unsafe fn create(driver: &Rc<D>, graphics_family: u32) -> Result<Self, RenderError> {
        let info = vk::CommandPoolCreateInfo::builder()
            .flags(vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER)
            .queue_family_index(graphics_family);

        let pool = driver
            .create_command_pool(&info)
            .map_err(RenderError::CommandPoolCreation)?;
        let pool = Owned::new(driver, pool);

        let allocate_info = vk::CommandBufferAllocateInfo::builder()
            .command_pool(pool.handle())
            .level(vk::CommandBufferLevel::PRIMARY)
            .command_buffer_count(1);

        // Freed with the pool.
        let command_buffer = driver
            .allocate_command_buffers(&allocate_info)
            .map_err(RenderError::CommandBufferAllocation)?
            .into_iter()
            .next()
            .ok_or(RenderError::CommandBufferAllocation(
                vk::ErrorCode::OUT_OF_DEVICE_MEMORY,
            ))?;
        debug!("Allocated command buffer {:?}.", command_buffer);

        Ok(Self {
            pool,
            command_buffer,
        })
    }

    pub fn handle(&self) -> vk::CommandBuffer {
        self.command_buffer
    }

    /// Resets the buffer and records one pass drawing the triangle into
    /// `framebuffer`.
    pub unsafe fn record(
        &self,
        driver: &D,
        render_pass: vk::RenderPass,
        framebuffer: vk::Framebuffer,
        pipeline: vk::Pipeline,
        extent: vk::Extent2D,
    ) -> Result<(), RenderError> {
        let command_buffer = self.command_buffer;

        driver
            .reset_command_buffer(command_buffer)
            .map_err(RenderError::CommandRecord)?;

        let info = vk::CommandBufferBeginInfo::builder();
        driver
            .begin_command_buffer(command_buffer, &info)
            .map_err(RenderError::CommandRecord)?;

        let render_area = vk::Rect2D::builder()
            .offset(vk::Offset2D::default())
            .extent(extent);

        let color_clear_value = vk::ClearValue {
            color: vk::ClearColorValue {
                float32: constants::CLEAR_COLOR,
            },
        };

        let clear_values = &[color_clear_value];
        let info = vk::RenderPassBeginInfo::builder()
            .render_pass(render_pass)
            .framebuffer(framebuffer)
            .render_area(render_area)
            .clear_values(clear_values);

        driver.cmd_begin_render_pass(command_buffer, &info);
        driver.cmd_bind_pipeline(command_buffer, pipeline);

        let viewport = vk::Viewport::builder()
            .x(0.0)
            .y(0.0)
            .width(extent.width as f32)
            .height(extent.height as f32)
            .min_depth(0.0)
            .max_depth(1.0)
            .build();
        driver.cmd_set_viewport(command_buffer, viewport);

        let scissor = vk::Rect2D::builder()
            .offset(vk::Offset2D { x: 0, y: 0 })
            .extent(extent)
            .build();
        driver.cmd_set_scissor(command_buffer, scissor);

        driver.cmd_draw(command_buffer, constants::TRIANGLE_VERTEX_COUNT, 1);
        driver.cmd_end_render_pass(command_buffer);

        driver
            .end_command_buffer(command_buffer)
            .map_err(RenderError::CommandRecord)
    }
}
