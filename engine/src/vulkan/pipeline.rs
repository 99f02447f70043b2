use log::*;
use std::rc::Rc;
use vulkanalia::vk::{self, HasBuilder};

use super::constants;
use super::driver::Driver;
use super::error::RenderError;
use super::handle::Owned;
use super::shader::{self, ShaderBinaries};

/// The triangle pipeline and its (empty) layout.
#[derive(Debug)]
pub struct VulkanPipeline<D: Driver> {
    pipeline: Owned<D, vk::Pipeline>,
    layout: Owned<D, vk::PipelineLayout>,
}

impl<D: Driver> VulkanPipeline<D> {
    pub unsafe fn create(
        driver: &Rc<D>,
        render_pass: vk::RenderPass,
        shaders: &ShaderBinaries,
    ) -> Result<Self, RenderError> {
        // Modules only need to outlive pipeline creation.
        let vertex_shader_module = shader::create_shader_module(driver, &shaders.vertex)?;
        let fragment_shader_module = shader::create_shader_module(driver, &shaders.fragment)?;

        let vert_stage = vk::PipelineShaderStageCreateInfo::builder()
            .stage(vk::ShaderStageFlags::VERTEX)
            .module(vertex_shader_module.handle())
            .name(constants::SHADER_ENTRY_POINT);

        let frag_stage = vk::PipelineShaderStageCreateInfo::builder()
            .stage(vk::ShaderStageFlags::FRAGMENT)
            .module(fragment_shader_module.handle())
            .name(constants::SHADER_ENTRY_POINT);

        // Vertices are generated in the vertex stage.
        let vertex_input_state = vk::PipelineVertexInputStateCreateInfo::builder();
        let input_assembly_state = vk::PipelineInputAssemblyStateCreateInfo::builder()
            .topology(vk::PrimitiveTopology::TRIANGLE_LIST)
            .primitive_restart_enable(false);

        // viewport and scissor are set while recording
        let viewport_state = vk::PipelineViewportStateCreateInfo::builder()
            .viewport_count(1)
            .scissor_count(1);

        // rasterizer
        let rasterization_state = vk::PipelineRasterizationStateCreateInfo::builder()
            .depth_clamp_enable(false)
            .rasterizer_discard_enable(false)
            .polygon_mode(vk::PolygonMode::FILL)
            .line_width(1.0)
            .cull_mode(vk::CullModeFlags::BACK)
            .front_face(vk::FrontFace::CLOCKWISE)
            .depth_bias_enable(false);

        // multisampling
        let multisample_state = vk::PipelineMultisampleStateCreateInfo::builder()
            .sample_shading_enable(false)
            .rasterization_samples(vk::SampleCountFlags::_1);

        // color blending
        let attachment = vk::PipelineColorBlendAttachmentState::builder()
            .color_write_mask(vk::ColorComponentFlags::all())
            .blend_enable(false);

        let attachments = &[attachment];
        let color_blend_state = vk::PipelineColorBlendStateCreateInfo::builder()
            .logic_op_enable(false)
            .logic_op(vk::LogicOp::COPY)
            .attachments(attachments)
            .blend_constants([0.0, 0.0, 0.0, 0.0]);

        let dynamic_states = &[vk::DynamicState::VIEWPORT, vk::DynamicState::SCISSOR];
        let dynamic_state =
            vk::PipelineDynamicStateCreateInfo::builder().dynamic_states(dynamic_states);

        // layout
        let layout_info = vk::PipelineLayoutCreateInfo::builder();
        let layout = driver
            .create_pipeline_layout(&layout_info)
            .map_err(RenderError::PipelineCreation)?;
        let layout = Owned::new(driver, layout);

        let stages = &[vert_stage, frag_stage];
        let info = vk::GraphicsPipelineCreateInfo::builder()
            .stages(stages)
            .vertex_input_state(&vertex_input_state)
            .input_assembly_state(&input_assembly_state)
            .viewport_state(&viewport_state)
            .rasterization_state(&rasterization_state)
            .multisample_state(&multisample_state)
            .color_blend_state(&color_blend_state)
            .dynamic_state(&dynamic_state)
            .layout(layout.handle())
            .render_pass(render_pass)
            .subpass(0);

        let pipeline = driver
            .create_graphics_pipeline(&info)
            .map_err(RenderError::PipelineCreation)?;
        let pipeline = Owned::new(driver, pipeline);
        debug!("Created graphics pipeline.");

        drop(fragment_shader_module);
        drop(vertex_shader_module);

        Ok(Self { pipeline, layout })
    }

    pub fn handle(&self) -> vk::Pipeline {
        self.pipeline.handle()
    }

    pub fn layout(&self) -> vk::PipelineLayout {
        self.layout.handle()
    }
}
