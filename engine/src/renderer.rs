use std::rc::Rc;

use anyhow::Result;
use log::*;
use winit::window::Window;

use crate::config::EngineConfig;
use crate::vulkan::{FrameState, ShaderBinaries, VulkanDriver, VulkanRenderer};

pub struct Renderer {
    pub vk_renderer: VulkanRenderer<VulkanDriver>,
}

impl Renderer {
    /// Loads the shader binaries and the Vulkan library, then brings up
    /// the whole pipeline for `window`.
    pub unsafe fn create(window: &Window, config: &EngineConfig) -> Result<Self> {
        let shaders = ShaderBinaries::load(&config.shader_dir)?;
        let driver = Rc::new(VulkanDriver::load()?);
        let vk_renderer = VulkanRenderer::new(driver, window, &config.renderer, &shaders)?;

        Ok(Self { vk_renderer })
    }

    /// Renders a frame.
    pub unsafe fn render(&mut self) -> Result<()> {
        self.vk_renderer.render()?;
        Ok(())
    }

    pub fn state(&self) -> FrameState {
        self.vk_renderer.state()
    }
}

impl Drop for Renderer {
    fn drop(&mut self) {
        info!(
            "Shutting down renderer on `{}` after {} frames.",
            self.vk_renderer.adapter_name(),
            self.vk_renderer.frames()
        );
    }
}
