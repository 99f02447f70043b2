#![allow(dead_code, clippy::missing_safety_doc)]

use anyhow::Result;
use log::*;
use renderer::Renderer;
use winit::dpi::LogicalSize;
use winit::event::{Event, WindowEvent};
use winit::event_loop::EventLoop;
use winit::window::{Window, WindowBuilder};

pub mod config;
mod renderer;
mod vulkan;

pub use config::{EngineConfig, RendererConfig};
pub use vulkan::{FrameState, RenderError};

pub struct Engine {
    renderer: Renderer,
    window: Window,
    event_loop: EventLoop<()>,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Result<Engine> {
        // Window
        let event_loop = EventLoop::new()?;
        let window = WindowBuilder::new()
            .with_title(&config.title)
            .with_inner_size(LogicalSize::new(config.width, config.height))
            .with_resizable(false)
            .build(&event_loop)?;

        let renderer = unsafe { Renderer::create(&window, &config)? };

        Ok(Engine {
            renderer,
            window,
            event_loop,
        })
    }

    /// Runs the event loop until the window is closed or a frame fails.
    /// The renderer is torn down before the window goes away.
    pub fn run(self) -> Result<()> {
        let Engine {
            renderer,
            window,
            event_loop,
        } = self;

        let mut renderer = Some(renderer);
        let mut result = Ok(());

        event_loop.run(|event, elwt| match event {
            // Request a redraw when all events were processed.
            Event::AboutToWait => window.request_redraw(),
            Event::WindowEvent { event, .. } => match event {
                // Render a frame if we are not shutting down.
                WindowEvent::RedrawRequested if !elwt.exiting() => {
                    if let Some(r) = renderer.as_mut() {
                        if let Err(e) = unsafe { r.render() } {
                            error!("Frame failed in state {:?}: {}", r.state(), e);
                            result = Err(e);
                            renderer = None;
                            elwt.exit();
                        }
                    }
                }
                WindowEvent::CloseRequested => {
                    info!("Close requested.");
                    renderer = None;
                    elwt.exit();
                }
                _ => {}
            },
            _ => {}
        })?;

        drop(renderer);
        drop(window);
        result
    }
}
