use std::path::PathBuf;

use thiserror::Error;
use vulkanalia::vk;

/// Every way bringing up the renderer or drawing a frame can fail.
///
/// None of these are recovered from: they abort initialization or the frame
/// loop and surface to the process boundary.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Failed to load the Vulkan library: {0}")]
    Loader(String),
    #[error("Failed to initialize the Vulkan instance: {reason}")]
    Init {
        reason: String,
        #[source]
        code: Option<vk::ErrorCode>,
    },
    #[error("Failed to create the window surface.")]
    SurfaceCreation(#[source] vk::ErrorCode),
    #[error("No Vulkan capable physical device was found.")]
    NoAdapter,
    #[error("Failed to find a suitable physical device.")]
    NoSuitableAdapter,
    #[error("Failed to query physical device properties.")]
    AdapterQuery(#[source] vk::ErrorCode),
    #[error("Failed to create the logical device.")]
    DeviceCreation(#[source] vk::ErrorCode),
    #[error("Failed to create the swapchain.")]
    SwapchainCreation(#[source] vk::ErrorCode),
    #[error("Failed to create the view for swapchain image {index}.")]
    ViewCreation {
        index: usize,
        #[source]
        code: vk::ErrorCode,
    },
    #[error("Failed to create the render pass.")]
    RenderPassCreation(#[source] vk::ErrorCode),
    #[error("Failed to read shader binary `{}`.", path.display())]
    ShaderRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid shader module: {0}")]
    ShaderModule(String),
    #[error("Failed to create a shader module.")]
    ShaderModuleCreation(#[source] vk::ErrorCode),
    #[error("Failed to create the graphics pipeline.")]
    PipelineCreation(#[source] vk::ErrorCode),
    #[error("Failed to create the framebuffer for swapchain image {index}.")]
    FramebufferCreation {
        index: usize,
        #[source]
        code: vk::ErrorCode,
    },
    #[error("Failed to create the command pool.")]
    CommandPoolCreation(#[source] vk::ErrorCode),
    #[error("Failed to allocate the command buffer.")]
    CommandBufferAllocation(#[source] vk::ErrorCode),
    #[error("Failed to create frame synchronization objects.")]
    SyncObjectCreation(#[source] vk::ErrorCode),
    #[error("Failed waiting for the previous frame.")]
    FrameWait(#[source] vk::ErrorCode),
    #[error("Failed to acquire a swapchain image.")]
    Acquire(#[source] vk::ErrorCode),
    #[error("Acquired swapchain image {index} has no framebuffer ({count} exist).")]
    ImageIndexOutOfRange { index: u32, count: usize },
    #[error("Failed to record the command buffer.")]
    CommandRecord(#[source] vk::ErrorCode),
    #[error("Failed to submit the command buffer.")]
    Submit(#[source] vk::ErrorCode),
    #[error("Failed to present the swapchain image.")]
    Present(#[source] vk::ErrorCode),
    #[error("The surface is out of date; swapchain recreation is not implemented.")]
    SurfaceOutOfDate,
    #[error("Failed waiting for the device to become idle.")]
    DeviceWait(#[source] vk::ErrorCode),
}

impl RenderError {
    pub(crate) fn init(reason: impl Into<String>) -> Self {
        Self::Init {
            reason: reason.into(),
            code: None,
        }
    }
}

/// Why an adapter was passed over during selection.
#[derive(Debug, Error)]
#[error("Missing {0}.")]
pub struct SuitabilityError(pub &'static str);
