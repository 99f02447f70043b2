//! The seam between the renderer and the Vulkan driver.
//!
//! Code above this trait assembles create-infos and decides call order.
//! Implementations only forward to the loaded Vulkan commands.

use std::collections::HashSet;

use vulkanalia::{vk, Version};

/// Result of a single driver call.
pub type DriverResult<T> = Result<T, vk::ErrorCode>;

/// The window-system collaborator, as far as rendering is concerned.
pub trait RenderWindow {
    /// Current drawable size in physical pixels.
    fn drawable_size(&self) -> vk::Extent2D;
}

/// Vulkan entry points used by the renderer.
///
/// # Safety
///
/// Methods are `unsafe` for the same reason the underlying commands are: the
/// handles and create-infos passed in must be valid and the objects they
/// refer to must not be in use by the device when destroyed.
pub trait Driver {
    type Window: RenderWindow;

    // Loader / instance

    fn loader_version(&self) -> DriverResult<Version>;
    unsafe fn instance_layers(&self) -> DriverResult<HashSet<vk::ExtensionName>>;
    unsafe fn instance_extensions(&self) -> DriverResult<HashSet<vk::ExtensionName>>;
    fn window_extensions(&self, window: &Self::Window) -> Vec<vk::ExtensionName>;
    unsafe fn create_instance(&self, info: &vk::InstanceCreateInfo) -> DriverResult<vk::Instance>;
    unsafe fn destroy_instance(&self, instance: vk::Instance);
    unsafe fn create_debug_messenger(
        &self,
        info: &vk::DebugUtilsMessengerCreateInfoEXT,
    ) -> DriverResult<vk::DebugUtilsMessengerEXT>;
    unsafe fn destroy_debug_messenger(&self, messenger: vk::DebugUtilsMessengerEXT);
    unsafe fn create_surface(&self, window: &Self::Window) -> DriverResult<vk::SurfaceKHR>;
    unsafe fn destroy_surface(&self, surface: vk::SurfaceKHR);

    // Physical devices

    unsafe fn enumerate_physical_devices(&self) -> DriverResult<Vec<vk::PhysicalDevice>>;
    unsafe fn physical_device_name(&self, physical_device: vk::PhysicalDevice)
        -> DriverResult<String>;
    unsafe fn queue_family_properties(
        &self,
        physical_device: vk::PhysicalDevice,
    ) -> DriverResult<Vec<vk::QueueFamilyProperties>>;
    unsafe fn surface_support(
        &self,
        physical_device: vk::PhysicalDevice,
        queue_family_index: u32,
        surface: vk::SurfaceKHR,
    ) -> DriverResult<bool>;
    unsafe fn device_extensions(
        &self,
        physical_device: vk::PhysicalDevice,
    ) -> DriverResult<HashSet<vk::ExtensionName>>;
    unsafe fn surface_capabilities(
        &self,
        physical_device: vk::PhysicalDevice,
        surface: vk::SurfaceKHR,
    ) -> DriverResult<vk::SurfaceCapabilitiesKHR>;
    unsafe fn surface_formats(
        &self,
        physical_device: vk::PhysicalDevice,
        surface: vk::SurfaceKHR,
    ) -> DriverResult<Vec<vk::SurfaceFormatKHR>>;
    unsafe fn surface_present_modes(
        &self,
        physical_device: vk::PhysicalDevice,
        surface: vk::SurfaceKHR,
    ) -> DriverResult<Vec<vk::PresentModeKHR>>;

    // Logical device

    unsafe fn create_device(
        &self,
        physical_device: vk::PhysicalDevice,
        info: &vk::DeviceCreateInfo,
    ) -> DriverResult<vk::Device>;
    unsafe fn destroy_device(&self, device: vk::Device);
    unsafe fn device_queue(&self, queue_family_index: u32, queue_index: u32)
        -> DriverResult<vk::Queue>;
    unsafe fn device_wait_idle(&self) -> DriverResult<()>;

    // Presentation

    unsafe fn create_swapchain(
        &self,
        info: &vk::SwapchainCreateInfoKHR,
    ) -> DriverResult<vk::SwapchainKHR>;
    unsafe fn swapchain_images(&self, swapchain: vk::SwapchainKHR) -> DriverResult<Vec<vk::Image>>;
    unsafe fn destroy_swapchain(&self, swapchain: vk::SwapchainKHR);
    unsafe fn create_image_view(&self, info: &vk::ImageViewCreateInfo)
        -> DriverResult<vk::ImageView>;
    unsafe fn destroy_image_view(&self, view: vk::ImageView);

    // Pipeline

    unsafe fn create_render_pass(&self, info: &vk::RenderPassCreateInfo)
        -> DriverResult<vk::RenderPass>;
    unsafe fn destroy_render_pass(&self, render_pass: vk::RenderPass);
    unsafe fn create_shader_module(
        &self,
        info: &vk::ShaderModuleCreateInfo,
    ) -> DriverResult<vk::ShaderModule>;
    unsafe fn destroy_shader_module(&self, module: vk::ShaderModule);
    unsafe fn create_pipeline_layout(
        &self,
        info: &vk::PipelineLayoutCreateInfo,
    ) -> DriverResult<vk::PipelineLayout>;
    unsafe fn destroy_pipeline_layout(&self, layout: vk::PipelineLayout);
    unsafe fn create_graphics_pipeline(
        &self,
        info: &vk::GraphicsPipelineCreateInfo,
    ) -> DriverResult<vk::Pipeline>;
    unsafe fn destroy_pipeline(&self, pipeline: vk::Pipeline);

    // Frame resources

    unsafe fn create_framebuffer(&self, info: &vk::FramebufferCreateInfo)
        -> DriverResult<vk::Framebuffer>;
    unsafe fn destroy_framebuffer(&self, framebuffer: vk::Framebuffer);
    unsafe fn create_command_pool(
        &self,
        info: &vk::CommandPoolCreateInfo,
    ) -> DriverResult<vk::CommandPool>;
    unsafe fn destroy_command_pool(&self, pool: vk::CommandPool);
    unsafe fn allocate_command_buffers(
        &self,
        info: &vk::CommandBufferAllocateInfo,
    ) -> DriverResult<Vec<vk::CommandBuffer>>;

    // Synchronization

    unsafe fn create_semaphore(&self) -> DriverResult<vk::Semaphore>;
    unsafe fn destroy_semaphore(&self, semaphore: vk::Semaphore);
    unsafe fn create_fence(&self, info: &vk::FenceCreateInfo) -> DriverResult<vk::Fence>;
    unsafe fn destroy_fence(&self, fence: vk::Fence);
    unsafe fn wait_for_fence(&self, fence: vk::Fence, timeout: u64) -> DriverResult<()>;
    unsafe fn reset_fence(&self, fence: vk::Fence) -> DriverResult<()>;

    // Recording

    unsafe fn reset_command_buffer(&self, command_buffer: vk::CommandBuffer) -> DriverResult<()>;
    unsafe fn begin_command_buffer(
        &self,
        command_buffer: vk::CommandBuffer,
        info: &vk::CommandBufferBeginInfo,
    ) -> DriverResult<()>;
    unsafe fn end_command_buffer(&self, command_buffer: vk::CommandBuffer) -> DriverResult<()>;
    unsafe fn cmd_begin_render_pass(
        &self,
        command_buffer: vk::CommandBuffer,
        info: &vk::RenderPassBeginInfo,
    );
    unsafe fn cmd_bind_pipeline(&self, command_buffer: vk::CommandBuffer, pipeline: vk::Pipeline);
    unsafe fn cmd_set_viewport(&self, command_buffer: vk::CommandBuffer, viewport: vk::Viewport);
    unsafe fn cmd_set_scissor(&self, command_buffer: vk::CommandBuffer, scissor: vk::Rect2D);
    unsafe fn cmd_draw(
        &self,
        command_buffer: vk::CommandBuffer,
        vertex_count: u32,
        instance_count: u32,
    );
    unsafe fn cmd_end_render_pass(&self, command_buffer: vk::CommandBuffer);

    // Queues

    unsafe fn acquire_next_image(
        &self,
        swapchain: vk::SwapchainKHR,
        timeout: u64,
        semaphore: vk::Semaphore,
    ) -> DriverResult<(u32, vk::SuccessCode)>;
    unsafe fn queue_submit(
        &self,
        queue: vk::Queue,
        submit: &vk::SubmitInfo,
        fence: vk::Fence,
    ) -> DriverResult<()>;
    unsafe fn queue_present(
        &self,
        queue: vk::Queue,
        info: &vk::PresentInfoKHR,
    ) -> DriverResult<vk::SuccessCode>;
}
