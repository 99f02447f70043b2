//! The production driver: forwards every call to the system Vulkan library.

use std::cell::OnceCell;
use std::collections::HashSet;

use log::*;
use vulkanalia::loader::{LibloadingLoader, LIBRARY};
use vulkanalia::prelude::v1_0::*;
use vulkanalia::vk::{ExtDebugUtilsExtension, KhrSurfaceExtension, KhrSwapchainExtension};
use vulkanalia::window as vk_window;
use vulkanalia::Version;
use winit::window::Window;

use super::driver::{Driver, DriverResult, RenderWindow};
use super::error::RenderError;

/// Loaded Vulkan entry points. The instance and device command tables are
/// filled in as those objects are created.
pub struct VulkanDriver {
    entry: Entry,
    instance: OnceCell<Instance>,
    device: OnceCell<Device>,
}

impl VulkanDriver {
    pub unsafe fn load() -> Result<Self, RenderError> {
        let loader =
            LibloadingLoader::new(LIBRARY).map_err(|e| RenderError::Loader(e.to_string()))?;
        let entry = Entry::new(loader).map_err(|b| RenderError::Loader(format!("{}", b)))?;
        debug!("Loaded Vulkan library `{}`.", LIBRARY);

        Ok(Self {
            entry,
            instance: OnceCell::new(),
            device: OnceCell::new(),
        })
    }

    fn instance(&self) -> DriverResult<&Instance> {
        self.instance
            .get()
            .ok_or(vk::ErrorCode::INITIALIZATION_FAILED)
    }

    fn device(&self) -> DriverResult<&Device> {
        self.device.get().ok_or(vk::ErrorCode::INITIALIZATION_FAILED)
    }
}

impl RenderWindow for Window {
    fn drawable_size(&self) -> vk::Extent2D {
        let size = self.inner_size();
        vk::Extent2D {
            width: size.width,
            height: size.height,
        }
    }
}

impl Driver for VulkanDriver {
    type Window = Window;

    // Loader / instance

    fn loader_version(&self) -> DriverResult<Version> {
        self.entry.version()
    }

    unsafe fn instance_layers(&self) -> DriverResult<HashSet<vk::ExtensionName>> {
        Ok(self
            .entry
            .enumerate_instance_layer_properties()?
            .iter()
            .map(|l| l.layer_name)
            .collect())
    }

    unsafe fn instance_extensions(&self) -> DriverResult<HashSet<vk::ExtensionName>> {
        Ok(self
            .entry
            .enumerate_instance_extension_properties(None)?
            .iter()
            .map(|e| e.extension_name)
            .collect())
    }

    fn window_extensions(&self, window: &Window) -> Vec<vk::ExtensionName> {
        vk_window::get_required_instance_extensions(window)
            .iter()
            .map(|e| **e)
            .collect()
    }

    unsafe fn create_instance(&self, info: &vk::InstanceCreateInfo) -> DriverResult<vk::Instance> {
        let instance = self.entry.create_instance(info, None)?;
        let handle = instance.handle();
        if self.instance.set(instance).is_err() {
            warn!("A Vulkan instance already exists; keeping the first one.");
        }
        Ok(handle)
    }

    unsafe fn destroy_instance(&self, _instance: vk::Instance) {
        if let Ok(instance) = self.instance() {
            instance.destroy_instance(None);
        }
    }

    unsafe fn create_debug_messenger(
        &self,
        info: &vk::DebugUtilsMessengerCreateInfoEXT,
    ) -> DriverResult<vk::DebugUtilsMessengerEXT> {
        self.instance()?.create_debug_utils_messenger_ext(info, None)
    }

    unsafe fn destroy_debug_messenger(&self, messenger: vk::DebugUtilsMessengerEXT) {
        if let Ok(instance) = self.instance() {
            instance.destroy_debug_utils_messenger_ext(messenger, None);
        }
    }

    unsafe fn create_surface(&self, window: &Window) -> DriverResult<vk::SurfaceKHR> {
        vk_window::create_surface(self.instance()?, window, window)
    }

    unsafe fn destroy_surface(&self, surface: vk::SurfaceKHR) {
        if let Ok(instance) = self.instance() {
            instance.destroy_surface_khr(surface, None);
        }
    }

    // Physical devices

    unsafe fn enumerate_physical_devices(&self) -> DriverResult<Vec<vk::PhysicalDevice>> {
        self.instance()?.enumerate_physical_devices()
    }

    unsafe fn physical_device_name(
        &self,
        physical_device: vk::PhysicalDevice,
    ) -> DriverResult<String> {
        let properties = self.instance()?.get_physical_device_properties(physical_device);
        Ok(properties.device_name.to_string())
    }

    unsafe fn queue_family_properties(
        &self,
        physical_device: vk::PhysicalDevice,
    ) -> DriverResult<Vec<vk::QueueFamilyProperties>> {
        Ok(self
            .instance()?
            .get_physical_device_queue_family_properties(physical_device))
    }

    unsafe fn surface_support(
        &self,
        physical_device: vk::PhysicalDevice,
        queue_family_index: u32,
        surface: vk::SurfaceKHR,
    ) -> DriverResult<bool> {
        self.instance()?.get_physical_device_surface_support_khr(
            physical_device,
            queue_family_index,
            surface,
        )
    }

    unsafe fn device_extensions(
        &self,
        physical_device: vk::PhysicalDevice,
    ) -> DriverResult<HashSet<vk::ExtensionName>> {
        Ok(self
            .instance()?
            .enumerate_device_extension_properties(physical_device, None)?
            .iter()
            .map(|e| e.extension_name)
            .collect())
    }

    unsafe fn surface_capabilities(
        &self,
        physical_device: vk::PhysicalDevice,
        surface: vk::SurfaceKHR,
    ) -> DriverResult<vk::SurfaceCapabilitiesKHR> {
        self.instance()?
            .get_physical_device_surface_capabilities_khr(physical_device, surface)
    }

    unsafe fn surface_formats(
        &self,
        physical_device: vk::PhysicalDevice,
        surface: vk::SurfaceKHR,
    ) -> DriverResult<Vec<vk::SurfaceFormatKHR>> {
        self.instance()?
            .get_physical_device_surface_formats_khr(physical_device, surface)
    }

    unsafe fn surface_present_modes(
        &self,
        physical_device: vk::PhysicalDevice,
        surface: vk::SurfaceKHR,
    ) -> DriverResult<Vec<vk::PresentModeKHR>> {
        self.instance()?
            .get_physical_device_surface_present_modes_khr(physical_device, surface)
    }

    // Logical device

    unsafe fn create_device(
        &self,
        physical_device: vk::PhysicalDevice,
        info: &vk::DeviceCreateInfo,
    ) -> DriverResult<vk::Device> {
        let device = self.instance()?.create_device(physical_device, info, None)?;
        let handle = device.handle();
        if self.device.set(device).is_err() {
            warn!("A logical device already exists; keeping the first one.");
        }
        Ok(handle)
    }

    unsafe fn destroy_device(&self, _device: vk::Device) {
        if let Ok(device) = self.device() {
            device.destroy_device(None);
        }
    }

    unsafe fn device_queue(
        &self,
        queue_family_index: u32,
        queue_index: u32,
    ) -> DriverResult<vk::Queue> {
        Ok(self
            .device()?
            .get_device_queue(queue_family_index, queue_index))
    }

    unsafe fn device_wait_idle(&self) -> DriverResult<()> {
        self.device()?.device_wait_idle()
    }

    // Presentation

    unsafe fn create_swapchain(
        &self,
        info: &vk::SwapchainCreateInfoKHR,
    ) -> DriverResult<vk::SwapchainKHR> {
        self.device()?.create_swapchain_khr(info, None)
    }

    unsafe fn swapchain_images(&self, swapchain: vk::SwapchainKHR) -> DriverResult<Vec<vk::Image>> {
        self.device()?.get_swapchain_images_khr(swapchain)
    }

    unsafe fn destroy_swapchain(&self, swapchain: vk::SwapchainKHR) {
        if let Ok(device) = self.device() {
            device.destroy_swapchain_khr(swapchain, None);
        }
    }

    unsafe fn create_image_view(
        &self,
        info: &vk::ImageViewCreateInfo,
    ) -> DriverResult<vk::ImageView> {
        self.device()?.create_image_view(info, None)
    }

    unsafe fn destroy_image_view(&self, view: vk::ImageView) {
        if let Ok(device) = self.device() {
            device.destroy_image_view(view, None);
        }
    }

    // Pipeline

    unsafe fn create_render_pass(
        &self,
        info: &vk::RenderPassCreateInfo,
    ) -> DriverResult<vk::RenderPass> {
        self.device()?.create_render_pass(info, None)
    }

    unsafe fn destroy_render_pass(&self, render_pass: vk::RenderPass) {
        if let Ok(device) = self.device() {
            device.destroy_render_pass(render_pass, None);
        }
    }

    unsafe fn create_shader_module(
        &self,
        info: &vk::ShaderModuleCreateInfo,
    ) -> DriverResult<vk::ShaderModule> {
        self.device()?.create_shader_module(info, None)
    }

    unsafe fn destroy_shader_module(&self, module: vk::ShaderModule) {
        if let Ok(device) = self.device() {
            device.destroy_shader_module(module, None);
        }
    }

    unsafe fn create_pipeline_layout(
        &self,
        info: &vk::PipelineLayoutCreateInfo,
    ) -> DriverResult<vk::PipelineLayout> {
        self.device()?.create_pipeline_layout(info, None)
    }

    unsafe fn destroy_pipeline_layout(&self, layout: vk::PipelineLayout) {
        if let Ok(device) = self.device() {
            device.destroy_pipeline_layout(layout, None);
        }
    }

    unsafe fn create_graphics_pipeline(
        &self,
        info: &vk::GraphicsPipelineCreateInfo,
    ) -> DriverResult<vk::Pipeline> {
        let (pipelines, _) =
            self.device()?
                .create_graphics_pipelines(vk::PipelineCache::null(), &[*info], None)?;
        pipelines
            .into_iter()
            .next()
            .ok_or(vk::ErrorCode::INITIALIZATION_FAILED)
    }

    unsafe fn destroy_pipeline(&self, pipeline: vk::Pipeline) {
        if let Ok(device) = self.device() {
            device.destroy_pipeline(pipeline, None);
        }
    }

    // Frame resources

    unsafe fn create_framebuffer(
        &self,
        info: &vk::FramebufferCreateInfo,
    ) -> DriverResult<vk::Framebuffer> {
        self.device()?.create_framebuffer(info, None)
    }

    unsafe fn destroy_framebuffer(&self, framebuffer: vk::Framebuffer) {
        if let Ok(device) = self.device() {
            device.destroy_framebuffer(framebuffer, None);
        }
    }

    unsafe fn create_command_pool(
        &self,
        info: &vk::CommandPoolCreateInfo,
    ) -> DriverResult<vk::CommandPool> {
        self.device()?.create_command_pool(info, None)
    }

    unsafe fn destroy_command_pool(&self, pool: vk::CommandPool) {
        if let Ok(device) = self.device() {
            device.destroy_command_pool(pool, None);
        }
    }

    unsafe fn allocate_command_buffers(
        &self,
        info: &vk::CommandBufferAllocateInfo,
    ) -> DriverResult<Vec<vk::CommandBuffer>> {
        self.device()?.allocate_command_buffers(info)
    }

    // Synchronization

    unsafe fn create_semaphore(&self) -> DriverResult<vk::Semaphore> {
        let info = vk::SemaphoreCreateInfo::builder();
        self.device()?.create_semaphore(&info, None)
    }

    unsafe fn destroy_semaphore(&self, semaphore: vk::Semaphore) {
        if let Ok(device) = self.device() {
            device.destroy_semaphore(semaphore, None);
        }
    }

    unsafe fn create_fence(&self, info: &vk::FenceCreateInfo) -> DriverResult<vk::Fence> {
        self.device()?.create_fence(info, None)
    }

    unsafe fn destroy_fence(&self, fence: vk::Fence) {
        if let Ok(device) = self.device() {
            device.destroy_fence(fence, None);
        }
    }

    unsafe fn wait_for_fence(&self, fence: vk::Fence, timeout: u64) -> DriverResult<()> {
        self.device()?.wait_for_fences(&[fence], true, timeout)?;
        Ok(())
    }

    unsafe fn reset_fence(&self, fence: vk::Fence) -> DriverResult<()> {
        self.device()?.reset_fences(&[fence])
    }

    // Recording

    unsafe fn reset_command_buffer(&self, command_buffer: vk::CommandBuffer) -> DriverResult<()> {
        self.device()?
            .reset_command_buffer(command_buffer, vk::CommandBufferResetFlags::empty())
    }

    unsafe fn begin_command_buffer(
        &self,
        command_buffer: vk::CommandBuffer,
        info: &vk::CommandBufferBeginInfo,
    ) -> DriverResult<()> {
        self.device()?.begin_command_buffer(command_buffer, info)
    }

    unsafe fn end_command_buffer(&self, command_buffer: vk::CommandBuffer) -> DriverResult<()> {
        self.device()?.end_command_buffer(command_buffer)
    }

    unsafe fn cmd_begin_render_pass(
        &self,
        command_buffer: vk::CommandBuffer,
        info: &vk::RenderPassBeginInfo,
    ) {
        if let Ok(device) = self.device() {
            device.cmd_begin_render_pass(command_buffer, info, vk::SubpassContents::INLINE);
        }
    }

    unsafe fn cmd_bind_pipeline(&self, command_buffer: vk::CommandBuffer, pipeline: vk::Pipeline) {
        if let Ok(device) = self.device() {
            device.cmd_bind_pipeline(command_buffer, vk::PipelineBindPoint::GRAPHICS, pipeline);
        }
    }

    unsafe fn cmd_set_viewport(&self, command_buffer: vk::CommandBuffer, viewport: vk::Viewport) {
        if let Ok(device) = self.device() {
            device.cmd_set_viewport(command_buffer, 0, &[viewport]);
        }
    }

    unsafe fn cmd_set_scissor(&self, command_buffer: vk::CommandBuffer, scissor: vk::Rect2D) {
        if let Ok(device) = self.device() {
            device.cmd_set_scissor(command_buffer, 0, &[scissor]);
        }
    }

    unsafe fn cmd_draw(
        &self,
        command_buffer: vk::CommandBuffer,
        vertex_count: u32,
        instance_count: u32,
    ) {
        if let Ok(device) = self.device() {
            device.cmd_draw(command_buffer, vertex_count, instance_count, 0, 0);
        }
    }

    unsafe fn cmd_end_render_pass(&self, command_buffer: vk::CommandBuffer) {
        if let Ok(device) = self.device() {
            device.cmd_end_render_pass(command_buffer);
        }
    }

    // Queues

    unsafe fn acquire_next_image(
        &self,
        swapchain: vk::SwapchainKHR,
        timeout: u64,
        semaphore: vk::Semaphore,
    ) -> DriverResult<(u32, vk::SuccessCode)> {
        self.device()?
            .acquire_next_image_khr(swapchain, timeout, semaphore, vk::Fence::null())
    }

    unsafe fn queue_submit(
        &self,
        queue: vk::Queue,
        submit: &vk::SubmitInfo,
        fence: vk::Fence,
    ) -> DriverResult<()> {
        self.device()?.queue_submit(queue, &[*submit], fence)
    }

    unsafe fn queue_present(
        &self,
        queue: vk::Queue,
        info: &vk::PresentInfoKHR,
    ) -> DriverResult<vk::SuccessCode> {
        self.device()?.queue_present_khr(queue, info)
    }
}
