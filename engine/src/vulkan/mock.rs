//! A recording, in-memory stand-in for the Vulkan driver.
//!
//! Objects get unique fake handles. The driver tracks which objects are
//! alive, the order they were destroyed in, fence and semaphore signal state,
//! and copies out the parts of every create-info the tests look at.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};
use std::ffi::{c_char, CStr};
use std::rc::Rc;
use std::slice;

use vulkanalia::vk::{self, Handle};
use vulkanalia::Version;

use super::driver::{Driver, DriverResult, RenderWindow};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Kind {
    Instance,
    Messenger,
    Surface,
    Device,
    Swapchain,
    ImageView,
    RenderPass,
    ShaderModule,
    PipelineLayout,
    Pipeline,
    Framebuffer,
    CommandPool,
    Semaphore,
    Fence,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    BeginRenderPass {
        framebuffer: vk::Framebuffer,
        extent: (u32, u32),
        clear: [f32; 4],
    },
    BindPipeline(vk::Pipeline),
    SetViewport { width: f32, height: f32 },
    SetScissor { width: u32, height: u32 },
    Draw { vertex_count: u32, instance_count: u32 },
    EndRenderPass,
}

#[derive(Clone, Debug)]
pub struct MockQueueFamily {
    pub flags: vk::QueueFlags,
    pub present: bool,
}

#[derive(Clone, Debug)]
pub struct MockAdapter {
    pub name: &'static str,
    pub queue_families: Vec<MockQueueFamily>,
    pub extensions: Vec<vk::ExtensionName>,
    pub formats: Vec<vk::SurfaceFormatKHR>,
    pub present_modes: Vec<vk::PresentModeKHR>,
    pub capabilities: vk::SurfaceCapabilitiesKHR,
    /// Images the swapchain hands back; defaults to the requested minimum.
    pub image_count: Option<u32>,
}

impl MockAdapter {
    /// One family doing graphics and presentation, BGRA sRGB, FIFO only.
    pub fn capable(name: &'static str) -> Self {
        let mut capabilities = vk::SurfaceCapabilitiesKHR::default();
        capabilities.min_image_count = 2;
        capabilities.max_image_count = 0;
        capabilities.current_extent = vk::Extent2D {
            width: 900,
            height: 600,
        };
        capabilities.min_image_extent = vk::Extent2D {
            width: 1,
            height: 1,
        };
        capabilities.max_image_extent = vk::Extent2D {
            width: 4096,
            height: 4096,
        };
        capabilities.current_transform = vk::SurfaceTransformFlagsKHR::IDENTITY;

        Self {
            name,
            queue_families: vec![MockQueueFamily {
                flags: vk::QueueFlags::GRAPHICS | vk::QueueFlags::TRANSFER,
                present: true,
            }],
            extensions: vec![vk::KHR_SWAPCHAIN_EXTENSION.name],
            formats: vec![vk::SurfaceFormatKHR {
                format: vk::Format::B8G8R8A8_SRGB,
                color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
            }],
            present_modes: vec![vk::PresentModeKHR::FIFO],
            capabilities,
            image_count: None,
        }
    }

    /// Graphics on family 0, presentation only on family 1.
    pub fn split_queues(name: &'static str) -> Self {
        let mut adapter = Self::capable(name);
        adapter.queue_families = vec![
            MockQueueFamily {
                flags: vk::QueueFlags::GRAPHICS,
                present: false,
            },
            MockQueueFamily {
                flags: vk::QueueFlags::TRANSFER,
                present: true,
            },
        ];
        adapter
    }
}

#[derive(Clone, Debug, Default)]
pub struct InstanceRecord {
    pub application_name: String,
    pub layers: Vec<String>,
    pub extensions: Vec<String>,
    pub debug_chained: bool,
}

#[derive(Clone, Debug, Default)]
pub struct DeviceRecord {
    pub queue_families: Vec<u32>,
    pub queue_counts: Vec<u32>,
    pub priorities: Vec<f32>,
    pub layers: Vec<String>,
    pub extensions: Vec<String>,
}

#[derive(Clone, Debug)]
pub struct SwapchainRecord {
    pub min_image_count: u32,
    pub format: vk::Format,
    pub color_space: vk::ColorSpaceKHR,
    pub extent: (u32, u32),
    pub usage: vk::ImageUsageFlags,
    pub sharing_mode: vk::SharingMode,
    pub queue_family_indices: Vec<u32>,
    pub pre_transform: vk::SurfaceTransformFlagsKHR,
    pub composite_alpha: vk::CompositeAlphaFlagsKHR,
    pub present_mode: vk::PresentModeKHR,
    pub clipped: bool,
}

#[derive(Clone, Debug)]
pub struct ImageViewRecord {
    pub image: vk::Image,
    pub format: vk::Format,
    pub view_type: vk::ImageViewType,
    pub identity: bool,
    pub aspect: vk::ImageAspectFlags,
    pub levels: u32,
    pub layers: u32,
}

#[derive(Clone, Debug)]
pub struct RenderPassRecord {
    pub format: vk::Format,
    pub samples: vk::SampleCountFlags,
    pub load_op: vk::AttachmentLoadOp,
    pub store_op: vk::AttachmentStoreOp,
    pub initial_layout: vk::ImageLayout,
    pub final_layout: vk::ImageLayout,
    pub subpasses: u32,
    pub color_references: Vec<(u32, vk::ImageLayout)>,
    pub dependencies: Vec<vk::SubpassDependency>,
}

#[derive(Clone, Debug)]
pub struct PipelineRecord {
    pub stages: Vec<vk::ShaderStageFlags>,
    pub vertex_bindings: u32,
    pub vertex_attributes: u32,
    pub topology: vk::PrimitiveTopology,
    pub viewport_count: u32,
    pub scissor_count: u32,
    pub polygon_mode: vk::PolygonMode,
    pub cull_mode: vk::CullModeFlags,
    pub front_face: vk::FrontFace,
    pub samples: vk::SampleCountFlags,
    pub depth_stencil: bool,
    pub blend_enabled: Vec<bool>,
    pub write_mask: vk::ColorComponentFlags,
    pub dynamic_states: Vec<vk::DynamicState>,
    pub layout: vk::PipelineLayout,
    pub render_pass: vk::RenderPass,
}

#[derive(Clone, Debug)]
pub struct SubmitRecord {
    pub queue: vk::Queue,
    pub wait: Vec<vk::Semaphore>,
    pub stages: Vec<vk::PipelineStageFlags>,
    pub command_buffers: Vec<vk::CommandBuffer>,
    pub signal: Vec<vk::Semaphore>,
    pub fence: vk::Fence,
}

#[derive(Clone, Debug)]
pub struct PresentRecord {
    pub queue: vk::Queue,
    pub wait: Vec<vk::Semaphore>,
    pub swapchains: Vec<vk::SwapchainKHR>,
    pub image_indices: Vec<u32>,
}

#[derive(Clone, Debug)]
pub struct MockWindow {
    pub size: vk::Extent2D,
}

impl MockWindow {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            size: vk::Extent2D { width, height },
        }
    }
}

impl RenderWindow for MockWindow {
    fn drawable_size(&self) -> vk::Extent2D {
        self.size
    }
}

#[derive(Default)]
pub struct MockDriver {
    pub layers: Vec<vk::ExtensionName>,
    pub instance_extensions: Vec<vk::ExtensionName>,
    pub adapters: Vec<MockAdapter>,
    /// Per call: successful calls still allowed, then the code to fail with.
    failures: RefCell<HashMap<&'static str, (usize, vk::ErrorCode)>>,
    acquire_code: Cell<Option<vk::SuccessCode>>,
    acquire_index: Cell<Option<u32>>,
    present_code: Cell<Option<vk::SuccessCode>>,

    next_handle: Cell<u64>,
    live: RefCell<Vec<(Kind, u64)>>,
    destroyed: RefCell<Vec<(Kind, u64)>>,
    invalid_destroys: Cell<usize>,
    calls: RefCell<Vec<&'static str>>,

    fences: RefCell<HashMap<u64, bool>>,
    signaled_semaphores: RefCell<HashSet<u64>>,
    protocol_errors: RefCell<Vec<String>>,

    pub instance: RefCell<Option<InstanceRecord>>,
    pub device: RefCell<Option<DeviceRecord>>,
    pub swapchain: RefCell<Option<SwapchainRecord>>,
    pub image_views: RefCell<Vec<ImageViewRecord>>,
    pub render_pass: RefCell<Option<RenderPassRecord>>,
    pub pipeline: RefCell<Option<PipelineRecord>>,
    pub framebuffers: RefCell<Vec<(vk::Framebuffer, Vec<vk::ImageView>, (u32, u32))>>,
    pub command_pool_flags: Cell<Option<(vk::CommandPoolCreateFlags, u32)>>,
    pub shader_codes: RefCell<Vec<usize>>,

    images: RefCell<Vec<vk::Image>>,
    acquired: Cell<u32>,
    recording: Cell<bool>,
    pub commands: RefCell<Vec<Command>>,
    pub submits: RefCell<Vec<SubmitRecord>>,
    pub presents: RefCell<Vec<PresentRecord>>,
}

impl MockDriver {
    /// Validation layer and debug utils available, the given adapters.
    pub fn new(adapters: Vec<MockAdapter>) -> Rc<Self> {
        Rc::new(Self::with_adapters(adapters))
    }

    pub fn with_adapters(adapters: Vec<MockAdapter>) -> Self {
        Self {
            layers: vec![super::constants::VALIDATION_LAYER],
            instance_extensions: vec![
                vk::KHR_SURFACE_EXTENSION.name,
                vk::EXT_DEBUG_UTILS_EXTENSION.name,
            ],
            adapters,
            next_handle: Cell::new(1),
            ..Default::default()
        }
    }

    pub fn fail(&self, call: &'static str, code: vk::ErrorCode) {
        self.fail_after(call, 0, code);
    }

    /// Lets `successes` calls through before `call` starts failing.
    pub fn fail_after(&self, call: &'static str, successes: usize, code: vk::ErrorCode) {
        self.failures.borrow_mut().insert(call, (successes, code));
    }

    pub fn set_acquire_code(&self, code: vk::SuccessCode) {
        self.acquire_code.set(Some(code));
    }

    /// Reports `index` from every acquire, whether or not such an image exists.
    pub fn set_acquire_index(&self, index: u32) {
        self.acquire_index.set(Some(index));
    }

    pub fn set_present_code(&self, code: vk::SuccessCode) {
        self.present_code.set(Some(code));
    }

    pub fn live(&self) -> Vec<(Kind, u64)> {
        self.live.borrow().clone()
    }

    pub fn live_of(&self, kind: Kind) -> usize {
        self.live.borrow().iter().filter(|(k, _)| *k == kind).count()
    }

    pub fn destroyed(&self) -> Vec<(Kind, u64)> {
        self.destroyed.borrow().clone()
    }

    pub fn invalid_destroys(&self) -> usize {
        self.invalid_destroys.get()
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.borrow().clone()
    }

    pub fn protocol_errors(&self) -> Vec<String> {
        self.protocol_errors.borrow().clone()
    }

    fn call(&self, name: &'static str) -> DriverResult<()> {
        self.calls.borrow_mut().push(name);
        match self.failures.borrow_mut().get_mut(name) {
            Some((0, code)) => Err(*code),
            Some((successes, _)) => {
                *successes -= 1;
                Ok(())
            }
            None => Ok(()),
        }
    }

    fn protocol_error(&self, message: String) {
        self.protocol_errors.borrow_mut().push(message);
    }

    fn raw(&self) -> u64 {
        let raw = self.next_handle.get();
        self.next_handle.set(raw + 1);
        raw
    }

    fn create(&self, name: &'static str, kind: Kind) -> DriverResult<u64> {
        self.call(name)?;
        let raw = self.raw();
        self.live.borrow_mut().push((kind, raw));
        Ok(raw)
    }

    fn destroy(&self, kind: Kind, raw: u64) {
        let mut live = self.live.borrow_mut();
        match live.iter().position(|entry| *entry == (kind, raw)) {
            Some(position) => {
                live.remove(position);
                self.destroyed.borrow_mut().push((kind, raw));
            }
            None => self.invalid_destroys.set(self.invalid_destroys.get() + 1),
        }
    }

    fn adapter(&self, physical_device: vk::PhysicalDevice) -> &MockAdapter {
        &self.adapters[physical_device.as_raw() - 1]
    }

    fn wait_semaphores(&self, semaphores: &[vk::Semaphore], stage: &str) {
        let mut signaled = self.signaled_semaphores.borrow_mut();
        for semaphore in semaphores {
            if !signaled.remove(&semaphore.as_raw()) {
                self.protocol_error(format!("{} waits on unsignaled {:?}", stage, semaphore));
            }
        }
    }

    fn signal_semaphores(&self, semaphores: &[vk::Semaphore], stage: &str) {
        let mut signaled = self.signaled_semaphores.borrow_mut();
        for semaphore in semaphores {
            if !signaled.insert(semaphore.as_raw()) {
                self.protocol_error(format!("{} signals already signaled {:?}", stage, semaphore));
            }
        }
    }
}

unsafe fn strings(names: *const *const c_char, count: u32) -> Vec<String> {
    if count == 0 || names.is_null() {
        return Vec::new();
    }
    slice::from_raw_parts(names, count as usize)
        .iter()
        .map(|name| CStr::from_ptr(*name).to_string_lossy().into_owned())
        .collect()
}

unsafe fn items<'a, T>(pointer: *const T, count: u32) -> &'a [T] {
    if count == 0 || pointer.is_null() {
        &[]
    } else {
        slice::from_raw_parts(pointer, count as usize)
    }
}

impl Driver for MockDriver {
    type Window = MockWindow;

    fn loader_version(&self) -> DriverResult<Version> {
        Ok(Version::new(1, 3, 0))
    }

    unsafe fn instance_layers(&self) -> DriverResult<HashSet<vk::ExtensionName>> {
        self.call("instance_layers")?;
        Ok(self.layers.iter().copied().collect())
    }

    unsafe fn instance_extensions(&self) -> DriverResult<HashSet<vk::ExtensionName>> {
        self.call("instance_extensions")?;
        Ok(self.instance_extensions.iter().copied().collect())
    }

    fn window_extensions(&self, _window: &MockWindow) -> Vec<vk::ExtensionName> {
        vec![vk::KHR_SURFACE_EXTENSION.name]
    }

    unsafe fn create_instance(&self, info: &vk::InstanceCreateInfo) -> DriverResult<vk::Instance> {
        let raw = self.create("create_instance", Kind::Instance)?;
        let application_name = if info.application_info.is_null() {
            String::new()
        } else {
            let app = &*info.application_info;
            CStr::from_ptr(app.application_name)
                .to_string_lossy()
                .into_owned()
        };
        *self.instance.borrow_mut() = Some(InstanceRecord {
            application_name,
            layers: strings(info.enabled_layer_names, info.enabled_layer_count),
            extensions: strings(info.enabled_extension_names, info.enabled_extension_count),
            debug_chained: !info.next.is_null(),
        });
        Ok(vk::Instance::from_raw(raw as usize))
    }

    unsafe fn destroy_instance(&self, instance: vk::Instance) {
        self.destroy(Kind::Instance, instance.as_raw() as u64);
    }

    unsafe fn create_debug_messenger(
        &self,
        _info: &vk::DebugUtilsMessengerCreateInfoEXT,
    ) -> DriverResult<vk::DebugUtilsMessengerEXT> {
        let raw = self.create("create_debug_messenger", Kind::Messenger)?;
        Ok(vk::DebugUtilsMessengerEXT::from_raw(raw))
    }

    unsafe fn destroy_debug_messenger(&self, messenger: vk::DebugUtilsMessengerEXT) {
        self.destroy(Kind::Messenger, messenger.as_raw());
    }

    unsafe fn create_surface(&self, _window: &MockWindow) -> DriverResult<vk::SurfaceKHR> {
        let raw = self.create("create_surface", Kind::Surface)?;
        Ok(vk::SurfaceKHR::from_raw(raw))
    }

    unsafe fn destroy_surface(&self, surface: vk::SurfaceKHR) {
        self.destroy(Kind::Surface, surface.as_raw());
    }

    unsafe fn enumerate_physical_devices(&self) -> DriverResult<Vec<vk::PhysicalDevice>> {
        self.call("enumerate_physical_devices")?;
        Ok((1..=self.adapters.len())
            .map(|raw| vk::PhysicalDevice::from_raw(raw))
            .collect())
    }

    unsafe fn physical_device_name(
        &self,
        physical_device: vk::PhysicalDevice,
    ) -> DriverResult<String> {
        self.call("physical_device_name")?;
        Ok(self.adapter(physical_device).name.to_string())
    }

    unsafe fn queue_family_properties(
        &self,
        physical_device: vk::PhysicalDevice,
    ) -> DriverResult<Vec<vk::QueueFamilyProperties>> {
        self.call("queue_family_properties")?;
        Ok(self
            .adapter(physical_device)
            .queue_families
            .iter()
            .map(|family| {
                let mut properties = vk::QueueFamilyProperties::default();
                properties.queue_flags = family.flags;
                properties.queue_count = 1;
                properties
            })
            .collect())
    }

    unsafe fn surface_support(
        &self,
        physical_device: vk::PhysicalDevice,
        queue_family_index: u32,
        _surface: vk::SurfaceKHR,
    ) -> DriverResult<bool> {
        self.call("surface_support")?;
        Ok(self.adapter(physical_device).queue_families[queue_family_index as usize].present)
    }

    unsafe fn device_extensions(
        &self,
        physical_device: vk::PhysicalDevice,
    ) -> DriverResult<HashSet<vk::ExtensionName>> {
        self.call("device_extensions")?;
        Ok(self
            .adapter(physical_device)
            .extensions
            .iter()
            .copied()
            .collect())
    }

    unsafe fn surface_capabilities(
        &self,
        physical_device: vk::PhysicalDevice,
        _surface: vk::SurfaceKHR,
    ) -> DriverResult<vk::SurfaceCapabilitiesKHR> {
        self.call("surface_capabilities")?;
        Ok(self.adapter(physical_device).capabilities)
    }

    unsafe fn surface_formats(
        &self,
        physical_device: vk::PhysicalDevice,
        _surface: vk::SurfaceKHR,
    ) -> DriverResult<Vec<vk::SurfaceFormatKHR>> {
        self.call("surface_formats")?;
        Ok(self.adapter(physical_device).formats.clone())
    }

    unsafe fn surface_present_modes(
        &self,
        physical_device: vk::PhysicalDevice,
        _surface: vk::SurfaceKHR,
    ) -> DriverResult<Vec<vk::PresentModeKHR>> {
        self.call("surface_present_modes")?;
        Ok(self.adapter(physical_device).present_modes.clone())
    }

    unsafe fn create_device(
        &self,
        _physical_device: vk::PhysicalDevice,
        info: &vk::DeviceCreateInfo,
    ) -> DriverResult<vk::Device> {
        let raw = self.create("create_device", Kind::Device)?;
        let queues = items(info.queue_create_infos, info.queue_create_info_count);
        *self.device.borrow_mut() = Some(DeviceRecord {
            queue_families: queues.iter().map(|q| q.queue_family_index).collect(),
            queue_counts: queues.iter().map(|q| q.queue_count).collect(),
            priorities: queues
                .iter()
                .flat_map(|q| items(q.queue_priorities, q.queue_count).iter().copied())
                .collect(),
            layers: strings(info.enabled_layer_names, info.enabled_layer_count),
            extensions: strings(info.enabled_extension_names, info.enabled_extension_count),
        });
        Ok(vk::Device::from_raw(raw as usize))
    }

    unsafe fn destroy_device(&self, device: vk::Device) {
        self.destroy(Kind::Device, device.as_raw() as u64);
    }

    unsafe fn device_queue(
        &self,
        queue_family_index: u32,
        queue_index: u32,
    ) -> DriverResult<vk::Queue> {
        self.call("device_queue")?;
        Ok(vk::Queue::from_raw(
            1000 + queue_family_index as usize * 10 + queue_index as usize,
        ))
    }

    unsafe fn device_wait_idle(&self) -> DriverResult<()> {
        self.call("device_wait_idle")
    }

    unsafe fn create_swapchain(
        &self,
        info: &vk::SwapchainCreateInfoKHR,
    ) -> DriverResult<vk::SwapchainKHR> {
        let raw = self.create("create_swapchain", Kind::Swapchain)?;
        let record = SwapchainRecord {
            min_image_count: info.min_image_count,
            format: info.image_format,
            color_space: info.image_color_space,
            extent: (info.image_extent.width, info.image_extent.height),
            usage: info.image_usage,
            sharing_mode: info.image_sharing_mode,
            queue_family_indices: items(info.queue_family_indices, info.queue_family_index_count)
                .to_vec(),
            pre_transform: info.pre_transform,
            composite_alpha: info.composite_alpha,
            present_mode: info.present_mode,
            clipped: info.clipped == vk::TRUE,
        };

        let count = self
            .adapters
            .iter()
            .find_map(|a| a.image_count)
            .unwrap_or(info.min_image_count);
        *self.images.borrow_mut() = (0..count)
            .map(|i| vk::Image::from_raw(500 + i as u64))
            .collect();
        *self.swapchain.borrow_mut() = Some(record);
        Ok(vk::SwapchainKHR::from_raw(raw))
    }

    unsafe fn swapchain_images(&self, _swapchain: vk::SwapchainKHR) -> DriverResult<Vec<vk::Image>> {
        self.call("swapchain_images")?;
        Ok(self.images.borrow().clone())
    }

    unsafe fn destroy_swapchain(&self, swapchain: vk::SwapchainKHR) {
        self.destroy(Kind::Swapchain, swapchain.as_raw());
    }

    unsafe fn create_image_view(
        &self,
        info: &vk::ImageViewCreateInfo,
    ) -> DriverResult<vk::ImageView> {
        let raw = self.create("create_image_view", Kind::ImageView)?;
        let c = info.components;
        let identity = [c.r, c.g, c.b, c.a]
            .iter()
            .all(|s| *s == vk::ComponentSwizzle::IDENTITY);
        self.image_views.borrow_mut().push(ImageViewRecord {
            image: info.image,
            format: info.format,
            view_type: info.view_type,
            identity,
            aspect: info.subresource_range.aspect_mask,
            levels: info.subresource_range.level_count,
            layers: info.subresource_range.layer_count,
        });
        Ok(vk::ImageView::from_raw(raw))
    }

    unsafe fn destroy_image_view(&self, view: vk::ImageView) {
        self.destroy(Kind::ImageView, view.as_raw());
    }

    unsafe fn create_render_pass(
        &self,
        info: &vk::RenderPassCreateInfo,
    ) -> DriverResult<vk::RenderPass> {
        let raw = self.create("create_render_pass", Kind::RenderPass)?;
        let attachment = items(info.attachments, info.attachment_count)[0];
        let subpasses = items(info.subpasses, info.subpass_count);
        let color_references = subpasses
            .iter()
            .flat_map(|s| items(s.color_attachments, s.color_attachment_count).iter())
            .map(|r| (r.attachment, r.layout))
            .collect();
        *self.render_pass.borrow_mut() = Some(RenderPassRecord {
            format: attachment.format,
            samples: attachment.samples,
            load_op: attachment.load_op,
            store_op: attachment.store_op,
            initial_layout: attachment.initial_layout,
            final_layout: attachment.final_layout,
            subpasses: info.subpass_count,
            color_references,
            dependencies: items(info.dependencies, info.dependency_count).to_vec(),
        });
        Ok(vk::RenderPass::from_raw(raw))
    }

    unsafe fn destroy_render_pass(&self, render_pass: vk::RenderPass) {
        self.destroy(Kind::RenderPass, render_pass.as_raw());
    }

    unsafe fn create_shader_module(
        &self,
        info: &vk::ShaderModuleCreateInfo,
    ) -> DriverResult<vk::ShaderModule> {
        let raw = self.create("create_shader_module", Kind::ShaderModule)?;
        self.shader_codes.borrow_mut().push(info.code_size);
        Ok(vk::ShaderModule::from_raw(raw))
    }

    unsafe fn destroy_shader_module(&self, module: vk::ShaderModule) {
        self.destroy(Kind::ShaderModule, module.as_raw());
    }

    unsafe fn create_pipeline_layout(
        &self,
        _info: &vk::PipelineLayoutCreateInfo,
    ) -> DriverResult<vk::PipelineLayout> {
        let raw = self.create("create_pipeline_layout", Kind::PipelineLayout)?;
        Ok(vk::PipelineLayout::from_raw(raw))
    }

    unsafe fn destroy_pipeline_layout(&self, layout: vk::PipelineLayout) {
        self.destroy(Kind::PipelineLayout, layout.as_raw());
    }

    unsafe fn create_graphics_pipeline(
        &self,
        info: &vk::GraphicsPipelineCreateInfo,
    ) -> DriverResult<vk::Pipeline> {
        let raw = self.create("create_graphics_pipeline", Kind::Pipeline)?;
        let vertex_input = &*info.vertex_input_state;
        let input_assembly = &*info.input_assembly_state;
        let viewport = &*info.viewport_state;
        let rasterization = &*info.rasterization_state;
        let multisample = &*info.multisample_state;
        let blend = &*info.color_blend_state;
        let dynamic = &*info.dynamic_state;
        let attachments = items(blend.attachments, blend.attachment_count);

        *self.pipeline.borrow_mut() = Some(PipelineRecord {
            stages: items(info.stages, info.stage_count)
                .iter()
                .map(|s| s.stage)
                .collect(),
            vertex_bindings: vertex_input.vertex_binding_description_count,
            vertex_attributes: vertex_input.vertex_attribute_description_count,
            topology: input_assembly.topology,
            viewport_count: viewport.viewport_count,
            scissor_count: viewport.scissor_count,
            polygon_mode: rasterization.polygon_mode,
            cull_mode: rasterization.cull_mode,
            front_face: rasterization.front_face,
            samples: multisample.rasterization_samples,
            depth_stencil: !info.depth_stencil_state.is_null(),
            blend_enabled: attachments.iter().map(|a| a.blend_enable == vk::TRUE).collect(),
            write_mask: attachments
                .first()
                .map(|a| a.color_write_mask)
                .unwrap_or(vk::ColorComponentFlags::empty()),
            dynamic_states: items(dynamic.dynamic_states, dynamic.dynamic_state_count).to_vec(),
            layout: info.layout,
            render_pass: info.render_pass,
        });
        Ok(vk::Pipeline::from_raw(raw))
    }

    unsafe fn destroy_pipeline(&self, pipeline: vk::Pipeline) {
        self.destroy(Kind::Pipeline, pipeline.as_raw());
    }

    unsafe fn create_framebuffer(
        &self,
        info: &vk::FramebufferCreateInfo,
    ) -> DriverResult<vk::Framebuffer> {
        let raw = self.create("create_framebuffer", Kind::Framebuffer)?;
        let framebuffer = vk::Framebuffer::from_raw(raw);
        self.framebuffers.borrow_mut().push((
            framebuffer,
            items(info.attachments, info.attachment_count).to_vec(),
            (info.width, info.height),
        ));
        Ok(framebuffer)
    }

    unsafe fn destroy_framebuffer(&self, framebuffer: vk::Framebuffer) {
        self.destroy(Kind::Framebuffer, framebuffer.as_raw());
    }

    unsafe fn create_command_pool(
        &self,
        info: &vk::CommandPoolCreateInfo,
    ) -> DriverResult<vk::CommandPool> {
        let raw = self.create("create_command_pool", Kind::CommandPool)?;
        self.command_pool_flags
            .set(Some((info.flags, info.queue_family_index)));
        Ok(vk::CommandPool::from_raw(raw))
    }

    unsafe fn destroy_command_pool(&self, pool: vk::CommandPool) {
        self.destroy(Kind::CommandPool, pool.as_raw());
    }

    unsafe fn allocate_command_buffers(
        &self,
        info: &vk::CommandBufferAllocateInfo,
    ) -> DriverResult<Vec<vk::CommandBuffer>> {
        self.call("allocate_command_buffers")?;
        if info.level != vk::CommandBufferLevel::PRIMARY {
            self.protocol_error("secondary command buffer allocated".into());
        }
        Ok((0..info.command_buffer_count)
            .map(|_| vk::CommandBuffer::from_raw(self.raw() as usize))
            .collect())
    }

    unsafe fn create_semaphore(&self) -> DriverResult<vk::Semaphore> {
        let raw = self.create("create_semaphore", Kind::Semaphore)?;
        Ok(vk::Semaphore::from_raw(raw))
    }

    unsafe fn destroy_semaphore(&self, semaphore: vk::Semaphore) {
        self.destroy(Kind::Semaphore, semaphore.as_raw());
    }

    unsafe fn create_fence(&self, info: &vk::FenceCreateInfo) -> DriverResult<vk::Fence> {
        let raw = self.create("create_fence", Kind::Fence)?;
        self.fences
            .borrow_mut()
            .insert(raw, info.flags.contains(vk::FenceCreateFlags::SIGNALED));
        Ok(vk::Fence::from_raw(raw))
    }

    unsafe fn destroy_fence(&self, fence: vk::Fence) {
        self.destroy(Kind::Fence, fence.as_raw());
    }

    unsafe fn wait_for_fence(&self, fence: vk::Fence, _timeout: u64) -> DriverResult<()> {
        self.call("wait_for_fence")?;
        if self.fences.borrow().get(&fence.as_raw()) != Some(&true) {
            self.protocol_error(format!("waiting on {:?} that will never signal", fence));
            return Err(vk::ErrorCode::DEVICE_LOST);
        }
        Ok(())
    }

    unsafe fn reset_fence(&self, fence: vk::Fence) -> DriverResult<()> {
        self.call("reset_fence")?;
        self.fences.borrow_mut().insert(fence.as_raw(), false);
        Ok(())
    }

    unsafe fn reset_command_buffer(&self, _command_buffer: vk::CommandBuffer) -> DriverResult<()> {
        self.call("reset_command_buffer")?;
        if self.recording.get() {
            self.protocol_error("command buffer reset while recording".into());
        }
        self.commands.borrow_mut().clear();
        Ok(())
    }

    unsafe fn begin_command_buffer(
        &self,
        _command_buffer: vk::CommandBuffer,
        _info: &vk::CommandBufferBeginInfo,
    ) -> DriverResult<()> {
        self.call("begin_command_buffer")?;
        self.recording.set(true);
        Ok(())
    }

    unsafe fn end_command_buffer(&self, _command_buffer: vk::CommandBuffer) -> DriverResult<()> {
        self.call("end_command_buffer")?;
        self.recording.set(false);
        Ok(())
    }

    unsafe fn cmd_begin_render_pass(
        &self,
        _command_buffer: vk::CommandBuffer,
        info: &vk::RenderPassBeginInfo,
    ) {
        let clear = items(info.clear_values, info.clear_value_count)
            .first()
            .map(|value| value.color.float32)
            .unwrap_or_default();
        self.commands.borrow_mut().push(Command::BeginRenderPass {
            framebuffer: info.framebuffer,
            extent: (info.render_area.extent.width, info.render_area.extent.height),
            clear,
        });
    }

    unsafe fn cmd_bind_pipeline(&self, _command_buffer: vk::CommandBuffer, pipeline: vk::Pipeline) {
        self.commands.borrow_mut().push(Command::BindPipeline(pipeline));
    }

    unsafe fn cmd_set_viewport(&self, _command_buffer: vk::CommandBuffer, viewport: vk::Viewport) {
        self.commands.borrow_mut().push(Command::SetViewport {
            width: viewport.width,
            height: viewport.height,
        });
    }

    unsafe fn cmd_set_scissor(&self, _command_buffer: vk::CommandBuffer, scissor: vk::Rect2D) {
        self.commands.borrow_mut().push(Command::SetScissor {
            width: scissor.extent.width,
            height: scissor.extent.height,
        });
    }

    unsafe fn cmd_draw(
        &self,
        _command_buffer: vk::CommandBuffer,
        vertex_count: u32,
        instance_count: u32,
    ) {
        self.commands.borrow_mut().push(Command::Draw {
            vertex_count,
            instance_count,
        });
    }

    unsafe fn cmd_end_render_pass(&self, _command_buffer: vk::CommandBuffer) {
        self.commands.borrow_mut().push(Command::EndRenderPass);
    }

    unsafe fn acquire_next_image(
        &self,
        _swapchain: vk::SwapchainKHR,
        _timeout: u64,
        semaphore: vk::Semaphore,
    ) -> DriverResult<(u32, vk::SuccessCode)> {
        self.call("acquire_next_image")?;
        let count = self.images.borrow().len().max(1) as u32;
        let index = self
            .acquire_index
            .get()
            .unwrap_or(self.acquired.get() % count);
        self.acquired.set(self.acquired.get() + 1);
        self.signal_semaphores(&[semaphore], "acquire");
        let code = self.acquire_code.get().unwrap_or(vk::SuccessCode::SUCCESS);
        Ok((index, code))
    }

    unsafe fn queue_submit(
        &self,
        queue: vk::Queue,
        submit: &vk::SubmitInfo,
        fence: vk::Fence,
    ) -> DriverResult<()> {
        self.call("queue_submit")?;
        if self.recording.get() {
            self.protocol_error("submitted a command buffer still recording".into());
        }
        let record = SubmitRecord {
            queue,
            wait: items(submit.wait_semaphores, submit.wait_semaphore_count).to_vec(),
            stages: items(submit.wait_dst_stage_mask, submit.wait_semaphore_count).to_vec(),
            command_buffers: items(submit.command_buffers, submit.command_buffer_count).to_vec(),
            signal: items(submit.signal_semaphores, submit.signal_semaphore_count).to_vec(),
            fence,
        };
        self.wait_semaphores(&record.wait, "submit");
        self.signal_semaphores(&record.signal, "submit");
        if !fence.is_null() {
            // The fake GPU finishes the work immediately.
            self.fences.borrow_mut().insert(fence.as_raw(), true);
        }
        self.submits.borrow_mut().push(record);
        Ok(())
    }

    unsafe fn queue_present(
        &self,
        queue: vk::Queue,
        info: &vk::PresentInfoKHR,
    ) -> DriverResult<vk::SuccessCode> {
        self.call("queue_present")?;
        let record = PresentRecord {
            queue,
            wait: items(info.wait_semaphores, info.wait_semaphore_count).to_vec(),
            swapchains: items(info.swapchains, info.swapchain_count).to_vec(),
            image_indices: items(info.image_indices, info.swapchain_count).to_vec(),
        };
        self.wait_semaphores(&record.wait, "present");
        self.presents.borrow_mut().push(record);
        Ok(self.present_code.get().unwrap_or(vk::SuccessCode::SUCCESS))
    }
}
