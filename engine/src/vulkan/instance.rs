use log::*;
use std::collections::HashSet;
use std::ffi::{CStr, CString};
use std::os::raw::c_void;
use std::rc::Rc;
use vulkanalia::prelude::v1_0::*;

use super::constants;
use super::driver::Driver;
use super::error::RenderError;
use super::handle::Owned;
use crate::config::RendererConfig;

/// Whether `VK_EXT_debug_utils` can be used, probed once at creation.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DebugSupport {
    Available,
    Unavailable,
}

/// The Vulkan instance plus its optional diagnostic subscription.
#[derive(Debug)]
pub struct VulkanInstance<D: Driver> {
    messenger: Option<Owned<D, vk::DebugUtilsMessengerEXT>>,
    instance: Owned<D, vk::Instance>,
    layers: Vec<vk::ExtensionName>,
    debug_support: DebugSupport,
    portability: bool,
}

impl<D: Driver> VulkanInstance<D> {
    pub unsafe fn create(
        driver: &Rc<D>,
        window: &D::Window,
        config: &RendererConfig,
    ) -> Result<Self, RenderError> {
        // Application Info
        let application_name = CString::new(config.application_name.as_str())
            .map_err(|_| RenderError::init("Application name contains a NUL byte."))?;
        let application_info = vk::ApplicationInfo::builder()
            .application_name(application_name.as_bytes_with_nul())
            .application_version(vk::make_version(1, 0, 0))
            .engine_name(b"Volcano\0")
            .engine_version(vk::make_version(1, 0, 0))
            .api_version(vk::make_version(1, 0, 0));

        // Layers
        let available_layers = driver.instance_layers().map_err(|code| RenderError::Init {
            reason: "Failed to enumerate instance layers.".into(),
            code: Some(code),
        })?;

        if config.validation && !available_layers.contains(&constants::VALIDATION_LAYER) {
            return Err(RenderError::init(
                "Validation layer requested but not supported.",
            ));
        }

        let layers = if config.validation {
            vec![constants::VALIDATION_LAYER]
        } else {
            Vec::new()
        };

        // Extensions
        let available_extensions = driver.instance_extensions().map_err(|code| RenderError::Init {
            reason: "Failed to enumerate instance extensions.".into(),
            code: Some(code),
        })?;

        let debug_support = probe_debug_support(&available_extensions);
        let debug_enabled = config.validation && debug_support == DebugSupport::Available;
        if config.validation && !debug_enabled {
            warn!("Validation enabled but VK_EXT_debug_utils is unavailable; messages will not be reported.");
        }

        let mut extensions = driver.window_extensions(window);
        if let Some(missing) = extensions.iter().find(|e| !available_extensions.contains(*e)) {
            return Err(RenderError::init(format!(
                "Required window extension `{}` is not supported.",
                missing
            )));
        }

        // Required by Vulkan SDK on macOS since 1.3.216.
        let portability = portability_required(&**driver)?;
        let flags = if portability {
            info!("Enabling extensions for macOS portability.");
            extensions.push(vk::KHR_GET_PHYSICAL_DEVICE_PROPERTIES2_EXTENSION.name);
            extensions.push(vk::KHR_PORTABILITY_ENUMERATION_EXTENSION.name);
            vk::InstanceCreateFlags::ENUMERATE_PORTABILITY_KHR
        } else {
            vk::InstanceCreateFlags::empty()
        };

        if debug_enabled {
            extensions.push(vk::EXT_DEBUG_UTILS_EXTENSION.name);
        }

        let layer_names = layers.iter().map(|l| l.as_ptr()).collect::<Vec<_>>();
        let extension_names = extensions.iter().map(|e| e.as_ptr()).collect::<Vec<_>>();

        // Create
        let mut info = vk::InstanceCreateInfo::builder()
            .application_info(&application_info)
            .enabled_layer_names(&layer_names)
            .enabled_extension_names(&extension_names)
            .flags(flags);

        // Chained so instance creation and destruction are reported too.
        let mut debug_info = messenger_info();
        if debug_enabled {
            info = info.push_next(&mut debug_info);
        }

        let instance = driver.create_instance(&info).map_err(|code| RenderError::Init {
            reason: "Instance creation was rejected.".into(),
            code: Some(code),
        })?;
        let instance = Owned::new(driver, instance);
        debug!("Created Vulkan instance for `{}`.", config.application_name);

        // Messenger
        let messenger = if debug_enabled {
            let messenger = driver
                .create_debug_messenger(&debug_info)
                .map_err(|code| RenderError::Init {
                    reason: "Failed to create the debug messenger.".into(),
                    code: Some(code),
                })?;
            Some(Owned::new(driver, messenger))
        } else {
            None
        };

        Ok(Self {
            messenger,
            instance,
            layers,
            debug_support,
            portability,
        })
    }

    /// Layers enabled on the instance; mirrored onto the device.
    pub fn enabled_layers(&self) -> &[vk::ExtensionName] {
        &self.layers
    }

    pub fn debug_support(&self) -> DebugSupport {
        self.debug_support
    }

    pub fn portability(&self) -> bool {
        self.portability
    }
}

fn probe_debug_support(extensions: &HashSet<vk::ExtensionName>) -> DebugSupport {
    if extensions.contains(&vk::EXT_DEBUG_UTILS_EXTENSION.name) {
        DebugSupport::Available
    } else {
        DebugSupport::Unavailable
    }
}

fn portability_required<D: Driver>(driver: &D) -> Result<bool, RenderError> {
    if !cfg!(target_os = "macos") {
        return Ok(false);
    }
    let version = driver.loader_version().map_err(|code| RenderError::Init {
        reason: "Failed to query the loader version.".into(),
        code: Some(code),
    })?;
    Ok(version >= constants::PORTABILITY_MACOS_VERSION)
}

fn messenger_info() -> vk::DebugUtilsMessengerCreateInfoEXTBuilder<'static> {
    vk::DebugUtilsMessengerCreateInfoEXT::builder()
        .message_severity(
            vk::DebugUtilsMessageSeverityFlagsEXT::WARNING
                | vk::DebugUtilsMessageSeverityFlagsEXT::ERROR,
        )
        .message_type(
            vk::DebugUtilsMessageTypeFlagsEXT::GENERAL
                | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION
                | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE,
        )
        .user_callback(Some(debug_callback))
}

extern "system" fn debug_callback(
    severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    type_: vk::DebugUtilsMessageTypeFlagsEXT,
    data: *const vk::DebugUtilsMessengerCallbackDataEXT,
    _: *mut c_void,
) -> vk::Bool32 {
    let data = unsafe { *data };
    let message = unsafe { CStr::from_ptr(data.message) }.to_string_lossy();

    if severity >= vk::DebugUtilsMessageSeverityFlagsEXT::ERROR {
        error!("({:?}) {}", type_, message);
    } else if severity >= vk::DebugUtilsMessageSeverityFlagsEXT::WARNING {
        warn!("({:?}) {}", type_, message);
    } else if severity >= vk::DebugUtilsMessageSeverityFlagsEXT::INFO {
        debug!("({:?}) {}", type_, message);
    } else {
        trace!("({:?}) {}", type_, message);
    }

    vk::FALSE
}
