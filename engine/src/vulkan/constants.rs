use vulkanalia::{vk, Version};

pub const PORTABILITY_MACOS_VERSION: Version = Version::new(1, 3, 216);
pub const VALIDATION_LAYER: vk::ExtensionName =
    vk::ExtensionName::from_bytes(b"VK_LAYER_KHRONOS_validation");

/// Extensions an adapter must advertise to be considered at all.
pub const DEVICE_EXTENSIONS: &[vk::ExtensionName] = &[vk::KHR_SWAPCHAIN_EXTENSION.name];

pub const SHADER_ENTRY_POINT: &[u8] = b"main\0";
pub const SPIRV_MAGIC: u32 = 0x0723_0203;

pub const CLEAR_COLOR: [f32; 4] = [0.0, 0.0, 0.0, 1.0];
pub const TRIANGLE_VERTEX_COUNT: u32 = 3;

/// Passed to fence waits and image acquisition; the calls block indefinitely.
pub const NO_TIMEOUT: u64 = u64::MAX;
