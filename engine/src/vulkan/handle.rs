//! Scoped ownership of driver objects.
//!
//! Each owned handle releases itself on drop. Structs that own several of
//! them declare their fields in reverse creation order, so dropping a struct
//! tears its objects down in the opposite order they were built in.

use std::fmt;
use std::rc::Rc;

use log::*;
use vulkanalia::vk;

use super::driver::Driver;

/// A handle type the renderer creates and must destroy itself.
pub trait Release: Copy + fmt::Debug {
    /// # Safety
    ///
    /// The handle must be valid and no longer in use by the device.
    unsafe fn release<D: Driver>(self, driver: &D);
}

macro_rules! release {
    ($($handle:ty => $destroy:ident),* $(,)?) => {
        $(
            impl Release for $handle {
                unsafe fn release<D: Driver>(self, driver: &D) {
                    driver.$destroy(self);
                }
            }
        )*
    };
}

release! {
    vk::Instance => destroy_instance,
    vk::DebugUtilsMessengerEXT => destroy_debug_messenger,
    vk::SurfaceKHR => destroy_surface,
    vk::Device => destroy_device,
    vk::SwapchainKHR => destroy_swapchain,
    vk::ImageView => destroy_image_view,
    vk::RenderPass => destroy_render_pass,
    vk::ShaderModule => destroy_shader_module,
    vk::PipelineLayout => destroy_pipeline_layout,
    vk::Pipeline => destroy_pipeline,
    vk::Framebuffer => destroy_framebuffer,
    vk::CommandPool => destroy_command_pool,
    vk::Semaphore => destroy_semaphore,
    vk::Fence => destroy_fence,
}

/// A single driver object, destroyed when this goes out of scope.
pub struct Owned<D: Driver, H: Release> {
    driver: Rc<D>,
    handle: H,
}

impl<D: Driver, H: Release> Owned<D, H> {
    pub fn new(driver: &Rc<D>, handle: H) -> Self {
        trace!("Created {:?}.", handle);
        Self {
            driver: Rc::clone(driver),
            handle,
        }
    }

    pub fn handle(&self) -> H {
        self.handle
    }
}

impl<D: Driver, H: Release> Drop for Owned<D, H> {
    fn drop(&mut self) {
        trace!("Destroying {:?}.", self.handle);
        unsafe { self.handle.release(&*self.driver) };
    }
}

impl<D: Driver, H: Release> fmt::Debug for Owned<D, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Owned").field(&self.handle).finish()
    }
}

/// An ordered collection of owned objects, released last to first.
pub struct OwnedSet<D: Driver, H: Release>(Vec<Owned<D, H>>);

impl<D: Driver, H: Release> OwnedSet<D, H> {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn push(&mut self, owned: Owned<D, H>) {
        self.0.push(owned);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, index: usize) -> Option<H> {
        self.0.get(index).map(Owned::handle)
    }

    pub fn handles(&self) -> impl Iterator<Item = H> + '_ {
        self.0.iter().map(Owned::handle)
    }
}

impl<D: Driver, H: Release> Drop for OwnedSet<D, H> {
    fn drop(&mut self) {
        while let Some(owned) = self.0.pop() {
            drop(owned);
        }
    }
}

impl<D: Driver, H: Release> fmt::Debug for OwnedSet<D, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.handles()).finish()
    }
}
