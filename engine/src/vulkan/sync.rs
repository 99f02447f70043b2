use std::rc::Rc;

use vulkanalia::vk::{self, HasBuilder};

use super::driver::Driver;
use super::error::RenderError;
use super::handle::Owned;

/// Where the frame loop is within `render`. Only one frame is ever in
/// flight, so this also describes the single outstanding submission.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FrameState {
    Idle,
    /// Blocked on the in-flight fence of the previous frame.
    Waiting,
    Acquiring,
    Recording,
    Submitted,
    Presenting,
}

/// The semaphores and fence of the single frame in flight.
#[derive(Debug)]
pub struct FrameSync<D: Driver> {
    in_flight: Owned<D, vk::Fence>,
    render_finished: Owned<D, vk::Semaphore>,
    image_available: Owned<D, vk::Semaphore>,
}

impl<D: Driver> FrameSync<D> {
    pub unsafe fn create(driver: &Rc<D>) -> Result<Self, RenderError> {
        let image_available = driver
            .create_semaphore()
            .map_err(RenderError::SyncObjectCreation)?;
        let image_available = Owned::new(driver, image_available);

        let render_finished = driver
            .create_semaphore()
            .map_err(RenderError::SyncObjectCreation)?;
        let render_finished = Owned::new(driver, render_finished);

        // Signalled so the first frame does not wait forever.
        let fence_info = vk::FenceCreateInfo::builder().flags(vk::FenceCreateFlags::SIGNALED);
        let in_flight = driver
            .create_fence(&fence_info)
            .map_err(RenderError::SyncObjectCreation)?;
        let in_flight = Owned::new(driver, in_flight);

        Ok(Self {
            in_flight,
            render_finished,
            image_available,
        })
    }

    pub fn image_available(&self) -> vk::Semaphore {
        self.image_available.handle()
    }

    pub fn render_finished(&self) -> vk::Semaphore {
        self.render_finished.handle()
    }

    pub fn in_flight(&self) -> vk::Fence {
        self.in_flight.handle()
    }
}
