mod framebuffer;
mod swapchain;
mod viewport;

pub use framebuffer::{Framebuffer, DEPTH_FORMAT};
pub use swapchain::Swapchain;
pub use viewport::Viewport;
