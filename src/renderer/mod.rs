mod device;
mod frame;
mod pc_renderer;
mod window;
mod wrapper;

pub use frame::SurfaceFrame;
pub use pc_renderer::PointCloudRenderer;
pub use window::WindowSurface;
pub use wrapper::{Swapchain, Viewport};
