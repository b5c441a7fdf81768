use nalgebra::Matrix4;
use vulkano::pipeline::graphics::viewport::Viewport as VulkanViewport;

/// Window viewport with the y axis pointing up, matching the GL style
/// projection matrices built by nalgebra.
#[derive(Debug, Clone)]
pub struct Viewport {
    size: [u32; 2],
}

impl Viewport {
    pub fn new(size: [u32; 2]) -> Self {
        Viewport { size }
    }

    pub fn resize(&mut self, size: [u32; 2]) {
        self.size = size;
    }

    pub fn size(&self) -> [u32; 2] {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size[0] == 0 || self.size[1] == 0
    }

    // negative height flips y
    // see: https://www.saschawillems.de/blog/2019/03/29/flipping-the-vulkan-viewport/
    pub fn to_vulkan(&self) -> VulkanViewport {
        VulkanViewport {
            origin: [0.0, self.size[1] as f32],
            dimensions: [self.size[0] as f32, -(self.size[1] as f32)],
            depth_range: 0.0..1.0,
        }
    }

    /// Maps GL clip space depth (-1..1) to the 0..1 range Vulkan expects.
    pub fn depth_correction() -> Matrix4<f32> {
        Matrix4::new(
            1., 0., 0., 0., //
            0., 1., 0., 0., //
            0., 0., 0.5, 0.5, //
            0., 0., 0., 1.,
        )
    }
}
