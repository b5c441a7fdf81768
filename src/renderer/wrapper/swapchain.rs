use std::sync::Arc;

use log::debug;
use vulkano::{
    device::{physical::PhysicalDevice, Device, DeviceOwned},
    format::Format,
    image::{ImageUsage, SwapchainImage},
    render_pass::RenderPass,
    swapchain::{
        self, AcquireError, Surface, Swapchain as VulkanSwapchain, SwapchainAcquireFuture,
        SwapchainCreateInfo, SwapchainCreationError,
    },
};
use winit::window::Window;

use super::Framebuffer;
use crate::error::{Error, Result};

pub struct Swapchain {
    sc: Arc<VulkanSwapchain<Window>>,
    buffers: Vec<Framebuffer<SwapchainImage<Window>>>,
    render_pass: Arc<RenderPass>,
}

impl Swapchain {
    pub fn new(
        surface: Arc<Surface<Window>>,
        device: Arc<Device>,
        physical_device: PhysicalDevice,
        format: Format,
        render_pass: Arc<RenderPass>,
    ) -> Result<Self> {
        let surface_capabilities = physical_device
            .surface_capabilities(&surface, Default::default())
            .map_err(Error::resource_init)?;
        let (sc, images) = VulkanSwapchain::new(
            device,
            surface.clone(),
            SwapchainCreateInfo {
                min_image_count: surface_capabilities.min_image_count,

                image_format: Some(format),
                image_extent: surface.window().inner_size().into(),

                image_usage: ImageUsage::color_attachment(),
                ..Default::default()
            },
        )
        .map_err(Error::resource_init)?;
        let buffers = Swapchain::create_framebuffers(&images, &render_pass)?;
        Ok(Swapchain {
            sc,
            buffers,
            render_pass,
        })
    }

    /// Rebuilds the swapchain for a new window size.
    ///
    /// Returns `false` if the surface cannot take that extent right now
    /// (e.g. while a resize is still in flight); the caller should retry.
    pub fn resize(&mut self, size: [u32; 2]) -> Result<bool> {
        let (new_swapchain, new_images) = match self.sc.recreate(SwapchainCreateInfo {
            image_extent: size,
            ..self.sc.create_info()
        }) {
            Ok(r) => r,
            Err(SwapchainCreationError::ImageExtentNotSupported { .. }) => return Ok(false),
            Err(e) => return Err(Error::render(e)),
        };
        debug!("swapchain recreated with extent {:?}", size);
        self.sc = new_swapchain;
        self.buffers = Swapchain::create_framebuffers(&new_images, &self.render_pass)?;
        Ok(true)
    }

    fn create_framebuffers(
        images: &[Arc<SwapchainImage<Window>>],
        render_pass: &Arc<RenderPass>,
    ) -> Result<Vec<Framebuffer<SwapchainImage<Window>>>> {
        images
            .iter()
            .map(|image| Framebuffer::new(image.clone(), render_pass.clone()))
            .collect()
    }

    pub fn acquire_next_image(
        &self,
    ) -> std::result::Result<
        (
            &Framebuffer<SwapchainImage<Window>>,
            usize,
            bool,
            SwapchainAcquireFuture<Window>,
        ),
        AcquireError,
    > {
        let (i, suboptimal, future) = swapchain::acquire_next_image(self.sc.clone(), None)?;
        Ok((&self.buffers[i], i, suboptimal, future))
    }

    pub fn vk_swapchain(&self) -> &Arc<VulkanSwapchain<Window>> {
        &self.sc
    }
}

unsafe impl DeviceOwned for Swapchain {
    fn device(&self) -> &Arc<Device> {
        self.sc.device()
    }
}
