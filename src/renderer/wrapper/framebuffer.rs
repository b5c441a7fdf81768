use std::{marker::PhantomData, sync::Arc};

use vulkano::{
    device::DeviceOwned,
    format::Format,
    image::{view::ImageView, AttachmentImage, ImageAccess},
    render_pass::{Framebuffer as VulkanFramebuffer, FramebufferCreateInfo, RenderPass},
};

use crate::error::{Error, Result};

pub const DEPTH_FORMAT: Format = Format::D16_UNORM;

/// A color image together with its own transient depth attachment.
pub struct Framebuffer<I>
where
    I: ImageAccess + 'static,
{
    buffer: Arc<VulkanFramebuffer>,
    image: PhantomData<I>,
}

impl<I> Framebuffer<I>
where
    I: ImageAccess + std::fmt::Debug + 'static,
{
    pub fn new(image: Arc<I>, render_pass: Arc<RenderPass>) -> Result<Self> {
        let image_view = ImageView::new_default(image.clone()).map_err(Error::render)?;

        let depth_image = AttachmentImage::transient(
            render_pass.device().clone(),
            image.dimensions().width_height(),
            DEPTH_FORMAT,
        )
        .map_err(Error::render)?;
        let depth_view = ImageView::new_default(depth_image).map_err(Error::render)?;

        let buffer = VulkanFramebuffer::new(
            render_pass,
            FramebufferCreateInfo {
                attachments: vec![image_view, depth_view],
                ..Default::default()
            },
        )
        .map_err(Error::render)?;
        Ok(Framebuffer {
            buffer,
            image: PhantomData,
        })
    }

    pub fn vulkan_fb(&self) -> &Arc<VulkanFramebuffer> {
        &self.buffer
    }
}

unsafe impl<I> DeviceOwned for Framebuffer<I>
where
    I: ImageAccess + 'static,
{
    fn device(&self) -> &Arc<vulkano::device::Device> {
        self.buffer.device()
    }
}
