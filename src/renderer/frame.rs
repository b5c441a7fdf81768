use std::sync::Arc;

use log::warn;
use vulkano::{
    command_buffer::{
        AutoCommandBufferBuilder, CommandBufferUsage, PrimaryAutoCommandBuffer, RenderPassBeginInfo,
        SubpassContents,
    },
    device::{physical::PhysicalDevice, Device, DeviceOwned, Queue},
    format::Format,
    render_pass::RenderPass,
    swapchain::{AcquireError, Surface, SwapchainAcquireFuture},
    sync::{self, FlushError, GpuFuture},
};
use winit::window::Window;

use super::{PointCloudRenderer, Swapchain, Viewport};
use crate::{
    error::{Error, Result},
    render_loop::FrameParams,
    scene::Scene,
};

/// A recorded frame waiting to be presented.
struct PendingFrame {
    image_i: usize,
    acquire_future: SwapchainAcquireFuture<Window>,
    command_buffer: PrimaryAutoCommandBuffer,
}

/// Swapchain backed frame cycle: `record` acquires an image and records the
/// draw, `present` submits it and hands the image back to the window.
pub struct SurfaceFrame {
    swapchain: Swapchain,
    surface: Arc<Surface<Window>>,
    viewport: Viewport,
    pending: Option<PendingFrame>,
    recreate_swapchain: bool,
}

impl SurfaceFrame {
    pub fn new(
        surface: Arc<Surface<Window>>,
        device: Arc<Device>,
        physical_device: PhysicalDevice,
        render_pass: Arc<RenderPass>,
        swapchain_format: Format,
    ) -> Result<Self> {
        let swapchain = Swapchain::new(
            surface.clone(),
            device,
            physical_device,
            swapchain_format,
            render_pass,
        )?;
        let viewport = Viewport::new(surface.window().inner_size().into());

        Ok(SurfaceFrame {
            swapchain,
            surface,
            viewport,
            pending: None,
            recreate_swapchain: false,
        })
    }

    pub fn force_recreate(&mut self) {
        self.recreate_swapchain = true;
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    fn recreate_if_necessary(&mut self) -> Result<()> {
        if self.recreate_swapchain {
            let size: [u32; 2] = self.surface.window().inner_size().into();
            self.viewport.resize(size);
            if self.viewport.is_empty() {
                return Ok(());
            }
            if self.swapchain.resize(size)? {
                self.recreate_swapchain = false;
            }
        }
        Ok(())
    }

    pub fn record(
        &mut self,
        queue: &Arc<Queue>,
        renderer: &mut PointCloudRenderer,
        scene: &Scene,
        params: &FrameParams,
    ) -> Result<()> {
        self.pending = None;
        self.recreate_if_necessary()?;
        // minimized, or the swapchain could not follow the resize yet
        if self.viewport.is_empty() || self.recreate_swapchain {
            return Ok(());
        }

        let (fb, image_i, suboptimal, acquire_future) = match self.swapchain.acquire_next_image()
        {
            Ok(r) => r,
            Err(AcquireError::OutOfDate) => {
                self.recreate_swapchain = true;
                return Ok(());
            }
            Err(e) => return Err(Error::render(format!("failed to acquire next image: {}", e))),
        };
        let framebuffer = fb.vulkan_fb().clone();
        if suboptimal {
            self.recreate_swapchain = true;
        }

        let mut builder = AutoCommandBufferBuilder::primary(
            self.swapchain.device().clone(),
            queue.family(),
            CommandBufferUsage::OneTimeSubmit,
        )
        .map_err(Error::render)?;

        builder
            .begin_render_pass(
                RenderPassBeginInfo {
                    clear_values: vec![Some(params.background.into()), Some(1f32.into())],
                    ..RenderPassBeginInfo::framebuffer(framebuffer)
                },
                SubpassContents::Inline,
            )
            .map_err(Error::render)?;
        renderer.draw(&mut builder, scene, params, &self.viewport)?;
        builder.end_render_pass().map_err(Error::render)?;
        let command_buffer = builder.build().map_err(Error::render)?;

        self.pending = Some(PendingFrame {
            image_i,
            acquire_future,
            command_buffer,
        });
        Ok(())
    }

    pub fn present(&mut self, queue: &Arc<Queue>) -> Result<()> {
        let frame = match self.pending.take() {
            Some(frame) => frame,
            None => return Ok(()),
        };

        let execution = sync::now(self.swapchain.device().clone())
            .join(frame.acquire_future)
            .then_execute(queue.clone(), frame.command_buffer)
            .map_err(Error::render)?
            .then_swapchain_present(
                queue.clone(),
                self.swapchain.vk_swapchain().clone(),
                frame.image_i,
            )
            .then_signal_fence_and_flush();

        match execution {
            Ok(future) => future.wait(None).map_err(Error::render),
            Err(FlushError::OutOfDate) => {
                warn!("swapchain out of date while presenting");
                self.recreate_swapchain = true;
                Ok(())
            }
            Err(e) => Err(Error::render(format!("failed to flush frame: {}", e))),
        }
    }
}
