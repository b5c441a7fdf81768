use std::sync::Arc;

use log::{debug, info};
use nalgebra::Point2;
use vulkano::{
    instance::{Instance, InstanceCreateInfo},
    render_pass::Subpass,
    swapchain::Surface,
};
use vulkano_win::VkSurfaceBuild;
use winit::{
    dpi::PhysicalSize,
    event::{
        ElementState, Event, KeyboardInput, MouseButton as WinitButton, MouseScrollDelta,
        VirtualKeyCode, WindowEvent,
    },
    event_loop::{ControlFlow, EventLoop},
    platform::run_return::EventLoopExtRunReturn,
    window::{Window, WindowBuilder},
};

use super::{
    device::{create_device, device_extensions, get_render_pass, select_physical_device},
    PointCloudRenderer, SurfaceFrame,
};
use crate::{
    controller::{InputEvent, Key, MouseButton},
    error::{Error, Result},
    render_loop::{DisplaySurface, FrameParams},
    scene::Scene,
};

/// Pixels of touchpad scrolling that count as one wheel notch.
const PIXELS_PER_LINE: f32 = 40.;

pub fn map_key(key: VirtualKeyCode) -> Key {
    match key {
        VirtualKeyCode::Escape => Key::Escape,
        VirtualKeyCode::Equals | VirtualKeyCode::Plus | VirtualKeyCode::NumpadAdd => {
            Key::PointSizeUp
        }
        VirtualKeyCode::Minus | VirtualKeyCode::NumpadSubtract => Key::PointSizeDown,
        VirtualKeyCode::R => Key::Reset,
        VirtualKeyCode::W => Key::ZoomIn,
        VirtualKeyCode::S => Key::ZoomOut,
        _ => Key::Other,
    }
}

pub fn map_button(button: WinitButton) -> Option<MouseButton> {
    match button {
        WinitButton::Left => Some(MouseButton::Left),
        WinitButton::Right => Some(MouseButton::Right),
        WinitButton::Middle => Some(MouseButton::Middle),
        WinitButton::Other(_) => None,
    }
}

pub fn scroll_lines(delta: MouseScrollDelta) -> f32 {
    match delta {
        MouseScrollDelta::LineDelta(_, y) => y,
        MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / PIXELS_PER_LINE,
    }
}

/// Translates a winit window event. `cursor` tracks the last cursor
/// position so that button presses can report where they happened.
pub fn translate_event(event: &WindowEvent, cursor: &mut Point2<f64>) -> Option<InputEvent> {
    match event {
        WindowEvent::CloseRequested => Some(InputEvent::CloseRequested),
        WindowEvent::CursorMoved { position, .. } => {
            *cursor = Point2::new(position.x, position.y);
            Some(InputEvent::CursorMoved { position: *cursor })
        }
        WindowEvent::MouseInput { state, button, .. } => {
            let button = map_button(*button)?;
            Some(match state {
                ElementState::Pressed => InputEvent::ButtonPressed {
                    button,
                    position: *cursor,
                },
                ElementState::Released => InputEvent::ButtonReleased { button },
            })
        }
        WindowEvent::MouseWheel { delta, .. } => Some(InputEvent::Scroll {
            delta_y: scroll_lines(*delta),
        }),
        WindowEvent::KeyboardInput {
            input:
                KeyboardInput {
                    virtual_keycode: Some(key),
                    state: ElementState::Pressed,
                    ..
                },
            ..
        } => Some(InputEvent::KeyPressed(map_key(*key))),
        _ => None,
    }
}

/// Native window with a Vulkan point renderer.
pub struct WindowSurface {
    event_loop: EventLoop<()>,
    surface: Arc<Surface<Window>>,
    queue: Arc<vulkano::device::Queue>,
    frame: SurfaceFrame,
    renderer: PointCloudRenderer,
    cursor: Point2<f64>,
}

impl WindowSurface {
    pub fn new(title: &str, size: [u32; 2]) -> Result<Self> {
        let instance = Instance::new(InstanceCreateInfo {
            enabled_extensions: vulkano_win::required_extensions(),
            ..Default::default()
        })
        .map_err(Error::resource_init)?;

        let event_loop = EventLoop::new();
        let surface = WindowBuilder::new()
            .with_title(title)
            .with_inner_size(PhysicalSize::new(size[0], size[1]))
            .build_vk_surface(&event_loop, instance.clone())
            .map_err(Error::resource_init)?;

        let (physical_device, queue_family) =
            select_physical_device(&instance, &device_extensions(), &surface)?;
        info!("using device {}", physical_device.properties().device_name);

        let (device, queue) = create_device(physical_device, queue_family)?;

        let formats = physical_device
            .surface_formats(&surface, Default::default())
            .map_err(Error::resource_init)?;
        let swapchain_format = formats
            .first()
            .map(|(format, _)| *format)
            .ok_or_else(|| Error::resource_init("surface reports no formats"))?;
        debug!("swapchain format {:?}", swapchain_format);

        let render_pass = get_render_pass(device.clone(), swapchain_format)?;
        let frame = SurfaceFrame::new(
            surface.clone(),
            device.clone(),
            physical_device,
            render_pass.clone(),
            swapchain_format,
        )?;

        let subpass = Subpass::from(render_pass, 0)
            .ok_or_else(|| Error::resource_init("render pass has no subpass"))?;
        let renderer = PointCloudRenderer::new(device, subpass)?;

        Ok(WindowSurface {
            event_loop,
            surface,
            queue,
            frame,
            renderer,
            cursor: Point2::origin(),
        })
    }
}

impl DisplaySurface for WindowSurface {
    fn poll_events(&mut self, events: &mut Vec<InputEvent>) {
        let cursor = &mut self.cursor;
        let frame = &mut self.frame;

        self.event_loop
            .run_return(|event, _, control_flow| match event {
                Event::WindowEvent { event, .. } => {
                    if matches!(
                        event,
                        WindowEvent::Resized(_) | WindowEvent::ScaleFactorChanged { .. }
                    ) {
                        frame.force_recreate();
                    }
                    events.extend(translate_event(&event, cursor));
                    *control_flow = ControlFlow::Poll;
                }
                // everything queued has been delivered
                Event::MainEventsCleared => *control_flow = ControlFlow::Exit,
                _ => *control_flow = ControlFlow::Poll,
            });
    }

    fn size(&self) -> [u32; 2] {
        self.surface.window().inner_size().into()
    }

    fn submit(&mut self, scene: &Scene, params: &FrameParams) -> Result<()> {
        self.frame
            .record(&self.queue, &mut self.renderer, scene, params)
    }

    fn present(&mut self) -> Result<()> {
        self.frame.present(&self.queue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use winit::dpi::PhysicalPosition;

    #[test]
    fn keys_map_to_controls() {
        assert_eq!(map_key(VirtualKeyCode::Escape), Key::Escape);
        assert_eq!(map_key(VirtualKeyCode::Plus), Key::PointSizeUp);
        assert_eq!(map_key(VirtualKeyCode::Equals), Key::PointSizeUp);
        assert_eq!(map_key(VirtualKeyCode::NumpadSubtract), Key::PointSizeDown);
        assert_eq!(map_key(VirtualKeyCode::R), Key::Reset);
        assert_eq!(map_key(VirtualKeyCode::W), Key::ZoomIn);
        assert_eq!(map_key(VirtualKeyCode::S), Key::ZoomOut);
        assert_eq!(map_key(VirtualKeyCode::Q), Key::Other);
    }

    #[test]
    fn buttons_and_scroll() {
        assert_eq!(map_button(WinitButton::Right), Some(MouseButton::Right));
        assert_eq!(map_button(WinitButton::Other(7)), None);
        assert_eq!(scroll_lines(MouseScrollDelta::LineDelta(0., -2.)), -2.);
        assert_eq!(
            scroll_lines(MouseScrollDelta::PixelDelta(PhysicalPosition::new(0., 80.))),
            2.
        );
    }

    #[test]
    fn close_request_is_forwarded() {
        let mut cursor = Point2::origin();
        assert_eq!(
            translate_event(&WindowEvent::CloseRequested, &mut cursor),
            Some(InputEvent::CloseRequested)
        );
        assert_eq!(translate_event(&WindowEvent::Focused(true), &mut cursor), None);
    }
}
