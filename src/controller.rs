use log::debug;
use nalgebra::Point2;

use crate::camera::CameraControl;

pub const MIN_POINT_SIZE: f32 = 1.;
pub const MAX_POINT_SIZE: f32 = 10.;
pub const POINT_SIZE_STEP: f32 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Escape,
    PointSizeUp,
    PointSizeDown,
    Reset,
    ZoomIn,
    ZoomOut,
    Other,
}

/// Window-system independent input. Cursor positions are in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    ButtonPressed {
        button: MouseButton,
        position: Point2<f64>,
    },
    ButtonReleased {
        button: MouseButton,
    },
    CursorMoved {
        position: Point2<f64>,
    },
    Scroll {
        delta_y: f32,
    },
    KeyPressed(Key),
    CloseRequested,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DragState {
    Idle,
    Dragging {
        button: MouseButton,
        last: Point2<f64>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Continue,
    Exit,
}

/// Turns input events into camera operations and owns the point size.
#[derive(Debug, Clone)]
pub struct ViewportController {
    drag: DragState,
    point_size: f32,
}

impl Default for ViewportController {
    fn default() -> Self {
        Self::new(2.)
    }
}

impl ViewportController {
    pub fn new(point_size: f32) -> Self {
        Self {
            drag: DragState::Idle,
            point_size: point_size.clamp(MIN_POINT_SIZE, MAX_POINT_SIZE),
        }
    }

    pub fn point_size(&self) -> f32 {
        self.point_size
    }

    pub fn drag_state(&self) -> DragState {
        self.drag
    }

    fn change_point_size(&mut self, step: f32) {
        self.point_size = (self.point_size + step).clamp(MIN_POINT_SIZE, MAX_POINT_SIZE);
        debug!("point size {}", self.point_size);
    }

    pub fn handle(&mut self, event: InputEvent, camera: &mut impl CameraControl) -> Control {
        match event {
            InputEvent::ButtonPressed { button, position } => {
                self.drag = DragState::Dragging {
                    button,
                    last: position,
                };
            }
            InputEvent::ButtonReleased { .. } => {
                self.drag = DragState::Idle;
            }
            InputEvent::CursorMoved { position } => {
                if let DragState::Dragging { button, last } = &mut self.drag {
                    let dx = (position.x - last.x) as f32;
                    let dy = (position.y - last.y) as f32;
                    match button {
                        MouseButton::Left => camera.rotate(dx, -dy),
                        MouseButton::Right => camera.pan(-dx, dy),
                        MouseButton::Middle => {}
                    }
                    *last = position;
                }
            }
            InputEvent::Scroll { delta_y } => camera.zoom(-delta_y),
            InputEvent::KeyPressed(key) => match key {
                Key::Escape => return Control::Exit,
                Key::PointSizeUp => self.change_point_size(POINT_SIZE_STEP),
                Key::PointSizeDown => self.change_point_size(-POINT_SIZE_STEP),
                Key::Reset => {
                    camera.reset();
                    self.drag = DragState::Idle;
                }
                Key::ZoomIn => camera.zoom(1.),
                Key::ZoomOut => camera.zoom(-1.),
                Key::Other => {}
            },
            InputEvent::CloseRequested => return Control::Exit,
        }
        Control::Continue
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::OrbitCamera;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Rotate(f32, f32),
        Pan(f32, f32),
        Zoom(f32),
        Reset,
    }

    #[derive(Default)]
    struct Recorder {
        calls: Vec<Call>,
    }

    impl CameraControl for Recorder {
        fn rotate(&mut self, d_azimuth: f32, d_elevation: f32) {
            self.calls.push(Call::Rotate(d_azimuth, d_elevation));
        }
        fn pan(&mut self, dx: f32, dy: f32) {
            self.calls.push(Call::Pan(dx, dy));
        }
        fn zoom(&mut self, delta: f32) {
            self.calls.push(Call::Zoom(delta));
        }
        fn reset(&mut self) {
            self.calls.push(Call::Reset);
        }
    }

    fn press(button: MouseButton, x: f64, y: f64) -> InputEvent {
        InputEvent::ButtonPressed {
            button,
            position: Point2::new(x, y),
        }
    }

    fn moved(x: f64, y: f64) -> InputEvent {
        InputEvent::CursorMoved {
            position: Point2::new(x, y),
        }
    }

    #[test]
    fn left_drag_rotates_once() {
        let mut controller = ViewportController::default();
        let mut camera = Recorder::default();

        controller.handle(press(MouseButton::Left, 100., 100.), &mut camera);
        controller.handle(moved(110., 90.), &mut camera);
        controller.handle(
            InputEvent::ButtonReleased {
                button: MouseButton::Left,
            },
            &mut camera,
        );

        assert_eq!(camera.calls, vec![Call::Rotate(10., 10.)]);
        assert_eq!(controller.drag_state(), DragState::Idle);
    }

    #[test]
    fn right_drag_pans_with_inverted_x() {
        let mut controller = ViewportController::default();
        let mut camera = Recorder::default();

        controller.handle(press(MouseButton::Right, 10., 10.), &mut camera);
        controller.handle(moved(14., 13.), &mut camera);
        controller.handle(moved(15., 13.), &mut camera);

        assert_eq!(camera.calls, vec![Call::Pan(-4., 3.), Call::Pan(-1., 0.)]);
    }

    #[test]
    fn middle_drag_only_tracks_cursor() {
        let mut controller = ViewportController::default();
        let mut camera = Recorder::default();

        controller.handle(press(MouseButton::Middle, 0., 0.), &mut camera);
        controller.handle(moved(5., 5.), &mut camera);
        assert!(camera.calls.is_empty());
        assert_eq!(
            controller.drag_state(),
            DragState::Dragging {
                button: MouseButton::Middle,
                last: Point2::new(5., 5.)
            }
        );
    }

    #[test]
    fn idle_moves_and_releases_are_ignored() {
        let mut controller = ViewportController::default();
        let mut camera = Recorder::default();

        controller.handle(moved(50., 50.), &mut camera);
        let control = controller.handle(
            InputEvent::ButtonReleased {
                button: MouseButton::Right,
            },
            &mut camera,
        );
        assert_eq!(control, Control::Continue);
        assert!(camera.calls.is_empty());
        assert_eq!(controller.drag_state(), DragState::Idle);
    }

    #[test]
    fn scroll_zooms_in_any_state() {
        let mut controller = ViewportController::default();
        let mut camera = Recorder::default();

        controller.handle(InputEvent::Scroll { delta_y: 1. }, &mut camera);
        controller.handle(press(MouseButton::Left, 0., 0.), &mut camera);
        controller.handle(InputEvent::Scroll { delta_y: -2. }, &mut camera);

        assert_eq!(camera.calls, vec![Call::Zoom(-1.), Call::Zoom(2.)]);
    }

    #[test]
    fn zoom_keys() {
        let mut controller = ViewportController::default();
        let mut camera = Recorder::default();
        controller.handle(InputEvent::KeyPressed(Key::ZoomIn), &mut camera);
        controller.handle(InputEvent::KeyPressed(Key::ZoomOut), &mut camera);
        controller.handle(InputEvent::KeyPressed(Key::Other), &mut camera);
        assert_eq!(camera.calls, vec![Call::Zoom(1.), Call::Zoom(-1.)]);
    }

    #[test]
    fn point_size_is_clamped() {
        let mut controller = ViewportController::default();
        let mut camera = Recorder::default();

        controller.handle(InputEvent::KeyPressed(Key::PointSizeUp), &mut camera);
        assert_eq!(controller.point_size(), 2.5);

        for _ in 0..50 {
            controller.handle(InputEvent::KeyPressed(Key::PointSizeUp), &mut camera);
        }
        assert_eq!(controller.point_size(), MAX_POINT_SIZE);

        for _ in 0..50 {
            controller.handle(InputEvent::KeyPressed(Key::PointSizeDown), &mut camera);
        }
        assert_eq!(controller.point_size(), MIN_POINT_SIZE);
        assert!(camera.calls.is_empty());

        assert_eq!(ViewportController::new(0.).point_size(), MIN_POINT_SIZE);
    }

    #[test]
    fn reset_ends_drag() {
        let mut controller = ViewportController::default();
        let mut camera = Recorder::default();

        controller.handle(press(MouseButton::Left, 0., 0.), &mut camera);
        controller.handle(InputEvent::KeyPressed(Key::Reset), &mut camera);
        controller.handle(moved(10., 10.), &mut camera);

        assert_eq!(camera.calls, vec![Call::Reset]);
        assert_eq!(controller.drag_state(), DragState::Idle);
    }

    #[test]
    fn escape_and_close_exit() {
        let mut controller = ViewportController::default();
        let mut camera = Recorder::default();
        assert_eq!(
            controller.handle(InputEvent::KeyPressed(Key::Escape), &mut camera),
            Control::Exit
        );
        assert_eq!(
            controller.handle(InputEvent::CloseRequested, &mut camera),
            Control::Exit
        );
    }

    #[test]
    fn drives_orbit_camera() {
        let mut controller = ViewportController::default();
        let mut camera = OrbitCamera::default();

        controller.handle(press(MouseButton::Left, 0., 0.), &mut camera);
        controller.handle(moved(20., 0.), &mut camera);
        assert_eq!(camera.azimuth(), 55.);
        assert_eq!(camera.elevation(), 30.);

        controller.handle(InputEvent::KeyPressed(Key::Reset), &mut camera);
        assert_eq!(camera, OrbitCamera::default());
    }
}
