use log::{debug, info};
use nalgebra::Matrix4;

use crate::{
    axes::DEFAULT_AXES_SIZE,
    camera::{CameraSettings, OrbitCamera, PerspectiveProjection, Projection},
    controller::{Control, InputEvent, ViewportController, MAX_POINT_SIZE, MIN_POINT_SIZE},
    error::{Error, Result},
    scene::Scene,
};

/// Everything a surface needs to draw one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameParams {
    pub projection: Matrix4<f32>,
    pub view: Matrix4<f32>,
    pub point_size: f32,
    pub background: [f32; 4],
    /// length of the reference axes, `None` hides them
    pub axes: Option<f32>,
}

impl FrameParams {
    pub fn view_projection(&self) -> Matrix4<f32> {
        self.projection * self.view
    }
}

/// Something the render loop can draw into and read input from.
pub trait DisplaySurface {
    /// Appends all pending input events without blocking.
    fn poll_events(&mut self, events: &mut Vec<InputEvent>);

    /// Current drawable size in pixels.
    fn size(&self) -> [u32; 2];

    fn submit(&mut self, scene: &Scene, params: &FrameParams) -> Result<()>;

    fn present(&mut self) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViewerConfig {
    pub width: u32,
    pub height: u32,
    pub point_size: f32,
    pub background: [f32; 4],
    /// reference axes at the scene origin, `None` disables them
    pub axes_size: Option<f32>,
    pub camera: CameraSettings,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
            point_size: 2.,
            background: [0.1, 0.1, 0.1, 1.],
            axes_size: Some(DEFAULT_AXES_SIZE),
            camera: CameraSettings::default(),
        }
    }
}

impl ViewerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(Error::config(format!(
                "window size must be positive, got {}x{}",
                self.width, self.height
            )));
        }
        if !(MIN_POINT_SIZE..=MAX_POINT_SIZE).contains(&self.point_size) {
            return Err(Error::config(format!(
                "point size must be within [{}, {}], got {}",
                MIN_POINT_SIZE, MAX_POINT_SIZE, self.point_size
            )));
        }
        if let Some(size) = self.axes_size {
            if !(size.is_finite() && size > 0.) {
                return Err(Error::config(format!(
                    "axes size must be a positive number, got {}",
                    size
                )));
            }
        }
        self.camera.validate()
    }
}

pub struct RenderLoop<S: DisplaySurface> {
    surface: S,
    scene: Scene,
    camera: OrbitCamera,
    controller: ViewportController,
    projection: PerspectiveProjection,
    background: [f32; 4],
    axes: Option<f32>,
    events: Vec<InputEvent>,
    frames: u64,
}

impl<S: DisplaySurface> RenderLoop<S> {
    /// Frames the camera on the scene and prepares the first frame.
    pub fn new(surface: S, scene: Scene, config: &ViewerConfig) -> Result<Self> {
        config.validate()?;

        let mut camera = OrbitCamera::new(config.camera);
        camera.frame(scene.centroid(), scene.extent());
        debug!(
            "camera framed on {:?} at distance {}",
            camera.target(),
            camera.distance()
        );

        Ok(RenderLoop {
            surface,
            scene,
            camera,
            controller: ViewportController::new(config.point_size),
            projection: PerspectiveProjection::default(),
            background: config.background,
            axes: config.axes_size,
            events: Vec::new(),
            frames: 0,
        })
    }

    pub fn with_camera(mut self, camera: OrbitCamera) -> Self {
        self.camera = camera;
        self
    }

    pub fn camera(&self) -> &OrbitCamera {
        &self.camera
    }

    pub fn controller(&self) -> &ViewportController {
        &self.controller
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn into_surface(self) -> S {
        self.surface
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frames
    }

    pub fn frame_params(&self) -> FrameParams {
        FrameParams {
            projection: self
                .projection
                .for_window(self.surface.size())
                .projection_matrix(),
            view: self.camera.view_transform(),
            point_size: self.controller.point_size(),
            background: self.background,
            axes: self.axes,
        }
    }

    /// Runs one poll, update, submit, present cycle.
    ///
    /// Returns `Control::Exit` without drawing when an exit was requested.
    pub fn step(&mut self) -> Result<Control> {
        self.events.clear();
        self.surface.poll_events(&mut self.events);
        for event in self.events.drain(..) {
            if self.controller.handle(event, &mut self.camera) == Control::Exit {
                return Ok(Control::Exit);
            }
        }

        let params = self.frame_params();
        self.surface.submit(&self.scene, &params)?;
        self.surface.present()?;
        self.frames += 1;
        Ok(Control::Continue)
    }

    pub fn run(&mut self) -> Result<()> {
        info!("rendering {} points", self.scene.len());
        while self.step()? == Control::Continue {}
        info!("exit after {} frames", self.frames);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        controller::{Key, MouseButton},
        loader::SceneMetadata,
        pointcloud::PointBuffer,
    };
    use nalgebra::{Point2, Point3, Vector3};
    use std::collections::VecDeque;

    #[derive(Default)]
    struct MockSurface {
        frames: VecDeque<Vec<InputEvent>>,
        size: [u32; 2],
        submitted: Vec<FrameParams>,
        presented: usize,
        fail_submit_at: Option<usize>,
    }

    impl DisplaySurface for MockSurface {
        fn poll_events(&mut self, events: &mut Vec<InputEvent>) {
            events.extend(self.frames.pop_front().unwrap_or_default());
        }

        fn size(&self) -> [u32; 2] {
            self.size
        }

        fn submit(&mut self, _scene: &Scene, params: &FrameParams) -> Result<()> {
            if self.fail_submit_at == Some(self.submitted.len()) {
                return Err(Error::render("device lost"));
            }
            self.submitted.push(*params);
            Ok(())
        }

        fn present(&mut self) -> Result<()> {
            self.presented += 1;
            Ok(())
        }
    }

    fn scene() -> Scene {
        let pc = PointBuffer::new(vec![Point3::new(0., 0., 0.), Point3::new(10., 10., 10.)]);
        let metadata = SceneMetadata {
            filename: "grid.las".to_string(),
            num_points: pc.len(),
            bounds: pc.bounding_box().unwrap(),
            has_colors: false,
            has_classification: false,
            version: "1.4".to_string(),
            point_format: Some(0),
            scale: Vector3::repeat(0.01),
            offset: Vector3::zeros(),
            header_point_count: 2,
        };
        Scene::new(&pc, metadata)
    }

    fn surface(frames: Vec<Vec<InputEvent>>) -> MockSurface {
        MockSurface {
            frames: frames.into(),
            size: [800, 600],
            ..Default::default()
        }
    }

    #[test]
    fn runs_until_escape() {
        let frames = vec![
            vec![],
            vec![InputEvent::KeyPressed(Key::PointSizeUp)],
            vec![InputEvent::KeyPressed(Key::Escape)],
        ];
        let mut render_loop =
            RenderLoop::new(surface(frames), scene(), &ViewerConfig::default()).unwrap();
        render_loop.run().unwrap();

        let surface = render_loop.into_surface();
        assert_eq!(surface.submitted.len(), 2);
        assert_eq!(surface.presented, 2);
        assert_eq!(surface.submitted[0].point_size, 2.);
        assert_eq!(surface.submitted[1].point_size, 2.5);
    }

    #[test]
    fn exit_is_observed_before_drawing() {
        let frames = vec![vec![
            InputEvent::CloseRequested,
            InputEvent::KeyPressed(Key::PointSizeUp),
        ]];
        let mut render_loop =
            RenderLoop::new(surface(frames), scene(), &ViewerConfig::default()).unwrap();
        assert_eq!(render_loop.step().unwrap(), Control::Exit);
        assert_eq!(render_loop.frames_rendered(), 0);
        assert_eq!(render_loop.controller().point_size(), 2.);
    }

    #[test]
    fn camera_updates_before_transforms() {
        let frames = vec![vec![
            InputEvent::ButtonPressed {
                button: MouseButton::Left,
                position: Point2::new(0., 0.),
            },
            InputEvent::CursorMoved {
                position: Point2::new(40., 0.),
            },
        ]];
        let mut render_loop =
            RenderLoop::new(surface(frames), scene(), &ViewerConfig::default()).unwrap();
        let initial_view = render_loop.frame_params().view;

        render_loop.step().unwrap();
        let moved_view = render_loop.camera().view_transform();
        assert_ne!(initial_view, moved_view);

        let surface = render_loop.into_surface();
        assert_eq!(surface.submitted[0].view, moved_view);
    }

    #[test]
    fn submit_error_ends_the_loop() {
        let mut mock = surface(vec![]);
        mock.fail_submit_at = Some(1);
        let mut render_loop = RenderLoop::new(mock, scene(), &ViewerConfig::default()).unwrap();

        let err = render_loop.run().unwrap_err();
        assert!(matches!(err, Error::Render(_)));
        assert_eq!(render_loop.frames_rendered(), 1);
    }

    #[test]
    fn zero_height_window_still_renders() {
        let mut mock = surface(vec![vec![], vec![InputEvent::KeyPressed(Key::Escape)]]);
        mock.size = [640, 0];
        let mut render_loop = RenderLoop::new(mock, scene(), &ViewerConfig::default()).unwrap();
        render_loop.run().unwrap();
        let surface = render_loop.into_surface();
        assert!(surface.submitted[0]
            .projection
            .iter()
            .all(|v| v.is_finite()));
    }

    #[test]
    fn camera_is_framed_on_scene() {
        let render_loop =
            RenderLoop::new(surface(vec![]), scene(), &ViewerConfig::default()).unwrap();
        assert_eq!(render_loop.camera().target(), Point3::origin());
        assert_eq!(render_loop.camera().distance(), 15.);
    }

    #[test]
    fn axes_follow_the_config() {
        let render_loop =
            RenderLoop::new(surface(vec![]), scene(), &ViewerConfig::default()).unwrap();
        assert_eq!(render_loop.frame_params().axes, Some(DEFAULT_AXES_SIZE));

        let config = ViewerConfig {
            axes_size: None,
            ..Default::default()
        };
        let render_loop = RenderLoop::new(surface(vec![]), scene(), &config).unwrap();
        assert_eq!(render_loop.frame_params().axes, None);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = ViewerConfig {
            height: 0,
            ..Default::default()
        };
        assert!(matches!(
            RenderLoop::new(surface(vec![]), scene(), &config),
            Err(Error::Config(_))
        ));
        let config = ViewerConfig {
            point_size: 20.,
            ..Default::default()
        };
        assert!(config.validate().is_err());
        let config = ViewerConfig {
            axes_size: Some(-5.),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }
}
