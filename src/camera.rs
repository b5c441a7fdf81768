use nalgebra::{Matrix4, Point3, Vector3};

use crate::error::{Error, Result};

/// Elevation stays strictly inside +-89 degrees so the view never looks
/// straight along the up axis.
pub const ELEVATION_LIMIT: f32 = 89.0 - 1e-3;

const ZOOM_FACTOR: f32 = 0.1;
const PAN_FACTOR: f32 = 0.01;

pub trait Projection {
    fn projection_matrix(&self) -> Matrix4<f32>;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerspectiveProjection {
    /// vertical field of view in degrees
    pub fovy: f32,
    pub aspect_ratio: f32,
    pub znear: f32,
    pub zfar: f32,
}

impl Default for PerspectiveProjection {
    fn default() -> Self {
        Self {
            fovy: 45.,
            aspect_ratio: 16. / 9.,
            znear: 0.1,
            zfar: 10_000.,
        }
    }
}

impl PerspectiveProjection {
    pub fn for_window(&self, size: [u32; 2]) -> Self {
        Self {
            aspect_ratio: size[0] as f32 / size[1].max(1) as f32,
            ..*self
        }
    }
}

impl Projection for PerspectiveProjection {
    fn projection_matrix(&self) -> Matrix4<f32> {
        Matrix4::new_perspective(
            self.aspect_ratio,
            self.fovy.to_radians(),
            self.znear,
            self.zfar,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraSettings {
    pub rotation_speed: f32,
    pub zoom_speed: f32,
    pub pan_speed: f32,
    pub min_distance: f32,
    pub max_distance: f32,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            rotation_speed: 0.5,
            zoom_speed: 2.0,
            pan_speed: 0.1,
            min_distance: 1.0,
            max_distance: 1000.0,
        }
    }
}

impl CameraSettings {
    pub fn validate(&self) -> Result<()> {
        let speeds = [self.rotation_speed, self.zoom_speed, self.pan_speed];
        if speeds.iter().any(|s| !s.is_finite()) {
            return Err(Error::config(format!("camera speeds must be finite, got {:?}", speeds)));
        }
        if !(self.min_distance > 0.) || !(self.max_distance >= self.min_distance) {
            return Err(Error::config(format!(
                "invalid camera distance range [{}, {}]",
                self.min_distance, self.max_distance
            )));
        }
        Ok(())
    }
}

/// The operations the viewport controller drives.
pub trait CameraControl {
    fn rotate(&mut self, d_azimuth: f32, d_elevation: f32);
    fn pan(&mut self, dx: f32, dy: f32);
    fn zoom(&mut self, delta: f32);
    fn reset(&mut self);
}

/// Camera orbiting a target point in a Z-up world.
///
/// Only the orbit parameters are stored; the eye position and the view
/// matrix are derived from them on every read.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitCamera {
    target: Point3<f32>,
    distance: f32,
    /// degrees, unbounded
    azimuth: f32,
    /// degrees, within +-ELEVATION_LIMIT
    elevation: f32,
    settings: CameraSettings,
}

impl Default for OrbitCamera {
    fn default() -> Self {
        OrbitCamera::new(CameraSettings::default())
    }
}

impl OrbitCamera {
    pub const DEFAULT_DISTANCE: f32 = 50.;
    pub const DEFAULT_AZIMUTH: f32 = 45.;
    pub const DEFAULT_ELEVATION: f32 = 30.;

    pub fn new(settings: CameraSettings) -> Self {
        let mut camera = OrbitCamera {
            target: Point3::origin(),
            distance: Self::DEFAULT_DISTANCE,
            azimuth: Self::DEFAULT_AZIMUTH,
            elevation: Self::DEFAULT_ELEVATION,
            settings,
        };
        camera.distance = camera.clamp_distance(camera.distance);
        camera
    }

    pub fn up() -> Vector3<f32> {
        Vector3::z()
    }

    pub fn target(&self) -> Point3<f32> {
        self.target
    }

    pub fn distance(&self) -> f32 {
        self.distance
    }

    pub fn azimuth(&self) -> f32 {
        self.azimuth
    }

    pub fn elevation(&self) -> f32 {
        self.elevation
    }

    pub fn settings(&self) -> &CameraSettings {
        &self.settings
    }

    fn clamp_distance(&self, distance: f32) -> f32 {
        if distance.is_nan() {
            return self.settings.min_distance;
        }
        distance.clamp(self.settings.min_distance, self.settings.max_distance)
    }

    /// Spherical to cartesian around the target.
    pub fn position(&self) -> Point3<f32> {
        let (sin_az, cos_az) = self.azimuth.to_radians().sin_cos();
        let (sin_el, cos_el) = self.elevation.to_radians().sin_cos();
        self.target
            + Vector3::new(cos_el * cos_az, cos_el * sin_az, sin_el) * self.distance
    }

    pub fn view_transform(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(&self.position(), &self.target, &Self::up())
    }

    /// Aims at `center` from far enough away to see a scene of size `extent`.
    pub fn frame(&mut self, center: Point3<f32>, extent: f32) {
        self.target = center;
        self.distance = self.clamp_distance(extent * 1.5);
    }
}

impl CameraControl for OrbitCamera {
    fn rotate(&mut self, d_azimuth: f32, d_elevation: f32) {
        self.azimuth += d_azimuth * self.settings.rotation_speed;
        self.elevation = (self.elevation + d_elevation * self.settings.rotation_speed)
            .clamp(-ELEVATION_LIMIT, ELEVATION_LIMIT);
    }

    fn pan(&mut self, dx: f32, dy: f32) {
        let forward = (self.target - self.position()).normalize();
        let right = forward.cross(&Self::up()).normalize();
        let up = right.cross(&forward);

        let step = self.settings.pan_speed * self.distance * PAN_FACTOR;
        self.target += (right * dx + up * dy) * step;
    }

    fn zoom(&mut self, delta: f32) {
        let factor = 1.0 - delta * self.settings.zoom_speed * ZOOM_FACTOR;
        self.distance = self.clamp_distance(self.distance * factor);
    }

    fn reset(&mut self) {
        *self = OrbitCamera::new(self.settings);
    }
}
