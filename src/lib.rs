mod axes;
mod camera;
mod color;
mod controller;
mod error;
mod loader;
mod pointcloud;
mod progress;
mod reduce;
mod render_loop;
mod renderer;
mod scene;
mod software;
mod vertex;

pub use axes::{axis_lines, DEFAULT_AXES_SIZE};
pub use camera::{
    CameraControl, CameraSettings, OrbitCamera, PerspectiveProjection, Projection,
    ELEVATION_LIMIT,
};
pub use color::{
    class_name, colorize, colorize_code, height_colormap, ClassInfo, CLASS_COLORS,
    DEFAULT_CLASS_COLOR,
};
pub use controller::{
    Control, DragState, InputEvent, Key, MouseButton, ViewportController, MAX_POINT_SIZE,
    MIN_POINT_SIZE, POINT_SIZE_STEP,
};
pub use error::{Error, Result};
pub use loader::{has_las_extension, load_point_cloud, LoadOptions, SceneLoader, SceneMetadata};
pub use pointcloud::{BoundingBox, PointBuffer};
pub use progress::ProgressReader;
pub use reduce::{
    random_subsample, remove_statistical_outliers, voxel_downsample, voxel_key, OutlierParams,
    VoxelKey,
};
pub use render_loop::{DisplaySurface, FrameParams, RenderLoop, ViewerConfig};
pub use renderer::{PointCloudRenderer, SurfaceFrame, Viewport, WindowSurface};
pub use scene::Scene;
pub use software::SoftwareSurface;
pub use vertex::Vertex;
