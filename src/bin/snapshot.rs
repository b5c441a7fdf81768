use std::path::PathBuf;

use anyhow::Context;
use log::{info, warn};
use rand::{rngs::StdRng, SeedableRng};
use structopt::StructOpt;

use scanview::{
    has_las_extension, CameraControl, LoadOptions, OrbitCamera, RenderLoop, Scene, SceneLoader,
    SoftwareSurface, ViewerConfig, DEFAULT_AXES_SIZE,
};

/// Renders one frame of a scan to a PNG without opening a window.
#[derive(StructOpt, Debug)]
#[structopt(name = "Point Cloud Snapshot")]
struct Opt {
    /// LAS or LAZ file to render
    #[structopt(long, short, parse(from_os_str))]
    file: PathBuf,

    /// output image
    #[structopt(long, short, parse(from_os_str), default_value = "snapshot.png")]
    output: PathBuf,

    #[structopt(long, default_value = "5000000")]
    max_points: usize,

    /// voxel size in meters used for deduplication
    #[structopt(long, default_value = "0.05")]
    downsample: f64,

    #[structopt(long)]
    no_downsample: bool,

    #[structopt(long)]
    remove_outliers: bool,

    #[structopt(long, default_value = "1920")]
    width: u32,

    #[structopt(long, default_value = "1080")]
    height: u32,

    #[structopt(long, default_value = "2.0")]
    point_size: f32,

    /// hide the reference axes at the scene center
    #[structopt(long)]
    no_axes: bool,

    #[structopt(long)]
    seed: Option<u64>,

    /// camera azimuth change in degrees, applied after framing
    #[structopt(long, default_value = "0")]
    azimuth: f32,

    /// camera elevation change in degrees, applied after framing
    #[structopt(long, default_value = "0")]
    elevation: f32,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let opt = Opt::from_args();

    if !has_las_extension(&opt.file) {
        warn!(
            "{} does not look like a LAS/LAZ file, trying anyway",
            opt.file.display()
        );
    }

    let loader = SceneLoader::new(LoadOptions {
        max_points: opt.max_points,
        voxel_size: (!opt.no_downsample).then(|| opt.downsample),
        remove_outliers: opt.remove_outliers,
        progress: true,
        ..Default::default()
    })?;
    let mut rng = match opt.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let (pc, metadata) = loader
        .load(&opt.file, &mut rng)
        .with_context(|| format!("loading {}", opt.file.display()))?;

    let config = ViewerConfig {
        width: opt.width,
        height: opt.height,
        point_size: opt.point_size,
        axes_size: (!opt.no_axes).then(|| DEFAULT_AXES_SIZE),
        ..Default::default()
    };
    let scene = Scene::new(&pc, metadata);

    // one scripted frame, then the surface asks to close
    let surface = SoftwareSurface::new([config.width, config.height]).with_script(vec![vec![]]);
    let render_loop = RenderLoop::new(surface, scene, &config)?;

    let mut camera: OrbitCamera = *render_loop.camera();
    let speed = camera.settings().rotation_speed;
    camera.rotate(opt.azimuth / speed, opt.elevation / speed);
    let mut render_loop = render_loop.with_camera(camera);

    render_loop.run()?;
    let surface = render_loop.into_surface();
    surface.save(&opt.output)?;
    info!("{}x{} snapshot done", config.width, config.height);
    Ok(())
}
