use std::path::PathBuf;

use anyhow::Context;
use log::{info, warn};
use rand::{rngs::StdRng, SeedableRng};
use structopt::StructOpt;

use scanview::{
    has_las_extension, LoadOptions, RenderLoop, Scene, SceneLoader, ViewerConfig, WindowSurface,
    DEFAULT_AXES_SIZE,
};

#[derive(StructOpt, Debug)]
#[structopt(name = "Point Cloud Viewer")]
struct Opt {
    /// LAS or LAZ file to display
    #[structopt(long, short, parse(from_os_str))]
    file: PathBuf,

    /// upper bound on rendered points
    #[structopt(long, default_value = "5000000")]
    max_points: usize,

    /// voxel size in meters used for deduplication
    #[structopt(long, default_value = "0.05")]
    downsample: f64,

    #[structopt(long)]
    no_downsample: bool,

    /// statistical outlier removal (slow on large scans)
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

    /// seed for subsampling, random if omitted
    #[structopt(long)]
    seed: Option<u64>,
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
    info!(
        "{}: {} points, LAS {}, bounds {:?} - {:?}",
        metadata.filename,
        metadata.num_points,
        metadata.version,
        metadata.bounds.min,
        metadata.bounds.max
    );

    let config = ViewerConfig {
        width: opt.width,
        height: opt.height,
        point_size: opt.point_size,
        axes_size: (!opt.no_axes).then(|| DEFAULT_AXES_SIZE),
        ..Default::default()
    };
    config.validate()?;

    let scene = Scene::new(&pc, metadata);
    drop(pc);

    let title = format!("scanview - {}", scene.metadata().filename);
    let surface = WindowSurface::new(&title, [config.width, config.height])?;

    info!("controls: left drag rotate, right drag pan, wheel or W/S zoom, +/- point size, R reset, Esc quit");
    let mut render_loop = RenderLoop::new(surface, scene, &config)?;
    render_loop.run()?;
    Ok(())
}
