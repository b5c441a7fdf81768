use std::{fs::File, io::BufReader, path::Path};

use las::{Read as LasRead, Reader};
use log::{debug, info, warn};
use nalgebra::{Point3, Vector3};
use rand::Rng;

use crate::{
    color::{class_name, colorize},
    error::{Error, Result},
    pointcloud::{BoundingBox, PointBuffer},
    progress::ProgressReader,
    reduce::{random_subsample, remove_statistical_outliers, voxel_downsample, OutlierParams},
};

#[derive(Debug, Clone, PartialEq)]
pub struct LoadOptions {
    pub max_points: usize,
    /// `None` or a size `<= 0` disables voxel deduplication
    pub voxel_size: Option<f64>,
    pub remove_outliers: bool,
    pub outliers: OutlierParams,
    /// draw a progress bar on stdout while reading
    pub progress: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            max_points: 5_000_000,
            voxel_size: Some(0.05),
            remove_outliers: false,
            outliers: OutlierParams::default(),
            progress: false,
        }
    }
}

impl LoadOptions {
    pub fn validate(&self) -> Result<()> {
        if self.max_points == 0 {
            return Err(Error::config("max points must be at least 1"));
        }
        if let Some(v) = self.voxel_size {
            if !v.is_finite() {
                return Err(Error::config(format!("voxel size must be finite, got {}", v)));
            }
        }
        if self.remove_outliers {
            if self.outliers.k == 0 {
                return Err(Error::config("outlier removal needs at least one neighbor"));
            }
            if !(self.outliers.std_ratio >= 0.) || !self.outliers.std_ratio.is_finite() {
                return Err(Error::config(format!(
                    "outlier std ratio must be a non-negative number, got {}",
                    self.outliers.std_ratio
                )));
            }
        }
        Ok(())
    }
}

/// Facts about a loaded scan, taken after all reductions.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneMetadata {
    pub filename: String,
    pub num_points: usize,
    pub bounds: BoundingBox,
    /// the container stored RGB channels
    pub has_colors: bool,
    /// at least one point carries an assigned class code (anything but 0).
    /// A channel holding only "never classified" zeros reports `false`.
    pub has_classification: bool,
    pub version: String,
    pub point_format: Option<u8>,
    pub scale: Vector3<f64>,
    pub offset: Vector3<f64>,
    /// point count declared by the container before any reduction
    pub header_point_count: u64,
}

struct ContainerInfo {
    filename: String,
    has_colors: bool,
    has_classification: bool,
    version: String,
    point_format: Option<u8>,
    scale: Vector3<f64>,
    offset: Vector3<f64>,
    header_point_count: u64,
}

pub struct SceneLoader {
    options: LoadOptions,
}

impl SceneLoader {
    pub fn new(options: LoadOptions) -> Result<Self> {
        options.validate()?;
        if let Some(v) = options.voxel_size {
            if v < 0. {
                warn!("negative voxel size {} disables downsampling", v);
            }
        }
        Ok(SceneLoader { options })
    }

    pub fn options(&self) -> &LoadOptions {
        &self.options
    }

    pub fn load<R: Rng + ?Sized>(
        &self,
        path: impl AsRef<Path>,
        rng: &mut R,
    ) -> Result<(PointBuffer, SceneMetadata)> {
        let path = path.as_ref();
        let (pc, info) = read_container(path, self.options.progress)?;
        if pc.is_empty() {
            return Err(Error::EmptyBuffer {
                path: path.to_path_buf(),
            });
        }

        let pc = self.reduce(pc, rng)?;

        let bounds = pc.bounding_box().ok_or_else(|| Error::EmptyBuffer {
            path: path.to_path_buf(),
        })?;
        let metadata = SceneMetadata {
            filename: info.filename,
            num_points: pc.len(),
            bounds,
            has_colors: info.has_colors,
            has_classification: info.has_classification,
            version: info.version,
            point_format: info.point_format,
            scale: info.scale,
            offset: info.offset,
            header_point_count: info.header_point_count,
        };
        Ok((pc, metadata))
    }

    /// Colorizes by classification where no stored colors exist, then runs the
    /// configured reductions in order: voxel dedup, point cap, outlier removal.
    ///
    /// Outlier removal runs on the capped buffer, so the result may hold
    /// fewer than `max_points` points.
    pub fn reduce<R: Rng + ?Sized>(&self, pc: PointBuffer, rng: &mut R) -> Result<PointBuffer> {
        let mut pc = pc;
        if pc.is_empty() {
            return Ok(pc);
        }

        if !pc.has_colors() {
            if let Some(classes) = pc.classification() {
                let colors = colorize(classes);
                pc = pc.with_colors(Some(colors))?;
                info!("using classification colors");
            }
        }

        if let Some(voxel_size) = self.options.voxel_size.filter(|v| *v > 0.) {
            pc = voxel_downsample(&pc, voxel_size);
            info!(
                "downsampled to {} points (voxel={}m)",
                pc.len(),
                voxel_size
            );
        }

        if pc.len() > self.options.max_points {
            pc = random_subsample(&pc, self.options.max_points, rng);
            info!(
                "sampled to {} points (max={})",
                pc.len(),
                self.options.max_points
            );
        }

        if self.options.remove_outliers {
            let before = pc.len();
            pc = remove_statistical_outliers(&pc, self.options.outliers);
            let removed = before - pc.len();
            info!(
                "removed {} outliers ({:.1}%)",
                removed,
                removed as f64 / before as f64 * 100.
            );
        }
        Ok(pc)
    }
}

/// Loads `path` with default settings apart from the given knobs.
pub fn load_point_cloud<R: Rng + ?Sized>(
    path: impl AsRef<Path>,
    max_points: usize,
    voxel_size: Option<f64>,
    remove_outliers: bool,
    rng: &mut R,
) -> Result<(PointBuffer, SceneMetadata)> {
    let loader = SceneLoader::new(LoadOptions {
        max_points,
        voxel_size,
        remove_outliers,
        ..Default::default()
    })?;
    loader.load(path, rng)
}

/// Opens the container and returns it with the file size in bytes.
fn open_reader(path: &Path, progress: bool) -> Result<(Reader<'static>, u64)> {
    let file = File::open(path).map_err(|e| Error::format(path, e))?;
    let file_len = file.metadata().map_err(|e| Error::format(path, e))?.len();
    let buf = BufReader::new(file);
    let reader = if progress {
        let message = format!("reading {}: ", display_name(path));
        Reader::new(ProgressReader::new(buf, file_len, &message))
    } else {
        Reader::new(ProgressReader::silent(buf))
    };
    let reader = reader.map_err(|e| Error::format(path, e))?;
    Ok((reader, file_len))
}

/// Number of points worth preallocating for.
///
/// The header count is untrusted: an uncompressed file cannot hold more
/// records than fit into its bytes. Compressed files only get an
/// underestimate, which the vectors grow past.
fn preallocation(header_point_count: u64, file_len: u64, record_len: u16) -> usize {
    let fits = file_len / u64::from(record_len.max(1));
    header_point_count.min(fits).try_into().unwrap_or(usize::MAX)
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn read_container(path: &Path, progress: bool) -> Result<(PointBuffer, ContainerInfo)> {
    let (mut reader, file_len) = open_reader(path, progress)?;

    let header = reader.header();
    let format = header.point_format();
    let has_color_channel = format.has_color;
    let transforms = header.transforms();
    let version = header.version();
    let header_point_count = header.number_of_points();
    let point_format = format.to_u8().ok();
    let scale = Vector3::new(transforms.x.scale, transforms.y.scale, transforms.z.scale);
    let offset = Vector3::new(
        transforms.x.offset,
        transforms.y.offset,
        transforms.z.offset,
    );

    info!(
        "loading {} (LAS {}.{}, format {:?})",
        display_name(path),
        version.major,
        version.minor,
        point_format
    );

    let capacity = preallocation(header_point_count, file_len, format.len());
    let mut positions = Vec::with_capacity(capacity);
    let mut colors = Vec::with_capacity(if has_color_channel { capacity } else { 0 });
    let mut classes = Vec::with_capacity(capacity);

    for point in reader.points() {
        let point = point.map_err(|e| Error::format(path, e))?;
        positions.push(Point3::new(point.x, point.y, point.z));
        if has_color_channel {
            let rgb = point.color.map_or(Vector3::zeros(), |c| {
                Vector3::new(
                    c.red as f32 / 65535.,
                    c.green as f32 / 65535.,
                    c.blue as f32 / 65535.,
                )
            });
            colors.push(rgb);
        }
        classes.push(u8::from(point.classification));
    }

    info!("loaded {} points", positions.len());
    if let Some(bbox) = BoundingBox::from_points(&positions) {
        info!(
            "bounds: X[{:.1}, {:.1}] Y[{:.1}, {:.1}] Z[{:.1}, {:.1}]",
            bbox.min.x, bbox.max.x, bbox.min.y, bbox.max.y, bbox.min.z, bbox.max.z
        );
    }

    let has_classification = classes.iter().any(|&c| c != 0);
    if has_classification {
        log_class_histogram(&classes);
    }
    info!(
        "colors: {}",
        if has_color_channel {
            "available (RGB)"
        } else {
            "not available"
        }
    );

    let pc = PointBuffer::from_parts(
        positions,
        has_color_channel.then(|| colors),
        has_classification.then(|| classes),
    )?;

    let info = ContainerInfo {
        filename: display_name(path),
        has_colors: has_color_channel,
        has_classification,
        version: format!("{}.{}", version.major, version.minor),
        point_format,
        scale,
        offset,
        header_point_count,
    };
    Ok((pc, info))
}

fn log_class_histogram(classes: &[u8]) {
    let mut counts = [0usize; 256];
    for &c in classes {
        counts[c as usize] += 1;
    }
    debug!("classes present:");
    for (code, &count) in counts.iter().enumerate().filter(|(_, &n)| n > 0) {
        debug!(
            "  {}: {} points ({:.1}%)",
            class_name(code as u8),
            count,
            count as f64 / classes.len() as f64 * 100.
        );
    }
}

/// Paths that do not look like LAS/LAZ files still get a chance to load.
pub fn has_las_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("las") || e.eq_ignore_ascii_case("laz"))
        .unwrap_or(false)
}
