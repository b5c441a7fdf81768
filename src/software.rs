use std::{collections::VecDeque, path::Path};

use image::{Rgba, RgbaImage};
use log::{debug, info};
use nalgebra::{Matrix4, Point3, Vector3};

use crate::{
    axes::axis_lines,
    controller::InputEvent,
    error::{Error, Result},
    render_loop::{DisplaySurface, FrameParams},
    scene::Scene,
};

fn to_rgba(color: [f32; 4]) -> Rgba<u8> {
    Rgba(color.map(|c| (c.clamp(0., 1.) * 255.).round() as u8))
}

/// Projects a scene space position to pixel coordinates and NDC depth.
/// Returns `None` for positions behind the camera.
fn project(transform: &Matrix4<f32>, position: [f32; 3], size: [f32; 2]) -> Option<Vector3<f32>> {
    let clip = transform * Point3::from(position).to_homogeneous();
    if clip.w <= 0. {
        return None;
    }
    let ndc = clip.xyz() / clip.w;
    // image rows grow downwards
    Some(Vector3::new(
        (ndc.x * 0.5 + 0.5) * size[0],
        (0.5 - ndc.y * 0.5) * size[1],
        ndc.z,
    ))
}

/// CPU point rasterizer with a z-buffer.
///
/// Input comes from a script: each call to `poll_events` hands out the next
/// batch. Once the script is used up the surface requests to close, so a
/// render loop over it always terminates.
pub struct SoftwareSurface {
    size: [u32; 2],
    target: RgbaImage,
    depth: Vec<f32>,
    presented: Option<RgbaImage>,
    script: VecDeque<Vec<InputEvent>>,
}

impl SoftwareSurface {
    pub fn new(size: [u32; 2]) -> Self {
        SoftwareSurface {
            size,
            target: RgbaImage::new(size[0], size[1]),
            depth: vec![f32::INFINITY; (size[0] * size[1]) as usize],
            presented: None,
            script: VecDeque::new(),
        }
    }

    pub fn with_script(mut self, frames: Vec<Vec<InputEvent>>) -> Self {
        self.script = frames.into();
        self
    }

    /// Queues one more batch of events.
    pub fn push_events(&mut self, events: Vec<InputEvent>) {
        self.script.push_back(events);
    }

    /// The last presented frame.
    pub fn image(&self) -> Option<&RgbaImage> {
        self.presented.as_ref()
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let img = self
            .presented
            .as_ref()
            .ok_or_else(|| Error::render("no frame has been presented yet"))?;
        img.save(path)
            .map_err(|e| Error::render(format!("saving {}: {}", path.display(), e)))?;
        info!("wrote {}", path.display());
        Ok(())
    }

    fn clear(&mut self, background: [f32; 4]) {
        let bg = to_rgba(background);
        for pixel in self.target.pixels_mut() {
            *pixel = bg;
        }
        self.depth.fill(f32::INFINITY);
    }

    /// One pixel wide line with depth interpolated between the endpoints.
    fn line(&mut self, from: Vector3<f32>, to: Vector3<f32>, color: Rgba<u8>) {
        let [width, height] = self.size;
        let steps = (to.x - from.x).abs().max((to.y - from.y).abs()).ceil().max(1.) as u32;
        for i in 0..=steps {
            let p = from.lerp(&to, i as f32 / steps as f32);
            if p.z.abs() > 1. || p.x < 0. || p.y < 0. {
                continue;
            }
            let (x, y) = (p.x as u32, p.y as u32);
            if x >= width || y >= height {
                continue;
            }
            let i = y as usize * width as usize + x as usize;
            if p.z < self.depth[i] {
                self.depth[i] = p.z;
                self.target.put_pixel(x, y, color);
            }
        }
    }

    fn splat(&mut self, center: [f32; 2], depth: f32, size: f32, color: Rgba<u8>) {
        let [width, height] = self.size;
        let extent = size.round().max(1.) as i64;
        let x0 = (center[0] - size / 2.).round() as i64;
        let y0 = (center[1] - size / 2.).round() as i64;

        for y in y0.max(0)..(y0 + extent).min(height as i64) {
            for x in x0.max(0)..(x0 + extent).min(width as i64) {
                let i = y as usize * width as usize + x as usize;
                if depth < self.depth[i] {
                    self.depth[i] = depth;
                    self.target.put_pixel(x as u32, y as u32, color);
                }
            }
        }
    }
}

impl DisplaySurface for SoftwareSurface {
    fn poll_events(&mut self, events: &mut Vec<InputEvent>) {
        match self.script.pop_front() {
            Some(batch) => events.extend(batch),
            None => events.push(InputEvent::CloseRequested),
        }
    }

    fn size(&self) -> [u32; 2] {
        self.size
    }

    fn submit(&mut self, scene: &Scene, params: &FrameParams) -> Result<()> {
        self.clear(params.background);

        let transform = params.view_projection();
        let size = self.size.map(|v| v as f32);
        let mut drawn = 0usize;

        for v in scene.vertices() {
            let p = match project(&transform, v.position, size) {
                Some(p) => p,
                None => continue,
            };
            let outside = p.x < 0. || p.x > size[0] || p.y < 0. || p.y > size[1];
            if outside || p.z.abs() > 1. {
                continue;
            }
            let [r, g, b] = v.color;
            self.splat([p.x, p.y], p.z, params.point_size, to_rgba([r, g, b, 1.]));
            drawn += 1;
        }
        debug!("rasterized {} of {} points", drawn, scene.len());

        if let Some(axes_size) = params.axes {
            for pair in axis_lines(axes_size).chunks_exact(2) {
                let from = project(&transform, pair[0].position, size);
                let to = project(&transform, pair[1].position, size);
                if let (Some(from), Some(to)) = (from, to) {
                    let [r, g, b] = pair[0].color;
                    self.line(from, to, to_rgba([r, g, b, 1.]));
                }
            }
        }
        Ok(())
    }

    fn present(&mut self) -> Result<()> {
        self.presented = Some(self.target.clone());
        Ok(())
    }
}
