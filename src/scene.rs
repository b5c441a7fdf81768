use std::sync::atomic::{AtomicU64, Ordering};

use nalgebra::{Point3, Vector3};

use crate::{
    color::height_colormap, loader::SceneMetadata, pointcloud::PointBuffer, vertex::Vertex,
};

static NEXT_SCENE_ID: AtomicU64 = AtomicU64::new(0);

/// A loaded point buffer in render-ready form.
///
/// Vertices are stored relative to the bounding box center so that survey
/// coordinates keep their precision in `f32`.
#[derive(Debug, Clone)]
pub struct Scene {
    id: u64,
    vertices: Vec<Vertex>,
    origin: Point3<f64>,
    centroid: Point3<f32>,
    extent: f32,
    metadata: SceneMetadata,
}

impl Scene {
    pub fn new(pc: &PointBuffer, metadata: SceneMetadata) -> Self {
        let origin = metadata.bounds.center();
        let positions: Vec<Point3<f32>> = pc
            .positions()
            .iter()
            .map(|p| Point3::from((p - origin).cast::<f32>()))
            .collect();

        let colors: Vec<Vector3<f32>> = match pc.colors() {
            Some(colors) => colors.to_vec(),
            None => {
                let heights: Vec<f32> = positions.iter().map(|p| p.z).collect();
                height_colormap(&heights)
            }
        };

        let vertices = positions
            .iter()
            .zip(colors.iter())
            .map(|(p, c)| Vertex {
                position: [p.x, p.y, p.z],
                color: [c.x, c.y, c.z],
            })
            .collect();

        let centroid = pc
            .centroid()
            .map_or(Point3::origin(), |c| Point3::from((c - origin).cast::<f32>()));

        Scene {
            id: NEXT_SCENE_ID.fetch_add(1, Ordering::Relaxed),
            vertices,
            origin,
            centroid,
            extent: metadata.bounds.extent() as f32,
            metadata,
        }
    }

    /// Unique per constructed scene. Clones share the id of their source,
    /// since their vertices are identical.
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// World coordinate that maps to the scene's local origin.
    pub fn origin(&self) -> Point3<f64> {
        self.origin
    }

    /// centroid in scene coordinates
    pub fn centroid(&self) -> Point3<f32> {
        self.centroid
    }

    pub fn extent(&self) -> f32 {
        self.extent
    }

    pub fn metadata(&self) -> &SceneMetadata {
        &self.metadata
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pointcloud::BoundingBox;
    use approx::assert_relative_eq;

    fn metadata(pc: &PointBuffer) -> SceneMetadata {
        SceneMetadata {
            filename: "test.las".to_string(),
            num_points: pc.len(),
            bounds: pc.bounding_box().unwrap_or(BoundingBox::new(
                Point3::origin(),
                Point3::origin(),
            )),
            has_colors: pc.has_colors(),
            has_classification: pc.has_classification(),
            version: "1.2".to_string(),
            point_format: Some(2),
            scale: Vector3::repeat(0.001),
            offset: Vector3::zeros(),
            header_point_count: pc.len() as u64,
        }
    }

    #[test]
    fn vertices_are_rebased_on_bounds_center() {
        let pc = PointBuffer::new(vec![
            Point3::new(500_000., 5_400_000., 100.),
            Point3::new(500_010., 5_400_020., 104.),
            Point3::new(500_004., 5_400_002., 102.),
        ]);
        let scene = Scene::new(&pc, metadata(&pc));

        assert_eq!(scene.origin(), Point3::new(500_005., 5_400_010., 102.));
        assert_eq!(scene.vertices()[0].position, [-5., -10., -2.]);
        assert_eq!(scene.vertices()[1].position, [5., 10., 2.]);
        assert_eq!(scene.extent(), 20.);
        assert_relative_eq!(scene.centroid().x, -0.3333333, epsilon = 1e-4);
        assert_relative_eq!(scene.centroid().y, -2.6666667, epsilon = 1e-4);
    }

    #[test]
    fn stored_colors_are_kept() {
        let pc = PointBuffer::new(vec![Point3::origin(), Point3::new(1., 1., 1.)])
            .with_colors(Some(vec![Vector3::new(1., 0., 0.), Vector3::new(0., 1., 0.)]))
            .unwrap();
        let scene = Scene::new(&pc, metadata(&pc));
        assert_eq!(scene.vertices()[0].color, [1., 0., 0.]);
        assert_eq!(scene.vertices()[1].color, [0., 1., 0.]);
    }

    #[test]
    fn missing_colors_fall_back_to_height_ramp() {
        let pc = PointBuffer::new(vec![Point3::new(0., 0., 0.), Point3::new(0., 0., 10.)]);
        let scene = Scene::new(&pc, metadata(&pc));
        assert_eq!(scene.vertices()[0].color, [0., 0., 1.]);
        assert_eq!(scene.vertices()[1].color, [1., 0., 0.]);
    }

    #[test]
    fn every_scene_gets_its_own_id() {
        let pc = PointBuffer::new(vec![Point3::origin()]);
        let first = Scene::new(&pc, metadata(&pc));
        let id = first.id();
        drop(first);
        // same data, possibly the same allocation, still a new scene
        let second = Scene::new(&pc, metadata(&pc));
        assert_ne!(second.id(), id);
        assert_eq!(second.clone().id(), second.id());
    }

    #[test]
    fn empty_buffer_gives_empty_scene() {
        let pc = PointBuffer::default();
        let scene = Scene::new(&pc, metadata(&pc));
        assert!(scene.is_empty());
        assert_eq!(scene.centroid(), Point3::origin());
    }
}
