use nalgebra::{Point3, Vector3};

use crate::error::{Error, Result};

/// Points with optional per-point color and classification.
///
/// All present arrays are index aligned. Points are only ever dropped or
/// reordered through [`PointBuffer::select`], which applies the same index
/// list to every array.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PointBuffer {
    positions: Vec<Point3<f64>>,
    colors: Option<Vec<Vector3<f32>>>,
    classification: Option<Vec<u8>>,
}

impl PointBuffer {
    pub fn new(positions: Vec<Point3<f64>>) -> Self {
        PointBuffer {
            positions,
            colors: None,
            classification: None,
        }
    }

    pub fn from_parts(
        positions: Vec<Point3<f64>>,
        colors: Option<Vec<Vector3<f32>>>,
        classification: Option<Vec<u8>>,
    ) -> Result<Self> {
        let pc = PointBuffer::new(positions)
            .with_colors(colors)?
            .with_classification(classification)?;
        Ok(pc)
    }

    pub fn with_colors(mut self, colors: Option<Vec<Vector3<f32>>>) -> Result<Self> {
        if let Some(c) = &colors {
            self.check_len("colors", c.len())?;
        }
        self.colors = colors;
        Ok(self)
    }

    pub fn with_classification(mut self, classification: Option<Vec<u8>>) -> Result<Self> {
        if let Some(c) = &classification {
            self.check_len("classification", c.len())?;
        }
        self.classification = classification;
        Ok(self)
    }

    fn check_len(&self, name: &str, len: usize) -> Result<()> {
        if len != self.positions.len() {
            return Err(Error::config(format!(
                "{} has {} entries but the buffer holds {} points",
                name,
                len,
                self.positions.len()
            )));
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn positions(&self) -> &[Point3<f64>] {
        &self.positions
    }

    pub fn colors(&self) -> Option<&[Vector3<f32>]> {
        self.colors.as_deref()
    }

    pub fn classification(&self) -> Option<&[u8]> {
        self.classification.as_deref()
    }

    pub fn has_colors(&self) -> bool {
        self.colors.is_some()
    }

    pub fn has_classification(&self) -> bool {
        self.classification.is_some()
    }

    /// Builds a new buffer from the points at `indices`, in that order.
    ///
    /// Panics if an index is out of bounds.
    pub fn select(&self, indices: &[usize]) -> PointBuffer {
        PointBuffer {
            positions: indices.iter().map(|&i| self.positions[i]).collect(),
            colors: self
                .colors
                .as_ref()
                .map(|c| indices.iter().map(|&i| c[i]).collect()),
            classification: self
                .classification
                .as_ref()
                .map(|c| indices.iter().map(|&i| c[i]).collect()),
        }
    }

    /// Keeps the points for which `mask` is true.
    pub fn retain_mask(&self, mask: &[bool]) -> PointBuffer {
        let indices: Vec<usize> = mask
            .iter()
            .enumerate()
            .filter_map(|(i, keep)| keep.then(|| i))
            .collect();
        self.select(&indices)
    }

    pub fn bounding_box(&self) -> Option<BoundingBox> {
        BoundingBox::from_points(&self.positions)
    }

    pub fn centroid(&self) -> Option<Point3<f64>> {
        if self.positions.is_empty() {
            return None;
        }
        let sum = self
            .positions
            .iter()
            .fold(Vector3::zeros(), |acc, p| acc + p.coords);
        Some(Point3::from(sum / self.positions.len() as f64))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min: Point3<f64>,
    pub max: Point3<f64>,
}

impl BoundingBox {
    pub fn new(p1: Point3<f64>, p2: Point3<f64>) -> Self {
        BoundingBox {
            min: p1.inf(&p2),
            max: p1.sup(&p2),
        }
    }

    pub fn from_points(points: &[Point3<f64>]) -> Option<Self> {
        let first = points.first()?;
        let mut min_corner = *first;
        let mut max_corner = *first;
        for p in points.iter().skip(1) {
            min_corner = min_corner.inf(p);
            max_corner = max_corner.sup(p);
        }
        Some(BoundingBox {
            min: min_corner,
            max: max_corner,
        })
    }

    pub fn center(&self) -> Point3<f64> {
        nalgebra::center(&self.min, &self.max)
    }

    pub fn size(&self) -> Vector3<f64> {
        self.max - self.min
    }

    /// largest edge length
    pub fn extent(&self) -> f64 {
        self.size().max()
    }
}
