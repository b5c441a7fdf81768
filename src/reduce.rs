use std::collections::HashSet;

use log::debug;
use nalgebra::Point3;
use rand::Rng;
use rayon::prelude::*;
use rstar::{primitives::GeomWithData, RTree};

use crate::pointcloud::PointBuffer;

pub type VoxelKey = (i64, i64, i64);

pub fn voxel_key(p: &Point3<f64>, voxel_size: f64) -> VoxelKey {
    (
        (p.x / voxel_size).floor() as i64,
        (p.y / voxel_size).floor() as i64,
        (p.z / voxel_size).floor() as i64,
    )
}

/// Keeps the first point (in index order) of every occupied voxel.
///
/// The result lists voxels in the order they were first seen.
/// A `voxel_size` that is not strictly positive disables the reduction.
pub fn voxel_downsample(pc: &PointBuffer, voxel_size: f64) -> PointBuffer {
    if !(voxel_size > 0.) || pc.is_empty() {
        return pc.clone();
    }

    let mut seen: HashSet<VoxelKey> = HashSet::with_capacity(pc.len() / 4);
    let indices: Vec<usize> = pc
        .positions()
        .iter()
        .enumerate()
        .filter_map(|(i, p)| seen.insert(voxel_key(p, voxel_size)).then(|| i))
        .collect();

    pc.select(&indices)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutlierParams {
    /// number of neighbors per point
    pub k: usize,
    pub std_ratio: f64,
}

impl Default for OutlierParams {
    fn default() -> Self {
        Self {
            k: 20,
            std_ratio: 2.0,
        }
    }
}

type IndexedPoint = GeomWithData<[f64; 3], usize>;

/// Mean distance from every point to its `k` nearest neighbors (itself excluded).
fn mean_neighbor_distances(positions: &[Point3<f64>], k: usize) -> Vec<f64> {
    let tree = RTree::bulk_load(
        positions
            .iter()
            .enumerate()
            .map(|(i, p)| IndexedPoint::new([p.x, p.y, p.z], i))
            .collect(),
    );

    positions
        .par_iter()
        .enumerate()
        .map(|(i, p)| {
            let sum: f64 = tree
                .nearest_neighbor_iter_with_distance_2(&[p.x, p.y, p.z])
                .filter(|(n, _)| n.data != i)
                .take(k)
                .map(|(_, d2)| d2.sqrt())
                .sum();
            sum / k as f64
        })
        .collect()
}

/// Drops points whose mean neighbor distance exceeds `mean + std_ratio * std`
/// of all mean neighbor distances.
///
/// Buffers with `k` or fewer points are returned unchanged.
pub fn remove_statistical_outliers(pc: &PointBuffer, params: OutlierParams) -> PointBuffer {
    if params.k == 0 || pc.len() <= params.k {
        return pc.clone();
    }

    let means = mean_neighbor_distances(pc.positions(), params.k);

    let n = means.len() as f64;
    let mu = means.iter().sum::<f64>() / n;
    let var = means.iter().map(|m| (m - mu) * (m - mu)).sum::<f64>() / n;
    let threshold = mu + params.std_ratio * var.sqrt();
    debug!(
        "outlier threshold {:.4} (mean {:.4}, std {:.4})",
        threshold,
        mu,
        var.sqrt()
    );

    let mask: Vec<bool> = means.iter().map(|&m| m <= threshold).collect();
    pc.retain_mask(&mask)
}

/// Uniformly samples `max_points` distinct points without replacement.
///
/// Selected points keep their original relative order.
pub fn random_subsample<R: Rng + ?Sized>(
    pc: &PointBuffer,
    max_points: usize,
    rng: &mut R,
) -> PointBuffer {
    if pc.len() <= max_points {
        return pc.clone();
    }
    let mut indices = rand::seq::index::sample(rng, pc.len(), max_points).into_vec();
    indices.sort_unstable();
    pc.select(&indices)
}
