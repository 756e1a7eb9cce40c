//! Test utilities for exercising the segment mapping pipeline.

#![allow(dead_code)]

use segmap::{Controller, LabelVoxelGrid, Point3, Pose3, RawPointBatch, SegmapConfig};

/// Voxel size used by the scenario tests.
pub const VOXEL: f32 = 0.1;

/// Build a controller with explicit voting thresholds.
pub fn controller_with(
    min_overlap_fraction: f32,
    merge_evidence_min: u32,
) -> Controller<LabelVoxelGrid> {
    let mut config = SegmapConfig::default();
    config.map.voxel_size = VOXEL;
    config.labeling.min_overlap_fraction = min_overlap_fraction;
    config.labeling.merge_evidence_min = merge_evidence_min;
    let grid = LabelVoxelGrid::new(config.map.voxel_size);
    Controller::new(config, grid)
}

/// Points covering `n` distinct voxels in a row along X, starting at
/// voxel index `offset`. One point per voxel, at the voxel center.
pub fn strip_points(offset: i32, n: usize) -> Vec<Point3> {
    (0..n)
        .map(|i| Point3::new((offset + i as i32) as f32 * VOXEL + VOXEL / 2.0, 0.05, 0.05))
        .collect()
}

/// A strip batch at the given timestamp.
pub fn strip_batch(timestamp_us: u64, offset: i32, n: usize) -> RawPointBatch {
    RawPointBatch::xyz(timestamp_us, strip_points(offset, n))
}

/// Identity sensor pose (points are synthesized in the world frame).
pub fn world_pose() -> Pose3 {
    Pose3::identity()
}
