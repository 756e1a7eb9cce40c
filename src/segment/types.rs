//! Raw point batch and segment value types.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::core::{Point3, Pose3, Rgb, VoxelIndex};

/// One incoming point batch from the transport layer, in the sensor frame.
///
/// Color and per-point instance ids are optional feature channels. When the
/// instance id channel is present, the ingestor splits the batch into one
/// segment per distinct id; otherwise the whole batch is treated as a
/// single pre-clustered segment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawPointBatch {
    /// Frame timestamp in microseconds since epoch
    pub timestamp_us: u64,
    /// Points in the sensor frame
    pub points: Vec<Point3>,
    /// Optional per-point colors (same length as `points`)
    pub colors: Option<Vec<Rgb>>,
    /// Optional per-point instance ids (same length as `points`)
    pub instance_ids: Option<Vec<u32>>,
}

impl RawPointBatch {
    /// Create a plain XYZ batch without feature channels.
    pub fn xyz(timestamp_us: u64, points: Vec<Point3>) -> Self {
        Self {
            timestamp_us,
            points,
            colors: None,
            instance_ids: None,
        }
    }

    /// Number of points in the batch.
    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// True if the batch carries no points.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// One frame's point cluster belonging to a single object.
///
/// Immutable after construction. Points are stored in the world frame and
/// the voxel footprint is precomputed and deduplicated. Segments are owned
/// by the current processing batch and discarded after integration.
#[derive(Debug, Clone)]
pub struct Segment {
    timestamp_us: u64,
    pose: Pose3,
    points: Vec<Point3>,
    colors: Vec<Rgb>,
    footprint: Vec<VoxelIndex>,
}

impl Segment {
    /// Build a segment from world-frame points.
    ///
    /// `colors` may be empty when the payload has no color channel.
    pub fn from_world_points(
        points: Vec<Point3>,
        colors: Vec<Rgb>,
        timestamp_us: u64,
        pose: Pose3,
        voxel_size: f32,
    ) -> Self {
        let footprint: BTreeSet<VoxelIndex> = points
            .iter()
            .map(|p| VoxelIndex::from_point(p, voxel_size))
            .collect();

        Self {
            timestamp_us,
            pose,
            points,
            colors,
            footprint: footprint.into_iter().collect(),
        }
    }

    /// Frame timestamp in microseconds.
    #[inline]
    pub fn timestamp_us(&self) -> u64 {
        self.timestamp_us
    }

    /// Sensor pose at capture time.
    #[inline]
    pub fn pose(&self) -> &Pose3 {
        &self.pose
    }

    /// World-frame points.
    #[inline]
    pub fn points(&self) -> &[Point3] {
        &self.points
    }

    /// Per-point colors; empty if the payload had no color channel.
    #[inline]
    pub fn colors(&self) -> &[Rgb] {
        &self.colors
    }

    /// Deduplicated voxel footprint, sorted.
    #[inline]
    pub fn footprint(&self) -> &[VoxelIndex] {
        &self.footprint
    }

    /// Number of points.
    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// True if the segment carries no points.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}
