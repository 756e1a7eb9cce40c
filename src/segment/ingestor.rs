//! Conversion of raw point batches into segments.

use std::collections::BTreeMap;

use crate::core::{Point3, Pose3, Rgb};
use crate::error::IngestError;

use super::types::{RawPointBatch, Segment};

/// Builds [`Segment`] values from raw point batches.
///
/// Stateless apart from the grid resolution; safe to reuse across frames.
#[derive(Debug, Clone)]
pub struct SegmentIngestor {
    voxel_size: f32,
}

impl SegmentIngestor {
    /// Create an ingestor producing footprints at the given voxel size.
    pub fn new(voxel_size: f32) -> Self {
        Self { voxel_size }
    }

    /// Convert one raw batch plus a resolved pose into zero or more segments.
    ///
    /// Returns an empty vector for an empty batch (non-fatal; the caller
    /// skips the frame). When the instance id channel is present the batch
    /// is split into one segment per distinct id; ids with no points are
    /// never produced. Points are transformed into the world frame here,
    /// once, so every later stage works in a single frame.
    pub fn build_segments(
        &self,
        batch: &RawPointBatch,
        pose: &Pose3,
    ) -> Result<Vec<Segment>, IngestError> {
        if batch.is_empty() {
            return Ok(Vec::new());
        }

        if let Some(colors) = &batch.colors {
            if colors.len() != batch.points.len() {
                return Err(IngestError::ColorChannelMismatch {
                    expected: batch.points.len(),
                    got: colors.len(),
                });
            }
        }
        if let Some(ids) = &batch.instance_ids {
            if ids.len() != batch.points.len() {
                return Err(IngestError::InstanceChannelMismatch {
                    expected: batch.points.len(),
                    got: ids.len(),
                });
            }
        }

        let world_points: Vec<Point3> = batch
            .points
            .iter()
            .map(|p| pose.transform_point(p))
            .collect();

        let segments = match &batch.instance_ids {
            Some(ids) => {
                // Partition by embedded instance id, preserving point order
                // within each partition.
                let mut groups: BTreeMap<u32, (Vec<Point3>, Vec<Rgb>)> = BTreeMap::new();
                for (i, id) in ids.iter().enumerate() {
                    let entry = groups.entry(*id).or_default();
                    entry.0.push(world_points[i]);
                    if let Some(colors) = &batch.colors {
                        entry.1.push(colors[i]);
                    }
                }
                groups
                    .into_values()
                    .map(|(points, colors)| {
                        Segment::from_world_points(
                            points,
                            colors,
                            batch.timestamp_us,
                            *pose,
                            self.voxel_size,
                        )
                    })
                    .collect()
            }
            None => {
                let colors = batch.colors.clone().unwrap_or_default();
                vec![Segment::from_world_points(
                    world_points,
                    colors,
                    batch.timestamp_us,
                    *pose,
                    self.voxel_size,
                )]
            }
        };

        Ok(segments)
    }
}
