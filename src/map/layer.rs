//! Fusion engine contract and extracted geometry types.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::{Label, Point3, Rgb, VoxelIndex};
use crate::segment::Segment;

/// Contract the labeling core depends on for all persistent map access.
///
/// Integration is additive/weighted and is called at most once per segment.
/// Relabeling is the bulk merge application path. Mutation never happens
/// concurrently on overlapping regions; the controller serializes events.
pub trait FusionLayer {
    /// Edge length of one voxel in meters.
    fn voxel_size(&self) -> f32;

    /// Current live label of an occupied voxel, `None` if unoccupied.
    ///
    /// Returns the label stored in the map; callers resolve it through the
    /// canonical map before tallying.
    fn voxel_label(&self, index: VoxelIndex) -> Option<Label>;

    /// Integrate a segment's geometry under the given label.
    fn integrate(&mut self, segment: &Segment, label: Label);

    /// Rewrite every voxel tagged `old` to `new`. Returns the number of
    /// voxels moved.
    fn relabel(&mut self, old: Label, new: Label) -> usize;

    /// Extract per-label geometry slices for the given labels.
    fn extract_sub_map(&self, labels: &[Label]) -> SubMap;

    /// Number of voxels currently tagged with the given label.
    fn live_voxel_count(&self, label: Label) -> usize;
}

/// One voxel of published geometry.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SliceVoxel {
    /// Grid position
    pub index: VoxelIndex,
    /// Accumulated integration weight
    pub weight: f32,
    /// Blended surface color; default black when the payload carried no
    /// color channel
    pub color: Rgb,
}

/// Geometry of one label, extracted from the map for publication.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LayerSlice {
    /// Occupied voxels in ascending index order
    pub voxels: Vec<SliceVoxel>,
}

impl LayerSlice {
    /// Number of voxels in the slice.
    pub fn len(&self) -> usize {
        self.voxels.len()
    }

    /// True if the slice is empty.
    pub fn is_empty(&self) -> bool {
        self.voxels.is_empty()
    }

    /// Axis-aligned bounding box of the slice in world coordinates.
    ///
    /// Returns `None` for an empty slice.
    pub fn bounding_box(&self, voxel_size: f32) -> Option<(Point3, Point3)> {
        let first = self.voxels.first()?.index;
        let (mut min, mut max) = (first, first);
        for v in &self.voxels[1..] {
            min.x = min.x.min(v.index.x);
            min.y = min.y.min(v.index.y);
            min.z = min.z.min(v.index.z);
            max.x = max.x.max(v.index.x);
            max.y = max.y.max(v.index.y);
            max.z = max.z.max(v.index.z);
        }
        Some((
            Point3::new(
                min.x as f32 * voxel_size,
                min.y as f32 * voxel_size,
                min.z as f32 * voxel_size,
            ),
            Point3::new(
                (max.x + 1) as f32 * voxel_size,
                (max.y + 1) as f32 * voxel_size,
                (max.z + 1) as f32 * voxel_size,
            ),
        ))
    }
}

/// Per-label geometry slices extracted from the persistent map.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubMap {
    /// Slices keyed by label, in label order
    pub slices: BTreeMap<Label, LayerSlice>,
}

impl SubMap {
    /// Slice for one label, if it has any voxels.
    pub fn slice(&self, label: Label) -> Option<&LayerSlice> {
        self.slices.get(&label)
    }

    /// Remove and return the slice for one label.
    pub fn take_slice(&mut self, label: Label) -> Option<LayerSlice> {
        self.slices.remove(&label)
    }
}
