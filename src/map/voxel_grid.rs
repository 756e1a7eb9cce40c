//! Sparse hash-grid fusion layer.

use std::collections::HashMap;

use crate::core::{Label, Rgb, VoxelIndex};
use crate::segment::Segment;

use super::layer::{FusionLayer, LayerSlice, SliceVoxel, SubMap};

/// One occupied voxel of the reference grid.
///
/// Exactly one live label per occupied voxel. `confidence` counts how many
/// integrations agreed with the stored label minus how many disagreed;
/// when a conflicting integration exhausts it, the voxel switches label.
#[derive(Debug, Clone, Copy)]
pub struct LabelVoxel {
    /// Current live label
    pub label: Label,
    /// Agreement count backing the stored label
    pub confidence: u32,
    /// Accumulated integration weight
    pub weight: f32,
    /// Weighted running average of observed point colors
    pub color: Rgb,
}

/// Sparse voxel grid keyed by integer voxel index.
///
/// Reference implementation of [`FusionLayer`]: unbounded extent, no TSDF,
/// one point contributes unit weight to its containing voxel. Per-label
/// voxel counts are maintained incrementally so publication-time queries
/// do not scan the grid.
#[derive(Debug, Clone)]
pub struct LabelVoxelGrid {
    voxels: HashMap<VoxelIndex, LabelVoxel>,
    label_counts: HashMap<Label, usize>,
    voxel_size: f32,
}

impl LabelVoxelGrid {
    /// Create an empty grid with the given voxel size in meters.
    pub fn new(voxel_size: f32) -> Self {
        Self {
            voxels: HashMap::new(),
            label_counts: HashMap::new(),
            voxel_size,
        }
    }

    /// Total number of occupied voxels.
    pub fn occupied_count(&self) -> usize {
        self.voxels.len()
    }

    /// Iterate over all occupied voxels.
    pub fn iter(&self) -> impl Iterator<Item = (&VoxelIndex, &LabelVoxel)> {
        self.voxels.iter()
    }

    fn bump_count(&mut self, label: Label, delta: isize) {
        let entry = self.label_counts.entry(label).or_insert(0);
        if delta < 0 {
            *entry = entry.saturating_sub((-delta) as usize);
            if *entry == 0 {
                self.label_counts.remove(&label);
            }
        } else {
            *entry += delta as usize;
        }
    }
}

impl FusionLayer for LabelVoxelGrid {
    fn voxel_size(&self) -> f32 {
        self.voxel_size
    }

    fn voxel_label(&self, index: VoxelIndex) -> Option<Label> {
        self.voxels.get(&index).map(|v| v.label)
    }

    fn integrate(&mut self, segment: &Segment, label: Label) {
        let mut switched: Vec<(Label, Label)> = Vec::new();
        let colors = segment.colors();

        for (i, point) in segment.points().iter().enumerate() {
            let index = VoxelIndex::from_point(point, self.voxel_size);
            let sample = colors.get(i).copied();
            match self.voxels.get_mut(&index) {
                None => {
                    self.voxels.insert(
                        index,
                        LabelVoxel {
                            label,
                            confidence: 1,
                            weight: 1.0,
                            color: sample.unwrap_or_default(),
                        },
                    );
                    switched.push((label, label));
                }
                Some(voxel) => {
                    voxel.weight += 1.0;
                    if let Some(sample) = sample {
                        voxel.color = voxel.color.blend(sample, voxel.weight);
                    }
                    if voxel.label == label {
                        voxel.confidence += 1;
                    } else if voxel.confidence > 1 {
                        voxel.confidence -= 1;
                    } else {
                        // Conflicting evidence exhausted the stored label;
                        // the voxel changes hands.
                        switched.push((label, voxel.label));
                        voxel.label = label;
                        voxel.confidence = 1;
                    }
                }
            }
        }

        for (gained, lost) in switched {
            self.bump_count(gained, 1);
            if lost != gained {
                self.bump_count(lost, -1);
            }
        }
    }

    fn relabel(&mut self, old: Label, new: Label) -> usize {
        if old == new {
            return 0;
        }
        let mut moved = 0;
        for voxel in self.voxels.values_mut() {
            if voxel.label == old {
                voxel.label = new;
                moved += 1;
            }
        }
        if moved > 0 {
            self.bump_count(old, -(moved as isize));
            self.bump_count(new, moved as isize);
        }
        moved
    }

    fn extract_sub_map(&self, labels: &[Label]) -> SubMap {
        let mut sub = SubMap::default();
        for label in labels {
            sub.slices.entry(*label).or_default();
        }
        for (index, voxel) in &self.voxels {
            if let Some(slice) = sub.slices.get_mut(&voxel.label) {
                slice.voxels.push(SliceVoxel {
                    index: *index,
                    weight: voxel.weight,
                    color: voxel.color,
                });
            }
        }
        for slice in sub.slices.values_mut() {
            slice.voxels.sort_by_key(|v| v.index);
        }
        sub
    }

    fn live_voxel_count(&self, label: Label) -> usize {
        self.label_counts.get(&label).copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Point3, Pose3, Rgb};

    fn segment_at(points: Vec<Point3>) -> Segment {
        Segment::from_world_points(points, Vec::new(), 0, Pose3::identity(), 0.1)
    }

    #[test]
    fn test_integrate_and_lookup() {
        let mut grid = LabelVoxelGrid::new(0.1);
        let seg = segment_at(vec![Point3::new(0.05, 0.05, 0.05)]);
        grid.integrate(&seg, Label(1));

        assert_eq!(grid.voxel_label(VoxelIndex::new(0, 0, 0)), Some(Label(1)));
        assert_eq!(grid.live_voxel_count(Label(1)), 1);
        assert_eq!(grid.occupied_count(), 1);
    }

    #[test]
    fn test_conflicting_label_switches_after_confidence_exhausted() {
        let mut grid = LabelVoxelGrid::new(0.1);
        let seg = segment_at(vec![Point3::new(0.05, 0.05, 0.05)]);

        grid.integrate(&seg, Label(1)); // confidence 1
        grid.integrate(&seg, Label(2)); // exhausts, switches to L2
        assert_eq!(grid.voxel_label(VoxelIndex::new(0, 0, 0)), Some(Label(2)));
        assert_eq!(grid.live_voxel_count(Label(1)), 0);
        assert_eq!(grid.live_voxel_count(Label(2)), 1);

        grid.integrate(&seg, Label(2)); // confidence 2
        grid.integrate(&seg, Label(1)); // decrement only, no switch
        assert_eq!(grid.voxel_label(VoxelIndex::new(0, 0, 0)), Some(Label(2)));
    }

    #[test]
    fn test_colors_blend_into_published_slice() {
        let mut grid = LabelVoxelGrid::new(0.1);
        let point = vec![Point3::new(0.05, 0.05, 0.05)];
        let red = Segment::from_world_points(
            point.clone(),
            vec![Rgb::new(200, 0, 0)],
            0,
            Pose3::identity(),
            0.1,
        );
        let blue = Segment::from_world_points(
            point,
            vec![Rgb::new(100, 0, 100)],
            1,
            Pose3::identity(),
            0.1,
        );
        grid.integrate(&red, Label(1));
        grid.integrate(&blue, Label(1));

        let sub = grid.extract_sub_map(&[Label(1)]);
        let voxel = sub.slice(Label(1)).unwrap().voxels[0];
        assert_eq!(voxel.color, Rgb::new(150, 0, 50));
        assert!((voxel.weight - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_uncolored_payload_stays_default_black() {
        let mut grid = LabelVoxelGrid::new(0.1);
        grid.integrate(&segment_at(vec![Point3::new(0.05, 0.05, 0.05)]), Label(1));
        let sub = grid.extract_sub_map(&[Label(1)]);
        assert_eq!(sub.slice(Label(1)).unwrap().voxels[0].color, Rgb::default());
    }

    #[test]
    fn test_relabel_moves_all_voxels() {
        let mut grid = LabelVoxelGrid::new(0.1);
        let seg = segment_at(vec![
            Point3::new(0.05, 0.05, 0.05),
            Point3::new(0.15, 0.05, 0.05),
        ]);
        grid.integrate(&seg, Label(3));

        let moved = grid.relabel(Label(3), Label(1));
        assert_eq!(moved, 2);
        assert_eq!(grid.live_voxel_count(Label(3)), 0);
        assert_eq!(grid.live_voxel_count(Label(1)), 2);
        assert_eq!(grid.relabel(Label(3), Label(1)), 0);
    }

    #[test]
    fn test_extract_sub_map() {
        let mut grid = LabelVoxelGrid::new(0.1);
        grid.integrate(&segment_at(vec![Point3::new(0.05, 0.05, 0.05)]), Label(1));
        grid.integrate(&segment_at(vec![Point3::new(1.05, 0.05, 0.05)]), Label(2));

        let sub = grid.extract_sub_map(&[Label(1)]);
        assert_eq!(sub.slices.len(), 1);
        assert_eq!(sub.slice(Label(1)).unwrap().len(), 1);
        assert!(sub.slice(Label(2)).is_none());
    }

    #[test]
    fn test_bounding_box() {
        let mut grid = LabelVoxelGrid::new(0.1);
        grid.integrate(
            &segment_at(vec![Point3::new(0.05, 0.05, 0.05), Point3::new(0.35, 0.05, 0.05)]),
            Label(1),
        );
        let sub = grid.extract_sub_map(&[Label(1)]);
        let (min, max) = sub.slice(Label(1)).unwrap().bounding_box(0.1).unwrap();
        assert!((min.x - 0.0).abs() < 1e-6);
        assert!((max.x - 0.4).abs() < 1e-5);
    }
}
