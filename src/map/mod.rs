//! Persistent volumetric map layer.
//!
//! The labeling pipeline never reads or writes voxels directly; all map
//! access funnels through the [`FusionLayer`] trait. [`LabelVoxelGrid`] is
//! the in-crate reference implementation (a sparse hash grid); a TSDF-backed
//! engine can be substituted without touching the pipeline.

mod layer;
mod voxel_grid;

pub use layer::{FusionLayer, LayerSlice, SliceVoxel, SubMap};
pub use voxel_grid::{LabelVoxel, LabelVoxelGrid};
