//! Core foundation types shared by every layer.
//!
//! No internal dependencies; everything above builds on these.

pub mod pose;
pub mod types;

pub use pose::{Pose3, Quaternion};
pub use types::{Label, Point3, Rgb, VoxelIndex};
