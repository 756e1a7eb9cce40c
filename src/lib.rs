//! # segmap
//!
//! Incremental global segment mapping: fuses streaming 3D sensor segments
//! into a persistent labeled voxel map, assigns each segment a globally
//! consistent instance label across frames, and merges labels that
//! evidence shows refer to the same physical object.
//!
//! ## Architecture
//!
//! The crate is organized into 5 logical layers:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                    engine/                          │  ← Orchestration
//! │           (controller, event handling)              │
//! └─────────────────────────────────────────────────────┘
//!                          │
//! ┌─────────────────────────────────────────────────────┐
//! │              labeling/      publish/                │  ← Core algorithms
//! │   (voting, union-find,   (scheduling, dedup,        │
//! │    merge resolution)      liveness)                 │
//! └─────────────────────────────────────────────────────┘
//!                          │
//! ┌─────────────────────────────────────────────────────┐
//! │               segment/       map/                   │  ← Data plumbing
//! │        (ingestion)    (fusion layer contract)       │
//! └─────────────────────────────────────────────────────┘
//!                          │
//! ┌─────────────────────────────────────────────────────┐
//! │                     core/                           │  ← Foundation
//! │              (labels, points, poses)                │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! ## Pipeline per frame
//!
//! Pose lookup (external) → ingestor builds segments → voter tallies
//! per-label voxel overlap → fusion layer integrates each segment under
//! its assigned or fresh label → merge resolver collapses the batch's
//! merge graph and rewrites canonical labels → scheduler marks affected
//! labels dirty. On a publish trigger the scheduler selects labels,
//! drains merge announcements, and one update record per label goes to
//! the caller's sink.
//!
//! ## Quick Start
//!
//! ```rust
//! use segmap::{Controller, LabelVoxelGrid, Pose3, RawPointBatch, SegmapConfig};
//!
//! let config = SegmapConfig::default();
//! let grid = LabelVoxelGrid::new(config.map.voxel_size);
//! let mut controller = Controller::new(config, grid);
//!
//! let batch = RawPointBatch::xyz(0, vec![segmap::Point3::new(0.1, 0.2, 0.3)]);
//! let summary = controller.process_batch(&batch, &Pose3::identity());
//! assert_eq!(summary.segments_integrated, 1);
//!
//! let updates = controller.publish_objects(false);
//! assert_eq!(updates.len(), 1);
//! ```
//!
//! ## Concurrency model
//!
//! Single-threaded and event-driven: one handler runs to completion
//! before the next begins, so per-batch tallies and merge resolution are
//! atomic with respect to the persistent map and no locking is needed.

#![warn(missing_docs)]

// Core foundation (no internal deps)
pub mod core;

// Error taxonomy
pub mod error;

// Segment ingestion (depends on core)
pub mod segment;

// Persistent map contract and reference grid (depends on core, segment)
pub mod map;

// Voting, union-find and merge resolution (depends on core, map, segment)
pub mod labeling;

// Publication scheduling (depends on core, labeling, map)
pub mod publish;

// Unified configuration
pub mod config;

// Controller orchestration (depends on everything below)
pub mod engine;

// Re-export commonly used types
pub use config::{ConfigLoadError, SegmapConfig};
pub use crate::core::{Label, Point3, Pose3, Quaternion, Rgb, VoxelIndex};
pub use engine::{BatchSummary, Controller};
pub use error::IngestError;
pub use labeling::{
    CandidateVoter, CanonicalMap, MergeEdge, MergeGroup, MergeResolver, VoteOutcome,
};
pub use map::{FusionLayer, LabelVoxelGrid, LayerSlice, SliceVoxel, SubMap};
pub use publish::{
    DefaultPolicy, MergeAnnouncement, ObjectUpdate, PublishPolicy, PublishScheduler, SceneUpdate,
};
pub use segment::{RawPointBatch, Segment, SegmentIngestor};
