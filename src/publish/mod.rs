//! Publication scheduling and update records.
//!
//! Tracks which labels changed since their last publication, deduplicates
//! already-emitted state, folds merge announcements into the outgoing
//! stream, and detects stream idleness.

mod scheduler;
mod update;

pub use scheduler::{LivenessTracker, PublishScheduler, PublishSelection, SelectedLabel};
pub use update::{DefaultPolicy, MergeAnnouncement, ObjectUpdate, PublishPolicy, SceneUpdate};
