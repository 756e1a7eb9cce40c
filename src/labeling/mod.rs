//! Label assignment and merge resolution.
//!
//! The voter tallies per-label voxel overlap for each segment, the batch
//! context accumulates cross-segment merge evidence, and the resolver
//! collapses the batch's merge graph into canonical labels via union-find.

mod batch;
mod canonical;
mod merge;
mod voter;

pub use batch::{BatchContext, MergeEdgeSet, SegmentRecord};
pub use canonical::CanonicalMap;
pub use merge::{MergeGroup, MergeResolver};
pub use voter::{CandidateVoter, MergeEdge, VoteOutcome};
