//! Segment ingestion: raw point batches in, immutable segments out.
//!
//! A [`Segment`] is one frame's point cluster believed to belong to a
//! single object. The ingestor transforms points into the world frame and
//! precomputes the deduplicated voxel footprint used by the candidate
//! voter; it never touches the persistent map.

mod ingestor;
mod types;

pub use ingestor::SegmentIngestor;
pub use types::{RawPointBatch, Segment};
