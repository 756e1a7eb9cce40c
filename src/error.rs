//! Error types for segmap.
//!
//! The pipeline treats almost everything as recoverable: a bad input batch
//! is logged and skipped at the event boundary and no shared state is
//! mutated for the skipped unit of work.

/// Errors raised while converting a raw point batch into segments.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    /// Color channel length does not match the point count
    #[error("color channel has {got} entries for {expected} points")]
    ColorChannelMismatch {
        /// Number of points in the batch
        expected: usize,
        /// Number of color entries supplied
        got: usize,
    },

    /// Instance id channel length does not match the point count
    #[error("instance id channel has {got} entries for {expected} points")]
    InstanceChannelMismatch {
        /// Number of points in the batch
        expected: usize,
        /// Number of instance ids supplied
        got: usize,
    },
}
