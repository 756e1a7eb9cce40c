//! Per-batch processing context.
//!
//! All per-batch scratch state lives here, owned by one `process_batch`
//! call and discarded at batch end. Nothing in this module survives across
//! frames, which is what guarantees the no-cross-batch-leakage invariant
//! for vote tallies and merge edges.

use std::collections::HashMap;

use crate::core::Label;

use super::voter::MergeEdge;

/// What happened to one segment during the batch.
///
/// Segments themselves live in an index-addressed arena (the batch's
/// segment vector); records refer to them by index only.
#[derive(Debug, Clone, Copy)]
pub struct SegmentRecord {
    /// Index of the segment in the batch arena
    pub segment_index: usize,
    /// Label the segment was integrated under
    pub label: Label,
    /// True if the label was freshly allocated
    pub fresh: bool,
    /// Vote count backing the assignment
    pub votes: u32,
}

/// Accumulated merge evidence for one batch.
///
/// Edges are keyed by the normalized label pair; weights from multiple
/// segments voting for the same pair add up.
#[derive(Debug, Clone, Default)]
pub struct MergeEdgeSet {
    edges: HashMap<(Label, Label), u32>,
}

impl MergeEdgeSet {
    /// Create an empty edge set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Accumulate one edge's evidence.
    pub fn add(&mut self, edge: MergeEdge) {
        *self.edges.entry((edge.a, edge.b)).or_insert(0) += edge.weight;
    }

    /// Accumulate a batch of edges.
    pub fn extend(&mut self, edges: impl IntoIterator<Item = MergeEdge>) {
        for edge in edges {
            self.add(edge);
        }
    }

    /// Iterate over accumulated edges.
    pub fn iter(&self) -> impl Iterator<Item = MergeEdge> + '_ {
        self.edges
            .iter()
            .map(|((a, b), weight)| MergeEdge::new(*a, *b, *weight))
    }

    /// Number of distinct label pairs with evidence.
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    /// True if no evidence was accumulated.
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }
}

/// Scratch state for one processing batch.
#[derive(Debug, Default)]
pub struct BatchContext {
    /// Per-segment integration records
    pub records: Vec<SegmentRecord>,
    /// Cross-segment merge evidence
    pub edges: MergeEdgeSet,
}

impl BatchContext {
    /// Create an empty context for a new batch.
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edge_weights_accumulate() {
        let mut set = MergeEdgeSet::new();
        set.add(MergeEdge::new(Label(1), Label(2), 10));
        // Reversed endpoint order normalizes to the same pair
        set.add(MergeEdge::new(Label(2), Label(1), 5));

        assert_eq!(set.len(), 1);
        let edge = set.iter().next().unwrap();
        assert_eq!(edge.weight, 15);
        assert_eq!((edge.a, edge.b), (Label(1), Label(2)));
    }

    #[test]
    fn test_fresh_context_is_empty() {
        let ctx = BatchContext::new();
        assert!(ctx.records.is_empty());
        assert!(ctx.edges.is_empty());
    }
}
