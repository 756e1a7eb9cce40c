//! Per-segment label candidate voting.

use crate::core::Label;
use crate::map::FusionLayer;
use crate::segment::Segment;

use super::canonical::CanonicalMap;

/// Unordered pair of labels plus merge evidence weight.
///
/// Held only for the duration of one processing batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeEdge {
    /// Smaller label of the pair
    pub a: Label,
    /// Larger label of the pair
    pub b: Label,
    /// Evidence weight (min of the two candidates' vote counts)
    pub weight: u32,
}

impl MergeEdge {
    /// Create an edge with the endpoints in normalized (ascending) order.
    pub fn new(x: Label, y: Label, weight: u32) -> Self {
        if x <= y {
            Self { a: x, b: y, weight }
        } else {
            Self {
                a: y,
                b: x,
                weight,
            }
        }
    }
}

/// Label assignment decided for one segment.
#[derive(Debug, Clone)]
pub struct VoteOutcome {
    /// Label the segment will be integrated under
    pub label: Label,
    /// True if the label was freshly allocated for this segment
    pub fresh: bool,
    /// Vote count backing the assignment (0 for a fresh label)
    pub votes: u32,
    /// Merge evidence between above-threshold candidates, deferred to
    /// batch-level resolution
    pub edges: Vec<MergeEdge>,
}

/// Tallies per-label voxel overlap under a segment's footprint and applies
/// the assignment policy.
///
/// Merging is never performed on a single frame's evidence; when several
/// labels clear the threshold the segment joins the highest-voted one and
/// the rest become merge edges for the batch resolver.
#[derive(Debug, Clone)]
pub struct CandidateVoter {
    min_overlap_fraction: f32,
}

impl CandidateVoter {
    /// Create a voter with the given acceptance threshold.
    ///
    /// A label must collect at least `min_overlap_fraction` of the
    /// segment's footprint voxels to be a candidate.
    pub fn new(min_overlap_fraction: f32) -> Self {
        Self {
            min_overlap_fraction: min_overlap_fraction.clamp(0.0, 1.0),
        }
    }

    /// Tally overlap votes for each existing label under the segment's
    /// footprint, resolved through the canonical map.
    ///
    /// Returns `(label, votes)` sorted by votes descending, ties broken by
    /// smaller label id for determinism.
    pub fn vote<F: FusionLayer + ?Sized>(
        &self,
        segment: &Segment,
        layer: &F,
        canonical: &mut CanonicalMap,
    ) -> Vec<(Label, u32)> {
        let mut tally: std::collections::HashMap<Label, u32> = std::collections::HashMap::new();
        for index in segment.footprint() {
            if let Some(stored) = layer.voxel_label(*index) {
                let live = canonical.resolve(stored);
                *tally.entry(live).or_insert(0) += 1;
            }
        }

        let mut ranked: Vec<(Label, u32)> = tally.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        ranked
    }

    /// Decide the label for a segment.
    ///
    /// Returns `None` for an empty segment (no vote; the caller skips it).
    /// Allocates a fresh label when no existing label reaches the minimum
    /// vote fraction of the footprint.
    pub fn assign<F: FusionLayer + ?Sized>(
        &self,
        segment: &Segment,
        layer: &F,
        canonical: &mut CanonicalMap,
    ) -> Option<VoteOutcome> {
        if segment.is_empty() {
            return None;
        }

        let ranked = self.vote(segment, layer, canonical);
        let min_votes =
            ((segment.footprint().len() as f32 * self.min_overlap_fraction).ceil() as u32).max(1);

        let candidates: Vec<(Label, u32)> = ranked
            .into_iter()
            .filter(|(_, votes)| *votes >= min_votes)
            .collect();

        match candidates.len() {
            0 => Some(VoteOutcome {
                label: canonical.fresh_label(),
                fresh: true,
                votes: 0,
                edges: Vec::new(),
            }),
            1 => Some(VoteOutcome {
                label: candidates[0].0,
                fresh: false,
                votes: candidates[0].1,
                edges: Vec::new(),
            }),
            _ => {
                // Evidence that several live labels cover one physical
                // object; record every above-threshold pair.
                let mut edges = Vec::new();
                for i in 0..candidates.len() {
                    for j in (i + 1)..candidates.len() {
                        let weight = candidates[i].1.min(candidates[j].1);
                        edges.push(MergeEdge::new(candidates[i].0, candidates[j].0, weight));
                    }
                }
                Some(VoteOutcome {
                    label: candidates[0].0,
                    fresh: false,
                    votes: candidates[0].1,
                    edges,
                })
            }
        }
    }
}
