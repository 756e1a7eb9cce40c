//! Batch-level merge graph resolution.

use std::collections::{BTreeMap, HashMap};

use crate::core::Label;

use super::batch::MergeEdgeSet;
use super::canonical::CanonicalMap;

/// One resolved connected component of the merge graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeGroup {
    /// Surviving canonical label (numerically smallest member)
    pub canonical: Label,
    /// Members absorbed into the canonical label, sorted
    pub absorbed: Vec<Label>,
}

/// Resolves a batch's accumulated merge evidence into label absorptions.
///
/// Edges below the evidence threshold are ignored, the remaining graph is
/// split into connected components, and each component keeps its smallest
/// label id so canonical identity is stable regardless of processing
/// order. Re-running resolution on an already-resolved component is a
/// no-op: its edges collapse to self-loops after canonical resolution.
#[derive(Debug, Clone)]
pub struct MergeResolver {
    evidence_min: u32,
}

impl MergeResolver {
    /// Create a resolver requiring at least `evidence_min` accumulated
    /// vote weight per edge.
    pub fn new(evidence_min: u32) -> Self {
        Self {
            evidence_min: evidence_min.max(1),
        }
    }

    /// Resolve the batch's merge graph and apply every absorption to the
    /// canonical map.
    ///
    /// Returns one group per component with at least two live members,
    /// sorted by canonical label for determinism.
    pub fn resolve_batch(
        &self,
        edges: &MergeEdgeSet,
        canonical: &mut CanonicalMap,
    ) -> Vec<MergeGroup> {
        // Scratch union-find over the labels referenced this batch, keyed
        // by canonical form so stale edges collapse to self-loops.
        let mut parent: HashMap<Label, Label> = HashMap::new();

        for edge in edges.iter() {
            if edge.weight < self.evidence_min {
                continue;
            }
            let a = canonical.resolve(edge.a);
            let b = canonical.resolve(edge.b);
            if a == b {
                continue;
            }
            parent.entry(a).or_insert(a);
            parent.entry(b).or_insert(b);
            let ra = find(&mut parent, a);
            let rb = find(&mut parent, b);
            if ra != rb {
                // Smaller root survives
                let (keep, drop) = if ra < rb { (ra, rb) } else { (rb, ra) };
                parent.insert(drop, keep);
            }
        }

        // Gather components.
        let members: Vec<Label> = parent.keys().copied().collect();
        let mut components: BTreeMap<Label, Vec<Label>> = BTreeMap::new();
        for label in members {
            let root = find(&mut parent, label);
            components.entry(root).or_default().push(label);
        }

        let mut groups = Vec::new();
        for (_, mut component) in components {
            if component.len() < 2 {
                continue;
            }
            component.sort();
            let survivor = component[0];
            let absorbed: Vec<Label> = component[1..].to_vec();
            for label in &absorbed {
                canonical.absorb(*label, survivor);
            }
            groups.push(MergeGroup {
                canonical: survivor,
                absorbed,
            });
        }
        groups
    }
}

fn find(parent: &mut HashMap<Label, Label>, label: Label) -> Label {
    let mut root = label;
    while parent[&root] != root {
        root = parent[&root];
    }
    // Compress
    let mut node = label;
    while parent[&node] != root {
        let next = parent[&node];
        parent.insert(node, root);
        node = next;
    }
    root
}
