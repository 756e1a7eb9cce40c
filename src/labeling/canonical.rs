//! Canonical label map: allocation plus path-compressed union-find.

use std::collections::BTreeSet;

use crate::core::Label;

/// Maps every label ever created to its currently-live canonical label.
///
/// Doubles as the label allocator so label ids stay dense and the parent
/// table can be a flat vector. Resolution is idempotent and absorption is
/// transitive: merging A into B and then B into C leaves A resolving to C.
#[derive(Debug, Clone, Default)]
pub struct CanonicalMap {
    /// parent[i] == i for a live (canonical) label
    parent: Vec<u32>,
}

impl CanonicalMap {
    /// Create an empty map with no labels allocated.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a brand-new label. Labels are monotonically increasing and
    /// never reused.
    pub fn fresh_label(&mut self) -> Label {
        let id = self.parent.len() as u32;
        self.parent.push(id);
        Label(id)
    }

    /// Number of labels ever allocated.
    pub fn allocated(&self) -> usize {
        self.parent.len()
    }

    /// True if the label was allocated by this map.
    pub fn contains(&self, label: Label) -> bool {
        (label.0 as usize) < self.parent.len()
    }

    /// Resolve a label to its canonical representative, compressing the
    /// path. A label this map never allocated resolves to itself.
    pub fn resolve(&mut self, label: Label) -> Label {
        if !self.contains(label) {
            return label;
        }
        let root = self.find_root(label.0);
        // Path compression: point every node on the walk directly at the root.
        let mut node = label.0;
        while self.parent[node as usize] != root {
            let next = self.parent[node as usize];
            self.parent[node as usize] = root;
            node = next;
        }
        Label(root)
    }

    /// Resolve without mutating (no path compression). Used where only a
    /// shared reference is available.
    pub fn resolve_const(&self, label: Label) -> Label {
        if !self.contains(label) {
            return label;
        }
        Label(self.find_root(label.0))
    }

    /// True if the label currently resolves to itself.
    pub fn is_live(&self, label: Label) -> bool {
        self.resolve_const(label) == label
    }

    /// Point `absorbed`'s root at `canonical`'s root.
    ///
    /// Returns false (and changes nothing) when both already share a root,
    /// which makes repeated absorption a no-op.
    pub fn absorb(&mut self, absorbed: Label, canonical: Label) -> bool {
        if !self.contains(absorbed) || !self.contains(canonical) {
            return false;
        }
        let from = self.resolve(absorbed);
        let to = self.resolve(canonical);
        if from == to {
            return false;
        }
        self.parent[from.0 as usize] = to.0;
        true
    }

    /// Deduplicated canonical form of every label ever allocated, sorted.
    pub fn live_labels(&mut self) -> Vec<Label> {
        let mut live = BTreeSet::new();
        for id in 0..self.parent.len() as u32 {
            live.insert(self.resolve(Label(id)));
        }
        live.into_iter().collect()
    }

    fn find_root(&self, mut node: u32) -> u32 {
        while self.parent[node as usize] != node {
            node = self.parent[node as usize];
        }
        node
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_labels_are_monotonic() {
        let mut map = CanonicalMap::new();
        assert_eq!(map.fresh_label(), Label(0));
        assert_eq!(map.fresh_label(), Label(1));
        assert_eq!(map.allocated(), 2);
    }

    #[test]
    fn test_resolve_is_idempotent() {
        let mut map = CanonicalMap::new();
        let a = map.fresh_label();
        let b = map.fresh_label();
        map.absorb(b, a);

        let once = map.resolve(b);
        let twice = map.resolve(b);
        assert_eq!(once, twice);
        assert_eq!(once, a);
    }

    #[test]
    fn test_absorb_is_transitive() {
        let mut map = CanonicalMap::new();
        let a = map.fresh_label();
        let b = map.fresh_label();
        let c = map.fresh_label();

        // A -> B, then B -> C must equal a direct A -> C
        map.absorb(a, b);
        map.absorb(b, c);
        assert_eq!(map.resolve(a), c);

        let mut direct = CanonicalMap::new();
        let a2 = direct.fresh_label();
        let _b2 = direct.fresh_label();
        let c2 = direct.fresh_label();
        direct.absorb(a2, c2);
        assert_eq!(direct.resolve(a2), c2);
        assert_eq!(map.resolve(a).0, direct.resolve(a2).0);
    }

    #[test]
    fn test_repeated_absorb_is_noop() {
        let mut map = CanonicalMap::new();
        let a = map.fresh_label();
        let b = map.fresh_label();
        assert!(map.absorb(b, a));
        assert!(!map.absorb(b, a));
        assert_eq!(map.resolve(b), a);
    }

    #[test]
    fn test_live_labels_dedup() {
        let mut map = CanonicalMap::new();
        let a = map.fresh_label();
        let b = map.fresh_label();
        let c = map.fresh_label();
        map.absorb(b, a);

        assert_eq!(map.live_labels(), vec![a, c]);
    }

    #[test]
    fn test_unknown_label_resolves_to_itself() {
        let mut map = CanonicalMap::new();
        assert_eq!(map.resolve(Label(42)), Label(42));
        assert!(!map.contains(Label(42)));
    }
}
