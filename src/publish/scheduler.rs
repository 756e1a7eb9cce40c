//! Dirty-label tracking, publish selection and stream liveness.

use std::collections::BTreeSet;

use crate::core::Label;
use crate::labeling::CanonicalMap;

use super::update::MergeAnnouncement;

/// Timestamp of the last accepted frame plus a first-message flag.
///
/// The idle check is a pure, level-triggered predicate; acting on it is
/// the caller's responsibility.
#[derive(Debug, Clone, Copy, Default)]
pub struct LivenessTracker {
    received_first: bool,
    last_update_us: u64,
}

impl LivenessTracker {
    /// Record an accepted frame.
    pub fn note_frame(&mut self, timestamp_us: u64) {
        self.received_first = true;
        // Out-of-order frames never move liveness backwards.
        self.last_update_us = self.last_update_us.max(timestamp_us);
    }

    /// True iff a first frame was received and more than `timeout_us` has
    /// elapsed since the last one. Strictly greater than, so a query at
    /// exactly the timeout boundary is not yet idle.
    pub fn check_idle(&self, now_us: u64, timeout_us: u64) -> bool {
        self.received_first && now_us.saturating_sub(self.last_update_us) > timeout_us
    }

    /// Timestamp of the last accepted frame.
    pub fn last_update_us(&self) -> u64 {
        self.last_update_us
    }
}

/// One label chosen for publication.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectedLabel {
    /// Canonical label to emit
    pub label: Label,
    /// True if the label was never published before
    pub is_new: bool,
}

/// Result of a publish selection.
///
/// An empty selection with no pending merges is a valid no-op.
#[derive(Debug, Clone, Default)]
pub struct PublishSelection {
    /// Labels to emit, in ascending label order
    pub labels: Vec<SelectedLabel>,
    /// All merge announcements queued since the last flush
    pub merges: Vec<MergeAnnouncement>,
}

/// Tracks dirty labels, published history, pending merge announcements
/// and stream liveness.
#[derive(Debug, Clone, Default)]
pub struct PublishScheduler {
    dirty: BTreeSet<Label>,
    published: BTreeSet<Label>,
    pending_merges: Vec<MergeAnnouncement>,
    liveness: LivenessTracker,
}

impl PublishScheduler {
    /// Create an empty scheduler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a canonical label as changed since its last publication.
    pub fn mark_dirty(&mut self, label: Label) {
        self.dirty.insert(label);
    }

    /// True if the label is awaiting publication.
    pub fn is_dirty(&self, label: Label) -> bool {
        self.dirty.contains(&label)
    }

    /// Number of labels awaiting publication.
    pub fn dirty_len(&self) -> usize {
        self.dirty.len()
    }

    /// True if the label was emitted at least once.
    pub fn was_published(&self, label: Label) -> bool {
        self.published.contains(&label)
    }

    /// Number of merge announcements not yet flushed.
    pub fn pending_merge_count(&self) -> usize {
        self.pending_merges.len()
    }

    /// Record that `absorbed` was merged into `canonical`.
    ///
    /// Queues the announcement and folds the absorbed label's dirty and
    /// published history into the canonical label: the canonical label's
    /// voxel set changed, so it becomes dirty, and if the absorbed label
    /// was ever announced downstream the canonical label must not be
    /// re-introduced as a brand-new object.
    pub fn record_merge(&mut self, absorbed: Label, canonical: Label) {
        self.pending_merges.push(MergeAnnouncement {
            absorbed,
            canonical,
        });
        self.dirty.remove(&absorbed);
        self.dirty.insert(canonical);
        if self.published.remove(&absorbed) {
            self.published.insert(canonical);
        }
    }

    /// Record an accepted frame for liveness tracking.
    pub fn note_frame(&mut self, timestamp_us: u64) {
        self.liveness.note_frame(timestamp_us);
    }

    /// Idle predicate; see [`LivenessTracker::check_idle`].
    pub fn check_idle(&self, now_us: u64, timeout_us: u64) -> bool {
        self.liveness.check_idle(now_us, timeout_us)
    }

    /// Select labels to emit and drain pending merge announcements.
    ///
    /// With `publish_all` the selection is every label ever created,
    /// resolved to canonical form and deduplicated; otherwise it is the
    /// dirty set only. Selected labels leave the dirty set and join the
    /// published set. Pending announcements are always drained in full,
    /// regardless of dirty status — a merge must be communicated exactly
    /// once.
    pub fn select_for_publish(
        &mut self,
        publish_all: bool,
        canonical: &mut CanonicalMap,
    ) -> PublishSelection {
        let chosen: BTreeSet<Label> = if publish_all {
            // Everything gets emitted; the dirty set is covered wholesale.
            self.dirty.clear();
            canonical.live_labels().into_iter().collect()
        } else {
            // Dirty entries were canonical when marked but a later merge
            // may have remapped them; drain the whole set and resolve so
            // a stale alias never lingers and re-triggers its canonical
            // label on the next selection.
            std::mem::take(&mut self.dirty)
                .into_iter()
                .map(|label| canonical.resolve(label))
                .collect()
        };

        let mut labels = Vec::with_capacity(chosen.len());
        for label in chosen {
            let is_new = self.published.insert(label);
            labels.push(SelectedLabel { label, is_new });
        }

        PublishSelection {
            labels,
            merges: std::mem::take(&mut self.pending_merges),
        }
    }
}
