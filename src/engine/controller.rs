//! The controller: one event at a time, run to completion.
//!
//! Single-threaded reactive model. Each handler (frame arrival, publish
//! trigger, service request) executes fully before the next begins, which
//! keeps per-batch vote tallies and merge resolution atomic with respect
//! to the persistent map. Failures never escape a handler: a bad batch is
//! logged and skipped with no shared state mutated.

use std::collections::HashMap;

use crate::config::SegmapConfig;
use crate::core::{Label, Pose3};
use crate::labeling::{BatchContext, CandidateVoter, CanonicalMap, MergeResolver, SegmentRecord};
use crate::map::FusionLayer;
use crate::publish::{
    DefaultPolicy, MergeAnnouncement, ObjectUpdate, PublishPolicy, PublishScheduler, SceneUpdate,
};
use crate::segment::{RawPointBatch, SegmentIngestor};

/// What happened while processing one frame's batch.
#[derive(Debug, Clone, Copy, Default)]
pub struct BatchSummary {
    /// Segments integrated into the map
    pub segments_integrated: usize,
    /// Segments skipped (empty, or the whole batch was malformed)
    pub segments_skipped: usize,
    /// Fresh labels allocated
    pub fresh_labels: usize,
    /// Merge groups resolved at batch end
    pub merge_groups: usize,
    /// Voxels rewritten by bulk relabeling
    pub relabeled_voxels: usize,
}

/// Orchestrates the full per-frame pipeline and the publish/liveness
/// surface over a fusion layer.
///
/// Generic over the fusion engine and the publish policy so both seams
/// can be substituted; [`crate::map::LabelVoxelGrid`] and
/// [`DefaultPolicy`] are the stock choices.
pub struct Controller<F: FusionLayer, P: PublishPolicy = DefaultPolicy> {
    config: SegmapConfig,
    fusion: F,
    policy: P,
    ingestor: SegmentIngestor,
    voter: CandidateVoter,
    resolver: MergeResolver,
    canonical: CanonicalMap,
    scheduler: PublishScheduler,
    integrated_frames: u64,
    integrated_segments: u64,
}

impl<F: FusionLayer> Controller<F, DefaultPolicy> {
    /// Create a controller with the default publish policy.
    pub fn new(config: SegmapConfig, fusion: F) -> Self {
        Self::with_policy(config, fusion, DefaultPolicy)
    }
}

impl<F: FusionLayer, P: PublishPolicy> Controller<F, P> {
    /// Create a controller with a custom publish policy.
    pub fn with_policy(config: SegmapConfig, fusion: F, policy: P) -> Self {
        let ingestor = SegmentIngestor::new(config.map.voxel_size);
        let voter = CandidateVoter::new(config.labeling.min_overlap_fraction);
        let resolver = MergeResolver::new(config.labeling.merge_evidence_min);
        Self {
            config,
            fusion,
            policy,
            ingestor,
            voter,
            resolver,
            canonical: CanonicalMap::new(),
            scheduler: PublishScheduler::new(),
            integrated_frames: 0,
            integrated_segments: 0,
        }
    }

    /// Process one frame's point batch with its resolved pose.
    ///
    /// Ingests segments, votes and assigns labels, integrates geometry,
    /// resolves the batch's merge graph, applies bulk relabels, queues
    /// merge announcements and marks affected labels dirty. Malformed
    /// batches are logged and skipped; nothing is mutated for them.
    pub fn process_batch(&mut self, batch: &RawPointBatch, pose: &Pose3) -> BatchSummary {
        let mut summary = BatchSummary::default();

        if batch.is_empty() {
            log::debug!("empty point batch at t={}us, skipping", batch.timestamp_us);
            return summary;
        }

        let segments = match self.ingestor.build_segments(batch, pose) {
            Ok(segments) => segments,
            Err(e) => {
                log::warn!("malformed batch at t={}us: {}", batch.timestamp_us, e);
                summary.segments_skipped = 1;
                return summary;
            }
        };

        let mut ctx = BatchContext::new();

        for (segment_index, segment) in segments.iter().enumerate() {
            if segment.is_empty() {
                summary.segments_skipped += 1;
                continue;
            }

            let outcome = if self.config.labeling.use_label_propagation {
                match self.voter.assign(segment, &self.fusion, &mut self.canonical) {
                    Some(outcome) => outcome,
                    None => {
                        summary.segments_skipped += 1;
                        continue;
                    }
                }
            } else {
                // Propagation disabled: every segment is a new instance.
                crate::labeling::VoteOutcome {
                    label: self.canonical.fresh_label(),
                    fresh: true,
                    votes: 0,
                    edges: Vec::new(),
                }
            };

            self.fusion.integrate(segment, outcome.label);
            self.scheduler.mark_dirty(outcome.label);

            if outcome.fresh {
                summary.fresh_labels += 1;
                log::trace!(
                    "segment {} ({} pts) -> new label {}",
                    segment_index,
                    segment.len(),
                    outcome.label
                );
            } else {
                log::trace!(
                    "segment {} ({} pts) -> {} with {} votes",
                    segment_index,
                    segment.len(),
                    outcome.label,
                    outcome.votes
                );
            }

            ctx.records.push(SegmentRecord {
                segment_index,
                label: outcome.label,
                fresh: outcome.fresh,
                votes: outcome.votes,
            });
            ctx.edges.extend(outcome.edges);
            summary.segments_integrated += 1;
        }

        // Batch-level merge resolution: single-frame evidence alone never
        // merges; it has to clear the accumulated threshold here.
        let groups = self.resolver.resolve_batch(&ctx.edges, &mut self.canonical);
        summary.merge_groups = groups.len();
        for group in &groups {
            for absorbed in &group.absorbed {
                let moved = self.fusion.relabel(*absorbed, group.canonical);
                summary.relabeled_voxels += moved;
                self.scheduler.record_merge(*absorbed, group.canonical);
                log::debug!(
                    "merged {} into {} ({} voxels relabeled)",
                    absorbed,
                    group.canonical,
                    moved
                );
            }
        }

        self.scheduler.note_frame(batch.timestamp_us);
        self.integrated_frames += 1;
        self.integrated_segments += summary.segments_integrated as u64;

        log::debug!(
            "frame {} done: {} segments in, {} fresh labels, {} merge groups",
            self.integrated_frames,
            summary.segments_integrated,
            summary.fresh_labels,
            summary.merge_groups
        );
        summary
    }

    /// Publish trigger: select labels, attach geometry and merge
    /// announcements, and build one update record per label.
    ///
    /// With `publish_all` every live label is emitted; otherwise only
    /// dirty labels. Announcements whose canonical label was not selected
    /// still go out on a geometry-less update, since a merge must be
    /// communicated exactly once.
    pub fn publish_objects(&mut self, publish_all: bool) -> Vec<ObjectUpdate> {
        let selection = self
            .scheduler
            .select_for_publish(publish_all, &mut self.canonical);
        let chosen = self.policy.choose_labels(&selection.labels, publish_all);

        // Group drained announcements under the live canonical label.
        let mut merges_by_label: HashMap<Label, Vec<MergeAnnouncement>> = HashMap::new();
        for announcement in selection.merges {
            let live = self.canonical.resolve(announcement.canonical);
            merges_by_label.entry(live).or_default().push(announcement);
        }

        let labels: Vec<Label> = chosen.iter().map(|s| s.label).collect();
        let mut geometry = if self.config.publish.mesh_on_publish {
            Some(self.fusion.extract_sub_map(&labels))
        } else {
            None
        };

        let mut updates = Vec::with_capacity(chosen.len());
        for selected in chosen {
            let slice = geometry
                .as_mut()
                .and_then(|sub| sub.take_slice(selected.label));
            let merges = merges_by_label.remove(&selected.label).unwrap_or_default();
            updates.push(self.policy.build_update(
                selected.label,
                selected.is_new,
                self.fusion.live_voxel_count(selected.label),
                slice,
                merges,
            ));
        }

        // Orphaned announcements (canonical label not selected this cycle).
        let mut orphans: Vec<(Label, Vec<MergeAnnouncement>)> =
            merges_by_label.into_iter().collect();
        orphans.sort_by_key(|(label, _)| *label);
        for (label, merges) in orphans {
            updates.push(self.policy.build_update(
                label,
                false,
                self.fusion.live_voxel_count(label),
                None,
                merges,
            ));
        }

        log::info!(
            "publishing {} object update(s) ({})",
            updates.len(),
            if publish_all { "all" } else { "dirty" }
        );
        updates
    }

    /// Scene-level update aggregating all currently live labels.
    pub fn publish_scene(&mut self) -> SceneUpdate {
        let labels = self.canonical.live_labels();
        let geometry = if self.config.publish.mesh_on_publish {
            Some(self.fusion.extract_sub_map(&labels))
        } else {
            None
        };
        log::info!("publishing scene update with {} live label(s)", labels.len());
        SceneUpdate { labels, geometry }
    }

    /// Service-style extraction of the given labels' geometry, e.g. for
    /// on-demand meshing or export.
    ///
    /// Returns `None` (request failure) when any label was never
    /// allocated; nothing is mutated on failure. Labels are resolved to
    /// canonical form before extraction.
    pub fn extract_objects(&mut self, labels: &[Label]) -> Option<crate::map::SubMap> {
        let mut resolved = Vec::with_capacity(labels.len());
        for label in labels {
            if !self.canonical.contains(*label) {
                log::warn!("extract request for unknown label {}", label);
                return None;
            }
            resolved.push(self.canonical.resolve(*label));
        }
        resolved.sort();
        resolved.dedup();
        Some(self.fusion.extract_sub_map(&resolved))
    }

    /// Service-style check that two labels refer to the same object.
    ///
    /// Returns false for labels this map never allocated. Mutates nothing.
    pub fn validate_merge(&self, a: Label, b: Label) -> bool {
        if !self.canonical.contains(a) || !self.canonical.contains(b) {
            return false;
        }
        self.canonical.resolve_const(a) == self.canonical.resolve_const(b)
    }

    /// Idle predicate with the configured timeout. Advisory and
    /// level-triggered; shutdown is the caller's decision.
    pub fn check_idle(&self, now_us: u64) -> bool {
        self.scheduler.check_idle(now_us, self.config.idle_timeout_us())
    }

    /// Resolve a label to its live canonical form.
    pub fn resolve_label(&mut self, label: Label) -> Label {
        self.canonical.resolve(label)
    }

    /// Every live canonical label, sorted.
    pub fn live_labels(&mut self) -> Vec<Label> {
        self.canonical.live_labels()
    }

    /// Fusion layer (read access, e.g. for inspection or export).
    pub fn fusion(&self) -> &F {
        &self.fusion
    }

    /// Number of frames integrated so far.
    pub fn integrated_frames(&self) -> u64 {
        self.integrated_frames
    }

    /// Number of segments integrated so far.
    pub fn integrated_segments(&self) -> u64 {
        self.integrated_segments
    }

    /// Active configuration.
    pub fn config(&self) -> &SegmapConfig {
        &self.config
    }
}
