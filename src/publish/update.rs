//! Update records emitted to external sinks, and the strategy seam for
//! customizing them.

use serde::{Deserialize, Serialize};

use crate::core::Label;
use crate::map::{LayerSlice, SubMap};

use super::scheduler::SelectedLabel;

/// Notice that one label was absorbed into a canonical label.
///
/// Announcements are forward-only: already-published updates for the
/// absorbed label are not retracted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeAnnouncement {
    /// Label that was merged away
    pub absorbed: Label,
    /// Live label it resolves to
    pub canonical: Label,
}

/// One per-object update handed to the external sink.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectUpdate {
    /// Canonical label this update describes
    pub label: Label,
    /// True the first time this label is ever emitted
    pub is_new: bool,
    /// Voxels currently tagged with the label
    pub voxel_count: usize,
    /// Extracted geometry, present when meshing-on-publish is enabled
    pub geometry: Option<LayerSlice>,
    /// Merge announcements folding into this label this publish cycle
    pub merges: Vec<MergeAnnouncement>,
}

/// Scene-level update aggregating all currently live labels.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneUpdate {
    /// Every live canonical label
    pub labels: Vec<Label>,
    /// Extracted geometry for the whole scene, when enabled
    pub geometry: Option<SubMap>,
}

/// Strategy seam for publication.
///
/// Two operations: choose which of the scheduler-selected labels actually
/// go out, and build the update record for one label. The default passes
/// the selection through untouched.
pub trait PublishPolicy {
    /// Filter or reorder the scheduler's selection.
    fn choose_labels(&self, selected: &[SelectedLabel], publish_all: bool) -> Vec<SelectedLabel> {
        let _ = publish_all;
        selected.to_vec()
    }

    /// Build the update record for one label.
    fn build_update(
        &self,
        label: Label,
        is_new: bool,
        voxel_count: usize,
        geometry: Option<LayerSlice>,
        merges: Vec<MergeAnnouncement>,
    ) -> ObjectUpdate {
        ObjectUpdate {
            label,
            is_new,
            voxel_count,
            geometry,
            merges,
        }
    }
}

/// Default pass-through policy.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultPolicy;

impl PublishPolicy for DefaultPolicy {}
