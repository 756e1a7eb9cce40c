//! End-to-end pipeline scenarios: label continuation, deferred merging,
//! publish semantics and liveness.

mod common;

use common::{controller_with, strip_batch, strip_points, world_pose, VOXEL};
use segmap::{FusionLayer, Label, MergeAnnouncement, RawPointBatch, Rgb, SegmapConfig};

#[test]
fn new_then_continuing_label() {
    // S1: 100 voxels, no overlap -> creates the first label.
    let mut ctl = controller_with(0.5, 50);
    let s1 = ctl.process_batch(&strip_batch(0, 0, 100), &world_pose());
    assert_eq!(s1.segments_integrated, 1);
    assert_eq!(s1.fresh_labels, 1);

    let labels = ctl.live_labels();
    assert_eq!(labels, vec![Label(0)]);

    // S2: 80 of its 100 voxels overlap L0 (threshold 50) -> continuation.
    let s2 = ctl.process_batch(&strip_batch(1_000_000, 20, 100), &world_pose());
    assert_eq!(s2.segments_integrated, 1);
    assert_eq!(s2.fresh_labels, 0);
    assert_eq!(s2.merge_groups, 0);
    assert_eq!(ctl.live_labels(), vec![Label(0)]);

    // No merge ever happened, so the publish carries no announcements.
    let updates = ctl.publish_objects(false);
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].label, Label(0));
    assert!(updates[0].is_new);
    assert!(updates[0].merges.is_empty());
}

/// Build the deferred-merge situation: two separate labels, then a segment
/// overlapping both above threshold. Returns the controller just after the
/// merge was resolved.
fn merged_controller() -> segmap::Controller<segmap::LabelVoxelGrid> {
    let mut ctl = controller_with(0.4, 50);

    // L0: voxels 0..100, L1: voxels 200..300 (disjoint objects).
    ctl.process_batch(&strip_batch(0, 0, 100), &world_pose());
    ctl.process_batch(&strip_batch(1_000_000, 200, 100), &world_pose());
    assert_eq!(ctl.live_labels(), vec![Label(0), Label(1)]);

    // S3 overlaps 60 voxels of L0 and 55 of L1; both clear
    // ceil(0.4 * 115) = 46 votes. Highest-voted L0 wins the assignment
    // and the (L0, L1) edge carries weight min(60, 55) = 55 >= 50.
    let mut points = strip_points(40, 60);
    points.extend(strip_points(200, 55));
    let s3 = ctl.process_batch(&RawPointBatch::xyz(2_000_000, points), &world_pose());
    assert_eq!(s3.segments_integrated, 1);
    assert_eq!(s3.fresh_labels, 0);
    assert_eq!(s3.merge_groups, 1);
    ctl
}

#[test]
fn deferred_merge_resolves_to_smallest_label() {
    let mut ctl = merged_controller();

    // L1 merged into L0 (smaller id) and resolves there from now on.
    assert_eq!(ctl.live_labels(), vec![Label(0)]);
    assert_eq!(ctl.resolve_label(Label(1)), Label(0));
    assert!(ctl.validate_merge(Label(0), Label(1)));

    // The absorbed label owns no voxels after the bulk relabel.
    assert_eq!(ctl.fusion().live_voxel_count(Label(1)), 0);
    assert!(ctl.fusion().live_voxel_count(Label(0)) >= 200);
}

#[test]
fn deferred_merge_announcement_emitted_once() {
    let mut ctl = merged_controller();

    // Dirty-only publish: only L0 (the canonical label) with the
    // absorption announcement attached.
    let updates = ctl.publish_objects(false);
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].label, Label(0));
    assert_eq!(
        updates[0].merges,
        vec![MergeAnnouncement {
            absorbed: Label(1),
            canonical: Label(0),
        }]
    );

    // No further changes: empty selection, no pending announcements.
    let again = ctl.publish_objects(false);
    assert!(again.is_empty());
}

#[test]
fn publish_all_vs_dirty() {
    let mut ctl = merged_controller();
    ctl.publish_objects(false);

    // publish-all re-emits the live label even though nothing is dirty,
    // and it is not flagged as new the second time.
    let all = ctl.publish_objects(true);
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].label, Label(0));
    assert!(!all[0].is_new);
    assert!(all[0].merges.is_empty());

    // Dirty-only afterwards is a no-op.
    assert!(ctl.publish_objects(false).is_empty());
}

#[test]
fn merge_announcement_completeness_across_publishes() {
    let mut ctl = controller_with(0.4, 10);

    // Three disjoint objects.
    ctl.process_batch(&strip_batch(0, 0, 40), &world_pose());
    ctl.process_batch(&strip_batch(1, 100, 40), &world_pose());
    ctl.process_batch(&strip_batch(2, 200, 40), &world_pose());

    // Merge L1 into L0, publish, then merge L2 into L0, publish again.
    let mut points = strip_points(10, 30);
    points.extend(strip_points(100, 30));
    ctl.process_batch(&RawPointBatch::xyz(3, points), &world_pose());

    let first = ctl.publish_objects(false);

    let mut points = strip_points(10, 30);
    points.extend(strip_points(200, 30));
    ctl.process_batch(&RawPointBatch::xyz(4, points), &world_pose());

    let second = ctl.publish_objects(false);
    let third = ctl.publish_objects(false);

    // Every absorption appears exactly once across the output sequence.
    let mut seen: Vec<MergeAnnouncement> = Vec::new();
    for update in first.iter().chain(second.iter()).chain(third.iter()) {
        seen.extend(update.merges.iter().copied());
    }
    seen.sort_by_key(|m| m.absorbed);
    assert_eq!(
        seen,
        vec![
            MergeAnnouncement {
                absorbed: Label(1),
                canonical: Label(0),
            },
            MergeAnnouncement {
                absorbed: Label(2),
                canonical: Label(0),
            },
        ]
    );
    assert!(third.is_empty());
}

#[test]
fn partition_invariant_after_merges() {
    let mut ctl = merged_controller();

    // Every occupied voxel's stored label resolves to exactly one live
    // label.
    let live = ctl.live_labels();
    let stored: Vec<Label> = ctl.fusion().iter().map(|(_, voxel)| voxel.label).collect();
    for label in stored {
        let resolved = ctl.resolve_label(label);
        assert!(live.contains(&resolved));
    }
}

#[test]
fn idle_timeout_boundary() {
    let mut config = SegmapConfig::default();
    config.map.voxel_size = VOXEL;
    config.liveness.idle_timeout_s = 5.0;
    let grid = segmap::LabelVoxelGrid::new(config.map.voxel_size);
    let mut ctl = segmap::Controller::new(config, grid);

    // Before any frame the stream is never idle.
    assert!(!ctl.check_idle(10_000_000));

    // First frame at t = 0.
    ctl.process_batch(&strip_batch(0, 0, 10), &world_pose());
    assert!(!ctl.check_idle(4_900_000));
    assert!(ctl.check_idle(5_100_000));
}

#[test]
fn geometry_attached_when_meshing_enabled() {
    let mut ctl = controller_with(0.5, 50);
    ctl.process_batch(&strip_batch(0, 0, 20), &world_pose());

    let updates = ctl.publish_objects(false);
    assert_eq!(updates.len(), 1);
    let slice = updates[0].geometry.as_ref().expect("geometry expected");
    assert_eq!(slice.len(), 20);
    let (min, max) = slice.bounding_box(VOXEL).unwrap();
    assert!(min.x.abs() < 1e-6);
    assert!((max.x - 20.0 * VOXEL).abs() < 1e-4);
}

#[test]
fn colored_payload_flows_into_published_geometry() {
    let mut ctl = controller_with(0.5, 50);
    let mut batch = strip_batch(0, 0, 10);
    batch.colors = Some(vec![Rgb::new(200, 40, 40); 10]);
    ctl.process_batch(&batch, &world_pose());

    let updates = ctl.publish_objects(false);
    assert_eq!(updates.len(), 1);
    let slice = updates[0].geometry.as_ref().expect("geometry expected");
    assert!(slice.voxels.iter().all(|v| v.color == Rgb::new(200, 40, 40)));
}

#[test]
fn scene_update_lists_live_labels() {
    let mut ctl = merged_controller();
    let scene = ctl.publish_scene();
    assert_eq!(scene.labels, vec![Label(0)]);
    let sub = scene.geometry.expect("scene geometry expected");
    assert!(sub.slice(Label(0)).is_some());
}
