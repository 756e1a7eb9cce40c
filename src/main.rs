//! segmap replay daemon.
//!
//! Drives the mapping controller with a deterministic synthetic stream of
//! moving object clusters, publishing updates at a fixed frame interval.
//! Useful for exercising the full pipeline end to end without a sensor:
//! two of the generated objects drift toward each other so that label
//! merging is observable in the logs.
//!
//! # Usage
//!
//! ```bash
//! # With default config
//! cargo run --release
//!
//! # With custom config file and stream shape
//! cargo run --release -- --config configs/config.yaml --frames 300 --seed 7
//! ```

use std::io::Write;
use std::path::Path;

use clap::Parser;
use rand::prelude::*;

use segmap::{
    Controller, LabelVoxelGrid, Point3, Pose3, Quaternion, RawPointBatch, Rgb, SegmapConfig,
};

#[derive(Parser)]
#[command(name = "segmap")]
#[command(about = "Replay a synthetic segment stream through the global segment map")]
struct Args {
    /// Config file path (YAML)
    #[arg(short, long)]
    config: Option<String>,

    /// Number of frames to stream
    #[arg(long, default_value = "200")]
    frames: u64,

    /// Publish dirty objects every N frames
    #[arg(long, default_value = "10")]
    publish_every: u64,

    /// Random seed for the synthetic scene
    #[arg(long, default_value = "42")]
    seed: u64,

    /// Number of synthetic objects
    #[arg(long, default_value = "4")]
    objects: usize,

    /// Frame period in milliseconds of simulated sensor time
    #[arg(long, default_value = "100")]
    frame_period_ms: u64,
}

/// One synthetic object: a point cluster drifting through the world.
struct SceneObject {
    center: Point3,
    velocity: Point3,
    radius: f32,
    color: Rgb,
}

impl SceneObject {
    fn step(&mut self, dt: f32) {
        self.center.x += self.velocity.x * dt;
        self.center.y += self.velocity.y * dt;
        self.center.z += self.velocity.z * dt;
    }

    fn sample(&self, rng: &mut StdRng, n: usize) -> Vec<Point3> {
        (0..n)
            .map(|_| {
                Point3::new(
                    self.center.x + rng.gen_range(-self.radius..self.radius),
                    self.center.y + rng.gen_range(-self.radius..self.radius),
                    self.center.z + rng.gen_range(-self.radius..self.radius),
                )
            })
            .collect()
    }
}

fn build_scene(rng: &mut StdRng, count: usize) -> Vec<SceneObject> {
    let mut objects = Vec::with_capacity(count);
    for i in 0..count {
        objects.push(SceneObject {
            center: Point3::new(
                rng.gen_range(-3.0..3.0),
                rng.gen_range(-3.0..3.0),
                rng.gen_range(0.0..1.5),
            ),
            velocity: Point3::new(rng.gen_range(-0.05..0.05), rng.gen_range(-0.05..0.05), 0.0),
            radius: rng.gen_range(0.15..0.4),
            color: Rgb::new(
                rng.gen_range(30..255),
                rng.gen_range(30..255),
                rng.gen_range(30..255),
            ),
        });
        log::debug!("scene object {} at {:?}", i, objects[i].center);
    }

    // Steer the last two objects onto a collision course so a merge shows
    // up during the run.
    if count >= 2 {
        let target = objects[count - 2].center;
        let chaser = &mut objects[count - 1];
        chaser.velocity = Point3::new(
            (target.x - chaser.center.x) * 0.02,
            (target.y - chaser.center.y) * 0.02,
            (target.z - chaser.center.z) * 0.02,
        );
    }
    objects
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format(|buf, record| {
            writeln!(
                buf,
                "[{}] {} - {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => match SegmapConfig::load(Path::new(path)) {
            Ok(config) => config,
            Err(e) => {
                log::error!("failed to load config {}: {}", path, e);
                std::process::exit(1);
            }
        },
        None => SegmapConfig::load_default().unwrap_or_default(),
    };

    log::info!("segmap starting");
    log::info!("  Voxel size: {} m", config.map.voxel_size);
    log::info!(
        "  Voting: overlap >= {:.0}%, merge evidence >= {}",
        config.labeling.min_overlap_fraction * 100.0,
        config.labeling.merge_evidence_min
    );
    log::info!("  Idle timeout: {} s", config.liveness.idle_timeout_s);
    log::info!(
        "  Stream: {} frames, {} objects, seed {}",
        args.frames,
        args.objects,
        args.seed
    );

    let grid = LabelVoxelGrid::new(config.map.voxel_size);
    let publish_all_default = config.publish.publish_all;
    let scene_updates = config.publish.scene_updates;
    let mut controller = Controller::new(config, grid);

    let mut rng = StdRng::seed_from_u64(args.seed);
    let mut scene = build_scene(&mut rng, args.objects);
    let frame_period_us = args.frame_period_ms * 1_000;
    let dt = args.frame_period_ms as f32 / 1_000.0;

    // Fixed sensor pose; segments are synthesized directly in the world
    // frame, so the pose transform is identity.
    let pose = Pose3::new(Point3::ZERO, Quaternion::identity());

    for frame in 0..args.frames {
        let timestamp_us = frame * frame_period_us;

        // One batch per frame carrying every visible object, partitioned
        // by the embedded instance id channel.
        let mut points = Vec::new();
        let mut colors = Vec::new();
        let mut instance_ids = Vec::new();
        for (id, object) in scene.iter().enumerate() {
            let samples = object.sample(&mut rng, 150);
            for p in samples {
                points.push(p);
                colors.push(object.color);
                instance_ids.push(id as u32);
            }
        }
        let batch = RawPointBatch {
            timestamp_us,
            points,
            colors: Some(colors),
            instance_ids: Some(instance_ids),
        };

        let summary = controller.process_batch(&batch, &pose);
        if summary.merge_groups > 0 {
            log::info!(
                "frame {}: {} merge group(s), {} voxels relabeled",
                frame,
                summary.merge_groups,
                summary.relabeled_voxels
            );
        }

        for object in scene.iter_mut() {
            object.step(dt);
        }

        if args.publish_every > 0 && frame > 0 && frame % args.publish_every == 0 {
            let updates = controller.publish_objects(publish_all_default);
            for update in &updates {
                log::info!(
                    "  {} ({} voxels{}{})",
                    update.label,
                    update.voxel_count,
                    if update.is_new { ", new" } else { "" },
                    if update.merges.is_empty() {
                        String::new()
                    } else {
                        format!(", {} merge(s)", update.merges.len())
                    }
                );
            }
        }
    }

    // Final flush: everything, plus the scene aggregate.
    let updates = controller.publish_objects(true);
    log::info!("final publish: {} object update(s)", updates.len());
    if scene_updates {
        let scene_update = controller.publish_scene();
        log::info!("scene holds {} live label(s)", scene_update.labels.len());
    }

    // The stream has ended; the idle predicate fires once simulated time
    // passes the timeout.
    let end_of_stream_us = args.frames * frame_period_us;
    let idle_at = end_of_stream_us + controller.config().idle_timeout_us() + 1;
    if controller.check_idle(idle_at) {
        log::info!("stream idle, shutting down");
    }

    log::info!(
        "segmap done: {} frames, {} segments integrated",
        controller.integrated_frames(),
        controller.integrated_segments()
    );
}
