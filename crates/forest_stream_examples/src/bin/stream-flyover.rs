use forest_stream::prelude::*;
use forest_stream_examples::{init_tracing, PngSink, RenderConfig};
use glam::{Vec2, Vec3};
use tracing::info;

const FRAME: f64 = 1.0 / 60.0;

fn main() -> anyhow::Result<()> {
    init_tracing();

    // Rolling hills; the camera flies a slow S-curve across them.
    let terrain = HeightOracle::heightfield(|x, z| {
        Some((x * 0.11).sin() * 1.2 + (z * 0.05).cos() * 2.5)
    });

    let config = StreamConfig::new(6, 2.0)
        .with_radii(3.0, 5.0, 8.0)
        .with_budget(600, BudgetUnit::Rays)
        .with_retention_seconds(8.0)
        .with_render_policy(RenderPolicy {
            trees: TierMask::ALL,
            rocks: TierMask::NEAR_MID,
        });
    let mut streamer = ChunkStreamer::try_new(config, terrain)?;

    let mut events = EventCounts::default();
    let mut renderer = PngSink::new();
    let mut camera = Vec3::new(0.0, 25.0, 0.0);
    let mut t = 0.0;

    for frame in 0..900 {
        t += FRAME;
        camera.x = t as f32 * 4.0;
        camera.z = (t as f32 * 0.4).sin() * 12.0;

        let report = streamer.frame_with_events(camera, t, &mut renderer, &mut events);
        if report.reclassified || frame % 120 == 0 {
            info!(
                "frame {frame:4} chunk {} built {} restored {} queue {} units {}",
                report.camera_chunk,
                report.built,
                report.restored,
                report.queue_len,
                report.units_consumed
            );
        }
    }

    let stats = streamer.stats();
    info!(
        "{} ticks, {} builds, {} restores, {} evicted to cold, {} discarded",
        stats.ticks, stats.builds, stats.restores, stats.evictions_to_cold, stats.discards
    );
    info!(
        "events: {} camera changes, {} leaving, {} kept, {} exhausted, {} warnings",
        events.camera_changes, events.leaving, events.kept, events.exhausted, events.warnings
    );

    let chunk_size = streamer.config().placement.chunk_size;
    let rc = RenderConfig::centered((1000, 1000), Vec2::new(camera.x, camera.z), 18.0)
        .with_chunk_grid(chunk_size, [200, 206, 190])
        .with_camera(Vec2::new(camera.x, camera.z));
    renderer.write_png(&rc, "stream-flyover.png")?;

    Ok(())
}
