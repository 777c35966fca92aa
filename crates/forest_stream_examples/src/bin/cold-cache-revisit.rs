use std::sync::Arc;

use forest_stream::prelude::*;
use forest_stream_examples::{init_tracing, PngSink, RenderConfig};
use glam::{Vec2, Vec3};
use tracing::info;

/// Flies out past the retention window and back, once keeping evicted chunks
/// in cold storage and once discarding them.
fn main() -> anyhow::Result<()> {
    init_tracing();

    let base = StreamConfig::new(6, 2.0)
        .with_radii(2.0, 3.0, 3.0)
        .with_far_enabled(false)
        .with_retention_seconds(2.0)
        .with_budget(u32::MAX, BudgetUnit::Rays);

    let home = Vec3::new(1.0, 10.0, 1.0);
    let away = Vec3::new(41.0, 10.0, 1.0);
    let mut renderer = PngSink::new();

    for (label, cold_retention) in [("cold", None), ("discard", Some(0.0))] {
        let config = base.clone().with_cold_retention_seconds(cold_retention);
        let mut streamer = ChunkStreamer::try_new(config, HeightOracle::flat(0.0))?;

        streamer.tick(home, 0.0);
        let before = streamer.record(ChunkId(0, 0)).cloned();
        streamer.tick(away, 1.0);
        streamer.tick(away, 5.0);
        let report = streamer.frame(home, 6.0, &mut renderer);

        let after = streamer.record(ChunkId(0, 0));
        let same_record = matches!((&before, after), (Some(a), Some(b)) if Arc::ptr_eq(a, b));
        let same_content = matches!((&before, after), (Some(a), Some(b)) if a == b);
        let stats = streamer.stats();
        info!(
            "{label}: return built {} restored {}; total builds {} restores {}; same record {same_record}, same placements {same_content}",
            report.built, report.restored, stats.builds, stats.restores
        );
    }

    let rc = RenderConfig::centered((800, 800), Vec2::new(1.0, 1.0), 8.0)
        .with_chunk_grid(2.0, [205, 210, 196])
        .with_camera(Vec2::new(home.x, home.z));
    renderer.write_png(&rc, "cold-cache-revisit.png")?;

    Ok(())
}
