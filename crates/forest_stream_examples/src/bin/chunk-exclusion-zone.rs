use forest_stream::prelude::*;
use forest_stream_examples::{init_tracing, PngSink, RenderConfig};
use glam::{Vec2, Vec3};
use tracing::info;

fn main() -> anyhow::Result<()> {
    init_tracing();

    // A clearing around the origin, e.g. a house plot: nothing may be placed inside it.
    let clearing = ExclusionZone::new(0.0, 0.0, 6.0, 4.0);

    let config = StreamConfig::new(6, 2.0)
        .with_radii(4.0, 4.0, 4.0)
        .with_far_enabled(false)
        .with_exclusion_zone(clearing)
        .with_seam_spacing(true)
        .with_budget(u32::MAX, BudgetUnit::Rays);

    // Terrain mesh stand-in: a sampled grid answering downward ray casts.
    // Placements outside the grid miss and are skipped.
    let ground = HeightGrid::from_fn(-9.0, -9.0, 0.5, 41, 41, |x, z| {
        0.15 * (x * 0.8).sin() + 0.1 * (z * 1.3).cos()
    });
    let mut streamer = ChunkStreamer::try_new(config, HeightOracle::raycast(ground))?;

    let mut renderer = PngSink::new();
    streamer.frame(Vec3::new(1.0, 10.0, 1.0), 0.0, &mut renderer);

    let inside = streamer
        .active_tiers()
        .keys()
        .filter_map(|id| streamer.record(*id))
        .flat_map(|r| r.trees.iter().chain(r.rocks()))
        .filter(|p| clearing.contains(p.position.x, p.position.z, 0.0))
        .count();
    info!(
        "{} instances around the clearing, {} inside it",
        renderer.instance_count(),
        inside
    );

    let rc = RenderConfig::centered((900, 900), Vec2::new(1.0, 1.0), 9.0)
        .with_chunk_grid(2.0, [205, 210, 196])
        .with_exclusion_zone(clearing, [242, 222, 196]);
    renderer.write_png(&rc, "chunk-exclusion-zone.png")?;

    Ok(())
}
