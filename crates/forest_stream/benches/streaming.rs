mod common;

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use forest_stream::stream::config::{BudgetUnit, StreamConfig};
use forest_stream::stream::streamer::ChunkStreamer;
use glam::Vec3;

const VIEW_RADII: [f32; 3] = [4.0, 8.0, 12.0];
const FRAME: f64 = 1.0 / 60.0;

fn flyover_benches(c: &mut Criterion) {
    let mut group = c.benchmark_group("streaming/flyover");

    for &view in &VIEW_RADII {
        let config = StreamConfig::new(6, 2.0)
            .with_radii(view * 0.4, view * 0.7, view)
            .with_budget(600, BudgetUnit::Rays);
        let Ok(mut streamer) = ChunkStreamer::try_new(config, common::rolling_terrain()) else {
            continue;
        };

        let side = (view.floor() as usize) * 2 + 1;
        group.throughput(common::elements_throughput(side * side));

        let mut t = 0.0f64;
        group.bench_with_input(BenchmarkId::from_parameter(view), &view, |b, _| {
            b.iter(|| {
                t += FRAME;
                let camera = Vec3::new(t as f32 * 6.0, 20.0, (t as f32 * 0.7).sin() * 10.0);
                let report = streamer.tick(camera, t);
                black_box(streamer.instances().total());
                black_box(report.built);
            });
        });
    }

    group.finish();
}

fn aggregate_benches(c: &mut Criterion) {
    let mut group = c.benchmark_group("streaming/aggregate");

    for &view in &VIEW_RADII {
        let config = StreamConfig::new(6, 2.0)
            .with_radii(view * 0.4, view * 0.7, view)
            .with_budget(u32::MAX, BudgetUnit::Rays);
        let Ok(mut streamer) = ChunkStreamer::try_new(config, common::rolling_terrain()) else {
            continue;
        };
        streamer.tick(Vec3::ZERO, 0.0);
        group.throughput(common::elements_throughput(streamer.instances().total()));

        group.bench_with_input(BenchmarkId::from_parameter(view), &view, |b, _| {
            b.iter(|| black_box(streamer.instances().buffer_count()));
        });
    }

    group.finish();
}

criterion_group! {
    name = benches;
    config = common::default_criterion();
    targets = flyover_benches, aggregate_benches
}
criterion_main!(benches);
