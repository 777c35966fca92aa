mod common;

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use forest_stream::sampling::OccupancyGrid;
use forest_stream::stream::builder::ChunkBuilder;
use forest_stream::stream::chunk::ChunkId;
use forest_stream::stream::config::{BudgetUnit, ObjectProfile, PlacementConfig};
use glam::Vec2;
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

const TREE_TARGETS: [u32; 4] = [4, 14, 32, 64];
const SPACINGS: [f32; 4] = [0.1, 0.25, 0.5, 1.0];

fn build_chunk_benches(c: &mut Criterion) {
    let oracle = common::rolling_terrain();
    let mut group = c.benchmark_group("build/chunk");

    for &target in &TREE_TARGETS {
        let mut config = PlacementConfig {
            chunk_size: 4.0,
            ..PlacementConfig::default()
        };
        config.trees = ObjectProfile::trees().with_target(target);

        let builder = ChunkBuilder::new(&config, &oracle, BudgetUnit::Rays);
        let expected = builder.build(ChunkId(0, 0), None).record.len();
        group.throughput(common::elements_throughput(expected));

        let mut next = 0i32;
        group.bench_with_input(BenchmarkId::from_parameter(target), &target, |b, _| {
            b.iter(|| {
                next = next.wrapping_add(1);
                let outcome = builder.build(ChunkId(next, -next), None);
                black_box(outcome.units_consumed);
            });
        });
    }

    group.finish();
}

fn occupancy_benches(c: &mut Criterion) {
    let extent = Vec2::new(64.0, 64.0);
    let mut group = c.benchmark_group("build/occupancy");

    for &spacing in &SPACINGS {
        let radius = spacing * 0.5;
        let candidates: Vec<Vec2> = {
            let mut rng = StdRng::seed_from_u64(0x5EED_u64 ^ spacing.to_bits() as u64);
            (0..20_000)
                .map(|_| {
                    let x = (rng.next_u32() >> 8) as f32 / (1u32 << 24) as f32;
                    let z = (rng.next_u32() >> 8) as f32 / (1u32 << 24) as f32;
                    Vec2::new(x * extent.x, z * extent.y)
                })
                .collect()
        };
        group.throughput(common::elements_throughput(candidates.len()));

        group.bench_with_input(BenchmarkId::from_parameter(spacing), &spacing, |b, _| {
            b.iter(|| {
                let mut grid = OccupancyGrid::for_spacing(spacing);
                for p in &candidates {
                    if grid.can_place(p.x, p.y, radius) {
                        grid.add(p.x, p.y, radius);
                    }
                }
                black_box(grid.len());
            });
        });
    }

    group.finish();
}

criterion_group! {
    name = benches;
    config = common::default_criterion();
    targets = build_chunk_benches, occupancy_benches
}
criterion_main!(benches);
