//! Frame-driven chunk streamer.
//!
//! [`ChunkStreamer`] owns the cache, the FIFO build queue and the active tier map.
//! Each call to [`ChunkStreamer::tick`] runs, in order:
//! 1. ring classification (only when the camera chunk or configuration changed),
//! 2. cache diff: keep, restore from cold, or enqueue active chunks; start
//!    retention timers for chunks that left every ring,
//! 3. eviction sweep (rate-limited by `sweep_interval_seconds`),
//! 4. budgeted builds from the queue. With `partial_builds` a build that runs
//!    out of budget is paused and resumed first on the next tick,
//!
//! and [`ChunkStreamer::frame`] follows that with aggregation and upload.
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use glam::Vec3;
use tracing::{debug, info};

use crate::error::Result;
use crate::height::HeightOracle;
use crate::stream::aggregate::{aggregate, InstanceSet, RendererSink};
use crate::stream::builder::{BuildOutcome, BuildProgress, ChunkBuilder};
use crate::stream::cache::{ChunkCache, ChunkState};
use crate::stream::chunk::{chunk_id_for_position, ChunkId};
use crate::stream::config::StreamConfig;
use crate::stream::events::{EventSink, StreamEvent};
use crate::stream::lod::{RingClassifier, TierMap};
use crate::stream::placement::ChunkRecord;
use crate::stream::Tier;

/// A pending chunk build.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BuildJob {
    pub id: ChunkId,
    /// Time the job was queued, in seconds.
    pub enqueued_at: f64,
}

/// What a single tick did.
#[derive(Clone, Debug, PartialEq)]
pub struct TickReport {
    pub camera_chunk: ChunkId,
    /// Rings were recomputed this tick.
    pub reclassified: bool,
    pub enqueued: usize,
    pub restored: usize,
    pub kept: usize,
    pub leaving: usize,
    pub moved_to_cold: usize,
    pub discarded: usize,
    pub built: usize,
    /// Budget units spent on builds this tick.
    pub units_consumed: u32,
    /// Jobs left for later ticks.
    pub queue_len: usize,
}

impl TickReport {
    fn new(camera_chunk: ChunkId) -> Self {
        Self {
            camera_chunk,
            reclassified: false,
            enqueued: 0,
            restored: 0,
            kept: 0,
            leaving: 0,
            moved_to_cold: 0,
            discarded: 0,
            built: 0,
            units_consumed: 0,
            queue_len: 0,
        }
    }

    fn is_quiet(&self) -> bool {
        !self.reclassified
            && self.built == 0
            && self.moved_to_cold == 0
            && self.discarded == 0
    }
}

/// Cumulative counters since construction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StreamStats {
    pub ticks: u64,
    pub builds: u64,
    pub restores: u64,
    pub evictions_to_cold: u64,
    pub discards: u64,
    pub units_consumed: u64,
}

pub struct ChunkStreamer {
    config: StreamConfig,
    oracle: HeightOracle,
    classifier: RingClassifier,
    cache: ChunkCache,
    queue: VecDeque<BuildJob>,
    queued: HashSet<ChunkId>,
    /// Build paused for lack of budget; its id stays in `queued`.
    in_progress: Option<BuildProgress>,
    active: TierMap,
    camera_chunk: Option<ChunkId>,
    needs_reclassify: bool,
    last_sweep: Option<f64>,
    stats: StreamStats,
}

impl ChunkStreamer {
    /// Validates and normalises `config`, then creates an idle streamer.
    pub fn try_new(config: StreamConfig, oracle: HeightOracle) -> Result<Self> {
        config.validate()?;
        let config = config.normalized();
        Ok(Self {
            classifier: RingClassifier::from_config(&config),
            cache: ChunkCache::from_config(&config),
            config,
            oracle,
            queue: VecDeque::new(),
            queued: HashSet::new(),
            in_progress: None,
            active: TierMap::new(),
            camera_chunk: None,
            needs_reclassify: true,
            last_sweep: None,
            stats: StreamStats::default(),
        })
    }

    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    pub fn oracle(&self) -> &HeightOracle {
        &self.oracle
    }

    /// Replaces the configuration. Placement changes flush every cached and
    /// queued chunk; other changes only force reclassification on the next tick.
    pub fn set_config(&mut self, config: StreamConfig) -> Result<()> {
        config.validate()?;
        let config = config.normalized();

        if config.placement != self.config.placement {
            info!(
                "Placement configuration changed; dropping {} hot, {} cold and {} queued chunks.",
                self.cache.hot_len(),
                self.cache.cold_len(),
                self.queue.len()
            );
            self.cache.clear();
            self.queue.clear();
            self.queued.clear();
            self.in_progress = None;
        }

        self.classifier = RingClassifier::from_config(&config);
        self.cache.set_policy(
            config.retention_seconds,
            config.cold_retention_seconds,
            config.cold_capacity,
        );
        self.config = config;
        self.needs_reclassify = true;
        Ok(())
    }

    pub fn camera_chunk(&self) -> Option<ChunkId> {
        self.camera_chunk
    }

    pub fn active_tiers(&self) -> &TierMap {
        &self.active
    }

    pub fn tier_of(&self, id: ChunkId) -> Tier {
        self.active.get(&id).copied().unwrap_or(Tier::Off)
    }

    /// Pending builds, including one paused mid-build.
    pub fn queue_len(&self) -> usize {
        self.queue.len() + usize::from(self.in_progress.is_some())
    }

    pub fn queued_ids(&self) -> impl Iterator<Item = ChunkId> + '_ {
        self.in_progress
            .iter()
            .map(BuildProgress::id)
            .chain(self.queue.iter().map(|job| job.id))
    }

    pub fn cache(&self) -> &ChunkCache {
        &self.cache
    }

    pub fn stats(&self) -> StreamStats {
        self.stats
    }

    pub fn state_of(&self, id: ChunkId) -> ChunkState {
        if self.queued.contains(&id) {
            return ChunkState::Queued;
        }
        self.cache.state_of(id)
    }

    /// Hot record for a chunk, if built and not evicted.
    pub fn record(&self, id: ChunkId) -> Option<&Arc<ChunkRecord>> {
        self.cache.hot(id)
    }

    /// Builds a chunk outside the cache with no budget limit.
    pub fn build_uncached(&self, id: ChunkId) -> BuildOutcome {
        ChunkBuilder::new(&self.config.placement, &self.oracle, self.config.budget_unit)
            .build(id, None)
    }

    pub fn tick(&mut self, camera: Vec3, now: f64) -> TickReport {
        self.tick_with_events(camera, now, &mut ())
    }

    pub fn tick_with_events(
        &mut self,
        camera: Vec3,
        now: f64,
        sink: &mut dyn EventSink,
    ) -> TickReport {
        let cam = chunk_id_for_position(camera.x, camera.z, self.config.placement.chunk_size);
        let mut report = TickReport::new(cam);

        if self.needs_reclassify || self.camera_chunk != Some(cam) {
            sink.send(StreamEvent::CameraChunkChanged {
                from: self.camera_chunk,
                to: cam,
            });
            self.camera_chunk = Some(cam);
            self.needs_reclassify = false;
            self.active = self.classifier.classify(cam);
            report.reclassified = true;
            self.apply_active_set(now, &mut report, sink);
        }

        self.sweep(now, &mut report, sink);
        self.build_queued(now, &mut report, sink);

        report.queue_len = self.queue_len();
        self.stats.ticks += 1;
        if !report.is_quiet() {
            debug!(
                "Tick at {}: built {}, restored {}, cold {}, discarded {}, units {}, queue {}.",
                cam,
                report.built,
                report.restored,
                report.moved_to_cold,
                report.discarded,
                report.units_consumed,
                report.queue_len
            );
        }
        report
    }

    /// Aggregates hot placements of every active chunk into instance buffers.
    pub fn instances(&self) -> InstanceSet {
        aggregate(
            &self.active,
            &self.cache,
            self.config.placement.rocks.variant_count(),
            &self.config.render,
            &self.config.capacity,
        )
    }

    /// Runs a tick, then aggregates and uploads to `renderer`.
    pub fn frame(
        &mut self,
        camera: Vec3,
        now: f64,
        renderer: &mut dyn RendererSink,
    ) -> TickReport {
        self.frame_with_events(camera, now, renderer, &mut ())
    }

    pub fn frame_with_events(
        &mut self,
        camera: Vec3,
        now: f64,
        renderer: &mut dyn RendererSink,
        sink: &mut dyn EventSink,
    ) -> TickReport {
        let report = self.tick_with_events(camera, now, sink);
        let instances = self.instances();
        if instances.truncated() > 0 {
            sink.send(StreamEvent::Warning {
                context: format!("frame {}", report.camera_chunk),
                message: format!(
                    "{} placements dropped at instance capacity",
                    instances.truncated()
                ),
            });
        }
        instances.upload_to(renderer);
        report
    }

    fn apply_active_set(&mut self, now: f64, report: &mut TickReport, sink: &mut dyn EventSink) {
        for &id in self.active.keys() {
            if self.cache.contains_hot(id) {
                if self.cache.keep(id) {
                    report.kept += 1;
                    sink.send(StreamEvent::ChunkKept { id });
                }
            } else if self.queued.contains(&id) {
                continue;
            } else if self.cache.restore_from_cold(id).is_some() {
                report.restored += 1;
                self.stats.restores += 1;
                sink.send(StreamEvent::ChunkRestored { id });
            } else {
                self.queue.push_back(BuildJob {
                    id,
                    enqueued_at: now,
                });
                self.queued.insert(id);
                report.enqueued += 1;
                sink.send(StreamEvent::ChunkQueued { id });
            }
        }

        let mut departed: Vec<ChunkId> = self
            .cache
            .hot_ids()
            .filter(|id| !self.active.contains_key(id))
            .collect();
        departed.sort_unstable();
        for id in departed {
            if self.cache.mark_leaving(id, now) {
                report.leaving += 1;
                sink.send(StreamEvent::ChunkLeaving { id });
            }
        }
    }

    fn sweep(&mut self, now: f64, report: &mut TickReport, sink: &mut dyn EventSink) {
        let due = match self.last_sweep {
            Some(last) => now - last >= self.config.sweep_interval_seconds,
            None => true,
        };
        if !due {
            return;
        }
        self.last_sweep = Some(now);

        let swept = self.cache.sweep(now);
        report.moved_to_cold += swept.moved_to_cold.len();
        report.discarded += swept.discarded.len();
        self.stats.evictions_to_cold += swept.moved_to_cold.len() as u64;
        self.stats.discards += swept.discarded.len() as u64;
        for id in swept.moved_to_cold {
            sink.send(StreamEvent::ChunkMovedToCold { id });
        }
        for id in swept.discarded {
            sink.send(StreamEvent::ChunkDiscarded { id });
        }
    }

    fn build_queued(&mut self, now: f64, report: &mut TickReport, sink: &mut dyn EventSink) {
        let builder =
            ChunkBuilder::new(&self.config.placement, &self.oracle, self.config.budget_unit);
        let mut remaining = i64::from(self.config.budget_per_frame);

        while remaining > 0 {
            let mut progress = match self.in_progress.take() {
                Some(progress) => progress,
                None => {
                    let Some(job) = self.queue.pop_front() else {
                        break;
                    };
                    if self.cache.contains_hot(job.id) {
                        self.queued.remove(&job.id);
                        continue;
                    }
                    builder.start(job.id)
                }
            };

            let limit = self.config.partial_builds.then_some(remaining as u32);
            let used = builder.resume(&mut progress, limit);
            remaining -= i64::from(used);
            report.units_consumed = report.units_consumed.saturating_add(used);
            self.stats.units_consumed += u64::from(used);

            if !progress.is_complete() {
                self.in_progress = Some(progress);
                break;
            }

            let outcome = progress.into_outcome();
            let id = outcome.record.id;
            self.queued.remove(&id);
            report.built += 1;
            self.stats.builds += 1;

            for r in outcome.reports.iter().filter(|r| r.exhausted) {
                sink.send(StreamEvent::ChunkExhausted { id, report: *r });
            }
            sink.send(StreamEvent::ChunkBuilt {
                id,
                trees: outcome.record.trees.len(),
                rocks: outcome.record.rock_count(),
                units: outcome.units_consumed,
                partial: outcome.record.partial,
            });

            self.cache.insert_hot(Arc::new(outcome.record));
            if !self.active.contains_key(&id) && self.cache.mark_leaving(id, now) {
                report.leaving += 1;
                sink.send(StreamEvent::ChunkLeaving { id });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::aggregate::InstanceKind;
    use crate::stream::config::{
        BudgetUnit, InstanceCapacity, ObjectProfile, RenderPolicy, TierCapacity, TierMask,
    };
    use crate::stream::events::VecSink;
    use crate::stream::placement::Placement;

    fn camera_in(id: ChunkId, chunk_size: f32) -> Vec3 {
        Vec3::new(
            (id.0 as f32 + 0.5) * chunk_size,
            10.0,
            (id.1 as f32 + 0.5) * chunk_size,
        )
    }

    /// Only the camera chunk is active.
    fn single_chunk_config() -> StreamConfig {
        StreamConfig::new(6, 2.0)
            .with_radii(0.0, 0.0, 0.0)
            .with_far_enabled(false)
            .with_retention_seconds(4.0)
            .with_sweep_interval_seconds(0.0)
    }

    fn streamer(config: StreamConfig) -> ChunkStreamer {
        ChunkStreamer::try_new(config, HeightOracle::flat(0.0)).expect("valid config")
    }

    #[test]
    fn rejects_invalid_chunk_size() {
        let result = ChunkStreamer::try_new(
            StreamConfig::default().with_chunk_size(-1.0),
            HeightOracle::flat(0.0),
        );
        assert!(result.is_err());
    }

    #[test]
    fn near_ring_fully_built_after_one_pass() {
        let config = StreamConfig::new(6, 2.0)
            .with_radii(3.0, 3.0, 3.0)
            .with_far_enabled(false)
            .with_trees(ObjectProfile::trees().with_target(14))
            .with_budget(u32::MAX, BudgetUnit::Rays);
        let mut s = streamer(config);
        let origin = ChunkId(0, 0);
        let report = s.tick(camera_in(origin, 2.0), 0.0);

        assert_eq!(report.enqueued, 49);
        assert_eq!(report.built, 49);
        assert_eq!(report.queue_len, 0);

        let mut full = 0;
        for dz in -3..=3 {
            for dx in -3..=3 {
                let id = origin.offset(dx, dz);
                assert_eq!(s.tier_of(id), Tier::Near);
                let record = s.record(id).expect("record for near chunk");
                assert!(record.trees.len() <= 14);
                if record.trees.len() == 14 {
                    full += 1;
                }
            }
        }
        assert!(full >= 45, "only {full} chunks reached the target");
        assert_eq!(s.tier_of(ChunkId(4, 0)), Tier::Off);
        assert!(s.record(ChunkId(4, 0)).is_none());
    }

    #[test]
    fn quick_return_keeps_record_without_rebuild() {
        let mut s = streamer(single_chunk_config());
        let a = ChunkId(0, 0);
        let b = ChunkId(0, 1);

        s.tick(camera_in(a, 2.0), 0.0);
        let before = s.record(a).expect("built").clone();

        let away = s.tick(camera_in(b, 2.0), 1.0);
        assert_eq!(away.leaving, 1);
        assert_eq!(s.state_of(a), ChunkState::Evicting { since: 1.0 });

        let back = s.tick(camera_in(a, 2.0), 2.0);
        assert_eq!(back.kept, 1);
        assert_eq!(back.built, 0);
        let after = s.record(a).expect("still hot");
        assert!(Arc::ptr_eq(&before, after));
        assert_eq!(*before, **after);
        assert_eq!(s.stats().builds, 2);
    }

    #[test]
    fn expired_chunk_goes_cold_and_restores_without_rebuild() {
        let mut s = streamer(single_chunk_config());
        let a = ChunkId(0, 0);
        let b = ChunkId(3, 0);

        s.tick(camera_in(a, 2.0), 0.0);
        let before = s.record(a).expect("built").clone();

        s.tick(camera_in(b, 2.0), 1.0);
        let report = s.tick(camera_in(b, 2.0), 5.0);
        assert_eq!(report.moved_to_cold, 1);
        assert!(s.record(a).is_none());
        assert_eq!(s.state_of(a), ChunkState::Cold);

        let back = s.tick(camera_in(a, 2.0), 6.0);
        assert_eq!(back.restored, 1);
        assert_eq!(back.built, 0);
        assert!(Arc::ptr_eq(&before, s.record(a).expect("restored")));
        assert_eq!(s.stats().builds, 2);
        assert_eq!(s.stats().restores, 1);
    }

    #[test]
    fn discard_policy_rebuilds_identical_content() {
        let config = single_chunk_config().with_cold_retention_seconds(Some(0.0));
        let mut s = streamer(config);
        let a = ChunkId(-2, 5);
        let b = ChunkId(-2, 7);

        s.tick(camera_in(a, 2.0), 0.0);
        let before = s.record(a).expect("built").clone();
        s.tick(camera_in(b, 2.0), 1.0);
        let report = s.tick(camera_in(b, 2.0), 10.0);
        assert_eq!(report.discarded, 1);
        assert_eq!(s.state_of(a), ChunkState::Unbuilt);

        let back = s.tick(camera_in(a, 2.0), 11.0);
        assert_eq!(back.built, 1);
        let after = s.record(a).expect("rebuilt");
        assert!(!Arc::ptr_eq(&before, after));
        assert_eq!(*before, **after);
    }

    #[test]
    fn budget_amortizes_builds_over_ticks() {
        let config = StreamConfig::new(6, 2.0)
            .with_radii(2.0, 2.0, 2.0)
            .with_far_enabled(false)
            .with_budget(40, BudgetUnit::Rays);
        let mut s = streamer(config);
        let cam = camera_in(ChunkId(0, 0), 2.0);

        let first = s.tick(cam, 0.0);
        assert_eq!(first.enqueued, 25);
        assert!(first.built < 25);
        assert!(first.queue_len > 0);

        let mut ticks = 1;
        let mut t = 0.0;
        while s.queue_len() > 0 {
            t += 0.016;
            let report = s.tick(cam, t);
            assert!(report.built >= 1);
            for id in s.queued_ids() {
                assert!(s.cache().hot(id).is_none());
            }
            ticks += 1;
            assert!(ticks < 100, "queue never drained");
        }
        assert_eq!(s.stats().builds, 25);
        assert_eq!(s.cache().hot_len(), 25);
    }

    #[test]
    fn partial_builds_resume_to_identical_content() {
        let config = StreamConfig::new(6, 2.0)
            .with_radii(1.0, 1.0, 1.0)
            .with_far_enabled(false)
            .with_budget(9, BudgetUnit::Attempts)
            .with_partial_builds(true);
        let mut s = streamer(config);
        let cam = camera_in(ChunkId(0, 0), 2.0);

        let first = s.tick(cam, 0.0);
        assert_eq!(first.units_consumed, 9);
        assert_eq!(first.built, 0);
        let paused = s.queued_ids().next().expect("paused build");
        assert_eq!(s.state_of(paused), ChunkState::Queued);
        assert!(s.record(paused).is_none());

        let mut t = 0.0;
        while s.queue_len() > 0 {
            t += 0.016;
            let report = s.tick(cam, t);
            assert!(report.units_consumed <= 9);
            for id in s.queued_ids() {
                assert!(s.cache().hot(id).is_none());
            }
            assert!(t < 100.0, "queue never drained");
        }

        assert_eq!(s.stats().builds, 9);
        for &id in s.active_tiers().keys() {
            let streamed = s.record(id).expect("built");
            let direct = s.build_uncached(id).record;
            assert!(!streamed.partial);
            assert_eq!(**streamed, direct, "chunk {id} differs from a one-shot build");
        }
    }

    #[test]
    fn paused_build_is_dropped_on_placement_change() {
        let config = single_chunk_config()
            .with_budget(3, BudgetUnit::Rays)
            .with_partial_builds(true);
        let mut s = streamer(config.clone());
        let cam = camera_in(ChunkId(0, 0), 2.0);
        s.tick(cam, 0.0);
        assert_eq!(s.queue_len(), 1);

        s.set_config(config.with_seed(7)).expect("valid");
        assert_eq!(s.queue_len(), 0);
        assert_eq!(s.state_of(ChunkId(0, 0)), ChunkState::Unbuilt);
    }

    #[test]
    fn single_ray_budget_still_builds_one_chunk_per_tick() {
        let config = single_chunk_config().with_budget(1, BudgetUnit::Rays);
        let mut s = streamer(config);
        let a = ChunkId(0, 0);
        let b = ChunkId(5, 5);

        // Builds run to completion even when they overdraw the budget.
        let mut sink = VecSink::new();
        s.tick_with_events(camera_in(a, 2.0), 0.0, &mut sink);
        assert!(s.record(a).is_some());
        s.tick(camera_in(b, 2.0), 0.1);
        assert!(s.record(b).is_some());
        assert_eq!(s.state_of(a), ChunkState::Evicting { since: 0.1 });

        let events = sink.into_inner();
        assert!(matches!(events[0], StreamEvent::CameraChunkChanged { from: None, .. }));
        assert!(events.contains(&StreamEvent::ChunkQueued { id: a }));
    }

    #[test]
    fn job_leaving_before_build_is_marked_on_completion() {
        let config = StreamConfig::new(6, 2.0)
            .with_radii(1.0, 1.0, 1.0)
            .with_far_enabled(false)
            .with_budget(1, BudgetUnit::Rays)
            .with_retention_seconds(100.0);
        let mut s = streamer(config);

        s.tick(camera_in(ChunkId(0, 0), 2.0), 0.0);
        assert!(s.queue_len() > 0);
        let pending: Vec<ChunkId> = s.queued_ids().collect();

        let far_away = ChunkId(50, 50);
        s.tick(camera_in(far_away, 2.0), 1.0);
        let mut t = 1.0;
        while pending.iter().any(|id| s.state_of(*id) == ChunkState::Queued) {
            t += 0.1;
            s.tick(camera_in(far_away, 2.0), t);
        }
        for id in pending {
            assert!(matches!(s.state_of(id), ChunkState::Evicting { .. }));
        }
    }

    #[test]
    fn radii_change_reclassifies_without_rebuilding() {
        let config = StreamConfig::new(6, 2.0)
            .with_radii(1.0, 1.0, 1.0)
            .with_far_enabled(false)
            .with_budget(u32::MAX, BudgetUnit::Rays);
        let mut s = streamer(config.clone());
        let cam = camera_in(ChunkId(0, 0), 2.0);
        s.tick(cam, 0.0);
        let centre = s.record(ChunkId(0, 0)).expect("built").clone();

        s.set_config(config.clone().with_radii(0.0, 2.0, 2.0)).expect("valid");
        let report = s.tick(cam, 0.1);
        assert!(report.reclassified);
        assert_eq!(report.enqueued, 16);
        assert_eq!(s.tier_of(ChunkId(1, 1)), Tier::Mid);
        assert!(Arc::ptr_eq(&centre, s.record(ChunkId(0, 0)).expect("kept")));

        s.set_config(config.with_seed(99)).expect("valid");
        assert_eq!(s.cache().hot_len(), 0);
        let report = s.tick(cam, 0.2);
        assert_eq!(report.built, 9);
        assert_ne!(*centre, **s.record(ChunkId(0, 0)).expect("rebuilt"));
    }

    #[test]
    fn frame_uploads_rendered_tiers() {
        struct Counts(Vec<(Tier, InstanceKind, usize)>);
        impl RendererSink for Counts {
            fn upload(&mut self, tier: Tier, kind: InstanceKind, placements: &[Placement]) {
                self.0.push((tier, kind, placements.len()));
            }
        }

        let config = StreamConfig::new(6, 2.0)
            .with_radii(0.0, 1.0, 2.0)
            .with_budget(u32::MAX, BudgetUnit::Rays)
            .with_render_policy(RenderPolicy {
                trees: TierMask::ALL,
                rocks: TierMask::NONE,
            });
        let mut s = streamer(config);
        let mut renderer = Counts(Vec::new());
        s.frame(camera_in(ChunkId(0, 0), 2.0), 0.0, &mut renderer);

        assert_eq!(renderer.0.len(), 3);
        let near = renderer.0[0];
        assert_eq!(near.0, Tier::Near);
        assert_eq!(near.2, s.record(ChunkId(0, 0)).expect("built").trees.len());

        let expected_far: usize = s
            .active_tiers()
            .iter()
            .filter(|(_, t)| **t == Tier::Far)
            .map(|(id, _)| s.record(*id).expect("built").trees.len())
            .sum();
        assert_eq!(renderer.0[2], (Tier::Far, InstanceKind::Tree, expected_far));
    }

    #[test]
    fn truncation_is_reported_as_warning() {
        let mut capacity = InstanceCapacity::default();
        capacity.near = TierCapacity::new(5, 0);
        let config = single_chunk_config()
            .with_budget(u32::MAX, BudgetUnit::Rays)
            .with_capacity(capacity);
        let mut s = streamer(config);
        let mut sink = VecSink::new();
        s.frame_with_events(camera_in(ChunkId(0, 0), 2.0), 0.0, &mut (), &mut sink);

        let trees = s.record(ChunkId(0, 0)).expect("built").trees.len();
        assert!(trees > 5);
        assert_eq!(s.instances().get(Tier::Near, InstanceKind::Tree).len(), 5);
        assert!(sink
            .as_slice()
            .iter()
            .any(|e| matches!(e, StreamEvent::Warning { .. })));
    }

    #[test]
    fn distant_camera_saturates_instead_of_overflowing() {
        let config = StreamConfig::new(6, 2.0)
            .with_radii(1.0, 2.0, 2.0)
            .with_budget(u32::MAX, BudgetUnit::Rays);
        let mut s = streamer(config);

        let report = s.tick(Vec3::new(1.0e10, 0.0, -1.0e10), 0.0);
        let edge = ChunkId(i32::MAX, i32::MIN);
        assert_eq!(report.camera_chunk, edge);
        assert_eq!(s.tier_of(edge), Tier::Near);
        assert_eq!(report.queue_len, 0);
        for &id in s.active_tiers().keys() {
            assert!(id.0 >= i32::MAX - 2 && id.1 <= i32::MIN + 2);
        }

        let back = s.tick(Vec3::new(1.0, 0.0, 1.0), 1.0);
        assert_eq!(back.camera_chunk, ChunkId(0, 0));
        assert_eq!(s.tier_of(ChunkId(0, 0)), Tier::Near);
    }

    #[test]
    fn sweep_waits_for_its_interval() {
        let config = StreamConfig::new(6, 2.0)
            .with_radii(0.0, 0.0, 0.0)
            .with_far_enabled(false)
            .with_retention_seconds(4.0);
        assert_eq!(config.sweep_interval_seconds, 0.5);
        let mut s = streamer(config);
        let a = ChunkId(0, 0);
        let b = ChunkId(4, 0);

        s.tick(camera_in(a, 2.0), 0.0);
        s.tick(camera_in(b, 2.0), 0.5);
        assert_eq!(s.state_of(a), ChunkState::Evicting { since: 0.5 });

        // Swept, but retention has not run out yet.
        let early = s.tick(camera_in(b, 2.0), 4.3);
        assert_eq!(early.moved_to_cold, 0);

        // Retention ran out at 4.5, the next sweep is not due until 4.8.
        let waiting = s.tick(camera_in(b, 2.0), 4.6);
        assert_eq!(waiting.moved_to_cold, 0);
        assert!(s.record(a).is_some());
        assert_eq!(s.state_of(a), ChunkState::Evicting { since: 0.5 });

        let due = s.tick(camera_in(b, 2.0), 4.9);
        assert_eq!(due.moved_to_cold, 1);
        assert!(s.record(a).is_none());
        assert_eq!(s.state_of(a), ChunkState::Cold);
    }

    #[test]
    fn stationary_camera_does_not_reclassify() {
        let mut s = streamer(single_chunk_config());
        let cam = camera_in(ChunkId(2, 2), 2.0);
        assert!(s.tick(cam, 0.0).reclassified);
        let again = s.tick(cam + Vec3::new(0.3, 0.0, -0.3), 0.1);
        assert!(!again.reclassified);
        assert_eq!(again.built, 0);
    }
}
