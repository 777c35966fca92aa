//! Deterministic, resumable chunk builder.
//!
//! Each category draws candidates from its own [`Mulberry32`] sub-stream seeded
//! from the chunk coordinate, rejects them against the exclusion zone and an
//! [`OccupancyGrid`], then asks the [`HeightOracle`] for ground height. A
//! category stops at its target count or its attempt cap.
//!
//! Work is metered by a budget. When it runs dry the build pauses inside a
//! [`BuildProgress`]; resuming continues the same draw sequence, so a chunk
//! built in several slices is identical to one built in a single call.
use glam::{Vec2, Vec3};
use tracing::debug;

use crate::height::HeightOracle;
use crate::sampling::{rand01, Mulberry32, OccupancyGrid};
use crate::stream::chunk::{chunk_bounds, seed_for_chunk, seed_for_stream, ChunkId};
use crate::stream::config::{BudgetUnit, MissingHeight, ObjectProfile, PlacementConfig};
use crate::stream::placement::{ChunkRecord, Placement};
use crate::stream::Category;

/// Outcome of scattering one category into one chunk.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CategoryReport {
    pub category: Category,
    pub target: u32,
    pub placed: u32,
    pub attempts: u64,
    /// Height oracle queries issued.
    pub rays: u64,
    /// Stopped on the attempt cap before reaching the target.
    pub exhausted: bool,
    /// Paused because the budget ran out.
    pub budget_hit: bool,
}

impl CategoryReport {
    fn new(category: Category, target: u32) -> Self {
        Self {
            category,
            target,
            placed: 0,
            attempts: 0,
            rays: 0,
            exhausted: false,
            budget_hit: false,
        }
    }
}

/// Result of a finished (or abandoned) build.
#[derive(Clone, Debug)]
pub struct BuildOutcome {
    pub record: ChunkRecord,
    /// Budget units spent over the whole build, in the builder's [`BudgetUnit`].
    pub units_consumed: u32,
    pub reports: Vec<CategoryReport>,
}

impl BuildOutcome {
    pub fn report(&self, category: Category) -> Option<&CategoryReport> {
        self.reports.iter().find(|r| r.category == category)
    }
}

struct Budget {
    remaining: Option<u32>,
    consumed: u32,
}

impl Budget {
    fn new(limit: Option<u32>) -> Self {
        Self {
            remaining: limit,
            consumed: 0,
        }
    }

    fn is_spent(&self) -> bool {
        self.remaining == Some(0)
    }

    fn take(&mut self) {
        if let Some(r) = self.remaining.as_mut() {
            *r = r.saturating_sub(1);
        }
        self.consumed = self.consumed.saturating_add(1);
    }
}

/// A drawn candidate that passed rejection and still needs its height query.
#[derive(Clone, Copy, Debug)]
struct Candidate {
    x: f32,
    z: f32,
    scale: f32,
    rotation_y: f32,
    rotation_x: f32,
    variant: usize,
    radius: f32,
}

#[derive(Debug)]
struct CategoryState {
    rng: Mulberry32,
    occupancy: OccupancyGrid,
    min: Vec2,
    extent: Vec2,
    report: CategoryReport,
    pending: Option<Candidate>,
    done: bool,
}

/// Suspended state of a chunk build.
#[derive(Debug)]
pub struct BuildProgress {
    record: ChunkRecord,
    categories: Vec<CategoryState>,
    units_consumed: u32,
}

impl BuildProgress {
    pub fn id(&self) -> ChunkId {
        self.record.id
    }

    pub fn is_complete(&self) -> bool {
        self.categories.iter().all(|c| c.done)
    }

    /// Units spent so far across every slice.
    pub fn units_consumed(&self) -> u32 {
        self.units_consumed
    }

    /// Placements made so far.
    pub fn record(&self) -> &ChunkRecord {
        &self.record
    }

    /// Finalises the record. An incomplete build yields a record flagged `partial`.
    pub fn into_outcome(self) -> BuildOutcome {
        let partial = !self.is_complete();
        let mut record = self.record;
        record.built = true;
        record.partial = partial;
        BuildOutcome {
            record,
            units_consumed: self.units_consumed,
            reports: self.categories.iter().map(|c| c.report).collect(),
        }
    }
}

/// Synthesizes chunk contents from a placement configuration and a height oracle.
pub struct ChunkBuilder<'a> {
    config: &'a PlacementConfig,
    oracle: &'a HeightOracle,
    unit: BudgetUnit,
}

impl<'a> ChunkBuilder<'a> {
    pub fn new(config: &'a PlacementConfig, oracle: &'a HeightOracle, unit: BudgetUnit) -> Self {
        debug_assert!(config.chunk_size > 0.0, "chunk_size must be > 0");
        Self {
            config,
            oracle,
            unit,
        }
    }

    /// Builds chunk `id` in one call. `budget` caps the units spent; `None`
    /// runs every category to its target or attempt cap.
    pub fn build(&self, id: ChunkId, budget: Option<u32>) -> BuildOutcome {
        let mut progress = self.start(id);
        self.resume(&mut progress, budget);
        progress.into_outcome()
    }

    /// Prepares a build of chunk `id` without spending any budget.
    pub fn start(&self, id: ChunkId) -> BuildProgress {
        let chunk_seed = seed_for_chunk(self.config.seed, id);
        let categories = Category::ALL
            .iter()
            .map(|&category| self.category_state(id, chunk_seed, category))
            .collect();
        BuildProgress {
            record: ChunkRecord::empty(id, self.config.rocks.variant_count()),
            categories,
            units_consumed: 0,
        }
    }

    /// Continues `progress` with at most `budget` units and returns the units spent.
    pub fn resume(&self, progress: &mut BuildProgress, budget: Option<u32>) -> u32 {
        let mut budget = Budget::new(budget);
        let id = progress.record.id;
        for state in progress.categories.iter_mut().filter(|c| !c.done) {
            self.advance(id, state, &mut budget, &mut progress.record);
            if !state.done {
                break;
            }
        }
        progress.units_consumed = progress.units_consumed.saturating_add(budget.consumed);
        budget.consumed
    }

    fn category_state(&self, id: ChunkId, chunk_seed: u32, category: Category) -> CategoryState {
        let profile = self.config.profile(category);
        let mut report = CategoryReport::new(category, profile.target_per_chunk);

        let (mut min, mut max) = chunk_bounds(id, self.config.chunk_size);
        if self.config.seam_spacing {
            let inset = profile.max_radius();
            min += inset;
            max -= inset;
        }
        let degenerate = min.x >= max.x || min.y >= max.y;
        if degenerate && profile.target_per_chunk > 0 {
            report.exhausted = true;
        }

        CategoryState {
            rng: Mulberry32::new(seed_for_stream(chunk_seed, category.stream_index())),
            occupancy: OccupancyGrid::for_max_radius(profile.max_radius()),
            min,
            extent: max - min,
            report,
            pending: None,
            done: degenerate || profile.target_per_chunk == 0,
        }
    }

    fn advance(
        &self,
        id: ChunkId,
        state: &mut CategoryState,
        budget: &mut Budget,
        record: &mut ChunkRecord,
    ) {
        let category = state.report.category;
        let profile = self.config.profile(category);
        let max_attempts = profile.max_attempts();
        state.report.budget_hit = false;

        loop {
            let candidate = match state.pending.take() {
                Some(candidate) => candidate,
                None => {
                    if state.report.placed >= profile.target_per_chunk {
                        state.done = true;
                        return;
                    }
                    if state.report.attempts >= max_attempts {
                        state.report.exhausted = true;
                        state.done = true;
                        debug!(
                            "Chunk {} {:?}: placed {}/{} after {} attempts.",
                            id,
                            category,
                            state.report.placed,
                            state.report.target,
                            state.report.attempts
                        );
                        return;
                    }
                    if budget.is_spent() {
                        state.report.budget_hit = true;
                        return;
                    }
                    state.report.attempts += 1;
                    if self.unit == BudgetUnit::Attempts {
                        budget.take();
                    }

                    let candidate = draw(&mut state.rng, profile, state.min, state.extent);
                    let pad = profile.exclusion_pad * candidate.scale;
                    if let Some(zone) = &self.config.exclusion_zone {
                        if zone.contains(candidate.x, candidate.z, pad) {
                            continue;
                        }
                    }
                    if !state.occupancy.can_place(candidate.x, candidate.z, candidate.radius) {
                        continue;
                    }
                    candidate
                }
            };

            if self.unit == BudgetUnit::Rays {
                if budget.is_spent() {
                    state.pending = Some(candidate);
                    state.report.budget_hit = true;
                    return;
                }
                budget.take();
            }
            state.report.rays += 1;

            let sampled = self.oracle.sample(candidate.x, candidate.z);
            let ground = match (sampled, self.config.missing_height) {
                (Some(y), _) => y,
                (None, MissingHeight::Substitute(y)) => y,
                (None, MissingHeight::Skip) => continue,
            };

            state.occupancy.add(candidate.x, candidate.z, candidate.radius);
            let placement = Placement {
                position: Vec3::new(
                    candidate.x,
                    ground - profile.vertical_offset(candidate.variant, candidate.scale),
                    candidate.z,
                ),
                rotation_y: candidate.rotation_y,
                rotation_x: candidate.rotation_x,
                scale: candidate.scale,
                variant: candidate.variant,
            };
            match category {
                Category::Tree => record.trees.push(placement),
                Category::Rock => record.rocks_by_variant[candidate.variant].push(placement),
            }
            state.report.placed += 1;
        }
    }
}

/// Draws one candidate. The six draws always happen in this order so the stream
/// stays aligned whether or not the candidate is rejected.
fn draw(rng: &mut Mulberry32, profile: &ObjectProfile, min: Vec2, extent: Vec2) -> Candidate {
    let variants = profile.variant_count();
    let x = min.x + rand01(rng) * extent.x;
    let z = min.y + rand01(rng) * extent.y;
    let scale = profile.scale_range.lerp(rand01(rng));
    let rotation_y = rand01(rng) * std::f32::consts::TAU;
    let rotation_x = (rand01(rng) * 2.0 - 1.0) * profile.tilt_jitter;
    let variant = ((rand01(rng) * variants as f32) as usize).min(variants - 1);
    Candidate {
        x,
        z,
        scale,
        rotation_y,
        rotation_x,
        variant,
        radius: profile.radius_for_scale(scale),
    }
}
