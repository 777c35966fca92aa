//! Configuration for placement and streaming.
//!
//! [`StreamConfig`] is split into [`PlacementConfig`] (anything that changes what a
//! chunk contains) and streaming knobs (rings, budgets, retention, rendering).
//! Inconsistent values are repaired by [`StreamConfig::normalized`]; only values that
//! cannot be repaired fail [`StreamConfig::validate`].
use tracing::warn;

use crate::error::{Error, Result};
use crate::stream::{Category, Tier};

/// Inclusive-exclusive range `[min, max)` for uniform scale draws.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScaleRange {
    pub min: f32,
    pub max: f32,
}

impl ScaleRange {
    pub fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// Maps `u` in `[0, 1)` into the range.
    pub fn lerp(&self, u: f32) -> f32 {
        self.min + (self.max - self.min) * u
    }
}

/// Axis-aligned rectangle in the xz plane where nothing may be placed,
/// e.g. a building footprint.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ExclusionZone {
    pub center_x: f32,
    pub center_z: f32,
    pub width: f32,
    pub depth: f32,
}

impl ExclusionZone {
    pub fn new(center_x: f32, center_z: f32, width: f32, depth: f32) -> Self {
        Self {
            center_x,
            center_z,
            width,
            depth,
        }
    }

    /// True when `(x, z)` lies inside the rectangle grown by `pad` on every side.
    pub fn contains(&self, x: f32, z: f32, pad: f32) -> bool {
        let half_w = self.width * 0.5 + pad;
        let half_d = self.depth * 0.5 + pad;
        (x - self.center_x).abs() <= half_w && (z - self.center_z).abs() <= half_d
    }
}

/// How the occupancy radius of a placement is derived.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SpacingMode {
    /// Every instance claims `min_spacing / 2`.
    Fixed,
    /// Instances claim `min_spacing / 2 * scale`.
    ScaledByScale,
}

/// What to do when the height oracle has no answer for a candidate.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MissingHeight {
    /// Discard the candidate.
    Skip,
    /// Place at this height instead.
    Substitute(f32),
}

/// Placement parameters for one object category.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ObjectProfile {
    /// Number of placements attempted per chunk.
    pub target_per_chunk: u32,
    /// Minimum centre-to-centre distance between two unit-scale instances.
    pub min_spacing: f32,
    pub spacing_mode: SpacingMode,
    pub scale_range: ScaleRange,
    /// Exclusion zone padding per unit of instance scale.
    pub exclusion_pad: f32,
    /// Attempt cap is `target_per_chunk * max_attempt_multiplier`.
    pub max_attempt_multiplier: u32,
    /// Model-space bounding-box bottom (min y) for each interchangeable variant.
    /// Empty means a single variant whose bottom sits at its origin.
    pub variant_bottoms: Vec<f32>,
    /// Extra distance pushed into the ground after bottom alignment.
    pub sink: f32,
    /// Maximum absolute rotation around X in radians.
    pub tilt_jitter: f32,
}

impl ObjectProfile {
    pub fn new(target_per_chunk: u32, min_spacing: f32, scale_range: ScaleRange) -> Self {
        Self {
            target_per_chunk,
            min_spacing,
            spacing_mode: SpacingMode::Fixed,
            scale_range,
            exclusion_pad: 0.0,
            max_attempt_multiplier: DEFAULT_MAX_ATTEMPT_MULTIPLIER,
            variant_bottoms: Vec::new(),
            sink: 0.0,
            tilt_jitter: 0.0,
        }
    }

    /// Default tree profile: upright, uniform scale, single variant.
    pub fn trees() -> Self {
        Self::new(14, 0.35, ScaleRange::new(0.8, 1.3))
            .with_exclusion_pad(0.4)
            .with_sink(0.05)
    }

    /// Default rock profile: three variants with slight tilt.
    pub fn rocks() -> Self {
        Self::new(6, 0.35, ScaleRange::new(0.25, 0.7))
            .with_spacing_mode(SpacingMode::ScaledByScale)
            .with_exclusion_pad(0.2)
            .with_variant_bottoms(vec![-0.2, -0.15, -0.3])
            .with_sink(0.03)
            .with_tilt_jitter(0.15)
    }

    pub fn with_target(mut self, target_per_chunk: u32) -> Self {
        self.target_per_chunk = target_per_chunk;
        self
    }

    pub fn with_min_spacing(mut self, min_spacing: f32) -> Self {
        self.min_spacing = min_spacing;
        self
    }

    pub fn with_spacing_mode(mut self, spacing_mode: SpacingMode) -> Self {
        self.spacing_mode = spacing_mode;
        self
    }

    pub fn with_scale_range(mut self, scale_range: ScaleRange) -> Self {
        self.scale_range = scale_range;
        self
    }

    pub fn with_exclusion_pad(mut self, exclusion_pad: f32) -> Self {
        self.exclusion_pad = exclusion_pad;
        self
    }

    pub fn with_max_attempt_multiplier(mut self, multiplier: u32) -> Self {
        self.max_attempt_multiplier = multiplier;
        self
    }

    pub fn with_variant_bottoms(mut self, bottoms: Vec<f32>) -> Self {
        self.variant_bottoms = bottoms;
        self
    }

    pub fn with_sink(mut self, sink: f32) -> Self {
        self.sink = sink;
        self
    }

    pub fn with_tilt_jitter(mut self, tilt_jitter: f32) -> Self {
        self.tilt_jitter = tilt_jitter;
        self
    }

    pub fn variant_count(&self) -> usize {
        self.variant_bottoms.len().max(1)
    }

    pub fn max_attempts(&self) -> u64 {
        self.target_per_chunk as u64 * self.max_attempt_multiplier.max(1) as u64
    }

    /// Occupancy radius claimed by an instance of the given scale.
    pub fn radius_for_scale(&self, scale: f32) -> f32 {
        let base = self.min_spacing * 0.5;
        match self.spacing_mode {
            SpacingMode::Fixed => base,
            SpacingMode::ScaledByScale => base * scale,
        }
    }

    /// Largest radius any instance of this profile can claim.
    pub fn max_radius(&self) -> f32 {
        self.radius_for_scale(self.scale_range.max.max(self.scale_range.min))
    }

    /// Vertical offset subtracted from the ground height for a variant at a scale.
    pub fn vertical_offset(&self, variant: usize, scale: f32) -> f32 {
        let bottom = self.variant_bottoms.get(variant).copied().unwrap_or(0.0);
        bottom * scale + self.sink
    }
}

pub const DEFAULT_MAX_ATTEMPT_MULTIPLIER: u32 = 40;

/// Everything that determines the content of a chunk.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PlacementConfig {
    pub seed: u32,
    /// Chunk edge length in world units.
    pub chunk_size: f32,
    pub trees: ObjectProfile,
    pub rocks: ObjectProfile,
    pub exclusion_zone: Option<ExclusionZone>,
    pub missing_height: MissingHeight,
    /// Keep candidates one radius away from chunk edges so spacing holds across seams.
    pub seam_spacing: bool,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            seed: 6,
            chunk_size: 2.0,
            trees: ObjectProfile::trees(),
            rocks: ObjectProfile::rocks(),
            exclusion_zone: None,
            missing_height: MissingHeight::Skip,
            seam_spacing: false,
        }
    }
}

impl PlacementConfig {
    pub fn profile(&self, category: Category) -> &ObjectProfile {
        match category {
            Category::Tree => &self.trees,
            Category::Rock => &self.rocks,
        }
    }
}

/// Ring radii in chunk units, `near <= mid <= view` after normalisation.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TierRadii {
    pub near: f32,
    pub mid: f32,
    pub view: f32,
}

impl TierRadii {
    pub fn new(near: f32, mid: f32, view: f32) -> Self {
        Self { near, mid, view }
    }

    /// Clamps so that `0 <= near <= mid <= view`.
    pub fn normalized(&self) -> Self {
        let near = self.near.max(0.0);
        let mid = self.mid.max(near);
        let view = self.view.max(mid);
        Self { near, mid, view }
    }
}

impl Default for TierRadii {
    fn default() -> Self {
        Self::new(3.0, 5.0, 8.0)
    }
}

/// Distance measure between the camera chunk and another chunk.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DistanceMetric {
    /// Square rings: `max(|dx|, |dz|)`.
    Chebyshev,
    /// Round rings: distance between chunk centres.
    Euclidean,
}

/// Unit the per-frame budget is counted in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BudgetUnit {
    /// Height oracle queries.
    Rays,
    /// Candidate positions drawn.
    Attempts,
}

/// Which of the rendering tiers a category is drawn in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TierMask {
    pub near: bool,
    pub mid: bool,
    pub far: bool,
}

impl TierMask {
    pub const NONE: TierMask = TierMask::new(false, false, false);
    pub const NEAR: TierMask = TierMask::new(true, false, false);
    pub const NEAR_MID: TierMask = TierMask::new(true, true, false);
    pub const ALL: TierMask = TierMask::new(true, true, true);

    pub const fn new(near: bool, mid: bool, far: bool) -> Self {
        Self { near, mid, far }
    }

    pub fn contains(&self, tier: Tier) -> bool {
        match tier {
            Tier::Near => self.near,
            Tier::Mid => self.mid,
            Tier::Far => self.far,
            Tier::Off => false,
        }
    }
}

/// Tiers in which each category is handed to the renderer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RenderPolicy {
    pub trees: TierMask,
    pub rocks: TierMask,
}

impl RenderPolicy {
    pub fn renders(&self, tier: Tier, category: Category) -> bool {
        match category {
            Category::Tree => self.trees.contains(tier),
            Category::Rock => self.rocks.contains(tier),
        }
    }
}

impl Default for RenderPolicy {
    fn default() -> Self {
        Self {
            trees: TierMask::NEAR_MID,
            rocks: TierMask::NEAR,
        }
    }
}

/// Instance buffer ceilings for one tier.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TierCapacity {
    pub trees: usize,
    /// Ceiling for each rock variant buffer.
    pub rocks: usize,
}

impl TierCapacity {
    pub fn new(trees: usize, rocks: usize) -> Self {
        Self { trees, rocks }
    }

    pub fn for_category(&self, category: Category) -> usize {
        match category {
            Category::Tree => self.trees,
            Category::Rock => self.rocks,
        }
    }
}

/// Instance buffer ceilings for every rendered tier.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct InstanceCapacity {
    pub near: TierCapacity,
    pub mid: TierCapacity,
    pub far: TierCapacity,
}

impl InstanceCapacity {
    pub fn get(&self, tier: Tier, category: Category) -> usize {
        match tier {
            Tier::Near => self.near.for_category(category),
            Tier::Mid => self.mid.for_category(category),
            Tier::Far => self.far.for_category(category),
            Tier::Off => 0,
        }
    }
}

impl Default for InstanceCapacity {
    fn default() -> Self {
        Self {
            near: TierCapacity::new(4096, 2048),
            mid: TierCapacity::new(8192, 2048),
            far: TierCapacity::new(16384, 2048),
        }
    }
}

/// Full configuration of a chunk streamer.
#[non_exhaustive]
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StreamConfig {
    pub placement: PlacementConfig,
    pub radii: TierRadii,
    pub metric: DistanceMetric,
    /// When false, everything beyond the mid ring is `Off`.
    pub far_enabled: bool,
    pub budget_per_frame: u32,
    pub budget_unit: BudgetUnit,
    /// Hand builds the remaining frame budget and accept partial chunks.
    pub partial_builds: bool,
    /// Seconds a chunk stays hot after leaving every active ring.
    pub retention_seconds: f64,
    /// Seconds an evicted chunk stays in cold storage. `None` keeps it until
    /// capacity pressure; `Some(0.0)` discards on eviction.
    pub cold_retention_seconds: Option<f64>,
    /// Maximum number of cold records.
    pub cold_capacity: usize,
    /// Minimum seconds between eviction sweeps. `0` sweeps every tick.
    pub sweep_interval_seconds: f64,
    pub render: RenderPolicy,
    pub capacity: InstanceCapacity,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            placement: PlacementConfig::default(),
            radii: TierRadii::default(),
            metric: DistanceMetric::Chebyshev,
            far_enabled: true,
            budget_per_frame: 600,
            budget_unit: BudgetUnit::Rays,
            partial_builds: false,
            retention_seconds: 8.0,
            cold_retention_seconds: None,
            cold_capacity: 256,
            sweep_interval_seconds: 0.5,
            render: RenderPolicy::default(),
            capacity: InstanceCapacity::default(),
        }
    }
}

impl StreamConfig {
    pub fn new(seed: u32, chunk_size: f32) -> Self {
        let mut config = Self::default();
        config.placement.seed = seed;
        config.placement.chunk_size = chunk_size;
        config
    }

    pub fn with_seed(mut self, seed: u32) -> Self {
        self.placement.seed = seed;
        self
    }

    pub fn with_chunk_size(mut self, chunk_size: f32) -> Self {
        self.placement.chunk_size = chunk_size;
        self
    }

    pub fn with_trees(mut self, trees: ObjectProfile) -> Self {
        self.placement.trees = trees;
        self
    }

    pub fn with_rocks(mut self, rocks: ObjectProfile) -> Self {
        self.placement.rocks = rocks;
        self
    }

    pub fn with_exclusion_zone(mut self, zone: ExclusionZone) -> Self {
        self.placement.exclusion_zone = Some(zone);
        self
    }

    pub fn with_missing_height(mut self, policy: MissingHeight) -> Self {
        self.placement.missing_height = policy;
        self
    }

    pub fn with_seam_spacing(mut self, seam_spacing: bool) -> Self {
        self.placement.seam_spacing = seam_spacing;
        self
    }

    pub fn with_radii(mut self, near: f32, mid: f32, view: f32) -> Self {
        self.radii = TierRadii::new(near, mid, view);
        self
    }

    pub fn with_metric(mut self, metric: DistanceMetric) -> Self {
        self.metric = metric;
        self
    }

    pub fn with_far_enabled(mut self, far_enabled: bool) -> Self {
        self.far_enabled = far_enabled;
        self
    }

    pub fn with_budget(mut self, budget_per_frame: u32, unit: BudgetUnit) -> Self {
        self.budget_per_frame = budget_per_frame;
        self.budget_unit = unit;
        self
    }

    pub fn with_partial_builds(mut self, partial_builds: bool) -> Self {
        self.partial_builds = partial_builds;
        self
    }

    pub fn with_retention_seconds(mut self, retention_seconds: f64) -> Self {
        self.retention_seconds = retention_seconds;
        self
    }

    pub fn with_cold_retention_seconds(mut self, seconds: Option<f64>) -> Self {
        self.cold_retention_seconds = seconds;
        self
    }

    pub fn with_cold_capacity(mut self, cold_capacity: usize) -> Self {
        self.cold_capacity = cold_capacity;
        self
    }

    pub fn with_sweep_interval_seconds(mut self, seconds: f64) -> Self {
        self.sweep_interval_seconds = seconds;
        self
    }

    pub fn with_render_policy(mut self, render: RenderPolicy) -> Self {
        self.render = render;
        self
    }

    pub fn with_capacity(mut self, capacity: InstanceCapacity) -> Self {
        self.capacity = capacity;
        self
    }

    /// Checks the values that cannot be repaired by [`StreamConfig::normalized`].
    pub fn validate(&self) -> Result<()> {
        let p = &self.placement;
        if !p.chunk_size.is_finite() || p.chunk_size <= 0.0 {
            return Err(Error::InvalidConfig(format!(
                "chunk_size must be finite and > 0 (got {})",
                p.chunk_size
            )));
        }
        let r = &self.radii;
        if !(r.near.is_finite() && r.mid.is_finite() && r.view.is_finite()) {
            return Err(Error::InvalidConfig("tier radii must be finite".into()));
        }
        for (name, profile) in [("trees", &p.trees), ("rocks", &p.rocks)] {
            if !profile.min_spacing.is_finite() || profile.min_spacing < 0.0 {
                return Err(Error::InvalidConfig(format!(
                    "{name}.min_spacing must be finite and >= 0"
                )));
            }
            if !profile.scale_range.min.is_finite() || !profile.scale_range.max.is_finite() {
                return Err(Error::InvalidConfig(format!(
                    "{name}.scale_range must be finite"
                )));
            }
        }
        if self.retention_seconds.is_nan() || self.sweep_interval_seconds.is_nan() {
            return Err(Error::InvalidConfig(
                "retention and sweep interval must not be NaN".into(),
            ));
        }
        Ok(())
    }

    /// Returns a copy with inconsistent values clamped, logging each repair.
    pub fn normalized(&self) -> StreamConfig {
        let mut out = self.clone();

        let radii = self.radii.normalized();
        if radii != self.radii {
            warn!(
                "Tier radii {:?} are inconsistent; clamped to {:?}.",
                self.radii, radii
            );
            out.radii = radii;
        }

        for (name, profile) in [
            ("trees", &mut out.placement.trees),
            ("rocks", &mut out.placement.rocks),
        ] {
            let range = profile.scale_range;
            if range.min > range.max {
                warn!("{name}.scale_range min > max; swapping.");
                profile.scale_range = ScaleRange::new(range.max, range.min);
            }
            if profile.scale_range.min < 0.0 {
                warn!("{name}.scale_range below zero; clamped to 0.");
                profile.scale_range.min = 0.0;
                profile.scale_range.max = profile.scale_range.max.max(0.0);
            }
            if profile.max_attempt_multiplier == 0 {
                warn!("{name}.max_attempt_multiplier is 0; using 1.");
                profile.max_attempt_multiplier = 1;
            }
            if profile.tilt_jitter < 0.0 {
                profile.tilt_jitter = -profile.tilt_jitter;
            }
        }

        if out.budget_per_frame == 0 {
            warn!("budget_per_frame is 0; using 1 so the queue can drain.");
            out.budget_per_frame = 1;
        }
        if out.retention_seconds < 0.0 {
            out.retention_seconds = 0.0;
        }
        if let Some(cold) = out.cold_retention_seconds {
            if cold.is_nan() || cold < 0.0 {
                warn!("cold_retention_seconds {cold} is invalid; discarding on eviction.");
                out.cold_retention_seconds = Some(0.0);
            }
        }
        if out.sweep_interval_seconds < 0.0 {
            out.sweep_interval_seconds = 0.0;
        }

        out
    }
}
