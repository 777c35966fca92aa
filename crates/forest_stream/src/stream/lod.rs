//! LOD ring classification around the camera chunk.
use std::collections::BTreeMap;

use crate::stream::chunk::ChunkId;
use crate::stream::config::{DistanceMetric, StreamConfig, TierRadii};
use crate::stream::Tier;

/// Active chunks and their tiers, ordered by chunk id. `Off` chunks are omitted.
pub type TierMap = BTreeMap<ChunkId, Tier>;

/// Assigns tiers from ring radii measured in chunk units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RingClassifier {
    radii: TierRadii,
    metric: DistanceMetric,
    far_enabled: bool,
}

impl RingClassifier {
    pub fn new(radii: TierRadii, metric: DistanceMetric, far_enabled: bool) -> Self {
        Self {
            radii: radii.normalized(),
            metric,
            far_enabled,
        }
    }

    pub fn from_config(config: &StreamConfig) -> Self {
        Self::new(config.radii, config.metric, config.far_enabled)
    }

    pub fn radii(&self) -> TierRadii {
        self.radii
    }

    /// Outermost radius that still yields an active tier.
    pub fn outer_radius(&self) -> f32 {
        if self.far_enabled {
            self.radii.view
        } else {
            self.radii.mid
        }
    }

    /// Half-width of the square neighbourhood that can contain active chunks.
    pub fn reach(&self) -> i32 {
        self.outer_radius().floor() as i32
    }

    fn distance(&self, camera: ChunkId, chunk: ChunkId) -> f32 {
        match self.metric {
            DistanceMetric::Chebyshev => camera.chebyshev_distance(chunk) as f32,
            DistanceMetric::Euclidean => camera.center_distance(chunk),
        }
    }

    /// Tier of `chunk` seen from `camera`; the smallest matching ring wins.
    pub fn tier_for(&self, camera: ChunkId, chunk: ChunkId) -> Tier {
        let d = self.distance(camera, chunk);
        if d <= self.radii.near {
            Tier::Near
        } else if d <= self.radii.mid {
            Tier::Mid
        } else if self.far_enabled && d <= self.radii.view {
            Tier::Far
        } else {
            Tier::Off
        }
    }

    /// Classifies the full neighbourhood of `camera`.
    pub fn classify(&self, camera: ChunkId) -> TierMap {
        let reach = self.reach();
        let mut map = TierMap::new();
        for dz in -reach..=reach {
            for dx in -reach..=reach {
                let chunk = camera.offset(dx, dz);
                let tier = self.tier_for(camera, chunk);
                if tier.is_active() {
                    map.insert(chunk, tier);
                }
            }
        }
        map
    }
}
