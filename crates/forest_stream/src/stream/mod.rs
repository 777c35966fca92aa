//! Chunked streaming of scattered objects: placement, LOD rings, caching and aggregation.
//!
//! Per tick the [`streamer::ChunkStreamer`] runs, in order: ring classification,
//! cache diff and enqueue, eviction sweep, budgeted builds, aggregation.
pub mod aggregate;
pub mod builder;
pub mod cache;
pub mod chunk;
pub mod config;
pub mod events;
pub mod lod;
pub mod placement;
pub mod streamer;

/// Object category scattered into every chunk.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Category {
    Tree,
    Rock,
}

impl Category {
    pub const ALL: [Category; 2] = [Category::Tree, Category::Rock];

    /// Index of this category's RNG sub-stream.
    pub(crate) fn stream_index(self) -> u32 {
        match self {
            Category::Tree => 0,
            Category::Rock => 1,
        }
    }
}

/// Level-of-detail tier of a chunk relative to the camera.
///
/// Ordered from most to least detailed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Tier {
    Near,
    Mid,
    Far,
    Off,
}

impl Tier {
    /// Tiers that can hold active chunks.
    pub const ACTIVE: [Tier; 3] = [Tier::Near, Tier::Mid, Tier::Far];

    pub fn is_active(self) -> bool {
        self != Tier::Off
    }
}
