#![forbid(unsafe_code)]
//! forest_stream: deterministic procedural scatter with LOD chunk streaming.
//!
//! Modules:
//! - sampling: mulberry32 generator and the spacing occupancy grid
//! - height: ground height oracles (raycast targets, heightfields, sampled grids)
//! - stream: chunk ids and seeds, the chunk builder, ring classifier, hot/cold cache,
//!   frame-budgeted streamer, and per-tier instance aggregation
//!
//! A [`stream::streamer::ChunkStreamer`] is driven once per frame with the camera
//! position; the same seed always yields the same placements for a chunk.
pub mod error;
pub mod height;
pub mod sampling;
pub mod stream;

/// Convenient re-exports for common types. Import with `use forest_stream::prelude::*;`.
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::height::{HeightGrid, HeightOracle, RaycastTarget};
    pub use crate::sampling::{Mulberry32, OccupancyGrid};
    pub use crate::stream::aggregate::{aggregate, InstanceKind, InstanceSet, RendererSink};
    pub use crate::stream::builder::{BuildOutcome, BuildProgress, CategoryReport, ChunkBuilder};
    pub use crate::stream::cache::{ChunkCache, ChunkState, SweepReport};
    pub use crate::stream::chunk::{
        chunk_bounds, chunk_center, chunk_id_for_position, seed_for_chunk, ChunkId,
    };
    pub use crate::stream::config::{
        BudgetUnit, DistanceMetric, ExclusionZone, InstanceCapacity, MissingHeight,
        ObjectProfile, PlacementConfig, RenderPolicy, ScaleRange, SpacingMode, StreamConfig,
        TierCapacity, TierMask, TierRadii,
    };
    pub use crate::stream::events::{EventCounts, EventSink, FnSink, StreamEvent, VecSink};
    pub use crate::stream::lod::{RingClassifier, TierMap};
    pub use crate::stream::placement::{ChunkRecord, Placement};
    pub use crate::stream::streamer::{BuildJob, ChunkStreamer, StreamStats, TickReport};
    pub use crate::stream::{Category, Tier};
}
