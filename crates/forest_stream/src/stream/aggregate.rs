//! Gathering cached placements into per-tier instance buffers.
use std::collections::BTreeMap;

use crate::stream::cache::ChunkCache;
use crate::stream::config::{InstanceCapacity, RenderPolicy};
use crate::stream::lod::TierMap;
use crate::stream::placement::{ChunkRecord, Placement};
use crate::stream::{Category, Tier};

/// Renderer-side buffer identity within a tier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum InstanceKind {
    Tree,
    Rock { variant: usize },
}

impl InstanceKind {
    pub fn category(&self) -> Category {
        match self {
            InstanceKind::Tree => Category::Tree,
            InstanceKind::Rock { .. } => Category::Rock,
        }
    }
}

/// Receives flattened placement lists, one per tier and instance kind.
///
/// Implementations are expected to size an instance buffer to at least
/// `placements.len()` and write one transform per placement.
pub trait RendererSink {
    fn upload(&mut self, tier: Tier, kind: InstanceKind, placements: &[Placement]);
}

impl RendererSink for () {
    #[inline]
    fn upload(&mut self, _tier: Tier, _kind: InstanceKind, _placements: &[Placement]) {}
}

/// Placements grouped by tier and instance kind.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct InstanceSet {
    buffers: BTreeMap<(Tier, InstanceKind), Vec<Placement>>,
    truncated: usize,
}

impl InstanceSet {
    /// Placements for a buffer; empty if the buffer is not rendered.
    pub fn get(&self, tier: Tier, kind: InstanceKind) -> &[Placement] {
        self.buffers
            .get(&(tier, kind))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn iter(&self) -> impl Iterator<Item = (Tier, InstanceKind, &[Placement])> {
        self.buffers
            .iter()
            .map(|(&(tier, kind), v)| (tier, kind, v.as_slice()))
    }

    /// Number of rendered buffers, including empty ones.
    pub fn buffer_count(&self) -> usize {
        self.buffers.len()
    }

    /// Total placements across all buffers.
    pub fn total(&self) -> usize {
        self.buffers.values().map(Vec::len).sum()
    }

    /// Placements dropped because a buffer hit its capacity.
    pub fn truncated(&self) -> usize {
        self.truncated
    }

    /// Hands every buffer, empty ones included, to the renderer.
    pub fn upload_to(&self, sink: &mut dyn RendererSink) {
        for (tier, kind, placements) in self.iter() {
            sink.upload(tier, kind, placements);
        }
    }

    fn push_capped(&mut self, tier: Tier, kind: InstanceKind, items: &[Placement], cap: usize) {
        let Some(buffer) = self.buffers.get_mut(&(tier, kind)) else {
            return;
        };
        let room = cap.saturating_sub(buffer.len());
        let take = room.min(items.len());
        buffer.extend_from_slice(&items[..take]);
        self.truncated += items.len() - take;
    }
}

/// Collects hot placements for every active chunk.
///
/// Chunks in tiers the policy does not render contribute nothing; chunks not
/// yet built are skipped. Buffers are filled in chunk-id order and silently
/// truncated at their capacity.
pub fn aggregate(
    active: &TierMap,
    cache: &ChunkCache,
    rock_variants: usize,
    policy: &RenderPolicy,
    capacity: &InstanceCapacity,
) -> InstanceSet {
    aggregate_records(
        active.iter().map(|(&id, &tier)| (tier, cache.hot(id).map(|r| r.as_ref()))),
        rock_variants,
        policy,
        capacity,
    )
}

fn aggregate_records<'a>(
    records: impl Iterator<Item = (Tier, Option<&'a ChunkRecord>)>,
    rock_variants: usize,
    policy: &RenderPolicy,
    capacity: &InstanceCapacity,
) -> InstanceSet {
    let mut set = InstanceSet::default();
    for tier in Tier::ACTIVE {
        if policy.renders(tier, Category::Tree) {
            set.buffers.insert((tier, InstanceKind::Tree), Vec::new());
        }
        if policy.renders(tier, Category::Rock) {
            for variant in 0..rock_variants.max(1) {
                set.buffers
                    .insert((tier, InstanceKind::Rock { variant }), Vec::new());
            }
        }
    }

    for (tier, record) in records {
        let Some(record) = record else {
            continue;
        };
        set.push_capped(
            tier,
            InstanceKind::Tree,
            &record.trees,
            capacity.get(tier, Category::Tree),
        );
        for (variant, rocks) in record.rocks_by_variant.iter().enumerate() {
            set.push_capped(
                tier,
                InstanceKind::Rock { variant },
                rocks,
                capacity.get(tier, Category::Rock),
            );
        }
    }

    set
}
