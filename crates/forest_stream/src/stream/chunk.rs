//! Chunk coordinates and per-chunk seeding.
//!
//! Chunks are axis-aligned squares in the xz plane anchored at the world origin:
//! chunk `(cx, cz)` covers `[cx * size, (cx + 1) * size) × [cz * size, (cz + 1) * size)`.
use std::fmt;

use glam::Vec2;

/// Identifier for a chunk in the streaming grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChunkId(
    /// Chunk index along the X axis.
    pub i32,
    /// Chunk index along the Z axis.
    pub i32,
);

impl ChunkId {
    /// Canonical string key, `"cx,cz"`.
    pub fn key(&self) -> String {
        self.to_string()
    }

    /// Chebyshev (ring) distance to `other` in chunk units, saturating at `i32::MAX`.
    pub fn chebyshev_distance(&self, other: ChunkId) -> i32 {
        let d = self.0.abs_diff(other.0).max(self.1.abs_diff(other.1));
        i32::try_from(d).unwrap_or(i32::MAX)
    }

    /// Euclidean distance between chunk centres in chunk units.
    pub fn center_distance(&self, other: ChunkId) -> f32 {
        let dx = self.0.abs_diff(other.0) as f32;
        let dz = self.1.abs_diff(other.1) as f32;
        (dx * dx + dz * dz).sqrt()
    }

    /// Neighbour at `(dx, dz)`; clamps at the edge of the coordinate range.
    pub fn offset(&self, dx: i32, dz: i32) -> ChunkId {
        ChunkId(self.0.saturating_add(dx), self.1.saturating_add(dz))
    }
}

impl fmt::Display for ChunkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.0, self.1)
    }
}

/// Computes the chunk containing the world position `(x, z)`.
pub fn chunk_id_for_position(x: f32, z: f32, chunk_size: f32) -> ChunkId {
    debug_assert!(chunk_size > 0.0, "chunk_size must be > 0");
    ChunkId(
        (x / chunk_size).floor() as i32,
        (z / chunk_size).floor() as i32,
    )
}

/// World-space `(min, max)` corners of a chunk in the xz plane.
pub fn chunk_bounds(id: ChunkId, chunk_size: f32) -> (Vec2, Vec2) {
    debug_assert!(chunk_size > 0.0, "chunk_size must be > 0");
    let min = Vec2::new(id.0 as f32, id.1 as f32) * chunk_size;
    (min, min + Vec2::splat(chunk_size))
}

/// World-space centre of a chunk in the xz plane.
pub fn chunk_center(id: ChunkId, chunk_size: f32) -> Vec2 {
    let (min, max) = chunk_bounds(id, chunk_size);
    (min + max) * 0.5
}

/// Creates a deterministic 32-bit seed for a chunk from a base seed.
///
/// The coordinate pair is packed into one word before mixing so distinct
/// chunks never feed the same input to the mixer.
pub fn seed_for_chunk(base_seed: u32, chunk: ChunkId) -> u32 {
    let packed = ((chunk.0 as u32 as u64) << 32) | chunk.1 as u32 as u64;
    let salt = mix_u64(base_seed as u64 ^ 0x9E3779B97F4A7C15);
    fold_u32(mix_u64(packed ^ salt))
}

/// Derives an independent sub-stream seed, e.g. one per object category.
pub fn seed_for_stream(chunk_seed: u32, stream: u32) -> u32 {
    let mixed = ((chunk_seed as u64) << 32) | (stream as u64).wrapping_mul(0x94D049BB);
    fold_u32(mix_u64(mixed ^ 0xD6E8FEB86659FD93))
}

#[inline]
fn mix_u64(mut x: u64) -> u64 {
    x ^= x >> 30;
    x = x.wrapping_mul(0xBF58476D1CE4E5B9);
    x ^= x >> 27;
    x = x.wrapping_mul(0x94D049BB133111EB);
    x ^ (x >> 31)
}

#[inline]
fn fold_u32(x: u64) -> u32 {
    ((x >> 32) ^ x) as u32
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn chunk_id_floors_negative_positions() {
        assert_eq!(chunk_id_for_position(0.0, 0.0, 2.0), ChunkId(0, 0));
        assert_eq!(chunk_id_for_position(1.99, 3.9, 2.0), ChunkId(0, 1));
        assert_eq!(chunk_id_for_position(-0.01, -2.0, 2.0), ChunkId(-1, -1));
        assert_eq!(chunk_id_for_position(-2.01, 4.0, 2.0), ChunkId(-2, 2));
    }

    #[test]
    fn bounds_contain_their_positions() {
        let id = chunk_id_for_position(-3.5, 7.25, 2.0);
        let (min, max) = chunk_bounds(id, 2.0);
        assert!(min.x <= -3.5 && -3.5 < max.x);
        assert!(min.y <= 7.25 && 7.25 < max.y);
        assert_eq!(chunk_center(ChunkId(0, 0), 2.0), Vec2::new(1.0, 1.0));
    }

    #[test]
    fn key_is_canonical() {
        assert_eq!(ChunkId(-3, 12).key(), "-3,12");
    }

    #[test]
    fn distances() {
        let a = ChunkId(0, 0);
        assert_eq!(a.chebyshev_distance(ChunkId(3, -2)), 3);
        assert!((a.center_distance(ChunkId(3, 4)) - 5.0).abs() < 1e-6);
    }

    #[test]
    fn chunk_seeds_are_distinct_and_stable() {
        let mut seen = HashSet::new();
        for cz in -8..8 {
            for cx in -8..8 {
                let s = seed_for_chunk(6, ChunkId(cx, cz));
                assert_eq!(s, seed_for_chunk(6, ChunkId(cx, cz)));
                seen.insert(s);
            }
        }
        assert_eq!(seen.len(), 256);
        assert_ne!(
            seed_for_chunk(6, ChunkId(1, 2)),
            seed_for_chunk(7, ChunkId(1, 2))
        );
        assert_ne!(
            seed_for_chunk(6, ChunkId(1, 2)),
            seed_for_chunk(6, ChunkId(2, 1))
        );
    }

    #[test]
    fn mirrored_chunks_get_different_seeds() {
        for x in 1..16 {
            assert_ne!(
                seed_for_chunk(6, ChunkId(x, -1)),
                seed_for_chunk(6, ChunkId(-x, 1)),
                "chunks ({x},-1) and (-{x},1) share a seed"
            );
            assert_ne!(
                seed_for_chunk(6, ChunkId(x, x)),
                seed_for_chunk(6, ChunkId(-x, -x))
            );
        }
    }

    #[test]
    fn extreme_coordinates_do_not_overflow() {
        let edge = ChunkId(i32::MAX, i32::MIN);
        assert_eq!(edge.offset(1, -1), edge);
        assert_eq!(edge.offset(-1, 1), ChunkId(i32::MAX - 1, i32::MIN + 1));
        assert_eq!(edge.chebyshev_distance(ChunkId(i32::MIN, 0)), i32::MAX);
        assert!(edge.center_distance(ChunkId(0, 0)).is_finite());
        assert_eq!(chunk_id_for_position(1.0e12, -1.0e12, 2.0), edge);
    }

    #[test]
    fn stream_seeds_differ_per_stream() {
        let base = seed_for_chunk(6, ChunkId(0, 0));
        assert_ne!(seed_for_stream(base, 0), seed_for_stream(base, 1));
    }
}
