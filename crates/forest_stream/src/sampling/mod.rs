//! Deterministic random streams and spacing structures used while building chunks.
//!
//! - [`Mulberry32`]: tiny seeded 32-bit generator, implements [`RngCore`].
//! - [`OccupancyGrid`]: uniform grid for minimum-distance rejection.
use rand::RngCore;

pub mod mulberry;
pub mod occupancy;

pub use mulberry::Mulberry32;
pub use occupancy::OccupancyGrid;

const F32_MANTISSA_SCALE: f32 = 1.0 / 16_777_216.0;

/// Generate a random float in the half-open range [0, 1).
///
/// Uses the top 24 bits of the next `u32` so the result is exactly
/// representable and never rounds up to `1.0`.
#[inline]
pub fn rand01(rng: &mut dyn RngCore) -> f32 {
    (rng.next_u32() >> 8) as f32 * F32_MANTISSA_SCALE
}

/// Generate a random float in `[min, max)`. Returns `min` when the range is empty.
#[inline]
pub fn rand_range(rng: &mut dyn RngCore, min: f32, max: f32) -> f32 {
    let u = rand01(rng);
    if max <= min {
        return min;
    }
    min + u * (max - min)
}
