//! Terrain height sampling behind a single interface.
//!
//! [`HeightOracle`] picks its strategy once, at construction: either a downward
//! ray cast against a [`RaycastTarget`] or a heightfield function such as
//! [`HeightGrid`]. A `None` sample means "no usable ground here".
use std::fmt;

use glam::Vec3;
use mint::Vector3;

/// Extra distance above the target's top (and below its bottom) for ray casts.
pub const RAY_MARGIN: f32 = 1.0;

/// Something a vertical ray can be cast against, e.g. a terrain mesh.
pub trait RaycastTarget: Send + Sync {
    /// Vertical extent `(min_y, max_y)` of the target's bounding box.
    fn vertical_extent(&self) -> (f32, f32);

    /// Cast a ray straight down from `origin` and return the first hit point,
    /// if one lies within `max_distance`.
    fn cast_down(&self, origin: Vector3<f32>, max_distance: f32) -> Option<Vector3<f32>>;
}

type HeightFn = dyn Fn(f32, f32) -> Option<f32> + Send + Sync;

/// Height source used by the chunk builder.
pub enum HeightOracle {
    Raycast(Box<dyn RaycastTarget>),
    Heightfield(Box<HeightFn>),
}

impl HeightOracle {
    pub fn raycast(target: impl RaycastTarget + 'static) -> Self {
        HeightOracle::Raycast(Box::new(target))
    }

    pub fn heightfield<F>(f: F) -> Self
    where
        F: Fn(f32, f32) -> Option<f32> + Send + Sync + 'static,
    {
        HeightOracle::Heightfield(Box::new(f))
    }

    /// A flat plane at `y`.
    pub fn flat(y: f32) -> Self {
        Self::heightfield(move |_, _| Some(y))
    }

    /// Sample the ground height at `(x, z)`. Non-finite heights are treated as misses.
    pub fn sample(&self, x: f32, z: f32) -> Option<f32> {
        let y = match self {
            HeightOracle::Raycast(target) => {
                let (min_y, max_y) = target.vertical_extent();
                let origin = Vec3::new(x, max_y + RAY_MARGIN, z);
                let max_distance = (max_y - min_y).max(0.0) + 2.0 * RAY_MARGIN;
                target.cast_down(origin.into(), max_distance)?.y
            }
            HeightOracle::Heightfield(f) => f(x, z)?,
        };
        y.is_finite().then_some(y)
    }
}

impl fmt::Debug for HeightOracle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeightOracle::Raycast(_) => f.write_str("HeightOracle::Raycast"),
            HeightOracle::Heightfield(_) => f.write_str("HeightOracle::Heightfield"),
        }
    }
}

/// Precomputed heightfield over a regular grid in the xz plane.
///
/// Samples are bilinearly interpolated; positions outside the grid return `None`.
#[derive(Debug, Clone)]
pub struct HeightGrid {
    origin_x: f32,
    origin_z: f32,
    cell_size: f32,
    width: usize,
    depth: usize,
    heights: Vec<f32>,
}

impl HeightGrid {
    /// Builds a grid of `width × depth` vertices by evaluating `f` at each vertex.
    pub fn from_fn(
        origin_x: f32,
        origin_z: f32,
        cell_size: f32,
        width: usize,
        depth: usize,
        f: impl Fn(f32, f32) -> f32,
    ) -> Self {
        debug_assert!(cell_size > 0.0, "cell_size must be > 0");
        let mut heights = Vec::with_capacity(width * depth);
        for iz in 0..depth {
            for ix in 0..width {
                heights.push(f(
                    origin_x + ix as f32 * cell_size,
                    origin_z + iz as f32 * cell_size,
                ));
            }
        }
        Self {
            origin_x,
            origin_z,
            cell_size,
            width,
            depth,
            heights,
        }
    }

    #[inline]
    fn at(&self, ix: usize, iz: usize) -> f32 {
        self.heights[iz * self.width + ix]
    }

    pub fn min_max(&self) -> (f32, f32) {
        self.heights
            .iter()
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &h| {
                (lo.min(h), hi.max(h))
            })
    }

    pub fn sample(&self, x: f32, z: f32) -> Option<f32> {
        if self.width < 2 || self.depth < 2 {
            return None;
        }
        let fx = (x - self.origin_x) / self.cell_size;
        let fz = (z - self.origin_z) / self.cell_size;
        let max_x = (self.width - 1) as f32;
        let max_z = (self.depth - 1) as f32;
        if !(0.0..=max_x).contains(&fx) || !(0.0..=max_z).contains(&fz) {
            return None;
        }

        let ix = (fx.floor() as usize).min(self.width - 2);
        let iz = (fz.floor() as usize).min(self.depth - 2);
        let tx = fx - ix as f32;
        let tz = fz - iz as f32;

        let h00 = self.at(ix, iz);
        let h10 = self.at(ix + 1, iz);
        let h01 = self.at(ix, iz + 1);
        let h11 = self.at(ix + 1, iz + 1);
        let near = h00 + (h10 - h00) * tx;
        let far = h01 + (h11 - h01) * tx;
        Some(near + (far - near) * tz)
    }
}

impl RaycastTarget for HeightGrid {
    fn vertical_extent(&self) -> (f32, f32) {
        self.min_max()
    }

    fn cast_down(&self, origin: Vector3<f32>, max_distance: f32) -> Option<Vector3<f32>> {
        let y = self.sample(origin.x, origin.z)?;
        let drop = origin.y - y;
        if drop < 0.0 || drop > max_distance {
            return None;
        }
        Some(Vec3::new(origin.x, y, origin.z).into())
    }
}
