//! Uniform-grid occupancy index for minimum-distance rejection sampling.
//!
//! Disks are bucketed by the cell containing their centre. A query only visits
//! the cells within reach of the candidate, which is the 3×3 neighbourhood as
//! long as two radii never sum past one cell. [`OccupancyGrid::for_max_radius`]
//! sizes cells so that always holds.
use std::collections::HashMap;

use glam::Vec2;

/// Smallest permitted cell size in world units.
pub const MIN_CELL_SIZE: f32 = 0.05;

#[derive(Clone, Copy, Debug, PartialEq)]
struct Disk {
    center: Vec2,
    radius: f32,
}

/// Spatial index of placed disks used during a single chunk build.
#[derive(Debug, Clone)]
pub struct OccupancyGrid {
    cell_size: f32,
    cells: HashMap<(i32, i32), Vec<Disk>>,
    max_radius: f32,
    len: usize,
}

impl OccupancyGrid {
    /// Creates an empty grid. Non-finite or tiny cell sizes fall back to [`MIN_CELL_SIZE`].
    pub fn new(cell_size: f32) -> Self {
        let cell_size = if cell_size.is_finite() {
            cell_size.max(MIN_CELL_SIZE)
        } else {
            MIN_CELL_SIZE
        };
        Self {
            cell_size,
            cells: HashMap::new(),
            max_radius: 0.0,
            len: 0,
        }
    }

    /// Creates a grid sized for the smallest spacing expected during a build.
    pub fn for_spacing(min_spacing: f32) -> Self {
        Self::new(min_spacing * 0.5)
    }

    /// Creates a grid whose cells span the widest possible pair of disks, so
    /// every query stays within the 3×3 neighbourhood whatever the radii.
    pub fn for_max_radius(max_radius: f32) -> Self {
        Self::new(max_radius * 2.0)
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    fn cell_of(&self, x: f32, z: f32) -> (i32, i32) {
        (
            (x / self.cell_size).floor() as i32,
            (z / self.cell_size).floor() as i32,
        )
    }

    /// Records a disk at `(x, z)`.
    pub fn add(&mut self, x: f32, z: f32, radius: f32) {
        let radius = radius.max(0.0);
        let cell = self.cell_of(x, z);
        self.cells.entry(cell).or_default().push(Disk {
            center: Vec2::new(x, z),
            radius,
        });
        self.max_radius = self.max_radius.max(radius);
        self.len += 1;
    }

    /// Returns `false` if any stored disk is closer than the sum of both radii.
    pub fn can_place(&self, x: f32, z: f32, radius: f32) -> bool {
        if self.len == 0 {
            return true;
        }
        let radius = radius.max(0.0);
        let candidate = Vec2::new(x, z);
        let (cx, cz) = self.cell_of(x, z);
        let reach = ((radius + self.max_radius) / self.cell_size).ceil().max(1.0) as i32;

        for dz in -reach..=reach {
            for dx in -reach..=reach {
                let Some(disks) = self.cells.get(&(cx + dx, cz + dz)) else {
                    continue;
                };
                for disk in disks {
                    let min_dist = radius + disk.radius;
                    if candidate.distance_squared(disk.center) < min_dist * min_dist {
                        return false;
                    }
                }
            }
        }

        true
    }

    pub fn clear(&mut self) {
        self.cells.clear();
        self.max_radius = 0.0;
        self.len = 0;
    }
}
