//! Placement records produced by chunk builds.
use glam::{EulerRot, Mat4, Quat, Vec3};

use crate::stream::chunk::ChunkId;
use crate::stream::Category;

/// One scattered object instance. Immutable once built.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Placement {
    /// World position; `y` already includes bottom alignment and sink.
    pub position: Vec3,
    /// Yaw in radians.
    pub rotation_y: f32,
    /// Tilt in radians, zero for upright categories.
    pub rotation_x: f32,
    /// Uniform scale.
    pub scale: f32,
    /// Index of the interchangeable geometry part.
    pub variant: usize,
}

impl Placement {
    pub fn rotation(&self) -> Quat {
        Quat::from_euler(EulerRot::YXZ, self.rotation_y, self.rotation_x, 0.0)
    }

    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(Vec3::splat(self.scale), self.rotation(), self.position)
    }

    /// Column-major instance transform for engine-agnostic renderers.
    pub fn instance_transform(&self) -> mint::ColumnMatrix4<f32> {
        self.matrix().into()
    }
}

/// Cached result of building one chunk.
#[derive(Clone, Debug, PartialEq)]
pub struct ChunkRecord {
    pub id: ChunkId,
    pub trees: Vec<Placement>,
    /// Rock placements grouped by variant index.
    pub rocks_by_variant: Vec<Vec<Placement>>,
    pub built: bool,
    /// Set when the build stopped because the frame budget ran out.
    pub partial: bool,
}

impl ChunkRecord {
    pub fn empty(id: ChunkId, rock_variants: usize) -> Self {
        Self {
            id,
            trees: Vec::new(),
            rocks_by_variant: vec![Vec::new(); rock_variants.max(1)],
            built: false,
            partial: false,
        }
    }

    pub fn key(&self) -> String {
        self.id.key()
    }

    pub fn rock_count(&self) -> usize {
        self.rocks_by_variant.iter().map(Vec::len).sum()
    }

    pub fn len(&self) -> usize {
        self.trees.len() + self.rock_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn count(&self, category: Category) -> usize {
        match category {
            Category::Tree => self.trees.len(),
            Category::Rock => self.rock_count(),
        }
    }

    /// Iterates all rock placements in variant order.
    pub fn rocks(&self) -> impl Iterator<Item = &Placement> {
        self.rocks_by_variant.iter().flatten()
    }
}
