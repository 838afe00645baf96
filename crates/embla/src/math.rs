//! Math types and glam re-exports.
//!
//! We re-export [glam](https://docs.rs/glam) types so users don't need to
//! depend on it directly. [`Transform`] carries position, rotation, and scale
//! for 2D and 3D entities; [`Aabb`] is the axis-aligned box used by collision
//! and boundary handling.

use serde::{Deserialize, Serialize};

pub use glam::{EulerRot, Mat4, Quat, Vec2, Vec3, Vec4};

/// A 3D transform: position, rotation (Euler angles in radians, XYZ order),
/// and scale.
///
/// Works for both 2D and 3D: 2D entities just ignore the Z axis and rotate
/// around `rotation.z`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Vec3,
    pub scale: Vec3,
}

impl Transform {
    /// Identity transform (origin, no rotation, uniform scale of 1).
    pub const IDENTITY: Self = Self {
        position: Vec3::ZERO,
        rotation: Vec3::ZERO,
        scale: Vec3::ONE,
    };

    /// Create a transform at the given position.
    pub fn from_xyz(x: f32, y: f32, z: f32) -> Self {
        Self {
            position: Vec3::new(x, y, z),
            ..Self::IDENTITY
        }
    }

    /// Create a transform at the given 2D position (z = 0).
    pub fn from_xy(x: f32, y: f32) -> Self {
        Self::from_xyz(x, y, 0.0)
    }

    /// Return a copy with uniform scale applied.
    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = Vec3::splat(scale);
        self
    }

    /// Return a copy with the given Euler rotation.
    pub fn with_rotation(mut self, rotation: Vec3) -> Self {
        self.rotation = rotation;
        self
    }

    /// The rotation as a quaternion.
    pub fn quat(&self) -> Quat {
        Quat::from_euler(EulerRot::XYZ, self.rotation.x, self.rotation.y, self.rotation.z)
    }

    /// Compute the 4x4 model matrix.
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.quat(), self.position)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// An axis-aligned bounding box, defined by its min and max corners.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Build from a center point and half-extents.
    pub fn from_center_half_extents(center: Vec3, half_extents: Vec3) -> Self {
        Self {
            min: center - half_extents,
            max: center + half_extents,
        }
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn half_extents(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// Returns `true` if the boxes overlap. Boxes that only touch along a face
    /// do not overlap.
    ///
    /// An axis on which *both* boxes are flat (zero extent) counts as
    /// overlapping when they lie in the same plane, so 2D boxes with
    /// `z = 0` collide like their 3D counterparts.
    pub fn overlaps(&self, other: &Aabb) -> bool {
        (0..3).all(|axis| self.overlaps_on(other, axis))
    }

    /// Returns `true` if both boxes have zero extent along `axis`.
    pub fn shares_flat_axis(&self, other: &Aabb, axis: usize) -> bool {
        self.min[axis] == self.max[axis] && other.min[axis] == other.max[axis]
    }

    fn overlaps_on(&self, other: &Aabb, axis: usize) -> bool {
        if self.shares_flat_axis(other, axis) {
            return self.min[axis] == other.min[axis];
        }
        self.min[axis] < other.max[axis] && self.max[axis] > other.min[axis]
    }

    /// The overlap region of two boxes, or `None` if they don't overlap.
    pub fn intersection(&self, other: &Aabb) -> Option<Aabb> {
        if !self.overlaps(other) {
            return None;
        }
        Some(Aabb {
            min: self.min.max(other.min),
            max: self.max.min(other.max),
        })
    }

    /// Returns `true` if `point` lies inside or on the box.
    pub fn contains(&self, point: Vec3) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }

    /// Place a box given in local space at `transform`. Rotation is ignored;
    /// the box stays axis-aligned.
    pub fn transformed(&self, transform: &Transform) -> Aabb {
        let scale = transform.scale.abs();
        let a = self.min * scale;
        let b = self.max * scale;
        Aabb {
            min: transform.position + a.min(b),
            max: transform.position + a.max(b),
        }
    }
}
