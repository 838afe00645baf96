//! Built-in component types.
//!
//! Components are plain data. Any `'static + Send` type can be attached to an
//! entity; the ones here are the types the built-in systems and renderers
//! understand. [`Transform`](crate::math::Transform) lives in [`math`](crate::math).

use serde::{Deserialize, Serialize};

use crate::math::{Aabb, Vec2, Vec3};

/// Linear motion state integrated by
/// [`MovementSystem`](crate::systems::MovementSystem).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Movement {
    pub velocity: Vec3,
    pub acceleration: Vec3,
}

impl Movement {
    pub fn new(velocity: Vec3) -> Self {
        Self {
            velocity,
            acceleration: Vec3::ZERO,
        }
    }

    pub fn with_acceleration(mut self, acceleration: Vec3) -> Self {
        self.acceleration = acceleration;
        self
    }
}

/// Local-space collision box, relative to the entity's position.
///
/// The world-space box is `bounds.transformed(&transform)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub bounds: Aabb,
}

impl BoundingBox {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self {
            bounds: Aabb::new(min, max),
        }
    }

    /// A box centred on the entity position.
    pub fn from_half_extents(half_extents: Vec3) -> Self {
        Self {
            bounds: Aabb::from_center_half_extents(Vec3::ZERO, half_extents),
        }
    }
}

/// RGBA colour with components in 0.0–1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const WHITE: Self = Self::rgb(1.0, 1.0, 1.0);
    pub const BLACK: Self = Self::rgb(0.0, 0.0, 0.0);
    pub const RED: Self = Self::rgb(1.0, 0.0, 0.0);
    pub const GREEN: Self = Self::rgb(0.0, 1.0, 0.0);
    pub const BLUE: Self = Self::rgb(0.0, 0.0, 1.0);
    pub const TRANSPARENT: Self = Self::rgba(0.0, 0.0, 0.0, 0.0);

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

/// A regular 2D shape: a circle approximated by `point_count` segments, or
/// a regular polygon when `point_count` is small (3 = triangle, 4 = square).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Shape {
    pub radius: f32,
    pub point_count: u32,
    pub fill: Color,
    pub outline: Color,
    pub outline_thickness: f32,
}

impl Shape {
    pub fn circle(radius: f32) -> Self {
        Self {
            radius,
            point_count: 32,
            fill: Color::WHITE,
            outline: Color::TRANSPARENT,
            outline_thickness: 0.0,
        }
    }

    pub fn regular(radius: f32, point_count: u32) -> Self {
        Self {
            point_count: point_count.max(3),
            ..Self::circle(radius)
        }
    }

    pub fn fill(mut self, color: Color) -> Self {
        self.fill = color;
        self
    }

    pub fn outline(mut self, color: Color, thickness: f32) -> Self {
        self.outline = color;
        self.outline_thickness = thickness;
        self
    }
}

/// An arbitrary (possibly concave) 2D outline, vertices in local space.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Polygon {
    pub vertices: Vec<Vec2>,
    pub fill: Color,
}

impl Polygon {
    pub fn new(vertices: Vec<Vec2>) -> Self {
        Self {
            vertices,
            fill: Color::WHITE,
        }
    }

    /// Local-space bounds of the outline, flat in z. `None` for an empty polygon.
    pub fn bounds(&self) -> Option<Aabb> {
        let first = *self.vertices.first()?;
        let (min, max) = self
            .vertices
            .iter()
            .fold((first, first), |(lo, hi), &v| (lo.min(v), hi.max(v)));
        Some(Aabb::new(min.extend(0.0), max.extend(0.0)))
    }
}

/// Indexed triangle mesh data, as produced by mesh or terrain generators.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TriangleMesh {
    pub vertices: Vec<Vec3>,
    pub indices: Vec<u32>,
    pub color: Color,
}

impl TriangleMesh {
    pub fn new(vertices: Vec<Vec3>, indices: Vec<u32>) -> Self {
        Self {
            vertices,
            indices,
            color: Color::WHITE,
        }
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn regular_shape_has_at_least_three_points() {
        assert_eq!(Shape::regular(1.0, 1).point_count, 3);
        assert_eq!(Shape::regular(1.0, 6).point_count, 6);
    }

    #[test]
    fn polygon_bounds() {
        let poly = Polygon::new(vec![
            Vec2::new(-1.0, 0.0),
            Vec2::new(2.0, 3.0),
            Vec2::new(0.5, -4.0),
        ]);
        let b = poly.bounds().unwrap();
        assert_eq!(b.min, Vec3::new(-1.0, -4.0, 0.0));
        assert_eq!(b.max, Vec3::new(2.0, 3.0, 0.0));
        assert!(Polygon::default().bounds().is_none());
    }

    #[test]
    fn mesh_triangle_count() {
        let mesh = TriangleMesh::new(vec![Vec3::ZERO, Vec3::X, Vec3::Y], vec![0, 1, 2]);
        assert_eq!(mesh.triangle_count(), 1);
    }

    #[test]
    fn bounding_box_from_half_extents_is_centred() {
        let b = BoundingBox::from_half_extents(Vec3::splat(2.0));
        assert_eq!(b.bounds.center(), Vec3::ZERO);
        assert_eq!(b.bounds.half_extents(), Vec3::splat(2.0));
    }
}
