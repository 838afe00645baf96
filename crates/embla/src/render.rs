//! # Render — The Seam Between the ECS and a Graphics Backend
//!
//! The core never draws. A [`Renderer`] receives the current scene's
//! [`EntityManager`] once per frame and reads whatever drawable components it
//! understands:
//!
//! ```text
//!   EntityManager ──entities()──▶ Renderer
//!                                   │ has::<Transform>() + one of
//!                                   │   Shape / Polygon / TriangleMesh
//!                                   ▼
//!                                 backend (SFML, OpenGL, wgpu, a test)
//! ```
//!
//! [`DrawList`] is the headless backend: it records what would be drawn, in
//! painter's order (back to front by `z`, ties keep entity order). Examples
//! and tests use it to observe rendering without a window.

use crate::components::{Color, Polygon, Shape, TriangleMesh};
use crate::ecs::{Entity, EntityManager};
use crate::math::Transform;

/// Consumes a frame's entities.
pub trait Renderer {
    fn render(&mut self, entities: &EntityManager);
}

/// What kind of primitive an entity is drawn as.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawKind {
    Shape { radius: f32, point_count: u32 },
    Polygon { vertex_count: usize },
    Mesh { triangle_count: usize },
}

/// One recorded draw.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawItem {
    pub entity: Entity,
    pub transform: Transform,
    pub kind: DrawKind,
    pub color: Color,
}

/// Headless renderer recording draw items.
#[derive(Debug, Default)]
pub struct DrawList {
    items: Vec<DrawItem>,
    frames: u64,
}

impl DrawList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Items recorded by the most recent `render()`, back to front.
    pub fn items(&self) -> &[DrawItem] {
        &self.items
    }

    /// Number of frames rendered so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    fn drawable(entities: &EntityManager, entity: Entity) -> Option<(DrawKind, Color)> {
        if let Some(shape) = entities.try_get::<Shape>(entity) {
            return Some((
                DrawKind::Shape {
                    radius: shape.radius,
                    point_count: shape.point_count,
                },
                shape.fill,
            ));
        }
        if let Some(polygon) = entities.try_get::<Polygon>(entity) {
            return Some((
                DrawKind::Polygon {
                    vertex_count: polygon.vertices.len(),
                },
                polygon.fill,
            ));
        }
        entities.try_get::<TriangleMesh>(entity).map(|mesh| {
            (
                DrawKind::Mesh {
                    triangle_count: mesh.triangle_count(),
                },
                mesh.color,
            )
        })
    }
}

impl Renderer for DrawList {
    fn render(&mut self, entities: &EntityManager) {
        self.items.clear();
        for &entity in entities.entities() {
            if !entities.is_active(entity) {
                continue;
            }
            let Some(transform) = entities.try_get::<Transform>(entity) else {
                continue;
            };
            if let Some((kind, color)) = Self::drawable(entities, entity) {
                self.items.push(DrawItem {
                    entity,
                    transform: *transform,
                    kind,
                    color,
                });
            }
        }
        // Stable: equal depths keep entity order.
        self.items
            .sort_by(|a, b| a.transform.position.z.total_cmp(&b.transform.position.z));
        self.frames += 1;
    }
}
