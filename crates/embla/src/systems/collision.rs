//! Collision detection: AABB overlap tests producing contact events.
//!
//! Colliders are entities with both a [`Transform`] and a [`BoundingBox`].
//! The broad phase picks candidate pairs; each candidate is tested exactly and
//! yields a [`CollisionEvent`] describing the contact:
//!
//! ```text
//!        a                 b
//!   ┌─────────┬───┬─────────┐
//!   │         │ ▓ │         │   ▓ = intersection region
//!   │    ·    │ ▓ │    ·    │   contact point = centre of ▓
//!   │         │ ▓ │         │   penetration   = smallest extent of ▓
//!   └─────────┴───┴─────────┘   normal        = that axis, pointing a → b
//! ```

use crate::components::BoundingBox;
use crate::ecs::{Entity, EntityManager};
use crate::math::{Aabb, Transform, Vec3};

use super::broad_phase::{BruteForce, SpatialPartition, UniformGrid};
use super::System;

/// One overlapping pair found during detection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionEvent {
    pub a: Entity,
    pub b: Entity,
    /// Centre of the overlap region.
    pub contact_point: Vec3,
    /// Unit axis of minimum penetration, pointing from `a` towards `b`.
    pub normal: Vec3,
    /// Overlap along `normal`.
    pub penetration: f32,
}

/// Contact data for two overlapping boxes, or `None` if they don't overlap.
///
/// Ties between axes go to x, then y, then z. Axes where the overlap has no
/// thickness (a flat 2D box) are never picked as the normal.
pub fn contact(a: &Aabb, b: &Aabb) -> Option<(Vec3, Vec3, f32)> {
    let overlap = a.intersection(b)?;
    let extent = overlap.size();

    let mut axis: Option<usize> = None;
    for candidate in 0..3 {
        if extent[candidate] <= 0.0 {
            continue;
        }
        match axis {
            Some(best) if extent[candidate] >= extent[best] => {}
            _ => axis = Some(candidate),
        }
    }
    // Two coincident points: nothing to separate along, fall back to x.
    let axis = axis.unwrap_or(0);

    let sign = if b.center()[axis] >= a.center()[axis] {
        1.0
    } else {
        -1.0
    };
    let mut normal = Vec3::ZERO;
    normal[axis] = sign;

    Some((overlap.center(), normal, extent[axis]))
}

/// Pairwise AABB collision detection over a pluggable broad phase.
pub struct CollisionDetectionSystem {
    partition: Box<dyn SpatialPartition>,
    events: Vec<CollisionEvent>,
    /// Scratch buffers reused between frames.
    colliders: Vec<Entity>,
    bounds: Vec<Aabb>,
}

impl CollisionDetectionSystem {
    pub fn new(partition: Box<dyn SpatialPartition>) -> Self {
        Self {
            partition,
            events: Vec::new(),
            colliders: Vec::new(),
            bounds: Vec::new(),
        }
    }

    /// O(n²) baseline.
    pub fn naive() -> Self {
        Self::new(Box::new(BruteForce))
    }

    /// Uniform-grid broad phase with the given cell size.
    pub fn with_grid(cell_size: f32) -> Self {
        Self::new(Box::new(UniformGrid::new(cell_size)))
    }

    pub fn partition_name(&self) -> &'static str {
        self.partition.name()
    }

    /// Detect all overlapping collider pairs among active committed entities.
    ///
    /// Events are ordered by the pair's position in
    /// [`EntityManager::entities`], `a` always before `b`.
    pub fn detect(&mut self, entities: &EntityManager) -> &[CollisionEvent] {
        self.events.clear();
        self.colliders.clear();
        self.bounds.clear();

        for &entity in entities.entities() {
            if !entities.is_active(entity) {
                continue;
            }
            let (Some(transform), Some(bbox)) = (
                entities.try_get::<Transform>(entity),
                entities.try_get::<BoundingBox>(entity),
            ) else {
                continue;
            };
            self.colliders.push(entity);
            self.bounds.push(bbox.bounds.transformed(transform));
        }

        for (i, j) in self.partition.candidate_pairs(&self.bounds) {
            let Some((contact_point, normal, penetration)) =
                contact(&self.bounds[i], &self.bounds[j])
            else {
                continue;
            };
            let event = CollisionEvent {
                a: self.colliders[i],
                b: self.colliders[j],
                contact_point,
                normal,
                penetration,
            };
            log::debug!(
                "collision {} <-> {} depth {:.3} normal {:?}",
                event.a,
                event.b,
                penetration,
                normal
            );
            self.events.push(event);
        }

        &self.events
    }

    /// Events from the most recent [`detect`](Self::detect).
    pub fn events(&self) -> &[CollisionEvent] {
        &self.events
    }
}

impl Default for CollisionDetectionSystem {
    fn default() -> Self {
        Self::naive()
    }
}

impl System for CollisionDetectionSystem {
    fn name(&self) -> &str {
        "collision-detection"
    }

    fn run(&mut self, entities: &mut EntityManager, _dt: f32) {
        self.detect(entities);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::EntityTag;

    fn spawn_box(em: &mut EntityManager, center: Vec3, half: f32) -> Entity {
        em.spawn(EntityTag::Default)
            .with(Transform::from_xyz(center.x, center.y, center.z))
            .with(BoundingBox::from_half_extents(Vec3::splat(half)))
            .id()
    }

    #[test]
    fn unit_offset_boxes_collide_along_x() {
        let mut em = EntityManager::new();
        let a = spawn_box(&mut em, Vec3::ZERO, 1.0);
        let b = spawn_box(&mut em, Vec3::new(1.0, 0.0, 0.0), 1.0);
        em.update();

        let mut detection = CollisionDetectionSystem::naive();
        let events = detection.detect(&em);
        assert_eq!(events.len(), 1);
        let event = events[0];
        assert_eq!((event.a, event.b), (a, b));
        assert_eq!(event.penetration, 1.0);
        assert_eq!(event.normal, Vec3::X);
        assert_eq!(event.contact_point, Vec3::new(0.5, 0.0, 0.0));
    }

    #[test]
    fn normal_points_from_a_to_b() {
        let a = Aabb::from_center_half_extents(Vec3::new(0.0, 1.5, 0.0), Vec3::ONE);
        let b = Aabb::from_center_half_extents(Vec3::ZERO, Vec3::ONE);
        let (_, normal, depth) = contact(&a, &b).unwrap();
        assert_eq!(normal, Vec3::new(0.0, -1.0, 0.0));
        assert_eq!(depth, 0.5);
    }

    #[test]
    fn equal_penetration_prefers_x() {
        let a = Aabb::from_center_half_extents(Vec3::ZERO, Vec3::ONE);
        let b = Aabb::from_center_half_extents(Vec3::new(1.0, 1.0, 1.0), Vec3::ONE);
        let (_, normal, depth) = contact(&a, &b).unwrap();
        assert_eq!(normal, Vec3::X);
        assert_eq!(depth, 1.0);
    }

    #[test]
    fn flat_2d_boxes_collide() {
        let mut em = EntityManager::new();
        let half = Vec3::new(1.0, 1.0, 0.0);
        let a = em
            .spawn(EntityTag::Default)
            .with(Transform::from_xy(0.0, 0.0))
            .with(BoundingBox::from_half_extents(half))
            .id();
        let b = em
            .spawn(EntityTag::Default)
            .with(Transform::from_xy(1.0, 0.0))
            .with(BoundingBox::from_half_extents(half))
            .id();
        em.update();

        let mut detection = CollisionDetectionSystem::naive();
        let events = detection.detect(&em);
        assert_eq!(events.len(), 1);
        let event = events[0];
        assert_eq!((event.a, event.b), (a, b));
        assert_eq!(event.normal, Vec3::X);
        assert_eq!(event.penetration, 1.0);
        assert_eq!(event.contact_point, Vec3::new(0.5, 0.0, 0.0));

        let mut grid = CollisionDetectionSystem::with_grid(1.0);
        assert_eq!(grid.detect(&em), &[event]);
    }

    #[test]
    fn flat_box_against_solid_box_ignores_the_flat_axis() {
        let flat = Aabb::from_center_half_extents(Vec3::ZERO, Vec3::new(1.0, 1.0, 0.0));
        let solid = Aabb::from_center_half_extents(Vec3::new(0.5, 0.0, 0.0), Vec3::ONE);
        let (_, normal, depth) = contact(&flat, &solid).unwrap();
        assert_eq!(normal, Vec3::X);
        assert_eq!(depth, 1.5);
    }

    #[test]
    fn separated_and_static_entities() {
        let mut em = EntityManager::new();
        spawn_box(&mut em, Vec3::ZERO, 1.0);
        spawn_box(&mut em, Vec3::new(5.0, 0.0, 0.0), 1.0);
        // No bounding box → not a collider.
        em.spawn(EntityTag::Default).with(Transform::IDENTITY);
        em.update();

        let mut detection = CollisionDetectionSystem::naive();
        assert!(detection.detect(&em).is_empty());
    }

    #[test]
    fn destroyed_entities_are_ignored() {
        let mut em = EntityManager::new();
        let a = spawn_box(&mut em, Vec3::ZERO, 1.0);
        spawn_box(&mut em, Vec3::new(0.5, 0.0, 0.0), 1.0);
        em.update();
        em.destroy(a);

        let mut detection = CollisionDetectionSystem::naive();
        assert!(detection.detect(&em).is_empty());
    }

    #[test]
    fn grid_matches_brute_force() {
        let mut em = EntityManager::new();
        for i in 0..40 {
            let x = (i % 8) as f32 * 1.3;
            let y = (i / 8) as f32 * 1.1;
            spawn_box(&mut em, Vec3::new(x, y, 0.0), 0.75);
        }
        em.update();

        let mut naive = CollisionDetectionSystem::naive();
        let mut grid = CollisionDetectionSystem::with_grid(2.0);
        let expected = naive.detect(&em).to_vec();
        assert!(!expected.is_empty());
        assert_eq!(grid.detect(&em), expected.as_slice());
        assert_eq!(grid.partition_name(), "uniform-grid");
    }

    #[test]
    fn grid_with_a_huge_box_matches_brute_force() {
        let mut em = EntityManager::new();
        spawn_box(&mut em, Vec3::ZERO, 5.0);
        spawn_box(&mut em, Vec3::new(4.5, 0.0, 0.0), 0.25);
        spawn_box(&mut em, Vec3::new(30.0, 0.0, 0.0), 0.25);
        em.update();

        let mut naive = CollisionDetectionSystem::naive();
        let mut grid = CollisionDetectionSystem::with_grid(0.1);
        let expected = naive.detect(&em).to_vec();
        assert_eq!(expected.len(), 1);
        assert_eq!(grid.detect(&em), expected.as_slice());
    }
}
