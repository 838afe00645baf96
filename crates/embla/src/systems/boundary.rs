//! World-bounds enforcement.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::components::Movement;
use crate::ecs::{Entity, EntityManager};
use crate::math::{Aabb, Transform};

use super::System;

/// What happens to an entity whose position leaves the world bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryResponse {
    /// Clamp to the boundary and reflect the violating velocity axis, damped.
    #[default]
    Bounce,
    /// Teleport to the opposite boundary, keeping velocity.
    Wrap,
    /// Clamp to the boundary and zero the violating velocity axis.
    Clamp,
    /// Destroy the entity once the pass is over.
    Destroy,
}

/// Keeps entity positions inside an axis-aligned world box.
///
/// Only the entity position is tested, not its bounding box.
pub struct BoundarySystem {
    bounds: Aabb,
    default_response: BoundaryResponse,
    overrides: HashMap<Entity, BoundaryResponse>,
    /// Fraction of speed kept by a bounce.
    bounce_damping: f32,
    destroyed: Vec<Entity>,
}

impl BoundarySystem {
    pub fn new(bounds: Aabb) -> Self {
        Self {
            bounds,
            default_response: BoundaryResponse::Bounce,
            overrides: HashMap::new(),
            bounce_damping: 1.0,
            destroyed: Vec::new(),
        }
    }

    pub fn with_response(mut self, response: BoundaryResponse) -> Self {
        self.default_response = response;
        self
    }

    pub fn with_bounce_damping(mut self, damping: f32) -> Self {
        self.bounce_damping = damping.clamp(0.0, 1.0);
        self
    }

    pub fn bounds(&self) -> Aabb {
        self.bounds
    }

    pub fn set_bounds(&mut self, bounds: Aabb) {
        self.bounds = bounds;
    }

    pub fn set_response(&mut self, entity: Entity, response: BoundaryResponse) {
        self.overrides.insert(entity, response);
    }

    pub fn response_for(&self, entity: Entity) -> BoundaryResponse {
        self.overrides
            .get(&entity)
            .copied()
            .unwrap_or(self.default_response)
    }

    /// Entities destroyed by the most recent [`enforce`](Self::enforce).
    pub fn destroyed(&self) -> &[Entity] {
        &self.destroyed
    }

    /// Apply the configured response to every active entity outside the
    /// bounds. `Destroy` takes effect after all entities were visited.
    pub fn enforce(&mut self, entities: &mut EntityManager) {
        self.destroyed.clear();
        let (min, max) = (self.bounds.min, self.bounds.max);

        for i in 0..entities.entities().len() {
            let entity = entities.entities()[i];
            if !entities.is_active(entity) {
                continue;
            }
            let Some(mut position) = entities.try_get::<Transform>(entity).map(|t| t.position)
            else {
                continue;
            };
            let outside =
                [0, 1, 2].map(|axis| position[axis] < min[axis] || position[axis] > max[axis]);
            if !outside.contains(&true) {
                continue;
            }

            let response = self.response_for(entity);
            if response == BoundaryResponse::Destroy {
                self.destroyed.push(entity);
                continue;
            }

            let mut velocity = entities.try_get::<Movement>(entity).map(|m| m.velocity);
            for axis in (0..3).filter(|&axis| outside[axis]) {
                let below = position[axis] < min[axis];
                match response {
                    BoundaryResponse::Bounce => {
                        position[axis] = if below { min[axis] } else { max[axis] };
                        if let Some(v) = velocity.as_mut() {
                            let speed = v[axis].abs() * self.bounce_damping;
                            v[axis] = if below { speed } else { -speed };
                        }
                    }
                    BoundaryResponse::Wrap => {
                        position[axis] = if below { max[axis] } else { min[axis] };
                    }
                    BoundaryResponse::Clamp => {
                        position[axis] = if below { min[axis] } else { max[axis] };
                        if let Some(v) = velocity.as_mut() {
                            v[axis] = 0.0;
                        }
                    }
                    BoundaryResponse::Destroy => {}
                }
            }

            entities.get_mut::<Transform>(entity).position = position;
            if let (Some(v), Some(movement)) = (velocity, entities.try_get_mut::<Movement>(entity)) {
                movement.velocity = v;
            }
        }

        for &entity in &self.destroyed {
            log::debug!("{} left the world bounds, destroying", entity);
            entities.destroy(entity);
        }
        self.overrides.retain(|&e, _| entities.is_active(e));
    }
}

impl System for BoundarySystem {
    fn name(&self) -> &str {
        "boundary"
    }

    fn run(&mut self, entities: &mut EntityManager, _dt: f32) {
        self.enforce(entities);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::EntityTag;
    use crate::math::Vec3;

    fn world() -> Aabb {
        Aabb::new(Vec3::splat(-10.0), Vec3::splat(10.0))
    }

    fn mover(em: &mut EntityManager, position: Vec3, velocity: Vec3) -> Entity {
        em.spawn(EntityTag::Default)
            .with(Transform::from_xyz(position.x, position.y, position.z))
            .with(Movement::new(velocity))
            .id()
    }

    #[test]
    fn bounce_clamps_and_reflects_damped() {
        let mut em = EntityManager::new();
        let e = mover(&mut em, Vec3::new(11.0, 0.0, 0.0), Vec3::new(5.0, 0.0, 0.0));
        em.update();

        let mut boundary = BoundarySystem::new(world()).with_bounce_damping(0.9);
        boundary.enforce(&mut em);
        assert_eq!(em.get::<Transform>(e).position.x, 10.0);
        assert!((em.get::<Movement>(e).velocity.x + 4.5).abs() < 1e-6);
    }

    #[test]
    fn bounce_below_min_points_inward() {
        let mut em = EntityManager::new();
        let e = mover(&mut em, Vec3::new(0.0, -12.0, 0.0), Vec3::new(1.0, -3.0, 0.0));
        em.update();

        BoundarySystem::new(world()).enforce(&mut em);
        assert_eq!(em.get::<Transform>(e).position.y, -10.0);
        assert_eq!(em.get::<Movement>(e).velocity, Vec3::new(1.0, 3.0, 0.0));
    }

    #[test]
    fn wrap_teleports_to_opposite_side() {
        let mut em = EntityManager::new();
        let e = mover(&mut em, Vec3::new(10.5, 0.0, 0.0), Vec3::new(2.0, 0.0, 0.0));
        em.update();

        BoundarySystem::new(world())
            .with_response(BoundaryResponse::Wrap)
            .enforce(&mut em);
        assert_eq!(em.get::<Transform>(e).position.x, -10.0);
        assert_eq!(em.get::<Movement>(e).velocity.x, 2.0);
    }

    #[test]
    fn clamp_zeroes_violating_axis() {
        let mut em = EntityManager::new();
        let e = mover(&mut em, Vec3::new(-11.0, 0.0, 0.0), Vec3::new(-2.0, 1.0, 0.0));
        em.update();

        let mut boundary = BoundarySystem::new(world());
        boundary.set_response(e, BoundaryResponse::Clamp);
        boundary.enforce(&mut em);
        assert_eq!(em.get::<Transform>(e).position.x, -10.0);
        assert_eq!(em.get::<Movement>(e).velocity, Vec3::new(0.0, 1.0, 0.0));
    }

    #[test]
    fn destroy_is_deferred_to_end_of_pass() {
        let mut em = EntityManager::new();
        let gone = mover(&mut em, Vec3::new(20.0, 0.0, 0.0), Vec3::ZERO);
        let stays = mover(&mut em, Vec3::ZERO, Vec3::ZERO);
        em.update();

        let mut boundary = BoundarySystem::new(world()).with_response(BoundaryResponse::Destroy);
        boundary.enforce(&mut em);
        assert_eq!(boundary.destroyed(), &[gone]);
        assert!(!em.is_active(gone));
        assert!(em.is_active(stays));
        // Still visible until the next commit.
        assert_eq!(em.entities().len(), 2);
        em.update();
        assert_eq!(em.entities(), &[stays]);
    }

    #[test]
    fn static_entity_is_clamped() {
        let mut em = EntityManager::new();
        let e = em
            .spawn(EntityTag::Terrain)
            .with(Transform::from_xyz(0.0, 0.0, 15.0))
            .id();
        em.update();

        BoundarySystem::new(world()).enforce(&mut em);
        assert_eq!(em.get::<Transform>(e).position.z, 10.0);
    }
}
