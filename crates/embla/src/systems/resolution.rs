//! Collision response.
//!
//! Each colliding pair gets one [`CollisionResponse`], picked from the two
//! entities' preferences:
//!
//! ```text
//! preference lookup:  per-entity override → per-tag preference → default
//! combining a and b:  ABSORB       beats everything
//!                     DAMPED       beats ELASTIC
//!                     PASS_THROUGH yields to anything else
//! ```
//!
//! Bodies are equal-mass. An entity without a [`Movement`] component is
//! static: it never moves and the moving body takes the whole impulse.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::components::Movement;
use crate::ecs::{Entity, EntityManager, EntityTag};
use crate::math::{Transform, Vec3};

use super::collision::CollisionEvent;

/// How a colliding pair reacts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollisionResponse {
    /// Restitution-based bounce.
    #[default]
    Elastic,
    /// Bounce with reduced restitution plus tangential friction.
    Damped,
    /// Both bodies stop dead.
    Absorb,
    /// No reaction.
    PassThrough,
}

impl CollisionResponse {
    fn rank(self) -> u8 {
        match self {
            CollisionResponse::PassThrough => 0,
            CollisionResponse::Elastic => 1,
            CollisionResponse::Damped => 2,
            CollisionResponse::Absorb => 3,
        }
    }

    /// The response used when two bodies with these preferences collide.
    pub fn combine(self, other: CollisionResponse) -> CollisionResponse {
        if other.rank() > self.rank() { other } else { self }
    }
}

/// Applies impulses and positional correction for detected collisions.
pub struct CollisionResolutionSystem {
    default_response: CollisionResponse,
    tag_responses: HashMap<EntityTag, CollisionResponse>,
    overrides: HashMap<Entity, CollisionResponse>,
    /// Fraction of normal velocity kept after an elastic bounce.
    restitution: f32,
    /// Multiplier on restitution for damped bounces.
    damping_factor: f32,
    /// Fraction of tangential velocity removed by a damped contact.
    friction: f32,
}

impl CollisionResolutionSystem {
    pub fn new() -> Self {
        Self {
            default_response: CollisionResponse::Elastic,
            tag_responses: HashMap::new(),
            overrides: HashMap::new(),
            restitution: 1.0,
            damping_factor: 0.5,
            friction: 0.1,
        }
    }

    pub fn with_restitution(mut self, restitution: f32) -> Self {
        self.restitution = restitution.clamp(0.0, 1.0);
        self
    }

    pub fn with_damping(mut self, damping_factor: f32, friction: f32) -> Self {
        self.damping_factor = damping_factor.clamp(0.0, 1.0);
        self.friction = friction.clamp(0.0, 1.0);
        self
    }

    pub fn with_default_response(mut self, response: CollisionResponse) -> Self {
        self.default_response = response;
        self
    }

    pub fn set_tag_response(&mut self, tag: EntityTag, response: CollisionResponse) {
        self.tag_responses.insert(tag, response);
    }

    /// Override the response for one entity, taking precedence over its tag.
    pub fn set_entity_response(&mut self, entity: Entity, response: CollisionResponse) {
        self.overrides.insert(entity, response);
    }

    pub fn clear_entity_response(&mut self, entity: Entity) {
        self.overrides.remove(&entity);
    }

    /// The preference of a single entity.
    pub fn response_for(&self, entity: Entity) -> CollisionResponse {
        self.overrides
            .get(&entity)
            .or_else(|| self.tag_responses.get(&entity.tag()))
            .copied()
            .unwrap_or(self.default_response)
    }

    /// Resolve every event, in order.
    pub fn resolve(&mut self, entities: &mut EntityManager, events: &[CollisionEvent]) {
        for event in events {
            if !entities.is_active(event.a) || !entities.is_active(event.b) {
                continue;
            }
            let response = self.response_for(event.a).combine(self.response_for(event.b));
            match response {
                CollisionResponse::PassThrough => {}
                CollisionResponse::Absorb => absorb(entities, event),
                CollisionResponse::Elastic => self.bounce(entities, event, self.restitution, 0.0),
                CollisionResponse::Damped => self.bounce(
                    entities,
                    event,
                    self.restitution * self.damping_factor,
                    self.friction,
                ),
            }
        }
        self.overrides.retain(|&e, _| entities.is_active(e));
    }

    fn bounce(&self, entities: &mut EntityManager, event: &CollisionEvent, e: f32, friction: f32) {
        let va = entities.try_get::<Movement>(event.a).map(|m| m.velocity);
        let vb = entities.try_get::<Movement>(event.b).map(|m| m.velocity);
        let n = event.normal;

        // Share of impulse and separation each body takes.
        let (share_a, share_b) = match (va, vb) {
            (Some(_), Some(_)) => (0.5, 0.5),
            (Some(_), None) => (1.0, 0.0),
            (None, Some(_)) => (0.0, 1.0),
            (None, None) => return,
        };

        let relative = vb.unwrap_or(Vec3::ZERO) - va.unwrap_or(Vec3::ZERO);
        let vn = relative.dot(n);
        // Only approaching bodies exchange momentum.
        let j = if vn < 0.0 { -(1.0 + e) * vn } else { 0.0 };

        if share_a > 0.0 {
            apply(entities, event.a, -n, j * share_a, event.penetration * share_a, n, friction);
        }
        if share_b > 0.0 {
            apply(entities, event.b, n, j * share_b, event.penetration * share_b, n, friction);
        }
    }
}

/// Push one body along `dir` by `impulse` (velocity) and `separation`
/// (position), then bleed off tangential velocity.
fn apply(
    entities: &mut EntityManager,
    entity: Entity,
    dir: Vec3,
    impulse: f32,
    separation: f32,
    normal: Vec3,
    friction: f32,
) {
    if let Some(movement) = entities.try_get_mut::<Movement>(entity) {
        movement.velocity += dir * impulse;
        if friction > 0.0 {
            let normal_part = normal * movement.velocity.dot(normal);
            let tangential = movement.velocity - normal_part;
            movement.velocity = normal_part + tangential * (1.0 - friction);
        }
    }
    if let Some(transform) = entities.try_get_mut::<Transform>(entity) {
        transform.position += dir * separation;
    }
}

fn absorb(entities: &mut EntityManager, event: &CollisionEvent) {
    for entity in [event.a, event.b] {
        if let Some(movement) = entities.try_get_mut::<Movement>(entity) {
            movement.velocity = Vec3::ZERO;
            movement.acceleration = Vec3::ZERO;
        }
    }
}

impl Default for CollisionResolutionSystem {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::BoundingBox;
    use crate::systems::CollisionDetectionSystem;

    fn body(em: &mut EntityManager, tag: EntityTag, x: f32, vx: Option<f32>) -> Entity {
        let e = em
            .spawn(tag)
            .with(Transform::from_xy(x, 0.0))
            .with(BoundingBox::from_half_extents(Vec3::splat(1.0)))
            .id();
        if let Some(vx) = vx {
            em.add(e, Movement::new(Vec3::new(vx, 0.0, 0.0)));
        }
        e
    }

    fn step(em: &mut EntityManager, resolution: &mut CollisionResolutionSystem) {
        let mut detection = CollisionDetectionSystem::naive();
        let events = detection.detect(em).to_vec();
        assert!(!events.is_empty());
        resolution.resolve(em, &events);
    }

    fn vx(em: &EntityManager, e: Entity) -> f32 {
        em.get::<Movement>(e).velocity.x
    }

    #[test]
    fn combine_precedence() {
        use CollisionResponse::*;
        assert_eq!(Absorb.combine(PassThrough), Absorb);
        assert_eq!(Elastic.combine(Absorb), Absorb);
        assert_eq!(PassThrough.combine(Elastic), Elastic);
        assert_eq!(Damped.combine(PassThrough), Damped);
        assert_eq!(Elastic.combine(Damped), Damped);
        assert_eq!(PassThrough.combine(PassThrough), PassThrough);
    }

    #[test]
    fn elastic_equal_mass_swaps_velocities() {
        let mut em = EntityManager::new();
        let a = body(&mut em, EntityTag::Default, 0.0, Some(1.0));
        let b = body(&mut em, EntityTag::Default, 1.5, Some(-1.0));
        em.update();

        let mut resolution = CollisionResolutionSystem::new();
        step(&mut em, &mut resolution);
        assert!((vx(&em, a) + 1.0).abs() < 1e-6);
        assert!((vx(&em, b) - 1.0).abs() < 1e-6);
        // Separated by half the penetration each.
        assert!((em.get::<Transform>(a).position.x + 0.25).abs() < 1e-6);
        assert!((em.get::<Transform>(b).position.x - 1.75).abs() < 1e-6);
    }

    #[test]
    fn static_body_reflects_mover() {
        let mut em = EntityManager::new();
        let wall = body(&mut em, EntityTag::Terrain, 1.5, None);
        let ball = body(&mut em, EntityTag::Default, 0.0, Some(2.0));
        em.update();

        let mut resolution = CollisionResolutionSystem::new().with_restitution(0.5);
        step(&mut em, &mut resolution);
        assert!((vx(&em, ball) + 1.0).abs() < 1e-6);
        assert_eq!(em.get::<Transform>(wall).position.x, 1.5);
        assert!((em.get::<Transform>(ball).position.x + 0.5).abs() < 1e-6);
    }

    #[test]
    fn absorb_stops_both() {
        let mut em = EntityManager::new();
        let a = body(&mut em, EntityTag::Pickup, 0.0, Some(1.0));
        let b = body(&mut em, EntityTag::Player, 1.0, Some(-1.0));
        em.update();

        let mut resolution = CollisionResolutionSystem::new();
        resolution.set_tag_response(EntityTag::Pickup, CollisionResponse::Absorb);
        resolution.set_tag_response(EntityTag::Player, CollisionResponse::PassThrough);
        step(&mut em, &mut resolution);
        assert_eq!(em.get::<Movement>(a).velocity, Vec3::ZERO);
        assert_eq!(em.get::<Movement>(b).velocity, Vec3::ZERO);
    }

    #[test]
    fn pass_through_leaves_bodies_alone() {
        let mut em = EntityManager::new();
        let a = body(&mut em, EntityTag::Effect, 0.0, Some(1.0));
        let b = body(&mut em, EntityTag::Effect, 1.0, Some(-1.0));
        em.update();

        let mut resolution =
            CollisionResolutionSystem::new().with_default_response(CollisionResponse::PassThrough);
        step(&mut em, &mut resolution);
        assert_eq!(vx(&em, a), 1.0);
        assert_eq!(vx(&em, b), -1.0);
        assert_eq!(em.get::<Transform>(a).position.x, 0.0);
    }

    #[test]
    fn damped_bounce_loses_energy_and_tangent_speed() {
        let mut em = EntityManager::new();
        let wall = body(&mut em, EntityTag::Terrain, 1.5, None);
        let ball = body(&mut em, EntityTag::Default, 0.0, None);
        em.add(ball, Movement::new(Vec3::new(2.0, 1.0, 0.0)));
        em.update();

        let mut resolution = CollisionResolutionSystem::new().with_damping(0.5, 0.2);
        resolution.set_entity_response(wall, CollisionResponse::Damped);
        step(&mut em, &mut resolution);
        let v = em.get::<Movement>(ball).velocity;
        assert!((v.x + 1.0).abs() < 1e-6);
        assert!((v.y - 0.8).abs() < 1e-6);
    }

    #[test]
    fn separating_bodies_get_no_impulse() {
        let mut em = EntityManager::new();
        let a = body(&mut em, EntityTag::Default, 0.0, Some(-1.0));
        let b = body(&mut em, EntityTag::Default, 1.5, Some(1.0));
        em.update();

        let mut resolution = CollisionResolutionSystem::new();
        step(&mut em, &mut resolution);
        assert_eq!(vx(&em, a), -1.0);
        assert_eq!(vx(&em, b), 1.0);
    }

    #[test]
    fn entity_override_beats_tag_and_is_pruned() {
        let mut em = EntityManager::new();
        let a = body(&mut em, EntityTag::Enemy, 0.0, Some(1.0));
        em.update();

        let mut resolution = CollisionResolutionSystem::new();
        resolution.set_tag_response(EntityTag::Enemy, CollisionResponse::Damped);
        resolution.set_entity_response(a, CollisionResponse::Absorb);
        assert_eq!(resolution.response_for(a), CollisionResponse::Absorb);

        em.destroy(a);
        resolution.resolve(&mut em, &[]);
        assert_eq!(resolution.response_for(a), CollisionResponse::Damped);
    }
}
