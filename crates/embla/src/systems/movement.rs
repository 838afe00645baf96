//! Explicit-Euler motion integration.
//!
//! Per frame, for every active entity with [`Transform`] and [`Movement`]:
//!
//! ```text
//! v += (acceleration + accumulated force) · dt + accumulated impulse
//! v  = clamp_length(v, max speed)
//! p += v · dt
//! ```
//!
//! Forces and impulses are queued through the system, not stored on the
//! entity, and are consumed by the integration step. Bodies have unit mass.

use std::collections::HashMap;

use crate::components::Movement;
use crate::ecs::{Entity, EntityManager};
use crate::math::{Transform, Vec3};

use super::System;

#[derive(Default)]
pub struct MovementSystem {
    /// Speed cap for entities without an override.
    default_max_speed: Option<f32>,
    max_speeds: HashMap<Entity, f32>,
    forces: HashMap<Entity, Vec3>,
    impulses: HashMap<Entity, Vec3>,
}

impl MovementSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_speed(mut self, max_speed: f32) -> Self {
        self.default_max_speed = Some(max_speed);
        self
    }

    /// Cap one entity's speed, overriding the default cap.
    pub fn set_max_speed(&mut self, entity: Entity, max_speed: f32) {
        self.max_speeds.insert(entity, max_speed);
    }

    pub fn clear_max_speed(&mut self, entity: Entity) {
        self.max_speeds.remove(&entity);
    }

    pub fn max_speed_for(&self, entity: Entity) -> Option<f32> {
        self.max_speeds.get(&entity).copied().or(self.default_max_speed)
    }

    /// Add a force applied over the next integration step.
    pub fn apply_force(&mut self, entity: Entity, force: Vec3) {
        *self.forces.entry(entity).or_insert(Vec3::ZERO) += force;
    }

    /// Add an instantaneous velocity change for the next integration step.
    pub fn apply_impulse(&mut self, entity: Entity, impulse: Vec3) {
        *self.impulses.entry(entity).or_insert(Vec3::ZERO) += impulse;
    }

    pub fn pending_force(&self, entity: Entity) -> Vec3 {
        self.forces.get(&entity).copied().unwrap_or(Vec3::ZERO)
    }

    pub fn update(&mut self, entities: &mut EntityManager, dt: f32) {
        for i in 0..entities.entities().len() {
            let entity = entities.entities()[i];
            if !entities.is_active(entity) || !entities.has::<Transform>(entity) {
                continue;
            }
            let max_speed = self.max_speed_for(entity);
            let Some(movement) = entities.try_get_mut::<Movement>(entity) else {
                continue;
            };

            let force = self.forces.remove(&entity).unwrap_or(Vec3::ZERO);
            let impulse = self.impulses.remove(&entity).unwrap_or(Vec3::ZERO);
            movement.velocity += (movement.acceleration + force) * dt + impulse;
            if let Some(max) = max_speed {
                movement.velocity = movement.velocity.clamp_length_max(max);
            }
            let velocity = movement.velocity;

            entities.get_mut::<Transform>(entity).position += velocity * dt;
        }

        self.max_speeds.retain(|&e, _| entities.is_active(e));
        self.forces.retain(|&e, _| entities.is_active(e));
        self.impulses.retain(|&e, _| entities.is_active(e));
    }
}

impl System for MovementSystem {
    fn name(&self) -> &str {
        "movement"
    }

    fn run(&mut self, entities: &mut EntityManager, dt: f32) {
        self.update(entities, dt);
    }
}
