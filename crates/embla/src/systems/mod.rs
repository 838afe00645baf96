//! # Systems — Per-Frame Operators Over an EntityManager
//!
//! A system is something that takes `&mut EntityManager` and a frame delta and
//! does its work. Cross-cutting state that belongs to one system (speed caps,
//! queued forces, response overrides) lives in side tables inside the system,
//! keyed by entity, and is pruned once the entity dies.
//!
//! ## Schedule
//!
//! A [`Schedule`] is just a `Vec` of boxed systems run in insertion order.
//! Scenes usually own one:
//!
//! ```ignore
//! let mut schedule = Schedule::new();
//! schedule.add(MovementSystem::new());
//! schedule.add(CollisionPipeline::new(CollisionDetectionSystem::with_grid(4.0),
//!                                     CollisionResolutionSystem::new()));
//! schedule.add(BoundarySystem::new(world_bounds));
//!
//! // each frame
//! entities.update();
//! schedule.run(&mut entities, dt);
//! ```
//!
//! No parallelism and no dependency graph: order is the order of `add`.

mod boundary;
mod broad_phase;
mod collision;
mod movement;
mod resolution;

pub use boundary::{BoundaryResponse, BoundarySystem};
pub use broad_phase::{BruteForce, SpatialPartition, UniformGrid};
pub use collision::{CollisionDetectionSystem, CollisionEvent, contact};
pub use movement::MovementSystem;
pub use resolution::{CollisionResolutionSystem, CollisionResponse};

use crate::ecs::EntityManager;

/// A per-frame operator over an [`EntityManager`].
pub trait System: Send {
    /// Short name for diagnostics.
    fn name(&self) -> &str;

    fn run(&mut self, entities: &mut EntityManager, dt: f32);
}

/// Detection followed by resolution of the detected events.
pub struct CollisionPipeline {
    pub detection: CollisionDetectionSystem,
    pub resolution: CollisionResolutionSystem,
}

impl CollisionPipeline {
    pub fn new(detection: CollisionDetectionSystem, resolution: CollisionResolutionSystem) -> Self {
        Self {
            detection,
            resolution,
        }
    }

    /// Events handled during the last run.
    pub fn events(&self) -> &[CollisionEvent] {
        self.detection.events()
    }
}

impl System for CollisionPipeline {
    fn name(&self) -> &str {
        "collisions"
    }

    fn run(&mut self, entities: &mut EntityManager, _dt: f32) {
        let events = self.detection.detect(entities);
        self.resolution.resolve(entities, events);
    }
}

/// Per-system timing recorded during a single [`Schedule::run`].
#[cfg(feature = "diagnostics")]
#[derive(Debug, Clone)]
pub struct SystemTiming {
    pub name: String,
    pub duration_us: f64,
}

/// An ordered list of systems.
#[derive(Default)]
pub struct Schedule {
    systems: Vec<Box<dyn System>>,
    #[cfg(feature = "diagnostics")]
    timings: Vec<SystemTiming>,
}

impl Schedule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a system; it runs after every system added before it.
    pub fn add(&mut self, system: impl System + 'static) -> &mut Self {
        self.systems.push(Box::new(system));
        self
    }

    pub fn len(&self) -> usize {
        self.systems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.systems.is_empty()
    }

    pub fn system_names(&self) -> Vec<&str> {
        self.systems.iter().map(|s| s.name()).collect()
    }

    /// Run every system once, in order.
    pub fn run(&mut self, entities: &mut EntityManager, dt: f32) {
        #[cfg(feature = "diagnostics")]
        self.timings.clear();

        for system in &mut self.systems {
            #[cfg(feature = "diagnostics")]
            let start = std::time::Instant::now();

            system.run(entities, dt);

            #[cfg(feature = "diagnostics")]
            self.timings.push(SystemTiming {
                name: system.name().to_string(),
                duration_us: start.elapsed().as_secs_f64() * 1_000_000.0,
            });
        }
    }

    /// Timings from the most recent `run()`.
    #[cfg(feature = "diagnostics")]
    pub fn timings(&self) -> &[SystemTiming] {
        &self.timings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{BoundingBox, Movement};
    use crate::ecs::EntityTag;
    use crate::math::{Aabb, Transform, Vec3};

    struct Counter(u32);

    impl System for Counter {
        fn name(&self) -> &str {
            "counter"
        }

        fn run(&mut self, _entities: &mut EntityManager, _dt: f32) {
            self.0 += 1;
        }
    }

    #[test]
    fn schedule_runs_in_insertion_order() {
        let mut schedule = Schedule::new();
        schedule
            .add(MovementSystem::new())
            .add(Counter(0))
            .add(BoundarySystem::new(Aabb::new(Vec3::splat(-1.0), Vec3::splat(1.0))));
        assert_eq!(schedule.system_names(), vec!["movement", "counter", "boundary"]);

        let mut em = EntityManager::new();
        schedule.run(&mut em, 0.016);
        #[cfg(feature = "diagnostics")]
        assert_eq!(schedule.timings().len(), 3);
    }

    #[test]
    fn pipeline_detects_and_resolves() {
        let mut em = EntityManager::new();
        let a = em
            .spawn(EntityTag::Default)
            .with(Transform::IDENTITY)
            .with(BoundingBox::from_half_extents(Vec3::ONE))
            .with(Movement::new(Vec3::X))
            .id();
        em.spawn(EntityTag::Default)
            .with(Transform::from_xy(1.5, 0.0))
            .with(BoundingBox::from_half_extents(Vec3::ONE))
            .with(Movement::new(-Vec3::X));
        em.update();

        let mut pipeline = CollisionPipeline::new(
            CollisionDetectionSystem::naive(),
            CollisionResolutionSystem::new(),
        );
        pipeline.run(&mut em, 0.016);
        assert_eq!(pipeline.events().len(), 1);
        assert!(em.get::<Movement>(a).velocity.x < 0.0);
    }
}
