//! Engine configuration, loaded from JSON.
//!
//! Every field has a default, so a config file only lists what it changes:
//!
//! ```json
//! {
//!   "world": { "max": [800.0, 600.0, 0.0], "boundary_response": "wrap" },
//!   "collision": { "broad_phase": { "uniform_grid": { "cell_size": 32.0 } } }
//! }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::math::{Aabb, Vec3};
use crate::systems::{
    BoundaryResponse, BoundarySystem, CollisionDetectionSystem, CollisionResolutionSystem,
    CollisionResponse, MovementSystem,
};

/// Errors from loading an [`EngineConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config value: {0}")]
    Invalid(String),
}

/// World bounds and what happens at them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    pub min: Vec3,
    pub max: Vec3,
    pub boundary_response: BoundaryResponse,
    /// Fraction of speed kept by a bounce.
    pub bounce_damping: f32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            min: Vec3::new(-100.0, -100.0, -100.0),
            max: Vec3::new(100.0, 100.0, 100.0),
            boundary_response: BoundaryResponse::Bounce,
            bounce_damping: 0.9,
        }
    }
}

impl WorldConfig {
    pub fn bounds(&self) -> Aabb {
        Aabb::new(self.min, self.max)
    }

    pub fn boundary_system(&self) -> BoundarySystem {
        BoundarySystem::new(self.bounds())
            .with_response(self.boundary_response)
            .with_bounce_damping(self.bounce_damping)
    }
}

/// Broad-phase strategy selector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BroadPhase {
    BruteForce,
    UniformGrid { cell_size: f32 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollisionConfig {
    pub broad_phase: BroadPhase,
    pub default_response: CollisionResponse,
    pub restitution: f32,
    pub damping_factor: f32,
    pub friction: f32,
}

impl Default for CollisionConfig {
    fn default() -> Self {
        Self {
            broad_phase: BroadPhase::BruteForce,
            default_response: CollisionResponse::Elastic,
            restitution: 1.0,
            damping_factor: 0.5,
            friction: 0.1,
        }
    }
}

impl CollisionConfig {
    pub fn detection_system(&self) -> CollisionDetectionSystem {
        match self.broad_phase {
            BroadPhase::BruteForce => CollisionDetectionSystem::naive(),
            BroadPhase::UniformGrid { cell_size } => CollisionDetectionSystem::with_grid(cell_size),
        }
    }

    pub fn resolution_system(&self) -> CollisionResolutionSystem {
        CollisionResolutionSystem::new()
            .with_default_response(self.default_response)
            .with_restitution(self.restitution)
            .with_damping(self.damping_factor, self.friction)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MovementConfig {
    /// Speed cap for entities without a per-entity override.
    pub max_speed: Option<f32>,
}

impl MovementConfig {
    pub fn movement_system(&self) -> MovementSystem {
        match self.max_speed {
            Some(max) => MovementSystem::new().with_max_speed(max),
            None => MovementSystem::new(),
        }
    }
}

/// Top-level engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub world: WorldConfig,
    pub collision: CollisionConfig,
    pub movement: MovementConfig,
}

impl EngineConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_json_str(&text)?;
        log::info!("loaded engine config from {}", path.display());
        Ok(config)
    }

    pub fn to_json_string(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject values the systems would panic on or misbehave with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let world = &self.world;
        if !(world.min.is_finite() && world.max.is_finite()) {
            return Err(ConfigError::Invalid(format!(
                "world bounds must be finite, got min {:?} max {:?}",
                world.min, world.max
            )));
        }
        if world.min.cmpgt(world.max).any() {
            return Err(ConfigError::Invalid(format!(
                "world min {:?} exceeds max {:?}",
                world.min, world.max
            )));
        }
        if let BroadPhase::UniformGrid { cell_size } = self.collision.broad_phase {
            if !(cell_size.is_finite() && cell_size > 0.0) {
                return Err(ConfigError::Invalid(format!(
                    "grid cell size must be positive, got {}",
                    cell_size
                )));
            }
        }
        if let Some(max) = self.movement.max_speed {
            if max.is_nan() || max < 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "max speed must not be negative, got {}",
                    max
                )));
            }
        }
        Ok(())
    }
}
