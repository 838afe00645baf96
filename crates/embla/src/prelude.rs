//! Convenience re-exports. `use embla::prelude::*` for the common items.

#[cfg(feature = "diagnostics")]
pub use crate::app::FrameTimings;
pub use crate::app::{App, FrameReport};
pub use crate::components::{BoundingBox, Color, Movement, Polygon, Shape, TriangleMesh};
pub use crate::config::{
    BroadPhase, CollisionConfig, ConfigError, EngineConfig, MovementConfig, WorldConfig,
};
pub use crate::ecs::{Entity, EntityBuilder, EntityId, EntityManager, EntityTag};
pub use crate::input::{Input, InputCode, InputEvent, InputState};
pub use crate::math::{Aabb, Mat4, Quat, Transform, Vec2, Vec3, Vec4};
pub use crate::render::{DrawItem, DrawKind, DrawList, Renderer};
pub use crate::scene::{
    Action, ActionKind, ActionMap, Scene, SceneError, SceneManager, SceneState, SharedScene,
    TransitionOutcome, TransitionStats,
};
pub use crate::systems::{
    BoundaryResponse, BoundarySystem, CollisionDetectionSystem, CollisionEvent,
    CollisionPipeline, CollisionResolutionSystem, CollisionResponse, MovementSystem, Schedule,
    System,
};
pub use crate::time::Time;
