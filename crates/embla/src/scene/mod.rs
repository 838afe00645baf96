//! Scenes: isolated units of gameplay state and the manager that swaps them.
//!
//! A [`Scene`] owns its own [`EntityManager`], its systems, and its
//! [`ActionMap`]. The [`SceneManager`] decides which one is current and runs
//! transitions between them at frame boundaries.

mod action;
mod manager;

pub use action::{Action, ActionKind, ActionMap};
pub use manager::{
    SceneFactory, SceneManager, SceneState, SharedScene, TransitionOutcome, TransitionStats,
};

use crate::ecs::EntityManager;
use crate::input::InputEvent;

/// Errors surfaced by scene registration and scene lifecycle hooks.
///
/// Lifecycle errors never escape [`SceneManager::process_transitions`]: they
/// are logged and turned into a rollback or the `Failed` state.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SceneError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("no scene registered under '{0}'")]
    NotRegistered(String),

    #[error("factory for scene '{scene}' failed: {message}")]
    Factory { scene: String, message: String },

    #[error("scene '{scene}' failed to load: {message}")]
    Load { scene: String, message: String },

    #[error("scene '{scene}' failed to unload: {message}")]
    Unload { scene: String, message: String },

    #[error("scene '{scene}' panicked: {message}")]
    Panicked { scene: String, message: String },

    #[error("scene transitions are already being processed on another thread")]
    Busy,
}

impl SceneError {
    /// Shorthand for a load failure raised from [`Scene::on_load`].
    pub fn load(scene: impl Into<String>, message: impl Into<String>) -> Self {
        SceneError::Load {
            scene: scene.into(),
            message: message.into(),
        }
    }

    /// Shorthand for an unload failure raised from [`Scene::on_unload`].
    pub fn unload(scene: impl Into<String>, message: impl Into<String>) -> Self {
        SceneError::Unload {
            scene: scene.into(),
            message: message.into(),
        }
    }
}

/// A swappable unit of gameplay state.
///
/// Scenes are created by a registered factory, loaded, updated once per
/// frame while current, and unloaded when replaced. The manager moves them
/// between threads, hence `Send`.
pub trait Scene: Send {
    /// Display name, used in logs.
    fn name(&self) -> &str;

    /// Acquire resources and spawn initial entities. An error aborts the
    /// transition and triggers a rollback.
    fn on_load(&mut self) -> Result<(), SceneError> {
        Ok(())
    }

    /// Release resources before the scene is replaced.
    fn on_unload(&mut self) -> Result<(), SceneError> {
        Ok(())
    }

    /// Advance one frame: commit entity changes, then run systems.
    fn update(&mut self, dt: f32);

    /// React to a named action produced by the scene's [`ActionMap`].
    fn do_action(&mut self, action: &Action) {
        let _ = action;
    }

    fn entities(&self) -> &EntityManager;

    fn entities_mut(&mut self) -> &mut EntityManager;

    fn action_map(&self) -> &ActionMap;

    /// Translate a raw input event through the action map and dispatch it.
    ///
    /// Returns `true` if the event was bound to an action.
    fn handle_input(&mut self, event: &InputEvent) -> bool {
        match self.action_map().translate(event) {
            Some(action) => {
                self.do_action(&action);
                true
            }
            None => false,
        }
    }
}
