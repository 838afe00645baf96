//! # SceneManager — Thread-Safe Scene Lifecycle
//!
//! Owns the registered scene factories, the current scene, and a FIFO queue
//! of transition requests.
//!
//! ## Request / Process Split
//!
//! ```text
//!   any thread                            frame-loop thread
//!   ──────────                            ─────────────────
//!   request_scene_transition("game") ──▶  queue: ["game"]
//!                                         process_transitions():
//!                                           pop "game"
//!                                           unload current   (UNLOADING)
//!                                           factory()        (LOADING)
//!                                           on_load()
//!                                           publish          (ACTIVE)
//! ```
//!
//! Producers only enqueue. The single consumer performs one transition per
//! call, at a frame boundary, so a scene's own input handler can ask for a
//! transition without swapping itself out from under its own call stack.
//!
//! ## State Machine
//!
//! ```text
//! INACTIVE ──load ok──▶ ACTIVE ──new request──▶ UNLOADING ──ok──▶ INACTIVE
//!                                                  │                 │
//!                                            unload error      LOADING (new)
//!                                                  │                 │
//!                                                  ▼          error/panic
//!                                      old scene ACTIVE again        │
//!                                                                    ▼
//!                       ACTIVE (previous) ◀──rollback ok── FAILED
//!                                                           │
//!                                              rollback failed / no previous
//!                                                           ▼
//!                                         FAILED, no current scene
//! ```
//!
//! Scene work (factory, `on_load`, `on_unload`) runs outside the state lock.
//! The lock only guards publication, so [`get_current_scene`] never blocks on
//! a slow load and never sees a scene that isn't `ACTIVE`.
//!
//! ## Failure Handling
//!
//! Errors returned by scene hooks and panics raised inside them are caught
//! here, logged, counted, and converted into a rollback. Nothing propagates
//! to the frame loop.
//!
//! [`get_current_scene`]: SceneManager::get_current_scene

use std::any::Any;
use std::collections::{HashMap, VecDeque};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use parking_lot::Mutex;

use super::{Scene, SceneError};

/// A scene shared between the manager and the frame loop.
pub type SharedScene = Arc<Mutex<Box<dyn Scene>>>;

/// Builds a fresh scene instance for each transition to it.
pub type SceneFactory = Arc<dyn Fn() -> Result<Box<dyn Scene>, SceneError> + Send + Sync>;

/// Lifecycle state of the current scene context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SceneState {
    Inactive,
    Loading,
    Active,
    Unloading,
    Failed,
}

/// Read-only transition counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransitionStats {
    /// Transitions attempted (skipped requests are not counted).
    pub total: u64,
    /// Attempts that ended in a rollback or the `Failed` state.
    pub failed: u64,
    /// Requests waiting in the queue.
    pub pending: usize,
}

/// What a call to [`SceneManager::process_transitions`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionOutcome {
    /// The queue was empty.
    Idle,
    /// The requested scene was already active and the request wasn't forced.
    Skipped { scene: String },
    /// The requested scene is now active.
    Activated { scene: String },
    /// The transition failed; `scene` (the one that was active before) is
    /// active again.
    RolledBack { scene: String, error: SceneError },
    /// The transition failed and no scene could be restored.
    Failed { error: SceneError },
}

struct SceneContext {
    name: String,
    scene: Option<SharedScene>,
    state: SceneState,
    error: Option<String>,
}

impl SceneContext {
    fn active(name: String, scene: SharedScene) -> Self {
        Self {
            name,
            scene: Some(scene),
            state: SceneState::Active,
            error: None,
        }
    }

    fn pending(name: String, state: SceneState) -> Self {
        Self {
            name,
            scene: None,
            state,
            error: None,
        }
    }
}

struct TransitionRequest {
    name: String,
    force: bool,
}

struct Inner {
    factories: HashMap<String, SceneFactory>,
    current: Option<SceneContext>,
    queue: VecDeque<TransitionRequest>,
    total: u64,
    failed: u64,
    last_error: Option<String>,
}

impl Inner {
    fn is_active(&self, name: &str) -> bool {
        self.current
            .as_ref()
            .is_some_and(|ctx| ctx.state == SceneState::Active && ctx.name == name)
    }

    fn record_failure(&mut self, error: &SceneError) {
        self.failed += 1;
        self.last_error = Some(error.to_string());
    }
}

/// Thread-safe scene registry and transition driver.
///
/// `register_scene`, `request_scene_transition`, `get_current_scene` and the
/// statistics accessors may be called from any thread. `process_transitions`
/// belongs to the frame-loop thread; a concurrent second caller gets
/// [`SceneError::Busy`].
pub struct SceneManager {
    inner: Mutex<Inner>,
    /// Held for the duration of a transition.
    processing: Mutex<()>,
}

impl SceneManager {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                factories: HashMap::new(),
                current: None,
                queue: VecDeque::new(),
                total: 0,
                failed: 0,
                last_error: None,
            }),
            processing: Mutex::new(()),
        }
    }

    // ── Registration ─────────────────────────────────────────────────

    /// Register a factory under `name`, replacing any previous one.
    pub fn register_scene<F>(&self, name: &str, factory: F) -> Result<(), SceneError>
    where
        F: Fn() -> Result<Box<dyn Scene>, SceneError> + Send + Sync + 'static,
    {
        self.register_factory(name, Arc::new(factory))
    }

    /// Register an already-shared factory under `name`.
    pub fn register_factory(&self, name: &str, factory: SceneFactory) -> Result<(), SceneError> {
        if name.is_empty() {
            return Err(SceneError::InvalidArgument(
                "scene name must not be empty".into(),
            ));
        }
        let mut inner = self.inner.lock();
        if inner.factories.insert(name.to_string(), factory).is_some() {
            log::debug!("replaced factory for scene '{}'", name);
        } else {
            log::debug!("registered scene '{}'", name);
        }
        Ok(())
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.inner.lock().factories.contains_key(name)
    }

    /// Registered scene names, sorted.
    pub fn registered_scenes(&self) -> Vec<String> {
        let mut names: Vec<String> = self.inner.lock().factories.keys().cloned().collect();
        names.sort();
        names
    }

    // ── Requests ─────────────────────────────────────────────────────

    /// Queue a transition to `name`.
    ///
    /// Returns `Ok(false)` without queueing when `name` is already the active
    /// scene and `force` is false.
    pub fn request_scene_transition(&self, name: &str, force: bool) -> Result<bool, SceneError> {
        let mut inner = self.inner.lock();
        Self::validate(&inner, name)?;
        if !force && inner.is_active(name) {
            log::debug!("scene '{}' already active, request ignored", name);
            return Ok(false);
        }
        inner.queue.push_back(TransitionRequest {
            name: name.to_string(),
            force,
        });
        log::debug!(
            "queued transition to '{}' ({} pending)",
            name,
            inner.queue.len()
        );
        Ok(true)
    }

    fn validate(inner: &Inner, name: &str) -> Result<(), SceneError> {
        if name.is_empty() {
            return Err(SceneError::InvalidArgument(
                "scene name must not be empty".into(),
            ));
        }
        if !inner.factories.contains_key(name) {
            log::error!("transition requested to unregistered scene '{}'", name);
            return Err(SceneError::NotRegistered(name.to_string()));
        }
        Ok(())
    }

    // ── Processing ───────────────────────────────────────────────────

    /// Perform the oldest queued transition, if any.
    ///
    /// Call once per frame from the frame-loop thread. Scene failures are
    /// reported through the returned [`TransitionOutcome`], never as `Err`;
    /// the only error is [`SceneError::Busy`] when another thread is already
    /// inside this method.
    pub fn process_transitions(&self) -> Result<TransitionOutcome, SceneError> {
        let Some(_processing) = self.processing.try_lock() else {
            log::warn!("process_transitions called concurrently; ignoring this call");
            return Err(SceneError::Busy);
        };
        let request = self.inner.lock().queue.pop_front();
        match request {
            Some(request) => Ok(self.run_transition(request)),
            None => Ok(TransitionOutcome::Idle),
        }
    }

    /// Load `name` immediately, bypassing the queue.
    ///
    /// Kept for callers that need a scene before the first frame. Calling this
    /// from inside a scene hook or while holding the current scene's lock
    /// deadlocks, because the transition must lock that scene to unload it.
    /// Prefer [`request_scene_transition`](Self::request_scene_transition).
    pub fn load_scene_now(&self, name: &str) -> Result<TransitionOutcome, SceneError> {
        Self::validate(&self.inner.lock(), name)?;
        let Some(_processing) = self.processing.try_lock() else {
            return Err(SceneError::Busy);
        };
        Ok(self.run_transition(TransitionRequest {
            name: name.to_string(),
            force: true,
        }))
    }

    fn run_transition(&self, request: TransitionRequest) -> TransitionOutcome {
        let TransitionRequest { name, force } = request;

        // Mark the outgoing scene as unloading and take what we need.
        let (factory, previous) = {
            let mut inner = self.inner.lock();
            if !force && inner.is_active(&name) {
                log::debug!("scene '{}' already active, transition skipped", name);
                return TransitionOutcome::Skipped { scene: name };
            }
            inner.total += 1;
            let Some(factory) = inner.factories.get(&name).cloned() else {
                let error = SceneError::NotRegistered(name);
                inner.record_failure(&error);
                return TransitionOutcome::Failed { error };
            };
            let previous = match inner.current.take() {
                Some(SceneContext {
                    name: prev_name,
                    scene: Some(scene),
                    state: SceneState::Active,
                    ..
                }) => Some((prev_name, scene)),
                _ => None,
            };
            if let Some((prev_name, _)) = &previous {
                inner.current = Some(SceneContext::pending(
                    prev_name.clone(),
                    SceneState::Unloading,
                ));
            }
            (factory, previous)
        };

        if let Some((prev_name, prev_scene)) = &previous {
            log::info!("unloading scene '{}'", prev_name);
            if let Err(error) = guarded(prev_name, || prev_scene.lock().on_unload()) {
                log::error!("{}; keeping '{}' active", error, prev_name);
                let mut inner = self.inner.lock();
                inner.record_failure(&error);
                inner.current = Some(SceneContext::active(prev_name.clone(), prev_scene.clone()));
                return TransitionOutcome::RolledBack {
                    scene: prev_name.clone(),
                    error,
                };
            }
        }

        self.inner.lock().current = Some(SceneContext::pending(name.clone(), SceneState::Loading));

        log::info!("loading scene '{}'", name);
        let loaded = guarded(&name, || {
            let mut scene = factory().map_err(|e| SceneError::Factory {
                scene: name.clone(),
                message: e.to_string(),
            })?;
            scene.on_load()?;
            Ok(scene)
        });

        match loaded {
            Ok(scene) => {
                self.inner.lock().current =
                    Some(SceneContext::active(name.clone(), Arc::new(Mutex::new(scene))));
                log::info!("scene '{}' active", name);
                TransitionOutcome::Activated { scene: name }
            }
            Err(error) => self.roll_back(name, previous, error),
        }
    }

    fn roll_back(
        &self,
        failed_scene: String,
        previous: Option<(String, SharedScene)>,
        error: SceneError,
    ) -> TransitionOutcome {
        log::error!("{}", error);
        {
            let mut inner = self.inner.lock();
            inner.record_failure(&error);
            inner.current = Some(SceneContext {
                name: failed_scene,
                scene: None,
                state: SceneState::Failed,
                error: Some(error.to_string()),
            });
        }

        let Some((prev_name, prev_scene)) = previous else {
            log::warn!("no previous scene to roll back to");
            return TransitionOutcome::Failed { error };
        };

        match guarded(&prev_name, || prev_scene.lock().on_load()) {
            Ok(()) => {
                log::warn!("rolled back to scene '{}'", prev_name);
                self.inner.lock().current = Some(SceneContext::active(prev_name.clone(), prev_scene));
                TransitionOutcome::RolledBack {
                    scene: prev_name,
                    error,
                }
            }
            Err(rollback_error) => {
                log::error!("rollback to '{}' failed: {}", prev_name, rollback_error);
                let mut inner = self.inner.lock();
                let message = format!("{}; rollback failed: {}", error, rollback_error);
                if let Some(ctx) = inner.current.as_mut() {
                    ctx.error = Some(message.clone());
                }
                inner.last_error = Some(message);
                TransitionOutcome::Failed { error }
            }
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    /// The current scene, only if it is `ACTIVE`.
    pub fn get_current_scene(&self) -> Option<SharedScene> {
        let inner = self.inner.lock();
        inner
            .current
            .as_ref()
            .filter(|ctx| ctx.state == SceneState::Active)
            .and_then(|ctx| ctx.scene.clone())
    }

    /// State of the current scene context; `Inactive` when there is none.
    pub fn current_scene_state(&self) -> SceneState {
        self.inner
            .lock()
            .current
            .as_ref()
            .map_or(SceneState::Inactive, |ctx| ctx.state)
    }

    /// Name of the current scene context, whatever its state.
    pub fn current_scene_name(&self) -> Option<String> {
        self.inner.lock().current.as_ref().map(|ctx| ctx.name.clone())
    }

    /// Error message of the current context if it failed, otherwise the most
    /// recent transition error.
    pub fn last_error(&self) -> Option<String> {
        let inner = self.inner.lock();
        inner
            .current
            .as_ref()
            .and_then(|ctx| ctx.error.clone())
            .or_else(|| inner.last_error.clone())
    }

    pub fn pending_transitions(&self) -> usize {
        self.inner.lock().queue.len()
    }

    pub fn stats(&self) -> TransitionStats {
        let inner = self.inner.lock();
        TransitionStats {
            total: inner.total,
            failed: inner.failed,
            pending: inner.queue.len(),
        }
    }

    // ── Shutdown ─────────────────────────────────────────────────────

    /// Drop queued requests and unload the active scene.
    ///
    /// Unload errors are logged and otherwise ignored. Like
    /// [`load_scene_now`](Self::load_scene_now), calling this while holding
    /// the current scene's lock deadlocks.
    ///
    /// Drop runs a non-blocking variant instead. A scene that holds a `Weak`
    /// back-reference may upgrade it inside a hook and end up releasing the
    /// last `Arc` while its own lock is held. In that case the unload hook is
    /// skipped with a warning rather than locking the scene a second time.
    pub fn shutdown(&self) {
        let _processing = self.processing.lock();
        let Some((name, scene)) = self.take_active() else {
            return;
        };
        log::info!("shutting down, unloading scene '{}'", name);
        let result = guarded(&name, || scene.lock().on_unload());
        if let Err(error) = result {
            log::error!("{}", error);
        }
    }

    fn shutdown_on_drop(&self) {
        let Some(_processing) = self.processing.try_lock() else {
            log::warn!("scene manager dropped during a transition; skipping unload");
            return;
        };
        let Some((name, scene)) = self.take_active() else {
            return;
        };
        let Some(mut guard) = scene.try_lock() else {
            log::warn!(
                "scene '{}' is locked while its manager drops; skipping unload",
                name
            );
            return;
        };
        log::info!("shutting down, unloading scene '{}'", name);
        if let Err(error) = guarded(&name, || guard.on_unload()) {
            log::error!("{}", error);
        }
    }

    /// Clear the queue and detach the current scene if it is active.
    fn take_active(&self) -> Option<(String, SharedScene)> {
        let current = {
            let mut inner = self.inner.lock();
            inner.queue.clear();
            inner.current.take()
        };
        match current {
            Some(SceneContext {
                name,
                scene: Some(scene),
                state: SceneState::Active,
                ..
            }) => Some((name, scene)),
            _ => None,
        }
    }
}

impl Default for SceneManager {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for SceneManager {
    fn drop(&mut self) {
        self.shutdown_on_drop();
    }
}

impl std::fmt::Debug for SceneManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("SceneManager")
            .field("current", &inner.current.as_ref().map(|c| (&c.name, c.state)))
            .field("pending", &inner.queue.len())
            .field("scene_count", &inner.factories.len())
            .finish()
    }
}

/// Run a scene hook, turning a panic into [`SceneError::Panicked`].
fn guarded<T>(scene: &str, f: impl FnOnce() -> Result<T, SceneError>) -> Result<T, SceneError> {
    panic::catch_unwind(AssertUnwindSafe(f)).unwrap_or_else(|payload| {
        Err(SceneError::Panicked {
            scene: scene.to_string(),
            message: panic_message(payload.as_ref()),
        })
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
