//! # App — Headless Frame Driver
//!
//! Ties the pieces together in the order a frame needs them:
//!
//! ```text
//! frame(dt, renderer):
//!   1. time.advance(dt)
//!   2. scenes.process_transitions()     ← at most one scene swap
//!   3. current scene.update(dt)         ← entities.update() + systems
//!   4. renderer.render(scene.entities())
//!   5. input.clear_just()
//! ```
//!
//! Windowing is not part of the crate: a platform layer translates its events
//! into [`InputEvent`]s, calls [`App::handle_input`], and calls
//! [`App::frame`] once per displayed frame.
//!
//! With the `diagnostics` feature, each frame records how long every phase
//! took ([`App::frame_timings`]).

use std::sync::Arc;
use std::time::Duration;

use crate::config::EngineConfig;
use crate::input::{Input, InputCode, InputEvent};
use crate::render::Renderer;
use crate::scene::{SceneError, SceneManager, TransitionOutcome};
use crate::time::Time;

/// Phase durations of the most recent frame, in microseconds.
#[cfg(feature = "diagnostics")]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameTimings {
    pub transitions_us: f64,
    pub update_us: f64,
    pub render_us: f64,
}

/// What happened during one [`App::frame`].
#[derive(Debug, Clone, PartialEq)]
pub struct FrameReport {
    /// The transition performed this frame, if the queue wasn't empty.
    pub transition: Option<TransitionOutcome>,
    /// Name of the scene that was updated and rendered.
    pub scene: Option<String>,
}

pub struct App {
    scenes: Arc<SceneManager>,
    config: EngineConfig,
    time: Time,
    input: Input<InputCode>,
    #[cfg(feature = "diagnostics")]
    timings: FrameTimings,
}

impl App {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            scenes: Arc::new(SceneManager::new()),
            config,
            time: Time::new(),
            input: Input::new(),
            #[cfg(feature = "diagnostics")]
            timings: FrameTimings::default(),
        }
    }

    /// The scene manager, shareable with other threads.
    pub fn scenes(&self) -> &Arc<SceneManager> {
        &self.scenes
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn time(&self) -> &Time {
        &self.time
    }

    pub fn input(&self) -> &Input<InputCode> {
        &self.input
    }

    #[cfg(feature = "diagnostics")]
    pub fn frame_timings(&self) -> FrameTimings {
        self.timings
    }

    /// Record an input event and dispatch it to the current scene.
    ///
    /// Returns `true` if the scene had an action bound to it.
    pub fn handle_input(&mut self, event: &InputEvent) -> bool {
        self.input.apply(event);
        match self.scenes.get_current_scene() {
            Some(scene) => scene.lock().handle_input(event),
            None => false,
        }
    }

    /// Run one frame.
    pub fn frame(&mut self, dt: Duration, renderer: &mut impl Renderer) -> FrameReport {
        self.time.advance(dt);

        #[cfg(feature = "diagnostics")]
        let start = std::time::Instant::now();

        let transition = match self.scenes.process_transitions() {
            Ok(TransitionOutcome::Idle) => None,
            Ok(outcome) => Some(outcome),
            Err(SceneError::Busy) => None,
            Err(e) => {
                log::error!("scene transition error: {}", e);
                None
            }
        };

        #[cfg(feature = "diagnostics")]
        let after_transitions = std::time::Instant::now();
        #[cfg(feature = "diagnostics")]
        let mut after_update = after_transitions;

        let mut scene_name = None;
        if let Some(scene) = self.scenes.get_current_scene() {
            let mut scene = scene.lock();
            scene.update(self.time.delta_secs());
            #[cfg(feature = "diagnostics")]
            {
                after_update = std::time::Instant::now();
            }
            renderer.render(scene.entities());
            scene_name = Some(scene.name().to_string());
        }

        #[cfg(feature = "diagnostics")]
        {
            let end = std::time::Instant::now();
            self.timings = FrameTimings {
                transitions_us: (after_transitions - start).as_secs_f64() * 1_000_000.0,
                update_us: (after_update - after_transitions).as_secs_f64() * 1_000_000.0,
                render_us: (end - after_update).as_secs_f64() * 1_000_000.0,
            };
        }

        self.input.clear_just();
        FrameReport {
            transition,
            scene: scene_name,
        }
    }

    /// Run `frames` frames with a fixed step.
    pub fn run_frames(&mut self, frames: u32, dt: Duration, renderer: &mut impl Renderer) {
        for _ in 0..frames {
            self.frame(dt, renderer);
        }
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}
