//! Frame timing and delta time.
//!
//! [`Time`] is advanced by the [`App`](crate::app::App) at the start of each
//! frame. It can follow the wall clock ([`tick`](Time::tick)) or be stepped
//! by a fixed amount ([`advance`](Time::advance)) for headless runs and tests.

use std::time::{Duration, Instant};

/// Frame timing state.
#[derive(Debug, Clone, Copy)]
pub struct Time {
    /// When the current frame started.
    frame_start: Instant,
    /// Duration of the previous frame.
    delta: Duration,
    /// Total time since startup.
    elapsed: Duration,
    /// Frame counter.
    frame_count: u64,
}

impl Time {
    pub fn new() -> Self {
        Self {
            frame_start: Instant::now(),
            delta: Duration::ZERO,
            elapsed: Duration::ZERO,
            frame_count: 0,
        }
    }

    /// Measure the frame against the wall clock.
    pub fn tick(&mut self) {
        let now = Instant::now();
        let delta = now - self.frame_start;
        self.frame_start = now;
        self.advance(delta);
    }

    /// Step by a fixed delta, ignoring the wall clock.
    pub fn advance(&mut self, delta: Duration) {
        self.delta = delta;
        self.elapsed += delta;
        self.frame_count += 1;
    }

    /// Duration of the previous frame.
    pub fn delta(&self) -> Duration {
        self.delta
    }

    /// Delta time in seconds (f32), the most common way to use it.
    pub fn delta_secs(&self) -> f32 {
        self.delta.as_secs_f32()
    }

    /// Total elapsed time.
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn elapsed_secs(&self) -> f32 {
        self.elapsed.as_secs_f32()
    }

    /// Number of frames so far.
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Estimated FPS based on the last frame's delta.
    pub fn fps(&self) -> f32 {
        if self.delta.as_secs_f32() > 0.0 {
            1.0 / self.delta.as_secs_f32()
        } else {
            0.0
        }
    }
}

impl Default for Time {
    fn default() -> Self {
        Self::new()
    }
}
