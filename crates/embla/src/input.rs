//! Keyboard and mouse input state.
//!
//! The windowing layer translates its native events into [`InputEvent`]s.
//! [`Input`] tracks which codes are currently pressed, just pressed this
//! frame, or just released this frame; scenes map events to named actions via
//! [`ActionMap`](crate::scene::ActionMap).

use std::collections::HashSet;
use std::hash::Hash;

use crate::math::Vec2;

/// An abstract input source: a keyboard key or a mouse button, identified by
/// the windowing layer's numeric code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(serde::Serialize, serde::Deserialize)]
pub enum InputCode {
    Key(u32),
    Mouse(u8),
}

/// Whether an input went down or up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputState {
    Pressed,
    Released,
}

/// A raw input event, already translated from the windowing layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InputEvent {
    pub code: InputCode,
    pub state: InputState,
    /// Cursor position for mouse events, in window coordinates.
    pub position: Option<Vec2>,
}

impl InputEvent {
    pub fn key_pressed(key: u32) -> Self {
        Self {
            code: InputCode::Key(key),
            state: InputState::Pressed,
            position: None,
        }
    }

    pub fn key_released(key: u32) -> Self {
        Self {
            code: InputCode::Key(key),
            state: InputState::Released,
            position: None,
        }
    }

    pub fn mouse_pressed(button: u8, position: Vec2) -> Self {
        Self {
            code: InputCode::Mouse(button),
            state: InputState::Pressed,
            position: Some(position),
        }
    }

    pub fn mouse_released(button: u8, position: Vec2) -> Self {
        Self {
            code: InputCode::Mouse(button),
            state: InputState::Released,
            position: Some(position),
        }
    }
}

/// Tracks the state of a set of inputs (keys or mouse buttons).
///
/// - `pressed`: currently held down
/// - `just_pressed`: pressed this frame (not held last frame)
/// - `just_released`: released this frame
pub struct Input<T: Eq + Hash + Copy> {
    pressed: HashSet<T>,
    just_pressed: HashSet<T>,
    just_released: HashSet<T>,
}

impl<T: Eq + Hash + Copy> Input<T> {
    pub fn new() -> Self {
        Self {
            pressed: HashSet::new(),
            just_pressed: HashSet::new(),
            just_released: HashSet::new(),
        }
    }

    /// Returns `true` if the input is currently held down.
    pub fn pressed(&self, input: T) -> bool {
        self.pressed.contains(&input)
    }

    /// Returns `true` if the input was pressed this frame.
    pub fn just_pressed(&self, input: T) -> bool {
        self.just_pressed.contains(&input)
    }

    /// Returns `true` if the input was released this frame.
    pub fn just_released(&self, input: T) -> bool {
        self.just_released.contains(&input)
    }

    /// Record a press. Holding an already-pressed input is not a new press.
    pub fn press(&mut self, input: T) {
        if self.pressed.insert(input) {
            self.just_pressed.insert(input);
        }
    }

    /// Record a release.
    pub fn release(&mut self, input: T) {
        if self.pressed.remove(&input) {
            self.just_released.insert(input);
        }
    }

    /// Clear per-frame state. Call at the start of each frame.
    pub fn clear_just(&mut self) {
        self.just_pressed.clear();
        self.just_released.clear();
    }
}

impl Input<InputCode> {
    /// Feed a translated event into the tracker.
    pub fn apply(&mut self, event: &InputEvent) {
        match event.state {
            InputState::Pressed => self.press(event.code),
            InputState::Released => self.release(event.code),
        }
    }
}

impl<T: Eq + Hash + Copy> Default for Input<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn press_sets_just_pressed_once() {
        let mut input = Input::new();
        input.press(InputCode::Key(32));
        assert!(input.pressed(InputCode::Key(32)));
        assert!(input.just_pressed(InputCode::Key(32)));

        input.clear_just();
        input.press(InputCode::Key(32)); // held
        assert!(!input.just_pressed(InputCode::Key(32)));
    }

    #[test]
    fn release_without_press_is_ignored() {
        let mut input: Input<InputCode> = Input::new();
        input.release(InputCode::Mouse(0));
        assert!(!input.just_released(InputCode::Mouse(0)));
    }

    #[test]
    fn apply_events() {
        let mut input = Input::new();
        input.apply(&InputEvent::mouse_pressed(1, Vec2::new(3.0, 4.0)));
        assert!(input.pressed(InputCode::Mouse(1)));
        input.clear_just();
        input.apply(&InputEvent::mouse_released(1, Vec2::ZERO));
        assert!(!input.pressed(InputCode::Mouse(1)));
        assert!(input.just_released(InputCode::Mouse(1)));
    }
}
