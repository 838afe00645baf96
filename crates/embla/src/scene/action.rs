//! Named actions and the per-scene input binding table.

use std::collections::HashMap;

use crate::input::{InputCode, InputEvent, InputState};
use crate::math::Vec2;

/// Whether an action begins (input pressed) or ends (input released).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    Start,
    End,
}

/// A named gameplay action, produced from an input event by an [`ActionMap`].
#[derive(Debug, Clone, PartialEq)]
pub struct Action {
    pub name: String,
    pub kind: ActionKind,
    /// Cursor position, for actions bound to mouse buttons.
    pub position: Option<Vec2>,
}

impl Action {
    pub fn new(name: impl Into<String>, kind: ActionKind) -> Self {
        Self {
            name: name.into(),
            kind,
            position: None,
        }
    }

    pub fn at(mut self, position: Vec2) -> Self {
        self.position = Some(position);
        self
    }

    pub fn is_start(&self) -> bool {
        self.kind == ActionKind::Start
    }
}

/// Input code → action name table, registered by each scene.
///
/// ```ignore
/// let map = ActionMap::new()
///     .bind(InputCode::Key(KEY_ESCAPE), "pause")
///     .bind(InputCode::Mouse(0), "shoot");
/// ```
#[derive(Debug, Clone, Default)]
pub struct ActionMap {
    bindings: HashMap<InputCode, String>,
}

impl ActionMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind an input code to an action name, builder style.
    pub fn bind(mut self, code: InputCode, action: impl Into<String>) -> Self {
        self.register(code, action);
        self
    }

    /// Bind an input code to an action name, replacing any previous binding.
    pub fn register(&mut self, code: InputCode, action: impl Into<String>) {
        let action = action.into();
        if let Some(old) = self.bindings.insert(code, action.clone()) {
            log::debug!("rebinding {:?}: '{}' -> '{}'", code, old, action);
        }
    }

    pub fn unbind(&mut self, code: InputCode) -> Option<String> {
        self.bindings.remove(&code)
    }

    /// The action bound to `code`, if any.
    pub fn action_for(&self, code: InputCode) -> Option<&str> {
        self.bindings.get(&code).map(String::as_str)
    }

    /// Map a raw event to an action. Unbound codes yield `None`.
    pub fn translate(&self, event: &InputEvent) -> Option<Action> {
        let name = self.bindings.get(&event.code)?;
        let kind = match event.state {
            InputState::Pressed => ActionKind::Start,
            InputState::Released => ActionKind::End,
        };
        Some(Action {
            name: name.clone(),
            kind,
            position: event.position,
        })
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}
