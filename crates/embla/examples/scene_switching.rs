//! Scene Switching: queued transitions, input actions and rollback.
//!
//! A menu scene binds Enter to "start"; the game scene binds Escape to
//! "menu" and F to "broken", which requests a scene whose load always
//! fails. The failed load rolls back to the game scene.
//!
//! Input is scripted so the example runs headless.
//!
//! Run with: `RUST_LOG=info cargo run -p embla --example scene_switching`

use std::sync::{Arc, Weak};
use std::time::Duration;

use embla::prelude::*;

const KEY_ENTER: u32 = 13;
const KEY_ESCAPE: u32 = 27;
const KEY_F: u32 = 70;

/// A scene that requests transitions in response to actions.
struct Screen {
    name: &'static str,
    /// Weak, so the manager owning this scene isn't kept alive by it.
    scenes: Weak<SceneManager>,
    routes: Vec<(&'static str, &'static str)>,
    entities: EntityManager,
    actions: ActionMap,
}

impl Scene for Screen {
    fn name(&self) -> &str {
        self.name
    }

    fn on_load(&mut self) -> Result<(), SceneError> {
        self.entities
            .spawn(EntityTag::Ui)
            .with(Transform::from_xy(0.0, 0.0))
            .with(Shape::regular(10.0, 4));
        Ok(())
    }

    fn on_unload(&mut self) -> Result<(), SceneError> {
        self.entities.clear();
        Ok(())
    }

    fn update(&mut self, _dt: f32) {
        self.entities.update();
    }

    fn do_action(&mut self, action: &Action) {
        if !action.is_start() {
            return;
        }
        let Some(&(_, target)) = self.routes.iter().find(|(name, _)| *name == action.name) else {
            return;
        };
        if let Some(scenes) = self.scenes.upgrade() {
            if let Err(e) = scenes.request_scene_transition(target, false) {
                log::warn!("{}: {}", self.name, e);
            }
        }
    }

    fn entities(&self) -> &EntityManager {
        &self.entities
    }

    fn entities_mut(&mut self) -> &mut EntityManager {
        &mut self.entities
    }

    fn action_map(&self) -> &ActionMap {
        &self.actions
    }
}

fn register_screen(
    scenes: &Arc<SceneManager>,
    name: &'static str,
    bindings: &'static [(u32, &'static str, &'static str)],
) -> Result<(), SceneError> {
    let weak = Arc::downgrade(scenes);
    scenes.register_scene(name, move || {
        let mut actions = ActionMap::new();
        for &(key, action, _) in bindings {
            actions.register(InputCode::Key(key), action);
        }
        Ok(Box::new(Screen {
            name,
            scenes: weak.clone(),
            routes: bindings.iter().map(|&(_, action, target)| (action, target)).collect(),
            entities: EntityManager::new(),
            actions,
        }) as Box<dyn Scene>)
    })
}

fn main() -> Result<(), SceneError> {
    env_logger::init();

    let mut app = App::default();
    let scenes = app.scenes().clone();

    register_screen(&scenes, "menu", &[(KEY_ENTER, "start", "game")])?;
    register_screen(
        &scenes,
        "game",
        &[(KEY_ESCAPE, "back", "menu"), (KEY_F, "glitch", "broken")],
    )?;
    scenes.register_scene("broken", || {
        Err(SceneError::load("broken", "level file is corrupt"))
    })?;

    scenes.request_scene_transition("menu", false)?;

    let script = [
        (5, KEY_ENTER),
        (10, KEY_F),
        (15, KEY_ESCAPE),
        (20, KEY_ENTER),
    ];

    let mut draw_list = DrawList::new();
    let dt = Duration::from_millis(16);
    for frame in 0..25 {
        for &(at, key) in &script {
            if at == frame {
                app.handle_input(&InputEvent::key_pressed(key));
                app.handle_input(&InputEvent::key_released(key));
            }
        }

        let report = app.frame(dt, &mut draw_list);
        if let Some(outcome) = report.transition {
            println!("frame {:>2}: {:?}", frame, outcome);
        }
    }

    let stats = scenes.stats();
    println!(
        "current: {:?} ({:?}), transitions: {} total, {} failed",
        scenes.current_scene_name(),
        scenes.current_scene_state(),
        stats.total,
        stats.failed
    );
    if let Some(error) = scenes.last_error() {
        println!("last error: {}", error);
    }
    Ok(())
}
