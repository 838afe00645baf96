//! Bouncing Boxes: headless movement, collision and boundary systems.
//!
//! Spawns a grid of boxes with varied velocities inside a walled arena, runs
//! a few seconds of simulated frames and logs what happened.
//!
//! Optionally reads an engine config from the path given as first argument.
//!
//! Run with: `RUST_LOG=info cargo run -p embla --example bouncing_boxes`

use std::time::Duration;

use embla::prelude::*;

const BOX_COUNT: usize = 48;
const FRAMES: u32 = 300;

struct Arena {
    entities: EntityManager,
    actions: ActionMap,
    schedule: Schedule,
    config: EngineConfig,
}

impl Arena {
    fn new(config: EngineConfig) -> Self {
        let mut schedule = Schedule::new();
        let mut resolution = config.collision.resolution_system();
        resolution.set_tag_response(EntityTag::Terrain, CollisionResponse::Damped);
        resolution.set_tag_response(EntityTag::Effect, CollisionResponse::PassThrough);
        schedule
            .add(config.movement.movement_system())
            .add(CollisionPipeline::new(
                config.collision.detection_system(),
                resolution,
            ))
            .add(config.world.boundary_system());

        Self {
            entities: EntityManager::new(),
            actions: ActionMap::new(),
            schedule,
            config,
        }
    }
}

impl Scene for Arena {
    fn name(&self) -> &str {
        "arena"
    }

    fn on_load(&mut self) -> Result<(), SceneError> {
        let bounds = self.config.world.bounds();
        let size = bounds.size();
        let columns = 8;
        for i in 0..BOX_COUNT {
            let (col, row) = ((i % columns) as f32, (i / columns) as f32);
            let x = bounds.min.x + size.x * (col + 0.5) / columns as f32;
            let y = bounds.min.y + size.y * (row + 0.5) / 8.0;
            let angle = i as f32 * 2.399; // golden angle spreads directions
            let speed = 20.0 + (i % 5) as f32 * 10.0;
            let tag = if i % 11 == 0 { EntityTag::Effect } else { EntityTag::Enemy };

            self.entities
                .spawn(tag)
                .with(Transform::from_xy(x, y))
                .with(Movement::new(Vec3::new(angle.cos(), angle.sin(), 0.0) * speed))
                .with(BoundingBox::from_half_extents(Vec3::new(2.0, 2.0, 0.0)))
                .with(Shape::regular(2.0, 4).fill(Color::rgb(0.2, 0.6, 0.9)));
        }

        // A static pillar in the middle.
        self.entities
            .spawn(EntityTag::Terrain)
            .with(Transform::from_xy(bounds.center().x, bounds.center().y))
            .with(BoundingBox::from_half_extents(Vec3::new(8.0, 8.0, 0.0)))
            .with(Shape::regular(8.0, 4).fill(Color::WHITE));

        log::info!("arena loaded with {} entities", BOX_COUNT + 1);
        Ok(())
    }

    fn update(&mut self, dt: f32) {
        self.entities.update();
        self.schedule.run(&mut self.entities, dt);
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

fn main() -> Result<(), ConfigError> {
    env_logger::init();

    let config = match std::env::args().nth(1) {
        Some(path) => EngineConfig::from_file(path)?,
        None => EngineConfig::from_json_str(
            r#"{
                "world": { "min": [0.0, 0.0, -1.0], "max": [200.0, 150.0, 1.0], "bounce_damping": 0.95 },
                "collision": { "broad_phase": { "uniform_grid": { "cell_size": 16.0 } }, "restitution": 0.9 },
                "movement": { "max_speed": 80.0 }
            }"#,
        )?,
    };

    let mut app = App::new(config.clone());
    app.scenes()
        .register_scene("arena", move || Ok(Box::new(Arena::new(config.clone())) as Box<dyn Scene>))
        .map_err(|e| ConfigError::Invalid(e.to_string()))?;
    app.scenes()
        .request_scene_transition("arena", false)
        .map_err(|e| ConfigError::Invalid(e.to_string()))?;

    let mut draw_list = DrawList::new();
    let dt = Duration::from_secs_f32(1.0 / 60.0);
    for frame in 0..FRAMES {
        app.frame(dt, &mut draw_list);

        if frame % 60 == 0 {
            if let Some(scene) = app.scenes().get_current_scene() {
                let scene = scene.lock();
                let stats = scene.entities().stats();
                log::info!(
                    "t={:.1}s live={} drawn={} components={}",
                    app.time().elapsed_secs(),
                    stats.live,
                    draw_list.items().len(),
                    stats.component_types
                );
            }
            #[cfg(feature = "diagnostics")]
            log::debug!("frame timings: {:?}", app.frame_timings());
        }
    }

    println!(
        "simulated {} frames ({:.1}s), {} items in the last draw list",
        app.time().frame_count(),
        app.time().elapsed_secs(),
        draw_list.items().len()
    );
    Ok(())
}
