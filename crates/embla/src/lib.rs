//! # Embla — ECS Core With a Thread-Safe Scene Manager
//!
//! A small game-engine core: dense per-type component storage, an entity
//! manager with deferred add/remove and tag queries, a scene manager that
//! swaps scenes safely across threads with rollback on failure, and the
//! movement, collision and boundary systems that run over it.
//!
//! Rendering and windowing stay outside: a [`Renderer`](render::Renderer)
//! reads entities, a platform layer feeds [`InputEvent`](input::InputEvent)s.
//!
//! Start with `use embla::prelude::*` and drive frames with an
//! [`App`](app::App).

pub mod app;
pub mod components;
pub mod config;
pub mod ecs;
pub mod input;
pub mod math;
pub mod prelude;
pub mod render;
pub mod scene;
pub mod systems;
pub mod time;
