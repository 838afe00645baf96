//! Entity-Component-System core.
//!
//! - [`entity`]: [`Entity`] handles and the closed [`EntityTag`] set
//! - [`storage`]: dense per-type [`ComponentStorage`] and the per-world
//!   [`ComponentRegistry`]
//! - [`manager`]: [`EntityManager`] with deferred lifecycle, tag queries and typed
//!   component access
//!
//! Every [`EntityManager`] owns its own registry, so two scenes never share
//! component data.

pub mod entity;
pub mod manager;
pub mod storage;

pub use entity::{Entity, EntityId, EntityTag};
pub use manager::{EntityBuilder, EntityManager, EntityStats};
pub use storage::{ComponentRegistry, ComponentStorage, ErasedStorage};
