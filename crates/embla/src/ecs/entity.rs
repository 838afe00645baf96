//! # Entity — Identity Tokens for Game Objects
//!
//! An [`Entity`] is an id plus a coarse category [`EntityTag`]. It doesn't
//! "contain" anything: component data lives in the
//! [`ComponentRegistry`](super::storage::ComponentRegistry) owned by the
//! [`EntityManager`](super::manager::EntityManager), and the handle is only the
//! key used to reach it.
//!
//! ## Design: Sequential Ids, Manager-Owned Liveness
//!
//! Ids are handed out by a plain incrementing counter. They are never reused
//! while the manager lives, but [`EntityManager::clear`] resets the counter to
//! zero, starting a new generation of ids:
//!
//! ```text
//! add_entity → 0, 1, 2, 3
//! clear()    → counter = 0, every storage emptied in the same call
//! add_entity → 0, 1, ...       ← same numbers, fresh world
//! ```
//!
//! Because clearing wipes every component storage at the same moment, a
//! recycled id can never observe data left over from the previous generation.
//! Each handle also records the manager's *epoch* (bumped by `clear()`), so a
//! handle kept across a clear is recognised as stale instead of silently
//! aliasing the new entity that reuses its id.
//!
//! The liveness flag lives in the manager rather than in the handle. Handles
//! are `Copy`, so a flag stored inside them would be duplicated on every copy
//! and a system holding an old copy could never see a `destroy()` made through
//! another one.
//!
//! [`EntityManager::clear`]: super::manager::EntityManager::clear

use std::fmt;

/// Raw entity identifier.
pub type EntityId = u32;

/// Coarse category label used for bucketed queries.
///
/// The tag is fixed when the entity is created and never changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[derive(serde::Serialize, serde::Deserialize)]
pub enum EntityTag {
    #[default]
    Default,
    Player,
    Enemy,
    Projectile,
    Terrain,
    Pickup,
    Effect,
    Ui,
}

impl EntityTag {
    /// Every tag, in declaration order.
    pub const ALL: [EntityTag; 8] = [
        EntityTag::Default,
        EntityTag::Player,
        EntityTag::Enemy,
        EntityTag::Projectile,
        EntityTag::Terrain,
        EntityTag::Pickup,
        EntityTag::Effect,
        EntityTag::Ui,
    ];

    /// Lowercase name, used in log output.
    pub fn as_str(self) -> &'static str {
        match self {
            EntityTag::Default => "default",
            EntityTag::Player => "player",
            EntityTag::Enemy => "enemy",
            EntityTag::Projectile => "projectile",
            EntityTag::Terrain => "terrain",
            EntityTag::Pickup => "pickup",
            EntityTag::Effect => "effect",
            EntityTag::Ui => "ui",
        }
    }
}

impl fmt::Display for EntityTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A lightweight handle to an entity owned by an
/// [`EntityManager`](super::manager::EntityManager).
///
/// Created by [`EntityManager::add_entity`](super::manager::EntityManager::add_entity).
/// A handle is only meaningful for the manager that created it.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Entity {
    pub(crate) id: EntityId,
    pub(crate) tag: EntityTag,
    /// Manager epoch this handle was created in.
    pub(crate) epoch: u32,
}

impl Entity {
    pub(crate) fn new(id: EntityId, tag: EntityTag, epoch: u32) -> Self {
        Self { id, tag, epoch }
    }

    /// Returns the entity id.
    pub fn id(self) -> EntityId {
        self.id
    }

    /// Returns the category tag this entity was created with.
    pub fn tag(self) -> EntityTag {
        self.tag
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Entity({}:{})", self.id, self.tag)
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.tag, self.id)
    }
}

/// Hands out sequential entity ids.
///
/// ```text
/// next: 3          ← the id the next allocation returns
/// ```
///
/// `reset()` starts a new generation at zero.
pub(crate) struct IdAllocator {
    next: EntityId,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self { next: 0 }
    }

    /// Allocate the next sequential id.
    ///
    /// # Panics
    ///
    /// Panics if the id space is exhausted within one generation.
    pub fn allocate(&mut self) -> EntityId {
        let id = self.next;
        self.next = self
            .next
            .checked_add(1)
            .unwrap_or_else(|| panic!("entity id space exhausted ({} ids allocated)", id));
        id
    }

    /// Number of ids handed out in the current generation.
    pub fn allocated(&self) -> u32 {
        self.next
    }

    /// Restart the id sequence at zero.
    pub fn reset(&mut self) {
        self.next = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocate_sequential() {
        let mut alloc = IdAllocator::new();
        assert_eq!(alloc.allocate(), 0);
        assert_eq!(alloc.allocate(), 1);
        assert_eq!(alloc.allocate(), 2);
        assert_eq!(alloc.allocated(), 3);
    }

    #[test]
    fn reset_restarts_at_zero() {
        let mut alloc = IdAllocator::new();
        alloc.allocate();
        alloc.allocate();
        alloc.reset();
        assert_eq!(alloc.allocated(), 0);
        assert_eq!(alloc.allocate(), 0);
    }

    #[test]
    fn entity_accessors() {
        let e = Entity::new(7, EntityTag::Enemy, 0);
        assert_eq!(e.id(), 7);
        assert_eq!(e.tag(), EntityTag::Enemy);
        assert_eq!(format!("{e}"), "enemy#7");
        assert_eq!(format!("{e:?}"), "Entity(7:enemy)");
    }

    #[test]
    fn all_tags_listed_once() {
        let mut tags = EntityTag::ALL.to_vec();
        tags.sort();
        tags.dedup();
        assert_eq!(tags.len(), EntityTag::ALL.len());
    }
}
