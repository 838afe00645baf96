//! # EntityManager — Deferred Entity Lifecycle and Tag Queries
//!
//! The [`EntityManager`] owns every entity of one world (one scene): the live
//! list, a per-tag index, a pending-addition buffer, and the
//! [`ComponentRegistry`] holding their component data.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │ EntityManager                                            │
//! │                                                          │
//! │  pending:   [e5, e6]          ← add_entity() lands here  │
//! │  entities:  [e0, e1, e3, e4]  ← visible to queries       │
//! │  by_tag:    { Enemy: [e1, e4], Player: [e0], ... }       │
//! │  alive:     {0, 3, 4, 5, 6}   ← ids not yet destroyed    │
//! │                                                          │
//! │  components: ComponentRegistry                           │
//! │    TypeId → ComponentStorage<T>                          │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Deferred Commit
//!
//! Systems iterate entity lists while deciding to spawn and destroy entities.
//! Mutating those lists in place would invalidate the iteration, so both
//! directions are deferred until [`update`](EntityManager::update):
//!
//! ```text
//! frame N:   add_entity(Enemy) → pending        destroy(e1) → alive -= 1
//!            systems still see e1, don't see the new enemy
//! update():  1. pending → entities + by_tag
//!            2. drop ids missing from alive in entities and every tag bucket,
//!               and drop their component data
//! frame N+1: new enemy visible, e1 gone
//! ```
//!
//! `update()` must run exactly once per frame boundary. Skipping it lets
//! pending entities pile up and dead ones linger in query results.
//!
//! ## Comparison
//!
//! - **hecs / bevy_ecs**: command buffers applied at sync points; same idea,
//!   generalised to every structural change.
//! - **Here**: only entity creation and destruction are deferred. Component
//!   add/remove take effect immediately, including on pending entities.

use std::collections::{HashMap, HashSet};

use super::entity::{Entity, EntityId, EntityTag, IdAllocator};
use super::storage::ComponentRegistry;

/// Counters describing the manager's current state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EntityStats {
    /// Entities visible to queries.
    pub live: usize,
    /// Entities waiting for the next `update()`.
    pub pending: usize,
    /// Entities purged by the most recent `update()`.
    pub destroyed_last_update: usize,
    /// Number of component types with a storage.
    pub component_types: usize,
}

/// Owns all entities of one world and their component storage.
pub struct EntityManager {
    ids: IdAllocator,
    /// Bumped by `clear()`; handles from an older epoch are stale.
    epoch: u32,
    /// Committed entities, in insertion order.
    entities: Vec<Entity>,
    /// Tag → committed entities with that tag, in insertion order.
    by_tag: HashMap<EntityTag, Vec<Entity>>,
    /// Entities created since the last `update()`.
    pending: Vec<Entity>,
    /// Ids of the current epoch that haven't been destroyed. Holds only
    /// live and pending entities, so churn doesn't grow it.
    alive: HashSet<EntityId>,
    components: ComponentRegistry,
    destroyed_last_update: usize,
}

impl EntityManager {
    pub fn new() -> Self {
        Self {
            ids: IdAllocator::new(),
            epoch: 0,
            entities: Vec::new(),
            by_tag: HashMap::new(),
            pending: Vec::new(),
            alive: HashSet::new(),
            components: ComponentRegistry::new(),
            destroyed_last_update: 0,
        }
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Create an entity with the given tag.
    ///
    /// The entity is queued: it becomes visible to [`entities`](Self::entities)
    /// after the next [`update`](Self::update). Components may be attached
    /// right away.
    pub fn add_entity(&mut self, tag: EntityTag) -> Entity {
        let id = self.ids.allocate();
        let entity = Entity::new(id, tag, self.epoch);
        self.alive.insert(id);
        self.pending.push(entity);
        entity
    }

    /// Create an entity and return a builder for attaching components.
    pub fn spawn(&mut self, tag: EntityTag) -> EntityBuilder<'_> {
        let entity = self.add_entity(tag);
        EntityBuilder {
            manager: self,
            entity,
        }
    }

    /// Mark an entity as destroyed.
    ///
    /// The entity is logically dead immediately ([`is_active`](Self::is_active)
    /// returns `false`) but stays in query results until the next
    /// [`update`](Self::update).
    ///
    /// Returns `true` if the entity was active.
    pub fn destroy(&mut self, entity: Entity) -> bool {
        if !self.is_active(entity) {
            return false;
        }
        self.alive.remove(&entity.id);
        log::debug!("destroying entity {}", entity);
        true
    }

    /// Returns `true` if the entity belongs to the current epoch and hasn't
    /// been destroyed.
    pub fn is_active(&self, entity: Entity) -> bool {
        entity.epoch == self.epoch && self.alive.contains(&entity.id)
    }

    /// Commit pending additions, then purge destroyed entities.
    pub fn update(&mut self) {
        let added = self.pending.len();
        for entity in self.pending.drain(..) {
            self.entities.push(entity);
            self.by_tag.entry(entity.tag).or_default().push(entity);
        }

        let alive = &self.alive;
        let mut dead: Vec<EntityId> = Vec::new();
        self.entities.retain(|e| {
            let keep = alive.contains(&e.id);
            if !keep {
                dead.push(e.id);
            }
            keep
        });
        for bucket in self.by_tag.values_mut() {
            bucket.retain(|e| alive.contains(&e.id));
        }
        for &id in &dead {
            self.components.remove_entity(id);
        }

        self.destroyed_last_update = dead.len();
        if added > 0 || !dead.is_empty() {
            log::trace!(
                "entity update: +{} -{} ({} live)",
                added,
                dead.len(),
                self.entities.len()
            );
        }
    }

    /// Drop every entity and component and reset the id counter to zero.
    ///
    /// Entity lists, the pending buffer, and every component storage are
    /// cleared together. Handles created before the clear become stale.
    pub fn clear(&mut self) {
        let dropped = self.entities.len() + self.pending.len();
        self.entities.clear();
        self.by_tag.clear();
        self.pending.clear();
        self.alive.clear();
        self.ids.reset();
        self.components.clear();
        self.epoch = self.epoch.wrapping_add(1);
        self.destroyed_last_update = 0;
        log::debug!("entity manager cleared ({} entities dropped)", dropped);
    }

    // ── Queries ──────────────────────────────────────────────────────

    /// All committed entities, in insertion order.
    ///
    /// Includes entities destroyed since the last `update()`; check
    /// [`is_active`](Self::is_active) if that matters.
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    /// Committed entities with the given tag, in insertion order.
    ///
    /// Returns an empty slice if no entity ever had that tag.
    pub fn entities_with_tag(&self, tag: EntityTag) -> &[Entity] {
        self.by_tag.get(&tag).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of committed entities.
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Number of entities waiting for the next `update()`.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn stats(&self) -> EntityStats {
        EntityStats {
            live: self.entities.len(),
            pending: self.pending.len(),
            destroyed_last_update: self.destroyed_last_update,
            component_types: self.components.type_count(),
        }
    }

    // ── Components ───────────────────────────────────────────────────

    /// Attach a component, replacing any existing component of the same type.
    ///
    /// Replacing silently discards the previous value; `add` is not additive.
    ///
    /// # Panics
    ///
    /// Panics if the handle is from before the last [`clear`](Self::clear).
    pub fn add<T: 'static + Send>(&mut self, entity: Entity, component: T) -> &mut T {
        self.assert_current(entity);
        let storage = self.components.register::<T>();
        if storage.has(entity.id) {
            log::debug!(
                "replacing `{}` on entity {}",
                std::any::type_name::<T>(),
                entity
            );
            let slot = storage.get_mut(entity.id);
            *slot = component;
            slot
        } else {
            storage.add(entity.id, component)
        }
    }

    /// Get a component.
    ///
    /// # Panics
    ///
    /// Panics if the entity has no component of type `T`, if `T` was never
    /// registered, or if the handle is stale.
    pub fn get<T: 'static + Send>(&self, entity: Entity) -> &T {
        self.assert_current(entity);
        self.components.storage::<T>().get(entity.id)
    }

    /// Get a component mutably.
    ///
    /// # Panics
    ///
    /// Same conditions as [`get`](Self::get).
    pub fn get_mut<T: 'static + Send>(&mut self, entity: Entity) -> &mut T {
        self.assert_current(entity);
        self.components.storage_mut::<T>().get_mut(entity.id)
    }

    /// Get a component, or `None` if absent or the handle is stale.
    pub fn try_get<T: 'static + Send>(&self, entity: Entity) -> Option<&T> {
        if entity.epoch != self.epoch {
            return None;
        }
        self.components.try_storage::<T>()?.try_get(entity.id)
    }

    pub fn try_get_mut<T: 'static + Send>(&mut self, entity: Entity) -> Option<&mut T> {
        if entity.epoch != self.epoch {
            return None;
        }
        self.components.try_storage_mut::<T>()?.try_get_mut(entity.id)
    }

    /// Returns `true` if the entity has a component of type `T`.
    pub fn has<T: 'static + Send>(&self, entity: Entity) -> bool {
        self.try_get::<T>(entity).is_some()
    }

    /// Detach a component. Removing an absent component is a no-op.
    pub fn remove<T: 'static + Send>(&mut self, entity: Entity) -> Option<T> {
        if entity.epoch != self.epoch {
            return None;
        }
        self.components.try_storage_mut::<T>()?.remove(entity.id)
    }

    /// The underlying component registry.
    pub fn components(&self) -> &ComponentRegistry {
        &self.components
    }

    pub fn components_mut(&mut self) -> &mut ComponentRegistry {
        &mut self.components
    }

    fn assert_current(&self, entity: Entity) {
        assert!(
            entity.epoch == self.epoch,
            "stale entity handle {:?} used after the entity manager was cleared",
            entity
        );
    }
}

impl Default for EntityManager {
    fn default() -> Self {
        Self::new()
    }
}

// ── EntityBuilder ────────────────────────────────────────────────────────

/// Builder for attaching components to a freshly created entity.
///
/// Returned by [`EntityManager::spawn`]. Chain `.with()` calls to add
/// components, then take the handle with [`id`](EntityBuilder::id).
///
/// # Example
///
/// ```ignore
/// let player = manager
///     .spawn(EntityTag::Player)
///     .with(Transform::from_xy(0.0, 0.0))
///     .with(Movement::default())
///     .id();
/// ```
pub struct EntityBuilder<'m> {
    manager: &'m mut EntityManager,
    entity: Entity,
}

impl<'m> EntityBuilder<'m> {
    /// Add a component to this entity.
    pub fn with<T: 'static + Send>(self, component: T) -> Self {
        self.manager.add(self.entity, component);
        self
    }

    /// Get the entity handle.
    pub fn id(&self) -> Entity {
        self.entity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Position {
        x: f32,
        y: f32,
    }
    #[derive(Debug, PartialEq)]
    struct Health(u32);
    struct Shield;

    fn count(list: &[Entity], e: Entity) -> usize {
        list.iter().filter(|&&x| x == e).count()
    }

    #[test]
    fn added_entities_visible_after_update() {
        let mut em = EntityManager::new();
        let e = em.add_entity(EntityTag::Enemy);
        assert!(em.entities().is_empty());
        assert_eq!(em.pending_count(), 1);

        em.update();
        assert_eq!(count(em.entities(), e), 1);
        assert_eq!(count(em.entities_with_tag(EntityTag::Enemy), e), 1);
        assert!(em.entities_with_tag(EntityTag::Player).is_empty());
        assert_eq!(em.pending_count(), 0);
    }

    #[test]
    fn ids_are_sequential() {
        let mut em = EntityManager::new();
        let ids: Vec<_> = (0..4).map(|_| em.add_entity(EntityTag::Default).id()).collect();
        assert_eq!(ids, vec![0, 1, 2, 3]);
    }

    #[test]
    fn destroyed_entity_lingers_until_update() {
        let mut em = EntityManager::new();
        let a = em.add_entity(EntityTag::Enemy);
        let b = em.add_entity(EntityTag::Enemy);
        em.update();

        assert!(em.destroy(a));
        assert!(!em.is_active(a));
        assert_eq!(count(em.entities(), a), 1); // still visible this frame

        em.update();
        assert_eq!(count(em.entities(), a), 0);
        assert_eq!(count(em.entities_with_tag(EntityTag::Enemy), a), 0);
        assert_eq!(count(em.entities(), b), 1);
        assert_eq!(em.stats().destroyed_last_update, 1);
    }

    #[test]
    fn destroy_twice_returns_false() {
        let mut em = EntityManager::new();
        let e = em.add_entity(EntityTag::Default);
        assert!(em.destroy(e));
        assert!(!em.destroy(e));
    }

    #[test]
    fn destroyed_before_commit_never_appears() {
        let mut em = EntityManager::new();
        let e = em.add_entity(EntityTag::Pickup);
        em.destroy(e);
        em.update();
        assert!(em.entities().is_empty());
        assert!(em.entities_with_tag(EntityTag::Pickup).is_empty());
    }

    #[test]
    fn insertion_order_preserved() {
        let mut em = EntityManager::new();
        let a = em.add_entity(EntityTag::Enemy);
        let b = em.add_entity(EntityTag::Player);
        let c = em.add_entity(EntityTag::Enemy);
        em.update();
        em.destroy(b);
        em.update();
        assert_eq!(em.entities(), &[a, c]);
        assert_eq!(em.entities_with_tag(EntityTag::Enemy), &[a, c]);
    }

    #[test]
    fn components_on_pending_entity() {
        let mut em = EntityManager::new();
        let e = em.add_entity(EntityTag::Player);
        em.add(e, Position { x: 1.0, y: 2.0 });
        assert!(em.has::<Position>(e));
        assert_eq!(em.get::<Position>(e), &Position { x: 1.0, y: 2.0 });
    }

    #[test]
    fn add_then_get_round_trip() {
        let mut em = EntityManager::new();
        let e = em.add_entity(EntityTag::Default);
        em.add(e, Health(42));
        assert_eq!(em.get::<Health>(e), &Health(42));

        em.get_mut::<Health>(e).0 = 7;
        assert_eq!(em.get::<Health>(e).0, 7);
    }

    #[test]
    fn add_overwrites_existing() {
        let mut em = EntityManager::new();
        let e = em.add_entity(EntityTag::Default);
        em.add(e, Health(50));
        em.add(e, Health(100));
        assert_eq!(em.get::<Health>(e), &Health(100));
        assert_eq!(em.components().storage::<Health>().len(), 1);
    }

    #[test]
    fn remove_twice_is_noop() {
        let mut em = EntityManager::new();
        let e = em.add_entity(EntityTag::Default);
        em.add(e, Shield);
        assert!(em.remove::<Shield>(e).is_some());
        assert!(!em.has::<Shield>(e));
        assert!(em.remove::<Shield>(e).is_none());
    }

    #[test]
    fn has_unregistered_type_is_false() {
        let mut em = EntityManager::new();
        let e = em.add_entity(EntityTag::Default);
        assert!(!em.has::<Shield>(e));
        assert!(em.try_get::<Shield>(e).is_none());
        assert!(em.remove::<Shield>(e).is_none());
    }

    #[test]
    #[should_panic(expected = "not registered")]
    fn get_unregistered_type_panics() {
        let mut em = EntityManager::new();
        let e = em.add_entity(EntityTag::Default);
        em.get::<Shield>(e);
    }

    #[test]
    #[should_panic(expected = "has no")]
    fn get_missing_component_panics() {
        let mut em = EntityManager::new();
        let a = em.add_entity(EntityTag::Default);
        let b = em.add_entity(EntityTag::Default);
        em.add(a, Health(1));
        em.get::<Health>(b);
    }

    #[test]
    fn update_purges_component_data() {
        let mut em = EntityManager::new();
        let a = em.add_entity(EntityTag::Default);
        let b = em.add_entity(EntityTag::Default);
        em.add(a, Health(1));
        em.add(b, Health(2));
        em.update();

        em.destroy(a);
        assert!(em.components().storage::<Health>().has(a.id()));
        em.update();
        assert!(!em.components().storage::<Health>().has(a.id()));
        assert_eq!(em.get::<Health>(b), &Health(2));
    }

    #[test]
    fn clear_resets_ids_and_storage() {
        let mut em = EntityManager::new();
        let old = em.add_entity(EntityTag::Enemy);
        em.add(old, Health(9));
        em.update();

        em.clear();
        assert!(em.entities().is_empty());
        assert!(em.entities_with_tag(EntityTag::Enemy).is_empty());
        assert!(em.components().storage::<Health>().is_empty());

        let fresh = em.add_entity(EntityTag::Enemy);
        assert_eq!(fresh.id(), 0);
        assert!(!em.is_active(old));
        assert!(em.is_active(fresh));
        assert!(!em.has::<Health>(fresh));
        assert!(em.try_get::<Health>(old).is_none());
    }

    #[test]
    #[should_panic(expected = "stale entity handle")]
    fn stale_handle_add_panics() {
        let mut em = EntityManager::new();
        let old = em.add_entity(EntityTag::Default);
        em.clear();
        em.add(old, Shield);
    }

    #[test]
    fn builder_attaches_components() {
        let mut em = EntityManager::new();
        let e = em
            .spawn(EntityTag::Player)
            .with(Position { x: 3.0, y: 4.0 })
            .with(Health(10))
            .id();
        assert!(em.has::<Position>(e));
        assert!(em.has::<Health>(e));
        assert_eq!(e.tag(), EntityTag::Player);
    }

    #[test]
    fn stats_report_counts() {
        let mut em = EntityManager::new();
        let e = em.add_entity(EntityTag::Default);
        em.add(e, Health(1));
        em.add_entity(EntityTag::Default);
        assert_eq!(
            em.stats(),
            EntityStats {
                live: 0,
                pending: 2,
                destroyed_last_update: 0,
                component_types: 1,
            }
        );
    }

    #[test]
    fn liveness_tracks_only_current_entities_under_churn() {
        let mut em = EntityManager::new();
        let keeper = em.add_entity(EntityTag::Player);
        for _ in 0..1000 {
            let e = em.add_entity(EntityTag::Projectile);
            em.update();
            em.destroy(e);
            em.update();
        }
        assert_eq!(em.alive.len(), 1);
        assert!(em.is_active(keeper));
        assert_eq!(em.entity_count(), 1);
    }
}
