//! # Storage — Dense Per-Type Component Arrays
//!
//! Every component type gets its own [`ComponentStorage<T>`]: a tightly packed
//! `Vec<T>` plus two index maps that translate between entity ids and slots in
//! that vector.
//!
//! ## Memory Layout
//!
//! ```text
//! ComponentStorage<Transform>
//!
//!   dense:            [ t7,  t2,  t9 ]     ← contiguous, iteration-friendly
//!   index_to_entity:  [  7,   2,   9 ]     ← dense slot → entity id
//!   entity_to_index:  { 7:0, 2:1, 9:2 }    ← entity id → dense slot
//! ```
//!
//! ## Swap-and-Pop Removal
//!
//! Removing entity 7 moves the last element into its slot and pops the tail:
//!
//! ```text
//!   dense:            [ t9,  t2 ]
//!   index_to_entity:  [  9,   2 ]
//!   entity_to_index:  { 9:0, 2:1 }
//! ```
//!
//! Add, remove, and lookup are all O(1); the array never has holes, so
//! systems that walk every component of a type touch contiguous memory.
//!
//! ## The Registry
//!
//! [`ComponentRegistry`] maps a `TypeId` to the owning storage, type-erased
//! behind [`ErasedStorage`]. A storage is created the first time a component
//! of its type is added. Each [`EntityManager`](super::manager::EntityManager)
//! owns its own registry, so two scenes never share component data.
//!
//! ## Comparison
//!
//! - **Archetype tables** (hecs/bevy): faster multi-component iteration, but
//!   every add/remove moves the entity between tables.
//! - **Fixed tuple per entity**: one slot per known component type on every
//!   entity. Wastes memory on unused types and needs a recompile to add one.
//! - **Here**: one sparse-set-like array per type. Adding or removing a
//!   component never touches any other type's storage.

use std::any::{Any, TypeId};
use std::collections::HashMap;

use super::entity::EntityId;

// ── ComponentStorage ─────────────────────────────────────────────────────

/// Dense array storage for one component type, keyed by entity id.
pub struct ComponentStorage<T> {
    dense: Vec<T>,
    index_to_entity: Vec<EntityId>,
    entity_to_index: HashMap<EntityId, usize>,
}

impl<T: 'static> ComponentStorage<T> {
    pub fn new() -> Self {
        Self {
            dense: Vec::new(),
            index_to_entity: Vec::new(),
            entity_to_index: HashMap::new(),
        }
    }

    /// Add a component for `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` already has a component of this type.
    pub fn add(&mut self, id: EntityId, value: T) -> &mut T {
        assert!(
            !self.entity_to_index.contains_key(&id),
            "entity {} already has a `{}` component",
            id,
            std::any::type_name::<T>()
        );
        let index = self.dense.len();
        self.dense.push(value);
        self.index_to_entity.push(id);
        self.entity_to_index.insert(id, index);
        &mut self.dense[index]
    }

    /// Remove the component for `id` by swapping the last slot into its place.
    ///
    /// Returns the removed value, or `None` if `id` had no component.
    pub fn remove(&mut self, id: EntityId) -> Option<T> {
        let index = self.entity_to_index.remove(&id)?;
        let last = self.dense.len() - 1;
        if index != last {
            let moved = self.index_to_entity[last];
            self.entity_to_index.insert(moved, index);
        }
        self.index_to_entity.swap_remove(index);
        Some(self.dense.swap_remove(index))
    }

    /// Returns `true` if `id` has a component of this type.
    pub fn has(&self, id: EntityId) -> bool {
        self.entity_to_index.contains_key(&id)
    }

    /// Get the component for `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` has no component of this type. Check [`has`](Self::has)
    /// first or use [`try_get`](Self::try_get).
    pub fn get(&self, id: EntityId) -> &T {
        self.try_get(id).unwrap_or_else(|| missing::<T>(id))
    }

    /// Get the component for `id` mutably.
    ///
    /// # Panics
    ///
    /// Panics if `id` has no component of this type.
    pub fn get_mut(&mut self, id: EntityId) -> &mut T {
        self.try_get_mut(id).unwrap_or_else(|| missing::<T>(id))
    }

    pub fn try_get(&self, id: EntityId) -> Option<&T> {
        self.entity_to_index.get(&id).map(|&i| &self.dense[i])
    }

    pub fn try_get_mut(&mut self, id: EntityId) -> Option<&mut T> {
        let index = *self.entity_to_index.get(&id)?;
        Some(&mut self.dense[index])
    }

    /// Drop every stored component.
    pub fn clear(&mut self) {
        self.dense.clear();
        self.index_to_entity.clear();
        self.entity_to_index.clear();
    }

    pub fn len(&self) -> usize {
        self.dense.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dense.is_empty()
    }

    /// The packed component values, in dense order.
    pub fn as_slice(&self) -> &[T] {
        &self.dense
    }

    /// Iterate `(entity id, component)` pairs in dense order.
    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &T)> {
        self.index_to_entity.iter().copied().zip(self.dense.iter())
    }

    /// Iterate `(entity id, component)` pairs mutably, in dense order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (EntityId, &mut T)> {
        self.index_to_entity.iter().copied().zip(self.dense.iter_mut())
    }
}

impl<T: 'static> Default for ComponentStorage<T> {
    fn default() -> Self {
        Self::new()
    }
}

fn missing<T>(id: EntityId) -> ! {
    panic!(
        "entity {} has no `{}` component",
        id,
        std::any::type_name::<T>()
    )
}

// ── Type Erasure ─────────────────────────────────────────────────────────

/// Object-safe view of a [`ComponentStorage`] whose `T` is unknown.
///
/// Lets the registry remove an entity from, or clear, every storage without
/// knowing the concrete component types.
pub trait ErasedStorage: Send {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
    /// Remove `id`'s component if present. Returns `true` if one was removed.
    fn remove_entity(&mut self, id: EntityId) -> bool;
    fn clear(&mut self);
    fn len(&self) -> usize;
    fn component_name(&self) -> &'static str;
}

impl<T: 'static + Send> ErasedStorage for ComponentStorage<T> {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn remove_entity(&mut self, id: EntityId) -> bool {
        self.remove(id).is_some()
    }

    fn clear(&mut self) {
        ComponentStorage::clear(self);
    }

    fn len(&self) -> usize {
        ComponentStorage::len(self)
    }

    fn component_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}

// ── ComponentRegistry ────────────────────────────────────────────────────

/// Runtime-typed heterogeneous storage: one [`ComponentStorage`] per
/// component type, keyed by `TypeId`.
pub struct ComponentRegistry {
    storages: HashMap<TypeId, Box<dyn ErasedStorage>>,
}

impl ComponentRegistry {
    pub fn new() -> Self {
        Self {
            storages: HashMap::new(),
        }
    }

    /// Get the storage for `T`, creating it on first use.
    pub fn register<T: 'static + Send>(&mut self) -> &mut ComponentStorage<T> {
        self.storages
            .entry(TypeId::of::<T>())
            .or_insert_with(|| Box::new(ComponentStorage::<T>::new()))
            .as_any_mut()
            .downcast_mut::<ComponentStorage<T>>()
            .unwrap_or_else(|| mismatch::<T>())
    }

    /// Get the storage for `T`.
    ///
    /// # Panics
    ///
    /// Panics if no component of type `T` was ever added to this registry.
    pub fn storage<T: 'static + Send>(&self) -> &ComponentStorage<T> {
        self.try_storage::<T>()
            .unwrap_or_else(|| unregistered::<T>())
    }

    /// Get the storage for `T` mutably.
    ///
    /// # Panics
    ///
    /// Panics if no component of type `T` was ever added to this registry.
    pub fn storage_mut<T: 'static + Send>(&mut self) -> &mut ComponentStorage<T> {
        self.try_storage_mut::<T>()
            .unwrap_or_else(|| unregistered::<T>())
    }

    /// Get the storage for `T`, or `None` if the type was never registered.
    pub fn try_storage<T: 'static + Send>(&self) -> Option<&ComponentStorage<T>> {
        self.storages
            .get(&TypeId::of::<T>())
            .map(|s| {
                s.as_any()
                    .downcast_ref::<ComponentStorage<T>>()
                    .unwrap_or_else(|| mismatch::<T>())
            })
    }

    pub fn try_storage_mut<T: 'static + Send>(&mut self) -> Option<&mut ComponentStorage<T>> {
        self.storages
            .get_mut(&TypeId::of::<T>())
            .map(|s| {
                s.as_any_mut()
                    .downcast_mut::<ComponentStorage<T>>()
                    .unwrap_or_else(|| mismatch::<T>())
            })
    }

    /// Returns `true` if a storage for `T` exists.
    pub fn is_registered<T: 'static + Send>(&self) -> bool {
        self.storages.contains_key(&TypeId::of::<T>())
    }

    /// Remove every component owned by `id`, across all storages.
    ///
    /// Returns the number of components removed.
    pub fn remove_entity(&mut self, id: EntityId) -> usize {
        self.storages
            .values_mut()
            .map(|s| s.remove_entity(id))
            .filter(|&removed| removed)
            .count()
    }

    /// Empty every storage. Registrations are kept.
    pub fn clear(&mut self) {
        for storage in self.storages.values_mut() {
            storage.clear();
        }
    }

    /// Number of registered component types.
    pub fn type_count(&self) -> usize {
        self.storages.len()
    }

    /// Fully-qualified names of registered component types, sorted, with
    /// their current component counts.
    pub fn registered_types(&self) -> Vec<(&'static str, usize)> {
        let mut types: Vec<_> = self
            .storages
            .values()
            .map(|s| (s.component_name(), s.len()))
            .collect();
        types.sort();
        types
    }
}

impl Default for ComponentRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn unregistered<T>() -> ! {
    panic!(
        "component type `{}` is not registered. Did you forget to add it?",
        std::any::type_name::<T>()
    )
}

fn mismatch<T>() -> ! {
    panic!(
        "storage type mismatch for `{}` (registry bug)",
        std::any::type_name::<T>()
    )
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashMap;

    #[derive(Debug, Clone)]
    enum Op {
        Add(u32, i64),
        Remove(u32),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0u32..32, any::<i64>()).prop_map(|(id, v)| Op::Add(id, v)),
            (0u32..32).prop_map(Op::Remove),
        ]
    }

    proptest! {
        #[test]
        fn churn_never_corrupts_lookups(ops in prop::collection::vec(op(), 1..200)) {
            let mut storage = ComponentStorage::<i64>::new();
            let mut model: HashMap<u32, i64> = HashMap::new();

            for op in ops {
                match op {
                    Op::Add(id, v) => {
                        if let Some(existing) = storage.try_get_mut(id) {
                            *existing = v;
                        } else {
                            storage.add(id, v);
                        }
                        model.insert(id, v);
                    }
                    Op::Remove(id) => {
                        prop_assert_eq!(storage.remove(id), model.remove(&id));
                    }
                }

                prop_assert_eq!(storage.len(), model.len());
                for (&id, &v) in &model {
                    prop_assert!(storage.has(id));
                    prop_assert_eq!(*storage.get(id), v);
                }
                for (id, v) in storage.iter() {
                    prop_assert_eq!(model.get(&id), Some(v));
                }
            }
        }
    }
}
