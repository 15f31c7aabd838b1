//! ID-keyed entity caches.
//!
//! A [`Cache`] owns the canonical copy of every entity of one kind. Patches
//! are applied while holding the cache's write lock, with no suspension point
//! in between, so a concurrent reader sees either the whole patch or none of
//! it. Reads hand out clones: a value returned by [`Cache::get`] is a
//! point-in-time snapshot and does not track later patches.

use crate::error::ModelResult;
use crate::patch::{PatchDocument, Patchable};
use parking_lot::RwLock;
use std::collections::HashMap;
use tracing::debug;

/// Read-only lookup capability handed to entities for resolving references.
pub trait Lookup<T: Patchable> {
    /// Returns the current value for `id`, or `None` if it is not cached.
    fn lookup(&self, id: &T::Id) -> Option<T>;
}

/// Outcome of [`Cache::upsert`].
#[derive(Debug, Clone)]
pub enum Upsert<T> {
    /// The entity was not cached before; it was built from the document.
    Created(T),
    /// An existing entity was patched.
    Updated { old: T, new: T },
}

impl<T> Upsert<T> {
    /// The entity as it is after the operation.
    pub fn current(&self) -> &T {
        match self {
            Self::Created(entity) => entity,
            Self::Updated { new, .. } => new,
        }
    }
}

/// Store of every cached entity of kind `T`.
pub struct Cache<T: Patchable> {
    entries: RwLock<HashMap<T::Id, T>>,
}

impl<T: Patchable> Default for Cache<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Patchable> Cache<T> {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Returns a snapshot of the entity with this ID.
    pub fn get(&self, id: &T::Id) -> Option<T> {
        self.entries.read().get(id).cloned()
    }

    pub fn contains(&self, id: &T::Id) -> bool {
        self.entries.read().contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// IDs of every cached entity, in no particular order.
    pub fn ids(&self) -> Vec<T::Id> {
        self.entries.read().keys().cloned().collect()
    }

    /// Snapshots of every cached entity, in no particular order.
    pub fn values(&self) -> Vec<T> {
        self.entries.read().values().cloned().collect()
    }

    /// Inserts or replaces an entity, returning the replaced value.
    pub fn insert(&self, entity: T) -> Option<T> {
        self.entries.write().insert(entity.id(), entity)
    }

    /// Removes an entity, returning it if it was cached.
    pub fn remove(&self, id: &T::Id) -> Option<T> {
        let removed = self.entries.write().remove(id);
        if removed.is_some() {
            debug!(?id, "Evicted entity from cache");
        }
        removed
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }

    /// Patches the cached entity for the document's identity, creating it from
    /// the document if it is not cached yet.
    pub fn upsert(&self, doc: &PatchDocument) -> ModelResult<Upsert<T>> {
        let id: T::Id = doc.identity(T::ID_KEY)?;
        let mut entries = self.entries.write();

        if let Some(entity) = entries.get_mut(&id) {
            let old = entity.update(doc);
            return Ok(Upsert::Updated {
                old,
                new: entity.clone(),
            });
        }

        let entity = T::from_snapshot(doc)?;
        entries.insert(id.clone(), entity.clone());
        debug!(?id, "Cached new entity");
        Ok(Upsert::Created(entity))
    }

    /// Patches an already-cached entity. Returns `(old, new)`, or `None` if the
    /// entity is not cached; the document is then dropped.
    pub fn patch(&self, id: &T::Id, doc: &PatchDocument) -> Option<(T, T)> {
        let mut entries = self.entries.write();
        let entity = entries.get_mut(id)?;
        let old = entity.update(doc);
        Some((old, entity.clone()))
    }
}

impl<T: Patchable> Lookup<T> for Cache<T> {
    fn lookup(&self, id: &T::Id) -> Option<T> {
        self.get(id)
    }
}

impl<T: Patchable> Lookup<T> for HashMap<T::Id, T> {
    fn lookup(&self, id: &T::Id) -> Option<T> {
        self.get(id).cloned()
    }
}

impl<T: Patchable, L: Lookup<T> + ?Sized> Lookup<T> for &L {
    fn lookup(&self, id: &T::Id) -> Option<T> {
        (**self).lookup(id)
    }
}
