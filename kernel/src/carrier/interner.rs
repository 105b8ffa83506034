//! Append-only concurrent interner: the storage behind both the fact table and
//! the state repository.
//!
//! # Linearizability
//!
//! `get_or_insert` runs its insert path inside the `DashMap` shard lock for
//! the key, and appends the slot before releasing that lock. Two racing
//! inserts of equal keys therefore serialize on the same shard: exactly one
//! allocates a slot, the other observes it. Lock order is always
//! shard → slots; readers of `slots` never take a shard lock, so the order
//! cannot invert.

use std::hash::Hash;
use std::sync::{Arc, PoisonError, RwLock};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

/// Interns values of type `K`, assigning dense `u32` ids in insertion order.
#[derive(Debug)]
pub struct Interner<K: Eq + Hash> {
    index: DashMap<Arc<K>, u32>,
    slots: RwLock<Vec<Arc<K>>>,
}

impl<K: Eq + Hash> Default for Interner<K> {
    fn default() -> Self {
        Self {
            index: DashMap::new(),
            slots: RwLock::new(Vec::new()),
        }
    }
}

impl<K: Eq + Hash> Interner<K> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Return `(id, inserted)` for `key`, allocating a new id if `key` is new.
    ///
    /// Returns `None` only when the `u32` id space is exhausted.
    pub fn get_or_insert(&self, key: K) -> Option<(u32, bool)> {
        let existing = self.index.get(&key).map(|r| *r.value());
        if let Some(id) = existing {
            return Some((id, false));
        }

        match self.index.entry(Arc::new(key)) {
            Entry::Occupied(occupied) => Some((*occupied.get(), false)),
            Entry::Vacant(vacant) => {
                let mut slots = self.slots.write().unwrap_or_else(PoisonError::into_inner);
                let id = u32::try_from(slots.len()).ok()?;
                slots.push(Arc::clone(vacant.key()));
                vacant.insert(id);
                Some((id, true))
            }
        }
    }

    /// Id of `key` if present.
    #[must_use]
    pub fn get(&self, key: &K) -> Option<u32> {
        self.index.get(key).map(|r| *r.value())
    }

    /// The value behind `id`. O(1).
    #[must_use]
    pub fn resolve(&self, id: u32) -> Option<Arc<K>> {
        let slots = self.slots.read().unwrap_or_else(PoisonError::into_inner);
        slots.get(id as usize).cloned()
    }

    /// Resolve several ids under one read lock. Unknown ids are skipped.
    pub fn resolve_many(&self, ids: impl IntoIterator<Item = u32>) -> Vec<(u32, Arc<K>)> {
        let slots = self.slots.read().unwrap_or_else(PoisonError::into_inner);
        ids.into_iter()
            .filter_map(|id| slots.get(id as usize).map(|k| (id, Arc::clone(k))))
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
