//! Ordered Store Module
//!
//! Key to entry mapping whose iteration order doubles as the FIFO/LRU order
//! used by eviction policies.

use std::collections::HashMap;

use crate::cache::list::KeyList;
use crate::cache::CacheEntry;

// == Store Order ==
/// Ordering primitive handed to eviction policies.
///
/// Policies may reorder existing keys and inspect the order, but only the
/// store itself can add or remove keys.
#[derive(Debug, Default)]
pub struct StoreOrder {
    keys: KeyList,
}

impl StoreOrder {
    /// Moves a key to the newest end. Returns `false` if the key is not stored.
    pub fn move_to_back(&mut self, key: &str) -> bool {
        self.keys.move_to_back(key)
    }

    /// Oldest key in store order.
    pub fn front(&self) -> Option<&str> {
        self.keys.front()
    }

    /// Keys from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &str> + '_ {
        self.keys.iter()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }
}

// == Ordered Store ==
/// Entry storage with a stable, reorderable key order.
///
/// A new key is appended at the back. Overwriting an existing key keeps its
/// position; only policies move keys.
#[derive(Debug)]
pub struct OrderedStore<V> {
    entries: HashMap<String, CacheEntry<V>>,
    order: StoreOrder,
}

impl<V> Default for OrderedStore<V> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
            order: StoreOrder::default(),
        }
    }
}

impl<V> OrderedStore<V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&CacheEntry<V>> {
        self.entries.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut CacheEntry<V>> {
        self.entries.get_mut(key)
    }

    /// Writes an entry, returning the replaced one if the key was present.
    pub fn insert(&mut self, key: &str, entry: CacheEntry<V>) -> Option<CacheEntry<V>> {
        let previous = self.entries.insert(key.to_string(), entry);
        if previous.is_none() {
            self.order.keys.push_back(key);
        }
        previous
    }

    pub fn remove(&mut self, key: &str) -> Option<CacheEntry<V>> {
        let removed = self.entries.remove(key)?;
        self.order.keys.remove(key);
        Some(removed)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.keys.clear();
    }

    /// Physical entry count, including expired entries not yet swept.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Keys in store order.
    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.order.iter()
    }

    /// Entries in store order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &CacheEntry<V>)> {
        self.order
            .iter()
            .filter_map(|key| self.entries.get(key).map(|entry| (key, entry)))
    }

    pub fn order(&self) -> &StoreOrder {
        &self.order
    }

    pub fn order_mut(&mut self) -> &mut StoreOrder {
        &mut self.order
    }
}
