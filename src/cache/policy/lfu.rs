//! LFU Policy
//!
//! Least Frequently Used eviction with recency tie-breaking.
//!
//! Every tracked key has one frequency and sits in exactly one bucket for that
//! frequency. Buckets are [`KeyList`]s, so the oldest key of a bucket is the
//! least recently touched among keys with that count.

use std::collections::{BTreeMap, HashMap};

use crate::cache::list::KeyList;
use crate::cache::StoreOrder;
use crate::error::{CacheError, Result};

use super::EvictionPolicy;

/// Evicts the oldest key of the lowest frequency bucket.
#[derive(Debug, Default)]
pub struct LfuPolicy {
    /// Key to access frequency
    frequencies: HashMap<String, u64>,
    /// Frequency to keys with that frequency
    buckets: BTreeMap<u64, KeyList>,
    /// Smallest non-empty bucket, 0 when nothing is tracked
    min_frequency: u64,
}

impl LfuPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current frequency of a tracked key.
    pub fn frequency(&self, key: &str) -> Option<u64> {
        self.frequencies.get(key).copied()
    }

    pub fn min_frequency(&self) -> u64 {
        self.min_frequency
    }

    fn insert_into_bucket(&mut self, frequency: u64, key: &str) {
        self.buckets.entry(frequency).or_default().push_back(key);
    }

    /// Removes `key` from its bucket, dropping the bucket once empty.
    fn remove_from_bucket(&mut self, frequency: u64, key: &str) {
        if let Some(bucket) = self.buckets.get_mut(&frequency) {
            bucket.remove(key);
            if bucket.is_empty() {
                self.buckets.remove(&frequency);
            }
        }
    }

    fn lowest_bucket(&self) -> u64 {
        self.buckets.keys().next().copied().unwrap_or(0)
    }

    fn touch(&mut self, key: &str) {
        let Some(frequency) = self.frequencies.get_mut(key) else {
            // Untracked keys start over as fresh insertions
            self.track_new(key);
            return;
        };
        let old = *frequency;
        *frequency += 1;

        self.remove_from_bucket(old, key);
        self.insert_into_bucket(old + 1, key);

        if self.min_frequency == old && !self.buckets.contains_key(&old) {
            self.min_frequency = self.lowest_bucket();
        }
    }

    fn track_new(&mut self, key: &str) {
        if let Some(old) = self.frequencies.insert(key.to_string(), 1) {
            self.remove_from_bucket(old, key);
        }
        self.insert_into_bucket(1, key);
        self.min_frequency = 1;
    }
}

impl EvictionPolicy for LfuPolicy {
    fn name(&self) -> &'static str {
        "lfu"
    }

    fn on_add(&mut self, _order: &mut StoreOrder, key: &str) {
        self.track_new(key);
    }

    fn on_update(&mut self, _order: &mut StoreOrder, key: &str) {
        self.touch(key);
    }

    fn on_access(&mut self, _order: &mut StoreOrder, key: &str) {
        self.touch(key);
    }

    fn on_delete(&mut self, _order: &mut StoreOrder, key: &str) {
        let Some(frequency) = self.frequencies.remove(key) else {
            return;
        };

        self.remove_from_bucket(frequency, key);
        if self.min_frequency == frequency && !self.buckets.contains_key(&frequency) {
            self.min_frequency = self.lowest_bucket();
        }
    }

    fn on_clear(&mut self) {
        self.frequencies.clear();
        self.buckets.clear();
        self.min_frequency = 0;
    }

    fn select_eviction_key(&self, _order: &StoreOrder) -> Result<String> {
        self.buckets
            .get(&self.min_frequency)
            .and_then(KeyList::front)
            .map(str::to_string)
            .ok_or(CacheError::EvictionOnEmpty)
    }

    fn tracked_len(&self, _order: &StoreOrder) -> usize {
        self.frequencies.len()
    }
}
