//! Cache Engine Module
//!
//! Single-threaded cache core: ordered storage, lazy expiry, capacity
//! enforcement, policy notification and metrics. [`crate::QuickCache`] wraps
//! it in a lock; every method here assumes exclusive access.

use std::collections::HashMap;
use std::fmt;

use tracing::{debug, error, info, warn};

use crate::cache::entry::expiration_from_now;
use crate::cache::{
    CacheEntry, CacheMetrics, EvictionPolicy, MetricsRecorder, MetricsSnapshot, NoOpMetrics,
    OrderedStore,
};
use crate::config::Config;
use crate::error::{CacheError, Result};

// == Key Status ==
/// Classification of a key against the store. Always derived, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum KeyStatus {
    /// Not in the store
    Missing,
    /// Was in the store but expired; the inspection removed it
    Expired,
    /// In the store and not expired
    Valid,
}

// == Cache Engine ==
/// Cache core combining ordered storage, an eviction policy and metrics.
pub struct CacheEngine<V> {
    /// Key-value storage in policy order
    store: OrderedStore<V>,
    /// Eviction strategy
    policy: Box<dyn EvictionPolicy>,
    /// Event counters and gauges
    metrics: Box<dyn MetricsRecorder>,
    /// Maximum number of entries allowed
    max_size: usize,
    /// Default TTL in seconds for entries without explicit TTL
    default_ttl: u64,
}

impl<V> CacheEngine<V> {
    // == Constructor ==
    /// Creates an engine with the policy and metrics named by the config.
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::with_policy(config, config.eviction_policy.build())
    }

    /// Creates an engine with a caller-supplied eviction policy.
    pub fn with_policy(config: &Config, policy: Box<dyn EvictionPolicy>) -> Result<Self> {
        config.validate()?;

        let metrics: Box<dyn MetricsRecorder> = if config.enable_metrics {
            Box::new(CacheMetrics::new())
        } else {
            Box::new(NoOpMetrics)
        };

        Ok(Self {
            store: OrderedStore::new(),
            policy,
            metrics,
            max_size: config.max_size,
            default_ttl: config.default_ttl,
        })
    }

    // == Get ==
    /// Retrieves a value by key.
    ///
    /// Every call counts as a get; expired entries are removed and reported
    /// as [`CacheError::KeyExpired`] once, then as [`CacheError::KeyNotFound`].
    pub fn get(&mut self, key: &str) -> Result<V>
    where
        V: Clone,
    {
        self.metrics.record_get();

        match self.inspect(key) {
            KeyStatus::Missing => {
                self.metrics.record_miss();
                Err(CacheError::KeyNotFound(key.to_string()))
            }
            KeyStatus::Expired => {
                self.metrics.record_miss();
                Err(CacheError::KeyExpired(key.to_string()))
            }
            KeyStatus::Valid => {
                self.policy.on_access(self.store.order_mut(), key);
                self.metrics.record_hit();
                Ok(self.valid_entry(key)?.value.clone())
            }
        }
    }

    // == Set ==
    /// Stores a key-value pair, overwriting any existing value.
    ///
    /// # Arguments
    /// * `key` - The key to store
    /// * `value` - The value to store
    /// * `ttl` - Optional TTL in seconds (uses default_ttl if None)
    pub fn set(&mut self, key: &str, value: V, ttl: Option<u64>) -> Result<()> {
        let entry = CacheEntry::new(value, self.resolve_ttl(ttl)?)?;
        let status = self.inspect(key);
        self.write(key, entry, status)?;
        debug!("Key '{}' set", key);
        Ok(())
    }

    // == Add ==
    /// Stores a key only if it is not currently valid.
    ///
    /// An expired ghost is replaced as if the key were missing.
    pub fn add(&mut self, key: &str, value: V, ttl: Option<u64>) -> Result<()> {
        let entry = CacheEntry::new(value, self.resolve_ttl(ttl)?)?;

        let status = self.inspect(key);
        if status == KeyStatus::Valid {
            self.metrics.record_failed_op();
            return Err(CacheError::KeyAlreadyExists(key.to_string()));
        }

        self.write(key, entry, status)?;
        debug!("Key '{}' added", key);
        Ok(())
    }

    // == Update ==
    /// Overwrites the value of a currently valid key.
    pub fn update(&mut self, key: &str, value: V, ttl: Option<u64>) -> Result<()> {
        let entry = CacheEntry::new(value, self.resolve_ttl(ttl)?)?;

        if let Err(err) = self.require_valid(key) {
            self.metrics.record_failed_op();
            return Err(err);
        }

        self.write(key, entry, KeyStatus::Valid)?;
        debug!("Key '{}' updated", key);
        Ok(())
    }

    // == Delete ==
    /// Removes a currently valid key.
    pub fn delete(&mut self, key: &str) -> Result<()> {
        if let Err(err) = self.require_valid(key) {
            self.metrics.record_failed_op();
            return Err(err);
        }

        self.remove_valid(key);
        self.metrics.update_total_keys(self.store.len());
        debug!("Key '{}' manually deleted", key);
        Ok(())
    }

    // == Bulk Operations ==
    /// Upserts every pair with the same TTL.
    ///
    /// The TTL is validated once up front; keys are written in iteration order.
    pub fn set_many<I, K>(&mut self, items: I, ttl: Option<u64>) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
    {
        let ttl = self.resolve_ttl(ttl)?;
        expiration_from_now(ttl)?;

        for (key, value) in items {
            let key = key.as_ref();
            let entry = CacheEntry::new(value, ttl)?;
            let status = self.inspect(key);
            self.write(key, entry, status)?;
        }
        Ok(())
    }

    /// Returns the values of every valid key; missing and expired keys are
    /// left out of the result.
    pub fn get_many<K>(&mut self, keys: &[K]) -> HashMap<String, V>
    where
        K: AsRef<str>,
        V: Clone,
    {
        let mut found = HashMap::with_capacity(keys.len());

        for key in keys {
            let key = key.as_ref();
            self.metrics.record_get();

            if self.inspect(key) != KeyStatus::Valid {
                self.metrics.record_miss();
                continue;
            }

            self.policy.on_access(self.store.order_mut(), key);
            self.metrics.record_hit();
            if let Some(entry) = self.store.get(key) {
                found.insert(key.to_string(), entry.value.clone());
            }
        }
        found
    }

    /// Deletes every valid key, silently skipping the rest.
    pub fn delete_many<K>(&mut self, keys: &[K])
    where
        K: AsRef<str>,
    {
        let mut skipped = Vec::new();

        for key in keys {
            let key = key.as_ref();
            if self.inspect(key) == KeyStatus::Valid {
                self.remove_valid(key);
            } else {
                skipped.push(key);
            }
        }

        self.metrics.update_total_keys(self.store.len());
        if !skipped.is_empty() {
            debug!("Bulk delete skipped missing or expired keys: {:?}", skipped);
        }
    }

    // == Introspection ==
    /// Physical entry count, including expired entries not yet swept.
    pub fn size(&self) -> usize {
        self.store.len()
    }

    /// Sweeps expired entries, then returns the entry count.
    pub fn valid_size(&mut self) -> usize {
        self.cleanup();
        self.store.len()
    }

    /// Checks whether a key is currently valid.
    pub fn contains(&mut self, key: &str) -> bool {
        self.inspect(key) == KeyStatus::Valid
    }

    /// Valid keys in store order (sweeps first).
    pub fn keys(&mut self) -> Vec<String> {
        self.cleanup();
        self.all_keys()
    }

    /// Every physical key in store order, expired ones included.
    pub fn all_keys(&self) -> Vec<String> {
        self.store.keys().map(str::to_string).collect()
    }

    /// Entries in store order, for snapshot export.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &CacheEntry<V>)> {
        self.store.iter()
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    pub fn policy_name(&self) -> &'static str {
        self.policy.name()
    }

    // == TTL Management ==
    /// Remaining TTL of a valid key in whole seconds.
    pub fn ttl(&mut self, key: &str) -> Result<u64> {
        self.require_valid(key)?;
        Ok(self.valid_entry(key)?.ttl_remaining())
    }

    /// Restarts a valid key's lifetime with a new TTL.
    pub fn expire(&mut self, key: &str, ttl: u64) -> Result<()> {
        expiration_from_now(ttl)?;
        self.require_valid(key)?;

        match self.store.get_mut(key) {
            Some(entry) => entry.refresh(ttl),
            None => Err(missing_valid_key(key)),
        }
    }

    // == Clear ==
    /// Removes every entry. Event counters are kept; removed entries count
    /// as manual deletions.
    pub fn clear(&mut self) {
        let cleared = self.store.len();

        self.store.clear();
        self.policy.on_clear();

        self.metrics.update_total_keys(0);
        self.metrics.update_valid_keys(0);
        self.metrics.record_manual_deletions(cleared as u64);
        info!("Cache cleared. Removed {} items", cleared);
    }

    // == Cleanup Expired ==
    /// Removes all expired entries and resynchronizes the key gauges.
    ///
    /// Returns the number of entries removed.
    pub fn cleanup(&mut self) -> usize {
        let expired: Vec<String> = self
            .store
            .iter()
            .filter(|(_, entry)| entry.is_expired())
            .map(|(key, _)| key.to_string())
            .collect();

        let removed = expired
            .iter()
            .filter(|key| self.inspect(key) == KeyStatus::Expired)
            .count();

        // After a full sweep the physical and valid counts are identical
        let remaining = self.store.len();
        self.metrics.update_total_keys(remaining);
        self.metrics.update_valid_keys(remaining);
        removed
    }

    // == Metrics ==
    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    pub fn reset_metrics(&mut self) {
        self.metrics.reset();
    }

    // == Replace Contents ==
    /// Swaps the whole store for loaded entries.
    ///
    /// Policy bookkeeping is rebuilt in store order, metrics are reset and the
    /// gauges republished. A snapshot larger than `max_size` is trimmed.
    pub fn replace_contents<I>(&mut self, entries: I) -> Result<()>
    where
        I: IntoIterator<Item = (String, CacheEntry<V>)>,
    {
        self.store.clear();
        self.policy.on_clear();

        for (key, entry) in entries {
            if self.store.insert(&key, entry).is_none() {
                self.policy.on_add(self.store.order_mut(), &key);
            }
        }

        let total = self.store.len();
        self.metrics.reset();
        self.metrics.update_total_keys(total);
        self.metrics.update_valid_keys(total);

        if total > self.max_size {
            self.ensure_capacity(self.max_size)?;
        }
        Ok(())
    }

    // == Internal Helpers ==
    fn resolve_ttl(&self, ttl: Option<u64>) -> Result<u64> {
        match ttl {
            None => Ok(self.default_ttl),
            Some(0) => Err(CacheError::InvalidTtl(0)),
            Some(ttl) => Ok(ttl),
        }
    }

    /// Classifies a key, removing it on the spot if it has expired.
    fn inspect(&mut self, key: &str) -> KeyStatus {
        let expired = match self.store.get(key) {
            None => return KeyStatus::Missing,
            Some(entry) => entry.is_expired(),
        };
        if !expired {
            return KeyStatus::Valid;
        }

        self.store.remove(key);
        self.policy.on_delete(self.store.order_mut(), key);

        self.metrics.record_expired_removal();
        self.metrics.update_total_keys(self.store.len());
        self.metrics.update_valid_keys_by_delta(-1);
        debug!("Key '{}' expired and was removed", key);
        KeyStatus::Expired
    }

    fn require_valid(&mut self, key: &str) -> Result<()> {
        match self.inspect(key) {
            KeyStatus::Valid => Ok(()),
            KeyStatus::Missing => Err(CacheError::KeyNotFound(key.to_string())),
            KeyStatus::Expired => Err(CacheError::KeyExpired(key.to_string())),
        }
    }

    fn valid_entry(&self, key: &str) -> Result<&CacheEntry<V>> {
        self.store.get(key).ok_or_else(|| missing_valid_key(key))
    }

    /// Writes an entry for a key already classified as `status`.
    fn write(&mut self, key: &str, entry: CacheEntry<V>, status: KeyStatus) -> Result<()> {
        let is_new = status != KeyStatus::Valid;

        if is_new && self.store.len() >= self.max_size {
            self.ensure_capacity(self.max_size.saturating_sub(1))?;
        }

        self.store.insert(key, entry);

        if is_new {
            self.policy.on_add(self.store.order_mut(), key);
        } else {
            self.policy.on_update(self.store.order_mut(), key);
        }

        self.metrics.record_set();
        if is_new {
            self.metrics.update_total_keys(self.store.len());
            self.metrics.update_valid_keys_by_delta(1);
        }
        Ok(())
    }

    fn remove_valid(&mut self, key: &str) {
        self.store.remove(key);
        self.policy.on_delete(self.store.order_mut(), key);

        self.metrics.record_manual_deletion();
        self.metrics.update_valid_keys_by_delta(-1);
    }

    // == Ensure Capacity ==
    /// Shrinks the store to at most `limit` entries.
    ///
    /// Expired entries go first; then policy victims are evicted one by one.
    /// Gauges are republished once at the end.
    fn ensure_capacity(&mut self, limit: usize) -> Result<()> {
        warn!(
            "Cache capacity ({}) reached. Evicting items with {} policy",
            self.max_size,
            self.policy.name()
        );

        self.cleanup();

        let mut evicted = 0usize;
        while self.store.len() > limit {
            let victim = match self.policy.select_eviction_key(self.store.order()) {
                Ok(key) => key,
                Err(err) => {
                    error!(
                        "Eviction failed with {} entries stored: {}",
                        self.store.len(),
                        err
                    );
                    return Err(err);
                }
            };

            if self.store.remove(&victim).is_none() {
                error!("Eviction policy selected key '{}' which is not stored", victim);
                return Err(CacheError::Internal(format!(
                    "eviction policy selected unknown key '{}'",
                    victim
                )));
            }
            self.policy.on_delete(self.store.order_mut(), &victim);
            self.metrics.record_eviction();
            evicted += 1;
            debug!("Evicted key '{}'", victim);
        }

        if evicted > 0 {
            let remaining = self.store.len();
            self.metrics.update_total_keys(remaining);
            self.metrics.update_valid_keys(remaining);
        }
        Ok(())
    }

    /// Checks that policy bookkeeping matches the store exactly.
    #[cfg(test)]
    pub(crate) fn assert_consistent(&self) {
        assert_eq!(
            self.policy.tracked_len(self.store.order()),
            self.store.len(),
            "policy bookkeeping drifted from store contents"
        );
        assert_eq!(self.store.order().len(), self.store.len());
        assert!(self.store.len() <= self.max_size);
    }
}

impl<V> fmt::Debug for CacheEngine<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheEngine")
            .field("size", &self.store.len())
            .field("max_size", &self.max_size)
            .field("default_ttl", &self.default_ttl)
            .field("policy", &self.policy.name())
            .finish()
    }
}

fn missing_valid_key(key: &str) -> CacheError {
    CacheError::Internal(format!("key '{}' classified valid but not stored", key))
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{LruPolicy, PolicyKind, StoreOrder};
    use std::sync::{Arc, Mutex};
    use std::thread::sleep;
    use std::time::Duration;

    fn engine(max_size: usize, policy: PolicyKind) -> CacheEngine<i32> {
        let config = Config {
            max_size,
            default_ttl: 300,
            eviction_policy: policy,
            ..Config::default()
        };
        CacheEngine::from_config(&config).unwrap()
    }

    #[test]
    fn test_engine_new() {
        let engine = engine(100, PolicyKind::Lru);
        assert_eq!(engine.size(), 0);
        assert_eq!(engine.max_size(), 100);
        assert_eq!(engine.policy_name(), "lru");
    }

    #[test]
    fn test_engine_rejects_invalid_config() {
        let config = Config {
            max_size: 0,
            ..Config::default()
        };
        assert!(CacheEngine::<i32>::from_config(&config).is_err());
    }

    #[test]
    fn test_set_and_get() {
        let mut engine = engine(100, PolicyKind::Lru);

        engine.set("key1", 1, None).unwrap();

        assert_eq!(engine.get("key1").unwrap(), 1);
        assert_eq!(engine.size(), 1);
        engine.assert_consistent();
    }

    #[test]
    fn test_get_nonexistent() {
        let mut engine = engine(100, PolicyKind::Lru);

        assert!(matches!(engine.get("nonexistent"), Err(CacheError::KeyNotFound(_))));

        let snapshot = engine.metrics_snapshot();
        assert_eq!(snapshot.gets, 1);
        assert_eq!(snapshot.misses, 1);
    }

    #[test]
    fn test_set_overwrite_keeps_single_entry() {
        let mut engine = engine(100, PolicyKind::Lru);

        engine.set("key1", 1, None).unwrap();
        engine.set("key1", 2, None).unwrap();

        assert_eq!(engine.get("key1").unwrap(), 2);
        assert_eq!(engine.size(), 1);

        let snapshot = engine.metrics_snapshot();
        assert_eq!(snapshot.sets, 2);
        assert_eq!(snapshot.current_valid_keys, 1);
        assert_eq!(snapshot.current_total_keys, 1);
    }

    #[test]
    fn test_invalid_ttl_rejected_without_write() {
        let mut engine = engine(100, PolicyKind::Lru);

        assert!(matches!(engine.set("a", 1, Some(0)), Err(CacheError::InvalidTtl(0))));
        assert!(matches!(
            engine.set("a", 1, Some(u64::MAX)),
            Err(CacheError::InvalidTtl(_))
        ));
        assert_eq!(engine.size(), 0);
        assert_eq!(engine.metrics_snapshot().sets, 0);
    }

    #[test]
    fn test_add_existing_key_fails() {
        let mut engine = engine(100, PolicyKind::Lru);

        engine.add("a", 1, None).unwrap();
        let result = engine.add("a", 2, None);

        assert!(matches!(result, Err(CacheError::KeyAlreadyExists(_))));
        assert_eq!(engine.get("a").unwrap(), 1);
        assert_eq!(engine.metrics_snapshot().failed_ops, 1);
    }

    #[test]
    fn test_add_replaces_expired_ghost() {
        let mut engine = engine(100, PolicyKind::Lru);

        engine.set("a", 1, Some(1)).unwrap();
        sleep(Duration::from_millis(1100));

        engine.add("a", 2, None).unwrap();

        assert_eq!(engine.get("a").unwrap(), 2);
        engine.assert_consistent();
    }

    #[test]
    fn test_update_requires_valid_key() {
        let mut engine = engine(100, PolicyKind::Lru);

        assert!(matches!(engine.update("a", 1, None), Err(CacheError::KeyNotFound(_))));

        engine.set("a", 1, None).unwrap();
        engine.update("a", 5, Some(60)).unwrap();

        assert_eq!(engine.get("a").unwrap(), 5);
        assert_eq!(engine.size(), 1);
        assert_eq!(engine.metrics_snapshot().failed_ops, 1);
    }

    #[test]
    fn test_update_expired_key() {
        let mut engine = engine(100, PolicyKind::Lru);

        engine.set("a", 1, Some(1)).unwrap();
        sleep(Duration::from_millis(1100));

        assert!(matches!(engine.update("a", 2, None), Err(CacheError::KeyExpired(_))));
        assert!(matches!(engine.update("a", 2, None), Err(CacheError::KeyNotFound(_))));
        assert_eq!(engine.size(), 0);
    }

    #[test]
    fn test_delete() {
        let mut engine = engine(100, PolicyKind::Lru);

        engine.set("key1", 1, None).unwrap();
        engine.delete("key1").unwrap();

        assert_eq!(engine.size(), 0);
        assert!(matches!(engine.get("key1"), Err(CacheError::KeyNotFound(_))));
        assert!(matches!(engine.delete("key1"), Err(CacheError::KeyNotFound(_))));

        let snapshot = engine.metrics_snapshot();
        assert_eq!(snapshot.manual_deletions, 1);
        assert_eq!(snapshot.current_valid_keys, 0);
        assert_eq!(snapshot.peak_valid_keys, 1);
    }

    #[test]
    fn test_get_expired_then_not_found() {
        let mut engine = engine(100, PolicyKind::Lru);

        engine.set("key1", 1, Some(1)).unwrap();
        assert!(engine.get("key1").is_ok());

        sleep(Duration::from_millis(1100));

        assert!(matches!(engine.get("key1"), Err(CacheError::KeyExpired(_))));
        assert!(matches!(engine.get("key1"), Err(CacheError::KeyNotFound(_))));

        let snapshot = engine.metrics_snapshot();
        assert_eq!(snapshot.expired_removals, 1);
        assert_eq!(snapshot.current_total_keys, 0);
        engine.assert_consistent();
    }

    #[test]
    fn test_lru_eviction() {
        let mut engine = engine(3, PolicyKind::Lru);

        engine.set("key1", 1, None).unwrap();
        engine.set("key2", 2, None).unwrap();
        engine.set("key3", 3, None).unwrap();

        // Access key1 to make it most recently used
        engine.get("key1").unwrap();

        engine.set("key4", 4, None).unwrap();

        assert_eq!(engine.size(), 3);
        assert!(engine.get("key1").is_ok());
        assert!(matches!(engine.get("key2"), Err(CacheError::KeyNotFound(_))));
        assert_eq!(engine.metrics_snapshot().evictions, 1);
        engine.assert_consistent();
    }

    #[test]
    fn test_overwrite_at_capacity_does_not_evict() {
        let mut engine = engine(2, PolicyKind::Fifo);

        engine.set("a", 1, None).unwrap();
        engine.set("b", 2, None).unwrap();
        engine.set("a", 3, None).unwrap();

        assert_eq!(engine.size(), 2);
        assert_eq!(engine.metrics_snapshot().evictions, 0);
    }

    #[test]
    fn test_capacity_prefers_expired_entries() {
        let mut engine = engine(2, PolicyKind::Lru);

        engine.set("short", 1, Some(1)).unwrap();
        engine.set("long", 2, None).unwrap();
        sleep(Duration::from_millis(1100));

        engine.set("new", 3, None).unwrap();

        assert!(engine.contains("long"));
        assert!(engine.contains("new"));

        let snapshot = engine.metrics_snapshot();
        assert_eq!(snapshot.evictions, 0);
        assert_eq!(snapshot.expired_removals, 1);
    }

    #[test]
    fn test_bulk_operations() {
        let mut engine = engine(100, PolicyKind::Lru);

        engine.set_many([("a", 1), ("b", 2)], None).unwrap();
        let found = engine.get_many(&["a", "b", "c"]);

        assert_eq!(found.len(), 2);
        assert_eq!(found["a"], 1);
        assert_eq!(found["b"], 2);

        engine.delete_many(&["a", "c"]);
        assert_eq!(engine.all_keys(), vec!["b".to_string()]);

        let snapshot = engine.metrics_snapshot();
        assert_eq!(snapshot.gets, 3);
        assert_eq!(snapshot.hits, 2);
        assert_eq!(snapshot.misses, 1);
        assert_eq!(snapshot.manual_deletions, 1);
        engine.assert_consistent();
    }

    #[test]
    fn test_set_many_invalid_ttl_writes_nothing() {
        let mut engine = engine(100, PolicyKind::Lru);

        let result = engine.set_many([("a", 1), ("b", 2)], Some(0));

        assert!(matches!(result, Err(CacheError::InvalidTtl(0))));
        assert_eq!(engine.size(), 0);
    }

    #[test]
    fn test_size_and_valid_size() {
        let mut engine = engine(100, PolicyKind::Lru);

        engine.set("a", 1, None).unwrap();
        engine.set("b", 2, Some(1)).unwrap();
        assert_eq!(engine.size(), 2);

        sleep(Duration::from_millis(1100));

        assert_eq!(engine.size(), 2);
        assert_eq!(engine.valid_size(), 1);
        assert_eq!(engine.size(), 1);
    }

    #[test]
    fn test_cleanup_expired() {
        let mut engine = engine(100, PolicyKind::Lfu);

        engine.set("key1", 1, Some(1)).unwrap();
        engine.set("key2", 2, Some(10)).unwrap();

        sleep(Duration::from_millis(1100));

        assert_eq!(engine.cleanup(), 1);
        assert_eq!(engine.size(), 1);
        assert!(engine.get("key2").is_ok());

        let snapshot = engine.metrics_snapshot();
        assert_eq!(snapshot.current_total_keys, 1);
        assert_eq!(snapshot.current_valid_keys, 1);
        engine.assert_consistent();
    }

    #[test]
    fn test_clear_keeps_event_counters() {
        let mut engine = engine(100, PolicyKind::Lfu);

        engine.set("a", 1, None).unwrap();
        engine.set("b", 2, None).unwrap();
        engine.get("a").unwrap();
        engine.clear();

        assert_eq!(engine.size(), 0);
        engine.assert_consistent();

        let snapshot = engine.metrics_snapshot();
        assert_eq!(snapshot.hits, 1);
        assert_eq!(snapshot.sets, 2);
        assert_eq!(snapshot.manual_deletions, 2);
        assert_eq!(snapshot.current_total_keys, 0);
        assert_eq!(snapshot.current_valid_keys, 0);
        assert_eq!(snapshot.peak_total_keys, 2);
    }

    #[test]
    fn test_ttl_and_expire() {
        let mut engine = engine(100, PolicyKind::Lru);

        engine.set("a", 1, Some(10)).unwrap();
        let remaining = engine.ttl("a").unwrap();
        assert!((9..=10).contains(&remaining));

        engine.expire("a", 100).unwrap();
        assert!(engine.ttl("a").unwrap() >= 99);

        assert!(matches!(engine.expire("a", 0), Err(CacheError::InvalidTtl(0))));
        assert!(matches!(engine.ttl("missing"), Err(CacheError::KeyNotFound(_))));
        assert!(matches!(engine.expire("missing", 5), Err(CacheError::KeyNotFound(_))));
    }

    #[test]
    fn test_replace_contents_rebuilds_policy_and_trims() {
        let mut engine = engine(2, PolicyKind::Fifo);
        engine.set("old", 0, None).unwrap();
        engine.get("old").unwrap();

        let loaded = ["a", "b", "c"]
            .iter()
            .enumerate()
            .map(|(i, key)| (key.to_string(), CacheEntry::new(i as i32, 300).unwrap()));
        engine.replace_contents(loaded).unwrap();

        // FIFO trims the oldest loaded key
        assert_eq!(engine.all_keys(), vec!["b".to_string(), "c".to_string()]);
        engine.assert_consistent();

        let snapshot = engine.metrics_snapshot();
        assert_eq!(snapshot.hits, 0);
        assert_eq!(snapshot.evictions, 1);
        assert_eq!(snapshot.current_total_keys, 2);
    }

    #[test]
    fn test_metrics_disabled() {
        let config = Config {
            enable_metrics: false,
            ..Config::default()
        };
        let mut engine: CacheEngine<i32> = CacheEngine::from_config(&config).unwrap();

        engine.set("a", 1, None).unwrap();
        engine.get("a").unwrap();

        assert_eq!(engine.metrics_snapshot(), MetricsSnapshot::default());
    }

    /// Policy double that logs every hook call.
    #[derive(Debug)]
    struct RecordingPolicy {
        inner: LruPolicy,
        calls: Arc<Mutex<Vec<String>>>,
    }

    impl RecordingPolicy {
        fn log(&self, hook: &str, key: &str) {
            self.calls.lock().unwrap().push(format!("{hook}:{key}"));
        }
    }

    impl EvictionPolicy for RecordingPolicy {
        fn name(&self) -> &'static str {
            "recording"
        }

        fn on_add(&mut self, order: &mut StoreOrder, key: &str) {
            self.log("add", key);
            self.inner.on_add(order, key);
        }

        fn on_update(&mut self, order: &mut StoreOrder, key: &str) {
            self.log("update", key);
            self.inner.on_update(order, key);
        }

        fn on_access(&mut self, order: &mut StoreOrder, key: &str) {
            self.log("access", key);
            self.inner.on_access(order, key);
        }

        fn on_delete(&mut self, order: &mut StoreOrder, key: &str) {
            self.log("delete", key);
            self.inner.on_delete(order, key);
        }

        fn select_eviction_key(&self, order: &StoreOrder) -> Result<String> {
            self.inner.select_eviction_key(order)
        }
    }

    #[test]
    fn test_hooks_fire_once_per_transition() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let policy = RecordingPolicy {
            inner: LruPolicy::new(),
            calls: Arc::clone(&calls),
        };
        let config = Config {
            max_size: 2,
            ..Config::default()
        };
        let mut engine: CacheEngine<i32> =
            CacheEngine::with_policy(&config, Box::new(policy)).unwrap();

        engine.set("a", 1, None).unwrap();
        engine.set("a", 2, None).unwrap();
        engine.get("a").unwrap();
        engine.set("b", 3, None).unwrap();
        engine.set("c", 4, None).unwrap();
        engine.delete("c").unwrap();
        let _ = engine.add("b", 5, None);

        let calls = calls.lock().unwrap().clone();
        assert_eq!(
            calls,
            vec![
                "add:a", "update:a", "access:a", "add:b", "delete:a", "add:c", "delete:c",
            ]
        );
    }

    /// Policy that claims to track nothing.
    #[derive(Debug)]
    struct EmptyPolicy;

    impl EvictionPolicy for EmptyPolicy {
        fn name(&self) -> &'static str {
            "empty"
        }
        fn on_add(&mut self, _order: &mut StoreOrder, _key: &str) {}
        fn on_update(&mut self, _order: &mut StoreOrder, _key: &str) {}
        fn on_access(&mut self, _order: &mut StoreOrder, _key: &str) {}
        fn on_delete(&mut self, _order: &mut StoreOrder, _key: &str) {}
        fn select_eviction_key(&self, _order: &StoreOrder) -> Result<String> {
            Err(CacheError::EvictionOnEmpty)
        }
    }

    #[test]
    fn test_broken_policy_fails_loudly() {
        let config = Config {
            max_size: 1,
            ..Config::default()
        };
        let mut engine: CacheEngine<i32> =
            CacheEngine::with_policy(&config, Box::new(EmptyPolicy)).unwrap();

        engine.set("a", 1, None).unwrap();
        let result = engine.set("b", 2, None);

        assert!(matches!(result, Err(CacheError::EvictionOnEmpty)));
        assert!(engine.contains("a"));
        assert!(!engine.contains("b"));
    }
}
