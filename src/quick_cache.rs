//! QuickCache
//!
//! Thread-safe facade over [`CacheEngine`]. One lock guards the store, policy
//! bookkeeping and metrics together; every public operation holds it for its
//! whole duration. Also owns the background sweeper and snapshot persistence.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{error, info};

use crate::cache::{CacheEngine, EvictionPolicy, MetricsSnapshot};
use crate::config::Config;
use crate::error::{CacheError, PersistError, Result};
use crate::persistence::{decode_entries, encode_entries, FileStorage, Storage};
use crate::tasks::Sweeper;

// == Quick Cache ==
/// In-process key-value cache with TTL, eviction, metrics and snapshots.
///
/// Values are cloned out on reads. The sweeper is stopped by [`QuickCache::stop`]
/// or when the cache is dropped.
pub struct QuickCache<V> {
    engine: Arc<Mutex<CacheEngine<V>>>,
    sweeper: Mutex<Option<Sweeper>>,
    storage: Box<dyn Storage>,
    metrics_storage: Box<dyn Storage>,
    config: Config,
}

impl<V> QuickCache<V>
where
    V: Clone + Send + 'static,
{
    // == Constructors ==
    /// Creates a cache from configuration and starts the sweeper.
    pub fn new(config: Config) -> Result<Self> {
        let policy = config.eviction_policy.build();
        Self::with_policy(config, policy)
    }

    /// Creates a cache with a custom eviction policy.
    pub fn with_policy(config: Config, policy: Box<dyn EvictionPolicy>) -> Result<Self> {
        let storage = Box::new(FileStorage::new(&config.storage_dir, config.filename.as_str()));
        let metrics_storage = Box::new(FileStorage::new(
            &config.metrics_storage_dir,
            config.metrics_filename.as_str(),
        ));
        Self::build(config, policy, storage, metrics_storage)
    }

    /// Creates a cache with custom snapshot and metrics storage.
    pub fn with_storage(
        config: Config,
        storage: Box<dyn Storage>,
        metrics_storage: Box<dyn Storage>,
    ) -> Result<Self> {
        let policy = config.eviction_policy.build();
        Self::build(config, policy, storage, metrics_storage)
    }

    fn build(
        config: Config,
        policy: Box<dyn EvictionPolicy>,
        storage: Box<dyn Storage>,
        metrics_storage: Box<dyn Storage>,
    ) -> Result<Self> {
        let engine = Arc::new(Mutex::new(CacheEngine::with_policy(&config, policy)?));

        let sweeper = if config.cleanup_interval.is_zero() {
            None
        } else {
            Some(Sweeper::for_engine(
                Arc::clone(&engine),
                config.cleanup_interval,
            )?)
        };

        info!(
            "QuickCache initialized: max_size={}, default_ttl={}s, policy={}, sweeper={}",
            config.max_size,
            config.default_ttl,
            config.eviction_policy,
            sweeper.is_some()
        );

        Ok(Self {
            engine,
            sweeper: Mutex::new(sweeper),
            storage,
            metrics_storage,
            config,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    // == Core Operations ==
    /// Returns the value of a valid key.
    pub fn get(&self, key: &str) -> Result<V> {
        self.engine.lock().get(key)
    }

    /// Inserts or overwrites a key. `ttl` defaults to the configured TTL.
    pub fn set(&self, key: &str, value: V, ttl: Option<u64>) -> Result<()> {
        self.engine.lock().set(key, value, ttl)
    }

    /// Inserts a key that is not currently valid.
    pub fn add(&self, key: &str, value: V, ttl: Option<u64>) -> Result<()> {
        self.engine.lock().add(key, value, ttl)
    }

    /// Overwrites a currently valid key.
    pub fn update(&self, key: &str, value: V, ttl: Option<u64>) -> Result<()> {
        self.engine.lock().update(key, value, ttl)
    }

    pub fn delete(&self, key: &str) -> Result<()> {
        self.engine.lock().delete(key)
    }

    // == Bulk Operations ==
    /// Upserts all pairs as one locked batch.
    pub fn set_many<I, K>(&self, items: I, ttl: Option<u64>) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
    {
        self.engine.lock().set_many(items, ttl)
    }

    /// Returns the values of the keys that are currently valid.
    pub fn get_many<K: AsRef<str>>(&self, keys: &[K]) -> HashMap<String, V> {
        self.engine.lock().get_many(keys)
    }

    /// Deletes the valid keys among `keys`; others are skipped.
    pub fn delete_many<K: AsRef<str>>(&self, keys: &[K]) {
        self.engine.lock().delete_many(keys)
    }

    // == Introspection ==
    /// Physical entry count, including expired entries not yet swept.
    pub fn size(&self) -> usize {
        self.engine.lock().size()
    }

    /// Entry count after removing expired entries.
    pub fn valid_size(&self) -> usize {
        self.engine.lock().valid_size()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.engine.lock().contains(key)
    }

    /// Remaining lifetime of a valid key, in seconds.
    pub fn ttl(&self, key: &str) -> Result<u64> {
        self.engine.lock().ttl(key)
    }

    /// Restarts a valid key's lifetime with a new TTL.
    pub fn expire(&self, key: &str, ttl: u64) -> Result<()> {
        self.engine.lock().expire(key, ttl)
    }

    pub fn keys(&self) -> Vec<String> {
        self.engine.lock().keys()
    }

    pub fn all_keys(&self) -> Vec<String> {
        self.engine.lock().all_keys()
    }

    // == Maintenance ==
    pub fn clear(&self) {
        self.engine.lock().clear()
    }

    /// Runs an expiry sweep now. Returns the number of entries removed.
    pub fn cleanup(&self) -> usize {
        self.engine.lock().cleanup()
    }

    // == Metrics ==
    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.engine.lock().metrics_snapshot()
    }

    pub fn reset_metrics(&self) {
        self.engine.lock().reset_metrics()
    }

    /// Writes a metrics snapshot with the metrics serializer.
    ///
    /// `use_timestamp` defaults to the configured `metrics_timestamps`.
    pub fn save_metrics(&self, path: Option<&Path>, use_timestamp: Option<bool>) -> Result<PathBuf> {
        let kind = self.config.metrics_serializer;
        let attempted = attempted_path(path, &self.config.metrics_storage_dir);
        let fail = |source: PersistError, path: PathBuf| {
            error!("Failed to save metrics to {:?}: {}", path, source);
            CacheError::MetricsSave {
                path,
                source: Box::new(source),
            }
        };

        let target = self
            .metrics_storage
            .resolve_path(
                path,
                kind.extension(),
                use_timestamp.unwrap_or(self.config.metrics_timestamps),
            )
            .map_err(|e| fail(e, attempted))?;

        let snapshot = self.metrics_snapshot();
        let payload = kind.encode(&snapshot).map_err(|e| fail(e, target.clone()))?;
        self.metrics_storage
            .write(&target, &payload)
            .map_err(|e| fail(e, target.clone()))?;

        info!("Metrics saved to {:?}", target);
        Ok(target)
    }

    // == Persistence ==
    /// Writes a snapshot of every stored entry with the configured serializer.
    ///
    /// Entries are encoded under the lock so the snapshot is consistent; the
    /// file write happens after it is released. `use_timestamp` defaults to
    /// the configured `cache_timestamps`. Returns the path written.
    pub fn save(&self, path: Option<&Path>, use_timestamp: Option<bool>) -> Result<PathBuf>
    where
        V: Serialize,
    {
        let kind = self.config.serializer;
        let attempted = attempted_path(path, &self.config.storage_dir);

        let target = self
            .storage
            .resolve_path(
                path,
                kind.extension(),
                use_timestamp.unwrap_or(self.config.cache_timestamps),
            )
            .map_err(|e| save_error(attempted, e))?;

        let engine = self.engine.lock();
        let count = engine.size();
        let encoded = encode_entries(kind, engine.entries());
        drop(engine);

        let payload = encoded.map_err(|e| save_error(target.clone(), e))?;
        self.storage
            .write(&target, &payload)
            .map_err(|e| save_error(target.clone(), e))?;

        info!("Cache saved to {:?} ({} entries, {})", target, count, kind);
        Ok(target)
    }

    /// Replaces the whole cache with a snapshot.
    ///
    /// The snapshot is read and decoded before the lock is taken; on any
    /// failure the current contents are left untouched. Metrics are reset and
    /// the key gauges republished. Returns the resulting entry count.
    pub fn load(&self, path: Option<&Path>) -> Result<usize>
    where
        V: DeserializeOwned,
    {
        let kind = self.config.serializer;
        let attempted = attempted_path(path, &self.config.storage_dir);

        let target = self
            .storage
            .resolve_path(path, kind.extension(), false)
            .map_err(|e| load_error(attempted, e))?;

        let payload = self
            .storage
            .read(&target, kind.is_binary())
            .map_err(|e| load_error(target.clone(), e))?;
        let entries = decode_entries::<V>(kind, &payload).map_err(|e| load_error(target.clone(), e))?;

        let mut engine = self.engine.lock();
        engine.replace_contents(entries)?;
        let size = engine.size();
        drop(engine);

        info!("Cache loaded from {:?} ({} entries)", target, size);
        Ok(size)
    }

    // == Lifecycle ==
    /// Stops the background sweeper, waiting up to `shutdown_timeout`.
    ///
    /// The cache stays usable afterwards; expired entries are then only
    /// removed lazily. Calling it again is a no-op.
    pub fn stop(&self) {
        let sweeper = self.sweeper.lock().take();
        if let Some(mut sweeper) = sweeper {
            sweeper.shutdown(self.config.shutdown_timeout);
        }
    }

    /// True while the background sweeper thread is alive.
    pub fn sweeper_running(&self) -> bool {
        self.sweeper
            .lock()
            .as_ref()
            .map_or(false, Sweeper::is_running)
    }
}

impl<V> Drop for QuickCache<V> {
    fn drop(&mut self) {
        if let Some(mut sweeper) = self.sweeper.get_mut().take() {
            sweeper.shutdown(self.config.shutdown_timeout);
        }
    }
}

impl<V> fmt::Debug for QuickCache<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuickCache")
            .field("engine", &*self.engine.lock())
            .field("sweeper", &self.sweeper.lock().is_some())
            .field("serializer", &self.config.serializer)
            .finish()
    }
}

fn attempted_path(path: Option<&Path>, default_dir: &Path) -> PathBuf {
    path.map_or_else(|| default_dir.to_path_buf(), Path::to_path_buf)
}

fn save_error(path: PathBuf, source: PersistError) -> CacheError {
    error!("Failed to save cache to {:?}: {}", path, source);
    CacheError::Save {
        path,
        source: Box::new(source),
    }
}

fn load_error(path: PathBuf, source: PersistError) -> CacheError {
    error!("Failed to load cache from {:?}: {}", path, source);
    CacheError::Load {
        path,
        source: Box::new(source),
    }
}
