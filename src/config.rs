//! Configuration Module
//!
//! Handles loading and validating cache configuration.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::cache::PolicyKind;
use crate::error::{CacheError, Result};
use crate::persistence::SerializerKind;

/// Cache configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Maximum number of entries the cache can hold
    pub max_size: usize,
    /// Default TTL in seconds for entries without explicit TTL
    pub default_ttl: u64,
    /// Interval between background sweeps, zero disables the sweeper
    pub cleanup_interval: Duration,
    /// Eviction strategy used when the cache is full
    pub eviction_policy: PolicyKind,
    /// Format used for cache snapshots
    pub serializer: SerializerKind,
    /// Default directory for cache snapshots
    pub storage_dir: PathBuf,
    /// Default snapshot file name (extension is added by the serializer)
    pub filename: String,
    /// Append a timestamp to snapshot file names by default
    pub cache_timestamps: bool,
    /// Record metrics, otherwise a no-op recorder is used
    pub enable_metrics: bool,
    /// Format used for metrics snapshots
    pub metrics_serializer: SerializerKind,
    /// Default directory for metrics snapshots
    pub metrics_storage_dir: PathBuf,
    /// Default metrics file name
    pub metrics_filename: String,
    /// Append a timestamp to metrics file names by default
    pub metrics_timestamps: bool,
    /// How long shutdown waits for the sweeper to finish
    pub shutdown_timeout: Duration,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `QUICKCACHE_MAX_SIZE` - Maximum cache entries (default: 50)
    /// - `QUICKCACHE_DEFAULT_TTL` - Default TTL in seconds (default: 500)
    /// - `QUICKCACHE_CLEANUP_INTERVAL` - Sweep frequency in seconds (default: 50)
    /// - `QUICKCACHE_EVICTION_POLICY` - `lru`, `fifo` or `lfu` (default: lru)
    /// - `QUICKCACHE_SERIALIZER` - `bincode` or `json` (default: bincode)
    /// - `QUICKCACHE_STORAGE_DIR` - Snapshot directory (default: cache_storage)
    /// - `QUICKCACHE_FILENAME` - Snapshot file name (default: cache_data)
    /// - `QUICKCACHE_ENABLE_METRICS` - Record metrics (default: true)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            max_size: parse_var("QUICKCACHE_MAX_SIZE").unwrap_or(defaults.max_size),
            default_ttl: parse_var("QUICKCACHE_DEFAULT_TTL").unwrap_or(defaults.default_ttl),
            cleanup_interval: parse_var("QUICKCACHE_CLEANUP_INTERVAL")
                .map(Duration::from_secs)
                .unwrap_or(defaults.cleanup_interval),
            eviction_policy: parse_var("QUICKCACHE_EVICTION_POLICY")
                .unwrap_or(defaults.eviction_policy),
            serializer: parse_var("QUICKCACHE_SERIALIZER").unwrap_or(defaults.serializer),
            storage_dir: env::var("QUICKCACHE_STORAGE_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.storage_dir),
            filename: env::var("QUICKCACHE_FILENAME").unwrap_or(defaults.filename),
            enable_metrics: parse_var("QUICKCACHE_ENABLE_METRICS")
                .unwrap_or(defaults.enable_metrics),
            ..defaults
        }
    }

    /// Rejects configurations the engine cannot honor.
    pub fn validate(&self) -> Result<()> {
        if self.max_size == 0 {
            return Err(CacheError::InvalidConfig(
                "max_size must be at least 1".to_string(),
            ));
        }
        if self.default_ttl == 0 {
            return Err(CacheError::InvalidConfig(
                "default_ttl must be a positive number of seconds".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_size: 50,
            default_ttl: 500,
            cleanup_interval: Duration::from_secs(50),
            eviction_policy: PolicyKind::Lru,
            serializer: SerializerKind::Bincode,
            storage_dir: PathBuf::from("cache_storage"),
            filename: "cache_data".to_string(),
            cache_timestamps: false,
            enable_metrics: true,
            metrics_serializer: SerializerKind::Json,
            metrics_storage_dir: PathBuf::from("cache_metrics"),
            metrics_filename: "metrics".to_string(),
            metrics_timestamps: false,
            shutdown_timeout: Duration::from_secs(2),
        }
    }
}

fn parse_var<T: FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok())
}
