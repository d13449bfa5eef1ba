//! QuickCache - A thread-safe in-process key-value cache
//!
//! Provides TTL expiration, LRU/FIFO/LFU eviction, usage metrics, a background
//! expiry sweeper and JSON/bincode snapshots.

pub mod cache;
pub mod config;
pub mod error;
pub mod persistence;
pub mod quick_cache;
pub mod tasks;

pub use cache::{EvictionPolicy, MetricsSnapshot, PolicyKind};
pub use config::Config;
pub use error::{CacheError, PersistError, Result};
pub use persistence::{FileStorage, SerializerKind, Storage};
pub use quick_cache::QuickCache;
