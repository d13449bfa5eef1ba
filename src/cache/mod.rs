//! Cache Module
//!
//! In-memory caching with TTL expiration, pluggable eviction and metrics.

mod engine;
mod entry;
mod list;
mod metrics;
mod policy;
mod store;


// Re-export public types
pub use engine::CacheEngine;
pub use entry::CacheEntry;
pub use metrics::{CacheMetrics, MetricsRecorder, MetricsSnapshot, NoOpMetrics};
pub use policy::{EvictionPolicy, FifoPolicy, LfuPolicy, LruPolicy, PolicyKind};
pub use store::{OrderedStore, StoreOrder};
