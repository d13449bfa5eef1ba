//! Eviction Policy Module
//!
//! Strategy contract deciding which key leaves the cache when it is full,
//! plus the LRU, FIFO and LFU implementations.
//!
//! The engine calls exactly one lifecycle hook per transition:
//! - `on_add` for brand-new keys and keys replacing an expired ghost
//! - `on_update` for overwrites of a valid key
//! - `on_access` for successful reads
//! - `on_delete` after a key left the store (delete, expiry or eviction)

mod fifo;
mod lfu;
mod lru;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::cache::StoreOrder;
use crate::error::Result;

pub use fifo::FifoPolicy;
pub use lfu::LfuPolicy;
pub use lru::LruPolicy;

// == Eviction Policy ==
/// Pluggable eviction strategy.
///
/// Policies never add or remove store keys. They may reorder keys through
/// [`StoreOrder`] or keep private bookkeeping, which must always track exactly
/// the keys present in the store.
pub trait EvictionPolicy: Send + fmt::Debug {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    fn on_add(&mut self, order: &mut StoreOrder, key: &str);

    fn on_update(&mut self, order: &mut StoreOrder, key: &str);

    fn on_access(&mut self, order: &mut StoreOrder, key: &str);

    /// Called after `key` has been removed from the store.
    fn on_delete(&mut self, order: &mut StoreOrder, key: &str);

    /// Called after the whole store was emptied.
    fn on_clear(&mut self) {}

    /// Chooses the next key to evict.
    ///
    /// Fails with [`crate::CacheError::EvictionOnEmpty`] when nothing is tracked.
    fn select_eviction_key(&self, order: &StoreOrder) -> Result<String>;

    /// Number of keys held in the policy's bookkeeping.
    fn tracked_len(&self, order: &StoreOrder) -> usize {
        order.len()
    }
}

// == Policy Kind ==
/// Built-in policies, selectable by name from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicyKind {
    Lru,
    Fifo,
    Lfu,
}

impl PolicyKind {
    /// Constructs a fresh policy instance.
    pub fn build(self) -> Box<dyn EvictionPolicy> {
        match self {
            PolicyKind::Lru => Box::new(LruPolicy::new()),
            PolicyKind::Fifo => Box::new(FifoPolicy::new()),
            PolicyKind::Lfu => Box::new(LfuPolicy::new()),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PolicyKind::Lru => "lru",
            PolicyKind::Fifo => "fifo",
            PolicyKind::Lfu => "lfu",
        }
    }
}

impl fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PolicyKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "lru" => Ok(PolicyKind::Lru),
            "fifo" => Ok(PolicyKind::Fifo),
            "lfu" => Ok(PolicyKind::Lfu),
            other => Err(format!("unknown eviction policy '{}'", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_kind_from_str() {
        assert_eq!("lru".parse::<PolicyKind>(), Ok(PolicyKind::Lru));
        assert_eq!("FIFO".parse::<PolicyKind>(), Ok(PolicyKind::Fifo));
        assert_eq!("Lfu".parse::<PolicyKind>(), Ok(PolicyKind::Lfu));
        assert!("random".parse::<PolicyKind>().is_err());
    }

    #[test]
    fn test_policy_kind_builds_named_policy() {
        for kind in [PolicyKind::Lru, PolicyKind::Fifo, PolicyKind::Lfu] {
            assert_eq!(kind.build().name(), kind.as_str());
        }
    }

    #[test]
    fn test_policy_kind_serde() {
        let kind: PolicyKind = serde_json::from_str("\"lfu\"").unwrap();
        assert_eq!(kind, PolicyKind::Lfu);
        assert_eq!(serde_json::to_string(&PolicyKind::Fifo).unwrap(), "\"fifo\"");
    }
}
