//! LRU Policy
//!
//! Least Recently Used eviction on top of the shared store order.
//!
//! - Front = least recently used
//! - Back = most recently used

use crate::cache::StoreOrder;
use crate::error::{CacheError, Result};

use super::EvictionPolicy;

/// Evicts the key that was written or read the longest time ago.
#[derive(Debug, Default)]
pub struct LruPolicy;

impl LruPolicy {
    pub fn new() -> Self {
        Self
    }
}

impl EvictionPolicy for LruPolicy {
    fn name(&self) -> &'static str {
        "lru"
    }

    fn on_add(&mut self, order: &mut StoreOrder, key: &str) {
        order.move_to_back(key);
    }

    fn on_update(&mut self, order: &mut StoreOrder, key: &str) {
        order.move_to_back(key);
    }

    fn on_access(&mut self, order: &mut StoreOrder, key: &str) {
        order.move_to_back(key);
    }

    fn on_delete(&mut self, _order: &mut StoreOrder, _key: &str) {}

    fn select_eviction_key(&self, order: &StoreOrder) -> Result<String> {
        order
            .front()
            .map(str::to_string)
            .ok_or(CacheError::EvictionOnEmpty)
    }
}
