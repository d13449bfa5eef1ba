//! FIFO Policy
//!
//! First In First Out eviction: reads and overwrites never change the order.

use crate::cache::StoreOrder;
use crate::error::{CacheError, Result};

use super::EvictionPolicy;

/// Evicts the oldest surviving inserted key.
#[derive(Debug, Default)]
pub struct FifoPolicy;

impl FifoPolicy {
    pub fn new() -> Self {
        Self
    }
}

impl EvictionPolicy for FifoPolicy {
    fn name(&self) -> &'static str {
        "fifo"
    }

    fn on_add(&mut self, order: &mut StoreOrder, key: &str) {
        // A re-inserted ghost counts as a fresh insertion
        order.move_to_back(key);
    }

    fn on_update(&mut self, _order: &mut StoreOrder, _key: &str) {}

    fn on_access(&mut self, _order: &mut StoreOrder, _key: &str) {}

    fn on_delete(&mut self, _order: &mut StoreOrder, _key: &str) {}

    fn select_eviction_key(&self, order: &StoreOrder) -> Result<String> {
        order
            .front()
            .map(str::to_string)
            .ok_or(CacheError::EvictionOnEmpty)
    }
}
