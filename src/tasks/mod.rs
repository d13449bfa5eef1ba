//! Background Tasks Module
//!
//! Contains background work that runs alongside the cache.
//!
//! # Tasks
//! - TTL Sweeper: Removes expired cache entries at configured intervals

mod cleanup;

pub use cleanup::Sweeper;
