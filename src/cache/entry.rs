//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL support.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CacheError, Result};

// == Cache Entry ==
/// A stored value with its absolute expiration time and original TTL.
///
/// `expiration_time` is always `write_time + ttl`. Entries are replaced
/// wholesale on update; only [`CacheEntry::refresh`] rewrites the TTL in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry<V> {
    /// The stored value
    pub value: V,
    /// Instant (UTC) after which the entry is expired
    pub expiration_time: DateTime<Utc>,
    /// TTL in seconds used to compute `expiration_time`
    pub ttl: u64,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    /// Creates an entry written now that expires after `ttl` seconds.
    pub fn new(value: V, ttl: u64) -> Result<Self> {
        Ok(Self {
            value,
            expiration_time: expiration_from_now(ttl)?,
            ttl,
        })
    }

    // == Is Expired ==
    /// Checks if the entry has expired.
    ///
    /// An entry is expired once the current time is strictly past its
    /// expiration time.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// Same as [`CacheEntry::is_expired`] against an explicit instant.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expiration_time
    }

    // == Time To Live ==
    /// Returns remaining TTL in whole seconds, zero once expired.
    pub fn ttl_remaining(&self) -> u64 {
        let remaining = self.expiration_time - Utc::now();
        remaining.num_seconds().max(0) as u64
    }

    // == Refresh ==
    /// Restarts the entry's lifetime with a new TTL, keeping the value.
    pub fn refresh(&mut self, ttl: u64) -> Result<()> {
        self.expiration_time = expiration_from_now(ttl)?;
        self.ttl = ttl;
        Ok(())
    }
}

// == Utility Functions ==
/// Validates a TTL and returns the instant it expires at when written now.
///
/// Zero and TTLs too large for a UTC timestamp are rejected.
pub fn expiration_from_now(ttl: u64) -> Result<DateTime<Utc>> {
    if ttl == 0 {
        return Err(CacheError::InvalidTtl(ttl));
    }

    i64::try_from(ttl)
        .ok()
        .and_then(Duration::try_seconds)
        .and_then(|delta| Utc::now().checked_add_signed(delta))
        .ok_or(CacheError::InvalidTtl(ttl))
}
