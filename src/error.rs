//! Error types for the cache engine
//!
//! Provides unified error handling using thiserror.

use std::path::PathBuf;

use thiserror::Error;

// == Persistence Error ==
/// Underlying cause of a failed snapshot save or load.
#[derive(Error, Debug)]
pub enum PersistError {
    /// Filesystem failure while resolving, reading or writing a snapshot
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Text (JSON) encoding or decoding failure
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Binary (bincode) encoding or decoding failure
    #[error("bincode error: {0}")]
    Bincode(#[from] bincode::Error),

    /// Persisted expiration time could not be parsed as ISO-8601
    #[error("invalid expiration timestamp '{value}': {source}")]
    Timestamp {
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    /// Payload kind does not match what the serializer expects
    #[error("expected {expected} payload")]
    FormatMismatch { expected: &'static str },
}

// == Cache Error Enum ==
/// Unified error type for the cache.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Key not found in cache
    #[error("Key '{0}' not found")]
    KeyNotFound(String),

    /// Key has expired
    #[error("Key '{0}' has expired")]
    KeyExpired(String),

    /// Key is currently valid and cannot be added again
    #[error("Key '{0}' already exists")]
    KeyAlreadyExists(String),

    /// TTL is zero or too large to be represented
    #[error("Invalid TTL value: {0}")]
    InvalidTtl(u64),

    /// Snapshot could not be written
    #[error("Failed to save cache to {}: {source}", path.display())]
    Save {
        path: PathBuf,
        #[source]
        source: Box<PersistError>,
    },

    /// Snapshot could not be read or parsed
    #[error("Failed to load cache from {}: {source}", path.display())]
    Load {
        path: PathBuf,
        #[source]
        source: Box<PersistError>,
    },

    /// Metrics snapshot could not be written
    #[error("Failed to save metrics to {}: {source}", path.display())]
    MetricsSave {
        path: PathBuf,
        #[source]
        source: Box<PersistError>,
    },

    /// Eviction was requested while the policy tracks no keys
    #[error("Eviction requested on empty cache")]
    EvictionOnEmpty,

    /// Configuration rejected by validation
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Broken internal invariant
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CacheError {
    /// Stable machine-readable code for the error kind.
    pub fn code(&self) -> &'static str {
        match self {
            CacheError::KeyNotFound(_) => "KEY_NOT_FOUND",
            CacheError::KeyExpired(_) => "KEY_EXPIRED",
            CacheError::KeyAlreadyExists(_) => "KEY_ALREADY_EXISTS",
            CacheError::InvalidTtl(_) => "INVALID_TTL",
            CacheError::Save { .. } => "CACHE_SAVE_ERROR",
            CacheError::Load { .. } => "CACHE_LOAD_ERROR",
            CacheError::MetricsSave { .. } => "CACHE_METRICS_SAVE_ERROR",
            CacheError::EvictionOnEmpty => "EVICTION_ON_EMPTY",
            CacheError::InvalidConfig(_) => "INVALID_CONFIG",
            CacheError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache.
pub type Result<T> = std::result::Result<T, CacheError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_name_the_key() {
        let err = CacheError::KeyNotFound("a".to_string());
        assert_eq!(err.to_string(), "Key 'a' not found");

        let err = CacheError::KeyExpired("b".to_string());
        assert_eq!(err.to_string(), "Key 'b' has expired");

        let err = CacheError::InvalidTtl(0);
        assert_eq!(err.to_string(), "Invalid TTL value: 0");
    }

    #[test]
    fn test_error_codes() {
        let test_cases = vec![
            (CacheError::KeyNotFound("k".into()), "KEY_NOT_FOUND"),
            (CacheError::KeyExpired("k".into()), "KEY_EXPIRED"),
            (CacheError::KeyAlreadyExists("k".into()), "KEY_ALREADY_EXISTS"),
            (CacheError::InvalidTtl(0), "INVALID_TTL"),
            (CacheError::EvictionOnEmpty, "EVICTION_ON_EMPTY"),
        ];

        for (error, expected) in test_cases {
            assert_eq!(error.code(), expected);
        }
    }

    #[test]
    fn test_save_error_carries_path_and_cause() {
        let cause = PersistError::Io(std::io::Error::new(std::io::ErrorKind::Other, "boom"));
        let err = CacheError::Save {
            path: PathBuf::from("/tmp/cache.bin"),
            source: Box::new(cause),
        };

        let message = err.to_string();
        assert!(message.contains("/tmp/cache.bin"));
        assert!(message.contains("boom"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_load_error_source_chain_reaches_cause() {
        let cause = PersistError::Timestamp {
            value: "not-a-date".to_string(),
            source: chrono::DateTime::parse_from_rfc3339("not-a-date").unwrap_err(),
        };
        let err = CacheError::Load {
            path: PathBuf::from("snapshots/cache.json"),
            source: Box::new(cause),
        };

        assert_eq!(err.code(), "CACHE_LOAD_ERROR");

        let source = std::error::Error::source(&err).unwrap();
        let persist = source.downcast_ref::<PersistError>().unwrap();
        assert!(matches!(persist, PersistError::Timestamp { value, .. } if value == "not-a-date"));

        // The chrono parse error sits one level further down
        assert!(std::error::Error::source(persist).is_some());
    }
}
