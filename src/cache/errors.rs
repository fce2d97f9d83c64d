//! Cache error types

use thiserror::Error;

/// Errors raised by the typed cache helpers.
///
/// The raw [`TtlCache`](super::TtlCache) never fails on its own; these only
/// appear when a cached JSON value cannot be converted to or from a domain type.
#[derive(Debug, Error)]
pub enum CacheError {
    /// Failed to serialize a value before storing it
    #[error("Cache serialization error for key '{key}': {error}")]
    SerializationError { key: String, error: String },

    /// A stored value no longer matches the expected shape
    #[error("Cache deserialization error for key '{key}': {error}")]
    DeserializationError { key: String, error: String },
}

impl CacheError {
    pub fn serialization(key: impl Into<String>, error: impl std::fmt::Display) -> Self {
        Self::SerializationError {
            key: key.into(),
            error: error.to_string(),
        }
    }

    pub fn deserialization(key: impl Into<String>, error: impl std::fmt::Display) -> Self {
        Self::DeserializationError {
            key: key.into(),
            error: error.to_string(),
        }
    }
}

/// Result type for cache operations
pub type CacheResult<T> = Result<T, CacheError>;
