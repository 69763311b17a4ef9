//! Error types for cache operations
//!
//! Store, connection and fetch failures all surface as [`CacheError`]. Callers of
//! the read-through accessors never see these directly: the accessor boundary
//! converts them into an unsuccessful result.

use thiserror::Error;

/// Main error type for cache operations
#[derive(Error, Debug)]
pub enum CacheError {
    /// Connection error - network or connection manager issues
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// A store command was rejected or failed
    #[error("Command error: {0}")]
    CommandError(String),

    /// Operation timeout
    #[error("Operation timed out after {timeout_seconds}s: {context}")]
    TimeoutError {
        timeout_seconds: u64,
        context: String,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Serialization/Deserialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Malformed glob pattern
    #[error("Invalid key pattern: {0}")]
    PatternError(String),

    /// The backing store cannot enumerate keys by pattern
    #[error("Pattern scan is not supported by the {backend} store")]
    PatternScanUnsupported { backend: &'static str },

    /// Entry does not fit within the store limits
    #[error("Capacity error: {0}")]
    CapacityError(String),

    /// The system of record failed to produce a value
    #[error("Fetch error: {0}")]
    FetchError(String),

    /// Redis driver error (wrapper)
    #[error("Redis driver error: {0}")]
    DriverError(#[from] redis::RedisError),

    /// Generic error with context
    #[error("Error: {0}")]
    Other(String),
}

/// Result type alias for cache operations
pub type Result<T> = std::result::Result<T, CacheError>;

impl From<String> for CacheError {
    fn from(s: String) -> Self {
        CacheError::Other(s)
    }
}

impl From<&str> for CacheError {
    fn from(s: &str) -> Self {
        CacheError::Other(s.to_string())
    }
}

impl From<serde_json::Error> for CacheError {
    fn from(e: serde_json::Error) -> Self {
        CacheError::SerializationError(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = CacheError::ConnectionError("Failed to connect".to_string());
        assert_eq!(error.to_string(), "Connection error: Failed to connect");

        let timeout_error = CacheError::TimeoutError {
            timeout_seconds: 5,
            context: "health check".to_string(),
        };
        assert!(timeout_error.to_string().contains("timed out after 5s"));

        let scan_error = CacheError::PatternScanUnsupported { backend: "null" };
        assert!(scan_error.to_string().contains("null store"));
    }

    #[test]
    fn test_error_conversion() {
        let error: CacheError = "test error".into();
        assert!(matches!(error, CacheError::Other(_)));

        let error: CacheError = "test error".to_string().into();
        assert!(matches!(error, CacheError::Other(_)));

        let json_err = serde_json::from_str::<u32>("not a number").unwrap_err();
        let error: CacheError = json_err.into();
        assert!(matches!(error, CacheError::SerializationError(_)));
    }
}
