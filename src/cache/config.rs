//! Configuration for the cache layer

use crate::error::{CacheError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::warn;

/// Which key/value backend the cache layer talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// In-process map with TTL and LRU eviction
    Memory,
    /// Remote Redis-compatible store
    Redis,
    /// No store configured: every read is a miss
    Disabled,
}

impl StoreBackend {
    /// Parse a backend name as used in `CACHE_BACKEND`
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "memory" | "in-memory" => Some(StoreBackend::Memory),
            "redis" => Some(StoreBackend::Redis),
            "disabled" | "none" | "off" => Some(StoreBackend::Disabled),
            _ => None,
        }
    }
}

/// Configuration for the cache layer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Selected backend
    pub backend: StoreBackend,

    /// Redis connection URL, required for the Redis backend
    pub redis_url: Option<String>,

    /// Prefix applied to every key written to a remote store
    pub key_prefix: String,

    /// Keys requested per SCAN page during pattern deletion
    pub scan_batch_size: usize,

    /// Whether the backend may be asked to delete by pattern.
    /// Some managed deployments disable SCAN; invalidation then falls back
    /// to enumerated exact deletes.
    pub pattern_scan: bool,

    /// Maximum number of entries in the in-memory store
    pub max_entries: usize,

    /// Maximum total size of the in-memory store in bytes
    pub max_size_bytes: usize,

    /// Enable the background sweep of expired in-memory entries and of
    /// expired keys in the tag index
    pub enable_auto_cleanup: bool,

    /// Interval for the background sweep
    pub cleanup_interval: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Disabled,
            redis_url: None,
            key_prefix: String::new(),
            scan_batch_size: 100,
            pattern_scan: true,
            max_entries: 10_000,
            // 100 MB
            max_size_bytes: 100 * 1024 * 1024,
            enable_auto_cleanup: true,
            cleanup_interval: Duration::from_secs(60),
        }
    }
}

impl CacheConfig {
    /// Create a new builder for cache configuration
    pub fn builder() -> CacheConfigBuilder {
        CacheConfigBuilder::default()
    }

    /// In-process store with default limits
    pub fn memory() -> Self {
        Self {
            backend: StoreBackend::Memory,
            ..Default::default()
        }
    }

    /// Remote Redis store at `url`
    pub fn redis(url: impl Into<String>) -> Self {
        Self {
            backend: StoreBackend::Redis,
            redis_url: Some(url.into()),
            ..Default::default()
        }
    }

    /// No store: every read falls through to the system of record
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Load configuration from the environment (and `.env` if present).
    ///
    /// Recognised variables: `CACHE_BACKEND`, `REDIS_URL`, `CACHE_KEY_PREFIX`,
    /// `CACHE_SCAN_BATCH_SIZE`, `CACHE_PATTERN_SCAN`, `CACHE_MAX_ENTRIES`.
    /// Without `CACHE_BACKEND` the backend is Redis when `REDIS_URL` is set and
    /// disabled otherwise.
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();

        let redis_url = std::env::var("REDIS_URL").ok().filter(|u| !u.is_empty());
        let backend = match std::env::var("CACHE_BACKEND") {
            Ok(value) => StoreBackend::parse(&value).unwrap_or_else(|| {
                warn!("Unknown CACHE_BACKEND '{}', caching disabled", value);
                StoreBackend::Disabled
            }),
            Err(_) if redis_url.is_some() => StoreBackend::Redis,
            Err(_) => StoreBackend::Disabled,
        };

        let defaults = Self::default();
        Self {
            backend,
            redis_url,
            key_prefix: std::env::var("CACHE_KEY_PREFIX").unwrap_or(defaults.key_prefix),
            scan_batch_size: env_parse("CACHE_SCAN_BATCH_SIZE").unwrap_or(defaults.scan_batch_size),
            pattern_scan: env_parse("CACHE_PATTERN_SCAN").unwrap_or(defaults.pattern_scan),
            max_entries: env_parse("CACHE_MAX_ENTRIES").unwrap_or(defaults.max_entries),
            ..defaults
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.backend == StoreBackend::Redis && self.redis_url.is_none() {
            return Err(CacheError::ConfigError(
                "redis backend requires redis_url".to_string(),
            ));
        }

        if self.scan_batch_size == 0 {
            return Err(CacheError::ConfigError(
                "scan_batch_size must be greater than 0".to_string(),
            ));
        }

        if self.max_entries == 0 {
            return Err(CacheError::ConfigError(
                "max_entries must be greater than 0".to_string(),
            ));
        }

        if self.max_size_bytes == 0 {
            return Err(CacheError::ConfigError(
                "max_size_bytes must be greater than 0".to_string(),
            ));
        }

        if self.enable_auto_cleanup && self.cleanup_interval.is_zero() {
            return Err(CacheError::ConfigError(
                "cleanup_interval must be greater than 0 when auto cleanup is enabled".to_string(),
            ));
        }

        Ok(())
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    let raw = std::env::var(name).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("Ignoring unparsable {}='{}'", name, raw);
            None
        }
    }
}

/// Builder for cache configuration
#[derive(Debug, Default)]
pub struct CacheConfigBuilder {
    backend: Option<StoreBackend>,
    redis_url: Option<String>,
    key_prefix: Option<String>,
    scan_batch_size: Option<usize>,
    pattern_scan: Option<bool>,
    max_entries: Option<usize>,
    max_size_bytes: Option<usize>,
    enable_auto_cleanup: Option<bool>,
    cleanup_interval: Option<Duration>,
}

impl CacheConfigBuilder {
    /// Select the backend
    pub fn backend(mut self, backend: StoreBackend) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Set the Redis connection URL
    pub fn redis_url(mut self, url: impl Into<String>) -> Self {
        self.redis_url = Some(url.into());
        self
    }

    /// Set the key prefix for remote stores
    pub fn key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = Some(prefix.into());
        self
    }

    /// Set the SCAN page size
    pub fn scan_batch_size(mut self, size: usize) -> Self {
        self.scan_batch_size = Some(size);
        self
    }

    /// Enable or disable pattern scanning
    pub fn pattern_scan(mut self, enable: bool) -> Self {
        self.pattern_scan = Some(enable);
        self
    }

    /// Set maximum number of in-memory entries
    pub fn max_entries(mut self, max: usize) -> Self {
        self.max_entries = Some(max);
        self
    }

    /// Set maximum in-memory size in bytes
    pub fn max_size_bytes(mut self, size: usize) -> Self {
        self.max_size_bytes = Some(size);
        self
    }

    /// Enable or disable automatic cleanup
    pub fn enable_auto_cleanup(mut self, enable: bool) -> Self {
        self.enable_auto_cleanup = Some(enable);
        self
    }

    /// Set cleanup interval
    pub fn cleanup_interval(mut self, interval: Duration) -> Self {
        self.cleanup_interval = Some(interval);
        self
    }

    /// Build the cache configuration
    pub fn build(self) -> CacheConfig {
        let defaults = CacheConfig::default();

        CacheConfig {
            backend: self.backend.unwrap_or(defaults.backend),
            redis_url: self.redis_url.or(defaults.redis_url),
            key_prefix: self.key_prefix.unwrap_or(defaults.key_prefix),
            scan_batch_size: self.scan_batch_size.unwrap_or(defaults.scan_batch_size),
            pattern_scan: self.pattern_scan.unwrap_or(defaults.pattern_scan),
            max_entries: self.max_entries.unwrap_or(defaults.max_entries),
            max_size_bytes: self.max_size_bytes.unwrap_or(defaults.max_size_bytes),
            enable_auto_cleanup: self
                .enable_auto_cleanup
                .unwrap_or(defaults.enable_auto_cleanup),
            cleanup_interval: self.cleanup_interval.unwrap_or(defaults.cleanup_interval),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CacheConfig::default();
        assert_eq!(config.backend, StoreBackend::Disabled);
        assert_eq!(config.scan_batch_size, 100);
        assert!(config.pattern_scan);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut invalid = CacheConfig::redis("redis://localhost:6379");
        invalid.redis_url = None;
        assert!(invalid.validate().is_err());

        let mut invalid = CacheConfig::memory();
        invalid.max_entries = 0;
        assert!(invalid.validate().is_err());

        let mut invalid = CacheConfig::memory();
        invalid.scan_batch_size = 0;
        assert!(invalid.validate().is_err());

        let mut invalid = CacheConfig::memory();
        invalid.cleanup_interval = Duration::ZERO;
        assert!(invalid.validate().is_err());

        // A zero interval is harmless when nothing sweeps
        invalid.enable_auto_cleanup = false;
        assert!(invalid.validate().is_ok());
    }

    #[test]
    fn test_config_builder() {
        let config = CacheConfig::builder()
            .backend(StoreBackend::Memory)
            .max_entries(500)
            .pattern_scan(false)
            .key_prefix("babylon:")
            .build();

        assert_eq!(config.backend, StoreBackend::Memory);
        assert_eq!(config.max_entries, 500);
        assert!(!config.pattern_scan);
        assert_eq!(config.key_prefix, "babylon:");
        assert_eq!(config.max_size_bytes, CacheConfig::default().max_size_bytes);
    }

    #[test]
    fn test_backend_parse() {
        assert_eq!(StoreBackend::parse("Redis"), Some(StoreBackend::Redis));
        assert_eq!(StoreBackend::parse(" memory "), Some(StoreBackend::Memory));
        assert_eq!(StoreBackend::parse("off"), Some(StoreBackend::Disabled));
        assert_eq!(StoreBackend::parse("memcached"), None);
    }

    #[test]
    fn test_presets() {
        assert_eq!(CacheConfig::memory().backend, StoreBackend::Memory);

        let redis = CacheConfig::redis("redis://cache:6379");
        assert_eq!(redis.backend, StoreBackend::Redis);
        assert_eq!(redis.redis_url.as_deref(), Some("redis://cache:6379"));

        assert_eq!(CacheConfig::disabled().backend, StoreBackend::Disabled);
    }
}
