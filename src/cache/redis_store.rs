//! Redis-backed store adapter
//!
//! - TTL via `SET key value EX seconds`
//! - Pattern deletion via `SCAN cursor MATCH pattern COUNT n`, deleting each
//!   page with a single `DEL` (never `KEYS`)
//! - Optional key prefix so several deployments can share one server

use crate::cache::{
    config::CacheConfig,
    pattern,
    store::KeyValueStore,
    types::CacheValue,
};
use crate::connection::{HealthCheckConfig, RedisConnection};
use crate::error::{CacheError, Result};
use async_trait::async_trait;
use redis::AsyncCommands;
use std::time::Duration;
use tracing::debug;

/// Redis-backed key/value store
#[derive(Clone)]
pub struct RedisStore {
    connection: RedisConnection,
    prefix: String,
    scan_batch_size: usize,
    pattern_scan: bool,
}

impl RedisStore {
    /// Connect using the URL and scan settings from `config`
    pub async fn connect(config: &CacheConfig) -> Result<Self> {
        let url = config
            .redis_url
            .as_deref()
            .ok_or_else(|| CacheError::ConfigError("redis_url is not set".to_string()))?;

        let connection = RedisConnection::with_config(url, HealthCheckConfig::default()).await?;
        Ok(Self::from_connection(connection, config))
    }

    /// Wrap an existing connection
    pub fn from_connection(connection: RedisConnection, config: &CacheConfig) -> Self {
        Self {
            connection,
            prefix: config.key_prefix.clone(),
            scan_batch_size: config.scan_batch_size.max(1),
            pattern_scan: config.pattern_scan,
        }
    }

    /// The underlying connection, e.g. for health checks
    pub fn connection(&self) -> &RedisConnection {
        &self.connection
    }

    fn prefixed(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key)
    }
}

/// SCAN glob for `pattern` under `prefix`; the prefix matches literally
fn scan_pattern(prefix: &str, pattern: &str) -> String {
    format!("{}{}", pattern::escape(prefix), pattern)
}

#[async_trait]
impl KeyValueStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<CacheValue>> {
        let mut conn = self.connection.manager();
        let value: Option<String> = conn
            .get(self.prefixed(key))
            .await
            .map_err(|e| CacheError::CommandError(format!("GET {}: {}", key, e)))?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: CacheValue, ttl: Duration) -> Result<()> {
        let mut conn = self.connection.manager();
        let seconds = ttl.as_secs().max(1);

        let _: () = redis::cmd("SET")
            .arg(self.prefixed(key))
            .arg(value)
            .arg("EX")
            .arg(seconds)
            .query_async(&mut conn)
            .await
            .map_err(|e| CacheError::CommandError(format!("SET {}: {}", key, e)))?;

        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let mut conn = self.connection.manager();
        let deleted: i64 = conn
            .del(self.prefixed(key))
            .await
            .map_err(|e| CacheError::CommandError(format!("DEL {}: {}", key, e)))?;
        Ok(deleted > 0)
    }

    async fn delete_by_pattern(&self, pattern: &str) -> Result<usize> {
        if !self.pattern_scan {
            return Err(CacheError::PatternScanUnsupported {
                backend: self.backend_name(),
            });
        }

        let mut conn = self.connection.manager();
        let full_pattern = scan_pattern(&self.prefix, pattern);
        let mut cursor: u64 = 0;
        let mut removed = 0usize;

        loop {
            let (next_cursor, keys): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&full_pattern)
                .arg("COUNT")
                .arg(self.scan_batch_size)
                .query_async(&mut conn)
                .await
                .map_err(|e| CacheError::CommandError(format!("SCAN {}: {}", full_pattern, e)))?;

            if !keys.is_empty() {
                let deleted: i64 = conn
                    .del(&keys)
                    .await
                    .map_err(|e| CacheError::CommandError(format!("DEL batch: {}", e)))?;
                removed += deleted.max(0) as usize;
            }

            cursor = next_cursor;
            if cursor == 0 {
                break;
            }
        }

        debug!("Deleted {} keys matching {}", removed, full_pattern);
        Ok(removed)
    }

    fn supports_pattern_scan(&self) -> bool {
        self.pattern_scan
    }

    fn backend_name(&self) -> &'static str {
        "redis"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::pattern::GlobPattern;

    #[test]
    fn test_scan_pattern_keeps_prefix_literal() {
        let glob = scan_pattern("tenant*:", "stats*");
        assert_eq!(glob, "tenant\\*:stats*");

        let compiled = GlobPattern::new(&glob).unwrap();
        assert!(compiled.matches("tenant*:stats"));
        assert!(compiled.matches("tenant*:stats:daily"));
        assert!(!compiled.matches("tenant-b:stats"));
    }

    #[test]
    fn test_scan_pattern_without_prefix() {
        assert_eq!(scan_pattern("", "profile:*"), "profile:*");
    }
}
