//! Stored entry with TTL and access metadata (in-memory backend)

use crate::cache::types::{CacheKey, CacheValue};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A cache entry with TTL and metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    /// The cache key
    pub key: CacheKey,

    /// The cached value
    pub value: CacheValue,

    /// Entry metadata
    pub metadata: CacheMetadata,
}

impl CacheEntry {
    /// Create a new entry expiring `ttl` from now
    pub fn new(key: CacheKey, value: CacheValue, ttl: Duration) -> Self {
        let now = Utc::now();
        let expires_at = now + chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::seconds(1));

        let mut entry = Self {
            key,
            value,
            metadata: CacheMetadata {
                created_at: now,
                accessed_at: now,
                expires_at,
                ttl,
                access_count: 0,
                size_bytes: 0,
            },
        };
        entry.metadata.size_bytes = entry.calculate_size();
        entry
    }

    /// Check if the entry has expired
    pub fn is_expired(&self) -> bool {
        Utc::now() > self.metadata.expires_at
    }

    /// Get time until expiration
    pub fn time_until_expiration(&self) -> Option<Duration> {
        let now = Utc::now();
        if now > self.metadata.expires_at {
            None
        } else {
            (self.metadata.expires_at - now).to_std().ok()
        }
    }

    /// Mark the entry as accessed (updates access time and count)
    pub fn mark_accessed(&mut self) {
        self.metadata.accessed_at = Utc::now();
        self.metadata.access_count += 1;
    }

    /// Get the age of the entry
    pub fn age(&self) -> Duration {
        (Utc::now() - self.metadata.created_at)
            .to_std()
            .unwrap_or(Duration::from_secs(0))
    }

    /// Calculate the size of this entry in bytes
    pub fn calculate_size(&self) -> usize {
        // key + value + metadata overhead
        self.key.len() + self.value.len() + std::mem::size_of::<CacheMetadata>()
    }
}

/// Metadata associated with a cache entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheMetadata {
    /// When the entry was written
    pub created_at: DateTime<Utc>,

    /// Last access time (for LRU tracking)
    pub accessed_at: DateTime<Utc>,

    /// When the entry expires
    pub expires_at: DateTime<Utc>,

    /// TTL the entry was written with
    pub ttl: Duration,

    /// Number of times this entry has been read
    pub access_count: u64,

    /// Size of the entry in bytes
    pub size_bytes: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    #[test]
    fn test_cache_entry_creation() {
        let entry = CacheEntry::new(
            "profile:u1".to_string(),
            "{}".to_string(),
            Duration::from_secs(300),
        );

        assert_eq!(entry.key, "profile:u1");
        assert_eq!(entry.metadata.ttl, Duration::from_secs(300));
        assert!(!entry.is_expired());
        assert!(entry.metadata.size_bytes > 0);
    }

    #[test]
    fn test_entry_expiration() {
        let entry = CacheEntry::new(
            "balance:u1".to_string(),
            "{}".to_string(),
            Duration::from_millis(100),
        );

        assert!(!entry.is_expired());
        sleep(Duration::from_millis(150));
        assert!(entry.is_expired());
        assert!(entry.time_until_expiration().is_none());
    }

    #[test]
    fn test_mark_accessed() {
        let mut entry = CacheEntry::new(
            "stats".to_string(),
            "{}".to_string(),
            Duration::from_secs(60),
        );

        let initial_time = entry.metadata.accessed_at;
        sleep(Duration::from_millis(10));
        entry.mark_accessed();

        assert_eq!(entry.metadata.access_count, 1);
        assert!(entry.metadata.accessed_at > initial_time);
    }

    #[test]
    fn test_time_until_expiration() {
        let entry = CacheEntry::new(
            "markets:list".to_string(),
            "[]".to_string(),
            Duration::from_secs(300),
        );

        let time_left = entry.time_until_expiration().unwrap();
        assert!(time_left <= Duration::from_secs(300));
        assert!(time_left > Duration::from_secs(290));
    }

    #[test]
    fn test_age() {
        let entry = CacheEntry::new(
            "stats".to_string(),
            "{}".to_string(),
            Duration::from_secs(60),
        );

        sleep(Duration::from_millis(10));
        assert!(entry.age() >= Duration::from_millis(10));
    }
}
