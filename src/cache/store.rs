//! Key/value store adapters
//!
//! [`KeyValueStore`] is the seam between the read-through accessors and the
//! physical cache. Two local implementations live here: [`MemoryStore`], an
//! in-process map with TTL expiry and LRU eviction, and [`NullStore`], used when
//! no store is configured. The Redis adapter lives in `redis_store`.

use crate::cache::{
    config::CacheConfig,
    entry::CacheEntry,
    pattern::GlobPattern,
    types::{CacheKey, CacheValue, StoreStats},
};
use crate::error::{CacheError, Result};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Contract every backing store satisfies
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Returns the stored value if present and unexpired
    async fn get(&self, key: &str) -> Result<Option<CacheValue>>;

    /// Stores the value, replacing any prior entry
    async fn set(&self, key: &str, value: CacheValue, ttl: Duration) -> Result<()>;

    /// Removes a single entry; `Ok(false)` when it was absent
    async fn delete(&self, key: &str) -> Result<bool>;

    /// Removes every entry whose key matches a glob pattern.
    ///
    /// Fails with [`CacheError::PatternScanUnsupported`] when
    /// [`supports_pattern_scan`](Self::supports_pattern_scan) is false.
    async fn delete_by_pattern(&self, pattern: &str) -> Result<usize>;

    /// Whether the store can enumerate keys by pattern
    fn supports_pattern_scan(&self) -> bool;

    /// Short backend name for logs
    fn backend_name(&self) -> &'static str;
}

/// In-process store with TTL support and LRU eviction
///
/// - Thread-safe async access via RwLock
/// - Expired entries are dropped on read and by [`MemoryStore::cleanup_expired`]
/// - LRU eviction when entry-count or byte limits are reached
pub struct MemoryStore {
    max_entries: usize,
    max_size_bytes: usize,
    pattern_scan: bool,
    inner: RwLock<MemoryInner>,
}

struct MemoryInner {
    entries: HashMap<CacheKey, CacheEntry>,
    /// Access order, least recently used first
    lru_queue: VecDeque<CacheKey>,
    stats: StoreStats,
    current_size_bytes: usize,
}

impl MemoryStore {
    /// Create a store sized from the configuration
    pub fn new(config: &CacheConfig) -> Self {
        info!(
            "Initializing in-memory cache store (max_entries: {}, max_size_bytes: {})",
            config.max_entries, config.max_size_bytes
        );

        Self {
            max_entries: config.max_entries,
            max_size_bytes: config.max_size_bytes,
            pattern_scan: config.pattern_scan,
            inner: RwLock::new(MemoryInner {
                entries: HashMap::new(),
                lru_queue: VecDeque::new(),
                stats: StoreStats::default(),
                current_size_bytes: 0,
            }),
        }
    }

    /// Store that refuses pattern deletion, as some managed deployments do
    pub fn without_pattern_scan(config: &CacheConfig) -> Self {
        let mut store = Self::new(config);
        store.pattern_scan = false;
        store
    }

    /// Remaining lifetime of an entry, if present and unexpired
    pub async fn ttl(&self, key: &str) -> Option<Duration> {
        let inner = self.inner.read().await;
        inner.entries.get(key).and_then(|e| e.time_until_expiration())
    }

    /// TTL an entry was written with
    pub async fn written_ttl(&self, key: &str) -> Option<Duration> {
        let inner = self.inner.read().await;
        inner.entries.get(key).map(|e| e.metadata.ttl)
    }

    /// Check if a key exists (without updating access time)
    pub async fn contains_key(&self, key: &str) -> bool {
        let inner = self.inner.read().await;
        inner.entries.get(key).is_some_and(|e| !e.is_expired())
    }

    /// Snapshot of all live keys, sorted
    pub async fn keys(&self) -> Vec<CacheKey> {
        let inner = self.inner.read().await;
        let mut keys: Vec<CacheKey> = inner
            .entries
            .values()
            .filter(|e| !e.is_expired())
            .map(|e| e.key.clone())
            .collect();
        keys.sort();
        keys
    }

    /// Clear all entries
    pub async fn clear(&self) {
        let mut inner = self.inner.write().await;

        let count = inner.entries.len();
        inner.entries.clear();
        inner.lru_queue.clear();
        inner.current_size_bytes = 0;
        inner.stats.entries = 0;
        inner.stats.size_bytes = 0;
        inner.stats.invalidations += count as u64;

        info!("Cleared {} entries from in-memory cache", count);
    }

    /// Remove all expired entries, returning how many were dropped
    pub async fn cleanup_expired(&self) -> usize {
        let mut inner = self.inner.write().await;

        let expired_keys: Vec<CacheKey> = inner
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired())
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired_keys {
            Self::remove_entry(&mut inner, key);
        }
        inner.stats.evictions_ttl += expired_keys.len() as u64;

        if !expired_keys.is_empty() {
            debug!("Cleaned up {} expired entries", expired_keys.len());
        }
        expired_keys.len()
    }

    /// Get store statistics
    pub async fn stats(&self) -> StoreStats {
        let inner = self.inner.read().await;
        inner.stats.clone()
    }

    /// Get number of entries in the store
    pub async fn len(&self) -> usize {
        let inner = self.inner.read().await;
        inner.entries.len()
    }

    /// Check if the store is empty
    pub async fn is_empty(&self) -> bool {
        let inner = self.inner.read().await;
        inner.entries.is_empty()
    }

    fn remove_entry(inner: &mut MemoryInner, key: &str) -> bool {
        match inner.entries.remove(key) {
            Some(entry) => {
                inner.lru_queue.retain(|k| k != key);
                inner.current_size_bytes = inner
                    .current_size_bytes
                    .saturating_sub(entry.metadata.size_bytes);
                inner.stats.entries = inner.entries.len();
                inner.stats.size_bytes = inner.current_size_bytes;
                true
            }
            None => false,
        }
    }

    fn evict_if_needed(&self, inner: &mut MemoryInner, needed_size: usize) -> Result<()> {
        if needed_size > self.max_size_bytes {
            warn!(
                "Entry of {} bytes exceeds cache size limit of {} bytes",
                needed_size, self.max_size_bytes
            );
            return Err(CacheError::CapacityError(format!(
                "entry of {} bytes exceeds limit of {} bytes",
                needed_size, self.max_size_bytes
            )));
        }

        while inner.entries.len() >= self.max_entries {
            match inner.lru_queue.pop_front() {
                Some(key) => {
                    debug!("Evicting entry due to max_entries limit: {}", key);
                    Self::remove_entry(inner, &key);
                    inner.stats.evictions_size += 1;
                }
                None => break,
            }
        }

        while inner.current_size_bytes + needed_size > self.max_size_bytes {
            match inner.lru_queue.pop_front() {
                Some(key) => {
                    debug!("Evicting entry due to size limit: {}", key);
                    Self::remove_entry(inner, &key);
                    inner.stats.evictions_size += 1;
                }
                None => break,
            }
        }

        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<CacheValue>> {
        let mut inner = self.inner.write().await;

        let expired = match inner.entries.get_mut(key) {
            Some(entry) if entry.is_expired() => true,
            Some(entry) => {
                entry.mark_accessed();
                let value = entry.value.clone();
                inner.lru_queue.retain(|k| k != key);
                inner.lru_queue.push_back(key.to_string());
                return Ok(Some(value));
            }
            None => return Ok(None),
        };

        if expired {
            debug!("Cache entry expired: {}", key);
            Self::remove_entry(&mut inner, key);
            inner.stats.evictions_ttl += 1;
        }
        Ok(None)
    }

    async fn set(&self, key: &str, value: CacheValue, ttl: Duration) -> Result<()> {
        let entry = CacheEntry::new(key.to_string(), value, ttl);
        let size = entry.metadata.size_bytes;

        let mut inner = self.inner.write().await;

        // Replacing counts against limits only by the size difference
        Self::remove_entry(&mut inner, key);
        self.evict_if_needed(&mut inner, size)?;

        inner.entries.insert(key.to_string(), entry);
        inner.lru_queue.push_back(key.to_string());
        inner.current_size_bytes += size;
        inner.stats.entries = inner.entries.len();
        inner.stats.size_bytes = inner.current_size_bytes;

        debug!("Stored cache entry: {} (ttl: {:?})", key, ttl);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let mut inner = self.inner.write().await;
        let removed = Self::remove_entry(&mut inner, key);
        if removed {
            inner.stats.invalidations += 1;
            debug!("Removed cache entry: {}", key);
        }
        Ok(removed)
    }

    async fn delete_by_pattern(&self, pattern: &str) -> Result<usize> {
        if !self.pattern_scan {
            return Err(CacheError::PatternScanUnsupported {
                backend: self.backend_name(),
            });
        }

        let glob = GlobPattern::new(pattern)?;
        let mut inner = self.inner.write().await;

        let matching: Vec<CacheKey> = inner
            .entries
            .keys()
            .filter(|key| glob.matches(key))
            .cloned()
            .collect();

        for key in &matching {
            Self::remove_entry(&mut inner, key);
        }
        inner.stats.invalidations += matching.len() as u64;

        debug!("Deleted {} entries matching {}", matching.len(), pattern);
        Ok(matching.len())
    }

    fn supports_pattern_scan(&self) -> bool {
        self.pattern_scan
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

/// Store used when no cache is configured: every read misses
#[derive(Debug, Default, Clone, Copy)]
pub struct NullStore;

#[async_trait]
impl KeyValueStore for NullStore {
    async fn get(&self, _key: &str) -> Result<Option<CacheValue>> {
        Ok(None)
    }

    async fn set(&self, _key: &str, _value: CacheValue, _ttl: Duration) -> Result<()> {
        Ok(())
    }

    async fn delete(&self, _key: &str) -> Result<bool> {
        Ok(false)
    }

    async fn delete_by_pattern(&self, _pattern: &str) -> Result<usize> {
        Err(CacheError::PatternScanUnsupported {
            backend: self.backend_name(),
        })
    }

    fn supports_pattern_scan(&self) -> bool {
        false
    }

    fn backend_name(&self) -> &'static str {
        "null"
    }
}

/// Background task sweeping expired in-memory entries
pub async fn start_auto_cleanup(store: Arc<MemoryStore>, interval: Duration) {
    info!("Starting automatic cache cleanup task (interval: {:?})", interval);

    loop {
        tokio::time::sleep(interval).await;

        let removed = store.cleanup_expired().await;
        if removed > 0 {
            debug!("Auto cleanup removed {} entries", removed);
        }
    }
}
