//! Cache layer assembly
//!
//! [`CacheLayer`] owns the store, the monitor and the tag registry and hands
//! out the read-through engine, typed accessors and invalidator that share
//! them. Build one at startup and pass it (or clones of its parts) around.

use crate::cache::{
    accessors::CachedQueries,
    config::{CacheConfig, StoreBackend},
    invalidation::Invalidator,
    monitoring::CacheMonitor,
    read_through::ReadThroughCache,
    redis_store::RedisStore,
    store::{start_auto_cleanup, KeyValueStore, MemoryStore, NullStore},
    tags::{start_tag_pruning, TagRegistry},
};
use crate::error::Result;
use crate::source::DataSource;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

pub struct CacheLayer {
    store: Arc<dyn KeyValueStore>,
    monitor: Arc<CacheMonitor>,
    tags: Arc<TagRegistry>,
    background_tasks: Vec<JoinHandle<()>>,
}

impl CacheLayer {
    /// Build the configured store.
    ///
    /// An unreachable Redis server does not fail startup: the layer logs a
    /// warning and runs on a [`NullStore`], so every read is a miss. With
    /// auto cleanup enabled, expired entries are swept from the memory store
    /// and expired keys from the tag index on every backend. Must be called
    /// within a tokio runtime.
    pub async fn connect(config: CacheConfig) -> Result<Self> {
        config.validate()?;

        let mut background_tasks = Vec::new();
        let store: Arc<dyn KeyValueStore> = match config.backend {
            StoreBackend::Memory => {
                let store = Arc::new(MemoryStore::new(&config));
                if config.enable_auto_cleanup {
                    background_tasks.push(tokio::spawn(start_auto_cleanup(
                        store.clone(),
                        config.cleanup_interval,
                    )));
                }
                store
            }
            StoreBackend::Redis => match RedisStore::connect(&config).await {
                Ok(store) => Arc::new(store),
                Err(e) => {
                    warn!("Redis unavailable, caching disabled: {}", e);
                    Arc::new(NullStore)
                }
            },
            StoreBackend::Disabled => Arc::new(NullStore),
        };

        info!("Cache layer ready (backend: {})", store.backend_name());

        let mut layer = Self::with_store(store);
        if config.enable_auto_cleanup {
            background_tasks.push(tokio::spawn(start_tag_pruning(
                layer.tags.clone(),
                config.cleanup_interval,
            )));
        }
        layer.background_tasks = background_tasks;
        Ok(layer)
    }

    /// Wrap an existing store, e.g. a test double
    pub fn with_store(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            monitor: Arc::new(CacheMonitor::new()),
            tags: Arc::new(TagRegistry::new()),
            background_tasks: Vec::new(),
        }
    }

    pub fn read_through(&self) -> ReadThroughCache {
        ReadThroughCache::new(self.store.clone(), self.monitor.clone(), self.tags.clone())
    }

    /// Typed accessors backed by `source`
    pub fn queries<S: DataSource>(&self, source: Arc<S>) -> CachedQueries<S> {
        CachedQueries::new(self.read_through(), source)
    }

    pub fn invalidator(&self) -> Invalidator {
        Invalidator::new(self.store.clone(), self.tags.clone())
    }

    pub fn monitor(&self) -> &Arc<CacheMonitor> {
        &self.monitor
    }

    pub fn store(&self) -> &Arc<dyn KeyValueStore> {
        &self.store
    }

    pub fn tags(&self) -> &Arc<TagRegistry> {
        &self.tags
    }
}

impl Drop for CacheLayer {
    fn drop(&mut self) {
        for task in self.background_tasks.drain(..) {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_disabled_backend_uses_null_store() {
        let layer = CacheLayer::connect(CacheConfig::disabled()).await.unwrap();
        assert_eq!(layer.store().backend_name(), "null");
        assert!(!layer.store().supports_pattern_scan());
    }

    #[tokio::test]
    async fn test_tag_index_is_pruned_on_every_backend() {
        let config = CacheConfig::builder()
            .cleanup_interval(Duration::from_millis(20))
            .build();
        let layer = CacheLayer::connect(config).await.unwrap();
        let tags = vec!["balance".to_string()];
        layer.tags().register("balance:u1", &tags, Duration::from_millis(10));

        tokio::time::sleep(Duration::from_millis(150)).await;

        assert_eq!(layer.tags().key_count(), 0);
    }

    #[tokio::test]
    async fn test_zero_cleanup_interval_is_rejected() {
        let config = CacheConfig::builder()
            .backend(StoreBackend::Memory)
            .cleanup_interval(Duration::ZERO)
            .build();
        assert!(CacheLayer::connect(config).await.is_err());
    }

    #[tokio::test]
    async fn test_memory_backend() {
        let layer = CacheLayer::connect(CacheConfig::memory()).await.unwrap();
        assert_eq!(layer.store().backend_name(), "memory");
        assert_eq!(layer.background_tasks.len(), 2);
    }

    #[tokio::test]
    async fn test_unreachable_redis_falls_back() {
        let layer = CacheLayer::connect(CacheConfig::redis("redis://127.0.0.1:1"))
            .await
            .unwrap();
        assert_eq!(layer.store().backend_name(), "null");
    }

    #[tokio::test]
    async fn test_redis_without_url_is_rejected() {
        let config = CacheConfig::builder()
            .backend(StoreBackend::Redis)
            .build();
        assert!(CacheLayer::connect(config).await.is_err());
    }
}
