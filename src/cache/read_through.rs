//! Read-through engine shared by every cached accessor
//!
//! One call runs inside its own cache context:
//! 1. declare the policy's tags and lifetime
//! 2. read the store; a decodable value is a hit
//! 3. otherwise run the fetch, write the result under the context's final
//!    lifetime, register the context's tags, and record a miss
//!
//! Store failures never fail the call. A read error is treated as a miss and
//! a write error only costs the next caller a refetch.

use crate::cache::{
    context::{self, CacheContext},
    monitoring::CacheMonitor,
    policy::CachePolicy,
    store::KeyValueStore,
    tags::TagRegistry,
};
use crate::error::{CacheError, Result};
use serde::{de::DeserializeOwned, Serialize};
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, warn};

enum Lookup<T> {
    Hit(T),
    Fetched(anyhow::Result<T>),
}

#[derive(Clone)]
pub struct ReadThroughCache {
    store: Arc<dyn KeyValueStore>,
    monitor: Arc<CacheMonitor>,
    tags: Arc<TagRegistry>,
}

impl ReadThroughCache {
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        monitor: Arc<CacheMonitor>,
        tags: Arc<TagRegistry>,
    ) -> Self {
        Self {
            store,
            monitor,
            tags,
        }
    }

    pub fn store(&self) -> &Arc<dyn KeyValueStore> {
        &self.store
    }

    pub fn monitor(&self) -> &Arc<CacheMonitor> {
        &self.monitor
    }

    pub fn tags(&self) -> &Arc<TagRegistry> {
        &self.tags
    }

    /// Return the cached value for `policy.key`, or compute it with `fetch`.
    ///
    /// `fetch` runs inside the cache context, so it may call
    /// [`context::add_tag`] or [`context::set_expiry`] to refine the policy.
    /// A failed fetch is not cached and surfaces as
    /// [`CacheError::FetchError`]; the miss is still recorded.
    pub async fn read_through<T, F, Fut>(&self, policy: &CachePolicy, fetch: F) -> Result<T>
    where
        T: Serialize + DeserializeOwned + Send,
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = anyhow::Result<T>> + Send,
    {
        let start = Instant::now();
        let key = policy.key.as_str();

        let (lookup, ctx) = context::run_in_context(async {
            context::add_tags(policy.tags.iter().cloned());
            context::set_expiry(policy.ttl);

            match self.lookup::<T>(key).await {
                Some(value) => Lookup::Hit(value),
                None => Lookup::Fetched(fetch().await),
            }
        })
        .await;

        match lookup {
            Lookup::Hit(value) => {
                self.monitor.record_hit(key, elapsed_ms(start));
                Ok(value)
            }
            Lookup::Fetched(Ok(value)) => {
                self.populate(key, &value, &ctx, policy).await;
                self.monitor.record_miss(key, elapsed_ms(start));
                Ok(value)
            }
            Lookup::Fetched(Err(e)) => {
                self.monitor.record_miss(key, elapsed_ms(start));
                error!(key = %key, "fetch on cache miss failed: {:#}", e);
                Err(CacheError::FetchError(format!("{:#}", e)))
            }
        }
    }

    async fn lookup<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        match self.store.get(key).await {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(value) => Some(value),
                Err(e) => {
                    warn!(key = %key, "discarding undecodable cache entry: {}", e);
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                warn!(
                    key = %key,
                    backend = self.store.backend_name(),
                    "cache read failed, treating as miss: {}",
                    e
                );
                None
            }
        }
    }

    async fn populate<T: Serialize>(
        &self,
        key: &str,
        value: &T,
        ctx: &CacheContext,
        policy: &CachePolicy,
    ) {
        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(key = %key, "cannot serialize fetched value, not caching: {}", e);
                return;
            }
        };

        let ttl = ctx.expire_after.unwrap_or(policy.ttl);
        match self.store.set(key, raw, ttl).await {
            Ok(()) => {
                self.tags.register(key, &ctx.tags, ttl);
                debug!(key = %key, ttl_secs = ttl.as_secs(), tags = ctx.tags.len(), "cached");
            }
            Err(e) => {
                warn!(
                    key = %key,
                    backend = self.store.backend_name(),
                    "cache write failed: {}",
                    e
                );
            }
        }
    }
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}
