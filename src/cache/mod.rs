//! # Read-through caching layer
//!
//! Caches per-entity query results in a key/value store with fixed
//! lifetimes, tags them for invalidation, and tracks hit rates per key.
//!
//! ## Features
//!
//! - **Pluggable stores**: Redis (`SET EX`, `SCAN`), in-process map with LRU
//!   eviction, or a null store when caching is disabled
//! - **Ambient context**: fetch routines add tags and adjust lifetimes without
//!   extra parameters, isolated per task
//! - **Monitoring**: hit/miss counters and response times per key
//! - **Invalidation**: exact keys, tags, pattern scan, or an enumerated
//!   pagination grid when the store cannot scan
//!
//! ## Example
//!
//! ```rust
//! use babylon_cache::cache::{CacheConfig, CacheLayer, CachePolicy};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let layer = CacheLayer::connect(CacheConfig::memory()).await?;
//! let cache = layer.read_through();
//!
//! let total: u64 = cache
//!     .read_through(&CachePolicy::stats(), || async { Ok(42) })
//!     .await?;
//! assert_eq!(total, 42);
//!
//! layer.invalidator().invalidate_key("stats").await;
//! # Ok(())
//! # }
//! ```

pub mod accessors;
pub mod config;
pub mod context;
pub mod entry;
pub mod invalidation;
pub mod keys;
pub mod layer;
pub mod monitoring;
pub mod pattern;
pub mod policy;
pub mod read_through;
pub mod redis_store;
pub mod store;
pub mod tags;
pub mod types;

pub use accessors::CachedQueries;
pub use config::{CacheConfig, CacheConfigBuilder, StoreBackend};
pub use context::{
    add_tag, add_tags, current_expiry, current_tags, run_in_context, set_expiry, CacheContext,
};
pub use entry::{CacheEntry, CacheMetadata};
pub use invalidation::{
    InvalidationEvent, InvalidationReason, InvalidationStrategy, Invalidator, PAGINATION_LIMITS,
    PAGINATION_OFFSETS,
};
pub use keys::{CacheKeyBuilder, Namespace};
pub use layer::CacheLayer;
pub use monitoring::CacheMonitor;
pub use policy::CachePolicy;
pub use read_through::ReadThroughCache;
pub use redis_store::RedisStore;
pub use store::{KeyValueStore, MemoryStore, NullStore};
pub use tags::TagRegistry;
pub use types::{CacheKey, CacheValue, KeyStatsSummary, MonitorSummary, MonitoringStat, StoreStats};
