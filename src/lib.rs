//! # Babylon cache (babylon-cache)
//!
//! Read-through caching for a social trading backend: profiles, balances,
//! positions, feeds, chats, markets and registry listings, each cached under a
//! deterministic key with its own lifetime and invalidation tags.
//!
//! ## Features
//!
//! - Async-first design using tokio
//! - Redis store via a multiplexed connection manager, with an in-memory
//!   store and a no-op store as alternatives
//! - Typed accessors that never fail: errors degrade to default payloads
//! - Per-key hit/miss monitoring
//! - Best-effort invalidation by key, tag or pattern
//!
//! ## Cached accessors
//!
//! ```no_run
//! use babylon_cache::{CacheConfig, CacheLayer};
//! # use babylon_cache::source::DataSource;
//! # use std::sync::Arc;
//!
//! # async fn example<S: DataSource>(source: Arc<S>) -> anyhow::Result<()> {
//! let layer = CacheLayer::connect(CacheConfig::from_env()).await?;
//! let queries = layer.queries(source);
//!
//! let balance = queries.get_cached_user_balance("u1").await;
//! if balance.success {
//!     println!("balance: {}", balance.data.balance);
//! }
//!
//! // After a trade, drop everything it affected
//! layer.invalidator().on_trade_created("u1", "market-7").await;
//! # Ok(())
//! # }
//! ```
//!
//! ## Health checks
//!
//! ```no_run
//! use babylon_cache::RedisConnection;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let conn = RedisConnection::new("redis://localhost:6379").await?;
//!
//!     let result = conn.health_check_with_retry().await;
//!     if result.status.is_operational() {
//!         println!("Redis is operational ({}ms)", result.response_time_ms);
//!     }
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod connection;
pub mod error;
pub mod schema;
pub mod source;

// Re-export main types for convenience
pub use cache::{
    CacheConfig, CacheConfigBuilder, CacheKey, CacheKeyBuilder, CacheLayer, CacheMonitor,
    CachePolicy, CacheValue, CachedQueries, InvalidationEvent, InvalidationReason,
    InvalidationStrategy, Invalidator, KeyValueStore, MemoryStore, NullStore, ReadThroughCache,
    RedisStore, StoreBackend,
};
pub use connection::{
    HealthCheckConfig, HealthCheckMetadata, HealthCheckMethod, HealthCheckResult, HealthStatus,
    RedisConnection,
};
pub use error::{CacheError, Result};
pub use schema::CachedResult;
pub use source::DataSource;
