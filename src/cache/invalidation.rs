//! Cache invalidation
//!
//! Write-side code calls these after a successful mutation. Invalidation is
//! best-effort: failures are logged and never returned, since TTL expiry
//! eventually restores consistency anyway. Four strategies:
//! - Exact: delete one derived key
//! - Tag: delete every key registered under a tag in the [`TagRegistry`]
//! - Scan: delete by glob pattern when the store can enumerate keys
//! - Enumerated: when it cannot, delete a fixed grid of pagination variants
//!
//! The enumerated fallback is incomplete on purpose. Only the limits in
//! [`PAGINATION_LIMITS`] crossed with the offsets in [`PAGINATION_OFFSETS`]
//! are deleted; a page cached under any other `(limit, offset)` survives
//! until its TTL expires.

use crate::cache::{
    keys::{self, CacheKeyBuilder, Namespace},
    policy,
    store::KeyValueStore,
    tags::TagRegistry,
    types::CacheKey,
};
use crate::error::CacheError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Page sizes covered by the enumerated fallback
pub const PAGINATION_LIMITS: [u32; 4] = [10, 20, 50, 100];

/// Offsets covered by the enumerated fallback
pub const PAGINATION_OFFSETS: [u32; 5] = [0, 10, 20, 50, 100];

/// Why entries were invalidated
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InvalidationReason {
    ProfileUpdated { user_id: String },
    BalanceChanged { user_id: String },
    PositionsChanged { user_id: String },
    ChatsChanged { user_id: String },
    ReputationChanged { user_id: String },
    ActorUpdated { actor_id: String },
    FeedChanged { user_id: String },
    /// New trade on a prediction market
    TradeCreated { market_id: String },
    /// Invalidated by tag match
    TagMatch { tag: String },
    /// Manual invalidation by key
    Manual,
}

impl std::fmt::Display for InvalidationReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InvalidationReason::ProfileUpdated { user_id } => {
                write!(f, "profile updated: {}", user_id)
            }
            InvalidationReason::BalanceChanged { user_id } => {
                write!(f, "balance changed: {}", user_id)
            }
            InvalidationReason::PositionsChanged { user_id } => {
                write!(f, "positions changed: {}", user_id)
            }
            InvalidationReason::ChatsChanged { user_id } => write!(f, "chats changed: {}", user_id),
            InvalidationReason::ReputationChanged { user_id } => {
                write!(f, "reputation changed: {}", user_id)
            }
            InvalidationReason::ActorUpdated { actor_id } => {
                write!(f, "actor updated: {}", actor_id)
            }
            InvalidationReason::FeedChanged { user_id } => write!(f, "feed changed: {}", user_id),
            InvalidationReason::TradeCreated { market_id } => {
                write!(f, "trade created on market: {}", market_id)
            }
            InvalidationReason::TagMatch { tag } => write!(f, "tag match: {}", tag),
            InvalidationReason::Manual => write!(f, "manual invalidation"),
        }
    }
}

/// How the affected keys were found
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvalidationStrategy {
    Exact,
    Tag,
    Scan,
    Enumerated,
}

/// Outcome of one invalidation call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvalidationEvent {
    pub reason: InvalidationReason,
    pub strategy: InvalidationStrategy,
    /// Keys or pattern the store was asked to delete
    pub targets: Vec<String>,
    /// Entries actually removed
    pub removed: usize,
    /// Store operations that failed and were skipped
    pub failures: usize,
    pub timestamp: DateTime<Utc>,
}

impl InvalidationEvent {
    fn new(reason: InvalidationReason, strategy: InvalidationStrategy) -> Self {
        Self {
            reason,
            strategy,
            targets: Vec::new(),
            removed: 0,
            failures: 0,
            timestamp: Utc::now(),
        }
    }

    pub fn is_clean(&self) -> bool {
        self.failures == 0
    }
}

#[derive(Clone)]
pub struct Invalidator {
    store: Arc<dyn KeyValueStore>,
    tags: Arc<TagRegistry>,
}

impl Invalidator {
    pub fn new(store: Arc<dyn KeyValueStore>, tags: Arc<TagRegistry>) -> Self {
        Self { store, tags }
    }

    pub async fn invalidate_user_profile(&self, user_id: &str) -> InvalidationEvent {
        self.exact(
            InvalidationReason::ProfileUpdated {
                user_id: user_id.to_string(),
            },
            vec![keys::profile(user_id)],
        )
        .await
    }

    pub async fn invalidate_user_balance(&self, user_id: &str) -> InvalidationEvent {
        self.exact(
            InvalidationReason::BalanceChanged {
                user_id: user_id.to_string(),
            },
            vec![keys::balance(user_id)],
        )
        .await
    }

    pub async fn invalidate_user_positions(&self, user_id: &str) -> InvalidationEvent {
        self.exact(
            InvalidationReason::PositionsChanged {
                user_id: user_id.to_string(),
            },
            vec![keys::positions(user_id)],
        )
        .await
    }

    pub async fn invalidate_user_chats(&self, user_id: &str) -> InvalidationEvent {
        self.exact(
            InvalidationReason::ChatsChanged {
                user_id: user_id.to_string(),
            },
            vec![keys::user_chats(user_id)],
        )
        .await
    }

    pub async fn invalidate_user_reputation(&self, user_id: &str) -> InvalidationEvent {
        self.exact(
            InvalidationReason::ReputationChanged {
                user_id: user_id.to_string(),
            },
            vec![keys::reputation(user_id)],
        )
        .await
    }

    pub async fn invalidate_actor(&self, actor_id: &str) -> InvalidationEvent {
        self.exact(
            InvalidationReason::ActorUpdated {
                actor_id: actor_id.to_string(),
            },
            vec![keys::actor(actor_id)],
        )
        .await
    }

    pub async fn invalidate_key(&self, key: &str) -> InvalidationEvent {
        self.exact(InvalidationReason::Manual, vec![key.to_string()])
            .await
    }

    /// Delete every key registered under `tag` by earlier miss writes.
    ///
    /// Only keys written through this process are known to the registry.
    pub async fn invalidate_tag(&self, tag: &str) -> InvalidationEvent {
        let mut event = InvalidationEvent::new(
            InvalidationReason::TagMatch {
                tag: tag.to_string(),
            },
            InvalidationStrategy::Tag,
        );

        let mut keys: Vec<CacheKey> = self.tags.take_tag(tag).into_iter().collect();
        keys.sort();

        for key in keys {
            self.delete_one(&key, &mut event).await;
        }

        self.finish(event)
    }

    /// Delete every cached page of trades for a prediction market
    pub async fn invalidate_market_trades(&self, market_id: &str) -> InvalidationEvent {
        let pattern = CacheKeyBuilder::new(Namespace::PredictionTrades)
            .segment(market_id)
            .build_prefix_pattern();

        self.paginated(
            InvalidationReason::TradeCreated {
                market_id: market_id.to_string(),
            },
            &pattern,
            |limit, offset| keys::prediction_trades(market_id, limit, offset),
        )
        .await
    }

    /// Delete every cached page of a user's following feed
    pub async fn invalidate_following_feed(&self, user_id: &str) -> InvalidationEvent {
        let pattern = CacheKeyBuilder::new(Namespace::FollowingPosts)
            .segment(user_id)
            .build_prefix_pattern();

        self.paginated(
            InvalidationReason::FeedChanged {
                user_id: user_id.to_string(),
            },
            &pattern,
            |limit, offset| keys::following_posts(user_id, limit, offset),
        )
        .await
    }

    /// Fan-out after a prediction trade by `user_id` on `market_id`
    pub async fn on_trade_created(&self, user_id: &str, market_id: &str) -> Vec<InvalidationEvent> {
        vec![
            self.invalidate_user_balance(user_id).await,
            self.invalidate_user_positions(user_id).await,
            self.invalidate_market_trades(market_id).await,
            self.invalidate_tag(policy::TAG_PREDICTIONS).await,
            self.exact(
                InvalidationReason::TradeCreated {
                    market_id: market_id.to_string(),
                },
                vec![keys::predictions(None), keys::perp_markets(), keys::stats()],
            )
            .await,
        ]
    }

    /// Fan-out after a profile edit; actors share their id with their user
    pub async fn on_profile_updated(&self, user_id: &str) -> Vec<InvalidationEvent> {
        vec![
            self.invalidate_user_profile(user_id).await,
            self.invalidate_actor(user_id).await,
            self.invalidate_tag(policy::TAG_LATEST_POSTS).await,
        ]
    }

    async fn exact(&self, reason: InvalidationReason, keys: Vec<CacheKey>) -> InvalidationEvent {
        let mut event = InvalidationEvent::new(reason, InvalidationStrategy::Exact);
        for key in keys {
            self.delete_one(&key, &mut event).await;
        }
        self.finish(event)
    }

    async fn paginated<K>(
        &self,
        reason: InvalidationReason,
        pattern: &str,
        key_for: K,
    ) -> InvalidationEvent
    where
        K: Fn(u32, u32) -> CacheKey,
    {
        if self.store.supports_pattern_scan() {
            let mut event = InvalidationEvent::new(reason.clone(), InvalidationStrategy::Scan);
            event.targets.push(pattern.to_string());

            match self.store.delete_by_pattern(pattern).await {
                Ok(removed) => {
                    event.removed = removed;
                    return self.finish(event);
                }
                Err(CacheError::PatternScanUnsupported { backend }) => {
                    debug!("{} store refused pattern scan, enumerating", backend);
                }
                Err(e) => {
                    warn!(pattern = %pattern, "pattern invalidation failed, enumerating: {}", e);
                }
            }
        }

        let mut event = InvalidationEvent::new(reason, InvalidationStrategy::Enumerated);
        for limit in PAGINATION_LIMITS {
            for offset in PAGINATION_OFFSETS {
                self.delete_one(&key_for(limit, offset), &mut event).await;
            }
        }
        self.finish(event)
    }

    async fn delete_one(&self, key: &str, event: &mut InvalidationEvent) {
        event.targets.push(key.to_string());
        match self.store.delete(key).await {
            Ok(true) => event.removed += 1,
            Ok(false) => {}
            Err(e) => {
                event.failures += 1;
                warn!(key = %key, reason = %event.reason, "cache invalidation failed: {}", e);
            }
        }
        self.tags.forget_key(key);
    }

    fn finish(&self, event: InvalidationEvent) -> InvalidationEvent {
        info!(
            reason = %event.reason,
            strategy = ?event.strategy,
            removed = event.removed,
            failures = event.failures,
            "cache invalidated"
        );
        event
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::config::CacheConfig;
    use crate::cache::store::{MemoryStore, NullStore};
    use std::time::Duration;

    const TTL: Duration = Duration::from_secs(60);

    async fn seed(store: &MemoryStore, keys: &[CacheKey]) {
        for key in keys {
            store.set(key, "{}".to_string(), TTL).await.unwrap();
        }
    }

    fn invalidator(store: Arc<dyn KeyValueStore>) -> (Invalidator, Arc<TagRegistry>) {
        let tags = Arc::new(TagRegistry::new());
        (Invalidator::new(store, tags.clone()), tags)
    }

    #[tokio::test]
    async fn test_exact_invalidation() {
        let store = Arc::new(MemoryStore::new(&CacheConfig::memory()));
        seed(&store, &[keys::profile("u1"), keys::profile("u2")]).await;
        let (invalidator, _) = invalidator(store.clone());

        let event = invalidator.invalidate_user_profile("u1").await;

        assert_eq!(event.strategy, InvalidationStrategy::Exact);
        assert_eq!(event.removed, 1);
        assert!(!store.contains_key("profile:u1").await);
        assert!(store.contains_key("profile:u2").await);

        // Idempotent
        let again = invalidator.invalidate_user_profile("u1").await;
        assert_eq!(again.removed, 0);
        assert!(again.is_clean());
    }

    #[tokio::test]
    async fn test_scan_invalidation_removes_every_page() {
        let store = Arc::new(MemoryStore::new(&CacheConfig::memory()));
        seed(
            &store,
            &[
                keys::prediction_trades("m1", 10, 0),
                keys::prediction_trades("m1", 7, 3),
                keys::prediction_trades("m2", 10, 0),
            ],
        )
        .await;
        let (invalidator, _) = invalidator(store.clone());

        let event = invalidator.invalidate_market_trades("m1").await;

        assert_eq!(event.strategy, InvalidationStrategy::Scan);
        assert_eq!(event.removed, 2);
        assert_eq!(
            store.keys().await,
            vec!["market-trades:prediction-trades:m2:10:0".to_string()]
        );
    }

    #[tokio::test]
    async fn test_enumerated_fallback_covers_grid_only() {
        let store = Arc::new(MemoryStore::without_pattern_scan(&CacheConfig::memory()));
        let mut planted: Vec<CacheKey> = Vec::new();
        for limit in PAGINATION_LIMITS {
            for offset in PAGINATION_OFFSETS {
                planted.push(keys::prediction_trades("m1", limit, offset));
            }
        }
        let outside = keys::prediction_trades("m1", 25, 0);
        planted.push(outside.clone());
        seed(&store, &planted).await;
        let (invalidator, _) = invalidator(store.clone());

        let event = invalidator.invalidate_market_trades("m1").await;

        assert_eq!(event.strategy, InvalidationStrategy::Enumerated);
        assert_eq!(event.targets.len(), 20);
        assert_eq!(event.removed, 20);
        assert_eq!(store.keys().await, vec![outside]);
    }

    #[tokio::test]
    async fn test_tag_invalidation() {
        let store = Arc::new(MemoryStore::new(&CacheConfig::memory()));
        seed(&store, &[keys::predictions(None), keys::predictions(Some("u1"))]).await;
        let (invalidator, tags) = invalidator(store.clone());
        let tag = vec![policy::TAG_PREDICTIONS.to_string()];
        tags.register("markets:predictions", &tag, policy::PREDICTIONS_TTL);
        tags.register("markets:predictions:u1", &tag, policy::PREDICTIONS_TTL);

        let event = invalidator.invalidate_tag(policy::TAG_PREDICTIONS).await;

        assert_eq!(event.strategy, InvalidationStrategy::Tag);
        assert_eq!(event.removed, 2);
        assert!(store.is_empty().await);
        assert_eq!(tags.tag_count(), 0);
    }

    #[tokio::test]
    async fn test_null_store_enumerates_grid() {
        let (invalidator, _) = invalidator(Arc::new(NullStore));

        let event = invalidator.invalidate_following_feed("u1").await;

        // Null store refuses pattern scan, so the grid is enumerated
        assert_eq!(event.strategy, InvalidationStrategy::Enumerated);
        assert_eq!(event.removed, 0);
    }

    #[tokio::test]
    async fn test_trade_fan_out() {
        let store = Arc::new(MemoryStore::new(&CacheConfig::memory()));
        seed(
            &store,
            &[
                keys::balance("u1"),
                keys::positions("u1"),
                keys::prediction_trades("m1", 20, 0),
                keys::predictions(None),
                keys::perp_markets(),
                keys::stats(),
                keys::balance("u2"),
            ],
        )
        .await;
        let (invalidator, _) = invalidator(store.clone());

        let events = invalidator.on_trade_created("u1", "m1").await;

        assert!(events.iter().all(|e| e.is_clean()));
        assert_eq!(store.keys().await, vec!["balance:u2".to_string()]);
    }
}
