//! Typed read-through accessors, one per cached entity
//!
//! Each accessor builds its [`CachePolicy`], defers to the
//! [`ReadThroughCache`], and converts any failure into
//! `CachedResult { success: false, .. }` carrying the payload's default.
//! Nothing here returns an error to the caller.

use crate::cache::{policy::CachePolicy, read_through::ReadThroughCache};
use crate::schema::{
    ActorData, BalanceData, CachedResult, ChatsData, FeedData, MarketsListData, PerpMarketsData,
    PositionsData, PredictionsData, ProfileData, RegistryData, RegistryFilters, ReputationData,
    StatsData, TradesData,
};
use crate::source::DataSource;
use serde::{de::DeserializeOwned, Serialize};
use std::future::Future;
use std::sync::Arc;
use tracing::error;

pub struct CachedQueries<S: DataSource> {
    cache: ReadThroughCache,
    source: Arc<S>,
}

impl<S: DataSource> Clone for CachedQueries<S> {
    fn clone(&self) -> Self {
        Self {
            cache: self.cache.clone(),
            source: self.source.clone(),
        }
    }
}

impl<S: DataSource> CachedQueries<S> {
    pub fn new(cache: ReadThroughCache, source: Arc<S>) -> Self {
        Self { cache, source }
    }

    pub fn source(&self) -> &Arc<S> {
        &self.source
    }

    async fn resolve<T, F, Fut>(&self, policy: &CachePolicy, fetch: F) -> CachedResult<T>
    where
        T: Serialize + DeserializeOwned + Default + Send,
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = anyhow::Result<T>> + Send,
    {
        match self.cache.read_through(policy, fetch).await {
            Ok(data) => CachedResult::ok(data),
            Err(e) => {
                error!(key = %policy.key, "cached query failed, returning defaults: {}", e);
                CachedResult::failed()
            }
        }
    }

    pub async fn get_cached_user_profile(&self, user_id: &str) -> CachedResult<ProfileData> {
        let policy = CachePolicy::user_profile(user_id);
        self.resolve(&policy, || self.source.fetch_user_profile(user_id))
            .await
    }

    pub async fn get_cached_user_positions(&self, user_id: &str) -> CachedResult<PositionsData> {
        let policy = CachePolicy::user_positions(user_id);
        self.resolve(&policy, || self.source.fetch_user_positions(user_id))
            .await
    }

    pub async fn get_cached_user_balance(&self, user_id: &str) -> CachedResult<BalanceData> {
        let policy = CachePolicy::user_balance(user_id);
        self.resolve(&policy, || self.source.fetch_user_balance(user_id))
            .await
    }

    pub async fn get_cached_following_feed(
        &self,
        user_id: &str,
        limit: u32,
        offset: u32,
    ) -> CachedResult<FeedData> {
        let policy = CachePolicy::following_feed(user_id, limit, offset);
        self.resolve(&policy, || {
            self.source.fetch_following_feed(user_id, limit, offset)
        })
        .await
    }

    pub async fn get_cached_user_chats(&self, user_id: &str) -> CachedResult<ChatsData> {
        let policy = CachePolicy::user_chats(user_id);
        self.resolve(&policy, || self.source.fetch_user_chats(user_id))
            .await
    }

    pub async fn get_cached_user_reputation(&self, user_id: &str) -> CachedResult<ReputationData> {
        let policy = CachePolicy::user_reputation(user_id);
        self.resolve(&policy, || self.source.fetch_user_reputation(user_id))
            .await
    }

    pub async fn get_cached_perp_markets(&self) -> CachedResult<PerpMarketsData> {
        let policy = CachePolicy::perp_markets();
        self.resolve(&policy, || self.source.fetch_perp_markets())
            .await
    }

    pub async fn get_cached_stats(&self) -> CachedResult<StatsData> {
        let policy = CachePolicy::stats();
        self.resolve(&policy, || self.source.fetch_stats()).await
    }

    /// Shared list, or the per-user overlay when `user_id` is given
    pub async fn get_cached_predictions(&self, user_id: Option<&str>) -> CachedResult<PredictionsData> {
        let policy = CachePolicy::predictions(user_id);
        self.resolve(&policy, || self.source.fetch_predictions(user_id))
            .await
    }

    pub async fn get_cached_latest_posts(
        &self,
        limit: u32,
        offset: u32,
        actor_id: Option<&str>,
    ) -> CachedResult<FeedData> {
        let policy = CachePolicy::latest_posts(limit, offset, actor_id);
        self.resolve(&policy, || {
            self.source.fetch_latest_posts(limit, offset, actor_id)
        })
        .await
    }

    pub async fn get_cached_registry(&self, filters: &RegistryFilters) -> CachedResult<RegistryData> {
        let policy = match CachePolicy::registry(filters) {
            Ok(policy) => policy,
            Err(e) => {
                error!("cannot build registry cache key: {}", e);
                return CachedResult::failed();
            }
        };
        self.resolve(&policy, || self.source.fetch_registry(filters))
            .await
    }

    pub async fn get_cached_markets_list(&self) -> CachedResult<MarketsListData> {
        let policy = CachePolicy::markets_list();
        self.resolve(&policy, || self.source.fetch_markets_list())
            .await
    }

    pub async fn get_cached_actor_info(&self, actor_id: &str) -> CachedResult<ActorData> {
        let policy = CachePolicy::actor_info(actor_id);
        self.resolve(&policy, || self.source.fetch_actor_info(actor_id))
            .await
    }

    pub async fn get_cached_market_chats(&self) -> CachedResult<ChatsData> {
        let policy = CachePolicy::market_chats();
        self.resolve(&policy, || self.source.fetch_market_chats())
            .await
    }

    pub async fn get_cached_market_trades(
        &self,
        market_id: &str,
        limit: u32,
        offset: u32,
    ) -> CachedResult<TradesData> {
        let policy = CachePolicy::market_trades(market_id, limit, offset);
        self.resolve(&policy, || {
            self.source.fetch_market_trades(market_id, limit, offset)
        })
        .await
    }
}
