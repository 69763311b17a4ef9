//! Walks through a read-through miss, a hit, and an invalidation against a
//! toy system of record.
//!
//! Run with: RUST_LOG=debug cargo run --example read_through_demo
//! Set REDIS_URL to use a Redis server instead of the in-memory store.

use async_trait::async_trait;
use babylon_cache::schema::*;
use babylon_cache::{CacheConfig, CacheLayer, DataSource, StoreBackend};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

struct DemoSource;

#[async_trait]
impl DataSource for DemoSource {
    async fn fetch_user_profile(&self, user_id: &str) -> anyhow::Result<ProfileData> {
        Ok(ProfileData {
            user: Some(UserProfile::new(user_id).with_display_name("Demo User")),
        })
    }

    async fn fetch_user_positions(&self, _user_id: &str) -> anyhow::Result<PositionsData> {
        Ok(PositionsData::default())
    }

    async fn fetch_user_balance(&self, _user_id: &str) -> anyhow::Result<BalanceData> {
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        Ok(BalanceData {
            balance: 500.0,
            total_deposited: 500.0,
            total_withdrawn: 0.0,
            lifetime_pnl: 0.0,
        })
    }

    async fn fetch_following_feed(&self, _: &str, _: u32, _: u32) -> anyhow::Result<FeedData> {
        Ok(FeedData::default())
    }

    async fn fetch_user_chats(&self, _user_id: &str) -> anyhow::Result<ChatsData> {
        Ok(ChatsData::default())
    }

    async fn fetch_user_reputation(&self, _user_id: &str) -> anyhow::Result<ReputationData> {
        anyhow::bail!("reputation service offline")
    }

    async fn fetch_perp_markets(&self) -> anyhow::Result<PerpMarketsData> {
        Ok(PerpMarketsData::default())
    }

    async fn fetch_stats(&self) -> anyhow::Result<StatsData> {
        Ok(StatsData::default())
    }

    async fn fetch_predictions(&self, _: Option<&str>) -> anyhow::Result<PredictionsData> {
        Ok(PredictionsData::default())
    }

    async fn fetch_latest_posts(&self, _: u32, _: u32, _: Option<&str>) -> anyhow::Result<FeedData> {
        Ok(FeedData::default())
    }

    async fn fetch_registry(&self, _: &RegistryFilters) -> anyhow::Result<RegistryData> {
        Ok(RegistryData::default())
    }

    async fn fetch_markets_list(&self) -> anyhow::Result<MarketsListData> {
        Ok(MarketsListData::default())
    }

    async fn fetch_actor_info(&self, _actor_id: &str) -> anyhow::Result<ActorData> {
        Ok(ActorData::default())
    }

    async fn fetch_market_chats(&self) -> anyhow::Result<ChatsData> {
        Ok(ChatsData::default())
    }

    async fn fetch_market_trades(&self, _: &str, _: u32, _: u32) -> anyhow::Result<TradesData> {
        Ok(TradesData::default())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let mut config = CacheConfig::from_env();
    if config.backend == StoreBackend::Disabled {
        config = CacheConfig::memory();
    }

    let layer = CacheLayer::connect(config).await?;
    let queries = layer.queries(Arc::new(DemoSource));

    let miss = queries.get_cached_user_balance("u1").await;
    info!("first call: {}", serde_json::to_string(&miss)?);

    let hit = queries.get_cached_user_balance("u1").await;
    info!("second call: {}", serde_json::to_string(&hit)?);

    let degraded = queries.get_cached_user_reputation("u1").await;
    info!("failing source: {}", serde_json::to_string(&degraded)?);

    for event in layer.invalidator().on_trade_created("u1", "m1").await {
        info!("{} via {:?}: {} removed", event.reason, event.strategy, event.removed);
    }

    info!("{}", layer.monitor().summary());
    Ok(())
}
