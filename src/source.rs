//! System-of-record seam
//!
//! The cache never queries the database itself. Whoever builds the cache
//! layer supplies a [`DataSource`], and each cached accessor calls exactly
//! one of its methods on a miss. Implementations may fan out into several
//! sub-queries and may declare extra tags through
//! [`crate::cache::context::add_tag`] while they run.

use crate::schema::{
    ActorData, BalanceData, ChatsData, FeedData, MarketsListData, PerpMarketsData, PositionsData,
    PredictionsData, ProfileData, RegistryData, RegistryFilters, ReputationData, StatsData,
    TradesData,
};
use async_trait::async_trait;

#[async_trait]
pub trait DataSource: Send + Sync {
    async fn fetch_user_profile(&self, user_id: &str) -> anyhow::Result<ProfileData>;

    async fn fetch_user_positions(&self, user_id: &str) -> anyhow::Result<PositionsData>;

    async fn fetch_user_balance(&self, user_id: &str) -> anyhow::Result<BalanceData>;

    async fn fetch_following_feed(
        &self,
        user_id: &str,
        limit: u32,
        offset: u32,
    ) -> anyhow::Result<FeedData>;

    async fn fetch_user_chats(&self, user_id: &str) -> anyhow::Result<ChatsData>;

    async fn fetch_user_reputation(&self, user_id: &str) -> anyhow::Result<ReputationData>;

    async fn fetch_perp_markets(&self) -> anyhow::Result<PerpMarketsData>;

    async fn fetch_stats(&self) -> anyhow::Result<StatsData>;

    /// Shared prediction list, with the user's positions overlaid when given
    async fn fetch_predictions(&self, user_id: Option<&str>) -> anyhow::Result<PredictionsData>;

    /// `actor_id` of `None` means posts from everyone
    async fn fetch_latest_posts(
        &self,
        limit: u32,
        offset: u32,
        actor_id: Option<&str>,
    ) -> anyhow::Result<FeedData>;

    async fn fetch_registry(&self, filters: &RegistryFilters) -> anyhow::Result<RegistryData>;

    async fn fetch_markets_list(&self) -> anyhow::Result<MarketsListData>;

    async fn fetch_actor_info(&self, actor_id: &str) -> anyhow::Result<ActorData>;

    async fn fetch_market_chats(&self) -> anyhow::Result<ChatsData>;

    async fn fetch_market_trades(
        &self,
        market_id: &str,
        limit: u32,
        offset: u32,
    ) -> anyhow::Result<TradesData>;
}
