//! Payload types for each cached entity
//!
//! Every payload implements `Default`; the default value is the degraded
//! shape returned when the system of record fails (empty lists, zero
//! counters, no user). Field names serialize in camelCase.

pub mod profile;
pub mod registry;
pub mod result;
pub mod social;
pub mod stats;
pub mod trading;

pub use profile::{ActorData, ActorInfo, ProfileData, ProfileStats, ReputationData, UserProfile};
pub use registry::{RegistryData, RegistryEntry, RegistryFilters};
pub use result::CachedResult;
pub use social::{ChatSummary, ChatsData, FeedData, Post};
pub use stats::StatsData;
pub use trading::{
    BalanceData, MarketSummary, MarketsListData, PerpMarket, PerpMarketsData, PerpPosition,
    PositionSide, PositionsData, PredictionMarket, PredictionPosition, PredictionsData, Trade,
    TradesData,
};
