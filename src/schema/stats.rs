//! Platform-wide counters

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsData {
    pub total_users: u64,
    pub total_actors: u64,
    pub total_posts: u64,
    pub total_trades: u64,
    pub active_markets: u64,
    pub total_volume: f64,
}
