//! Balances, positions, markets and trades

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PositionSide {
    #[default]
    Long,
    Short,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerpPosition {
    pub id: String,
    pub ticker: String,
    pub side: PositionSide,
    pub size: f64,
    pub leverage: f64,
    pub entry_price: f64,
    pub current_price: f64,
    pub unrealized_pnl: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionPosition {
    pub id: String,
    pub market_id: String,
    pub question: String,
    /// `true` for YES shares
    pub side: bool,
    pub shares: f64,
    pub avg_price: f64,
    pub current_value: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionsData {
    pub perpetuals: Vec<PerpPosition>,
    pub predictions: Vec<PredictionPosition>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceData {
    pub balance: f64,
    pub total_deposited: f64,
    pub total_withdrawn: f64,
    #[serde(rename = "lifetimePnL")]
    pub lifetime_pnl: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerpMarket {
    pub ticker: String,
    pub name: String,
    pub current_price: f64,
    pub change_24h: f64,
    pub change_percent_24h: f64,
    pub high_24h: f64,
    pub low_24h: f64,
    pub volume_24h: f64,
    pub open_interest: f64,
    pub funding_rate: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerpMarketsData {
    pub markets: Vec<PerpMarket>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionMarket {
    pub id: String,
    pub question: String,
    pub end_date: Option<DateTime<Utc>>,
    pub resolved: bool,
    pub yes_shares: f64,
    pub no_shares: f64,
    /// Present only in the per-user overlay
    pub user_position: Option<PredictionPosition>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionsData {
    pub questions: Vec<PredictionMarket>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketSummary {
    pub id: String,
    pub name: String,
    pub kind: String,
    pub volume: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketsListData {
    pub markets: Vec<MarketSummary>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trade {
    pub id: String,
    pub user_id: String,
    pub market_id: String,
    pub side: bool,
    pub shares: f64,
    pub price: f64,
    pub created_at: Option<DateTime<Utc>>,
}

/// One page of trades for a prediction market
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradesData {
    pub trades: Vec<Trade>,
    pub total: u64,
}
