//! Cache key taxonomy
//!
//! Keys are `<namespace>:<segment>[:<segment>...]`. Every key is a pure
//! function of the accessor arguments, so identical calls always land on
//! the same entry and per-user namespaces never collide with shared ones.

use crate::cache::pattern;
use crate::cache::types::CacheKey;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Namespace (leading key segments) for each cached entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Namespace {
    Profile,
    Positions,
    Balance,
    FollowingPosts,
    UserChats,
    Reputation,
    PerpMarkets,
    Stats,
    Predictions,
    LatestPosts,
    Registry,
    MarketsList,
    Actors,
    MarketChats,
    PredictionTrades,
}

impl Namespace {
    pub fn as_str(&self) -> &'static str {
        match self {
            Namespace::Profile => "profile",
            Namespace::Positions => "positions",
            Namespace::Balance => "balance",
            Namespace::FollowingPosts => "posts:following",
            Namespace::UserChats => "chats:user",
            Namespace::Reputation => "reputation",
            Namespace::PerpMarkets => "markets:perps",
            Namespace::Stats => "stats",
            Namespace::Predictions => "markets:predictions",
            Namespace::LatestPosts => "posts:latest",
            Namespace::Registry => "registry",
            Namespace::MarketsList => "markets:list",
            Namespace::Actors => "actors",
            Namespace::MarketChats => "chats:markets",
            Namespace::PredictionTrades => "market-trades:prediction-trades",
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cache key builder
pub struct CacheKeyBuilder {
    namespace: Namespace,
    segments: Vec<String>,
}

impl CacheKeyBuilder {
    /// Create a new cache key builder
    pub fn new(namespace: Namespace) -> Self {
        Self {
            namespace,
            segments: Vec::new(),
        }
    }

    /// Append a segment
    pub fn segment(mut self, segment: impl ToString) -> Self {
        self.segments.push(segment.to_string());
        self
    }

    /// Append a segment only when present
    pub fn optional_segment(self, segment: Option<impl ToString>) -> Self {
        match segment {
            Some(segment) => self.segment(segment),
            None => self,
        }
    }

    /// Build the cache key
    pub fn build(self) -> CacheKey {
        let mut key = self.namespace.as_str().to_string();
        for segment in &self.segments {
            key.push(':');
            key.push_str(segment);
        }
        key
    }

    /// Build a glob matching this key followed by any further segments.
    ///
    /// Segments are escaped so ids containing glob metacharacters only match
    /// themselves.
    pub fn build_prefix_pattern(self) -> String {
        let mut pattern = pattern::escape(self.namespace.as_str());
        for segment in &self.segments {
            pattern.push(':');
            pattern.push_str(&pattern::escape(segment));
        }
        pattern.push_str(":*");
        pattern
    }
}

pub fn profile(user_id: &str) -> CacheKey {
    CacheKeyBuilder::new(Namespace::Profile).segment(user_id).build()
}

pub fn positions(user_id: &str) -> CacheKey {
    CacheKeyBuilder::new(Namespace::Positions).segment(user_id).build()
}

pub fn balance(user_id: &str) -> CacheKey {
    CacheKeyBuilder::new(Namespace::Balance).segment(user_id).build()
}

pub fn following_posts(user_id: &str, limit: u32, offset: u32) -> CacheKey {
    CacheKeyBuilder::new(Namespace::FollowingPosts)
        .segment(user_id)
        .segment(limit)
        .segment(offset)
        .build()
}

pub fn user_chats(user_id: &str) -> CacheKey {
    CacheKeyBuilder::new(Namespace::UserChats).segment(user_id).build()
}

pub fn reputation(user_id: &str) -> CacheKey {
    CacheKeyBuilder::new(Namespace::Reputation).segment(user_id).build()
}

pub fn perp_markets() -> CacheKey {
    CacheKeyBuilder::new(Namespace::PerpMarkets).build()
}

pub fn stats() -> CacheKey {
    CacheKeyBuilder::new(Namespace::Stats).build()
}

/// Shared list, or the per-user overlay when `user_id` is given
pub fn predictions(user_id: Option<&str>) -> CacheKey {
    CacheKeyBuilder::new(Namespace::Predictions)
        .optional_segment(user_id)
        .build()
}

pub fn latest_posts(limit: u32, offset: u32, actor_id: Option<&str>) -> CacheKey {
    CacheKeyBuilder::new(Namespace::LatestPosts)
        .segment(limit)
        .segment(offset)
        .segment(actor_id.unwrap_or("all"))
        .build()
}

/// `serialized_filters` must already be in canonical form
pub fn registry(serialized_filters: &str) -> CacheKey {
    CacheKeyBuilder::new(Namespace::Registry)
        .segment(serialized_filters)
        .build()
}

pub fn markets_list() -> CacheKey {
    CacheKeyBuilder::new(Namespace::MarketsList).build()
}

pub fn actor(actor_id: &str) -> CacheKey {
    CacheKeyBuilder::new(Namespace::Actors).segment(actor_id).build()
}

pub fn market_chats() -> CacheKey {
    CacheKeyBuilder::new(Namespace::MarketChats).build()
}

pub fn prediction_trades(market_id: &str, limit: u32, offset: u32) -> CacheKey {
    CacheKeyBuilder::new(Namespace::PredictionTrades)
        .segment(market_id)
        .segment(limit)
        .segment(offset)
        .build()
}
