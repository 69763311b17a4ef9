//! Per-entity cache policies: key, lifetime and invalidation tags.
//!
//! Lifetimes reflect how often each entity changes. Balances move on every
//! trade and live 15s; profiles, actors and market lists rarely change and
//! live five minutes.

use crate::cache::keys;
use crate::cache::types::CacheKey;
use crate::error::Result;
use crate::schema::RegistryFilters;
use std::time::Duration;

pub const PROFILE_TTL: Duration = Duration::from_secs(300);
pub const POSITIONS_TTL: Duration = Duration::from_secs(30);
pub const BALANCE_TTL: Duration = Duration::from_secs(15);
pub const FOLLOWING_FEED_TTL: Duration = Duration::from_secs(30);
pub const USER_CHATS_TTL: Duration = Duration::from_secs(30);
pub const REPUTATION_TTL: Duration = Duration::from_secs(120);
pub const PERP_MARKETS_TTL: Duration = Duration::from_secs(300);
pub const STATS_TTL: Duration = Duration::from_secs(60);
pub const PREDICTIONS_TTL: Duration = Duration::from_secs(120);
pub const LATEST_POSTS_TTL: Duration = Duration::from_secs(30);
pub const REGISTRY_TTL: Duration = Duration::from_secs(180);
pub const MARKETS_LIST_TTL: Duration = Duration::from_secs(300);
pub const ACTOR_TTL: Duration = Duration::from_secs(300);
pub const MARKET_CHATS_TTL: Duration = Duration::from_secs(60);
pub const MARKET_TRADES_TTL: Duration = Duration::from_secs(30);

pub const TAG_PROFILE: &str = "profile";
pub const TAG_POSITIONS: &str = "positions";
pub const TAG_BALANCE: &str = "balance";
pub const TAG_FOLLOWING_FEED: &str = "posts:following";
pub const TAG_USER_CHATS: &str = "chats:user";
pub const TAG_REPUTATION: &str = "reputation";
pub const TAG_PERP_MARKETS: &str = "markets:perps";
pub const TAG_STATS: &str = "stats";
pub const TAG_PREDICTIONS: &str = "markets:predictions";
pub const TAG_LATEST_POSTS: &str = "posts:latest";
pub const TAG_REGISTRY: &str = "registry";
pub const TAG_MARKETS_LIST: &str = "markets:list";
pub const TAG_ACTORS: &str = "actors";
pub const TAG_MARKET_CHATS: &str = "chats:markets";
pub const TAG_MARKET_TRADES: &str = "market-trades";

/// `<tag>:<id>`, the per-entity tag paired with a collection tag
pub fn scoped_tag(tag: &str, id: &str) -> String {
    format!("{}:{}", tag, id)
}

/// Per-actor tag. Singular, unlike the `actors` key namespace.
pub fn actor_tag(actor_id: &str) -> String {
    scoped_tag("actor", actor_id)
}

/// Where an entity is cached, for how long, and under which tags
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachePolicy {
    pub key: CacheKey,
    pub ttl: Duration,
    pub tags: Vec<String>,
}

impl CachePolicy {
    pub fn new(key: CacheKey, ttl: Duration, tags: Vec<String>) -> Self {
        Self { key, ttl, tags }
    }

    /// Collection tag plus the per-entity tag
    fn scoped(key: CacheKey, ttl: Duration, tag: &str, id: &str) -> Self {
        Self::new(key, ttl, vec![tag.to_string(), scoped_tag(tag, id)])
    }

    fn shared(key: CacheKey, ttl: Duration, tag: &str) -> Self {
        Self::new(key, ttl, vec![tag.to_string()])
    }

    pub fn user_profile(user_id: &str) -> Self {
        Self::scoped(keys::profile(user_id), PROFILE_TTL, TAG_PROFILE, user_id)
    }

    pub fn user_positions(user_id: &str) -> Self {
        Self::scoped(keys::positions(user_id), POSITIONS_TTL, TAG_POSITIONS, user_id)
    }

    pub fn user_balance(user_id: &str) -> Self {
        Self::scoped(keys::balance(user_id), BALANCE_TTL, TAG_BALANCE, user_id)
    }

    pub fn following_feed(user_id: &str, limit: u32, offset: u32) -> Self {
        Self::scoped(
            keys::following_posts(user_id, limit, offset),
            FOLLOWING_FEED_TTL,
            TAG_FOLLOWING_FEED,
            user_id,
        )
    }

    pub fn user_chats(user_id: &str) -> Self {
        Self::scoped(keys::user_chats(user_id), USER_CHATS_TTL, TAG_USER_CHATS, user_id)
    }

    pub fn user_reputation(user_id: &str) -> Self {
        Self::scoped(keys::reputation(user_id), REPUTATION_TTL, TAG_REPUTATION, user_id)
    }

    pub fn perp_markets() -> Self {
        Self::shared(keys::perp_markets(), PERP_MARKETS_TTL, TAG_PERP_MARKETS)
    }

    pub fn stats() -> Self {
        Self::shared(keys::stats(), STATS_TTL, TAG_STATS)
    }

    /// Both the shared list and the per-user overlay carry only the
    /// collection tag, so one tag invalidation clears every variant.
    pub fn predictions(user_id: Option<&str>) -> Self {
        Self::shared(keys::predictions(user_id), PREDICTIONS_TTL, TAG_PREDICTIONS)
    }

    pub fn latest_posts(limit: u32, offset: u32, actor_id: Option<&str>) -> Self {
        Self::shared(
            keys::latest_posts(limit, offset, actor_id),
            LATEST_POSTS_TTL,
            TAG_LATEST_POSTS,
        )
    }

    pub fn registry(filters: &RegistryFilters) -> Result<Self> {
        let segment = filters.cache_segment()?;
        Ok(Self::shared(keys::registry(&segment), REGISTRY_TTL, TAG_REGISTRY))
    }

    pub fn markets_list() -> Self {
        Self::shared(keys::markets_list(), MARKETS_LIST_TTL, TAG_MARKETS_LIST)
    }

    pub fn actor_info(actor_id: &str) -> Self {
        Self::new(
            keys::actor(actor_id),
            ACTOR_TTL,
            vec![TAG_ACTORS.to_string(), actor_tag(actor_id)],
        )
    }

    pub fn market_chats() -> Self {
        Self::shared(keys::market_chats(), MARKET_CHATS_TTL, TAG_MARKET_CHATS)
    }

    pub fn market_trades(market_id: &str, limit: u32, offset: u32) -> Self {
        Self::scoped(
            keys::prediction_trades(market_id, limit, offset),
            MARKET_TRADES_TTL,
            TAG_MARKET_TRADES,
            market_id,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(list: &[&str]) -> Vec<String> {
        list.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn test_per_user_policies() {
        let cases = [
            (CachePolicy::user_profile("u1"), "profile:u1", 300, tags(&["profile", "profile:u1"])),
            (CachePolicy::user_positions("u1"), "positions:u1", 30, tags(&["positions", "positions:u1"])),
            (CachePolicy::user_balance("u1"), "balance:u1", 15, tags(&["balance", "balance:u1"])),
            (
                CachePolicy::following_feed("u1", 20, 0),
                "posts:following:u1:20:0",
                30,
                tags(&["posts:following", "posts:following:u1"]),
            ),
            (CachePolicy::user_chats("u1"), "chats:user:u1", 30, tags(&["chats:user", "chats:user:u1"])),
            (
                CachePolicy::user_reputation("u1"),
                "reputation:u1",
                120,
                tags(&["reputation", "reputation:u1"]),
            ),
        ];

        for (policy, key, ttl, expected_tags) in cases {
            assert_eq!(policy.key, key);
            assert_eq!(policy.ttl, Duration::from_secs(ttl), "ttl for {}", key);
            assert_eq!(policy.tags, expected_tags, "tags for {}", key);
        }
    }

    #[test]
    fn test_shared_policies() {
        let cases = [
            (CachePolicy::perp_markets(), "markets:perps", 300, tags(&["markets:perps"])),
            (CachePolicy::stats(), "stats", 60, tags(&["stats"])),
            (CachePolicy::predictions(None), "markets:predictions", 120, tags(&["markets:predictions"])),
            (
                CachePolicy::predictions(Some("u1")),
                "markets:predictions:u1",
                120,
                tags(&["markets:predictions"]),
            ),
            (CachePolicy::latest_posts(10, 0, None), "posts:latest:10:0:all", 30, tags(&["posts:latest"])),
            (CachePolicy::markets_list(), "markets:list", 300, tags(&["markets:list"])),
            (CachePolicy::actor_info("a1"), "actors:a1", 300, tags(&["actors", "actor:a1"])),
            (CachePolicy::market_chats(), "chats:markets", 60, tags(&["chats:markets"])),
            (
                CachePolicy::market_trades("m1", 10, 0),
                "market-trades:prediction-trades:m1:10:0",
                30,
                tags(&["market-trades", "market-trades:m1"]),
            ),
        ];

        for (policy, key, ttl, expected_tags) in cases {
            assert_eq!(policy.key, key);
            assert_eq!(policy.ttl, Duration::from_secs(ttl), "ttl for {}", key);
            assert_eq!(policy.tags, expected_tags, "tags for {}", key);
        }
    }

    #[test]
    fn test_registry_policy_embeds_filters() {
        let filters = RegistryFilters {
            entity_type: Some("agent".to_string()),
            limit: 50,
            ..Default::default()
        };
        let policy = CachePolicy::registry(&filters).unwrap();

        assert!(policy.key.starts_with("registry:{"));
        assert!(policy.key.contains("\"entityType\":\"agent\""));
        assert_eq!(policy.ttl, Duration::from_secs(180));
        assert_eq!(policy.tags, tags(&["registry"]));
        assert_eq!(policy, CachePolicy::registry(&filters.clone()).unwrap());
    }
}
