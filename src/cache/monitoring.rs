//! Hit/miss accounting per cache key
//!
//! One [`CacheMonitor`] is built with the cache layer and shared by `Arc`;
//! there is no process-global state, so tests can construct and reset their
//! own. Counters live in a sharded `DashMap`, and each update happens under
//! the shard lock for its key so concurrent accessors never lose increments.

use crate::cache::types::{CacheKey, KeyStatsSummary, MonitorSummary, MonitoringStat};
use dashmap::DashMap;
use std::collections::BTreeMap;
use tracing::debug;

#[derive(Debug, Default)]
pub struct CacheMonitor {
    stats: DashMap<CacheKey, MonitoringStat>,
}

impl CacheMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a cache hit and its response time
    pub fn record_hit(&self, key: &str, response_time_ms: f64) {
        let mut stat = self.stats.entry(key.to_string()).or_default();
        stat.hits += 1;
        stat.total_response_time_ms += response_time_ms;
        debug!(key = %key, response_time_ms, "cache hit");
    }

    /// Record a cache miss and its response time (including the fetch)
    pub fn record_miss(&self, key: &str, response_time_ms: f64) {
        let mut stat = self.stats.entry(key.to_string()).or_default();
        stat.misses += 1;
        stat.total_response_time_ms += response_time_ms;
        debug!(key = %key, response_time_ms, "cache miss");
    }

    /// Raw counters for a key, if it was ever recorded
    pub fn get_stats(&self, key: &str) -> Option<MonitoringStat> {
        self.stats.get(key).map(|stat| *stat)
    }

    /// Hit rate for a key; zero when the key was never recorded
    pub fn hit_rate(&self, key: &str) -> f64 {
        self.get_stats(key).map(|s| s.hit_rate()).unwrap_or(0.0)
    }

    /// Derived stats for every recorded key, ordered by key
    pub fn get_all_stats(&self) -> BTreeMap<CacheKey, KeyStatsSummary> {
        self.stats
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().summarize()))
            .collect()
    }

    /// Totals across all keys
    pub fn summary(&self) -> MonitorSummary {
        let mut total = MonitoringStat::default();
        let mut keys = 0;
        for entry in self.stats.iter() {
            total.hits += entry.hits;
            total.misses += entry.misses;
            total.total_response_time_ms += entry.total_response_time_ms;
            keys += 1;
        }

        MonitorSummary {
            keys,
            total_hits: total.hits,
            total_misses: total.misses,
            hit_rate: total.hit_rate(),
            avg_response_time_ms: total.avg_response_time_ms(),
        }
    }

    /// Clear all counters
    pub fn reset(&self) {
        self.stats.clear();
    }
}
