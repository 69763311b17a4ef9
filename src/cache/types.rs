//! Core type definitions for the cache system

use serde::{Deserialize, Serialize};
use std::fmt;

/// Cache key type - `<namespace>:<entityId>[:<extraParams>...]`
pub type CacheKey = String;

/// Cache value type - JSON-serialized payload
pub type CacheValue = String;

/// Store-level bookkeeping for the in-memory backend
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StoreStats {
    /// Number of entries currently in the store
    pub entries: usize,

    /// Total size of stored data in bytes
    pub size_bytes: usize,

    /// Number of evictions due to size limits
    pub evictions_size: u64,

    /// Number of evictions due to TTL expiration
    pub evictions_ttl: u64,

    /// Number of explicit deletions
    pub invalidations: u64,
}

impl StoreStats {
    /// Calculate total evictions
    pub fn total_evictions(&self) -> u64 {
        self.evictions_size + self.evictions_ttl
    }
}

impl fmt::Display for StoreStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "StoreStats {{ entries: {}, size: {} bytes, evictions: {}, invalidations: {} }}",
            self.entries,
            self.size_bytes,
            self.total_evictions(),
            self.invalidations
        )
    }
}

/// Raw hit/miss counters for a single cache key
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct MonitoringStat {
    pub hits: u64,
    pub misses: u64,
    /// Accumulated over hits and misses
    pub total_response_time_ms: f64,
}

impl MonitoringStat {
    /// Number of recorded accesses
    pub fn accesses(&self) -> u64 {
        self.hits + self.misses
    }

    /// Hit rate as a fraction in `[0, 1]`; zero when nothing was recorded
    pub fn hit_rate(&self) -> f64 {
        let total = self.accesses();
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    /// Mean response time across all accesses; zero when nothing was recorded
    pub fn avg_response_time_ms(&self) -> f64 {
        let total = self.accesses();
        if total == 0 {
            0.0
        } else {
            self.total_response_time_ms / total as f64
        }
    }

    pub fn summarize(&self) -> KeyStatsSummary {
        KeyStatsSummary {
            hits: self.hits,
            misses: self.misses,
            hit_rate: self.hit_rate(),
            avg_response_time_ms: self.avg_response_time_ms(),
        }
    }
}

/// Derived per-key view returned by `CacheMonitor::get_all_stats`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct KeyStatsSummary {
    pub hits: u64,
    pub misses: u64,
    pub hit_rate: f64,
    pub avg_response_time_ms: f64,
}

/// Aggregate over every monitored key
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct MonitorSummary {
    pub keys: usize,
    pub total_hits: u64,
    pub total_misses: u64,
    pub hit_rate: f64,
    pub avg_response_time_ms: f64,
}

impl fmt::Display for MonitorSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CacheMonitor {{ keys: {}, hits: {}, misses: {}, hit_rate: {:.2}%, avg: {:.2}ms }}",
            self.keys,
            self.total_hits,
            self.total_misses,
            self.hit_rate * 100.0,
            self.avg_response_time_ms
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_monitoring_stat_hit_rate() {
        let stat = MonitoringStat {
            hits: 3,
            misses: 1,
            total_response_time_ms: 40.0,
        };

        assert_eq!(stat.hit_rate(), 0.75);
        assert_eq!(stat.avg_response_time_ms(), 10.0);
    }

    #[test]
    fn test_monitoring_stat_zero_requests() {
        let stat = MonitoringStat::default();
        assert_eq!(stat.hit_rate(), 0.0);
        assert_eq!(stat.avg_response_time_ms(), 0.0);
    }

    #[test]
    fn test_store_stats_display() {
        let stats = StoreStats {
            entries: 75,
            size_bytes: 1024,
            evictions_size: 10,
            evictions_ttl: 5,
            invalidations: 3,
        };

        let display = format!("{}", stats);
        assert!(display.contains("entries: 75"));
        assert!(display.contains("evictions: 15"));
    }

    #[test]
    fn test_summary_serializes_camel_case() {
        let summary = MonitoringStat {
            hits: 1,
            misses: 1,
            total_response_time_ms: 2.0,
        }
        .summarize();

        let json = serde_json::to_value(summary).unwrap();
        assert_eq!(json["hitRate"], 0.5);
        assert_eq!(json["avgResponseTimeMs"], 1.0);
    }
}
