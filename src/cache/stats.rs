//! Cache Statistics Module
//!
//! Tracks per-build lookup accounting. A hit means a requested field was
//! served from the cache; a miss means a remote request had to be made,
//! hence the `api_requests` name for the miss counter.

use serde::Serialize;

// == Cache Stats ==
/// Lookup counters, reset once per build before any fetch activity.
#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    /// Field lookups served from the cache
    pub cache_hits: u64,
    /// Field lookups that fell through to the remote service
    pub api_requests: u64,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Record Hit ==
    /// Increments the hit counter.
    pub fn record_hit(&mut self) {
        self.cache_hits += 1;
    }

    // == Record Miss ==
    /// Increments the miss counter.
    pub fn record_miss(&mut self) {
        self.api_requests += 1;
    }

    // == Reset ==
    /// Zeroes both counters.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    // == Hit Rate ==
    /// Cache hit rate as a percentage with one decimal, `0.0` when no
    /// lookups have happened.
    pub fn hit_rate(&self) -> f64 {
        let total = self.cache_hits + self.api_requests;
        if total == 0 {
            return 0.0;
        }
        let rate = 100.0 * self.cache_hits as f64 / total as f64;
        (rate * 10.0).round() / 10.0
    }
}

// == Cache Report ==
/// Point-in-time snapshot of the cache, logged at the end of a build.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheReport {
    /// Number of entries currently held
    pub total_items: usize,
    /// Whether unpersisted changes exist
    pub is_dirty: bool,
    /// Lookups that fell through to the remote service
    pub api_requests: u64,
    /// Lookups served from the cache
    pub cache_hits: u64,
    /// Sum of hits and misses
    pub total_requests: u64,
    /// Percentage of lookups served from the cache, one decimal
    pub cache_hit_rate: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_new() {
        let stats = CacheStats::new();
        assert_eq!(stats.cache_hits, 0);
        assert_eq!(stats.api_requests, 0);
    }

    #[test]
    fn test_hit_rate_no_lookups() {
        let stats = CacheStats::new();
        assert_eq!(stats.hit_rate(), 0.0);
    }

    #[test]
    fn test_hit_rate_mixed() {
        let mut stats = CacheStats::new();
        stats.record_hit();
        stats.record_hit();
        stats.record_miss();
        // 2 of 3 = 66.666… rounds to one decimal
        assert_eq!(stats.hit_rate(), 66.7);
    }

    #[test]
    fn test_hit_rate_all_hits() {
        let mut stats = CacheStats::new();
        stats.record_hit();
        assert_eq!(stats.hit_rate(), 100.0);
    }

    #[test]
    fn test_reset_zeroes_counters() {
        let mut stats = CacheStats::new();
        stats.record_hit();
        stats.record_miss();
        stats.reset();
        assert_eq!(stats.cache_hits, 0);
        assert_eq!(stats.api_requests, 0);
    }

    #[test]
    fn test_report_serializes_camel_case() {
        let report = CacheReport {
            total_items: 2,
            is_dirty: true,
            api_requests: 1,
            cache_hits: 3,
            total_requests: 4,
            cache_hit_rate: 75.0,
        };
        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"totalItems\":2"));
        assert!(json.contains("\"isDirty\":true"));
        assert!(json.contains("\"cacheHitRate\":75.0"));
    }
}
