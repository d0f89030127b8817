//! Point-in-time copy of loader counters.

use std::fmt;

/// Loader counters at one moment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub requests: u64,
    pub cache_hits: u64,
    pub fetches: u64,
    pub fetch_failures: u64,
    pub superseded: u64,
    pub preloads_completed: u64,
    pub preloads_failed: u64,
    pub fallbacks: u64,
}

impl MetricsSnapshot {
    /// Fraction of requests answered from the cache (0.0 when idle).
    pub fn hit_rate(&self) -> f64 {
        if self.requests == 0 {
            0.0
        } else {
            self.cache_hits as f64 / self.requests as f64
        }
    }

    /// Counter increase since an earlier snapshot.
    pub fn since(&self, earlier: &MetricsSnapshot) -> MetricsSnapshot {
        MetricsSnapshot {
            requests: self.requests.saturating_sub(earlier.requests),
            cache_hits: self.cache_hits.saturating_sub(earlier.cache_hits),
            fetches: self.fetches.saturating_sub(earlier.fetches),
            fetch_failures: self.fetch_failures.saturating_sub(earlier.fetch_failures),
            superseded: self.superseded.saturating_sub(earlier.superseded),
            preloads_completed: self
                .preloads_completed
                .saturating_sub(earlier.preloads_completed),
            preloads_failed: self.preloads_failed.saturating_sub(earlier.preloads_failed),
            fallbacks: self.fallbacks.saturating_sub(earlier.fallbacks),
        }
    }
}

impl fmt::Display for MetricsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "requests={} hits={} ({:.0}%) fetches={} failures={} superseded={} preloads={}/{} fallbacks={}",
            self.requests,
            self.cache_hits,
            self.hit_rate() * 100.0,
            self.fetches,
            self.fetch_failures,
            self.superseded,
            self.preloads_completed,
            self.preloads_completed + self.preloads_failed,
            self.fallbacks,
        )
    }
}
