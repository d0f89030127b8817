//! Atomic loader counters.

use std::sync::atomic::{AtomicU64, Ordering};

use super::MetricsSnapshot;

/// Counters updated by the loader as it works.
///
/// All updates use relaxed ordering; counters are independent and only read
/// for reporting.
#[derive(Debug, Default)]
pub struct LoaderMetrics {
    requests: AtomicU64,
    cache_hits: AtomicU64,
    fetches: AtomicU64,
    fetch_failures: AtomicU64,
    superseded: AtomicU64,
    preloads_completed: AtomicU64,
    preloads_failed: AtomicU64,
    fallbacks: AtomicU64,
}

impl LoaderMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// A `load_period` call was made.
    pub fn request(&self) {
        self.requests.fetch_add(1, Ordering::Relaxed);
    }

    /// A period was served from the cache.
    pub fn cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    /// A fetch was issued, for either the primary path or a preload.
    pub fn fetch_started(&self) {
        self.fetches.fetch_add(1, Ordering::Relaxed);
    }

    pub fn fetch_failed(&self) {
        self.fetch_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// A loaded dataset was discarded because a newer request arrived.
    pub fn superseded(&self) {
        self.superseded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn preload_completed(&self) {
        self.preloads_completed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn preload_failed(&self) {
        self.preloads_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// A request had to be retried on the direct channel.
    pub fn fallback(&self) {
        self.fallbacks.fetch_add(1, Ordering::Relaxed);
    }

    /// Copy the current counter values.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            requests: self.requests.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            fetches: self.fetches.load(Ordering::Relaxed),
            fetch_failures: self.fetch_failures.load(Ordering::Relaxed),
            superseded: self.superseded.load(Ordering::Relaxed),
            preloads_completed: self.preloads_completed.load(Ordering::Relaxed),
            preloads_failed: self.preloads_failed.load(Ordering::Relaxed),
            fallbacks: self.fallbacks.load(Ordering::Relaxed),
        }
    }
}
