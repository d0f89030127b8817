//! Period dataset cache.
//!
//! A bounded, strictly least-recently-used map from period identifier to
//! dataset. See [`MemoryCache`] for the eviction contract and
//! [`CacheCapacity`] for how the bound is chosen.

mod capacity;
mod memory;

pub use capacity::{
    CacheCapacity, DEFAULT_CAPACITY, LOW_MEMORY_CAPACITY, LOW_MEMORY_THRESHOLD_GB, MAX_CAPACITY,
    MIN_CAPACITY,
};
pub use memory::MemoryCache;

use std::fmt;

/// Counters describing cache activity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub inserts: u64,
    pub evictions: u64,
    pub entry_count: usize,
}

impl CacheStats {
    /// Fraction of lookups that hit, or 0.0 before any lookup.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} entries, {} hits, {} misses, {} evictions ({:.0}% hit rate)",
            self.entry_count,
            self.hits,
            self.misses,
            self.evictions,
            self.hit_rate() * 100.0
        )
    }
}
