//! Cache capacity selection.
//!
//! The number of cached periods is a memory/latency trade-off. Devices that
//! report little memory get the small tier; everything else, including
//! devices that report nothing, gets the large tier.

use std::num::NonZeroUsize;

/// Smallest capacity accepted from configuration.
pub const MIN_CAPACITY: usize = 10;

/// Largest capacity accepted from configuration.
pub const MAX_CAPACITY: usize = 35;

/// Capacity used on low-memory devices.
pub const LOW_MEMORY_CAPACITY: usize = 10;

/// Capacity used when memory is plentiful or unknown.
pub const DEFAULT_CAPACITY: usize = 25;

/// Devices reporting this many GB or less use [`LOW_MEMORY_CAPACITY`].
pub const LOW_MEMORY_THRESHOLD_GB: f64 = 2.0;

/// Number of periods the cache may hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheCapacity(NonZeroUsize);

impl CacheCapacity {
    /// Exact capacity. Zero is raised to one.
    pub fn new(entries: usize) -> Self {
        Self(NonZeroUsize::new(entries).unwrap_or(NonZeroUsize::MIN))
    }

    /// Capacity from user configuration, clamped into
    /// `[MIN_CAPACITY, MAX_CAPACITY]`.
    pub fn clamped(entries: usize) -> Self {
        Self::new(entries.clamp(MIN_CAPACITY, MAX_CAPACITY))
    }

    /// Pick a tier from an optional device memory hint in GB.
    pub fn from_device_memory(memory_gb: Option<f64>) -> Self {
        match memory_gb {
            Some(gb) if gb <= LOW_MEMORY_THRESHOLD_GB => Self::new(LOW_MEMORY_CAPACITY),
            _ => Self::new(DEFAULT_CAPACITY),
        }
    }

    pub fn get(self) -> usize {
        self.0.get()
    }

    pub fn as_non_zero(self) -> NonZeroUsize {
        self.0
    }
}

impl Default for CacheCapacity {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
