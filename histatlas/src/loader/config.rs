//! Loader configuration.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use super::IdleSignal;
use crate::cache::CacheCapacity;

/// Delay before preloading when no idle signal is configured.
pub const DEFAULT_PRELOAD_DELAY: Duration = Duration::from_millis(100);

/// Configuration for [`PeriodLoader`](super::PeriodLoader).
#[derive(Clone)]
pub struct LoaderConfig {
    /// Maximum number of cached datasets.
    pub capacity: CacheCapacity,

    /// Whether neighbors are preloaded after each authoritative load.
    pub preload_enabled: bool,

    /// Wait before preloading when `idle_signal` is `None`.
    pub preload_delay: Duration,

    /// Host facility that reports when the application is idle.
    pub idle_signal: Option<Arc<dyn IdleSignal>>,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            capacity: CacheCapacity::default(),
            preload_enabled: true,
            preload_delay: DEFAULT_PRELOAD_DELAY,
            idle_signal: None,
        }
    }
}

impl LoaderConfig {
    pub fn with_capacity(mut self, capacity: CacheCapacity) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn with_preload(mut self, enabled: bool) -> Self {
        self.preload_enabled = enabled;
        self
    }

    pub fn with_preload_delay(mut self, delay: Duration) -> Self {
        self.preload_delay = delay;
        self
    }

    pub fn with_idle_signal(mut self, signal: Arc<dyn IdleSignal>) -> Self {
        self.idle_signal = Some(signal);
        self
    }
}

impl fmt::Debug for LoaderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoaderConfig")
            .field("capacity", &self.capacity)
            .field("preload_enabled", &self.preload_enabled)
            .field("preload_delay", &self.preload_delay)
            .field("idle_signal", &self.idle_signal.is_some())
            .finish()
    }
}
