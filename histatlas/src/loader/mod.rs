//! Period loading with caching, request coalescing and neighbor preloading.
//!
//! [`PeriodLoader`] is what the time slider talks to. It serves datasets from
//! an LRU cache when it can and otherwise fetches, transforms and caches them.
//!
//! # Request coalescing
//!
//! Only one primary load runs at a time. Requests that arrive while it runs
//! overwrite a single pending slot and return `Ok(None)` immediately. When
//! the running load finishes, it checks the slot: if a newer ordinal is
//! waiting, its own result is stale (it stays cached but is not returned)
//! and it moves on to the newer ordinal. The caller that started the loop
//! receives the result for whichever ordinal was requested last.
//!
//! ```text
//! load(1) ──► fetch 1 ──────────► slot=3? ──► fetch 3 ──► slot empty ──► Some(3)
//! load(2) ──► slot=2, None         ▲
//! load(3) ──► slot=3, None ────────┘
//! ```
//!
//! # Preloading
//!
//! After every authoritative result the neighbors of that period are fetched
//! in the background once the host is idle (see [`IdleSignal`]), so stepping
//! the slider by one usually hits the cache.

mod config;
mod error;
mod preload;

pub use config::{LoaderConfig, DEFAULT_PRELOAD_DELAY};
pub use error::LoadError;
pub use preload::{IdleSignal, PreloadScheduler};

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info};

use crate::cache::{CacheStats, MemoryCache};
use crate::fetch::{ChannelMode, FetchChannel};
use crate::geo::GeographicDataset;
use crate::period::{Direction, Period, PeriodTable};
use crate::telemetry::{LoaderMetrics, MetricsSnapshot};
use crate::transform::{GeometryTransform, StandardTransform};

/// Callback invoked with every authoritative result.
pub type ReadyCallback = Arc<dyn Fn(&Period, &Arc<GeographicDataset>) + Send + Sync>;

/// Coalescing state for primary loads.
#[derive(Debug, Default)]
struct RequestState {
    /// Most recently requested ordinal not yet picked up.
    pending: Option<usize>,
    in_progress: bool,
    destroyed: bool,
}

/// Loads period datasets for the time slider.
///
/// Cheap to clone; clones share the cache, channel and state.
#[derive(Clone)]
pub struct PeriodLoader {
    inner: Arc<LoaderInner>,
}

struct LoaderInner {
    periods: PeriodTable,
    cache: Mutex<MemoryCache<String, Arc<GeographicDataset>>>,
    state: Mutex<RequestState>,
    channel: Arc<dyn FetchChannel>,
    transform: Arc<dyn GeometryTransform>,
    preloader: PreloadScheduler,
    preload_enabled: bool,
    metrics: LoaderMetrics,
    on_ready: Mutex<Option<ReadyCallback>>,
}

impl PeriodLoader {
    /// Create a loader.
    ///
    /// # Arguments
    ///
    /// * `periods` - The fixed period table
    /// * `channel` - Where datasets are fetched from
    /// * `transform` - Applied to every fetched dataset before caching
    /// * `config` - Cache capacity and preload behavior
    pub fn new(
        periods: PeriodTable,
        channel: Arc<dyn FetchChannel>,
        transform: Arc<dyn GeometryTransform>,
        config: LoaderConfig,
    ) -> Self {
        info!(
            periods = periods.len(),
            capacity = config.capacity.get(),
            mode = %channel.mode(),
            preload = config.preload_enabled,
            "Period loader created"
        );

        let inner = LoaderInner {
            periods,
            cache: Mutex::new(MemoryCache::new(config.capacity.as_non_zero())),
            state: Mutex::new(RequestState::default()),
            channel,
            transform,
            preloader: PreloadScheduler::new(config.preload_delay, config.idle_signal),
            preload_enabled: config.preload_enabled,
            metrics: LoaderMetrics::new(),
            on_ready: Mutex::new(None),
        };
        Self {
            inner: Arc::new(inner),
        }
    }

    /// Create a loader with the standard transform and default settings.
    pub fn with_defaults(periods: PeriodTable, channel: Arc<dyn FetchChannel>) -> Self {
        Self::new(
            periods,
            channel,
            Arc::new(StandardTransform::default()),
            LoaderConfig::default(),
        )
    }

    /// Request the dataset for `ordinal`.
    ///
    /// Returns `Ok(Some(dataset))` to the call that ends up producing the
    /// authoritative result, which is the dataset for the most recently
    /// requested ordinal. Calls made while another load is running return
    /// `Ok(None)` straight away.
    ///
    /// # Errors
    ///
    /// - [`LoadError::UnknownPeriod`] if the ordinal is outside the table
    /// - [`LoadError::Fetch`] if the authoritative fetch failed
    /// - [`LoadError::Destroyed`] after [`destroy`](Self::destroy)
    pub async fn load_period(
        &self,
        ordinal: usize,
    ) -> Result<Option<Arc<GeographicDataset>>, LoadError> {
        let inner = &self.inner;
        inner.metrics.request();

        {
            let mut state = inner.state.lock();
            if state.destroyed {
                return Err(LoadError::Destroyed);
            }
            // Checked here so a bad ordinal never reaches the pending slot
            // and fails someone else's load.
            if inner.periods.get(ordinal).is_none() {
                return Err(LoadError::UnknownPeriod {
                    ordinal,
                    count: inner.periods.len(),
                });
            }
            state.pending = Some(ordinal);
            if state.in_progress {
                debug!(ordinal, "Load in progress, request coalesced");
                return Ok(None);
            }
            state.in_progress = true;
        }
        let mut in_progress = InProgressGuard {
            state: &inner.state,
            armed: true,
        };

        loop {
            let next = inner.state.lock().pending.take();
            let Some(target) = next else {
                return Ok(None);
            };

            let period = inner
                .periods
                .get(target)
                .cloned()
                .ok_or(LoadError::UnknownPeriod {
                    ordinal: target,
                    count: inner.periods.len(),
                })?;

            let result = inner.obtain(&period).await;

            {
                let mut state = inner.state.lock();
                if state.destroyed {
                    return Err(LoadError::Destroyed);
                }
                // A stale failure must not strand the newer request.
                if let Some(newer) = state.pending {
                    inner.metrics.superseded();
                    debug!(
                        identifier = %period.identifier,
                        newer,
                        failed = result.is_err(),
                        "Result superseded by newer request"
                    );
                    continue;
                }
                // Released under the lock that saw the empty slot: any later
                // request starts its own load instead of waiting on this one.
                state.in_progress = false;
                in_progress.disarm();
            }

            let dataset = result?;
            self.schedule_preload(target, None);
            inner.notify_ready(&period, &dataset);
            return Ok(Some(dataset));
        }
    }

    /// Preload around `ordinal`, including two steps ahead in `direction`.
    ///
    /// Replaces any preload that has not started yet.
    pub fn preload_direction(&self, ordinal: usize, direction: Direction) {
        self.schedule_preload(ordinal, Some(direction));
    }

    /// Register the callback for authoritative results, replacing any
    /// previous one.
    pub fn on_period_ready<F>(&self, callback: F)
    where
        F: Fn(&Period, &Arc<GeographicDataset>) + Send + Sync + 'static,
    {
        *self.inner.on_ready.lock() = Some(Arc::new(callback));
    }

    /// Tear the loader down.
    ///
    /// Cancels a pending preload, stops the fetch channel and empties the
    /// cache. Loads still running finish without touching the cache; later
    /// calls fail with [`LoadError::Destroyed`]. Calling it again does
    /// nothing.
    pub fn destroy(&self) {
        let inner = &self.inner;
        {
            let mut state = inner.state.lock();
            if state.destroyed {
                return;
            }
            state.destroyed = true;
            state.pending = None;
            inner.cache.lock().clear();
        }
        inner.preloader.cancel();
        inner.channel.shutdown();
        *inner.on_ready.lock() = None;
        info!("Period loader destroyed");
    }

    pub fn is_destroyed(&self) -> bool {
        self.inner.state.lock().destroyed
    }

    /// Whether the dataset for `ordinal` is cached. Does not affect recency.
    pub fn is_cached(&self, ordinal: usize) -> bool {
        self.inner
            .periods
            .get(ordinal)
            .is_some_and(|period| self.inner.cache.lock().contains(period.identifier.as_str()))
    }

    pub fn cache_len(&self) -> usize {
        self.inner.cache.lock().len()
    }

    /// Cached identifiers, least recently used first.
    pub fn cached_identifiers(&self) -> Vec<String> {
        self.inner
            .cache
            .lock()
            .keys_by_recency()
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.inner.cache.lock().stats()
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.inner.metrics.snapshot()
    }

    pub fn periods(&self) -> &PeriodTable {
        &self.inner.periods
    }

    /// Where fetches currently run.
    pub fn channel_mode(&self) -> ChannelMode {
        self.inner.channel.mode()
    }

    fn schedule_preload(&self, ordinal: usize, direction: Option<Direction>) {
        let inner = &self.inner;
        if !inner.preload_enabled || inner.state.lock().destroyed {
            return;
        }

        let targets: Vec<Period> = inner
            .periods
            .neighbors(ordinal, direction)
            .into_iter()
            .filter_map(|o| inner.periods.get(o))
            .filter(|p| !inner.cache.lock().contains(p.identifier.as_str()))
            .cloned()
            .collect();
        if targets.is_empty() {
            return;
        }

        debug!(ordinal, targets = targets.len(), "Scheduling preload");
        let task_inner = Arc::clone(inner);
        inner
            .preloader
            .schedule(async move { task_inner.preload(targets).await });
    }
}

impl LoaderInner {
    /// Dataset for `period`, from the cache or the channel.
    async fn obtain(&self, period: &Period) -> Result<Arc<GeographicDataset>, LoadError> {
        let cached = self.cache.lock().get(period.identifier.as_str());
        if let Some(dataset) = cached {
            self.metrics.cache_hit();
            debug!(identifier = %period.identifier, "Cache hit");
            return Ok(dataset);
        }
        self.fetch_and_store(period).await
    }

    /// Fetch, transform and cache one period's dataset.
    async fn fetch_and_store(&self, period: &Period) -> Result<Arc<GeographicDataset>, LoadError> {
        self.metrics.fetch_started();
        let mode_before = self.channel.mode();
        let result = self.channel.retrieve(&period.identifier).await;
        if mode_before == ChannelMode::Delegated && self.channel.mode() == ChannelMode::Direct {
            self.metrics.fallback();
        }

        let raw = match result {
            Ok(raw) => raw,
            Err(e) => {
                self.metrics.fetch_failed();
                return Err(e.into());
            }
        };

        let transform = Arc::clone(&self.transform);
        let optimized = match tokio::task::spawn_blocking(move || transform.optimize(raw)).await
        {
            Ok(dataset) => dataset,
            Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
            Err(e) => return Err(LoadError::Interrupted(e.to_string())),
        };
        let dataset = Arc::new(optimized);

        // Lock order: state, then cache.
        let state = self.state.lock();
        if state.destroyed {
            return Err(LoadError::Destroyed);
        }
        let evicted = self
            .cache
            .lock()
            .put(period.identifier.clone(), Arc::clone(&dataset));
        drop(state);

        debug!(
            identifier = %period.identifier,
            features = dataset.feature_count(),
            evicted = evicted.as_deref().unwrap_or("-"),
            "Period cached"
        );
        Ok(dataset)
    }

    /// Warm the cache with `targets`, nearest first. Errors are logged only.
    async fn preload(&self, targets: Vec<Period>) {
        for period in targets {
            if self.state.lock().destroyed {
                return;
            }
            if self.cache.lock().contains(period.identifier.as_str()) {
                continue;
            }
            match self.fetch_and_store(&period).await {
                Ok(_) => {
                    self.metrics.preload_completed();
                    debug!(identifier = %period.identifier, "Preloaded period");
                }
                Err(e) => {
                    self.metrics.preload_failed();
                    debug!(identifier = %period.identifier, error = %e, "Preload failed");
                }
            }
        }
    }

    fn notify_ready(&self, period: &Period, dataset: &Arc<GeographicDataset>) {
        let callback = self.on_ready.lock().clone();
        if let Some(callback) = callback {
            callback(period, dataset);
        }
    }
}

/// Clears the in-progress flag however the primary load exits, unless the
/// loop already cleared it.
struct InProgressGuard<'a> {
    state: &'a Mutex<RequestState>,
    armed: bool,
}

impl InProgressGuard<'_> {
    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for InProgressGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.state.lock().in_progress = false;
        }
    }
}
