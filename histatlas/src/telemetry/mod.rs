//! Loader telemetry for observability and user feedback.
//!
//! The loader records events into lock-free atomic counters; callers take a
//! [`MetricsSnapshot`] when they want to display or compare them.
//!
//! ```text
//! PeriodLoader ─────► LoaderMetrics ─────► MetricsSnapshot ─────► Views
//!                    (atomic counters)    (point-in-time copy)     (CLI, logs)
//! ```
//!
//! # Example
//!
//! ```
//! use histatlas::telemetry::LoaderMetrics;
//!
//! let metrics = LoaderMetrics::new();
//! metrics.request();
//! metrics.cache_hit();
//!
//! let snapshot = metrics.snapshot();
//! assert_eq!(snapshot.requests, 1);
//! assert_eq!(snapshot.cache_hits, 1);
//! ```

mod metrics;
mod snapshot;

pub use metrics::LoaderMetrics;
pub use snapshot::MetricsSnapshot;
