//! HistAtlas - period data loading for a historical atlas
//!
//! This library is the data core behind the atlas time slider. It turns a
//! slider position into the territory-boundary geometry for that period,
//! keeping recently viewed periods in an LRU cache, collapsing bursts of
//! slider events into a single authoritative load, warming the neighbors of
//! the current period in the background, and moving network and decode work
//! onto a background worker with a transparent fallback to direct fetching.
//!
//! # Example
//!
//! ```ignore
//! use histatlas::fetch::{build_channel, FetchConfig};
//! use histatlas::loader::PeriodLoader;
//! use histatlas::period::load_manifest;
//!
//! let periods = load_manifest(Path::new("periods.json"))?;
//! let channel = build_channel(&FetchConfig::new("https://maps.example/periods"))?;
//! let loader = PeriodLoader::with_defaults(periods, channel);
//!
//! if let Some(dataset) = loader.load_period(12).await? {
//!     println!("{} features", dataset.feature_count());
//! }
//! ```

pub mod cache;
pub mod config;
pub mod fetch;
pub mod geo;
pub mod loader;
pub mod logging;
pub mod period;
pub mod telemetry;
pub mod transform;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
