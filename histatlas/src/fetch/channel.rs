//! The fetch channel abstraction.

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use super::FetchError;
use crate::geo::GeographicDataset;

/// Boxed future type for dyn-compatible async methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Where fetch and decode work currently runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelMode {
    /// On the calling task.
    Direct,
    /// On the background worker thread.
    Delegated,
}

impl fmt::Display for ChannelMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelMode::Direct => f.write_str("direct"),
            ChannelMode::Delegated => f.write_str("delegated"),
        }
    }
}

/// Retrieval plus decoding of one period's dataset.
///
/// Implementations differ only in where the work happens; callers observe a
/// dataset or a [`FetchError`] either way.
///
/// # Dyn Compatibility
///
/// Async methods return [`BoxFuture`] so the loader can hold an
/// `Arc<dyn FetchChannel>` chosen at runtime.
pub trait FetchChannel: Send + Sync {
    /// Fetch and decode the dataset named `identifier`.
    fn retrieve<'a>(
        &'a self,
        identifier: &'a str,
    ) -> BoxFuture<'a, Result<GeographicDataset, FetchError>>;

    /// Mode currently used for new requests.
    fn mode(&self) -> ChannelMode;

    /// Release background resources. Further requests may fail.
    fn shutdown(&self) {}
}
