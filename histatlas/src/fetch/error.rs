//! Fetch error types.

use std::time::Duration;

use thiserror::Error;

/// Failure to retrieve one period's dataset.
///
/// This is the only error a [`FetchChannel`](super::FetchChannel) caller ever
/// sees. The core does not retry; callers retry by requesting again.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FetchError {
    /// The request could not be sent or the body could not be read.
    #[error("network error for {url}: {reason}")]
    Network { url: String, reason: String },

    /// The server answered with a non-success status.
    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    /// The payload could not be decoded into a dataset.
    #[error("malformed payload for {identifier}: {reason}")]
    Malformed { identifier: String, reason: String },

    /// A delegated request got no answer in time.
    #[error("request for {identifier} timed out after {timeout:?}")]
    Timeout {
        identifier: String,
        timeout: Duration,
    },
}

impl FetchError {
    pub fn network(url: impl Into<String>, reason: impl ToString) -> Self {
        FetchError::Network {
            url: url.into(),
            reason: reason.to_string(),
        }
    }

    pub fn malformed(identifier: impl Into<String>, reason: impl ToString) -> Self {
        FetchError::Malformed {
            identifier: identifier.into(),
            reason: reason.to_string(),
        }
    }
}

/// Failure of the delegated (background worker) channel.
///
/// `Unavailable` is attributable to the channel itself and triggers the
/// permanent switch to direct fetching; it never reaches loader callers.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ChannelError {
    /// The worker could not be created, has terminated, or dropped the request.
    #[error("background fetch worker unavailable: {0}")]
    Unavailable(String),

    /// The worker ran the request and the resource itself failed.
    #[error(transparent)]
    Fetch(#[from] FetchError),
}

impl ChannelError {
    pub fn unavailable(reason: impl Into<String>) -> Self {
        ChannelError::Unavailable(reason.into())
    }
}
