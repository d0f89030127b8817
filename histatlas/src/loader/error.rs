//! Loader error types.

use thiserror::Error;

use crate::fetch::FetchError;

/// Failure of a `load_period` call.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LoadError {
    /// The dataset for the authoritative period could not be fetched.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// The requested ordinal is outside the period table.
    #[error("unknown period {ordinal} (table has {count} periods)")]
    UnknownPeriod { ordinal: usize, count: usize },

    /// The loader has been torn down.
    #[error("period loader has been destroyed")]
    Destroyed,

    /// The transform task was cancelled because the runtime is shutting down.
    #[error("load interrupted: {0}")]
    Interrupted(String),
}
