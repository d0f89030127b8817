//! Delegated-first fetching with a permanent switch to direct mode.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use tracing::{debug, warn};

use super::{BoxFuture, ChannelError, ChannelMode, DelegatedChannel, FetchChannel, FetchError};
use crate::geo::GeographicDataset;

/// Fetch channel that prefers the background worker and falls back to a
/// direct channel when the worker is unavailable.
///
/// Once the worker has failed as a channel (could not start, terminated, or
/// dropped a request), delegated mode stays disabled for the rest of the
/// session. Timeouts and resource errors are reported as-is and leave
/// delegated mode enabled.
pub struct FallbackChannel {
    delegated: Option<DelegatedChannel>,
    direct: Arc<dyn FetchChannel>,
    disabled: AtomicBool,
    fallbacks: AtomicU64,
}

impl FallbackChannel {
    /// Compose a fallback channel from the outcome of starting the worker.
    pub fn new(
        delegated: Result<DelegatedChannel, ChannelError>,
        direct: Arc<dyn FetchChannel>,
    ) -> Self {
        let delegated = match delegated {
            Ok(channel) => Some(channel),
            Err(e) => {
                warn!(error = %e, "Background fetch worker unavailable, using direct fetching");
                None
            }
        };
        let disabled = AtomicBool::new(delegated.is_none());
        Self {
            delegated,
            direct,
            disabled,
            fallbacks: AtomicU64::new(0),
        }
    }

    /// Whether delegated mode has been turned off.
    pub fn is_delegation_disabled(&self) -> bool {
        self.disabled.load(Ordering::Acquire)
    }

    /// Number of requests that were retried on the direct channel.
    pub fn fallback_count(&self) -> u64 {
        self.fallbacks.load(Ordering::Relaxed)
    }

    fn disable_delegation(&self, reason: &ChannelError) {
        // Only the first caller to flip the flag logs and stops the worker.
        if !self.disabled.swap(true, Ordering::AcqRel) {
            warn!(error = %reason, "Disabling background fetching for this session");
            if let Some(delegated) = &self.delegated {
                delegated.terminate();
            }
        }
    }
}

impl FetchChannel for FallbackChannel {
    fn retrieve<'a>(
        &'a self,
        identifier: &'a str,
    ) -> BoxFuture<'a, Result<GeographicDataset, FetchError>> {
        Box::pin(async move {
            let delegated = match &self.delegated {
                Some(channel) if !self.is_delegation_disabled() => channel,
                _ => return self.direct.retrieve(identifier).await,
            };

            match delegated.request(identifier).await {
                Ok(dataset) => Ok(dataset),
                Err(ChannelError::Fetch(e)) => Err(e),
                Err(unavailable @ ChannelError::Unavailable(_)) => {
                    self.disable_delegation(&unavailable);
                    self.fallbacks.fetch_add(1, Ordering::Relaxed);
                    debug!(identifier, "Retrying on direct channel");
                    self.direct.retrieve(identifier).await
                }
            }
        })
    }

    fn mode(&self) -> ChannelMode {
        if self.delegated.is_some() && !self.is_delegation_disabled() {
            ChannelMode::Delegated
        } else {
            ChannelMode::Direct
        }
    }

    fn shutdown(&self) {
        if let Some(delegated) = &self.delegated {
            delegated.terminate();
        }
        self.direct.shutdown();
    }
}
