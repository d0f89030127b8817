//! Low-priority scheduling of speculative neighbor loads.
//!
//! At most one preload is scheduled at a time. Scheduling a new one cancels
//! the previous one unless it has already started; a started preload always
//! runs to completion.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

use crate::fetch::BoxFuture;

/// Host facility that reports when the application has spare time.
///
/// The returned future resolves once the host is idle. Without one, the
/// scheduler waits a fixed delay instead.
pub trait IdleSignal: Send + Sync {
    fn wait_idle(&self) -> BoxFuture<'_, ()>;
}

struct ScheduledPreload {
    handle: JoinHandle<()>,
    /// Set by whichever side gets there first: the task when it starts, or a
    /// canceller. The loser backs off.
    claimed: Arc<AtomicBool>,
}

impl ScheduledPreload {
    /// Cancel if not yet started. Returns whether it was cancelled.
    fn cancel(self) -> bool {
        if self.claimed.swap(true, Ordering::AcqRel) {
            return false;
        }
        self.handle.abort();
        true
    }
}

/// Runs at most one pending preload after an idle period.
pub struct PreloadScheduler {
    delay: Duration,
    idle_signal: Option<Arc<dyn IdleSignal>>,
    scheduled: Mutex<Option<ScheduledPreload>>,
}

impl PreloadScheduler {
    pub fn new(delay: Duration, idle_signal: Option<Arc<dyn IdleSignal>>) -> Self {
        Self {
            delay,
            idle_signal,
            scheduled: Mutex::new(None),
        }
    }

    /// Run `work` once the host is idle, replacing any preload that has not
    /// started yet.
    ///
    /// Does nothing outside a Tokio runtime.
    pub fn schedule<F>(&self, work: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let Ok(handle) = Handle::try_current() else {
            debug!("No runtime available, skipping preload");
            return;
        };

        let claimed = Arc::new(AtomicBool::new(false));
        let task_claimed = Arc::clone(&claimed);
        let idle_signal = self.idle_signal.clone();
        let delay = self.delay;

        let mut scheduled = self.scheduled.lock();
        if let Some(previous) = scheduled.take() {
            if previous.cancel() {
                trace!("Cancelled pending preload");
            }
        }

        let task = handle.spawn(async move {
            match idle_signal {
                Some(signal) => signal.wait_idle().await,
                None => tokio::time::sleep(delay).await,
            }
            if task_claimed.swap(true, Ordering::AcqRel) {
                return;
            }
            work.await;
        });

        *scheduled = Some(ScheduledPreload {
            handle: task,
            claimed,
        });
    }

    /// Cancel the scheduled preload if it has not started.
    pub fn cancel(&self) -> bool {
        match self.scheduled.lock().take() {
            Some(previous) => previous.cancel(),
            None => false,
        }
    }
}

impl Drop for PreloadScheduler {
    fn drop(&mut self) {
        self.cancel();
    }
}
