//! Delegated fetch: request and decode on a background worker thread.
//!
//! The worker is a dedicated OS thread running its own single-threaded Tokio
//! runtime. It shares no memory with the caller: requests and responses are
//! plain messages, correlated by a numeric request id.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────┐          ┌──────────────────────────────┐
//! │ DelegatedChannel (caller)     │          │ Worker thread                 │
//! │                               │ request  │                               │
//! │  request() ── id, identifier ─┼─────────►│  fetch + decode (per request) │
//! │     │                         │          │                               │
//! │     ▼ pending[id] = responder │ response │                               │
//! │  dispatcher ◄─── id, result ──┼◄─────────┤                               │
//! │     └─► resolve pending[id]   │          │                               │
//! └──────────────────────────────┘          └──────────────────────────────┘
//! ```
//!
//! Every request carries a timeout; an expired request is removed from the
//! correlation table and fails with [`FetchError::Timeout`]. If the worker
//! exits, every outstanding request fails with [`ChannelError::Unavailable`]
//! and the channel reports itself terminated.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use dashmap::DashMap;
use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::{ChannelError, FetchChannel, FetchError};
use crate::geo::GeographicDataset;

/// Default time to wait for the worker to answer one request.
pub const DEFAULT_WORKER_TIMEOUT: Duration = Duration::from_secs(30);

/// Name given to the worker thread.
pub const WORKER_THREAD_NAME: &str = "histatlas-fetch";

/// Message sent to the worker.
#[derive(Debug)]
struct WorkerRequest {
    request_id: u64,
    identifier: String,
}

/// Message sent back by the worker.
#[derive(Debug)]
struct WorkerResponse {
    request_id: u64,
    result: Result<GeographicDataset, FetchError>,
}

type Responder = oneshot::Sender<Result<GeographicDataset, ChannelError>>;
type PendingTable = DashMap<u64, Responder>;

/// Builds the channel the worker uses to do the actual fetching.
///
/// Called once on the worker thread, inside the worker's runtime, so any
/// connection pool it creates lives there.
pub type WorkerSetup = Box<dyn FnOnce() -> Result<Arc<dyn FetchChannel>, FetchError> + Send>;

/// Fetch channel backed by a background worker thread.
pub struct DelegatedChannel {
    requests: mpsc::UnboundedSender<WorkerRequest>,
    pending: Arc<PendingTable>,
    next_request_id: AtomicU64,
    timeout: Duration,
    shutdown: CancellationToken,
    terminated: Arc<AtomicBool>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl DelegatedChannel {
    /// Start the worker thread and the response dispatcher.
    ///
    /// Must be called from within a Tokio runtime, which hosts the
    /// dispatcher. Fails with [`ChannelError::Unavailable`] when there is no
    /// runtime or the thread cannot be spawned. Failures that happen later
    /// on the worker (runtime or setup errors) surface as `Unavailable` on
    /// the first request.
    pub fn spawn(setup: WorkerSetup, timeout: Duration) -> Result<Self, ChannelError> {
        let handle = Handle::try_current()
            .map_err(|e| ChannelError::unavailable(format!("no async runtime: {}", e)))?;

        let (request_tx, request_rx) = mpsc::unbounded_channel();
        let (response_tx, response_rx) = mpsc::unbounded_channel();
        let shutdown = CancellationToken::new();

        let worker_shutdown = shutdown.clone();
        let worker = std::thread::Builder::new()
            .name(WORKER_THREAD_NAME.to_string())
            .spawn(move || run_worker(setup, request_rx, response_tx, worker_shutdown))
            .map_err(|e| ChannelError::unavailable(format!("failed to spawn worker: {}", e)))?;

        let pending = Arc::new(PendingTable::new());
        let terminated = Arc::new(AtomicBool::new(false));
        handle.spawn(dispatch_responses(
            response_rx,
            Arc::clone(&pending),
            Arc::clone(&terminated),
            shutdown.clone(),
        ));

        info!(timeout_secs = timeout.as_secs_f64(), "Background fetch worker started");

        Ok(Self {
            requests: request_tx,
            pending,
            next_request_id: AtomicU64::new(1),
            timeout,
            shutdown,
            terminated,
            worker: Mutex::new(Some(worker)),
        })
    }

    /// Send one request to the worker and wait for its answer.
    pub async fn request(&self, identifier: &str) -> Result<GeographicDataset, ChannelError> {
        if self.is_terminated() {
            return Err(ChannelError::unavailable("worker has terminated"));
        }

        let request_id = self.next_request_id.fetch_add(1, Ordering::Relaxed);
        let (responder, response) = oneshot::channel();

        // Registered before sending so the dispatcher can always find it.
        self.pending.insert(request_id, responder);
        let _entry = PendingEntry {
            table: &self.pending,
            request_id,
        };

        let message = WorkerRequest {
            request_id,
            identifier: identifier.to_string(),
        };
        if self.requests.send(message).is_err() {
            return Err(ChannelError::unavailable("worker is not accepting requests"));
        }

        match tokio::time::timeout(self.timeout, response).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(ChannelError::unavailable("worker dropped the request")),
            Err(_) => {
                debug!(request_id, identifier, "Delegated request timed out");
                Err(ChannelError::Fetch(FetchError::Timeout {
                    identifier: identifier.to_string(),
                    timeout: self.timeout,
                }))
            }
        }
    }

    /// Whether the worker has exited.
    pub fn is_terminated(&self) -> bool {
        self.terminated.load(Ordering::Acquire)
    }

    /// Number of requests awaiting a response.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Stop the worker. Outstanding requests fail as unavailable.
    pub fn terminate(&self) {
        if self.shutdown.is_cancelled() {
            return;
        }
        self.shutdown.cancel();
        // The worker exits promptly once cancelled; detach rather than block
        // the caller on the join.
        if let Some(worker) = self.worker.lock().take() {
            drop(worker);
        }
        info!("Background fetch worker stopping");
    }
}

impl Drop for DelegatedChannel {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

/// Removes a correlation entry when the waiting request goes away, whether
/// it completed, timed out, or its future was dropped.
struct PendingEntry<'a> {
    table: &'a PendingTable,
    request_id: u64,
}

impl Drop for PendingEntry<'_> {
    fn drop(&mut self) {
        self.table.remove(&self.request_id);
    }
}

/// Route worker responses to waiting requests until the worker goes away.
async fn dispatch_responses(
    mut responses: mpsc::UnboundedReceiver<WorkerResponse>,
    pending: Arc<PendingTable>,
    terminated: Arc<AtomicBool>,
    shutdown: CancellationToken,
) {
    while let Some(response) = responses.recv().await {
        match pending.remove(&response.request_id) {
            Some((_, responder)) => {
                let _ = responder.send(response.result.map_err(ChannelError::Fetch));
            }
            None => debug!(
                request_id = response.request_id,
                "Dropping response for request that is no longer waiting"
            ),
        }
    }

    terminated.store(true, Ordering::Release);

    let outstanding: Vec<u64> = pending.iter().map(|entry| *entry.key()).collect();
    for request_id in outstanding {
        if let Some((_, responder)) = pending.remove(&request_id) {
            let _ = responder.send(Err(ChannelError::unavailable("worker terminated")));
        }
    }

    if shutdown.is_cancelled() {
        info!("Background fetch worker stopped");
    } else {
        warn!("Background fetch worker terminated unexpectedly");
    }
}

/// Body of the worker thread.
fn run_worker(
    setup: WorkerSetup,
    mut requests: mpsc::UnboundedReceiver<WorkerRequest>,
    responses: mpsc::UnboundedSender<WorkerResponse>,
    shutdown: CancellationToken,
) {
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            warn!(error = %e, "Failed to build worker runtime");
            drop(requests);
            return;
        }
    };

    runtime.block_on(async move {
        let channel = match setup() {
            Ok(channel) => channel,
            Err(e) => {
                warn!(error = %e, "Failed to set up worker fetch channel");
                drop(requests);
                return;
            }
        };

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                request = requests.recv() => {
                    let Some(request) = request else { break };
                    let channel = Arc::clone(&channel);
                    let responses = responses.clone();
                    tokio::spawn(async move {
                        let result = channel.retrieve(&request.identifier).await;
                        let _ = responses.send(WorkerResponse {
                            request_id: request.request_id,
                            result,
                        });
                    });
                }
            }
        }

        // Stop accepting work before the response side closes.
        drop(requests);
        channel.shutdown();
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::{BoxFuture, ChannelMode};
    use crate::geo::{Feature, Geometry, Position};
    use std::sync::atomic::AtomicUsize;

    /// Worker-side channel that answers from a closure after a delay.
    struct ScriptedChannel {
        delay: Duration,
        calls: Arc<AtomicUsize>,
    }

    impl FetchChannel for ScriptedChannel {
        fn retrieve<'a>(
            &'a self,
            identifier: &'a str,
        ) -> BoxFuture<'a, Result<GeographicDataset, FetchError>> {
            Box::pin(async move {
                self.calls.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(self.delay).await;
                if identifier == "broken" {
                    return Err(FetchError::Status {
                        status: 500,
                        url: identifier.to_string(),
                    });
                }
                Ok(GeographicDataset::new(vec![Feature::new(Geometry::Point {
                    coordinates: Position::new(0.0, 0.0),
                })
                .with_property("name", identifier.to_string())]))
            })
        }

        fn mode(&self) -> ChannelMode {
            ChannelMode::Direct
        }
    }

    fn scripted(delay: Duration, calls: Arc<AtomicUsize>) -> WorkerSetup {
        Box::new(move || {
            Ok(Arc::new(ScriptedChannel { delay, calls }) as Arc<dyn FetchChannel>)
        })
    }

    #[test]
    fn test_spawn_without_runtime_fails() {
        let calls = Arc::new(AtomicUsize::new(0));
        let result = DelegatedChannel::spawn(scripted(Duration::ZERO, calls), DEFAULT_WORKER_TIMEOUT);
        assert!(matches!(result, Err(ChannelError::Unavailable(_))));
    }

    #[tokio::test]
    async fn test_request_round_trip() {
        let calls = Arc::new(AtomicUsize::new(0));
        let channel =
            DelegatedChannel::spawn(scripted(Duration::ZERO, calls.clone()), DEFAULT_WORKER_TIMEOUT)
                .unwrap();

        let dataset = channel.request("world_1200").await.unwrap();
        assert_eq!(dataset.features[0].name(), Some("world_1200"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(channel.pending_count(), 0);
        channel.terminate();
    }

    #[tokio::test]
    async fn test_concurrent_requests_are_correlated() {
        let calls = Arc::new(AtomicUsize::new(0));
        let channel = DelegatedChannel::spawn(
            scripted(Duration::from_millis(20), calls.clone()),
            DEFAULT_WORKER_TIMEOUT,
        )
        .unwrap();

        let (a, b, c) = tokio::join!(
            channel.request("a"),
            channel.request("b"),
            channel.request("c")
        );
        assert_eq!(a.unwrap().features[0].name(), Some("a"));
        assert_eq!(b.unwrap().features[0].name(), Some("b"));
        assert_eq!(c.unwrap().features[0].name(), Some("c"));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        channel.terminate();
    }

    #[tokio::test]
    async fn test_resource_error_passes_through() {
        let calls = Arc::new(AtomicUsize::new(0));
        let channel =
            DelegatedChannel::spawn(scripted(Duration::ZERO, calls), DEFAULT_WORKER_TIMEOUT)
                .unwrap();

        let result = channel.request("broken").await;
        assert!(matches!(
            result,
            Err(ChannelError::Fetch(FetchError::Status { status: 500, .. }))
        ));
        assert!(!channel.is_terminated());
        channel.terminate();
    }

    #[tokio::test]
    async fn test_timeout_removes_pending_entry() {
        let calls = Arc::new(AtomicUsize::new(0));
        let channel = DelegatedChannel::spawn(
            scripted(Duration::from_secs(5), calls),
            Duration::from_millis(50),
        )
        .unwrap();

        let result = channel.request("slow").await;
        assert!(matches!(
            result,
            Err(ChannelError::Fetch(FetchError::Timeout { .. }))
        ));
        assert_eq!(channel.pending_count(), 0);
        assert!(!channel.is_terminated());
        channel.terminate();
    }

    #[tokio::test]
    async fn test_setup_failure_reports_unavailable() {
        let setup: WorkerSetup =
            Box::new(|| Err(FetchError::network("", "no client for you")));
        let channel = DelegatedChannel::spawn(setup, DEFAULT_WORKER_TIMEOUT).unwrap();

        let result = channel.request("a").await;
        assert!(matches!(result, Err(ChannelError::Unavailable(_))));
    }

    #[tokio::test]
    async fn test_terminate_fails_later_requests() {
        let calls = Arc::new(AtomicUsize::new(0));
        let channel =
            DelegatedChannel::spawn(scripted(Duration::ZERO, calls.clone()), DEFAULT_WORKER_TIMEOUT)
                .unwrap();
        channel.terminate();

        // Wait for the dispatcher to observe the worker exit.
        for _ in 0..100 {
            if channel.is_terminated() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(channel.is_terminated());

        let result = channel.request("a").await;
        assert!(matches!(result, Err(ChannelError::Unavailable(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
