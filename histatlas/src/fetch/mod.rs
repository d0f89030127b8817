//! Retrieval and decoding of period datasets.
//!
//! A [`FetchChannel`] turns a period identifier into a decoded
//! [`GeographicDataset`](crate::geo::GeographicDataset). Two forms exist:
//!
//! - [`DirectChannel`] requests and decodes on the calling task.
//! - [`DelegatedChannel`] hands the work to a background worker thread and
//!   correlates replies by request id.
//!
//! [`FallbackChannel`] composes the two so callers never see worker
//! failures, only datasets or [`FetchError`]s. [`build_channel`] assembles
//! the right combination from a [`FetchConfig`].

mod channel;
mod decode;
mod delegated;
mod direct;
mod error;
mod factory;
mod fallback;
pub(crate) mod http;

pub use channel::{BoxFuture, ChannelMode, FetchChannel};
pub use decode::{decode_payload, is_gzip};
pub use delegated::{DelegatedChannel, WorkerSetup, DEFAULT_WORKER_TIMEOUT, WORKER_THREAD_NAME};
pub use direct::DirectChannel;
pub use error::{ChannelError, FetchError};
pub use factory::{build_channel, FetchConfig, DEFAULT_EXTENSION};
pub use fallback::FallbackChannel;
pub use http::{HttpClient, ReqwestClient, DEFAULT_HTTP_TIMEOUT};
