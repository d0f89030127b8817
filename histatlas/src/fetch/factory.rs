//! Channel construction from configuration.

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use super::{
    ChannelMode, DelegatedChannel, DirectChannel, FallbackChannel, FetchChannel, FetchError,
    ReqwestClient, WorkerSetup, DEFAULT_HTTP_TIMEOUT, DEFAULT_WORKER_TIMEOUT,
};

/// Default file suffix appended to period identifiers.
pub const DEFAULT_EXTENSION: &str = ".geojson";

/// Settings for building a fetch channel.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub base_url: String,
    pub extension: String,
    pub mode: ChannelMode,
    pub http_timeout: Duration,
    pub worker_timeout: Duration,
}

impl FetchConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            extension: DEFAULT_EXTENSION.to_string(),
            mode: ChannelMode::Delegated,
            http_timeout: DEFAULT_HTTP_TIMEOUT,
            worker_timeout: DEFAULT_WORKER_TIMEOUT,
        }
    }

    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    pub fn with_mode(mut self, mode: ChannelMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_http_timeout(mut self, timeout: Duration) -> Self {
        self.http_timeout = timeout;
        self
    }

    pub fn with_worker_timeout(mut self, timeout: Duration) -> Self {
        self.worker_timeout = timeout;
        self
    }

    fn direct_channel(&self) -> Result<DirectChannel, FetchError> {
        let client = ReqwestClient::with_timeout(self.http_timeout)?;
        Ok(DirectChannel::new(Arc::new(client), self.base_url.clone())
            .with_extension(self.extension.clone()))
    }
}

/// Build the channel described by `config`.
///
/// In delegated mode the result is a [`FallbackChannel`]: if the worker
/// cannot be started, it quietly uses direct fetching instead. Must be
/// called inside a Tokio runtime for delegated mode to be available.
pub fn build_channel(config: &FetchConfig) -> Result<Arc<dyn FetchChannel>, FetchError> {
    let direct: Arc<dyn FetchChannel> = Arc::new(config.direct_channel()?);

    match config.mode {
        ChannelMode::Direct => {
            info!(base_url = %config.base_url, "Using direct fetching");
            Ok(direct)
        }
        ChannelMode::Delegated => {
            let worker_config = config.clone();
            let setup: WorkerSetup = Box::new(move || {
                let channel = worker_config.direct_channel()?;
                Ok(Arc::new(channel) as Arc<dyn FetchChannel>)
            });
            let delegated = DelegatedChannel::spawn(setup, config.worker_timeout);
            info!(base_url = %config.base_url, "Using background fetching");
            Ok(Arc::new(FallbackChannel::new(delegated, direct)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = FetchConfig::new("https://maps.example/data");
        assert_eq!(config.extension, ".geojson");
        assert_eq!(config.mode, ChannelMode::Delegated);
        assert_eq!(config.worker_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_build_direct_channel() {
        let config = FetchConfig::new("https://maps.example").with_mode(ChannelMode::Direct);
        let channel = build_channel(&config).unwrap();
        assert_eq!(channel.mode(), ChannelMode::Direct);
    }

    #[test]
    fn test_build_delegated_without_runtime_falls_back() {
        let config = FetchConfig::new("https://maps.example");
        let channel = build_channel(&config).unwrap();
        assert_eq!(channel.mode(), ChannelMode::Direct);
    }

    #[tokio::test]
    async fn test_build_delegated_channel() {
        let config = FetchConfig::new("https://maps.example")
            .with_worker_timeout(Duration::from_secs(2));
        let channel = build_channel(&config).unwrap();
        assert_eq!(channel.mode(), ChannelMode::Delegated);
        channel.shutdown();
    }
}
