//! HTTP client abstraction for testability

use std::time::Duration;

use bytes::Bytes;

use super::{BoxFuture, FetchError};

/// Default HTTP timeout for direct requests.
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Trait for HTTP client operations.
///
/// This abstraction allows for dependency injection and easier testing
/// by enabling mock HTTP clients in tests.
pub trait HttpClient: Send + Sync {
    /// Performs an HTTP GET request.
    ///
    /// # Arguments
    ///
    /// * `url` - The URL to request
    ///
    /// # Returns
    ///
    /// The response body or an error.
    fn get<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<Bytes, FetchError>>;
}

/// Real HTTP client implementation using reqwest.
#[derive(Clone)]
pub struct ReqwestClient {
    client: reqwest::Client,
}

impl ReqwestClient {
    /// Creates a new ReqwestClient with default configuration.
    pub fn new() -> Result<Self, FetchError> {
        Self::with_timeout(DEFAULT_HTTP_TIMEOUT)
    }

    /// Creates a new ReqwestClient with custom timeout.
    pub fn with_timeout(timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .gzip(true)
            .build()
            .map_err(|e| FetchError::network("", format!("failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }
}

impl HttpClient for ReqwestClient {
    fn get<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<Bytes, FetchError>> {
        Box::pin(async move {
            let response = self
                .client
                .get(url)
                .send()
                .await
                .map_err(|e| FetchError::network(url, format!("request failed: {}", e)))?;

            // Check HTTP status
            let status = response.status();
            if !status.is_success() {
                return Err(FetchError::Status {
                    status: status.as_u16(),
                    url: url.to_string(),
                });
            }

            response
                .bytes()
                .await
                .map_err(|e| FetchError::network(url, format!("failed to read response: {}", e)))
        })
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Mock HTTP client for testing.
    ///
    /// Serves canned bodies by URL; unknown URLs answer 404. Every call is
    /// counted and recorded.
    #[derive(Default)]
    pub struct MockHttpClient {
        responses: Mutex<HashMap<String, Result<Bytes, FetchError>>>,
        pub calls: AtomicUsize,
        pub requested: Mutex<Vec<String>>,
        pub delay: Option<Duration>,
    }

    impl MockHttpClient {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = Some(delay);
            self
        }

        pub fn respond(&self, url: &str, response: Result<Bytes, FetchError>) {
            self.responses.lock().insert(url.to_string(), response);
        }

        pub fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl HttpClient for MockHttpClient {
        fn get<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<Bytes, FetchError>> {
            Box::pin(async move {
                self.calls.fetch_add(1, Ordering::SeqCst);
                self.requested.lock().push(url.to_string());
                if let Some(delay) = self.delay {
                    tokio::time::sleep(delay).await;
                }
                self.responses
                    .lock()
                    .get(url)
                    .cloned()
                    .unwrap_or_else(|| {
                        Err(FetchError::Status {
                            status: 404,
                            url: url.to_string(),
                        })
                    })
            })
        }
    }

    #[tokio::test]
    async fn test_mock_client_success() {
        let mock = MockHttpClient::new();
        mock.respond("http://example.com/a", Ok(Bytes::from_static(b"[1,2,3]")));

        let result = mock.get("http://example.com/a").await;
        assert_eq!(result.unwrap(), Bytes::from_static(b"[1,2,3]"));
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn test_mock_client_unknown_url_is_404() {
        let mock = MockHttpClient::new();

        let result = mock.get("http://example.com/missing").await;
        assert!(matches!(result, Err(FetchError::Status { status: 404, .. })));
    }

    #[test]
    fn test_reqwest_client_builds() {
        assert!(ReqwestClient::with_timeout(Duration::from_secs(5)).is_ok());
    }
}
