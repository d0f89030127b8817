//! Direct fetch: request and decode on the calling task.

use std::sync::Arc;

use super::decode::decode_payload;
use super::{BoxFuture, ChannelMode, FetchChannel, FetchError, HttpClient};
use crate::geo::GeographicDataset;

/// Fetch channel that runs the request and decode inline.
///
/// Resources are addressed as `<base_url>/<identifier><extension>`.
pub struct DirectChannel {
    client: Arc<dyn HttpClient>,
    base_url: String,
    extension: String,
}

impl DirectChannel {
    /// Creates a direct channel.
    ///
    /// # Arguments
    ///
    /// * `client` - HTTP client for making requests
    /// * `base_url` - Location of the period files
    pub fn new(client: Arc<dyn HttpClient>, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client,
            base_url,
            extension: String::new(),
        }
    }

    /// Append a fixed suffix (such as `.geojson`) to every identifier.
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    /// Builds the resource URL for an identifier.
    pub fn url_for(&self, identifier: &str) -> String {
        format!("{}/{}{}", self.base_url, identifier, self.extension)
    }
}

impl FetchChannel for DirectChannel {
    fn retrieve<'a>(
        &'a self,
        identifier: &'a str,
    ) -> BoxFuture<'a, Result<GeographicDataset, FetchError>> {
        Box::pin(async move {
            let url = self.url_for(identifier);
            tracing::trace!(identifier, url = %url, "Direct fetch");
            let payload = self.client.get(&url).await?;
            decode_payload(identifier, &payload)
        })
    }

    fn mode(&self) -> ChannelMode {
        ChannelMode::Direct
    }
}
