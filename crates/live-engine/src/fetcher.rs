// Resource fetching: manifests as raw bytes, segments as raw bytes.

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use tracing::{debug, trace};
use url::Url;

use crate::LiveError;

/// Source of manifest and segment bodies.
#[async_trait]
pub trait ResourceFetcher: Send + Sync {
    /// Fetches the body at `url`.
    async fn fetch_bytes(&self, url: &Url) -> Result<Bytes, LiveError>;
}

#[async_trait]
impl<F: ResourceFetcher + ?Sized> ResourceFetcher for &F {
    async fn fetch_bytes(&self, url: &Url) -> Result<Bytes, LiveError> {
        (**self).fetch_bytes(url).await
    }
}

/// [`ResourceFetcher`] backed by a `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ResourceFetcher for HttpFetcher {
    async fn fetch_bytes(&self, url: &Url) -> Result<Bytes, LiveError> {
        trace!(url = %url, "GET");
        let response = self.client.get(url.clone()).send().await?;

        let status = response.status();
        if !status.is_success() {
            debug!(url = %url, %status, "Request rejected");
            return Err(LiveError::http_status(status, url.as_str(), "fetch"));
        }

        let body = response.bytes().await?;
        trace!(url = %url, len = body.len(), "Fetched");
        Ok(body)
    }
}
