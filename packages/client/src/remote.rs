use async_trait::async_trait;
use bytes::Bytes;
use tracing::debug;

use crate::error::{ClientError, check};

/// Source of media bytes that are not cached yet.
#[async_trait]
pub trait RemoteMedia: Send + Sync {
    async fn fetch(&self, path: &str) -> Result<Bytes, ClientError>;
}

/// Fetches blobs from the server's `/api/v1/media/{path}` endpoint.
pub struct HttpRemoteMedia {
    client: reqwest::Client,
    base_url: String,
}

impl HttpRemoteMedia {
    pub fn new(client: reqwest::Client, api_url: &str) -> Self {
        Self {
            client,
            base_url: format!("{}/api/v1/media", api_url.trim_end_matches('/')),
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

#[async_trait]
impl RemoteMedia for HttpRemoteMedia {
    async fn fetch(&self, path: &str) -> Result<Bytes, ClientError> {
        let url = self.url(path);
        debug!(url = %url, "Fetching media");
        let res = check(self.client.get(&url).send().await?).await?;
        Ok(res.bytes().await?)
    }
}
