use std::path::Path;
use std::sync::Arc;

use common::media::validate_upload;
use common::{Clue, ClueView, DeepLink, Hunt, HuntLookup, KnownHuntSet};
use serde_json::json;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::error::{ClientError, check};

/// What a scanned code leads to.
#[derive(Debug, Clone)]
pub enum ScanTarget {
    /// Editor link: the whole hunt.
    Hunt(Hunt),
    Clue(ClueView),
    /// The hunt is finished.
    Complete(Hunt),
}

/// HTTP access to the hunt API plus the device's known-hunt set.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    known: Arc<KnownHuntSet>,
}

impl ApiClient {
    pub fn new(http: reqwest::Client, api_url: &str, known: Arc<KnownHuntSet>) -> Self {
        Self {
            http,
            base_url: format!("{}/api/v1", api_url.trim_end_matches('/')),
            known,
        }
    }

    pub fn known(&self) -> &Arc<KnownHuntSet> {
        &self.known
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Create a hunt and remember it on this device.
    #[instrument(skip(self))]
    pub async fn create_hunt(&self, display_name: &str) -> Result<Hunt, ClientError> {
        let res = self
            .http
            .post(self.url("/hunts"))
            .json(&json!({ "display_name": display_name }))
            .send()
            .await?;
        let hunt: Hunt = check(res).await?.json().await?;
        self.known.add(hunt.id).await;
        info!(hunt_id = %hunt.id, "Created hunt");
        Ok(hunt)
    }

    pub async fn get_hunt(&self, hunt_id: Uuid) -> Result<Hunt, ClientError> {
        let res = self
            .http
            .get(self.url(&format!("/hunts/{hunt_id}")))
            .send()
            .await?;
        Ok(check(res).await?.json().await?)
    }

    pub async fn get_clue(&self, hunt_id: Uuid, clue_id: Uuid) -> Result<ClueView, ClientError> {
        let res = self
            .http
            .get(self.url(&format!("/hunts/{hunt_id}/clues/{clue_id}")))
            .send()
            .await?;
        Ok(check(res).await?.json().await?)
    }

    /// The hunts this device knows, in the order it learned them.
    ///
    /// IDs the server no longer resolves are forgotten.
    pub async fn known_hunts(&self) -> Result<Vec<Hunt>, ClientError> {
        let ids = self.known.list().await;
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let res = self
            .http
            .post(self.url("/hunts/lookup"))
            .json(&json!({ "ids": ids }))
            .send()
            .await?;
        let lookup: HuntLookup = check(res).await?.json().await?;

        if !lookup.missing.is_empty() {
            debug!(count = lookup.missing.len(), "Forgetting deleted hunts");
            self.known.remove_all(&lookup.missing).await;
        }
        Ok(lookup.hunts)
    }

    pub async fn forget(&self, hunt_id: Uuid) {
        self.known.remove(hunt_id).await;
    }

    /// Follow a scanned link. Any hunt link makes the hunt known.
    #[instrument(skip(self, link), fields(link = %link))]
    pub async fn visit(&self, link: DeepLink) -> Result<ScanTarget, ClientError> {
        let hunt_id = link.hunt_id();
        let target = match link {
            DeepLink::Editor { .. } => ScanTarget::Hunt(self.get_hunt(hunt_id).await?),
            DeepLink::Clue { clue_id, .. } => {
                ScanTarget::Clue(self.get_clue(hunt_id, clue_id).await?)
            }
            DeepLink::Complete { .. } => ScanTarget::Complete(self.get_hunt(hunt_id).await?),
        };
        self.known.add(hunt_id).await;
        Ok(target)
    }

    /// Attach a file to a clue. Type and size are checked before any I/O.
    #[instrument(skip(self, data), fields(size = data.len()))]
    pub async fn upload_media(
        &self,
        hunt_id: Uuid,
        clue_id: Uuid,
        file_name: &str,
        content_type: &str,
        data: Vec<u8>,
    ) -> Result<Clue, ClientError> {
        validate_upload(content_type, data.len() as u64)?;

        let part = reqwest::multipart::Part::bytes(data)
            .file_name(file_name.to_string())
            .mime_str(content_type)?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let res = self
            .http
            .post(self.url(&format!("/hunts/{hunt_id}/clues/{clue_id}/media")))
            .multipart(form)
            .send()
            .await?;
        Ok(check(res).await?.json().await?)
    }

    /// Upload a file from disk, guessing its type from the extension.
    pub async fn upload_file(
        &self,
        hunt_id: Uuid,
        clue_id: Uuid,
        path: &Path,
    ) -> Result<Clue, ClientError> {
        let io_error = |source| ClientError::Io {
            path: path.display().to_string(),
            source,
        };
        let content_type = mime_guess::from_path(path).first_or_octet_stream();
        let size = tokio::fs::metadata(path).await.map_err(io_error)?.len();
        validate_upload(content_type.as_ref(), size)?;

        let data = tokio::fs::read(path).await.map_err(io_error)?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        self.upload_media(hunt_id, clue_id, &file_name, content_type.as_ref(), data)
            .await
    }
}
