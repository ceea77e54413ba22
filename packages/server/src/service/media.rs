use chrono::Utc;
use common::Clue;
use common::media::{media_path, validate_upload};
use common::storage::BoxReader;
use sea_orm::{ActiveModelTrait, Set};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::{HuntService, clue_from_model, find_clue_for_hunt, find_hunt, touch_hunt};
use crate::entity::clue;
use crate::error::AppError;
use crate::feed::Change;

/// A file to attach to a clue.
pub struct MediaUpload {
    /// Name supplied by the uploader; sanitized before use in the blob path.
    pub file_name: String,
    /// Declared MIME type.
    pub content_type: String,
    /// Exact byte length of `reader`.
    pub size: u64,
    pub reader: BoxReader,
}

impl MediaUpload {
    pub fn from_bytes(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        data: Vec<u8>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            size: data.len() as u64,
            reader: Box::new(std::io::Cursor::new(data)),
        }
    }
}

impl HuntService {
    /// Store a new media file and point the clue at it.
    ///
    /// Type and size are checked before anything is written; a rejected
    /// upload leaves both the blob store and the clue untouched. The
    /// previously attached stored blob is deleted best-effort.
    #[instrument(skip(self, upload), fields(file_name = %upload.file_name, size = upload.size))]
    pub async fn upload_clue_media(
        &self,
        hunt_id: Uuid,
        clue_id: Uuid,
        upload: MediaUpload,
    ) -> Result<Clue, AppError> {
        let media_type = validate_upload(&upload.content_type, upload.size)?;
        find_clue_for_hunt(&self.db, hunt_id, clue_id).await?;

        let path = media_path(hunt_id, clue_id, &upload.file_name, Utc::now());
        let written = self.blob_store.put_stream(&path, upload.reader).await?;

        // The clue may have been deleted while the blob was streaming.
        let attached = async {
            let hunt = find_hunt(&self.db, hunt_id).await?;
            let existing = find_clue_for_hunt(&self.db, hunt_id, clue_id).await?;
            let previous = clue_from_model(existing.clone())
                .stored_media_path()
                .map(str::to_string);

            let mut active: clue::ActiveModel = existing.into();
            active.media_url = Set(Some(path.clone()));
            active.media_type = Set(Some(media_type.as_str().to_string()));
            active.updated_at = Set(Utc::now());
            let model = active.update(&self.db).await?;
            touch_hunt(&self.db, hunt).await?;
            Ok::<_, AppError>((model, previous))
        }
        .await;

        let (model, previous) = match attached {
            Ok(attached) => attached,
            Err(e) => {
                if let Err(cleanup) = self.blob_store.delete(&path).await {
                    warn!(path = %path, error = %cleanup, "Failed to remove unattached upload");
                }
                return Err(e);
            }
        };

        info!(hunt_id = %hunt_id, clue_id = %clue_id, path = %path, bytes = written, "Attached clue media");
        self.publish(Change::CluesUpdated(hunt_id));
        self.delete_blobs_in_background(
            previous.into_iter().filter(|old| old != &path).collect(),
            None,
        );
        Ok(clue_from_model(model))
    }

    /// Clear the clue's media fields and best-effort delete the stored blob.
    #[instrument(skip(self))]
    pub async fn delete_clue_media(&self, hunt_id: Uuid, clue_id: Uuid) -> Result<Clue, AppError> {
        let hunt = find_hunt(&self.db, hunt_id).await?;
        let existing = find_clue_for_hunt(&self.db, hunt_id, clue_id).await?;
        let previous = clue_from_model(existing.clone())
            .stored_media_path()
            .map(str::to_string);

        let mut active: clue::ActiveModel = existing.into();
        active.media_url = Set(None);
        active.media_type = Set(None);
        active.updated_at = Set(Utc::now());
        let model = active.update(&self.db).await?;
        touch_hunt(&self.db, hunt).await?;

        self.publish(Change::CluesUpdated(hunt_id));
        self.delete_blobs_in_background(previous.into_iter().collect(), None);
        Ok(clue_from_model(model))
    }
}
