use std::path::PathBuf;

use axum::Json;
use axum::body::Body;
use axum::extract::multipart::Field;
use axum::extract::{DefaultBodyLimit, Multipart, Path, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use common::Clue;
use common::media::{MAX_MEDIA_SIZE, UploadRejection, validate_upload};
use common::storage::{BoxReader, validate_blob_path};
use tokio::io::AsyncWriteExt;
use tokio_util::io::ReaderStream;
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::error::{AppError, ErrorBody};
use crate::models::hunt::UploadMediaForm;
use crate::service::MediaUpload;
use crate::state::AppState;

/// Multipart overhead allowed on top of the largest accepted file.
const MULTIPART_OVERHEAD: usize = 1024 * 1024;

pub fn media_upload_body_limit() -> DefaultBodyLimit {
    DefaultBodyLimit::max(MAX_MEDIA_SIZE as usize + MULTIPART_OVERHEAD)
}

#[utoipa::path(
    post,
    path = "/{clue_id}/media",
    tag = "Media",
    operation_id = "uploadClueMedia",
    summary = "Attach media to a clue",
    description = "Uploads the `file` multipart field and points the clue at it. \
        Accepted types: JPEG, PNG and GIF images, MP4 and QuickTime videos, at most 50 MiB. \
        Rejected uploads leave the clue unchanged. Previously attached media is removed in the background.",
    params(
        ("id" = Uuid, Path, description = "Hunt ID"),
        ("clue_id" = Uuid, Path, description = "Clue ID"),
    ),
    request_body(content = UploadMediaForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Media attached", body = Clue),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "Hunt or clue not found (NOT_FOUND)", body = ErrorBody),
        (status = 413, description = "File too large (PAYLOAD_TOO_LARGE)", body = ErrorBody),
        (status = 415, description = "Unsupported file type (UNSUPPORTED_MEDIA_TYPE)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, multipart))]
pub async fn upload_media(
    State(state): State<AppState>,
    Path((hunt_id, clue_id)): Path<(Uuid, Uuid)>,
    mut multipart: Multipart,
) -> Result<Json<Clue>, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Multipart error: {e}")))?
    {
        if field.name() != Some("file") {
            continue; // Ignore unknown fields.
        }

        let file_name = field.file_name().unwrap_or_default().to_string();
        let content_type = field_content_type(&field, &file_name);
        // Reject by type before reading a single byte of the body.
        validate_upload(&content_type, 0)?;

        let max_size = state.config.storage.max_blob_size.min(MAX_MEDIA_SIZE);
        let spooled = spool_field(field, max_size).await?;
        let result = async {
            let file = tokio::fs::File::open(&spooled.path)
                .await
                .map_err(|e| AppError::Internal(format!("Failed to reopen temp file: {e}")))?;
            let reader: BoxReader = Box::new(file);
            let upload = MediaUpload {
                file_name,
                content_type,
                size: spooled.size,
                reader,
            };
            state.hunts.upload_clue_media(hunt_id, clue_id, upload).await
        }
        .await;

        // Best effort.
        let _ = tokio::fs::remove_file(&spooled.path).await;
        return result.map(Json);
    }

    Err(AppError::Validation("Missing 'file' field".into()))
}

#[utoipa::path(
    delete,
    path = "/{clue_id}/media",
    tag = "Media",
    operation_id = "deleteClueMedia",
    summary = "Remove a clue's media",
    description = "Clears the clue's media fields. The stored file is removed in the background.",
    params(
        ("id" = Uuid, Path, description = "Hunt ID"),
        ("clue_id" = Uuid, Path, description = "Clue ID"),
    ),
    responses(
        (status = 204, description = "Media removed"),
        (status = 404, description = "Hunt or clue not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn delete_media(
    State(state): State<AppState>,
    Path((hunt_id, clue_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, AppError> {
    state.hunts.delete_clue_media(hunt_id, clue_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Stream a stored blob. Paths are write-once, so responses are cacheable
/// for a long time.
#[instrument(skip(state, headers))]
pub async fn get_media(
    State(state): State<AppState>,
    Path(path): Path<String>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let path = validate_blob_path(&path)?;
    let store = state.hunts.blob_store();
    let info = store.stat(path).await?;

    let etag_value = format!("\"{}-{}\"", info.size, info.modified.timestamp_millis());
    if let Some(if_none_match) = headers.get(header::IF_NONE_MATCH)
        && let Ok(val) = if_none_match.to_str()
        && (val == etag_value || val == "*")
    {
        return Ok(StatusCode::NOT_MODIFIED.into_response());
    }

    let reader = store.get_stream(path).await?;
    let body = Body::from_stream(ReaderStream::new(reader));
    let content_type = mime_guess::from_path(path).first_or_octet_stream();

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type.as_ref())
        .header(header::CONTENT_LENGTH, info.size.to_string())
        .header(header::ETAG, &etag_value)
        .header(header::CACHE_CONTROL, "public, max-age=31536000, immutable")
        .body(body)
        .map_err(|e| AppError::Internal(format!("Failed to build response: {e}")))
}

/// Declared part type, or one guessed from the file name when the client
/// sent none or a generic one.
fn field_content_type(field: &Field<'_>, file_name: &str) -> String {
    match field.content_type() {
        Some(declared) if declared != "application/octet-stream" => declared.to_string(),
        _ => mime_guess::from_path(file_name)
            .first_raw()
            .unwrap_or("application/octet-stream")
            .to_string(),
    }
}

struct Spooled {
    path: PathBuf,
    size: u64,
}

/// Stream a multipart field to a temp file, enforcing `max_size`.
async fn spool_field(mut field: Field<'_>, max_size: u64) -> Result<Spooled, AppError> {
    let temp_path = std::env::temp_dir().join(format!("hunt-upload-{}", Uuid::new_v4()));

    let result = async {
        let mut temp_file = tokio::fs::File::create(&temp_path)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to create temp file: {e}")))?;

        let mut total_size: u64 = 0;

        while let Some(chunk) = field
            .chunk()
            .await
            .map_err(|e| AppError::Validation(format!("Upload read error: {e}")))?
        {
            total_size += chunk.len() as u64;
            if total_size > max_size {
                return Err(AppError::from(UploadRejection::TooLarge {
                    size: total_size,
                    limit: max_size,
                }));
            }
            temp_file
                .write_all(&chunk)
                .await
                .map_err(|e| AppError::Internal(format!("Temp file write failed: {e}")))?;
        }

        temp_file
            .flush()
            .await
            .map_err(|e| AppError::Internal(format!("Temp file flush failed: {e}")))?;
        Ok(total_size)
    }
    .await;

    match result {
        Ok(size) => {
            debug!(size, path = %temp_path.display(), "Spooled upload");
            Ok(Spooled {
                path: temp_path,
                size,
            })
        }
        Err(e) => {
            // Best effort.
            let _ = tokio::fs::remove_file(&temp_path).await;
            Err(e)
        }
    }
}
