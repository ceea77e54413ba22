use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Root directory for all hunt media in the blob store.
pub const MEDIA_ROOT: &str = "hunt-media";

/// Largest accepted upload (50 MiB).
pub const MAX_MEDIA_SIZE: u64 = 50 * 1024 * 1024;

/// MIME types accepted for clue media.
pub const ACCEPTED_CONTENT_TYPES: [&str; 5] = [
    "image/jpeg",
    "image/png",
    "image/gif",
    "video/mp4",
    "video/quicktime",
];

/// Kind of media attached to a clue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Image,
    Video,
}

impl MediaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
        }
    }

    /// Classify a MIME type by its top-level type.
    pub fn from_content_type(content_type: &str) -> Option<Self> {
        let essence = content_type_essence(content_type);
        if essence.starts_with("image/") {
            Some(Self::Image)
        } else if essence.starts_with("video/") {
            Some(Self::Video)
        } else {
            None
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "image" => Ok(Self::Image),
            "video" => Ok(Self::Video),
            other => Err(format!("unknown media type '{other}'")),
        }
    }
}

/// Reasons an upload is refused before it reaches storage.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UploadRejection {
    #[error("unsupported media type '{0}': expected a JPEG, PNG or GIF image or an MP4 or QuickTime video")]
    UnsupportedType(String),

    #[error("file is {size} bytes, larger than the {limit} byte limit")]
    TooLarge { size: u64, limit: u64 },
}

/// Check an upload's declared MIME type and size.
///
/// Returns the media kind to record on the clue.
pub fn validate_upload(content_type: &str, size: u64) -> Result<MediaType, UploadRejection> {
    let essence = content_type_essence(content_type);
    if !ACCEPTED_CONTENT_TYPES.contains(&essence.as_str()) {
        return Err(UploadRejection::UnsupportedType(essence));
    }
    if size > MAX_MEDIA_SIZE {
        return Err(UploadRejection::TooLarge {
            size,
            limit: MAX_MEDIA_SIZE,
        });
    }
    MediaType::from_content_type(&essence)
        .ok_or_else(|| UploadRejection::UnsupportedType(essence.clone()))
}

/// Lowercased MIME type with parameters stripped (`"Image/PNG; q=1"` -> `"image/png"`).
fn content_type_essence(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

/// A stored media reference, as found in a clue's `media_url`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaRef<'a> {
    /// Legacy absolute URL, rendered as-is and never deleted.
    External(&'a str),
    /// Path inside the blob store.
    Stored(&'a str),
}

impl<'a> MediaRef<'a> {
    pub fn parse(reference: &'a str) -> Self {
        if reference.starts_with("http://") || reference.starts_with("https://") {
            Self::External(reference)
        } else {
            Self::Stored(reference)
        }
    }

    pub fn stored_path(&self) -> Option<&'a str> {
        match self {
            Self::Stored(path) => Some(path),
            Self::External(_) => None,
        }
    }
}

/// Directory holding every blob uploaded for a hunt.
pub fn hunt_media_prefix(hunt_id: Uuid) -> String {
    format!("{MEDIA_ROOT}/{hunt_id}")
}

/// Blob path for a new upload: `hunt-media/{hunt}/{clue}-{millis}-{name}`.
pub fn media_path(
    hunt_id: Uuid,
    clue_id: Uuid,
    file_name: &str,
    uploaded_at: DateTime<Utc>,
) -> String {
    format!(
        "{}/{clue_id}-{}-{}",
        hunt_media_prefix(hunt_id),
        uploaded_at.timestamp_millis(),
        sanitize_file_name(file_name)
    )
}

/// Replace everything outside `a-zA-Z0-9.-` with `_`.
pub fn sanitize_file_name(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();

    if sanitized.is_empty() {
        "upload".to_string()
    } else {
        sanitized
    }
}
