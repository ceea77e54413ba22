use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::media::{MediaRef, MediaType};

/// Display name shown for hunts created without one.
pub const UNNAMED_HUNT: &str = "Unnamed hunt";

/// One step of a hunt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Clue {
    pub id: Uuid,
    pub hunt_id: Uuid,
    /// Prompt shown to hunters; may be empty while authoring.
    #[schema(example = "Find the oak")]
    pub text: String,
    #[schema(example = "It is older than the bench")]
    pub hint: String,
    /// Blob store path, or a legacy absolute URL.
    pub media_url: Option<String>,
    pub media_type: Option<MediaType>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Clue {
    /// The clue's media as a parsed reference, if any.
    pub fn media(&self) -> Option<MediaRef<'_>> {
        self.media_url
            .as_deref()
            .filter(|url| !url.trim().is_empty())
            .map(MediaRef::parse)
    }

    /// Blob store path of attached media, skipping legacy URLs.
    pub fn stored_media_path(&self) -> Option<&str> {
        self.media().and_then(|media| media.stored_path())
    }
}

/// A named, ordered sequence of clues.
///
/// `clues` is in hunt order: index 0 is the first scan point and the last
/// clue leads to the completion page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Hunt {
    pub id: Uuid,
    #[schema(example = "Park Hunt")]
    pub display_name: String,
    pub clues: Vec<Clue>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Hunt {
    /// Name to display, falling back to [`UNNAMED_HUNT`].
    pub fn title(&self) -> &str {
        let name = self.display_name.trim();
        if name.is_empty() { UNNAMED_HUNT } else { name }
    }

    /// Blob store paths of every clue's media, in hunt order.
    pub fn stored_media_paths(&self) -> Vec<&str> {
        self.clues
            .iter()
            .filter_map(Clue::stored_media_path)
            .collect()
    }

    pub fn clue(&self, clue_id: Uuid) -> Option<&Clue> {
        self.clues.iter().find(|clue| clue.id == clue_id)
    }
}

/// Partial clue update. Absent fields are left untouched.
///
/// For the media fields, JSON `null` clears the value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ClueUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    #[schema(value_type = Option<String>)]
    pub media_url: Option<Option<String>>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    #[schema(value_type = Option<MediaType>)]
    pub media_type: Option<Option<MediaType>>,
}

impl ClueUpdate {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Update that clears both media fields.
    pub fn clear_media() -> Self {
        Self {
            media_url: Some(None),
            media_type: Some(None),
            ..Default::default()
        }
    }

    /// Update that points the clue at newly stored media.
    pub fn set_media(path: String, media_type: MediaType) -> Self {
        Self {
            media_url: Some(Some(path)),
            media_type: Some(Some(media_type)),
            ..Default::default()
        }
    }
}

/// Single-clue player view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ClueView {
    pub hunt_id: Uuid,
    pub hunt_name: String,
    pub clue: Clue,
    /// 1-based step number.
    pub step: usize,
    pub total: usize,
    pub is_last: bool,
}

/// Result of resolving a device's known hunt IDs against the store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct HuntLookup {
    /// Existing hunts, in the order they were requested.
    pub hunts: Vec<Hunt>,
    /// Requested IDs that no longer resolve.
    pub missing: Vec<Uuid>,
}

/// Serde helper for PATCH semantics on nullable fields.
///
/// * JSON field absent  => `None`          (don't update)
/// * JSON field = null  => `Some(None)`    (set to NULL)
/// * JSON field = value => `Some(Some(v))` (set to value)
pub fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Some(Option::deserialize(deserializer)?))
}
