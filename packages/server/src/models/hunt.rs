use common::Hunt;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;

use super::shared::{MAX_LOOKUP_IDS, validate_bulk_ids, validate_reorder_ids};

#[derive(Deserialize, Default, utoipa::ToSchema)]
pub struct CreateHuntRequest {
    /// May be empty; no uniqueness rule applies.
    #[serde(default)]
    #[schema(example = "Park Hunt")]
    pub display_name: String,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct UpdateHuntRequest {
    #[schema(example = "Forest Hunt")]
    pub display_name: String,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct LookupHuntsRequest {
    /// Hunt IDs known to the caller, in display order.
    pub ids: Vec<Uuid>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct HuntListResponse {
    pub data: Vec<Hunt>,
    #[schema(example = 3)]
    pub total: usize,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct ReorderCluesRequest {
    /// Every clue ID of the hunt in the new order. Positions are assigned
    /// 0, 1, 2, ... by array index.
    pub clue_ids: Vec<Uuid>,
}

/// Multipart body of a media upload.
#[derive(utoipa::ToSchema)]
#[allow(dead_code)]
pub struct UploadMediaForm {
    /// JPEG, PNG or GIF image, or MP4 or QuickTime video; at most 50 MiB.
    #[schema(value_type = String, format = Binary)]
    pub file: Vec<u8>,
}

pub fn validate_lookup(req: &LookupHuntsRequest) -> Result<(), AppError> {
    validate_bulk_ids(&req.ids, "ids", MAX_LOOKUP_IDS)
}

pub fn validate_reorder_clues(req: &ReorderCluesRequest) -> Result<(), AppError> {
    validate_reorder_ids(&req.clue_ids, "clue_id")
}
