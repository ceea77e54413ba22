use axum::Json;
use axum::extract::{DefaultBodyLimit, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use common::{Clue, ClueUpdate, ClueView};
use tracing::instrument;
use uuid::Uuid;

use crate::error::{AppError, ErrorBody};
use crate::extractors::json::AppJson;
use crate::models::hunt::{ReorderCluesRequest, validate_reorder_clues};
use crate::state::AppState;

pub fn clue_body_limit() -> DefaultBodyLimit {
    DefaultBodyLimit::max(1024 * 1024) // 1 MB
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Clues",
    operation_id = "listClues",
    summary = "List a hunt's clues",
    description = "Returns the clues of a hunt in hunt order.",
    params(("id" = Uuid, Path, description = "Hunt ID")),
    responses(
        (status = 200, description = "Clues in hunt order", body = Vec<Clue>),
        (status = 404, description = "Hunt not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn list_clues(
    State(state): State<AppState>,
    Path(hunt_id): Path<Uuid>,
) -> Result<Json<Vec<Clue>>, AppError> {
    Ok(Json(state.hunts.list_clues(hunt_id).await?))
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Clues",
    operation_id = "createClue",
    summary = "Append a clue",
    description = "Appends a clue with empty text and hint at the end of the hunt.",
    params(("id" = Uuid, Path, description = "Hunt ID")),
    responses(
        (status = 201, description = "Clue created", body = Clue),
        (status = 404, description = "Hunt not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn create_clue(
    State(state): State<AppState>,
    Path(hunt_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let clue = state.hunts.create_clue(hunt_id).await?;
    Ok((StatusCode::CREATED, Json(clue)))
}

#[utoipa::path(
    put,
    path = "/reorder",
    tag = "Clues",
    operation_id = "reorderClues",
    summary = "Reorder a hunt's clues",
    description = "Persists a new clue order. `clue_ids` must list every clue of the hunt exactly once.",
    params(("id" = Uuid, Path, description = "Hunt ID")),
    request_body = ReorderCluesRequest,
    responses(
        (status = 204, description = "Order saved"),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "Hunt not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(count = payload.clue_ids.len()))]
pub async fn reorder_clues(
    State(state): State<AppState>,
    Path(hunt_id): Path<Uuid>,
    AppJson(payload): AppJson<ReorderCluesRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_reorder_clues(&payload)?;
    state
        .hunts
        .update_clue_order(hunt_id, &payload.clue_ids)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/{clue_id}",
    tag = "Clues",
    operation_id = "getClue",
    summary = "Get a clue as a player sees it",
    description = "Returns the clue with its 1-based step number, the number of steps, and whether it is the last one.",
    params(
        ("id" = Uuid, Path, description = "Hunt ID"),
        ("clue_id" = Uuid, Path, description = "Clue ID"),
    ),
    responses(
        (status = 200, description = "Clue view", body = ClueView),
        (status = 404, description = "Hunt or clue not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn get_clue(
    State(state): State<AppState>,
    Path((hunt_id, clue_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<ClueView>, AppError> {
    Ok(Json(state.hunts.get_clue(hunt_id, clue_id).await?))
}

#[utoipa::path(
    patch,
    path = "/{clue_id}",
    tag = "Clues",
    operation_id = "updateClue",
    summary = "Update clue fields",
    description = "Writes only the fields present in the body. `media_url: null` and `media_type: null` clear the media.",
    params(
        ("id" = Uuid, Path, description = "Hunt ID"),
        ("clue_id" = Uuid, Path, description = "Clue ID"),
    ),
    request_body = ClueUpdate,
    responses(
        (status = 200, description = "Clue updated", body = Clue),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "Hunt or clue not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload))]
pub async fn update_clue(
    State(state): State<AppState>,
    Path((hunt_id, clue_id)): Path<(Uuid, Uuid)>,
    AppJson(payload): AppJson<ClueUpdate>,
) -> Result<Json<Clue>, AppError> {
    Ok(Json(
        state.hunts.update_clue(hunt_id, clue_id, payload).await?,
    ))
}

#[utoipa::path(
    delete,
    path = "/{clue_id}",
    tag = "Clues",
    operation_id = "deleteClue",
    summary = "Delete a clue",
    description = "Removes the clue and closes the gap in the hunt order. Its uploaded media is removed in the background.",
    params(
        ("id" = Uuid, Path, description = "Hunt ID"),
        ("clue_id" = Uuid, Path, description = "Clue ID"),
    ),
    responses(
        (status = 204, description = "Clue deleted"),
        (status = 404, description = "Hunt or clue not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn delete_clue(
    State(state): State<AppState>,
    Path((hunt_id, clue_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, AppError> {
    state.hunts.delete_clue(hunt_id, clue_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
