use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use common::{Hunt, HuntLookup};
use tracing::instrument;
use uuid::Uuid;

use crate::error::{AppError, ErrorBody};
use crate::extractors::json::AppJson;
use crate::models::hunt::{
    CreateHuntRequest, HuntListResponse, LookupHuntsRequest, UpdateHuntRequest, validate_lookup,
};
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/",
    tag = "Hunts",
    operation_id = "listHunts",
    summary = "List all hunts",
    description = "Returns every hunt with its clues in hunt order, newest hunt first.",
    responses(
        (status = 200, description = "Hunt list", body = HuntListResponse),
    ),
)]
#[instrument(skip(state))]
pub async fn list_hunts(State(state): State<AppState>) -> Result<Json<HuntListResponse>, AppError> {
    let data = state.hunts.list_hunts().await?;
    let total = data.len();
    Ok(Json(HuntListResponse { data, total }))
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Hunts",
    operation_id = "createHunt",
    summary = "Create a hunt",
    description = "Creates a hunt with no clues. The display name may be empty.",
    request_body = CreateHuntRequest,
    responses(
        (status = 201, description = "Hunt created", body = Hunt),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload))]
pub async fn create_hunt(
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateHuntRequest>,
) -> Result<impl IntoResponse, AppError> {
    let hunt = state.hunts.create_hunt(&payload.display_name).await?;
    Ok((StatusCode::CREATED, Json(hunt)))
}

#[utoipa::path(
    post,
    path = "/lookup",
    tag = "Hunts",
    operation_id = "lookupHunts",
    summary = "Resolve known hunt IDs",
    description = "Returns the hunts that still exist, in the requested order, and the IDs that no longer resolve so the caller can forget them.",
    request_body = LookupHuntsRequest,
    responses(
        (status = 200, description = "Lookup result", body = HuntLookup),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(count = payload.ids.len()))]
pub async fn lookup_hunts(
    State(state): State<AppState>,
    AppJson(payload): AppJson<LookupHuntsRequest>,
) -> Result<Json<HuntLookup>, AppError> {
    validate_lookup(&payload)?;
    Ok(Json(state.hunts.lookup_hunts(&payload.ids).await?))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Hunts",
    operation_id = "getHunt",
    summary = "Get a hunt",
    params(("id" = Uuid, Path, description = "Hunt ID")),
    responses(
        (status = 200, description = "Hunt with clues in hunt order", body = Hunt),
        (status = 404, description = "Hunt not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn get_hunt(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Hunt>, AppError> {
    state
        .hunts
        .get_hunt(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Hunt not found".into()))
}

#[utoipa::path(
    patch,
    path = "/{id}",
    tag = "Hunts",
    operation_id = "updateHunt",
    summary = "Rename a hunt",
    description = "Overwrites the display name. Empty and duplicate names are allowed.",
    params(("id" = Uuid, Path, description = "Hunt ID")),
    request_body = UpdateHuntRequest,
    responses(
        (status = 200, description = "Hunt updated", body = Hunt),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "Hunt not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload))]
pub async fn update_hunt(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    AppJson(payload): AppJson<UpdateHuntRequest>,
) -> Result<Json<Hunt>, AppError> {
    Ok(Json(
        state
            .hunts
            .update_hunt_name(id, &payload.display_name)
            .await?,
    ))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Hunts",
    operation_id = "deleteHunt",
    summary = "Delete a hunt",
    description = "Deletes the hunt and all of its clues. Uploaded media is removed in the background; failures there are logged only.",
    params(("id" = Uuid, Path, description = "Hunt ID")),
    responses(
        (status = 204, description = "Hunt deleted"),
        (status = 404, description = "Hunt not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn delete_hunt(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    state.hunts.delete_hunt(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
