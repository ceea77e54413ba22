use axum::extract::{Path, State};
use axum::response::Html;
use tracing::instrument;
use uuid::Uuid;

use crate::error::{AppError, ErrorBody};
use crate::print::{render_sheet, scan_points};
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/{id}/print",
    tag = "Hunts",
    operation_id = "printHunt",
    summary = "Printable QR sheet",
    description = "Returns an A4 HTML page with one QR code per scan point. \
        The starting code is labelled ★ and leads to the first clue; code `n` leads to clue `n + 1`, the last one to the completion page. \
        Links are built against `server.public_url`.",
    params(("id" = Uuid, Path, description = "Hunt ID")),
    responses(
        (status = 200, description = "Printable sheet", content_type = "text/html", body = String),
        (status = 404, description = "Hunt not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn print_hunt(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Html<String>, AppError> {
    let hunt = state
        .hunts
        .get_hunt(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Hunt not found".into()))?;

    let points = scan_points(&hunt, &state.config.server.public_url);
    Ok(Html(render_sheet(
        &hunt,
        &points,
        &state.config.print.qr_image_url,
    )))
}
