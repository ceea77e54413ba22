use axum::routing::get;
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::handlers;
use crate::state::AppState;

pub fn routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .nest("/hunts", hunt_routes())
        .nest("/media", media_routes())
}

fn hunt_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            handlers::hunt::list_hunts,
            handlers::hunt::create_hunt
        ))
        .routes(routes!(handlers::hunt::lookup_hunts))
        .routes(routes!(
            handlers::hunt::get_hunt,
            handlers::hunt::update_hunt,
            handlers::hunt::delete_hunt
        ))
        .routes(routes!(handlers::events::hunt_events))
        .routes(routes!(handlers::print::print_hunt))
        .nest("/{id}/clues", clue_routes())
}

fn clue_routes() -> OpenApiRouter<AppState> {
    let crud = OpenApiRouter::new()
        .routes(routes!(
            handlers::clue::list_clues,
            handlers::clue::create_clue
        ))
        .routes(routes!(handlers::clue::reorder_clues))
        .routes(routes!(
            handlers::clue::get_clue,
            handlers::clue::update_clue,
            handlers::clue::delete_clue
        ))
        .layer(handlers::clue::clue_body_limit());

    let media = OpenApiRouter::new()
        .routes(routes!(
            handlers::media::upload_media,
            handlers::media::delete_media
        ))
        .layer(handlers::media::media_upload_body_limit());

    crud.merge(media)
}

/// Blob downloads are served outside the documented API.
fn media_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().route("/{*path}", get(handlers::media::get_media))
}
