use std::convert::Infallible;

use axum::extract::{Path, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use common::Hunt;
use futures::Stream;
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use crate::error::{AppError, ErrorBody};
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/{id}/events",
    tag = "Hunts",
    operation_id = "huntEvents",
    summary = "Stream live hunt snapshots",
    description = "Server-Sent Events. Each `hunt` event carries the full hunt as JSON, starting with the current state. \
        When the hunt is deleted a single `deleted` event is sent and the stream ends.",
    params(("id" = Uuid, Path, description = "Hunt ID")),
    responses(
        (status = 200, description = "Event stream", content_type = "text/event-stream"),
        (status = 404, description = "Hunt not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn hunt_events(
    State(state): State<AppState>,
    Path(hunt_id): Path<Uuid>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    if state.hunts.get_hunt(hunt_id).await?.is_none() {
        return Err(AppError::NotFound("Hunt not found".into()));
    }

    let (tx, rx) = mpsc::unbounded_channel::<Option<Hunt>>();
    let subscription = state
        .hunts
        .subscribe_to_hunt(hunt_id, move |snapshot| {
            let _ = tx.send(snapshot);
        })
        .await?;

    // The stream owns the subscription; a disconnecting client drops both.
    // `None` marks a stream that has already reported the deletion.
    let stream = futures::stream::unfold(
        (rx, Some(subscription)),
        move |(mut rx, subscription)| async move {
            let subscription = subscription?;
            loop {
                match rx.recv().await? {
                    Some(hunt) => {
                        if let Some(event) = snapshot_event(hunt.id, &hunt) {
                            return Some((Ok::<_, Infallible>(event), (rx, Some(subscription))));
                        }
                    }
                    None => {
                        debug!(%hunt_id, "Hunt deleted; closing event stream");
                        subscription.cancel();
                        let event = Event::default().event("deleted").data(hunt_id.to_string());
                        return Some((Ok(event), (rx, None)));
                    }
                }
            }
        },
    );

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

/// A `hunt` event carrying `snapshot` as JSON.
///
/// A snapshot that fails to encode is logged and skipped; the stream goes on
/// with the next one.
fn snapshot_event<T: Serialize>(hunt_id: Uuid, snapshot: &T) -> Option<Event> {
    match Event::default().event("hunt").json_data(snapshot) {
        Ok(event) => Some(event),
        Err(e) => {
            warn!(%hunt_id, error = %e, "Skipping hunt snapshot that failed to encode");
            None
        }
    }
}
