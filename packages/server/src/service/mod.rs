//! Domain operations on hunts and clues.
//!
//! Every mutation commits before publishing a [`Change`], so subscribers
//! re-reading after a notification always observe the write.

mod clues;
mod hunts;
mod media;
mod subscribe;

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use common::storage::BlobStore;
use common::{Clue, Hunt, MediaType};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use tokio_util::task::TaskTracker;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::entity::{clue, hunt};
use crate::error::AppError;
use crate::feed::{Change, ChangeFeed};

pub use media::MediaUpload;

/// Hunt and clue operations over the document store, the blob store and
/// the change feed.
#[derive(Clone)]
pub struct HuntService {
    db: DatabaseConnection,
    blob_store: Arc<dyn BlobStore>,
    feed: ChangeFeed,
    tasks: TaskTracker,
}

impl HuntService {
    pub fn new(db: DatabaseConnection, blob_store: Arc<dyn BlobStore>, feed: ChangeFeed) -> Self {
        Self {
            db,
            blob_store,
            feed,
            tasks: TaskTracker::new(),
        }
    }

    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }

    pub fn blob_store(&self) -> &Arc<dyn BlobStore> {
        &self.blob_store
    }

    pub fn feed(&self) -> &ChangeFeed {
        &self.feed
    }

    /// Wait for detached blob cleanups started so far.
    ///
    /// The tracker is reopened afterwards, so the service stays usable.
    pub async fn drain_background_tasks(&self) {
        self.tasks.close();
        self.tasks.wait().await;
        self.tasks.reopen();
    }

    fn publish(&self, change: Change) {
        debug!(?change, "Publishing change");
        self.feed.publish(change);
    }

    /// Best-effort removal of blobs no longer referenced by any clue.
    ///
    /// Failures are logged and never reach the caller; an orphaned blob is
    /// acceptable.
    fn delete_blobs_in_background(&self, paths: Vec<String>, prefix: Option<String>) {
        if paths.is_empty() && prefix.is_none() {
            return;
        }

        let store = self.blob_store.clone();
        self.tasks.spawn(async move {
            for path in paths {
                match store.delete(&path).await {
                    Ok(true) => debug!(path = %path, "Deleted media blob"),
                    Ok(false) => debug!(path = %path, "Media blob already gone"),
                    Err(e) => warn!(path = %path, error = %e, "Failed to delete media blob"),
                }
            }
            if let Some(prefix) = prefix {
                match store.delete_prefix(&prefix).await {
                    Ok(0) => {}
                    Ok(removed) => debug!(prefix = %prefix, removed, "Swept leftover media blobs"),
                    Err(e) => warn!(prefix = %prefix, error = %e, "Failed to sweep media blobs"),
                }
            }
        });
    }
}

fn clue_from_model(m: clue::Model) -> Clue {
    let media_type = m.media_type.as_deref().and_then(|raw| match raw.parse::<MediaType>() {
        Ok(media_type) => Some(media_type),
        Err(e) => {
            warn!(clue_id = %m.id, error = %e, "Ignoring unknown media type");
            None
        }
    });

    Clue {
        id: m.id,
        hunt_id: m.hunt_id,
        text: m.text,
        hint: m.hint,
        media_url: m.media_url,
        media_type,
        created_at: m.created_at,
        updated_at: m.updated_at,
    }
}

fn hunt_from_model(m: hunt::Model, clues: Vec<Clue>) -> Hunt {
    Hunt {
        id: m.id,
        display_name: m.display_name,
        clues,
        created_at: m.created_at,
        updated_at: m.updated_at,
    }
}

async fn find_hunt<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<hunt::Model, AppError> {
    hunt::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Hunt not found".into()))
}

/// `find_hunt` for use inside a transaction that rewrites the hunt's clues.
///
/// Takes a row lock on backends that support `FOR UPDATE`, so concurrent
/// clue mutations of one hunt run one after another. SQLite ignores the
/// clause; its pool has a single connection instead.
async fn lock_hunt<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<hunt::Model, AppError> {
    hunt::Entity::find_by_id(id)
        .lock_exclusive()
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Hunt not found".into()))
}

async fn find_clue_for_hunt<C: ConnectionTrait>(
    db: &C,
    hunt_id: Uuid,
    clue_id: Uuid,
) -> Result<clue::Model, AppError> {
    let clue = clue::Entity::find_by_id(clue_id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Clue not found".into()))?;

    if clue.hunt_id != hunt_id {
        return Err(AppError::NotFound("Clue not found".into()));
    }

    Ok(clue)
}

/// Clue rows of a hunt in hunt order.
async fn clue_models<C: ConnectionTrait>(
    db: &C,
    hunt_id: Uuid,
) -> Result<Vec<clue::Model>, AppError> {
    Ok(clue::Entity::find()
        .filter(clue::Column::HuntId.eq(hunt_id))
        .order_by_asc(clue::Column::Position)
        .order_by_asc(clue::Column::CreatedAt)
        .all(db)
        .await?)
}

async fn load_clues<C: ConnectionTrait>(db: &C, hunt_id: Uuid) -> Result<Vec<Clue>, AppError> {
    Ok(clue_models(db, hunt_id)
        .await?
        .into_iter()
        .map(clue_from_model)
        .collect())
}

async fn load_hunt<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<Option<Hunt>, AppError> {
    let Some(model) = hunt::Entity::find_by_id(id).one(db).await? else {
        return Ok(None);
    };
    let clues = load_clues(db, id).await?;
    Ok(Some(hunt_from_model(model, clues)))
}

/// Attach clues to already-loaded hunt rows with a single query.
async fn load_hunts<C: ConnectionTrait>(
    db: &C,
    models: Vec<hunt::Model>,
) -> Result<Vec<Hunt>, AppError> {
    if models.is_empty() {
        return Ok(Vec::new());
    }

    let ids: Vec<Uuid> = models.iter().map(|m| m.id).collect();
    let mut by_hunt: HashMap<Uuid, Vec<Clue>> = HashMap::new();
    for clue in clue::Entity::find()
        .filter(clue::Column::HuntId.is_in(ids))
        .order_by_asc(clue::Column::Position)
        .order_by_asc(clue::Column::CreatedAt)
        .all(db)
        .await?
    {
        by_hunt
            .entry(clue.hunt_id)
            .or_default()
            .push(clue_from_model(clue));
    }

    Ok(models
        .into_iter()
        .map(|m| {
            let clues = by_hunt.remove(&m.id).unwrap_or_default();
            hunt_from_model(m, clues)
        })
        .collect())
}

/// Compute the next position for a new clue in a hunt.
async fn next_position<C: ConnectionTrait>(db: &C, hunt_id: Uuid) -> Result<i32, AppError> {
    let max_pos: Option<i32> = clue::Entity::find()
        .filter(clue::Column::HuntId.eq(hunt_id))
        .select_only()
        .column_as(clue::Column::Position.max(), "max_pos")
        .into_tuple::<Option<i32>>()
        .one(db)
        .await?
        .flatten();
    max_pos
        .unwrap_or(-1)
        .checked_add(1)
        .ok_or_else(|| AppError::Validation("Position overflow".into()))
}

/// Bump the hunt's `updated_at` after a clue change.
async fn touch_hunt<C: ConnectionTrait>(db: &C, hunt: hunt::Model) -> Result<(), AppError> {
    let mut active: hunt::ActiveModel = hunt.into();
    active.updated_at = Set(Utc::now());
    active.update(db).await?;
    Ok(())
}
