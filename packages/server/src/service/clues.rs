use std::collections::HashSet;

use chrono::Utc;
use common::media::MediaRef;
use common::storage::validate_blob_path;
use common::{Clue, ClueUpdate, ClueView};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set, TransactionTrait,
    sea_query::Expr,
};
use tracing::{info, instrument};
use uuid::Uuid;

use super::{
    HuntService, clue_from_model, clue_models, find_clue_for_hunt, find_hunt, load_clues,
    load_hunt, lock_hunt, next_position, touch_hunt,
};
use crate::entity::clue;
use crate::error::AppError;
use crate::feed::Change;
use crate::models::shared::validate_reorder_ids;

impl HuntService {
    /// Clues of a hunt in hunt order.
    pub async fn list_clues(&self, hunt_id: Uuid) -> Result<Vec<Clue>, AppError> {
        find_hunt(&self.db, hunt_id).await?;
        load_clues(&self.db, hunt_id).await
    }

    /// Player view of one clue: its step number and whether it is the last.
    pub async fn get_clue(&self, hunt_id: Uuid, clue_id: Uuid) -> Result<ClueView, AppError> {
        let hunt = load_hunt(&self.db, hunt_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Hunt not found".into()))?;

        let total = hunt.clues.len();
        let index = hunt
            .clues
            .iter()
            .position(|clue| clue.id == clue_id)
            .ok_or_else(|| AppError::NotFound("Clue not found".into()))?;
        let hunt_name = hunt.title().to_string();
        let clue = hunt.clues.into_iter().nth(index).ok_or_else(|| {
            AppError::Internal(format!("clue {clue_id} vanished from loaded hunt"))
        })?;

        Ok(ClueView {
            hunt_id,
            hunt_name,
            clue,
            step: index + 1,
            total,
            is_last: index + 1 == total,
        })
    }

    /// Append a blank clue at the end of the hunt.
    #[instrument(skip(self))]
    pub async fn create_clue(&self, hunt_id: Uuid) -> Result<Clue, AppError> {
        let txn = self.db.begin().await?;
        let hunt = lock_hunt(&txn, hunt_id).await?;

        let now = Utc::now();
        let position = next_position(&txn, hunt_id).await?;
        let model = clue::ActiveModel {
            id: Set(Uuid::now_v7()),
            hunt_id: Set(hunt_id),
            position: Set(position),
            text: Set(String::new()),
            hint: Set(String::new()),
            media_url: Set(None),
            media_type: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        touch_hunt(&txn, hunt).await?;
        txn.commit().await?;

        info!(hunt_id = %hunt_id, clue_id = %model.id, position, "Created clue");
        self.publish(Change::CluesUpdated(hunt_id));
        Ok(clue_from_model(model))
    }

    /// Merge only the supplied fields into the clue.
    ///
    /// Only the supplied columns are written, so concurrent edits to
    /// different fields never overwrite each other.
    #[instrument(skip(self, update))]
    pub async fn update_clue(
        &self,
        hunt_id: Uuid,
        clue_id: Uuid,
        update: ClueUpdate,
    ) -> Result<Clue, AppError> {
        if let Some(Some(url)) = &update.media_url {
            validate_media_url(url)?;
        }

        if update.is_empty() {
            let existing = find_clue_for_hunt(&self.db, hunt_id, clue_id).await?;
            return Ok(clue_from_model(existing));
        }

        let hunt = find_hunt(&self.db, hunt_id).await?;
        let existing = find_clue_for_hunt(&self.db, hunt_id, clue_id).await?;
        let mut active: clue::ActiveModel = existing.into();

        if let Some(text) = update.text {
            active.text = Set(text);
        }
        if let Some(hint) = update.hint {
            active.hint = Set(hint);
        }
        if let Some(media_url) = update.media_url {
            active.media_url = Set(media_url.filter(|url| !url.trim().is_empty()));
        }
        if let Some(media_type) = update.media_type {
            active.media_type = Set(media_type.map(|t| t.as_str().to_string()));
        }
        active.updated_at = Set(Utc::now());

        let model = active.update(&self.db).await?;
        touch_hunt(&self.db, hunt).await?;

        self.publish(Change::CluesUpdated(hunt_id));
        Ok(clue_from_model(model))
    }

    /// Remove the clue, close the gap in positions and best-effort delete
    /// its stored media.
    #[instrument(skip(self))]
    pub async fn delete_clue(&self, hunt_id: Uuid, clue_id: Uuid) -> Result<(), AppError> {
        let txn = self.db.begin().await?;
        let hunt = lock_hunt(&txn, hunt_id).await?;
        let existing = find_clue_for_hunt(&txn, hunt_id, clue_id).await?;
        let media = clue_from_model(existing)
            .stored_media_path()
            .map(str::to_string);

        clue::Entity::delete_by_id(clue_id).exec(&txn).await?;

        for (i, remaining) in clue_models(&txn, hunt_id).await?.into_iter().enumerate() {
            let position = i as i32;
            if remaining.position != position {
                clue::Entity::update_many()
                    .col_expr(clue::Column::Position, Expr::value(position))
                    .filter(clue::Column::Id.eq(remaining.id))
                    .exec(&txn)
                    .await?;
            }
        }
        touch_hunt(&txn, hunt).await?;
        txn.commit().await?;

        info!(hunt_id = %hunt_id, clue_id = %clue_id, "Deleted clue");
        self.publish(Change::CluesUpdated(hunt_id));
        self.delete_blobs_in_background(media.into_iter().collect(), None);
        Ok(())
    }

    /// Persist a new clue order.
    ///
    /// `clue_ids` must name every clue of the hunt exactly once.
    #[instrument(skip(self, clue_ids), fields(count = clue_ids.len()))]
    pub async fn update_clue_order(
        &self,
        hunt_id: Uuid,
        clue_ids: &[Uuid],
    ) -> Result<Vec<Clue>, AppError> {
        validate_reorder_ids(clue_ids, "clue_id")?;

        let txn = self.db.begin().await?;
        let hunt = lock_hunt(&txn, hunt_id).await?;

        let existing: HashSet<Uuid> = clue_models(&txn, hunt_id)
            .await?
            .into_iter()
            .map(|m| m.id)
            .collect();
        let requested: HashSet<Uuid> = clue_ids.iter().copied().collect();
        if existing != requested {
            return Err(AppError::Validation(
                "clue_ids must contain exactly the clues currently in the hunt".into(),
            ));
        }

        for (i, &clue_id) in clue_ids.iter().enumerate() {
            clue::Entity::update_many()
                .col_expr(clue::Column::Position, Expr::value(i as i32))
                .filter(clue::Column::Id.eq(clue_id))
                .exec(&txn)
                .await?;
        }
        touch_hunt(&txn, hunt).await?;
        txn.commit().await?;

        self.publish(Change::CluesUpdated(hunt_id));
        load_clues(&self.db, hunt_id).await
    }
}

/// Stored media must be a valid blob path; legacy absolute URLs pass as-is.
fn validate_media_url(url: &str) -> Result<(), AppError> {
    match MediaRef::parse(url) {
        MediaRef::External(_) => Ok(()),
        MediaRef::Stored(path) if path.trim().is_empty() => Ok(()),
        MediaRef::Stored(path) => validate_blob_path(path)
            .map(|_| ())
            .map_err(|e| AppError::Validation(format!("media_url: {e}"))),
    }
}
