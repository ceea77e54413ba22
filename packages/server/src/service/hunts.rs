use chrono::Utc;
use common::media::hunt_media_prefix;
use common::{Hunt, HuntLookup};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use tracing::{info, instrument};
use uuid::Uuid;

use super::{
    HuntService, clue_models, find_hunt, hunt_from_model, load_hunt, load_hunts, lock_hunt,
};
use crate::entity::{clue, hunt};
use crate::error::AppError;
use crate::feed::Change;

impl HuntService {
    /// Insert a hunt with no clues. Empty names are allowed.
    #[instrument(skip(self))]
    pub async fn create_hunt(&self, display_name: &str) -> Result<Hunt, AppError> {
        let now = Utc::now();
        let model = hunt::ActiveModel {
            id: Set(Uuid::now_v7()),
            display_name: Set(display_name.to_string()),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.db)
        .await?;

        info!(hunt_id = %model.id, "Created hunt");
        self.publish(Change::HuntUpdated(model.id));
        Ok(hunt_from_model(model, Vec::new()))
    }

    /// One-shot read. `None` once the hunt is deleted.
    pub async fn get_hunt(&self, id: Uuid) -> Result<Option<Hunt>, AppError> {
        load_hunt(&self.db, id).await
    }

    /// Every hunt, newest first.
    pub async fn list_hunts(&self) -> Result<Vec<Hunt>, AppError> {
        let models = hunt::Entity::find()
            .order_by_desc(hunt::Column::CreatedAt)
            .order_by_desc(hunt::Column::Id)
            .all(&self.db)
            .await?;
        load_hunts(&self.db, models).await
    }

    /// Resolve IDs against the store, keeping the requested order.
    ///
    /// Duplicate IDs resolve once.
    pub async fn lookup_hunts(&self, ids: &[Uuid]) -> Result<HuntLookup, AppError> {
        if ids.is_empty() {
            return Ok(HuntLookup::default());
        }

        let models = hunt::Entity::find()
            .filter(hunt::Column::Id.is_in(ids.to_vec()))
            .all(&self.db)
            .await?;
        let mut found = load_hunts(&self.db, models).await?;

        let mut lookup = HuntLookup::default();
        for &id in ids {
            if let Some(index) = found.iter().position(|hunt| hunt.id == id) {
                lookup.hunts.push(found.swap_remove(index));
            } else if !lookup.missing.contains(&id) && !lookup.hunts.iter().any(|h| h.id == id) {
                lookup.missing.push(id);
            }
        }
        Ok(lookup)
    }

    /// Overwrite the display name. No uniqueness or non-empty rule applies.
    #[instrument(skip(self))]
    pub async fn update_hunt_name(&self, id: Uuid, display_name: &str) -> Result<Hunt, AppError> {
        let existing = find_hunt(&self.db, id).await?;
        let mut active: hunt::ActiveModel = existing.into();
        active.display_name = Set(display_name.to_string());
        active.updated_at = Set(Utc::now());
        active.update(&self.db).await?;

        self.publish(Change::HuntUpdated(id));
        load_hunt(&self.db, id)
            .await?
            .ok_or_else(|| AppError::NotFound("Hunt not found".into()))
    }

    /// Delete the hunt and its clues, then best-effort delete their media.
    #[instrument(skip(self))]
    pub async fn delete_hunt(&self, id: Uuid) -> Result<(), AppError> {
        let txn = self.db.begin().await?;
        lock_hunt(&txn, id).await?;

        let media: Vec<String> = clue_models(&txn, id)
            .await?
            .into_iter()
            .filter_map(|m| super::clue_from_model(m).stored_media_path().map(str::to_string))
            .collect();

        clue::Entity::delete_many()
            .filter(clue::Column::HuntId.eq(id))
            .exec(&txn)
            .await?;
        hunt::Entity::delete_by_id(id).exec(&txn).await?;
        txn.commit().await?;

        info!(hunt_id = %id, media = media.len(), "Deleted hunt");
        self.publish(Change::HuntDeleted(id));
        self.delete_blobs_in_background(media, Some(hunt_media_prefix(id)));
        Ok(())
    }
}
