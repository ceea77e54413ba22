use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "clue")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub hunt_id: Uuid,
    #[sea_orm(belongs_to, from = "hunt_id", to = "id")]
    pub hunt: HasOne<super::hunt::Entity>,

    /// 0-based place in the hunt; the only source of clue order.
    pub position: i32,

    #[sea_orm(column_type = "Text")]
    pub text: String,
    #[sea_orm(column_type = "Text")]
    pub hint: String,

    /// Blob store path or legacy absolute URL.
    pub media_url: Option<String>,
    /// `image` or `video`; set together with `media_url`.
    pub media_type: Option<String>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
