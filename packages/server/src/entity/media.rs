use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "media")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Last segment of `storage_key`.
    pub file_name: String,
    /// Name the client uploaded the file under.
    pub original_name: String,
    #[sea_orm(unique)]
    pub storage_key: String,
    pub public_url: String,
    /// Always `image/webp` after processing.
    pub mime_type: String,
    pub file_size: i64,
    pub width: i32,
    pub height: i32,
    pub alt_text: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub caption: Option<String>,

    pub uploaded_by: Option<Uuid>,
    #[sea_orm(belongs_to, from = "uploaded_by", to = "id")]
    pub uploader: HasOne<super::user::Entity>,

    #[sea_orm(has_many)]
    pub featured_in: HasMany<super::article::Entity>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
