use common::ArticleStatus;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "articles")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    #[sea_orm(unique)]
    pub slug: String,
    pub title: String,
    pub subtitle: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub excerpt: Option<String>,
    /// Rich HTML body.
    #[sea_orm(column_type = "Text")]
    pub content: String,

    pub status: ArticleStatus,
    #[sea_orm(default_value = false)]
    pub is_featured: bool,
    #[sea_orm(default_value = false)]
    pub is_breaking: bool,
    #[sea_orm(default_value = 0)]
    pub view_count: i64,
    /// Stamped on the first transition into `published`, never moved afterwards.
    pub published_at: Option<DateTimeUtc>,

    pub category_id: Option<Uuid>,
    #[sea_orm(belongs_to, from = "category_id", to = "id")]
    pub category: HasOne<super::category::Entity>,

    pub author_id: Option<Uuid>,
    #[sea_orm(belongs_to, from = "author_id", to = "id")]
    pub author: HasOne<super::user::Entity>,

    pub featured_image_id: Option<Uuid>,
    #[sea_orm(belongs_to, from = "featured_image_id", to = "id")]
    pub featured_image: HasOne<super::media::Entity>,

    #[sea_orm(has_many, via = "article_tag")]
    pub tags: HasMany<super::tag::Entity>,

    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
    /// JSON array of keyword strings.
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub meta_keywords: Option<Json>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
