use chrono::{DateTime, Utc};
use common::ArticleStatus;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entity::{article, category, media, tag, user};
use crate::error::AppError;
use crate::validation::FieldErrors;

use super::shared::{checked_slug, double_option, patch_text, patch_uuid};

pub const TITLE_MIN: usize = 5;
pub const TITLE_MAX: usize = 500;
pub const SUBTITLE_MAX: usize = 500;
pub const EXCERPT_MAX: usize = 1000;
pub const CONTENT_MIN: usize = 50;
pub const SLUG_MIN: usize = 2;
pub const SLUG_MAX: usize = 200;
pub const MAX_TAGS: usize = 20;
pub const TAG_MAX: usize = 100;
pub const META_TITLE_MAX: usize = 255;
pub const META_DESCRIPTION_MAX: usize = 500;
pub const MAX_META_KEYWORDS: usize = 20;

/// Request body for creating an article.
#[derive(Debug, Default, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateArticleRequest {
    /// Headline, 5-500 characters.
    #[schema(example = "Мач в Пазарджик")]
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub excerpt: Option<String>,
    /// Rich HTML body, at least 50 characters.
    pub content: Option<String>,
    /// Id of an existing category.
    pub category_id: Option<String>,
    /// Explicit slug. Derived from the title when omitted.
    #[schema(example = "mach-v-pazardzhik")]
    pub slug: Option<String>,
    /// `draft` (default), `published` or `archived`.
    #[schema(example = "draft")]
    pub status: Option<String>,
    pub is_featured: Option<bool>,
    pub is_breaking: Option<bool>,
    pub featured_image_id: Option<String>,
    /// Tag names, at most 20.
    #[schema(example = json!(["Пазарджик", "Спорт"]))]
    pub tags: Option<Vec<String>>,
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
    pub meta_keywords: Option<Vec<String>>,
}

/// A validated article ready to insert.
#[derive(Debug, Clone)]
pub struct NewArticle {
    pub title: String,
    pub subtitle: Option<String>,
    pub excerpt: Option<String>,
    pub content: String,
    pub category_id: Uuid,
    pub slug: Option<String>,
    pub status: ArticleStatus,
    pub is_featured: bool,
    pub is_breaking: bool,
    pub featured_image_id: Option<Uuid>,
    pub tags: Vec<String>,
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
    pub meta_keywords: Vec<String>,
}

impl CreateArticleRequest {
    pub fn validate(self) -> Result<NewArticle, AppError> {
        let mut errors = FieldErrors::new();

        let title = errors.required_text("title", "Title", self.title.as_deref(), TITLE_MIN, TITLE_MAX);
        let subtitle = errors.optional_text("subtitle", "Subtitle", self.subtitle.as_deref(), SUBTITLE_MAX);
        let excerpt = errors.optional_text("excerpt", "Excerpt", self.excerpt.as_deref(), EXCERPT_MAX);
        let content = errors.required_text(
            "content",
            "Content",
            self.content.as_deref(),
            CONTENT_MIN,
            usize::MAX,
        );
        let category_id = match self.category_id.as_deref().map(str::trim) {
            None | Some("") => {
                errors.push("categoryId", "Category is required");
                None
            }
            Some(raw) => errors.uuid("categoryId", "Category", raw),
        };
        let slug = checked_slug(&mut errors, self.slug.as_deref(), SLUG_MIN, SLUG_MAX);
        let status = match self.status.as_deref() {
            None => Some(ArticleStatus::default()),
            Some(raw) => errors.parse("status", raw.trim()),
        };
        let featured_image_id = match self.featured_image_id.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => errors.uuid("featuredImageId", "Featured image", raw),
        };
        let tags = errors.label_list("tags", "tags", self.tags.as_deref().unwrap_or_default(), MAX_TAGS, TAG_MAX);
        let meta_title = errors.optional_text("metaTitle", "Meta title", self.meta_title.as_deref(), META_TITLE_MAX);
        let meta_description = errors.optional_text(
            "metaDescription",
            "Meta description",
            self.meta_description.as_deref(),
            META_DESCRIPTION_MAX,
        );
        let meta_keywords = errors.label_list(
            "metaKeywords",
            "keywords",
            self.meta_keywords.as_deref().unwrap_or_default(),
            MAX_META_KEYWORDS,
            TAG_MAX,
        );

        match (title, content, category_id, status) {
            (Some(title), Some(content), Some(category_id), Some(status)) => errors.finish(NewArticle {
                title,
                subtitle,
                excerpt,
                content,
                category_id,
                slug,
                status,
                is_featured: self.is_featured.unwrap_or(false),
                is_breaking: self.is_breaking.unwrap_or(false),
                featured_image_id,
                tags,
                meta_title,
                meta_description,
                meta_keywords,
            }),
            _ => Err(errors.into_error()),
        }
    }
}

/// PATCH body for an article. Absent fields are left unchanged; nullable
/// fields accept `null` to clear them.
#[derive(Debug, Default, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateArticleRequest {
    pub title: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub subtitle: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub excerpt: Option<Option<String>>,
    pub content: Option<String>,
    pub category_id: Option<String>,
    pub slug: Option<String>,
    pub status: Option<String>,
    pub is_featured: Option<bool>,
    pub is_breaking: Option<bool>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub featured_image_id: Option<Option<String>>,
    /// Replaces the whole tag set when present.
    pub tags: Option<Vec<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub meta_title: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub meta_description: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<Vec<String>>)]
    pub meta_keywords: Option<Option<Vec<String>>>,
}

/// A validated partial update.
#[derive(Debug, Clone, Default)]
pub struct ArticlePatch {
    pub title: Option<String>,
    pub subtitle: Option<Option<String>>,
    pub excerpt: Option<Option<String>>,
    pub content: Option<String>,
    pub category_id: Option<Uuid>,
    pub slug: Option<String>,
    pub status: Option<ArticleStatus>,
    pub is_featured: Option<bool>,
    pub is_breaking: Option<bool>,
    pub featured_image_id: Option<Option<Uuid>>,
    pub tags: Option<Vec<String>>,
    pub meta_title: Option<Option<String>>,
    pub meta_description: Option<Option<String>>,
    pub meta_keywords: Option<Vec<String>>,
}

impl ArticlePatch {
    /// A patch that only moves the article to `status`.
    pub fn status(status: ArticleStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }
}

impl UpdateArticleRequest {
    pub fn validate(self) -> Result<ArticlePatch, AppError> {
        let mut errors = FieldErrors::new();

        let title = self
            .title
            .as_deref()
            .and_then(|t| errors.required_text("title", "Title", Some(t), TITLE_MIN, TITLE_MAX));
        let subtitle = patch_text(&mut errors, "subtitle", "Subtitle", self.subtitle, SUBTITLE_MAX);
        let excerpt = patch_text(&mut errors, "excerpt", "Excerpt", self.excerpt, EXCERPT_MAX);
        let content = self.content.as_deref().and_then(|c| {
            errors.required_text("content", "Content", Some(c), CONTENT_MIN, usize::MAX)
        });
        let category_id = self
            .category_id
            .as_deref()
            .and_then(|raw| errors.uuid("categoryId", "Category", raw));
        let slug = self
            .slug
            .as_deref()
            .and_then(|raw| checked_slug(&mut errors, Some(raw), SLUG_MIN, SLUG_MAX));
        let status = self
            .status
            .as_deref()
            .and_then(|raw| errors.parse("status", raw.trim()));
        let featured_image_id =
            patch_uuid(&mut errors, "featuredImageId", "Featured image", self.featured_image_id);
        let tags = self
            .tags
            .map(|tags| errors.label_list("tags", "tags", &tags, MAX_TAGS, TAG_MAX));
        let meta_title = patch_text(&mut errors, "metaTitle", "Meta title", self.meta_title, META_TITLE_MAX);
        let meta_description = patch_text(
            &mut errors,
            "metaDescription",
            "Meta description",
            self.meta_description,
            META_DESCRIPTION_MAX,
        );
        let meta_keywords = self.meta_keywords.map(|keywords| {
            errors.label_list(
                "metaKeywords",
                "keywords",
                keywords.as_deref().unwrap_or_default(),
                MAX_META_KEYWORDS,
                TAG_MAX,
            )
        });

        errors.finish(ArticlePatch {
            title,
            subtitle,
            excerpt,
            content,
            category_id,
            slug,
            status,
            is_featured: self.is_featured,
            is_breaking: self.is_breaking,
            featured_image_id,
            tags,
            meta_title,
            meta_description,
            meta_keywords,
        })
    }
}

/// Query parameters of the admin article list.
#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ArticleListQuery {
    /// `draft`, `published` or `archived`. Anonymous callers always get `published`.
    pub status: Option<String>,
    pub category_id: Option<Uuid>,
    /// Case-insensitive substring over title and excerpt.
    pub search: Option<String>,
    /// Page size, 1-100. Default: 20.
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

/// `?limit=` for feeds.
#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct FeedQuery {
    /// Number of articles, 1-100. Default: 10.
    pub limit: Option<u64>,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CategorySummary {
    pub id: Uuid,
    #[schema(example = "sport")]
    pub slug: String,
    #[schema(example = "Спорт")]
    pub name_bg: String,
    pub name_en: Option<String>,
}

impl From<&category::Model> for CategorySummary {
    fn from(m: &category::Model) -> Self {
        Self {
            id: m.id,
            slug: m.slug.clone(),
            name_bg: m.name_bg.clone(),
            name_en: m.name_en.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthorSummary {
    pub id: Uuid,
    pub full_name: String,
    pub avatar_url: Option<String>,
}

impl From<&user::Model> for AuthorSummary {
    fn from(m: &user::Model) -> Self {
        Self {
            id: m.id,
            full_name: m.full_name.clone(),
            avatar_url: m.avatar_url.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImageSummary {
    pub id: Uuid,
    pub url: String,
    pub width: i32,
    pub height: i32,
    pub alt_text: Option<String>,
    pub caption: Option<String>,
}

impl From<&media::Model> for ImageSummary {
    fn from(m: &media::Model) -> Self {
        Self {
            id: m.id,
            url: m.public_url.clone(),
            width: m.width,
            height: m.height,
            alt_text: m.alt_text.clone(),
            caption: m.caption.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct TagResponse {
    pub id: Uuid,
    #[schema(example = "pazardzhik")]
    pub slug: String,
    #[schema(example = "Пазарджик")]
    pub name: String,
}

impl From<tag::Model> for TagResponse {
    fn from(m: tag::Model) -> Self {
        Self {
            id: m.id,
            slug: m.slug,
            name: m.name,
        }
    }
}

/// Article card used by lists and feeds; no body.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ArticleSummary {
    pub id: Uuid,
    pub slug: String,
    pub title: String,
    pub subtitle: Option<String>,
    pub excerpt: Option<String>,
    pub status: ArticleStatus,
    pub is_featured: bool,
    pub is_breaking: bool,
    pub view_count: i64,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub category: Option<CategorySummary>,
    pub author: Option<AuthorSummary>,
    pub featured_image: Option<ImageSummary>,
}

/// Full article.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ArticleResponse {
    pub id: Uuid,
    pub slug: String,
    pub title: String,
    pub subtitle: Option<String>,
    pub excerpt: Option<String>,
    pub content: String,
    pub status: ArticleStatus,
    pub is_featured: bool,
    pub is_breaking: bool,
    pub view_count: i64,
    pub published_at: Option<DateTime<Utc>>,
    pub category_id: Option<Uuid>,
    pub author_id: Option<Uuid>,
    pub featured_image_id: Option<Uuid>,
    pub category: Option<CategorySummary>,
    pub author: Option<AuthorSummary>,
    pub featured_image: Option<ImageSummary>,
    pub tags: Vec<TagResponse>,
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
    pub meta_keywords: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Up to three newer-first published articles from the same category.
    /// Only present on the public page read.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub related_articles: Option<Vec<ArticleSummary>>,
}

/// Related rows an article refers to, loaded separately.
#[derive(Debug, Default)]
pub struct ArticleRelations<'a> {
    pub category: Option<&'a category::Model>,
    pub author: Option<&'a user::Model>,
    pub featured_image: Option<&'a media::Model>,
}

impl ArticleSummary {
    pub fn build(m: article::Model, rel: ArticleRelations<'_>) -> Self {
        Self {
            id: m.id,
            slug: m.slug,
            title: m.title,
            subtitle: m.subtitle,
            excerpt: m.excerpt,
            status: m.status,
            is_featured: m.is_featured,
            is_breaking: m.is_breaking,
            view_count: m.view_count,
            published_at: m.published_at,
            created_at: m.created_at,
            category: rel.category.map(CategorySummary::from),
            author: rel.author.map(AuthorSummary::from),
            featured_image: rel.featured_image.map(ImageSummary::from),
        }
    }
}

impl ArticleResponse {
    pub fn build(m: article::Model, rel: ArticleRelations<'_>, tags: Vec<tag::Model>) -> Self {
        let meta_keywords = m
            .meta_keywords
            .as_ref()
            .and_then(|v| serde_json::from_value::<Vec<String>>(v.clone()).ok())
            .unwrap_or_default();
        Self {
            id: m.id,
            slug: m.slug,
            title: m.title,
            subtitle: m.subtitle,
            excerpt: m.excerpt,
            content: m.content,
            status: m.status,
            is_featured: m.is_featured,
            is_breaking: m.is_breaking,
            view_count: m.view_count,
            published_at: m.published_at,
            category_id: m.category_id,
            author_id: m.author_id,
            featured_image_id: m.featured_image_id,
            category: rel.category.map(CategorySummary::from),
            author: rel.author.map(AuthorSummary::from),
            featured_image: rel.featured_image.map(ImageSummary::from),
            tags: tags.into_iter().map(TagResponse::from).collect(),
            meta_title: m.meta_title,
            meta_description: m.meta_description,
            meta_keywords,
            created_at: m.created_at,
            updated_at: m.updated_at,
            related_articles: None,
        }
    }
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ArticleListResponse {
    pub data: Vec<ArticleSummary>,
    /// Total rows matching the filters.
    pub count: u64,
    pub has_more: bool,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct FeedResponse {
    pub articles: Vec<ArticleSummary>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct CategoryArticlesResponse {
    pub articles: Vec<ArticleSummary>,
    pub total: u64,
}
