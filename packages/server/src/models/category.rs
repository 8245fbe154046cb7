use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entity::category;
use crate::error::AppError;
use crate::validation::FieldErrors;

use super::shared::{checked_slug, double_option, patch_text, patch_uuid, reorder_ids};

pub const NAME_MIN: usize = 2;
pub const NAME_MAX: usize = 255;
pub const SLUG_MIN: usize = 2;
pub const SLUG_MAX: usize = 100;
pub const DESCRIPTION_MAX: usize = 2000;

#[derive(Debug, Default, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCategoryRequest {
    /// Bulgarian display name, 2-255 characters.
    #[schema(example = "Спорт")]
    pub name_bg: Option<String>,
    #[schema(example = "Sport")]
    pub name_en: Option<String>,
    /// Derived from `nameBg` when omitted.
    #[schema(example = "sport")]
    pub slug: Option<String>,
    pub description: Option<String>,
    /// Top-level category to nest under.
    pub parent_id: Option<String>,
    #[schema(example = 0)]
    pub display_order: Option<i32>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct NewCategory {
    pub name_bg: String,
    pub name_en: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub parent_id: Option<Uuid>,
    pub display_order: i32,
    pub is_active: bool,
}

fn check_order(errors: &mut FieldErrors, order: Option<i32>) {
    if let Some(order) = order
        && order < 0
    {
        errors.push("displayOrder", "Display order must be >= 0");
    }
}

impl CreateCategoryRequest {
    pub fn validate(self) -> Result<NewCategory, AppError> {
        let mut errors = FieldErrors::new();
        let name_bg = errors.required_text("nameBg", "Name", self.name_bg.as_deref(), NAME_MIN, NAME_MAX);
        let name_en = errors.optional_text("nameEn", "English name", self.name_en.as_deref(), NAME_MAX);
        let slug = checked_slug(&mut errors, self.slug.as_deref(), SLUG_MIN, SLUG_MAX);
        let description =
            errors.optional_text("description", "Description", self.description.as_deref(), DESCRIPTION_MAX);
        let parent_id = match self.parent_id.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => errors.uuid("parentId", "Parent category", raw),
        };
        check_order(&mut errors, self.display_order);

        let Some(name_bg) = name_bg else {
            return Err(errors.into_error());
        };
        errors.finish(NewCategory {
            name_bg,
            name_en,
            slug,
            description,
            parent_id,
            display_order: self.display_order.unwrap_or(0),
            is_active: self.is_active.unwrap_or(true),
        })
    }
}

#[derive(Debug, Default, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCategoryRequest {
    pub name_bg: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub name_en: Option<Option<String>>,
    pub slug: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub description: Option<Option<String>>,
    /// `null` moves the category to the top level.
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub parent_id: Option<Option<String>>,
    pub display_order: Option<i32>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default)]
pub struct CategoryPatch {
    pub name_bg: Option<String>,
    pub name_en: Option<Option<String>>,
    pub slug: Option<String>,
    pub description: Option<Option<String>>,
    pub parent_id: Option<Option<Uuid>>,
    pub display_order: Option<i32>,
    pub is_active: Option<bool>,
}

impl UpdateCategoryRequest {
    pub fn validate(self) -> Result<CategoryPatch, AppError> {
        let mut errors = FieldErrors::new();
        let name_bg = self
            .name_bg
            .as_deref()
            .and_then(|n| errors.required_text("nameBg", "Name", Some(n), NAME_MIN, NAME_MAX));
        let name_en = patch_text(&mut errors, "nameEn", "English name", self.name_en, NAME_MAX);
        let slug = self
            .slug
            .as_deref()
            .and_then(|raw| checked_slug(&mut errors, Some(raw), SLUG_MIN, SLUG_MAX));
        let description =
            patch_text(&mut errors, "description", "Description", self.description, DESCRIPTION_MAX);
        let parent_id = patch_uuid(&mut errors, "parentId", "Parent category", self.parent_id);
        check_order(&mut errors, self.display_order);

        errors.finish(CategoryPatch {
            name_bg,
            name_en,
            slug,
            description,
            parent_id,
            display_order: self.display_order,
            is_active: self.is_active,
        })
    }
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReorderCategoriesRequest {
    /// Category ids in their new display order. Positions are assigned 0, 1, 2, ...
    pub category_ids: Vec<String>,
}

impl ReorderCategoriesRequest {
    pub fn validate(self) -> Result<Vec<Uuid>, AppError> {
        let mut errors = FieldErrors::new();
        let ids = reorder_ids(&mut errors, "categoryIds", &self.category_ids);
        errors.finish(ids)
    }
}

#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct CategoryListQuery {
    /// Include deactivated categories. Default: false.
    pub include_inactive: Option<bool>,
}

#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CategoryArticlesQuery {
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CategoryResponse {
    pub id: Uuid,
    #[schema(example = "sport")]
    pub slug: String,
    #[schema(example = "Спорт")]
    pub name_bg: String,
    pub name_en: Option<String>,
    pub description: Option<String>,
    pub parent_id: Option<Uuid>,
    pub display_order: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<category::Model> for CategoryResponse {
    fn from(m: category::Model) -> Self {
        Self {
            id: m.id,
            slug: m.slug,
            name_bg: m.name_bg,
            name_en: m.name_en,
            description: m.description,
            parent_id: m.parent_id,
            display_order: m.display_order,
            is_active: m.is_active,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct CategoryListResponse {
    pub categories: Vec<CategoryResponse>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct CategoryDetailResponse {
    pub category: CategoryResponse,
    pub subcategories: Vec<CategoryResponse>,
}
