use std::collections::HashSet;

use chrono::Utc;
use common::slug::slugify;
use sea_orm::prelude::Expr;
use sea_orm::*;
use tracing::instrument;
use uuid::Uuid;

use crate::cache::{queries, tags};
use crate::entity::{article, category};
use crate::error::AppError;
use crate::models::article::CategoryArticlesResponse;
use crate::models::category::*;
use crate::models::shared::Page;
use crate::validation::FieldErrors;

use super::Services;
use super::policy::{Action, Actor};

fn slug_taken(slug: &str) -> String {
    format!("A category with slug '{slug}' already exists")
}

pub async fn find<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<category::Model, AppError> {
    category::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Category {id} not found")))
}

async fn ensure_slug_free<C: ConnectionTrait>(
    db: &C,
    slug: &str,
    except: Option<Uuid>,
) -> Result<(), AppError> {
    let mut query = category::Entity::find().filter(category::Column::Slug.eq(slug));
    if let Some(id) = except {
        query = query.filter(category::Column::Id.ne(id));
    }
    if query.count(db).await? > 0 {
        return Err(AppError::Conflict(slug_taken(slug)));
    }
    Ok(())
}

/// Nesting is one level deep: a parent must exist, differ from the child and
/// be top-level itself.
async fn check_parent<C: ConnectionTrait>(
    db: &C,
    parent_id: Uuid,
    child_id: Option<Uuid>,
) -> Result<(), AppError> {
    let mut errors = FieldErrors::new();
    if child_id == Some(parent_id) {
        errors.push("parentId", "A category cannot be its own parent");
        return Err(errors.into_error());
    }
    match category::Entity::find_by_id(parent_id).one(db).await? {
        None => errors.push("parentId", "Parent category does not exist"),
        Some(parent) if parent.parent_id.is_some() => {
            errors.push("parentId", "Parent category must be a top-level category")
        }
        Some(_) => {}
    }
    if let Some(child_id) = child_id {
        let has_children = category::Entity::find()
            .filter(category::Column::ParentId.eq(child_id))
            .count(db)
            .await?
            > 0;
        if has_children {
            errors.push("parentId", "A category with subcategories cannot be nested");
        }
    }
    errors.finish(())
}

fn derived_slug(name: &str) -> Result<String, AppError> {
    let slug = slugify(name);
    if slug.chars().count() < SLUG_MIN {
        let mut errors = FieldErrors::new();
        errors.push("slug", "The name does not produce a usable slug; provide one");
        return Err(errors.into_error());
    }
    Ok(slug)
}

fn invalidate(svc: Services<'_>, id: Uuid) {
    svc.cache
        .invalidate(&[tags::CATEGORIES.to_string(), tags::category(id)]);
}

/// Categories in display order; inactive ones only on request.
pub async fn list(svc: Services<'_>, include_inactive: bool) -> Result<Vec<CategoryResponse>, AppError> {
    if !include_inactive {
        return queries::active_categories(svc).await;
    }
    Ok(category::Entity::find()
        .order_by_asc(category::Column::DisplayOrder)
        .order_by_asc(category::Column::NameBg)
        .all(svc.db)
        .await?
        .into_iter()
        .map(CategoryResponse::from)
        .collect())
}

pub async fn get(svc: Services<'_>, id: Uuid) -> Result<CategoryResponse, AppError> {
    queries::category_by_id(svc, id)
        .await?
        .map(CategoryResponse::from)
        .ok_or_else(|| AppError::NotFound(format!("Category {id} not found")))
}

/// Active category by slug with its active subcategories.
pub async fn get_by_slug(svc: Services<'_>, slug: &str) -> Result<CategoryDetailResponse, AppError> {
    let category = active_by_slug(svc, slug).await?;
    let subcategories = category::Entity::find()
        .filter(category::Column::ParentId.eq(category.id))
        .filter(category::Column::IsActive.eq(true))
        .order_by_asc(category::Column::DisplayOrder)
        .all(svc.db)
        .await?
        .into_iter()
        .map(CategoryResponse::from)
        .collect();
    Ok(CategoryDetailResponse {
        category: category.into(),
        subcategories,
    })
}

pub async fn active_by_slug(svc: Services<'_>, slug: &str) -> Result<category::Model, AppError> {
    queries::category_by_slug(svc, slug)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Category '{slug}' not found")))
}

/// One page of an active category's published articles plus the total.
pub async fn articles_by_slug(
    svc: Services<'_>,
    slug: &str,
    page: Page,
) -> Result<CategoryArticlesResponse, AppError> {
    let category = active_by_slug(svc, slug).await?;
    let articles = queries::category_articles(svc, category.id, page.limit, page.offset).await?;
    let total = queries::category_article_count(svc, category.id).await?;
    Ok(CategoryArticlesResponse { articles, total })
}

#[instrument(skip(svc, input), fields(actor = %actor.id, name = %input.name_bg))]
pub async fn create(
    svc: Services<'_>,
    actor: &Actor,
    input: NewCategory,
) -> Result<CategoryResponse, AppError> {
    actor.require(Action::ManageCategories)?;

    let slug = match input.slug {
        Some(slug) => slug,
        None => derived_slug(&input.name_bg)?,
    };
    ensure_slug_free(svc.db, &slug, None).await?;
    if let Some(parent_id) = input.parent_id {
        check_parent(svc.db, parent_id, None).await?;
    }

    let now = Utc::now();
    let model = category::ActiveModel {
        id: Set(Uuid::now_v7()),
        slug: Set(slug.clone()),
        name_bg: Set(input.name_bg),
        name_en: Set(input.name_en),
        description: Set(input.description),
        parent_id: Set(input.parent_id),
        display_order: Set(input.display_order),
        is_active: Set(input.is_active),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(svc.db)
    .await
    .map_err(|e| AppError::from_constraint(e, || slug_taken(&slug)))?;

    tracing::info!(category_id = %model.id, slug = %model.slug, "category created");
    invalidate(svc, model.id);
    Ok(model.into())
}

#[instrument(skip(svc, patch), fields(actor = %actor.id))]
pub async fn update(
    svc: Services<'_>,
    actor: &Actor,
    id: Uuid,
    patch: CategoryPatch,
) -> Result<CategoryResponse, AppError> {
    actor.require(Action::ManageCategories)?;
    let existing = find(svc.db, id).await?;

    let new_slug = match (&patch.slug, &patch.name_bg) {
        (Some(slug), _) => Some(slug.clone()),
        (None, Some(name)) => Some(derived_slug(name)?),
        _ => None,
    }
    .filter(|s| *s != existing.slug);
    if let Some(slug) = &new_slug {
        ensure_slug_free(svc.db, slug, Some(id)).await?;
    }
    if let Some(Some(parent_id)) = patch.parent_id {
        check_parent(svc.db, parent_id, Some(id)).await?;
    }

    let mut active: category::ActiveModel = existing.clone().into();
    if let Some(slug) = new_slug.clone() {
        active.slug = Set(slug);
    }
    if let Some(name_bg) = patch.name_bg {
        active.name_bg = Set(name_bg);
    }
    if let Some(name_en) = patch.name_en {
        active.name_en = Set(name_en);
    }
    if let Some(description) = patch.description {
        active.description = Set(description);
    }
    if let Some(parent_id) = patch.parent_id {
        active.parent_id = Set(parent_id);
    }
    if let Some(order) = patch.display_order {
        active.display_order = Set(order);
    }
    if let Some(is_active) = patch.is_active {
        active.is_active = Set(is_active);
    }
    active.updated_at = Set(Utc::now());

    let model = active.update(svc.db).await.map_err(|e| {
        let slug = new_slug.as_deref().unwrap_or(&existing.slug);
        AppError::from_constraint(e, || slug_taken(slug))
    })?;

    invalidate(svc, id);
    Ok(model.into())
}

/// Flip `is_active`.
pub async fn toggle(svc: Services<'_>, actor: &Actor, id: Uuid) -> Result<CategoryResponse, AppError> {
    actor.require(Action::ManageCategories)?;
    let existing = find(svc.db, id).await?;
    let next = !existing.is_active;
    let mut active: category::ActiveModel = existing.into();
    active.is_active = Set(next);
    active.updated_at = Set(Utc::now());
    let model = active.update(svc.db).await?;

    tracing::info!(category_id = %id, is_active = next, "category toggled");
    invalidate(svc, id);
    Ok(model.into())
}

/// Assign display order 0, 1, 2, ... following `ids`.
#[instrument(skip(svc, ids), fields(actor = %actor.id, count = ids.len()))]
pub async fn reorder(svc: Services<'_>, actor: &Actor, ids: Vec<Uuid>) -> Result<(), AppError> {
    actor.require(Action::ManageCategories)?;

    let distinct: HashSet<Uuid> = ids.iter().copied().collect();
    if distinct.len() != ids.len() {
        return Err(AppError::Validation(
            "A category may appear only once in the reorder list".into(),
        ));
    }

    let known = category::Entity::find()
        .filter(category::Column::Id.is_in(ids.clone()))
        .count(svc.db)
        .await?;
    if known != ids.len() as u64 {
        return Err(AppError::NotFound(
            "One or more categories in the reorder list do not exist".into(),
        ));
    }

    let txn = svc.db.begin().await?;
    let now = Utc::now();
    for (position, id) in ids.iter().enumerate() {
        let position = i32::try_from(position)
            .map_err(|_| AppError::Validation("Too many categories to reorder".into()))?;
        category::Entity::update_many()
            .col_expr(category::Column::DisplayOrder, Expr::value(position))
            .col_expr(category::Column::UpdatedAt, Expr::value(now))
            .filter(category::Column::Id.eq(*id))
            .exec(&txn)
            .await?;
    }
    txn.commit().await?;

    svc.cache.invalidate(&[tags::CATEGORIES]);
    Ok(())
}

/// Refused while articles or subcategories still point at the category.
#[instrument(skip(svc), fields(actor = %actor.id))]
pub async fn delete(svc: Services<'_>, actor: &Actor, id: Uuid) -> Result<(), AppError> {
    actor.require(Action::ManageCategories)?;
    let existing = find(svc.db, id).await?;

    let articles = article::Entity::find()
        .filter(article::Column::CategoryId.eq(id))
        .count(svc.db)
        .await?;
    if articles > 0 {
        return Err(AppError::Conflict(format!(
            "Category '{}' still has {articles} article(s)",
            existing.slug
        )));
    }
    let children = category::Entity::find()
        .filter(category::Column::ParentId.eq(id))
        .count(svc.db)
        .await?;
    if children > 0 {
        return Err(AppError::Conflict(format!(
            "Category '{}' still has {children} subcategory(ies)",
            existing.slug
        )));
    }

    category::Entity::delete_by_id(id)
        .exec(svc.db)
        .await
        .map_err(|e| {
            AppError::from_constraint(e, || format!("Category '{}' is still in use", existing.slug))
        })?;

    tracing::info!(category_id = %id, slug = %existing.slug, "category deleted");
    invalidate(svc, id);
    Ok(())
}
