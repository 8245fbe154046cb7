use std::collections::{HashMap, HashSet};

use chrono::Utc;
use common::ArticleStatus;
use common::slug::slugify;
use sea_orm::prelude::Expr;
use sea_orm::sea_query::{ExprTrait, Func, LikeExpr};
use sea_orm::*;
use tracing::instrument;
use uuid::Uuid;

use crate::cache::{queries, tags};
use crate::entity::{article, article_tag, category, media, user};
use crate::error::AppError;
use crate::models::article::*;
use crate::models::shared::{Page, escape_like};
use crate::validation::FieldErrors;

use super::Services;
use super::policy::{Action, Actor};
use super::tag;

fn slug_taken(slug: &str) -> String {
    format!("An article with slug '{slug}' already exists")
}

pub async fn find<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<article::Model, AppError> {
    article::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Article {id} not found")))
}

async fn ensure_slug_free<C: ConnectionTrait>(
    db: &C,
    slug: &str,
    except: Option<Uuid>,
) -> Result<(), AppError> {
    let mut query = article::Entity::find().filter(article::Column::Slug.eq(slug));
    if let Some(id) = except {
        query = query.filter(article::Column::Id.ne(id));
    }
    if query.count(db).await? > 0 {
        return Err(AppError::Conflict(slug_taken(slug)));
    }
    Ok(())
}

/// Referenced category and featured image must exist.
async fn check_references(
    svc: Services<'_>,
    category_id: Option<Uuid>,
    featured_image_id: Option<Uuid>,
) -> Result<(), AppError> {
    let mut errors = FieldErrors::new();
    if let Some(id) = category_id
        && queries::category_by_id(svc, id).await?.is_none()
    {
        errors.push("categoryId", "Category does not exist");
    }
    if let Some(id) = featured_image_id
        && queries::media_by_id(svc, id).await?.is_none()
    {
        errors.push("featuredImageId", "Featured image does not exist");
    }
    errors.finish(())
}

fn keywords_json(keywords: &[String]) -> Option<serde_json::Value> {
    (!keywords.is_empty()).then(|| serde_json::json!(keywords))
}

/// Drop every cached view the article takes part in.
fn invalidate(svc: Services<'_>, model: &article::Model, previous: Option<&article::Model>) {
    let mut dropped = vec![
        tags::ARTICLES.to_string(),
        tags::LATEST_ARTICLES.to_string(),
        tags::FEATURED_ARTICLES.to_string(),
        tags::BREAKING_NEWS.to_string(),
        tags::TRENDING_ARTICLES.to_string(),
        tags::TAGS.to_string(),
        tags::article(&model.slug),
    ];
    dropped.extend(model.category_id.map(tags::category));
    if let Some(prev) = previous {
        dropped.push(tags::article(&prev.slug));
        dropped.extend(prev.category_id.map(tags::category));
    }
    svc.cache.invalidate(&dropped);
}

async fn index_by_id<E, C>(
    db: &C,
    ids: HashSet<Uuid>,
    id_column: E::Column,
    id_of: fn(&E::Model) -> Uuid,
) -> Result<HashMap<Uuid, E::Model>, AppError>
where
    E: EntityTrait,
    C: ConnectionTrait,
{
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    Ok(E::find()
        .filter(id_column.is_in(ids))
        .all(db)
        .await?
        .into_iter()
        .map(|m| (id_of(&m), m))
        .collect())
}

/// Attach category, author and featured image to a page of articles with one
/// query per relation.
pub async fn summarize<C: ConnectionTrait>(
    db: &C,
    rows: Vec<article::Model>,
) -> Result<Vec<ArticleSummary>, AppError> {
    let categories = index_by_id::<category::Entity, _>(
        db,
        rows.iter().filter_map(|a| a.category_id).collect(),
        category::Column::Id,
        |m| m.id,
    )
    .await?;
    let authors = index_by_id::<user::Entity, _>(
        db,
        rows.iter().filter_map(|a| a.author_id).collect(),
        user::Column::Id,
        |m| m.id,
    )
    .await?;
    let images = index_by_id::<media::Entity, _>(
        db,
        rows.iter().filter_map(|a| a.featured_image_id).collect(),
        media::Column::Id,
        |m| m.id,
    )
    .await?;

    Ok(rows
        .into_iter()
        .map(|a| {
            let rel = ArticleRelations {
                category: a.category_id.and_then(|id| categories.get(&id)),
                author: a.author_id.and_then(|id| authors.get(&id)),
                featured_image: a.featured_image_id.and_then(|id| images.get(&id)),
            };
            ArticleSummary::build(a, rel)
        })
        .collect())
}

/// Full article with relations and tags.
pub async fn detail(svc: Services<'_>, model: article::Model) -> Result<ArticleResponse, AppError> {
    let category = match model.category_id {
        Some(id) => queries::category_by_id(svc, id).await?,
        None => None,
    };
    let author = match model.author_id {
        Some(id) => queries::user_by_id(svc, id).await?,
        None => None,
    };
    let featured_image = match model.featured_image_id {
        Some(id) => queries::media_by_id(svc, id).await?,
        None => None,
    };
    let tags = tag::tags_of(svc.db, model.id).await?;
    Ok(ArticleResponse::build(
        model,
        ArticleRelations {
            category: category.as_ref(),
            author: author.as_ref(),
            featured_image: featured_image.as_ref(),
        },
        tags,
    ))
}

#[instrument(skip(svc, input), fields(actor = %actor.id, title = %input.title))]
pub async fn create(
    svc: Services<'_>,
    actor: &Actor,
    input: NewArticle,
) -> Result<ArticleResponse, AppError> {
    actor.require(Action::CreateArticle)?;

    let slug = input.slug.clone().unwrap_or_else(|| slugify(&input.title));
    if slug.chars().count() < SLUG_MIN {
        let mut errors = FieldErrors::new();
        errors.push("slug", "The title does not produce a usable slug; provide one");
        return Err(errors.into_error());
    }
    ensure_slug_free(svc.db, &slug, None).await?;
    check_references(svc, Some(input.category_id), input.featured_image_id).await?;

    let now = Utc::now();
    let published_at = (input.status == ArticleStatus::Published).then_some(now);

    let txn = svc.db.begin().await?;
    let model = article::ActiveModel {
        id: Set(Uuid::now_v7()),
        slug: Set(slug.clone()),
        title: Set(input.title),
        subtitle: Set(input.subtitle),
        excerpt: Set(input.excerpt),
        content: Set(input.content),
        status: Set(input.status),
        is_featured: Set(input.is_featured),
        is_breaking: Set(input.is_breaking),
        view_count: Set(0),
        published_at: Set(published_at),
        category_id: Set(Some(input.category_id)),
        author_id: Set(Some(actor.id)),
        featured_image_id: Set(input.featured_image_id),
        meta_title: Set(input.meta_title),
        meta_description: Set(input.meta_description),
        meta_keywords: Set(keywords_json(&input.meta_keywords)),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await
    .map_err(|e| AppError::from_constraint(e, || slug_taken(&slug)))?;

    let tag_rows = tag::upsert_tags(&txn, &input.tags).await?;
    tag::set_article_tags(&txn, model.id, &tag_rows).await?;
    txn.commit().await?;

    tracing::info!(article_id = %model.id, slug = %model.slug, "article created");
    invalidate(svc, &model, None);
    detail(svc, model).await
}

#[instrument(skip(svc, patch), fields(actor = %actor.id))]
pub async fn update(
    svc: Services<'_>,
    actor: &Actor,
    id: Uuid,
    patch: ArticlePatch,
) -> Result<ArticleResponse, AppError> {
    let existing = find(svc.db, id).await?;
    actor.require(Action::ModifyArticle {
        author_id: existing.author_id,
    })?;

    // Published URLs are stable: only drafts follow their title.
    let new_slug = match (&patch.slug, &patch.title) {
        (Some(slug), _) => Some(slug.clone()),
        (None, Some(title)) if existing.published_at.is_none() => {
            Some(slugify(title)).filter(|s| s.chars().count() >= SLUG_MIN)
        }
        _ => None,
    }
    .filter(|s| *s != existing.slug);
    if let Some(slug) = &new_slug {
        ensure_slug_free(svc.db, slug, Some(id)).await?;
    }
    check_references(svc, patch.category_id, patch.featured_image_id.flatten()).await?;

    let now = Utc::now();
    let mut active: article::ActiveModel = existing.clone().into();
    if let Some(slug) = new_slug.clone() {
        active.slug = Set(slug);
    }
    if let Some(title) = patch.title {
        active.title = Set(title);
    }
    if let Some(subtitle) = patch.subtitle {
        active.subtitle = Set(subtitle);
    }
    if let Some(excerpt) = patch.excerpt {
        active.excerpt = Set(excerpt);
    }
    if let Some(content) = patch.content {
        active.content = Set(content);
    }
    if let Some(category_id) = patch.category_id {
        active.category_id = Set(Some(category_id));
    }
    if let Some(status) = patch.status {
        active.status = Set(status);
        if status == ArticleStatus::Published && existing.published_at.is_none() {
            active.published_at = Set(Some(now));
        }
    }
    if let Some(is_featured) = patch.is_featured {
        active.is_featured = Set(is_featured);
    }
    if let Some(is_breaking) = patch.is_breaking {
        active.is_breaking = Set(is_breaking);
    }
    if let Some(image) = patch.featured_image_id {
        active.featured_image_id = Set(image);
    }
    if let Some(meta_title) = patch.meta_title {
        active.meta_title = Set(meta_title);
    }
    if let Some(meta_description) = patch.meta_description {
        active.meta_description = Set(meta_description);
    }
    if let Some(keywords) = &patch.meta_keywords {
        active.meta_keywords = Set(keywords_json(keywords));
    }
    active.updated_at = Set(now);

    let txn = svc.db.begin().await?;
    let model = active.update(&txn).await.map_err(|e| {
        let slug = new_slug.as_deref().unwrap_or(&existing.slug);
        AppError::from_constraint(e, || slug_taken(slug))
    })?;
    if let Some(names) = &patch.tags {
        let tag_rows = tag::upsert_tags(&txn, names).await?;
        tag::set_article_tags(&txn, model.id, &tag_rows).await?;
    }
    txn.commit().await?;

    invalidate(svc, &model, Some(&existing));
    detail(svc, model).await
}

pub async fn publish(svc: Services<'_>, actor: &Actor, id: Uuid) -> Result<ArticleResponse, AppError> {
    update(svc, actor, id, ArticlePatch::status(ArticleStatus::Published)).await
}

pub async fn unpublish(svc: Services<'_>, actor: &Actor, id: Uuid) -> Result<ArticleResponse, AppError> {
    update(svc, actor, id, ArticlePatch::status(ArticleStatus::Draft)).await
}

pub async fn archive(svc: Services<'_>, actor: &Actor, id: Uuid) -> Result<ArticleResponse, AppError> {
    update(svc, actor, id, ArticlePatch::status(ArticleStatus::Archived)).await
}

#[instrument(skip(svc), fields(actor = %actor.id))]
pub async fn delete(svc: Services<'_>, actor: &Actor, id: Uuid) -> Result<(), AppError> {
    let existing = find(svc.db, id).await?;
    actor.require(Action::ModifyArticle {
        author_id: existing.author_id,
    })?;

    let txn = svc.db.begin().await?;
    article_tag::Entity::delete_many()
        .filter(article_tag::Column::ArticleId.eq(id))
        .exec(&txn)
        .await?;
    article::Entity::delete_by_id(id).exec(&txn).await?;
    txn.commit().await?;

    tracing::info!(article_id = %id, slug = %existing.slug, "article deleted");
    invalidate(svc, &existing, None);
    Ok(())
}

/// Article by id. Anonymous callers only see published articles.
pub async fn get(svc: Services<'_>, viewer: Option<&Actor>, id: Uuid) -> Result<ArticleResponse, AppError> {
    let model = queries::article_by_id(svc, id)
        .await?
        .filter(|a| viewer.is_some() || a.status.is_public())
        .ok_or_else(|| AppError::NotFound(format!("Article {id} not found")))?;
    detail(svc, model).await
}

/// Published article by slug with its related articles, served through the
/// cache. Counts a view.
pub async fn get_published_by_slug(svc: Services<'_>, slug: &str) -> Result<ArticleResponse, AppError> {
    let mut article = queries::article_detail(svc, slug).await?;
    let related = match article.category_id {
        Some(category_id) => queries::related_articles(svc, category_id, article.id).await?,
        None => Vec::new(),
    };
    article.related_articles = Some(related);
    record_view(svc.db.clone(), article.id);
    Ok(article)
}

/// Bump the view counter in the background. Failures are logged and dropped.
pub fn record_view(db: DatabaseConnection, id: Uuid) {
    tokio::spawn(async move {
        let result = article::Entity::update_many()
            .col_expr(
                article::Column::ViewCount,
                Expr::col(article::Column::ViewCount).add(1),
            )
            .filter(article::Column::Id.eq(id))
            .exec(&db)
            .await;
        if let Err(e) = result {
            tracing::warn!(article_id = %id, error = %e, "view count increment failed");
        }
    });
}

/// Filtered admin listing, newest first.
#[instrument(skip(svc, query))]
pub async fn list(
    svc: Services<'_>,
    viewer: Option<&Actor>,
    query: ArticleListQuery,
) -> Result<ArticleListResponse, AppError> {
    let page = Page::new(query.limit, query.offset);

    let mut errors = FieldErrors::new();
    let status = match (viewer, query.status.as_deref()) {
        (None, _) => Some(ArticleStatus::Published),
        (Some(_), Some(raw)) if !raw.trim().is_empty() => errors.parse("status", raw.trim()),
        (Some(_), _) => None,
    };
    errors.finish(())?;

    let mut select = article::Entity::find();
    if let Some(status) = status {
        select = select.filter(article::Column::Status.eq(status));
    }
    if let Some(category_id) = query.category_id {
        select = select.filter(article::Column::CategoryId.eq(category_id));
    }
    if let Some(ref search) = query.search {
        let term = escape_like(search.trim());
        if !term.is_empty() {
            let pattern = format!("%{}%", term.to_lowercase());
            select = select.filter(
                Condition::any()
                    .add(
                        Expr::expr(Func::lower(Expr::col(article::Column::Title)))
                            .like(LikeExpr::new(pattern.clone()).escape('\\')),
                    )
                    .add(
                        Expr::expr(Func::lower(Expr::col(article::Column::Excerpt)))
                            .like(LikeExpr::new(pattern).escape('\\')),
                    ),
            );
        }
    }

    let count = select.clone().count(svc.db).await?;
    let rows = select
        .order_by_desc(article::Column::CreatedAt)
        .offset(Some(page.offset))
        .limit(Some(page.limit))
        .all(svc.db)
        .await?;

    Ok(ArticleListResponse {
        data: summarize(svc.db, rows).await?,
        count,
        has_more: page.has_more(count),
    })
}
