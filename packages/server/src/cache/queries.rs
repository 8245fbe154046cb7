//! Named reads. Public listings go through [`CacheService`](super::CacheService);
//! single-row lookups go through the request memo.

use common::ArticleStatus;
use sea_orm::*;
use uuid::Uuid;

use super::CachedQuery;
use crate::entity::{article, article_tag, category, media, user};
use crate::error::AppError;
use crate::models::article::{ArticleResponse, ArticleSummary};
use crate::models::category::CategoryResponse;
use crate::services::{Services, article as articles, tag};

pub const LATEST_LIMIT: u64 = 10;
pub const FEATURED_LIMIT: u64 = 5;
pub const BREAKING_LIMIT: u64 = 3;
pub const TRENDING_LIMIT: u64 = 10;
pub const TAG_ARTICLES_LIMIT: u64 = 20;
pub const RELATED_LIMIT: u64 = 3;

fn published() -> Select<article::Entity> {
    article::Entity::find().filter(article::Column::Status.eq(ArticleStatus::Published))
}

async fn feed(
    svc: Services<'_>,
    query: CachedQuery,
    select: Select<article::Entity>,
    limit: u64,
) -> Result<Vec<ArticleSummary>, AppError> {
    svc.cache
        .get_or_load(&query, || async move {
            let rows = select.limit(Some(limit)).all(svc.db).await?;
            articles::summarize(svc.db, rows).await
        })
        .await
}

pub async fn latest(svc: Services<'_>, limit: u64) -> Result<Vec<ArticleSummary>, AppError> {
    let select = published().order_by_desc(article::Column::PublishedAt);
    feed(svc, CachedQuery::Latest { limit }, select, limit).await
}

pub async fn featured(svc: Services<'_>, limit: u64) -> Result<Vec<ArticleSummary>, AppError> {
    let select = published()
        .filter(article::Column::IsFeatured.eq(true))
        .order_by_desc(article::Column::PublishedAt);
    feed(svc, CachedQuery::Featured { limit }, select, limit).await
}

pub async fn breaking(svc: Services<'_>, limit: u64) -> Result<Vec<ArticleSummary>, AppError> {
    let select = published()
        .filter(article::Column::IsBreaking.eq(true))
        .order_by_desc(article::Column::PublishedAt);
    feed(svc, CachedQuery::Breaking { limit }, select, limit).await
}

pub async fn trending(svc: Services<'_>, limit: u64) -> Result<Vec<ArticleSummary>, AppError> {
    let select = published()
        .order_by_desc(article::Column::ViewCount)
        .order_by_desc(article::Column::PublishedAt);
    feed(svc, CachedQuery::Trending { limit }, select, limit).await
}

/// One page of a category's published articles.
pub async fn category_articles(
    svc: Services<'_>,
    category_id: Uuid,
    limit: u64,
    offset: u64,
) -> Result<Vec<ArticleSummary>, AppError> {
    let query = CachedQuery::CategoryArticles {
        category_id,
        limit,
        offset,
    };
    svc.cache
        .get_or_load(&query, || async move {
            let rows = published()
                .filter(article::Column::CategoryId.eq(category_id))
                .order_by_desc(article::Column::PublishedAt)
                .offset(Some(offset))
                .limit(Some(limit))
                .all(svc.db)
                .await?;
            articles::summarize(svc.db, rows).await
        })
        .await
}

pub async fn category_article_count(svc: Services<'_>, category_id: Uuid) -> Result<u64, AppError> {
    svc.cache
        .get_or_load(&CachedQuery::CategoryArticleCount { category_id }, || async move {
            Ok(published()
                .filter(article::Column::CategoryId.eq(category_id))
                .count(svc.db)
                .await?)
        })
        .await
}

/// Other published articles from the same category, newest first.
pub async fn related_articles(
    svc: Services<'_>,
    category_id: Uuid,
    exclude: Uuid,
) -> Result<Vec<ArticleSummary>, AppError> {
    let query = CachedQuery::RelatedArticles {
        category_id,
        exclude,
        limit: RELATED_LIMIT,
    };
    let select = published()
        .filter(article::Column::CategoryId.eq(category_id))
        .filter(article::Column::Id.ne(exclude))
        .order_by_desc(article::Column::PublishedAt);
    feed(svc, query, select, RELATED_LIMIT).await
}

/// Published articles carrying the tag, newest first.
pub async fn tag_articles(
    svc: Services<'_>,
    tag_slug: &str,
    limit: u64,
) -> Result<Vec<ArticleSummary>, AppError> {
    let query = CachedQuery::TagArticles {
        tag_slug: tag_slug.to_string(),
        limit,
    };
    svc.cache
        .get_or_load(&query, || async move {
            let tag = tag::find_by_slug(svc.db, tag_slug).await?;
            let rows = published()
                .filter(
                    article::Column::Id.in_subquery(
                        sea_orm::sea_query::Query::select()
                            .column(article_tag::Column::ArticleId)
                            .from(article_tag::Entity)
                            .and_where(article_tag::Column::TagId.eq(tag.id))
                            .to_owned(),
                    ),
                )
                .order_by_desc(article::Column::PublishedAt)
                .limit(Some(limit))
                .all(svc.db)
                .await?;
            articles::summarize(svc.db, rows).await
        })
        .await
}

/// Active categories in display order.
pub async fn active_categories(svc: Services<'_>) -> Result<Vec<CategoryResponse>, AppError> {
    svc.cache
        .get_or_load(&CachedQuery::ActiveCategories, || async move {
            Ok(category::Entity::find()
                .filter(category::Column::IsActive.eq(true))
                .order_by_asc(category::Column::DisplayOrder)
                .order_by_asc(category::Column::NameBg)
                .all(svc.db)
                .await?
                .into_iter()
                .map(CategoryResponse::from)
                .collect())
        })
        .await
}

/// Published article detail by slug.
pub async fn article_detail(svc: Services<'_>, slug: &str) -> Result<ArticleResponse, AppError> {
    let query = CachedQuery::ArticleDetail {
        slug: slug.to_string(),
    };
    svc.cache
        .get_or_load(&query, || async move {
            let model = published()
                .filter(article::Column::Slug.eq(slug))
                .one(svc.db)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Article '{slug}' not found")))?;
            articles::detail(svc, model).await
        })
        .await
}

pub async fn article_by_id(svc: Services<'_>, id: Uuid) -> Result<Option<article::Model>, AppError> {
    svc.memo
        .get_or_load(&format!("article:{id}"), || async move {
            Ok(article::Entity::find_by_id(id).one(svc.db).await?)
        })
        .await
}

pub async fn category_by_id(svc: Services<'_>, id: Uuid) -> Result<Option<category::Model>, AppError> {
    svc.memo
        .get_or_load(&format!("category:{id}"), || async move {
            Ok(category::Entity::find_by_id(id).one(svc.db).await?)
        })
        .await
}

/// Active category by slug.
pub async fn category_by_slug(
    svc: Services<'_>,
    slug: &str,
) -> Result<Option<category::Model>, AppError> {
    svc.memo
        .get_or_load(&format!("category:slug:{slug}"), || async move {
            Ok(category::Entity::find()
                .filter(category::Column::Slug.eq(slug))
                .filter(category::Column::IsActive.eq(true))
                .one(svc.db)
                .await?)
        })
        .await
}

pub async fn user_by_id(svc: Services<'_>, id: Uuid) -> Result<Option<user::Model>, AppError> {
    svc.memo
        .get_or_load(&format!("user:{id}"), || async move {
            Ok(user::Entity::find_by_id(id).one(svc.db).await?)
        })
        .await
}

pub async fn media_by_id(svc: Services<'_>, id: Uuid) -> Result<Option<media::Model>, AppError> {
    svc.memo
        .get_or_load(&format!("media:{id}"), || async move {
            Ok(media::Entity::find_by_id(id).one(svc.db).await?)
        })
        .await
}
