use std::collections::HashSet;

use common::slug::slugify;
use sea_orm::sea_query::OnConflict;
use sea_orm::*;
use uuid::Uuid;

use crate::entity::{article_tag, tag};
use crate::error::AppError;

/// Find or create one tag per distinct slug among `names`, in input order.
///
/// Names that reduce to an empty slug are skipped.
pub async fn upsert_tags<C: ConnectionTrait>(
    db: &C,
    names: &[String],
) -> Result<Vec<tag::Model>, AppError> {
    let mut seen = HashSet::new();
    let wanted: Vec<(String, &str)> = names
        .iter()
        .filter_map(|name| {
            let slug = slugify(name);
            (!slug.is_empty() && seen.insert(slug.clone())).then_some((slug, name.trim()))
        })
        .collect();
    if wanted.is_empty() {
        return Ok(Vec::new());
    }

    let now = chrono::Utc::now();
    let rows = wanted.iter().map(|(slug, name)| tag::ActiveModel {
        id: Set(Uuid::now_v7()),
        slug: Set(slug.clone()),
        name: Set(ToString::to_string(&name)),
        created_at: Set(now),
        ..Default::default()
    });
    tag::Entity::insert_many(rows)
        .on_conflict(OnConflict::column(tag::Column::Slug).do_nothing().to_owned())
        .exec_without_returning(db)
        .await?;

    let slugs: Vec<&str> = wanted.iter().map(|(slug, _)| slug.as_str()).collect();
    let mut found = tag::Entity::find()
        .filter(tag::Column::Slug.is_in(slugs.clone()))
        .all(db)
        .await?;
    found.sort_by_key(|t| slugs.iter().position(|s| *s == t.slug));
    Ok(found)
}

/// Replace the tag set of an article.
pub async fn set_article_tags<C: ConnectionTrait>(
    db: &C,
    article_id: Uuid,
    tags: &[tag::Model],
) -> Result<(), AppError> {
    article_tag::Entity::delete_many()
        .filter(article_tag::Column::ArticleId.eq(article_id))
        .exec(db)
        .await?;
    if tags.is_empty() {
        return Ok(());
    }
    let rows = tags.iter().map(|t| article_tag::ActiveModel {
        article_id: Set(article_id),
        tag_id: Set(t.id),
        ..Default::default()
    });
    article_tag::Entity::insert_many(rows)
        .exec_without_returning(db)
        .await?;
    Ok(())
}

/// Tags attached to an article, by name.
pub async fn tags_of<C: ConnectionTrait>(db: &C, article_id: Uuid) -> Result<Vec<tag::Model>, AppError> {
    let tag_ids: Vec<Uuid> = article_tag::Entity::find()
        .filter(article_tag::Column::ArticleId.eq(article_id))
        .all(db)
        .await?
        .into_iter()
        .map(|row| row.tag_id)
        .collect();
    if tag_ids.is_empty() {
        return Ok(Vec::new());
    }
    Ok(tag::Entity::find()
        .filter(tag::Column::Id.is_in(tag_ids))
        .order_by_asc(tag::Column::Name)
        .all(db)
        .await?)
}

pub async fn find_by_slug<C: ConnectionTrait>(db: &C, slug: &str) -> Result<tag::Model, AppError> {
    tag::Entity::find()
        .filter(tag::Column::Slug.eq(slug))
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Tag '{slug}' not found")))
}
