use axum::Json;
use axum::extract::{Path, State};
use tracing::instrument;

use crate::cache::queries;
use crate::error::{AppError, ErrorBody};
use crate::extractors::json::AppQuery;
use crate::extractors::memo::RequestMemo;
use crate::models::article::{FeedQuery, FeedResponse};
use crate::models::shared::MAX_LIMIT;
use crate::services::Services;
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/{slug}/articles",
    tag = "Tags",
    operation_id = "listTagArticles",
    summary = "Published articles carrying a tag",
    params(("slug" = String, Path, description = "Tag slug"), FeedQuery),
    responses(
        (status = 200, description = "Articles", body = FeedResponse),
        (status = 404, description = "Tag not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, memo, query), fields(slug = %slug))]
pub async fn list_tag_articles(
    State(state): State<AppState>,
    memo: RequestMemo,
    Path(slug): Path<String>,
    AppQuery(query): AppQuery<FeedQuery>,
) -> Result<Json<FeedResponse>, AppError> {
    let svc = Services::new(&state, &memo);
    let limit = query
        .limit
        .unwrap_or(queries::TAG_ARTICLES_LIMIT)
        .clamp(1, MAX_LIMIT);
    let articles = queries::tag_articles(svc, &slug, limit).await?;
    Ok(Json(FeedResponse { articles }))
}
