use axum::Json;
use axum::extract::State;
use tracing::instrument;

use crate::cache::queries;
use crate::error::AppError;
use crate::extractors::json::AppQuery;
use crate::extractors::memo::RequestMemo;
use crate::models::article::{FeedQuery, FeedResponse};
use crate::models::shared::MAX_LIMIT;
use crate::services::Services;
use crate::state::AppState;

fn feed_limit(query: &FeedQuery, default: u64) -> u64 {
    query.limit.unwrap_or(default).clamp(1, MAX_LIMIT)
}

#[utoipa::path(
    get,
    path = "/latest",
    tag = "Feed",
    operation_id = "latestArticles",
    summary = "Most recently published articles",
    params(FeedQuery),
    responses((status = 200, description = "Articles", body = FeedResponse)),
)]
#[instrument(skip(state, memo, query))]
pub async fn latest(
    State(state): State<AppState>,
    memo: RequestMemo,
    AppQuery(query): AppQuery<FeedQuery>,
) -> Result<Json<FeedResponse>, AppError> {
    let svc = Services::new(&state, &memo);
    let articles = queries::latest(svc, feed_limit(&query, queries::LATEST_LIMIT)).await?;
    Ok(Json(FeedResponse { articles }))
}

#[utoipa::path(
    get,
    path = "/featured",
    tag = "Feed",
    operation_id = "featuredArticles",
    summary = "Featured published articles",
    params(FeedQuery),
    responses((status = 200, description = "Articles", body = FeedResponse)),
)]
#[instrument(skip(state, memo, query))]
pub async fn featured(
    State(state): State<AppState>,
    memo: RequestMemo,
    AppQuery(query): AppQuery<FeedQuery>,
) -> Result<Json<FeedResponse>, AppError> {
    let svc = Services::new(&state, &memo);
    let articles = queries::featured(svc, feed_limit(&query, queries::FEATURED_LIMIT)).await?;
    Ok(Json(FeedResponse { articles }))
}

#[utoipa::path(
    get,
    path = "/breaking",
    tag = "Feed",
    operation_id = "breakingNews",
    summary = "Breaking news",
    params(FeedQuery),
    responses((status = 200, description = "Articles", body = FeedResponse)),
)]
#[instrument(skip(state, memo, query))]
pub async fn breaking(
    State(state): State<AppState>,
    memo: RequestMemo,
    AppQuery(query): AppQuery<FeedQuery>,
) -> Result<Json<FeedResponse>, AppError> {
    let svc = Services::new(&state, &memo);
    let articles = queries::breaking(svc, feed_limit(&query, queries::BREAKING_LIMIT)).await?;
    Ok(Json(FeedResponse { articles }))
}

#[utoipa::path(
    get,
    path = "/trending",
    tag = "Feed",
    operation_id = "trendingArticles",
    summary = "Most viewed published articles",
    params(FeedQuery),
    responses((status = 200, description = "Articles", body = FeedResponse)),
)]
#[instrument(skip(state, memo, query))]
pub async fn trending(
    State(state): State<AppState>,
    memo: RequestMemo,
    AppQuery(query): AppQuery<FeedQuery>,
) -> Result<Json<FeedResponse>, AppError> {
    let svc = Services::new(&state, &memo);
    let articles = queries::trending(svc, feed_limit(&query, queries::TRENDING_LIMIT)).await?;
    Ok(Json(FeedResponse { articles }))
}
