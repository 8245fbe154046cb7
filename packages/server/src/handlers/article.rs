use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use tracing::instrument;
use uuid::Uuid;

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::{AppJson, AppQuery};
use crate::extractors::memo::RequestMemo;
use crate::models::article::*;
use crate::models::shared::SuccessResponse;
use crate::services::{Services, article};
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/",
    tag = "Articles",
    operation_id = "listArticles",
    summary = "List articles with filters and pagination",
    description = "Newest first. Anonymous callers only ever see published articles; authenticated callers may filter by any status.",
    params(ArticleListQuery),
    responses(
        (status = 200, description = "Page of articles", body = ArticleListResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, memo, auth_user, query))]
pub async fn list_articles(
    auth_user: Option<AuthUser>,
    State(state): State<AppState>,
    memo: RequestMemo,
    AppQuery(query): AppQuery<ArticleListQuery>,
) -> Result<Json<ArticleListResponse>, AppError> {
    let svc = Services::new(&state, &memo);
    let viewer = auth_user.map(|u| u.actor());
    Ok(Json(article::list(svc, viewer.as_ref(), query).await?))
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Articles",
    operation_id = "createArticle",
    summary = "Create an article",
    description = "The slug is derived from the title unless given. Tags are created on first use. The caller becomes the author.",
    request_body = CreateArticleRequest,
    responses(
        (status = 201, description = "Article created", body = ArticleResponse),
        (status = 400, description = "Validation error or slug taken (VALIDATION_ERROR, CONFLICT)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, memo, auth_user, payload), fields(user_id = %auth_user.user_id))]
pub async fn create_article(
    auth_user: AuthUser,
    State(state): State<AppState>,
    memo: RequestMemo,
    AppJson(payload): AppJson<CreateArticleRequest>,
) -> Result<impl IntoResponse, AppError> {
    let input = payload.validate()?;
    let svc = Services::new(&state, &memo);
    let created = article::create(svc, &auth_user.actor(), input).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Articles",
    operation_id = "getArticle",
    summary = "Get an article by ID",
    description = "Drafts and archived articles are only visible to authenticated callers.",
    params(("id" = Uuid, Path, description = "Article ID")),
    responses(
        (status = 200, description = "Article", body = ArticleResponse),
        (status = 404, description = "Article not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, memo, auth_user), fields(id = %id))]
pub async fn get_article(
    auth_user: Option<AuthUser>,
    State(state): State<AppState>,
    memo: RequestMemo,
    Path(id): Path<Uuid>,
) -> Result<Json<ArticleResponse>, AppError> {
    let svc = Services::new(&state, &memo);
    let viewer = auth_user.map(|u| u.actor());
    Ok(Json(article::get(svc, viewer.as_ref(), id).await?))
}

#[utoipa::path(
    patch,
    path = "/{id}",
    tag = "Articles",
    operation_id = "updateArticle",
    summary = "Update an article",
    description = "PATCH semantics: absent fields are kept, `null` clears optional fields. Authors may only edit their own articles. Giving `tags` replaces the full tag set.",
    params(("id" = Uuid, Path, description = "Article ID")),
    request_body = UpdateArticleRequest,
    responses(
        (status = 200, description = "Article updated", body = ArticleResponse),
        (status = 400, description = "Validation error or slug taken (VALIDATION_ERROR, CONFLICT)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Article not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, memo, auth_user, payload), fields(id = %id))]
pub async fn update_article(
    auth_user: AuthUser,
    State(state): State<AppState>,
    memo: RequestMemo,
    Path(id): Path<Uuid>,
    AppJson(payload): AppJson<UpdateArticleRequest>,
) -> Result<Json<ArticleResponse>, AppError> {
    let patch = payload.validate()?;
    let svc = Services::new(&state, &memo);
    Ok(Json(article::update(svc, &auth_user.actor(), id, patch).await?))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Articles",
    operation_id = "deleteArticle",
    summary = "Delete an article",
    params(("id" = Uuid, Path, description = "Article ID")),
    responses(
        (status = 200, description = "Article deleted", body = SuccessResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Article not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, memo, auth_user), fields(id = %id))]
pub async fn delete_article(
    auth_user: AuthUser,
    State(state): State<AppState>,
    memo: RequestMemo,
    Path(id): Path<Uuid>,
) -> Result<Json<SuccessResponse>, AppError> {
    let svc = Services::new(&state, &memo);
    article::delete(svc, &auth_user.actor(), id).await?;
    Ok(Json(SuccessResponse::ok()))
}

#[utoipa::path(
    post,
    path = "/{id}/publish",
    tag = "Articles",
    operation_id = "publishArticle",
    summary = "Publish an article",
    description = "The first publish stamps `publishedAt`; later publishes keep it.",
    params(("id" = Uuid, Path, description = "Article ID")),
    responses(
        (status = 200, description = "Article published", body = ArticleResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Article not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, memo, auth_user), fields(id = %id))]
pub async fn publish_article(
    auth_user: AuthUser,
    State(state): State<AppState>,
    memo: RequestMemo,
    Path(id): Path<Uuid>,
) -> Result<Json<ArticleResponse>, AppError> {
    let svc = Services::new(&state, &memo);
    Ok(Json(article::publish(svc, &auth_user.actor(), id).await?))
}

#[utoipa::path(
    post,
    path = "/{id}/unpublish",
    tag = "Articles",
    operation_id = "unpublishArticle",
    summary = "Move an article back to draft",
    params(("id" = Uuid, Path, description = "Article ID")),
    responses(
        (status = 200, description = "Article unpublished", body = ArticleResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Article not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, memo, auth_user), fields(id = %id))]
pub async fn unpublish_article(
    auth_user: AuthUser,
    State(state): State<AppState>,
    memo: RequestMemo,
    Path(id): Path<Uuid>,
) -> Result<Json<ArticleResponse>, AppError> {
    let svc = Services::new(&state, &memo);
    Ok(Json(article::unpublish(svc, &auth_user.actor(), id).await?))
}

#[utoipa::path(
    post,
    path = "/{id}/archive",
    tag = "Articles",
    operation_id = "archiveArticle",
    summary = "Archive an article",
    params(("id" = Uuid, Path, description = "Article ID")),
    responses(
        (status = 200, description = "Article archived", body = ArticleResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Article not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, memo, auth_user), fields(id = %id))]
pub async fn archive_article(
    auth_user: AuthUser,
    State(state): State<AppState>,
    memo: RequestMemo,
    Path(id): Path<Uuid>,
) -> Result<Json<ArticleResponse>, AppError> {
    let svc = Services::new(&state, &memo);
    Ok(Json(article::archive(svc, &auth_user.actor(), id).await?))
}

#[utoipa::path(
    get,
    path = "/slug/{slug}",
    tag = "Articles",
    operation_id = "getArticleBySlug",
    summary = "Get a published article by slug",
    description = "Public read with up to three related articles from the same category. Each successful call counts one view.",
    params(("slug" = String, Path, description = "Article slug")),
    responses(
        (status = 200, description = "Article", body = ArticleResponse),
        (status = 404, description = "Article not found or not published (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, memo), fields(slug = %slug))]
pub async fn get_article_by_slug(
    State(state): State<AppState>,
    memo: RequestMemo,
    Path(slug): Path<String>,
) -> Result<Json<ArticleResponse>, AppError> {
    let svc = Services::new(&state, &memo);
    Ok(Json(article::get_published_by_slug(svc, &slug).await?))
}
