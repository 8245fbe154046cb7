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
use crate::models::article::CategoryArticlesResponse;
use crate::models::category::*;
use crate::models::shared::{Page, SuccessResponse};
use crate::services::{Services, category};
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/",
    tag = "Categories",
    operation_id = "listCategories",
    summary = "List categories in display order",
    params(CategoryListQuery),
    responses(
        (status = 200, description = "Categories", body = CategoryListResponse),
    ),
)]
#[instrument(skip(state, memo, query))]
pub async fn list_categories(
    State(state): State<AppState>,
    memo: RequestMemo,
    AppQuery(query): AppQuery<CategoryListQuery>,
) -> Result<Json<CategoryListResponse>, AppError> {
    let svc = Services::new(&state, &memo);
    let categories = category::list(svc, query.include_inactive.unwrap_or(false)).await?;
    Ok(Json(CategoryListResponse { categories }))
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Categories",
    operation_id = "createCategory",
    summary = "Create a category",
    description = "Admin only. The slug is derived from `nameBg` unless given. Categories nest one level deep.",
    request_body = CreateCategoryRequest,
    responses(
        (status = 201, description = "Category created", body = CategoryResponse),
        (status = 400, description = "Validation error or slug taken (VALIDATION_ERROR, CONFLICT)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, memo, auth_user, payload))]
pub async fn create_category(
    auth_user: AuthUser,
    State(state): State<AppState>,
    memo: RequestMemo,
    AppJson(payload): AppJson<CreateCategoryRequest>,
) -> Result<impl IntoResponse, AppError> {
    let input = payload.validate()?;
    let svc = Services::new(&state, &memo);
    let created = category::create(svc, &auth_user.actor(), input).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Categories",
    operation_id = "getCategory",
    summary = "Get a category by ID",
    params(("id" = Uuid, Path, description = "Category ID")),
    responses(
        (status = 200, description = "Category", body = CategoryResponse),
        (status = 404, description = "Category not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, memo), fields(id = %id))]
pub async fn get_category(
    State(state): State<AppState>,
    memo: RequestMemo,
    Path(id): Path<Uuid>,
) -> Result<Json<CategoryResponse>, AppError> {
    let svc = Services::new(&state, &memo);
    Ok(Json(category::get(svc, id).await?))
}

#[utoipa::path(
    patch,
    path = "/{id}",
    tag = "Categories",
    operation_id = "updateCategory",
    summary = "Update a category",
    description = "Admin only. PATCH semantics; `null` clears optional fields including `parentId`.",
    params(("id" = Uuid, Path, description = "Category ID")),
    request_body = UpdateCategoryRequest,
    responses(
        (status = 200, description = "Category updated", body = CategoryResponse),
        (status = 400, description = "Validation error or slug taken (VALIDATION_ERROR, CONFLICT)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Category not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, memo, auth_user, payload), fields(id = %id))]
pub async fn update_category(
    auth_user: AuthUser,
    State(state): State<AppState>,
    memo: RequestMemo,
    Path(id): Path<Uuid>,
    AppJson(payload): AppJson<UpdateCategoryRequest>,
) -> Result<Json<CategoryResponse>, AppError> {
    let patch = payload.validate()?;
    let svc = Services::new(&state, &memo);
    Ok(Json(category::update(svc, &auth_user.actor(), id, patch).await?))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Categories",
    operation_id = "deleteCategory",
    summary = "Delete a category",
    description = "Admin only. Refused while the category has articles or subcategories.",
    params(("id" = Uuid, Path, description = "Category ID")),
    responses(
        (status = 200, description = "Category deleted", body = SuccessResponse),
        (status = 400, description = "Category in use (CONFLICT)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Category not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, memo, auth_user), fields(id = %id))]
pub async fn delete_category(
    auth_user: AuthUser,
    State(state): State<AppState>,
    memo: RequestMemo,
    Path(id): Path<Uuid>,
) -> Result<Json<SuccessResponse>, AppError> {
    let svc = Services::new(&state, &memo);
    category::delete(svc, &auth_user.actor(), id).await?;
    Ok(Json(SuccessResponse::ok()))
}

#[utoipa::path(
    post,
    path = "/{id}/toggle",
    tag = "Categories",
    operation_id = "toggleCategory",
    summary = "Activate or deactivate a category",
    params(("id" = Uuid, Path, description = "Category ID")),
    responses(
        (status = 200, description = "Category toggled", body = CategoryResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Category not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, memo, auth_user), fields(id = %id))]
pub async fn toggle_category(
    auth_user: AuthUser,
    State(state): State<AppState>,
    memo: RequestMemo,
    Path(id): Path<Uuid>,
) -> Result<Json<CategoryResponse>, AppError> {
    let svc = Services::new(&state, &memo);
    Ok(Json(category::toggle(svc, &auth_user.actor(), id).await?))
}

#[utoipa::path(
    put,
    path = "/reorder",
    tag = "Categories",
    operation_id = "reorderCategories",
    summary = "Set the display order of categories",
    description = "Admin only. Each listed category gets the display order of its position in `categoryIds`.",
    request_body = ReorderCategoriesRequest,
    responses(
        (status = 200, description = "Categories reordered", body = SuccessResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Unknown category in list (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, memo, auth_user, payload))]
pub async fn reorder_categories(
    auth_user: AuthUser,
    State(state): State<AppState>,
    memo: RequestMemo,
    AppJson(payload): AppJson<ReorderCategoriesRequest>,
) -> Result<Json<SuccessResponse>, AppError> {
    let ids = payload.validate()?;
    let svc = Services::new(&state, &memo);
    category::reorder(svc, &auth_user.actor(), ids).await?;
    Ok(Json(SuccessResponse::ok()))
}

#[utoipa::path(
    get,
    path = "/slug/{slug}",
    tag = "Categories",
    operation_id = "getCategoryBySlug",
    summary = "Get an active category and its subcategories",
    params(("slug" = String, Path, description = "Category slug")),
    responses(
        (status = 200, description = "Category", body = CategoryDetailResponse),
        (status = 404, description = "Category not found or inactive (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, memo), fields(slug = %slug))]
pub async fn get_category_by_slug(
    State(state): State<AppState>,
    memo: RequestMemo,
    Path(slug): Path<String>,
) -> Result<Json<CategoryDetailResponse>, AppError> {
    let svc = Services::new(&state, &memo);
    Ok(Json(category::get_by_slug(svc, &slug).await?))
}

#[utoipa::path(
    get,
    path = "/slug/{slug}/articles",
    tag = "Categories",
    operation_id = "listCategoryArticles",
    summary = "Published articles of a category",
    params(("slug" = String, Path, description = "Category slug"), CategoryArticlesQuery),
    responses(
        (status = 200, description = "Page of articles", body = CategoryArticlesResponse),
        (status = 404, description = "Category not found or inactive (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, memo, query), fields(slug = %slug))]
pub async fn list_category_articles(
    State(state): State<AppState>,
    memo: RequestMemo,
    Path(slug): Path<String>,
    AppQuery(query): AppQuery<CategoryArticlesQuery>,
) -> Result<Json<CategoryArticlesResponse>, AppError> {
    let svc = Services::new(&state, &memo);
    let page = Page::new(query.limit, query.offset);
    Ok(Json(category::articles_by_slug(svc, &slug, page).await?))
}
