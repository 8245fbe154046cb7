use axum::Json;
use axum::extract::{Path, State};
use tracing::instrument;
use uuid::Uuid;

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::{AppJson, AppQuery};
use crate::extractors::memo::RequestMemo;
use crate::models::media::*;
use crate::services::{Services, media};
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/",
    tag = "Media",
    operation_id = "listMedia",
    summary = "List the media library",
    description = "Newest first, optionally filtered by uploader and a search term.",
    params(MediaListQuery),
    responses(
        (status = 200, description = "Page of media", body = MediaListResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, memo, _auth_user, query))]
pub async fn list_media(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    memo: RequestMemo,
    AppQuery(query): AppQuery<MediaListQuery>,
) -> Result<Json<MediaListResponse>, AppError> {
    let svc = Services::new(&state, &memo);
    Ok(Json(media::list(svc, query).await?))
}

#[utoipa::path(
    get,
    path = "/stats",
    tag = "Media",
    operation_id = "getMediaStats",
    summary = "File count and stored size",
    params(MediaStatsQuery),
    responses(
        (status = 200, description = "Media statistics", body = MediaStatsResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, memo, _auth_user, query))]
pub async fn media_stats(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    memo: RequestMemo,
    AppQuery(query): AppQuery<MediaStatsQuery>,
) -> Result<Json<MediaStatsResponse>, AppError> {
    let svc = Services::new(&state, &memo);
    Ok(Json(media::stats(svc, query.uploaded_by).await?))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Media",
    operation_id = "getMedia",
    summary = "Get a media item",
    params(("id" = Uuid, Path, description = "Media ID")),
    responses(
        (status = 200, description = "Media item", body = MediaResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Media not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, memo, _auth_user), fields(id = %id))]
pub async fn get_media(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    memo: RequestMemo,
    Path(id): Path<Uuid>,
) -> Result<Json<MediaResponse>, AppError> {
    let svc = Services::new(&state, &memo);
    Ok(Json(media::get(svc, id).await?))
}

#[utoipa::path(
    patch,
    path = "/{id}",
    tag = "Media",
    operation_id = "updateMedia",
    summary = "Edit alt text and caption",
    description = "Only the uploader or an admin may edit. `null` clears a field.",
    params(("id" = Uuid, Path, description = "Media ID")),
    request_body = UpdateMediaRequest,
    responses(
        (status = 200, description = "Media updated", body = MediaResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Media not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, memo, auth_user, payload), fields(id = %id))]
pub async fn update_media(
    auth_user: AuthUser,
    State(state): State<AppState>,
    memo: RequestMemo,
    Path(id): Path<Uuid>,
    AppJson(payload): AppJson<UpdateMediaRequest>,
) -> Result<Json<MediaResponse>, AppError> {
    let patch = payload.validate()?;
    let svc = Services::new(&state, &memo);
    Ok(Json(media::update(svc, &auth_user.actor(), id, patch).await?))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Media",
    operation_id = "deleteMedia",
    summary = "Delete a media item",
    description = "Refused while an article uses the image as its featured image. The row is removed \
        first; if the stored object cannot be removed the response reports `storageCleanup: \"pending\"`.",
    params(("id" = Uuid, Path, description = "Media ID")),
    responses(
        (status = 200, description = "Media deleted", body = DeleteMediaResponse),
        (status = 400, description = "Media in use (CONFLICT)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Media not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, memo, auth_user), fields(id = %id))]
pub async fn delete_media(
    auth_user: AuthUser,
    State(state): State<AppState>,
    memo: RequestMemo,
    Path(id): Path<Uuid>,
) -> Result<Json<DeleteMediaResponse>, AppError> {
    let svc = Services::new(&state, &memo);
    Ok(Json(media::delete(svc, &auth_user.actor(), id).await?))
}
