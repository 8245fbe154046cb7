use axum::{Json, extract::State};
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::extractors::memo::RequestMemo;
use crate::models::auth::{LoginRequest, LoginResponse};
use crate::models::user::UserResponse;
use crate::services::{Services, user};
use crate::state::AppState;

#[utoipa::path(
    post,
    path = "/login",
    tag = "Auth",
    operation_id = "login",
    summary = "Log in with email and password",
    description = "Returns a bearer token and the user profile. Deactivated accounts cannot log in.",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = LoginResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Wrong credentials (INVALID_CREDENTIALS)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, memo, payload), fields(email = %payload.email))]
pub async fn login(
    State(state): State<AppState>,
    memo: RequestMemo,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let creds = payload.validate()?;
    let svc = Services::new(&state, &memo);
    Ok(Json(user::login(svc, creds).await?))
}

#[utoipa::path(
    get,
    path = "/me",
    tag = "Auth",
    operation_id = "getCurrentUser",
    summary = "Get the current user",
    responses(
        (status = 200, description = "Current user", body = UserResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, memo, auth_user), fields(user_id = %auth_user.user_id))]
pub async fn me(
    auth_user: AuthUser,
    State(state): State<AppState>,
    memo: RequestMemo,
) -> Result<Json<UserResponse>, AppError> {
    let svc = Services::new(&state, &memo);
    Ok(Json(user::me(svc, &auth_user.actor()).await?))
}
