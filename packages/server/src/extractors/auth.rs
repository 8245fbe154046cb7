use axum::extract::{FromRequestParts, OptionalFromRequestParts};
use axum::http::request::Parts;
use common::UserRole;
use uuid::Uuid;

use crate::cache::queries;
use crate::error::AppError;
use crate::extractors::memo::RequestMemo;
use crate::services::Services;
use crate::services::policy::{Action, Actor};
use crate::state::AppState;
use crate::utils::jwt;

/// Authenticated user extracted from the `Authorization: Bearer <token>` header.
///
/// Add this as a handler parameter to require authentication, or take
/// `Option<AuthUser>` where anonymous callers get a reduced view.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub email: String,
    pub role: UserRole,
}

impl AuthUser {
    pub fn actor(&self) -> Actor {
        Actor {
            id: self.user_id,
            role: self.role,
        }
    }

    /// Returns `Ok(())` if the policy allows `action`, `Err(PermissionDenied)` otherwise.
    pub fn require(&self, action: Action) -> Result<(), AppError> {
        self.actor().require(action)
    }
}

fn bearer_token(parts: &Parts) -> Option<Result<&str, AppError>> {
    let header = parts.headers.get("Authorization")?;
    let token = header
        .to_str()
        .ok()
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or(AppError::TokenInvalid);
    Some(token)
}

/// Verify the token, then load the account so role changes and deactivation
/// apply immediately instead of at token expiry.
async fn resolve_user(parts: &mut Parts, state: &AppState, token: &str) -> Result<AuthUser, AppError> {
    let claims =
        jwt::verify(token, &state.config.auth.jwt_secret).map_err(|_| AppError::TokenInvalid)?;
    let Ok(memo) = <RequestMemo as FromRequestParts<AppState>>::from_request_parts(parts, state).await;
    let account = queries::user_by_id(Services::new(state, &memo), claims.uid)
        .await?
        .filter(|user| user.is_active)
        .ok_or(AppError::TokenInvalid)?;
    Ok(AuthUser {
        user_id: account.id,
        email: account.email,
        role: account.role,
    })
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or(AppError::TokenMissing)??.to_string();
        resolve_user(parts, state, &token).await
    }
}

/// A missing header means anonymous; a present but invalid token is still rejected.
impl OptionalFromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Option<Self>, Self::Rejection> {
        let token = match bearer_token(parts) {
            None => return Ok(None),
            Some(token) => token?.to_string(),
        };
        resolve_user(parts, state, &token).await.map(Some)
    }
}
