use chrono::Utc;
use sea_orm::*;
use tracing::instrument;
use uuid::Uuid;

use crate::entity::user;
use crate::error::AppError;
use crate::models::auth::{Credentials, LoginResponse};
use crate::models::user::*;
use crate::utils::{hash, jwt};

use super::Services;
use super::policy::{Action, Actor};

fn email_taken(email: &str) -> String {
    format!("A user with email '{email}' already exists")
}

pub async fn find<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<user::Model, AppError> {
    user::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {id} not found")))
}

pub async fn find_by_email<C: ConnectionTrait>(db: &C, email: &str) -> Result<Option<user::Model>, AppError> {
    Ok(user::Entity::find()
        .filter(user::Column::Email.eq(email))
        .one(db)
        .await?)
}

fn hash_password(password: &str) -> Result<String, AppError> {
    hash::hash_password(password).map_err(|e| AppError::Internal(format!("Password hash error: {e}")))
}

/// Exchange credentials for a bearer token. Unknown, wrong and deactivated
/// accounts all fail the same way.
#[instrument(skip(svc, creds), fields(email = %creds.email))]
pub async fn login(svc: Services<'_>, creds: Credentials) -> Result<LoginResponse, AppError> {
    let user = find_by_email(svc.db, &creds.email)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    let is_valid = hash::verify_password(&creds.password, &user.password)
        .map_err(|e| AppError::Internal(format!("Password verify error: {e}")))?;
    if !is_valid || !user.is_active {
        return Err(AppError::InvalidCredentials);
    }

    let auth = &svc.config.auth;
    let token = jwt::sign(user.id, &user.email, user.role, &auth.jwt_secret, auth.token_ttl_days)
        .map_err(|e| AppError::Internal(format!("JWT sign error: {e}")))?;

    tracing::info!(user_id = %user.id, "login succeeded");
    Ok(LoginResponse {
        token,
        user: user.into(),
    })
}

/// Profile of the token holder.
pub async fn me(svc: Services<'_>, actor: &Actor) -> Result<UserResponse, AppError> {
    let user = find(svc.db, actor.id).await?;
    if !user.is_active {
        return Err(AppError::TokenInvalid);
    }
    Ok(user.into())
}

pub async fn list(svc: Services<'_>, actor: &Actor) -> Result<Vec<UserResponse>, AppError> {
    actor.require(Action::ManageUsers)?;
    Ok(user::Entity::find()
        .order_by_asc(user::Column::FullName)
        .all(svc.db)
        .await?
        .into_iter()
        .map(UserResponse::from)
        .collect())
}

/// Insert a user without an authorization check. Used by `create` and at bootstrap.
pub async fn insert<C: ConnectionTrait>(db: &C, input: NewUser) -> Result<user::Model, AppError> {
    if find_by_email(db, &input.email).await?.is_some() {
        return Err(AppError::Conflict(email_taken(&input.email)));
    }
    let password = hash_password(&input.password)?;
    let now = Utc::now();
    let email = input.email;
    user::ActiveModel {
        id: Set(Uuid::now_v7()),
        email: Set(email.clone()),
        password: Set(password),
        full_name: Set(input.full_name),
        role: Set(input.role),
        avatar_url: Set(input.avatar_url),
        is_active: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(|e| AppError::from_constraint(e, || email_taken(&email)))
}

#[instrument(skip(svc, input), fields(actor = %actor.id, email = %input.email))]
pub async fn create(svc: Services<'_>, actor: &Actor, input: NewUser) -> Result<UserResponse, AppError> {
    actor.require(Action::ManageUsers)?;
    let user = insert(svc.db, input).await?;
    tracing::info!(user_id = %user.id, role = %user.role, "user created");
    Ok(user.into())
}

#[instrument(skip(svc, patch), fields(actor = %actor.id))]
pub async fn update(
    svc: Services<'_>,
    actor: &Actor,
    id: Uuid,
    patch: UserPatch,
) -> Result<UserResponse, AppError> {
    actor.require(Action::ManageUsers)?;
    let existing = find(svc.db, id).await?;

    if let Some(email) = &patch.email
        && *email != existing.email
        && find_by_email(svc.db, email).await?.is_some()
    {
        return Err(AppError::Conflict(email_taken(email)));
    }

    let mut active: user::ActiveModel = existing.into();
    if let Some(email) = patch.email.clone() {
        active.email = Set(email);
    }
    if let Some(password) = &patch.password {
        active.password = Set(hash_password(password)?);
    }
    if let Some(full_name) = patch.full_name {
        active.full_name = Set(full_name);
    }
    if let Some(role) = patch.role {
        active.role = Set(role);
    }
    if let Some(avatar_url) = patch.avatar_url {
        active.avatar_url = Set(avatar_url);
    }
    if let Some(is_active) = patch.is_active {
        active.is_active = Set(is_active);
    }
    active.updated_at = Set(Utc::now());

    let model = active.update(svc.db).await.map_err(|e| {
        AppError::from_constraint(e, || email_taken(patch.email.as_deref().unwrap_or_default()))
    })?;
    Ok(model.into())
}
