use chrono::{DateTime, Utc};
use common::UserRole;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entity::user;
use crate::error::AppError;
use crate::validation::{FieldErrors, is_valid_email};

use super::shared::{double_option, patch_text};

pub const PASSWORD_MIN: usize = 8;
pub const PASSWORD_MAX: usize = 128;
pub const NAME_MIN: usize = 2;
pub const NAME_MAX: usize = 255;
pub const AVATAR_URL_MAX: usize = 2048;

/// Public view of a user. Never carries the password hash.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: Uuid,
    #[schema(example = "demo@pz-news.com")]
    pub email: String,
    #[schema(example = "Demo Author")]
    pub full_name: String,
    pub role: UserRole,
    pub avatar_url: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<user::Model> for UserResponse {
    fn from(m: user::Model) -> Self {
        Self {
            id: m.id,
            email: m.email,
            full_name: m.full_name,
            role: m.role,
            avatar_url: m.avatar_url,
            is_active: m.is_active,
            created_at: m.created_at,
        }
    }
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct UserListResponse {
    pub users: Vec<UserResponse>,
}

fn check_email(errors: &mut FieldErrors, raw: &str) -> Option<String> {
    let email = raw.trim().to_lowercase();
    if is_valid_email(&email) {
        Some(email)
    } else {
        errors.push("email", "Email must be a valid address");
        None
    }
}

fn check_password(errors: &mut FieldErrors, password: &str) -> Option<String> {
    let len = password.chars().count();
    if (PASSWORD_MIN..=PASSWORD_MAX).contains(&len) {
        Some(password.to_string())
    } else {
        errors.push(
            "password",
            format!("Password must be {PASSWORD_MIN}-{PASSWORD_MAX} characters"),
        );
        None
    }
}

#[derive(Debug, Default, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    #[schema(example = "editor@pz-news.com")]
    pub email: Option<String>,
    /// 8-128 characters.
    pub password: Option<String>,
    #[schema(example = "Мария Петрова")]
    pub full_name: Option<String>,
    /// `admin`, `editor` or `author` (default).
    pub role: Option<String>,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub role: UserRole,
    pub avatar_url: Option<String>,
}

impl CreateUserRequest {
    pub fn validate(self) -> Result<NewUser, AppError> {
        let mut errors = FieldErrors::new();
        let email = match self.email.as_deref() {
            Some(raw) => check_email(&mut errors, raw),
            None => {
                errors.push("email", "Email is required");
                None
            }
        };
        let password = match self.password.as_deref() {
            Some(raw) => check_password(&mut errors, raw),
            None => {
                errors.push("password", "Password is required");
                None
            }
        };
        let full_name =
            errors.required_text("fullName", "Full name", self.full_name.as_deref(), NAME_MIN, NAME_MAX);
        let role = match self.role.as_deref() {
            None => Some(UserRole::default()),
            Some(raw) => errors.parse("role", raw.trim()),
        };
        let avatar_url =
            errors.optional_text("avatarUrl", "Avatar URL", self.avatar_url.as_deref(), AVATAR_URL_MAX);

        match (email, password, full_name, role) {
            (Some(email), Some(password), Some(full_name), Some(role)) => errors.finish(NewUser {
                email,
                password,
                full_name,
                role,
                avatar_url,
            }),
            _ => Err(errors.into_error()),
        }
    }
}

#[derive(Debug, Default, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub email: Option<String>,
    /// Replaces the password when present.
    pub password: Option<String>,
    pub full_name: Option<String>,
    pub role: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub avatar_url: Option<Option<String>>,
    /// Deactivated users cannot log in.
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default)]
pub struct UserPatch {
    pub email: Option<String>,
    pub password: Option<String>,
    pub full_name: Option<String>,
    pub role: Option<UserRole>,
    pub avatar_url: Option<Option<String>>,
    pub is_active: Option<bool>,
}

impl UpdateUserRequest {
    pub fn validate(self) -> Result<UserPatch, AppError> {
        let mut errors = FieldErrors::new();
        let email = self.email.as_deref().and_then(|raw| check_email(&mut errors, raw));
        let password = self
            .password
            .as_deref()
            .and_then(|raw| check_password(&mut errors, raw));
        let full_name = self.full_name.as_deref().and_then(|n| {
            errors.required_text("fullName", "Full name", Some(n), NAME_MIN, NAME_MAX)
        });
        let role = self
            .role
            .as_deref()
            .and_then(|raw| errors.parse("role", raw.trim()));
        let avatar_url = patch_text(&mut errors, "avatarUrl", "Avatar URL", self.avatar_url, AVATAR_URL_MAX);

        errors.finish(UserPatch {
            email,
            password,
            full_name,
            role,
            avatar_url,
            is_active: self.is_active,
        })
    }
}
