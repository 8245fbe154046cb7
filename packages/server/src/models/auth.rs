use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::validation::{FieldErrors, is_valid_email};

use super::user::UserResponse;

/// Request body for login.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct LoginRequest {
    #[schema(example = "demo@pz-news.com")]
    pub email: String,
    #[schema(example = "s3cure_P@ss!")]
    pub password: String,
}

/// Normalized credentials.
pub struct Credentials {
    /// Lowercased and trimmed.
    pub email: String,
    pub password: String,
}

impl LoginRequest {
    pub fn validate(self) -> Result<Credentials, AppError> {
        let mut errors = FieldErrors::new();
        let email = self.email.trim().to_lowercase();
        if !is_valid_email(&email) {
            errors.push("email", "Email must be a valid address");
        }
        if self.password.is_empty() {
            errors.push("password", "Password must not be empty");
        }
        errors.finish(Credentials {
            email,
            password: self.password,
        })
    }
}

/// Successful login response.
#[derive(Serialize, utoipa::ToSchema)]
pub struct LoginResponse {
    /// Bearer token valid for `auth.token_ttl_days` (7 by default).
    #[schema(example = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9...")]
    pub token: String,
    pub user: UserResponse,
}
