use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use common::storage::StorageError;
use sea_orm::{DbErr, SqlErr};
use serde::Serialize;

use crate::imaging::ImageError;
use crate::validation::FieldError;

/// Structured error response returned by all endpoints on failure.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorBody {
    /// Machine-readable error code. One of: `VALIDATION_ERROR`, `INVALID_FILE_TYPE`,
    /// `FILE_TOO_LARGE`, `CONFLICT`, `TOKEN_MISSING`, `TOKEN_INVALID`,
    /// `INVALID_CREDENTIALS`, `PERMISSION_DENIED`, `NOT_FOUND`, `UPSTREAM_FAILURE`,
    /// `INTERNAL_ERROR`.
    #[schema(example = "VALIDATION_ERROR")]
    pub code: &'static str,
    /// Human-readable error description.
    #[schema(example = "Title must be 5-500 characters")]
    pub error: String,
    /// Per-field violations, present on validation failures.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<FieldError>>,
}

impl ErrorBody {
    fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            error: message.into(),
            details: None,
        }
    }
}

/// Application-level error type.
#[derive(Debug)]
pub enum AppError {
    /// Malformed request that could not be checked field by field.
    Validation(String),
    InvalidFields(Vec<FieldError>),
    InvalidFileType(String),
    FileTooLarge {
        limit: usize,
    },
    /// Uniqueness or reference rule violated (taken slug, category still in use).
    Conflict(String),
    TokenMissing,
    TokenInvalid,
    InvalidCredentials,
    PermissionDenied,
    NotFound(String),
    /// A collaborator (database, object storage, image codec) failed.
    Upstream(String),
    Internal(String),
}

impl AppError {
    /// Status and body this error renders as. Upstream and internal details are
    /// logged here and replaced by a generic message.
    pub fn status_and_body(self) -> (StatusCode, ErrorBody) {
        match self {
            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorBody::new("VALIDATION_ERROR", msg),
            ),
            AppError::InvalidFields(fields) => {
                let error = fields
                    .iter()
                    .map(|f| f.message.as_str())
                    .collect::<Vec<_>>()
                    .join("; ");
                (
                    StatusCode::BAD_REQUEST,
                    ErrorBody {
                        code: "VALIDATION_ERROR",
                        error,
                        details: Some(fields),
                    },
                )
            }
            AppError::InvalidFileType(mime) => (
                StatusCode::BAD_REQUEST,
                ErrorBody::new(
                    "INVALID_FILE_TYPE",
                    format!(
                        "Unsupported file type '{mime}'. Allowed: image/jpeg, image/png, image/webp"
                    ),
                ),
            ),
            AppError::FileTooLarge { limit } => (
                StatusCode::BAD_REQUEST,
                ErrorBody::new(
                    "FILE_TOO_LARGE",
                    format!("File exceeds the {} MB limit", limit / (1024 * 1024)),
                ),
            ),
            AppError::Conflict(msg) => (StatusCode::BAD_REQUEST, ErrorBody::new("CONFLICT", msg)),
            AppError::TokenMissing => (
                StatusCode::UNAUTHORIZED,
                ErrorBody::new("TOKEN_MISSING", "Authentication required"),
            ),
            AppError::TokenInvalid => (
                StatusCode::UNAUTHORIZED,
                ErrorBody::new("TOKEN_INVALID", "Invalid or expired token"),
            ),
            AppError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                ErrorBody::new("INVALID_CREDENTIALS", "Invalid email or password"),
            ),
            AppError::PermissionDenied => (
                StatusCode::FORBIDDEN,
                ErrorBody::new("PERMISSION_DENIED", "Insufficient permissions"),
            ),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, ErrorBody::new("NOT_FOUND", msg)),
            AppError::Upstream(detail) => {
                tracing::error!("Upstream failure: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody::new("UPSTREAM_FAILURE", "A backing service failed"),
                )
            }
            AppError::Internal(detail) => {
                tracing::error!("Internal error: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody::new("INTERNAL_ERROR", "An unexpected error occurred"),
                )
            }
        }
    }

    /// Map a store-level constraint rejection to `Conflict`, everything else to `Upstream`.
    pub fn from_constraint(err: DbErr, conflict: impl FnOnce() -> String) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(detail))
            | Some(SqlErr::ForeignKeyConstraintViolation(detail)) => {
                tracing::debug!("Constraint violation caught on write: {detail}");
                AppError::Conflict(conflict())
            }
            _ => AppError::from(err),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = self.status_and_body();
        (status, Json(body)).into_response()
    }
}

impl From<DbErr> for AppError {
    fn from(err: DbErr) -> Self {
        AppError::Upstream(format!("database: {err}"))
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(key) => AppError::NotFound(format!("Object '{key}' not found")),
            other => AppError::Upstream(format!("object storage: {other}")),
        }
    }
}

impl From<ImageError> for AppError {
    fn from(err: ImageError) -> Self {
        match err {
            ImageError::UnsupportedType(mime) => AppError::InvalidFileType(mime),
            ImageError::TooLarge { limit, .. } => AppError::FileTooLarge { limit },
            ImageError::Decode(msg) => {
                AppError::Validation(format!("File is not a readable image: {msg}"))
            }
            other => AppError::Internal(other.to_string()),
        }
    }
}
