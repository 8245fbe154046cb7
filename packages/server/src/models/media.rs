use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entity::media;
use crate::error::AppError;
use crate::validation::FieldErrors;

use super::shared::{double_option, patch_text};

pub const ALT_TEXT_MAX: usize = 255;
pub const CAPTION_MAX: usize = 2000;

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MediaResponse {
    pub id: Uuid,
    #[schema(example = "1718000000000-k3j9x0a1b2c3d.webp")]
    pub file_name: String,
    #[schema(example = "stadium.jpg")]
    pub original_name: String,
    pub storage_key: String,
    /// Public URL of the stored object.
    pub url: String,
    #[schema(example = "image/webp")]
    pub mime_type: String,
    /// Stored size in bytes.
    pub file_size: i64,
    pub width: i32,
    pub height: i32,
    pub alt_text: Option<String>,
    pub caption: Option<String>,
    pub uploaded_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<media::Model> for MediaResponse {
    fn from(m: media::Model) -> Self {
        Self {
            id: m.id,
            file_name: m.file_name,
            original_name: m.original_name,
            storage_key: m.storage_key,
            url: m.public_url,
            mime_type: m.mime_type,
            file_size: m.file_size,
            width: m.width,
            height: m.height,
            alt_text: m.alt_text,
            caption: m.caption,
            uploaded_by: m.uploaded_by,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

/// Metadata submitted alongside an uploaded file.
#[derive(Debug, Clone, Default)]
pub struct MediaMeta {
    pub alt_text: Option<String>,
    pub caption: Option<String>,
}

impl MediaMeta {
    pub fn validate(alt_text: Option<&str>, caption: Option<&str>) -> Result<Self, AppError> {
        let mut errors = FieldErrors::new();
        let alt_text = errors.optional_text("altText", "Alt text", alt_text, ALT_TEXT_MAX);
        let caption = errors.optional_text("caption", "Caption", caption, CAPTION_MAX);
        errors.finish(Self { alt_text, caption })
    }
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct UploadResponse {
    pub success: bool,
    pub media: MediaResponse,
    /// Same as `media.url`.
    pub url: String,
}

/// One file of a batch that did not make it.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct UploadFailure {
    /// Client file name.
    pub file: String,
    pub error: String,
    #[schema(example = "INVALID_FILE_TYPE")]
    pub code: &'static str,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct BatchUploadResponse {
    /// True only when every file was stored.
    pub success: bool,
    pub uploaded: usize,
    pub total: usize,
    pub media: Vec<MediaResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<UploadFailure>>,
}

#[derive(Debug, Default, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMediaRequest {
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub alt_text: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub caption: Option<Option<String>>,
}

#[derive(Debug, Clone, Default)]
pub struct MediaPatch {
    pub alt_text: Option<Option<String>>,
    pub caption: Option<Option<String>>,
}

impl UpdateMediaRequest {
    pub fn validate(self) -> Result<MediaPatch, AppError> {
        let mut errors = FieldErrors::new();
        let alt_text = patch_text(&mut errors, "altText", "Alt text", self.alt_text, ALT_TEXT_MAX);
        let caption = patch_text(&mut errors, "caption", "Caption", self.caption, CAPTION_MAX);
        errors.finish(MediaPatch { alt_text, caption })
    }
}

#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct MediaListQuery {
    pub uploaded_by: Option<Uuid>,
    /// Case-insensitive substring over file name, alt text and caption.
    pub search: Option<String>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct MediaStatsQuery {
    pub uploaded_by: Option<Uuid>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MediaListResponse {
    pub data: Vec<MediaResponse>,
    pub count: u64,
    pub has_more: bool,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MediaStatsResponse {
    pub total_files: u64,
    /// Bytes.
    pub total_size: i64,
    /// Megabytes, two decimals.
    pub total_size_mb: f64,
}

impl MediaStatsResponse {
    pub fn new(total_files: u64, total_size: i64) -> Self {
        let mb = total_size as f64 / (1024.0 * 1024.0);
        Self {
            total_files,
            total_size,
            total_size_mb: (mb * 100.0).round() / 100.0,
        }
    }
}

/// Whether the stored object went away together with the row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum StorageCleanup {
    Done,
    /// Row deleted, object still in storage.
    Pending,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeleteMediaResponse {
    pub success: bool,
    pub storage_cleanup: StorageCleanup,
}
