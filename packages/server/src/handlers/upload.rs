use axum::Json;
use axum::extract::multipart::Field;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use tracing::instrument;

use crate::config::UploadConfig;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::memo::RequestMemo;
use crate::models::media::{BatchUploadResponse, MediaMeta, UploadResponse};
use crate::services::media::{self, UploadedFile};
use crate::services::Services;
use crate::state::AppState;

/// Room for multipart framing and the text fields around the files.
const MULTIPART_SLACK: usize = 64 * 1024;

/// Body limit for the upload routes: a full batch of maximum-size files.
pub fn upload_body_limit(config: &UploadConfig) -> DefaultBodyLimit {
    let files = config.max_batch_files.max(1);
    DefaultBodyLimit::max(
        config
            .max_file_size
            .saturating_mul(files)
            .saturating_add(MULTIPART_SLACK),
    )
}

fn multipart_error(e: axum::extract::multipart::MultipartError) -> AppError {
    AppError::Validation(format!("Multipart error: {e}"))
}

/// Declared type of a part, falling back to a guess from the file name.
fn declared_mime(field: &Field<'_>) -> String {
    field
        .content_type()
        .map(str::to_string)
        .or_else(|| {
            field
                .file_name()
                .and_then(|name| mime_guess::from_path(name).first())
                .map(|m| m.to_string())
        })
        .unwrap_or_else(|| "application/octet-stream".to_string())
}

/// Buffer a file part. Reading stops once `max_size` is exceeded; the returned
/// `size` then reports more than the limit and the upload is rejected later.
async fn read_file_field(mut field: Field<'_>, max_size: usize) -> Result<UploadedFile, AppError> {
    let file_name = field.file_name().map(str::to_string);
    let content_type = declared_mime(&field);

    let mut bytes = Vec::new();
    let mut size = 0usize;
    while let Some(chunk) = field
        .chunk()
        .await
        .map_err(|e| AppError::Validation(format!("Upload read error: {e}")))?
    {
        size += chunk.len();
        if size > max_size {
            bytes.clear();
            break;
        }
        bytes.extend_from_slice(&chunk);
    }

    Ok(UploadedFile {
        file_name,
        content_type,
        size,
        bytes,
    })
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Media",
    operation_id = "uploadImage",
    summary = "Upload one image",
    description = "Multipart fields: `file` (required), `altText` and `caption` (optional). \
        JPEG, PNG and WebP are accepted. The image is resized to fit the configured \
        maximum dimension and stored as WebP.",
    request_body(content_type = "multipart/form-data", description = "Image file with optional alt text and caption"),
    responses(
        (status = 200, description = "Image stored", body = UploadResponse),
        (status = 400, description = "Bad file (VALIDATION_ERROR, INVALID_FILE_TYPE, FILE_TOO_LARGE)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 500, description = "Storage failure (UPSTREAM_FAILURE)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, memo, auth_user, multipart), fields(user_id = %auth_user.user_id))]
pub async fn upload_image(
    auth_user: AuthUser,
    State(state): State<AppState>,
    memo: RequestMemo,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    let max_size = state.config.upload.max_file_size;

    let mut file: Option<UploadedFile> = None;
    let mut alt_text: Option<String> = None;
    let mut caption: Option<String> = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        match field.name() {
            Some("file") => file = Some(read_file_field(field, max_size).await?),
            Some("altText") => alt_text = Some(field.text().await.map_err(multipart_error)?),
            Some("caption") => caption = Some(field.text().await.map_err(multipart_error)?),
            _ => {}
        }
    }

    let file = file.ok_or_else(|| AppError::Validation("No file provided".into()))?;
    let meta = MediaMeta::validate(alt_text.as_deref(), caption.as_deref())?;

    let svc = Services::new(&state, &memo);
    let stored = media::upload(svc, &auth_user.actor(), file, meta).await?;
    Ok(Json(UploadResponse {
        success: true,
        url: stored.url.clone(),
        media: stored,
    }))
}

#[utoipa::path(
    put,
    path = "/",
    tag = "Media",
    operation_id = "uploadImages",
    summary = "Upload several images",
    description = "Each `files` (or `files[]`) part is processed on its own. Failed files are \
        listed in `errors` and do not stop the rest; `success` is true only when every file was stored.",
    request_body(content_type = "multipart/form-data", description = "One or more image files"),
    responses(
        (status = 200, description = "Batch processed", body = BatchUploadResponse),
        (status = 400, description = "No files or too many files (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, memo, auth_user, multipart), fields(user_id = %auth_user.user_id))]
pub async fn upload_images(
    auth_user: AuthUser,
    State(state): State<AppState>,
    memo: RequestMemo,
    mut multipart: Multipart,
) -> Result<Json<BatchUploadResponse>, AppError> {
    let upload = &state.config.upload;

    let mut files = Vec::new();
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if !matches!(field.name(), Some("files") | Some("files[]")) {
            continue;
        }
        // One past the limit is enough for the batch to be refused.
        if files.len() > upload.max_batch_files {
            break;
        }
        files.push(read_file_field(field, upload.max_file_size).await?);
    }

    let svc = Services::new(&state, &memo);
    Ok(Json(media::upload_batch(svc, &auth_user.actor(), files).await?))
}

