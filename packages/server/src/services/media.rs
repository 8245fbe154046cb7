//! Media library: the upload pipeline plus metadata management.
//!
//! Upload order is validate, process, store, then insert the row. Delete order is
//! the reverse: the row goes first, the stored object second.

use chrono::Utc;
use common::storage::PutOptions;
use sea_orm::prelude::Expr;
use sea_orm::sea_query::{Func, LikeExpr};
use sea_orm::*;
use tracing::instrument;
use uuid::Uuid;

use crate::cache::tags;
use crate::entity::{article, media};
use crate::error::AppError;
use crate::imaging::{self, OUTPUT_MIME_TYPE, UPLOAD_CACHE_CONTROL, UploadLimits};
use crate::models::media::*;
use crate::models::shared::{Page, escape_like};
use crate::utils::filename::{key_file_name, sanitize_original_name};

use super::Services;
use super::policy::{Action, Actor};

/// A file as read from a multipart request.
#[derive(Debug)]
pub struct UploadedFile {
    pub file_name: Option<String>,
    pub content_type: String,
    /// Bytes the client sent for this part. May exceed `bytes.len()` when the
    /// reader stopped early.
    pub size: usize,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn display_name(&self) -> String {
        sanitize_original_name(self.file_name.as_deref())
    }
}

pub async fn find<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<media::Model, AppError> {
    media::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Media {id} not found")))
}

fn dimension(value: u32) -> Result<i32, AppError> {
    i32::try_from(value).map_err(|_| AppError::Internal(format!("dimension {value} out of range")))
}

/// Validate, normalize, store and record one file.
async fn store_one(
    svc: Services<'_>,
    actor: &Actor,
    file: UploadedFile,
    meta: MediaMeta,
) -> Result<media::Model, AppError> {
    let limits = UploadLimits::from(&svc.config.upload);
    imaging::check_upload(&file.content_type, file.size, &limits)?;

    let original_name = file.display_name();
    let processed = imaging::process_upload(file.bytes, &file.content_type, limits).await?;
    let (width, height) = (dimension(processed.width)?, dimension(processed.height)?);
    let file_size = processed.bytes.len() as i64;

    let key = imaging::storage_key(Utc::now().timestamp_millis());
    let options = PutOptions::new(OUTPUT_MIME_TYPE).with_cache_control(UPLOAD_CACHE_CONTROL);
    svc.store.put(&key, processed.bytes, &options).await?;

    let now = Utc::now();
    let inserted = media::ActiveModel {
        id: Set(Uuid::now_v7()),
        file_name: Set(key_file_name(&key).to_string()),
        original_name: Set(original_name),
        storage_key: Set(key.clone()),
        public_url: Set(svc.store.public_url(&key)),
        mime_type: Set(OUTPUT_MIME_TYPE.to_string()),
        file_size: Set(file_size),
        width: Set(width),
        height: Set(height),
        alt_text: Set(meta.alt_text),
        caption: Set(meta.caption),
        uploaded_by: Set(Some(actor.id)),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(svc.db)
    .await;

    match inserted {
        Ok(model) => {
            tracing::info!(media_id = %model.id, key = %key, size = file_size, "media stored");
            Ok(model)
        }
        Err(e) => {
            // One best-effort attempt; a failure leaves an orphaned object.
            if let Err(cleanup) = svc.store.delete(&key).await {
                tracing::warn!(key = %key, error = %cleanup, "orphaned upload could not be removed");
            }
            Err(AppError::from_constraint(e, || {
                format!("Storage key '{key}' is already taken")
            }))
        }
    }
}

#[instrument(skip(svc, file, meta), fields(actor = %actor.id, file = ?file.file_name, size = file.size))]
pub async fn upload(
    svc: Services<'_>,
    actor: &Actor,
    file: UploadedFile,
    meta: MediaMeta,
) -> Result<MediaResponse, AppError> {
    actor.require(Action::UploadMedia)?;
    Ok(store_one(svc, actor, file, meta).await?.into())
}

/// Upload each file independently. Failures are reported per file and never
/// abort the rest of the batch.
#[instrument(skip(svc, files), fields(actor = %actor.id, total = files.len()))]
pub async fn upload_batch(
    svc: Services<'_>,
    actor: &Actor,
    files: Vec<UploadedFile>,
) -> Result<BatchUploadResponse, AppError> {
    actor.require(Action::UploadMedia)?;
    if files.is_empty() {
        return Err(AppError::Validation("No files provided".into()));
    }
    let max = svc.config.upload.max_batch_files;
    if files.len() > max {
        return Err(AppError::Validation(format!(
            "At most {max} files may be uploaded at once"
        )));
    }

    let total = files.len();
    let mut stored = Vec::with_capacity(total);
    let mut failures = Vec::new();
    for file in files {
        let name = file.display_name();
        match store_one(svc, actor, file, MediaMeta::default()).await {
            Ok(model) => stored.push(MediaResponse::from(model)),
            Err(e) => {
                let (_, body) = e.status_and_body();
                failures.push(UploadFailure {
                    file: name,
                    error: body.error,
                    code: body.code,
                });
            }
        }
    }

    Ok(BatchUploadResponse {
        success: failures.is_empty(),
        uploaded: stored.len(),
        total,
        media: stored,
        errors: (!failures.is_empty()).then_some(failures),
    })
}

pub async fn get(svc: Services<'_>, id: Uuid) -> Result<MediaResponse, AppError> {
    Ok(find(svc.db, id).await?.into())
}

#[instrument(skip(svc, query))]
pub async fn list(svc: Services<'_>, query: MediaListQuery) -> Result<MediaListResponse, AppError> {
    let page = Page::new(query.limit, query.offset);

    let mut select = media::Entity::find();
    if let Some(uploader) = query.uploaded_by {
        select = select.filter(media::Column::UploadedBy.eq(uploader));
    }
    if let Some(ref search) = query.search {
        let term = escape_like(search.trim());
        if !term.is_empty() {
            let pattern = format!("%{}%", term.to_lowercase());
            let mut any = Condition::any();
            for column in [
                media::Column::FileName,
                media::Column::OriginalName,
                media::Column::AltText,
                media::Column::Caption,
            ] {
                any = any.add(
                    Expr::expr(Func::lower(Expr::col(column)))
                        .like(LikeExpr::new(pattern.clone()).escape('\\')),
                );
            }
            select = select.filter(any);
        }
    }

    let count = select.clone().count(svc.db).await?;
    let data = select
        .order_by_desc(media::Column::CreatedAt)
        .offset(Some(page.offset))
        .limit(Some(page.limit))
        .all(svc.db)
        .await?
        .into_iter()
        .map(MediaResponse::from)
        .collect();

    Ok(MediaListResponse {
        data,
        count,
        has_more: page.has_more(count),
    })
}

/// File count and stored bytes, optionally for one uploader.
pub async fn stats(svc: Services<'_>, uploaded_by: Option<Uuid>) -> Result<MediaStatsResponse, AppError> {
    let mut select = media::Entity::find()
        .select_only()
        .column_as(Expr::cust("COUNT(*)"), "total_files")
        .column_as(
            Expr::cust("CAST(COALESCE(SUM(file_size), 0) AS BIGINT)"),
            "total_size",
        );
    if let Some(uploader) = uploaded_by {
        select = select.filter(media::Column::UploadedBy.eq(uploader));
    }
    let (files, bytes) = select
        .into_tuple::<(i64, i64)>()
        .one(svc.db)
        .await?
        .unwrap_or((0, 0));
    Ok(MediaStatsResponse::new(Ord::max(files, 0) as u64, bytes))
}

#[instrument(skip(svc, patch), fields(actor = %actor.id))]
pub async fn update(
    svc: Services<'_>,
    actor: &Actor,
    id: Uuid,
    patch: MediaPatch,
) -> Result<MediaResponse, AppError> {
    let existing = find(svc.db, id).await?;
    actor.require(Action::ModifyMedia {
        uploaded_by: existing.uploaded_by,
    })?;

    let mut active: media::ActiveModel = existing.into();
    if let Some(alt_text) = patch.alt_text {
        active.alt_text = Set(alt_text);
    }
    if let Some(caption) = patch.caption {
        active.caption = Set(caption);
    }
    active.updated_at = Set(Utc::now());
    let model = active.update(svc.db).await?;

    // Article cards and pages embed alt text and caption.
    svc.cache.invalidate(&[tags::MEDIA]);
    Ok(model.into())
}

/// Delete the row, then the stored object. A storage failure leaves the row
/// deleted and reports the cleanup as pending.
#[instrument(skip(svc), fields(actor = %actor.id))]
pub async fn delete(svc: Services<'_>, actor: &Actor, id: Uuid) -> Result<DeleteMediaResponse, AppError> {
    let existing = find(svc.db, id).await?;
    actor.require(Action::ModifyMedia {
        uploaded_by: existing.uploaded_by,
    })?;

    let in_use = article::Entity::find()
        .filter(article::Column::FeaturedImageId.eq(id))
        .count(svc.db)
        .await?;
    if in_use > 0 {
        return Err(AppError::Conflict(format!(
            "Media is the featured image of {in_use} article(s)"
        )));
    }

    media::Entity::delete_by_id(id)
        .exec(svc.db)
        .await
        .map_err(|e| AppError::from_constraint(e, || "Media is still referenced by an article".into()))?;

    let storage_cleanup = match svc.store.delete(&existing.storage_key).await {
        Ok(_) => StorageCleanup::Done,
        Err(e) => {
            tracing::warn!(
                media_id = %id,
                key = %existing.storage_key,
                error = %e,
                "media row deleted, storage cleanup pending"
            );
            StorageCleanup::Pending
        }
    };

    tracing::info!(media_id = %id, ?storage_cleanup, "media deleted");
    Ok(DeleteMediaResponse {
        success: true,
        storage_cleanup,
    })
}
