use std::collections::HashSet;

use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::validation::FieldErrors;

/// Default page size of list endpoints.
pub const DEFAULT_LIMIT: u64 = 20;
/// Largest page size a client may request.
pub const MAX_LIMIT: u64 = 100;
/// Largest offset; Postgres binds offsets as signed 64-bit.
pub const MAX_OFFSET: u64 = i64::MAX as u64;

/// `{success: true}` acknowledgement for operations with nothing else to return.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct SuccessResponse {
    #[schema(example = true)]
    pub success: bool,
}

impl SuccessResponse {
    pub fn ok() -> Self {
        Self { success: true }
    }
}

/// Normalized `limit`/`offset` window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub limit: u64,
    pub offset: u64,
}

impl Page {
    pub fn new(limit: Option<u64>, offset: Option<u64>) -> Self {
        Self {
            limit: limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT),
            offset: offset.unwrap_or(0).min(MAX_OFFSET),
        }
    }

    /// Whether rows remain after this window when `total` rows match.
    pub fn has_more(&self, total: u64) -> bool {
        self.offset.saturating_add(self.limit) < total
    }
}

/// Escape LIKE wildcard characters in a search string.
pub fn escape_like(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Serde helper for PATCH semantics on nullable fields.
///
/// * JSON field absent  => `None`          (don't update)
/// * JSON field = null  => `Some(None)`    (set to NULL)
/// * JSON field = value => `Some(Some(v))` (set to value)
pub fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Some(Option::deserialize(deserializer)?))
}

/// Validate a nullable PATCH text field. Blank clears the column.
pub fn patch_text(
    errors: &mut FieldErrors,
    field: &str,
    label: &str,
    value: Option<Option<String>>,
    max: usize,
) -> Option<Option<String>> {
    value.map(|v| errors.optional_text(field, label, v.as_deref(), max))
}

/// Validate a nullable PATCH reference field.
pub fn patch_uuid(
    errors: &mut FieldErrors,
    field: &str,
    label: &str,
    value: Option<Option<String>>,
) -> Option<Option<Uuid>> {
    value.map(|v| match v.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => errors.uuid(field, label, raw),
    })
}

/// Validate a caller-supplied slug: trimmed, lowercase, `min..=max` long and slug-shaped.
pub fn checked_slug(
    errors: &mut FieldErrors,
    value: Option<&str>,
    min: usize,
    max: usize,
) -> Option<String> {
    let raw = value.map(str::trim).filter(|v| !v.is_empty())?;
    let slug = raw.to_lowercase();
    let len = slug.chars().count();
    if len < min || len > max {
        errors.push("slug", format!("Slug must be {min}-{max} characters"));
        return None;
    }
    if !common::slug::is_valid_slug(&slug) {
        errors.push(
            "slug",
            "Slug may contain only lowercase letters, digits and single dashes",
        );
        return None;
    }
    Some(slug)
}

/// Validate an ordered id list for reorder operations (non-empty, no duplicates).
pub fn reorder_ids(errors: &mut FieldErrors, field: &str, ids: &[String]) -> Vec<Uuid> {
    if ids.is_empty() {
        errors.push(field, "List must not be empty");
        return Vec::new();
    }
    let mut seen = HashSet::new();
    let mut out = Vec::with_capacity(ids.len());
    for raw in ids {
        let Some(id) = errors.uuid(field, "Every id", raw) else {
            return Vec::new();
        };
        if !seen.insert(id) {
            errors.push(field, format!("Duplicate id {id} in reorder list"));
            return Vec::new();
        }
        out.push(id);
    }
    out
}
