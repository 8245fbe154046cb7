//! Field-level input validation.
//!
//! Request DTOs validate into typed records, collecting every violation instead
//! of stopping at the first one. Nothing here touches the database.

use serde::Serialize;
use uuid::Uuid;

use crate::error::AppError;

/// A single rejected input field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, utoipa::ToSchema)]
pub struct FieldError {
    /// Field name as sent by the client (camelCase).
    #[schema(example = "title")]
    pub field: String,
    #[schema(example = "Title must be 5-500 characters")]
    pub message: String,
}

/// Accumulates field violations while a request is being checked.
#[derive(Debug, Default)]
pub struct FieldErrors(Vec<FieldError>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, field: &str, message: impl Into<String>) {
        self.0.push(FieldError {
            field: field.to_string(),
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// `Ok(value)` when nothing was recorded, otherwise every recorded violation.
    pub fn finish<T>(self, value: T) -> Result<T, AppError> {
        if self.0.is_empty() {
            Ok(value)
        } else {
            Err(AppError::InvalidFields(self.0))
        }
    }

    /// The recorded violations as an error, for when a required value is missing.
    pub fn into_error(self) -> AppError {
        AppError::InvalidFields(self.0)
    }

    /// Required trimmed string whose length in characters lies in `min..=max`.
    pub fn required_text(
        &mut self,
        field: &str,
        label: &str,
        value: Option<&str>,
        min: usize,
        max: usize,
    ) -> Option<String> {
        match value.map(str::trim) {
            None | Some("") => {
                self.push(field, format!("{label} is required"));
                None
            }
            Some(v) => self.text_in_range(field, label, v, min, max),
        }
    }

    /// Optional trimmed string, at most `max` characters. Blank becomes `None`.
    pub fn optional_text(
        &mut self,
        field: &str,
        label: &str,
        value: Option<&str>,
        max: usize,
    ) -> Option<String> {
        let v = value.map(str::trim).filter(|v| !v.is_empty())?;
        self.text_in_range(field, label, v, 0, max)
    }

    fn text_in_range(
        &mut self,
        field: &str,
        label: &str,
        value: &str,
        min: usize,
        max: usize,
    ) -> Option<String> {
        let len = value.chars().count();
        if len < min || len > max {
            if min == 0 {
                self.push(field, format!("{label} must be at most {max} characters"));
            } else {
                self.push(field, format!("{label} must be {min}-{max} characters"));
            }
            return None;
        }
        Some(value.to_string())
    }

    /// Parse a UUID-shaped string.
    pub fn uuid(&mut self, field: &str, label: &str, value: &str) -> Option<Uuid> {
        match Uuid::parse_str(value.trim()) {
            Ok(id) => Some(id),
            Err(_) => {
                self.push(field, format!("{label} must be a valid UUID"));
                None
            }
        }
    }

    /// Parse an enum-like value with `FromStr`, reporting the parser's message.
    pub fn parse<T>(&mut self, field: &str, value: &str) -> Option<T>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        match value.parse::<T>() {
            Ok(v) => Some(v),
            Err(e) => {
                self.push(field, e.to_string());
                None
            }
        }
    }

    /// A list of short labels: at most `max_items`, each trimmed to `1..=max_len`
    /// characters. Duplicates are dropped, first occurrence wins.
    pub fn label_list(
        &mut self,
        field: &str,
        label: &str,
        values: &[String],
        max_items: usize,
        max_len: usize,
    ) -> Vec<String> {
        if values.len() > max_items {
            self.push(field, format!("At most {max_items} {label} are allowed"));
            return Vec::new();
        }
        let mut out: Vec<String> = Vec::with_capacity(values.len());
        for v in values {
            let v = v.trim();
            let len = v.chars().count();
            if len == 0 || len > max_len {
                self.push(
                    field,
                    format!("Each of the {label} must be 1-{max_len} characters"),
                );
                return Vec::new();
            }
            if !out.iter().any(|existing| existing == v) {
                out.push(v.to_string());
            }
        }
        out
    }
}

/// Very small structural e-mail check: one `@`, non-empty local part, dotted domain.
pub fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && !email.chars().any(char::is_whitespace)
        && domain
            .split('.')
            .filter(|part| !part.is_empty())
            .count()
            >= 2
        && !domain.starts_with('.')
        && !domain.ends_with('.')
}
