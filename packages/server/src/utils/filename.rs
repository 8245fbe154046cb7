/// Longest original file name kept on a media row.
const MAX_ORIGINAL_NAME: usize = 255;

/// Reduce a client-supplied file name to a display-safe flat name.
///
/// Directory components are dropped, control characters removed and the
/// result capped at 255 characters. Falls back to `"upload"`.
pub fn sanitize_original_name(raw: Option<&str>) -> String {
    let flat = raw
        .unwrap_or_default()
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default();

    let cleaned: String = flat
        .chars()
        .filter(|c| !c.is_control())
        .take(MAX_ORIGINAL_NAME)
        .collect();
    let cleaned = cleaned.trim();

    if cleaned.is_empty() || cleaned == "." || cleaned == ".." {
        "upload".to_string()
    } else {
        cleaned.to_string()
    }
}

/// Last path segment of an object key.
pub fn key_file_name(key: &str) -> &str {
    key.rsplit('/').next().unwrap_or(key)
}
