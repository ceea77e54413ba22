use super::error::StorageError;

/// Maximum length of a blob path.
pub const MAX_PATH_LEN: usize = 512;

/// Checks if a path string contains path traversal patterns.
fn contains_path_traversal(path: &str) -> bool {
    path == ".."
        || path.starts_with("../")
        || path.contains("/../")
        || path.ends_with("/..")
}

/// Validates a blob path and returns it unchanged on success.
///
/// Accepted paths are relative, use `/` as separator, have no empty or
/// dot-prefixed segments and only contain `a-zA-Z0-9/-_.`.
pub fn validate_blob_path(path: &str) -> Result<&str, StorageError> {
    let invalid = |msg: &str| Err(StorageError::InvalidPath(msg.to_string()));

    if path.is_empty() {
        return invalid("path cannot be empty");
    }
    if path.len() > MAX_PATH_LEN {
        return invalid("path exceeds maximum length of 512 characters");
    }
    if path.contains('\0') {
        return invalid("path must not contain null bytes");
    }
    if path.contains('\\') {
        return invalid("path must not contain backslashes");
    }
    if path.starts_with('/') {
        return invalid("path must not start with '/'");
    }
    if contains_path_traversal(path) {
        return invalid("path must not contain '..' traversal");
    }
    for segment in path.split('/') {
        if segment.is_empty() {
            return invalid("path must not contain empty segments");
        }
        if segment.starts_with('.') {
            return invalid("path segments must not start with '.'");
        }
    }
    if !path
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '/' | '-' | '_' | '.'))
    {
        return invalid("path contains invalid characters (allowed: a-zA-Z0-9, /, -, _, .)");
    }

    Ok(path)
}

/// Validates a directory prefix for [`BlobStore::delete_prefix`](super::BlobStore::delete_prefix).
///
/// The empty prefix addresses the whole store; a trailing `/` is ignored.
pub fn validate_blob_prefix(prefix: &str) -> Result<&str, StorageError> {
    let trimmed = prefix.trim_end_matches('/');
    if trimmed.is_empty() {
        return Ok("");
    }
    validate_blob_path(trimmed)
}
