//! Shared key validation for storage backends.

use object_store::path::Path;

use crate::traits::{StorageError, StorageResult};

/// Validate an object key and convert it to an object store path.
///
/// The key is kept verbatim (no percent-encoding), so the stored object name is
/// exactly the key the caller asked for.
pub fn to_path(key: &str) -> StorageResult<Path> {
    if key.is_empty() {
        return Err(StorageError::InvalidKey("Storage key is empty".to_string()));
    }
    if key.starts_with('/') || key.split('/').any(|part| part == "..") {
        return Err(StorageError::InvalidKey(format!(
            "Storage key contains invalid characters: {}",
            key
        )));
    }
    Path::parse(key).map_err(|e| StorageError::InvalidKey(format!("{}: {}", key, e)))
}

/// Split a raw name prefix into the directory to list and the prefix to filter by.
///
/// Object stores list by path segment, while callers expect plain string prefix
/// matching (`photos/ca` matches `photos/cat.png`). Listing the parent directory
/// and filtering on the full prefix gives the latter.
pub fn list_root(prefix: &str) -> StorageResult<Option<Path>> {
    match prefix.rfind('/') {
        Some(idx) if idx > 0 => to_path(&prefix[..idx]).map(Some),
        _ => Ok(None),
    }
}
