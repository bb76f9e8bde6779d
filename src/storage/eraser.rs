//! Delete-by-name

use std::path::{Component, Path, PathBuf};
use tokio::fs;

use super::error::{Result, StorageError};

/// Join a single file name onto `dir`.
///
/// Returns `None` for empty names and for anything that is not exactly one
/// plain path component, so a request can never reach outside `dir`.
pub fn resolve_entry(dir: &Path, name: &str) -> Option<PathBuf> {
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(file)), None) => Some(dir.join(file)),
        _ => None,
    }
}

/// Remove `name` from `dir`.
///
/// `name` is the decoded request path; a leading `/` is ignored.
pub async fn delete_file(dir: &Path, name: &str) -> Result<()> {
    let name = name.trim_start_matches('/');
    let not_found = || StorageError::NotFound {
        name: name.to_string(),
    };

    let path = resolve_entry(dir, name).ok_or_else(not_found)?;
    let metadata = fs::symlink_metadata(&path).await.map_err(|_| not_found())?;

    let removed = if metadata.is_dir() {
        fs::remove_dir(&path).await
    } else {
        fs::remove_file(&path).await
    };

    removed.map_err(|source| StorageError::Delete {
        name: name.to_string(),
        source,
    })
}
