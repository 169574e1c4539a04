use crate::errors::{AppError, AppResult};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use uuid::Uuid;

/// Reads a whole JSON document, `Ok(None)` when the file does not exist.
/// Unreadable files and malformed JSON are errors.
pub fn read_json_document<T: DeserializeOwned>(path: &Path) -> AppResult<Option<T>> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(error) if error.kind() == ErrorKind::NotFound => return Ok(None),
        Err(error) => return Err(AppError::Io(format!("{}: {}", path.display(), error))),
    };
    serde_json::from_slice(&bytes).map(Some).map_err(|error| {
        AppError::Conflict(format!("{} is not a valid document: {}", path.display(), error))
    })
}

/// Fail-soft read: a missing, unreadable or malformed document comes back
/// as `T::default()`. Writers must go through [`read_json_document`] first
/// so a damaged file is never replaced by an empty one.
pub fn read_json_or_default<T: DeserializeOwned + Default>(path: &Path) -> T {
    match read_json_document(path) {
        Ok(Some(value)) => value,
        Ok(None) => {
            tracing::debug!(path = %path.to_string_lossy(), "document missing; starting empty");
            T::default()
        }
        Err(error) => {
            tracing::error!(
                path = %path.to_string_lossy(),
                error = %error,
                "unusable document; reading as empty"
            );
            T::default()
        }
    }
}

/// Rewrites the whole document through a sibling temp file and a rename,
/// so a crash mid-write leaves the previous version intact.
pub fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> AppResult<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|error| AppError::Io(error.to_string()))?;
    }
    let bytes = serde_json::to_vec_pretty(value)?;
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| AppError::Io(format!("invalid document path {}", path.display())))?;
    let temp = path.with_file_name(format!(".{}.{}.tmp", file_name, Uuid::new_v4().simple()));
    fs::write(&temp, bytes).map_err(|error| AppError::Io(error.to_string()))?;
    if let Err(error) = fs::rename(&temp, path) {
        let _ = fs::remove_file(&temp);
        return Err(AppError::Io(error.to_string()));
    }
    Ok(())
}
