// src/core/backup_store.rs

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::core::errors::{ContextError, ContextResult};
use crate::models::BackupSnapshot;

/// Persists backup documents. The manager only needs to write a snapshot and
/// read back raw JSON so it can be validated before it is trusted.
pub trait BackupStore: Send + Sync + std::fmt::Debug {
    fn write(&self, path: &Path, snapshot: &BackupSnapshot) -> ContextResult<()>;
    fn read(&self, path: &Path) -> ContextResult<Value>;
}

/// Pretty-printed JSON files, written atomically.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonBackupStore;

impl BackupStore for JsonBackupStore {
    fn write(&self, path: &Path, snapshot: &BackupSnapshot) -> ContextResult<()> {
        let json = serde_json::to_string_pretty(snapshot)
            .map_err(|e| ContextError::unexpected("Failed to serialize backup", e))?;

        let parent = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&parent).map_err(|e| {
            ContextError::unexpected(format!("Cannot create '{}'", parent.display()), e)
        })?;

        // Write next to the target, then rename, so a crash never leaves half a file.
        let mut temp = tempfile::NamedTempFile::new_in(&parent).map_err(|e| {
            ContextError::unexpected(format!("Cannot write to '{}'", parent.display()), e)
        })?;
        temp.write_all(json.as_bytes())
            .and_then(|_| temp.flush())
            .map_err(|e| {
                ContextError::unexpected(format!("Cannot write backup '{}'", path.display()), e)
            })?;
        temp.persist(path).map_err(|e| {
            ContextError::unexpected(format!("Cannot save backup '{}'", path.display()), e.error)
        })?;

        log::info!("Backup written to {}", path.display());
        Ok(())
    }

    fn read(&self, path: &Path) -> ContextResult<Value> {
        let content = fs::read_to_string(path).map_err(|e| {
            ContextError::unexpected(format!("Cannot read backup '{}'", path.display()), e)
        })?;
        serde_json::from_str(&content).map_err(|e| {
            ContextError::validation(
                format!("Backup '{}' is not valid JSON", path.display()),
                vec![e.to_string()],
            )
        })
    }
}

/// `womm_backup_<YYYYmmdd_HHMMSS>.json`, local time.
pub fn default_backup_filename() -> String {
    format!(
        "womm_backup_{}.json",
        chrono::Local::now().format("%Y%m%d_%H%M%S")
    )
}
