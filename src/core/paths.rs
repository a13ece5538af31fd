// src/core/paths.rs

use crate::constants::{BACKUP_DIR_NAME, SETTINGS_FILENAME};
use anyhow::{Result, anyhow};
use lazy_static::lazy_static;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;

lazy_static! {
    static ref WOMM_CONFIG_DIR: Mutex<Option<PathBuf>> = Mutex::new(None);
}

#[derive(Error, Debug)]
pub enum PathError {
    #[error("Could not find system config directory.")]
    ConfigDirNotFound,
    #[error("Could not create directory at '{path}': {source}")]
    DirCreation {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Returns the womm configuration directory (`<config_dir>/womm`), creating it
/// if needed. The first successful lookup is cached for the process lifetime.
pub fn get_womm_config_dir() -> Result<PathBuf, PathError> {
    let mut cached = WOMM_CONFIG_DIR
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());

    if let Some(path) = &*cached {
        return Ok(path.clone());
    }

    let config_path = dirs::config_dir()
        .ok_or(PathError::ConfigDirNotFound)?
        .join("womm");
    ensure_dir(&config_path)?;

    *cached = Some(config_path.clone());
    Ok(config_path)
}

/// `<config_dir>/womm/config.toml`.
pub fn get_settings_path() -> Result<PathBuf, PathError> {
    get_womm_config_dir().map(|dir| dir.join(SETTINGS_FILENAME))
}

/// `<config_dir>/womm/backups`, where backups land when no path is given.
pub fn get_default_backup_dir() -> Result<PathBuf, PathError> {
    get_womm_config_dir().map(|dir| dir.join(BACKUP_DIR_NAME))
}

/// Creates `path` and its parents if missing.
pub fn ensure_dir(path: &Path) -> Result<(), PathError> {
    if path.is_dir() {
        return Ok(());
    }
    fs::create_dir_all(path).map_err(|e| PathError::DirCreation {
        path: path.display().to_string(),
        source: e,
    })
}

/// Expands `~` and environment variables (`$VAR`, `${VAR}`) in a user-supplied path.
pub fn expand_path(template: &str) -> Result<PathBuf> {
    let expanded = shellexpand::full(template)
        .map_err(|e| anyhow!("Failed to expand path '{}': {}", template, e))?;
    Ok(PathBuf::from(expanded.into_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_ensure_dir_is_idempotent() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        ensure_dir(&nested).unwrap();
        ensure_dir(&nested).unwrap();
        assert!(nested.is_dir());
    }

    #[test]
    fn test_expand_path_home() {
        let home = dirs::home_dir().unwrap();
        assert_eq!(expand_path("~/backups").unwrap(), home.join("backups"));
        assert_eq!(expand_path("plain/dir").unwrap(), PathBuf::from("plain/dir"));
    }

    #[test]
    fn test_expand_path_rejects_unknown_variable() {
        assert!(expand_path("$WOMM_SURELY_UNDEFINED_VAR/x").is_err());
    }
}
