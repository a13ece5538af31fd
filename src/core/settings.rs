// src/core/settings.rs

use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::core::paths;

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Filesystem Error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Path error: {0}")]
    Path(#[from] paths::PathError),
    #[error("Failed to parse settings file '{path}': {source}")]
    TomlDeserialize {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    #[error("Failed to serialize to TOML: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

/// User settings stored in `<config_dir>/womm/config.toml`.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Where backups are written when no explicit path is given.
    /// `~` and environment variables are expanded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup_dir: Option<String>,
    /// Extra directories searched for bare icon file names.
    pub extra_icon_dirs: Vec<String>,
}

impl Settings {
    /// Loads the settings file, writing the defaults on first use.
    pub fn load() -> Result<Self, SettingsError> {
        let path = paths::get_settings_path()?;
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self, SettingsError> {
        match fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(|e| SettingsError::TomlDeserialize {
                path: path.display().to_string(),
                source: e,
            }),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                log::debug!("No settings at {}; writing defaults.", path.display());
                let settings = Self::default();
                settings.save_to(path)?;
                Ok(settings)
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<(), SettingsError> {
        if let Some(parent) = path.parent() {
            paths::ensure_dir(parent)?;
        }
        fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }

    /// The configured backup directory, or `<config_dir>/womm/backups`.
    pub fn backup_dir(&self) -> anyhow::Result<PathBuf> {
        match &self.backup_dir {
            Some(template) => paths::expand_path(template),
            None => Ok(paths::get_default_backup_dir()?),
        }
    }

    /// Icon search directories with `~` and variables expanded. Entries that
    /// fail to expand are logged and dropped.
    pub fn icon_dirs(&self) -> Vec<PathBuf> {
        self.extra_icon_dirs
            .iter()
            .filter_map(|dir| match paths::expand_path(dir) {
                Ok(p) => Some(p),
                Err(e) => {
                    log::warn!("Ignoring icon directory '{}': {}", dir, e);
                    None
                }
            })
            .collect()
    }
}
