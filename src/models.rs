// src/models.rs

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::constants::{
    BACKGROUND_SHELL_PATH, DIRECTORY_SHELL_PATH, FILE_SHELL_PATH, FILES_SHELL_PATH,
    ROOT_SHELL_PATH, SELECTION_TOKEN, SINGLE_ITEM_TOKEN,
};

// --- CLASSIFICATION ---

/// The runtime family of a registered file, derived from its extension.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ScriptType {
    Python,
    PowerShell,
    Batch,
    Executable,
    Unknown,
}

impl ScriptType {
    /// Maps a lower-cased extension (with its leading dot) to a script type.
    pub fn from_extension(extension: &str) -> Self {
        match extension {
            ".py" | ".pyw" => ScriptType::Python,
            ".ps1" => ScriptType::PowerShell,
            ".bat" | ".cmd" => ScriptType::Batch,
            ".exe" => ScriptType::Executable,
            _ => ScriptType::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ScriptType::Python => "python",
            ScriptType::PowerShell => "powershell",
            ScriptType::Batch => "batch",
            ScriptType::Executable => "executable",
            ScriptType::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ScriptType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A shell location a menu entry can appear in.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ContextType {
    Directory,
    Background,
    File,
    Files,
    Root,
}

impl ContextType {
    /// Every context type, in a stable order.
    pub const ALL: [ContextType; 5] = [
        ContextType::Directory,
        ContextType::Background,
        ContextType::File,
        ContextType::Files,
        ContextType::Root,
    ];

    /// The parent key under which entries for this context live.
    pub fn registry_path(&self) -> &'static str {
        match self {
            ContextType::Directory => DIRECTORY_SHELL_PATH,
            ContextType::Background => BACKGROUND_SHELL_PATH,
            ContextType::File => FILE_SHELL_PATH,
            ContextType::Files => FILES_SHELL_PATH,
            ContextType::Root => ROOT_SHELL_PATH,
        }
    }

    /// The placeholder the shell substitutes at click time.
    pub fn placeholder(&self) -> &'static str {
        match self {
            ContextType::File => SINGLE_ITEM_TOKEN,
            ContextType::Directory
            | ContextType::Background
            | ContextType::Files
            | ContextType::Root => SELECTION_TOKEN,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ContextType::Directory => "directory",
            ContextType::Background => "background",
            ContextType::File => "file",
            ContextType::Files => "files",
            ContextType::Root => "root",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ContextType::Directory => "right-click on a folder",
            ContextType::Background => "right-click on a folder background",
            ContextType::File => "right-click on a single file",
            ContextType::Files => "right-click on a multi-item selection",
            ContextType::Root => "right-click on a drive root",
        }
    }
}

impl fmt::Display for ContextType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContextType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "directory" => Ok(ContextType::Directory),
            "background" => Ok(ContextType::Background),
            "file" => Ok(ContextType::File),
            "files" => Ok(ContextType::Files),
            "root" => Ok(ContextType::Root),
            other => Err(format!("Unknown context type '{}'", other)),
        }
    }
}

// --- REGISTRY RECORDS ---

/// One registered menu entry, as stored in the registry and in backups.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct RegistryEntry {
    pub key_name: String,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default)]
    pub registry_path: String,
}

/// Derived, read-only view of a script path. Never persisted.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct ScriptInfo {
    pub path: PathBuf,
    pub script_type: ScriptType,
    pub extension: String,
    pub default_icon: Option<String>,
    pub placeholder: String,
    pub command: String,
}

// --- BACKUPS ---

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct BackupMetadata {
    pub format_version: String,
    pub timestamp: String,
    pub total_entries: usize,
    /// The context types this snapshot claims to cover.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub context_types: Vec<ContextType>,
}

/// A serialized copy of the managed entries, keyed by context type name.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct BackupSnapshot {
    pub metadata: BackupMetadata,
    pub entries: BTreeMap<String, Vec<RegistryEntry>>,
}

impl BackupSnapshot {
    /// Iterates over every record regardless of its context type.
    pub fn all_entries(&self) -> impl Iterator<Item = &RegistryEntry> {
        self.entries.values().flatten()
    }
}

/// Outcome of re-applying a snapshot.
#[derive(Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct RestoreReport {
    pub restored: usize,
    pub skipped: usize,
    pub failed: usize,
}

// --- VALIDATION ---

/// Structured outcome of a pre-flight check. Warnings never block.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub details: BTreeMap<String, String>,
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self::new()
    }
}

impl ValidationResult {
    pub fn new() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
            details: BTreeMap::new(),
        }
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
        self.valid = false;
    }

    pub fn warning(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    pub fn detail(&mut self, key: &str, value: impl Into<String>) {
        self.details.insert(key.to_string(), value.into());
    }

    /// Folds another result in. With `downgrade`, its errors become warnings.
    pub fn merge(&mut self, other: ValidationResult, downgrade: bool) {
        if downgrade {
            self.warnings.extend(other.errors);
        } else {
            for e in other.errors {
                self.error(e);
            }
        }
        self.warnings.extend(other.warnings);
        self.details.extend(other.details);
    }
}

// --- REGISTRATION ---

/// One registry location a registration writes to.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct RegistryTarget {
    /// The parent `shell` key.
    pub registry_path: String,
    pub context_type: ContextType,
    /// Set for per-extension locations.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extension: Option<String>,
}

impl RegistryTarget {
    pub fn describe(&self) -> String {
        match &self.extension {
            Some(ext) => format!("right-click on a '{}' file ({})", ext, self.registry_path),
            None => format!("{} ({})", self.context_type.description(), self.registry_path),
        }
    }
}

/// A single entry a registration will write (or has written).
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct PlannedEntry {
    pub entry_path: String,
    pub context_type: ContextType,
    pub command: String,
    pub description: String,
}

/// The fully resolved registration, returned as-is by dry runs.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct RegistrationPlan {
    pub key_name: String,
    pub label: String,
    pub script: ScriptInfo,
    pub command: String,
    pub icon: Option<String>,
    pub entries: Vec<PlannedEntry>,
    pub warnings: Vec<String>,
    pub description: Vec<String>,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub enum RegistrationOutcome {
    /// Nothing was written.
    DryRun(RegistrationPlan),
    /// Every planned entry was written.
    Registered(RegistrationPlan),
}

impl RegistrationOutcome {
    pub fn plan(&self) -> &RegistrationPlan {
        match self {
            RegistrationOutcome::DryRun(plan) | RegistrationOutcome::Registered(plan) => plan,
        }
    }

    pub fn is_dry_run(&self) -> bool {
        matches!(self, RegistrationOutcome::DryRun(_))
    }
}

/// Result of an unregistration, per location.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct UnregisterReport {
    pub key_name: String,
    pub dry_run: bool,
    pub removed_from: Vec<ContextType>,
    pub not_found_in: Vec<ContextType>,
    pub warnings: Vec<String>,
}
