// src/core/validation.rs

//! Pre-flight checks run before anything touches the registry.
//!
//! Every check returns a [`ValidationResult`]; none of them mutate state apart
//! from the permission probe, which removes its throwaway key before returning.

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;
use std::fs::{self, File};
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use crate::constants::{
    ALLOWED_ICON_EXTENSIONS, ALLOWED_SCRIPT_EXTENSIONS, BINARY_SCRIPT_EXTENSIONS, ICON_SENTINELS,
    LABEL_FORBIDDEN_CHARS, MAX_ICON_SIZE, MAX_KEY_NAME_LENGTH, MAX_LABEL_LENGTH,
    MAX_SCRIPT_PATH_LENGTH, MIN_WINDOWS_VERSION, PERMISSION_PROBE_KEY, RESERVED_KEY_NAMES,
};
use crate::core::errors::{ContextError, ContextResult};
use crate::core::icon_manager::{split_icon_index, system_icon};
use crate::models::{ContextType, ValidationResult};
use crate::system::platform::PlatformInfo;
use crate::system::registry::{RegistryBackend, join_path};

lazy_static! {
    static ref KEY_NAME_RE: Regex = Regex::new(r"^[A-Za-z0-9._-]+$").unwrap();
}

/// Turns an invalid result into a `ContextError::Validation`.
pub fn ensure_valid(result: ValidationResult, subject: &str) -> ContextResult<ValidationResult> {
    if result.valid {
        return Ok(result);
    }
    let message = format!("{}: {}", subject, result.errors.join("; "));
    Err(ContextError::validation(message, result.errors))
}

/// Lower-cased extension with its leading dot, or an empty string.
pub fn dotted_extension(path: &Path) -> String {
    path.extension()
        .map(|e| format!(".{}", e.to_string_lossy().to_ascii_lowercase()))
        .unwrap_or_default()
}

// --- SCRIPT ---

pub fn validate_script_path(path: &Path) -> ValidationResult {
    let mut result = ValidationResult::new();
    result.detail("path", path.display().to_string());

    if path.as_os_str().len() > MAX_SCRIPT_PATH_LENGTH {
        result.error(format!(
            "Script path is too long ({} characters, maximum {})",
            path.as_os_str().len(),
            MAX_SCRIPT_PATH_LENGTH
        ));
        return result;
    }

    let metadata = match fs::metadata(path) {
        Ok(m) => m,
        Err(_) => {
            result.error(format!("Script does not exist: {}", path.display()));
            return result;
        }
    };
    if !metadata.is_file() {
        result.error(format!("Script path is not a file: {}", path.display()));
        return result;
    }

    let extension = dotted_extension(path);
    result.detail("extension", extension.clone());
    if !ALLOWED_SCRIPT_EXTENSIONS.contains(&extension.as_str()) {
        result.error(format!(
            "Unsupported script extension '{}' (allowed: {})",
            extension,
            ALLOWED_SCRIPT_EXTENSIONS.join(", ")
        ));
        return result;
    }

    result.detail("size", metadata.len().to_string());
    if metadata.len() == 0 {
        result.error("Script file is empty");
        return result;
    }

    let readable = if BINARY_SCRIPT_EXTENSIONS.contains(&extension.as_str()) {
        File::open(path).is_ok()
    } else {
        let mut buffer = [0u8; 1024];
        File::open(path)
            .and_then(|mut f| f.read(&mut buffer))
            .is_ok()
    };
    if !readable {
        result.error(format!("Script is not readable: {}", path.display()));
    }

    result
}

// --- LABEL ---

pub fn validate_label(label: &str) -> ValidationResult {
    let mut result = ValidationResult::new();

    if label.trim().is_empty() {
        result.error("Label cannot be empty");
        return result;
    }

    let length = label.chars().count();
    if length > MAX_LABEL_LENGTH {
        result.error(format!(
            "Label is too long ({} characters, maximum {})",
            length, MAX_LABEL_LENGTH
        ));
    }

    let forbidden: String = label
        .chars()
        .filter(|c| LABEL_FORBIDDEN_CHARS.contains(c))
        .collect();
    if !forbidden.is_empty() {
        result.error(format!("Label contains forbidden characters: {}", forbidden));
    }

    if label.chars().any(char::is_control) {
        result.error("Label contains control characters");
    }

    if label != label.trim() {
        result.warning("Label has leading or trailing whitespace");
    }

    result
}

// --- KEY NAME ---

pub fn validate_registry_key(key_name: &str) -> ValidationResult {
    let mut result = ValidationResult::new();

    if key_name.is_empty() {
        result.error("Key name cannot be empty");
        return result;
    }
    if key_name.len() > MAX_KEY_NAME_LENGTH {
        result.error(format!(
            "Key name is too long ({} characters, maximum {})",
            key_name.len(),
            MAX_KEY_NAME_LENGTH
        ));
    }
    if !KEY_NAME_RE.is_match(key_name) {
        result.error(format!(
            "Key name '{}' may only contain letters, digits, '.', '-' and '_'",
            key_name
        ));
    }
    if RESERVED_KEY_NAMES
        .iter()
        .any(|reserved| reserved.eq_ignore_ascii_case(key_name))
    {
        result.error(format!("Key name '{}' is a reserved device name", key_name));
    }

    result
}

// --- ICON ---

/// Checks an explicit icon file. `file,N` is accepted; only `file` is checked.
pub fn validate_icon_path(icon: &str) -> ValidationResult {
    let mut result = ValidationResult::new();
    let icon = icon.trim();

    if ICON_SENTINELS.iter().any(|s| s.eq_ignore_ascii_case(icon)) {
        result.detail("icon", icon.to_string());
        return result;
    }

    let (file, index) = split_icon_index(icon);
    let path = Path::new(file);
    if let Some(index) = index {
        result.detail("icon_index", index.to_string());
    }

    let metadata = match fs::metadata(path) {
        Ok(m) => m,
        Err(_) => {
            result.error(format!("Icon file does not exist: {}", file));
            return result;
        }
    };
    if !metadata.is_file() {
        result.error(format!("Icon path is not a file: {}", file));
        return result;
    }

    let extension = dotted_extension(path);
    if !ALLOWED_ICON_EXTENSIONS.contains(&extension.as_str()) {
        result.error(format!(
            "Unsupported icon extension '{}' (allowed: {})",
            extension,
            ALLOWED_ICON_EXTENSIONS.join(", ")
        ));
    }

    if metadata.len() == 0 {
        result.error("Icon file is empty");
    } else if metadata.len() > MAX_ICON_SIZE {
        result.error(format!(
            "Icon file is too large ({} bytes, maximum {})",
            metadata.len(),
            MAX_ICON_SIZE
        ));
    }

    result
}

// --- BACKUP ---

/// Structural check of a backup document before it is deserialized.
///
/// `entries` must hold a list for every context type the metadata claims to
/// cover (Directory and Background when the claim is absent).
pub fn validate_backup_data(data: &Value) -> ValidationResult {
    let mut result = ValidationResult::new();

    let Some(root) = data.as_object() else {
        result.error("Backup data must be a JSON object");
        return result;
    };

    for key in ["metadata", "entries"] {
        if !root.contains_key(key) {
            result.error(format!("Backup is missing the '{}' section", key));
        }
    }
    if !result.valid {
        return result;
    }

    let metadata = root.get("metadata").and_then(Value::as_object);
    match metadata {
        Some(metadata) => {
            for key in ["format_version", "timestamp", "total_entries"] {
                if !metadata.contains_key(key) {
                    result.error(format!("Backup metadata is missing '{}'", key));
                }
            }
        }
        None => result.error("Backup metadata must be an object"),
    }

    let claimed: Vec<String> = metadata
        .and_then(|m| m.get("context_types"))
        .and_then(Value::as_array)
        .map(|types| {
            types
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_else(|| {
            [ContextType::Directory, ContextType::Background]
                .iter()
                .map(|c| c.as_str().to_string())
                .collect()
        });

    let Some(entries) = root.get("entries").and_then(Value::as_object) else {
        result.error("Backup entries must be an object keyed by context type");
        return result;
    };

    let mut counted = 0usize;
    for context in &claimed {
        match entries.get(context) {
            Some(Value::Array(list)) => {
                counted += list.len();
                for (i, entry) in list.iter().enumerate() {
                    for field in ["key_name", "display_name"] {
                        if entry.get(field).and_then(Value::as_str).is_none() {
                            result.error(format!(
                                "entries.{}[{}] is missing '{}'",
                                context, i, field
                            ));
                        }
                    }
                }
            }
            Some(_) => result.error(format!("entries.{} must be a list", context)),
            None => result.error(format!("Backup has no entries for context type '{}'", context)),
        }
    }

    let declared = metadata
        .and_then(|m| m.get("total_entries"))
        .and_then(Value::as_u64);
    if let Some(declared) = declared {
        if usize::try_from(declared).ok() != Some(counted) {
            result.warning(format!(
                "Metadata declares {} entries but {} were found",
                declared, counted
            ));
        }
    }
    result.detail("entries", counted.to_string());

    result
}

// --- ENVIRONMENT ---

/// Checks that depend on the registry and the host.
#[derive(Debug, Clone)]
pub struct Validator {
    registry: Arc<dyn RegistryBackend>,
    platform: PlatformInfo,
}

impl Validator {
    pub fn new(registry: Arc<dyn RegistryBackend>, platform: PlatformInfo) -> Self {
        Self { registry, platform }
    }

    pub fn platform(&self) -> &PlatformInfo {
        &self.platform
    }

    /// Probes write access by creating and deleting a throwaway key.
    pub fn check_permissions(&self) -> ValidationResult {
        let mut result = ValidationResult::new();

        let created_root = outermost_missing_key(self.registry.as_ref(), PERMISSION_PROBE_KEY);
        if let Err(e) = self.registry.create_key(PERMISSION_PROBE_KEY) {
            result.error(format!("No write access to the registry: {}", e));
            result.detail("write_access", "denied");
            return result;
        }

        let registry = Arc::clone(&self.registry);
        let _cleanup = scopeguard::guard(created_root, move |root| {
            if let Err(e) = registry.delete_tree(&root) {
                log::warn!("Could not remove permission probe key: {}", e);
            }
        });

        match self.registry.set_value(PERMISSION_PROBE_KEY, "", "probe") {
            Ok(()) => result.detail("write_access", "granted"),
            Err(e) => {
                result.error(format!("No write access to the registry: {}", e));
                result.detail("write_access", "denied");
            }
        }
        result
    }

    pub fn validate_windows_compatibility(&self) -> ValidationResult {
        let mut result = ValidationResult::new();
        result.detail("os", self.platform.os.clone());

        if !self.platform.is_windows() {
            result.error(format!(
                "Context menu registration requires Windows (running on {})",
                self.platform.os
            ));
            return result;
        }

        match self.platform.version {
            Some(version) => {
                result.detail("os_version", format!("{}.{}", version.0, version.1));
                if version < MIN_WINDOWS_VERSION {
                    result.error(format!(
                        "Windows {}.{} is not supported (minimum {}.{})",
                        version.0, version.1, MIN_WINDOWS_VERSION.0, MIN_WINDOWS_VERSION.1
                    ));
                }
            }
            None => result.warning("Could not determine the Windows version"),
        }

        if let Err(e) = self.registry.key_exists(r"Software\Classes") {
            result.error(format!("Registry is not readable: {}", e));
        }

        result
    }

    /// Aggregated check for a registration request. Script, label, permission and
    /// platform failures make the result invalid; icon problems are warnings.
    pub fn validate_command_parameters(
        &self,
        script_path: &Path,
        label: &str,
        icon: Option<&str>,
    ) -> ValidationResult {
        let mut result = ValidationResult::new();

        result.merge(validate_script_path(script_path), false);
        result.merge(validate_label(label), false);

        if let Some(icon) = icon {
            // System icons and bare names are resolved later by search.
            let is_path = icon.contains(['/', '\\']);
            if is_path && system_icon(icon).is_none() {
                result.merge(validate_icon_path(icon), true);
            }
        }

        result.merge(self.check_permissions(), false);
        result.merge(self.validate_windows_compatibility(), false);
        result
    }
}

/// The outermost key on `path` that does not exist yet. Deleting it undoes
/// everything `create_key(path)` adds. Falls back to `path` itself when an
/// ancestor cannot be inspected.
fn outermost_missing_key(registry: &dyn RegistryBackend, path: &str) -> String {
    let mut current = String::new();
    for segment in path.split('\\').filter(|s| !s.is_empty()) {
        current = join_path(&current, segment);
        match registry.key_exists(&current) {
            Ok(true) => continue,
            Ok(false) => return current,
            Err(_) => break,
        }
    }
    path.to_string()
}
