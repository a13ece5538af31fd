// src/core/registry_utils.rs

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use crate::constants::{
    BACKUP_FORMAT_VERSION, COMMAND_SUBKEY, FILE_ASSOCIATIONS_PATH, ICON_VALUE, KEY_PREFIX,
    MAX_KEY_NAME_LENGTH,
};
use crate::core::errors::{ContextError, ContextResult};
use crate::core::validation::validate_registry_key;
use crate::models::{BackupMetadata, BackupSnapshot, ContextType, RegistryEntry, RestoreReport};
use crate::system::registry::{RegistryBackend, join_path};

/// Only keys below this root may be written back by a restore.
const RESTORABLE_ROOT: &str = r"software\classes\";

/// Low-level CRUD for menu entries.
///
/// Each entry is a key whose default value is the display name, with an
/// optional `Icon` value and a `command` sub-key holding the invocation.
#[derive(Debug, Clone)]
pub struct RegistryUtils {
    registry: Arc<dyn RegistryBackend>,
}

impl RegistryUtils {
    pub fn new(registry: Arc<dyn RegistryBackend>) -> Self {
        Self { registry }
    }

    /// `womm_<ext>_<stem>`: the stem with every non-alphanumeric run collapsed to
    /// a single `_`, lower-cased. The same path always yields the same key.
    pub fn generate_registry_key_name(path: &Path) -> String {
        let extension = path
            .extension()
            .map(|e| normalize_segment(&e.to_string_lossy()))
            .filter(|e| !e.is_empty())
            .unwrap_or_else(|| "file".to_string());
        let stem = path
            .file_stem()
            .map(|s| normalize_segment(&s.to_string_lossy()))
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "script".to_string());

        let mut key = format!("{}{}_{}", KEY_PREFIX, extension, stem);
        // The key is pure ASCII here, so byte truncation is char-safe.
        key.truncate(MAX_KEY_NAME_LENGTH);
        key.trim_end_matches('_').to_string()
    }

    /// Creates or replaces the entry at `entry_path`.
    pub fn add_context_menu_entry(
        &self,
        entry_path: &str,
        command: &str,
        label: &str,
        icon: Option<&str>,
    ) -> ContextResult<()> {
        if command.trim().is_empty() || label.trim().is_empty() {
            return Err(ContextError::validation(
                format!("Entry '{}' needs both a command and a label", entry_path),
                Vec::new(),
            ));
        }

        // Replace rather than merge so stale values (an old icon) disappear.
        self.registry.delete_tree(entry_path)?;
        self.registry.set_value(entry_path, "", label)?;
        if let Some(icon) = icon.filter(|i| !i.trim().is_empty()) {
            self.registry.set_value(entry_path, ICON_VALUE, icon)?;
        }
        self.registry
            .set_value(&join_path(entry_path, COMMAND_SUBKEY), "", command)?;

        log::info!("Wrote context menu entry {}", entry_path);
        Ok(())
    }

    /// Deletes the entry. `Ok(false)` means there was nothing to delete.
    pub fn remove_context_menu_entry(&self, entry_path: &str) -> ContextResult<bool> {
        let removed = self.registry.delete_tree(entry_path)?;
        if removed {
            log::info!("Removed context menu entry {}", entry_path);
        } else {
            log::debug!("No entry at {}", entry_path);
        }
        Ok(removed)
    }

    pub fn entry_exists(&self, entry_path: &str) -> ContextResult<bool> {
        Ok(self.registry.key_exists(entry_path)?)
    }

    /// Reads one entry below `parent`.
    pub fn read_entry(&self, parent: &str, key_name: &str) -> ContextResult<RegistryEntry> {
        let entry_path = join_path(parent, key_name);
        let display_name = self
            .registry
            .get_value(&entry_path, "")?
            .ok_or_else(|| ContextError::ContextMenu {
                operation: "read",
                target: entry_path.clone(),
                reason: "entry has no display name".to_string(),
                details: Vec::new(),
            })?;
        let icon = self.registry.get_value(&entry_path, ICON_VALUE)?;
        let command = self
            .registry
            .get_value(&join_path(&entry_path, COMMAND_SUBKEY), "")?;

        Ok(RegistryEntry {
            key_name: key_name.to_string(),
            display_name,
            command,
            icon,
            registry_path: entry_path,
        })
    }

    /// Every parent key that can hold entries of `context`. Single files also
    /// cover the per-extension `SystemFileAssociations\<ext>\shell` keys.
    pub fn entry_locations(&self, context: ContextType) -> ContextResult<Vec<String>> {
        let mut parents = vec![context.registry_path().to_string()];
        if context == ContextType::File {
            for extension in self.registry.list_subkeys(FILE_ASSOCIATIONS_PATH)? {
                let association = join_path(FILE_ASSOCIATIONS_PATH, &extension);
                parents.push(join_path(&association, "shell"));
            }
        }
        Ok(parents)
    }

    /// Managed entries in every location of the context. Unreadable entries
    /// are logged and skipped.
    pub fn list_context_menu_entries(&self, context: ContextType) -> ContextResult<Vec<RegistryEntry>> {
        let mut entries = Vec::new();
        for parent in self.entry_locations(context)? {
            for key_name in self.registry.list_subkeys(&parent)? {
                if !key_name.to_ascii_lowercase().starts_with(KEY_PREFIX) {
                    continue;
                }
                match self.read_entry(&parent, &key_name) {
                    Ok(entry) => entries.push(entry),
                    Err(e) => log::warn!("Skipping unreadable entry '{}': {}", key_name, e),
                }
            }
        }
        Ok(entries)
    }

    /// Serializes the managed entries of `contexts` (all context types by default).
    /// A context that cannot be listed contributes an empty list.
    pub fn backup_registry_entries(&self, contexts: Option<&[ContextType]>) -> BackupSnapshot {
        let contexts = contexts.unwrap_or(&ContextType::ALL);

        let mut entries = BTreeMap::new();
        for context in contexts {
            let list = self.list_context_menu_entries(*context).unwrap_or_else(|e| {
                log::warn!("Could not back up '{}' entries: {}", context, e);
                Vec::new()
            });
            entries.insert(context.as_str().to_string(), list);
        }

        let total_entries = entries.values().map(Vec::len).sum();
        BackupSnapshot {
            metadata: BackupMetadata {
                format_version: BACKUP_FORMAT_VERSION.to_string(),
                timestamp: chrono::Local::now().to_rfc3339(),
                total_entries,
                context_types: contexts.to_vec(),
            },
            entries,
        }
    }

    /// Re-applies every complete record of `snapshot`.
    pub fn restore_registry_entries(&self, snapshot: &BackupSnapshot) -> RestoreReport {
        let mut report = RestoreReport::default();

        for entry in snapshot.all_entries() {
            let command = match entry.command.as_deref() {
                Some(c) if !c.trim().is_empty() => c,
                _ => {
                    log::warn!("Skipping '{}': no command recorded", entry.key_name);
                    report.skipped += 1;
                    continue;
                }
            };
            if !is_restorable(entry) {
                log::warn!(
                    "Skipping '{}': unusable registry path '{}'",
                    entry.key_name,
                    entry.registry_path
                );
                report.skipped += 1;
                continue;
            }

            match self.add_context_menu_entry(
                &entry.registry_path,
                command,
                &entry.display_name,
                entry.icon.as_deref(),
            ) {
                Ok(()) => report.restored += 1,
                Err(e) => {
                    log::warn!("Could not restore '{}': {}", entry.key_name, e);
                    report.failed += 1;
                }
            }
        }
        report
    }
}

fn normalize_segment(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
        } else if !out.ends_with('_') {
            out.push('_');
        }
    }
    out.trim_matches('_').to_string()
}

/// A record is restorable when it names a valid key, points below
/// `Software\Classes`, and its path ends with its own key name.
fn is_restorable(entry: &RegistryEntry) -> bool {
    if entry.display_name.trim().is_empty() || !validate_registry_key(&entry.key_name).valid {
        return false;
    }
    let path = entry.registry_path.to_ascii_lowercase();
    let ends_with_key = path
        .rsplit('\\')
        .next()
        .is_some_and(|last| last == entry.key_name.to_ascii_lowercase());
    path.starts_with(RESTORABLE_ROOT) && ends_with_key
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{BACKGROUND_SHELL_PATH, DIRECTORY_SHELL_PATH, FILE_SHELL_PATH};
    use crate::system::registry::MemoryRegistry;
    use std::path::PathBuf;

    fn utils() -> (Arc<MemoryRegistry>, RegistryUtils) {
        let registry = Arc::new(MemoryRegistry::new());
        (registry.clone(), RegistryUtils::new(registry))
    }

    #[test]
    fn test_key_name_generation() {
        let key = RegistryUtils::generate_registry_key_name(Path::new(r"C:\tools\deploy.py"));
        assert_eq!(key, "womm_py_deploy");

        let key =
            RegistryUtils::generate_registry_key_name(Path::new("/x/My Cool--Script (v2).PS1"));
        assert_eq!(key, "womm_ps1_my_cool_script_v2");

        let key = RegistryUtils::generate_registry_key_name(Path::new("/x/__.bat"));
        assert_eq!(key, "womm_bat_script");

        let key = RegistryUtils::generate_registry_key_name(Path::new("/x/Makefile"));
        assert_eq!(key, "womm_file_makefile");
    }

    #[test]
    fn test_key_name_is_deterministic_and_valid() {
        let long_stem = format!("/x/{}.py", "ab c".repeat(100));
        for raw in ["/a/b/Ünïcode näme.exe", "/a/run.cmd", "rel/x.y.z.py", long_stem.as_str()] {
            let path = PathBuf::from(raw);
            let first = RegistryUtils::generate_registry_key_name(&path);
            let second = RegistryUtils::generate_registry_key_name(&path);
            assert_eq!(first, second);
            assert!(validate_registry_key(&first).valid, "{first}");
        }
    }

    #[test]
    fn test_add_replaces_existing_entry() {
        let (registry, utils) = utils();
        let path = join_path(DIRECTORY_SHELL_PATH, "womm_py_a");

        utils
            .add_context_menu_entry(&path, "\"a.py\" \"%V\"", "A", Some("a.ico"))
            .unwrap();
        utils
            .add_context_menu_entry(&path, "\"b.py\" \"%V\"", "B", None)
            .unwrap();

        let entry = utils.read_entry(DIRECTORY_SHELL_PATH, "womm_py_a").unwrap();
        assert_eq!(entry.display_name, "B");
        assert_eq!(entry.command.as_deref(), Some("\"b.py\" \"%V\""));
        assert_eq!(entry.icon, None);
        assert_eq!(
            registry
                .get_value(&join_path(&path, COMMAND_SUBKEY), "")
                .unwrap()
                .as_deref(),
            Some("\"b.py\" \"%V\"")
        );
    }

    #[test]
    fn test_add_rejects_empty_command() {
        let (_, utils) = utils();
        let err = utils
            .add_context_menu_entry(r"Software\Classes\x\womm_a", " ", "A", None)
            .unwrap_err();
        assert!(matches!(err, ContextError::Validation { .. }));
    }

    #[test]
    fn test_remove_is_idempotent() {
        let (_, utils) = utils();
        let path = join_path(BACKGROUND_SHELL_PATH, "womm_bat_x");
        utils.add_context_menu_entry(&path, "x", "X", None).unwrap();

        assert!(utils.remove_context_menu_entry(&path).unwrap());
        assert!(!utils.remove_context_menu_entry(&path).unwrap());
    }

    #[test]
    fn test_list_skips_foreign_and_unreadable_entries() {
        let (registry, utils) = utils();
        utils
            .add_context_menu_entry(&join_path(DIRECTORY_SHELL_PATH, "womm_py_a"), "a", "A", None)
            .unwrap();
        // Another application's entry.
        registry
            .set_value(&join_path(DIRECTORY_SHELL_PATH, "git_gui"), "", "Git GUI")
            .unwrap();
        // A managed key without a display name.
        registry
            .create_key(&join_path(DIRECTORY_SHELL_PATH, "womm_py_broken"))
            .unwrap();

        let entries = utils.list_context_menu_entries(ContextType::Directory).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].key_name, "womm_py_a");
        assert!(utils.list_context_menu_entries(ContextType::Root).unwrap().is_empty());
    }

    #[test]
    fn test_file_listing_includes_extension_locations() {
        let (registry, utils) = utils();
        let log_shell = r"Software\Classes\SystemFileAssociations\.log\shell";
        let entry = join_path(log_shell, "womm_py_fmt");
        utils.add_context_menu_entry(&entry, "fmt \"%1\"", "Fmt", None).unwrap();
        utils
            .add_context_menu_entry(&join_path(FILE_SHELL_PATH, "womm_py_lint"), "lint", "Lint", None)
            .unwrap();
        registry
            .set_value(&join_path(log_shell, "open_with_viewer"), "", "View")
            .unwrap();

        let entries = utils.list_context_menu_entries(ContextType::File).unwrap();
        let paths: Vec<&str> = entries.iter().map(|e| e.registry_path.as_str()).collect();
        assert_eq!(entries.len(), 2);
        assert!(paths.contains(&entry.as_str()));

        let snapshot = utils.backup_registry_entries(Some(&[ContextType::File]));
        assert_eq!(snapshot.metadata.total_entries, 2);

        registry.delete_tree(&entry).unwrap();
        let report = utils.restore_registry_entries(&snapshot);
        assert_eq!(report.restored, 2);
        assert_eq!(
            registry.get_value(&join_path(&entry, "command"), "").unwrap().as_deref(),
            Some("fmt \"%1\"")
        );
    }

    #[test]
    fn test_backup_covers_every_requested_context() {
        let (_, utils) = utils();
        utils
            .add_context_menu_entry(&join_path(DIRECTORY_SHELL_PATH, "womm_py_a"), "a", "A", None)
            .unwrap();

        let snapshot = utils.backup_registry_entries(None);
        assert_eq!(snapshot.entries.len(), ContextType::ALL.len());
        assert_eq!(snapshot.metadata.total_entries, 1);
        assert_eq!(snapshot.entries["directory"].len(), 1);
        assert!(snapshot.entries["root"].is_empty());

        let only = utils.backup_registry_entries(Some(&[ContextType::Background]));
        assert_eq!(only.entries.len(), 1);
        assert_eq!(only.metadata.context_types, vec![ContextType::Background]);
    }

    #[test]
    fn test_restore_skips_incomplete_and_foreign_records() {
        let (registry, utils) = utils();
        let good = RegistryEntry {
            key_name: "womm_py_a".to_string(),
            display_name: "A".to_string(),
            command: Some("a".to_string()),
            icon: None,
            registry_path: join_path(DIRECTORY_SHELL_PATH, "womm_py_a"),
        };
        let no_command = RegistryEntry {
            command: None,
            key_name: "womm_py_b".to_string(),
            registry_path: join_path(DIRECTORY_SHELL_PATH, "womm_py_b"),
            ..good.clone()
        };
        let outside = RegistryEntry {
            key_name: "Run".to_string(),
            registry_path: r"Software\Microsoft\Windows\CurrentVersion\Run".to_string(),
            ..good.clone()
        };

        let mut entries = BTreeMap::new();
        entries.insert("directory".to_string(), vec![good, no_command, outside]);
        let snapshot = BackupSnapshot {
            metadata: BackupMetadata {
                format_version: "1.0".to_string(),
                timestamp: "now".to_string(),
                total_entries: 3,
                context_types: vec![ContextType::Directory],
            },
            entries,
        };

        let report = utils.restore_registry_entries(&snapshot);
        assert_eq!(
            report,
            RestoreReport {
                restored: 1,
                skipped: 2,
                failed: 0
            }
        );
        assert!(registry
            .key_exists(&join_path(DIRECTORY_SHELL_PATH, "womm_py_a"))
            .unwrap());
        assert!(!registry
            .key_exists(r"Software\Microsoft\Windows\CurrentVersion\Run")
            .unwrap());
    }
}
