// src/core/manager.rs

//! The orchestrator behind every user-facing operation.
//!
//! The manager holds no state between calls. Validation and detection run before
//! the first write; once writing starts, each location is attempted and a
//! partial failure is reported with a `k/n locations succeeded` count. Entries
//! that were written stay in place.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::core::backup_store::{BackupStore, JsonBackupStore};
use crate::core::context_parameters::ContextParameters;
use crate::core::errors::{ContextError, ContextResult};
use crate::core::icon_manager::IconManager;
use crate::core::registry_utils::RegistryUtils;
use crate::core::script_detector::ScriptDetector;
use crate::core::settings::Settings;
use crate::core::validation::{
    Validator, ensure_valid, validate_backup_data, validate_registry_key, validate_script_path,
};
use crate::models::{
    BackupSnapshot, ContextType, PlannedEntry, RegistrationOutcome, RegistrationPlan,
    RegistryEntry, RestoreReport, ScriptInfo, ScriptType, UnregisterReport, ValidationResult,
};
use crate::system::platform::PlatformInfo;
use crate::system::registry::{RegistryBackend, join_path, system_registry};

/// Locations `unregister_script` looks in.
const UNREGISTER_CONTEXTS: [ContextType; 2] = [ContextType::Directory, ContextType::Background];

/// A registration request.
#[derive(Debug, Clone)]
pub struct Registration {
    pub script_path: PathBuf,
    pub label: String,
    /// `None` behaves like `auto`.
    pub icon: Option<String>,
    pub dry_run: bool,
    /// `None` targets folders and folder backgrounds.
    pub params: Option<ContextParameters>,
}

impl Registration {
    pub fn new(script_path: impl Into<PathBuf>, label: impl Into<String>) -> Self {
        Self {
            script_path: script_path.into(),
            label: label.into(),
            icon: None,
            dry_run: false,
            params: None,
        }
    }

    pub fn icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn params(mut self, params: ContextParameters) -> Self {
        self.params = Some(params);
        self
    }
}

#[derive(Debug, Clone)]
pub struct ContextMenuManager {
    registry: RegistryUtils,
    validator: Validator,
    detector: ScriptDetector,
    icons: IconManager,
    backups: Arc<dyn BackupStore>,
}

impl ContextMenuManager {
    pub fn new(
        registry: Arc<dyn RegistryBackend>,
        platform: PlatformInfo,
        detector: ScriptDetector,
        icons: IconManager,
        backups: Arc<dyn BackupStore>,
    ) -> Self {
        Self {
            registry: RegistryUtils::new(Arc::clone(&registry)),
            validator: Validator::new(registry, platform),
            detector,
            icons,
            backups,
        }
    }

    /// Wires the manager to the current user's registry and the real host.
    pub fn system(settings: &Settings) -> ContextResult<Self> {
        Ok(Self::new(
            system_registry()?,
            PlatformInfo::detect(),
            ScriptDetector::default(),
            IconManager::new(settings.icon_dirs()),
            Arc::new(JsonBackupStore),
        ))
    }

    pub fn validator(&self) -> &Validator {
        &self.validator
    }

    // --- REGISTER ---

    pub fn register_script(&self, request: &Registration) -> ContextResult<RegistrationOutcome> {
        let plan = self.plan_registration(request)?;

        if request.dry_run {
            log::info!(
                "Dry run: '{}' would be written to {} location(s)",
                plan.key_name,
                plan.entries.len()
            );
            return Ok(RegistrationOutcome::DryRun(plan));
        }

        let mut failures = Vec::new();
        for entry in &plan.entries {
            let written = self.registry.add_context_menu_entry(
                &entry.entry_path,
                &entry.command,
                &plan.label,
                plan.icon.as_deref(),
            );
            if let Err(e) = written {
                log::warn!("Could not write {}: {}", entry.entry_path, e);
                failures.push(format!("{}: {}", entry.entry_path, e));
            }
        }

        if !failures.is_empty() {
            let total = plan.entries.len();
            return Err(ContextError::ContextMenu {
                operation: "register",
                target: plan.key_name,
                reason: format!("{}/{} locations succeeded", total - failures.len(), total),
                details: failures,
            });
        }

        log::info!("Registered '{}' as {}", plan.label, plan.key_name);
        Ok(RegistrationOutcome::Registered(plan))
    }

    /// Everything `register_script` would write, without writing it.
    pub fn plan_registration(&self, request: &Registration) -> ContextResult<RegistrationPlan> {
        let report = self.validator.validate_command_parameters(
            &request.script_path,
            &request.label,
            request.icon.as_deref(),
        );
        let report = ensure_valid(report, "Invalid registration request")?;
        let mut warnings = report.warnings;

        let script = self.detector.get_script_info(&request.script_path)?;

        let resolution = self
            .icons
            .resolve_icon(request.icon.as_deref(), Some(&script.path));
        if let Some(diagnostic) = resolution.diagnostic {
            warnings.push(format!("No icon will be set: {}", diagnostic));
        }

        let key_name = RegistryUtils::generate_registry_key_name(&script.path);
        ensure_valid(validate_registry_key(&key_name), "Invalid key name")?;

        let params = request
            .params
            .clone()
            .unwrap_or_else(ContextParameters::default_contexts);
        let params_report = ensure_valid(params.validate_parameters(), "Invalid context parameters")?;
        warnings.extend(params_report.warnings);

        let entries = params
            .registry_targets()
            .into_iter()
            .map(|target| PlannedEntry {
                entry_path: join_path(&target.registry_path, &key_name),
                command: params.build_command(&script.command, target.context_type),
                context_type: target.context_type,
                description: target.describe(),
            })
            .collect();

        Ok(RegistrationPlan {
            key_name,
            label: request.label.clone(),
            command: script.command.clone(),
            icon: resolution.icon,
            entries,
            warnings,
            description: params.get_description(),
            script,
        })
    }

    // --- UNREGISTER ---

    /// Removes `key_name` from the folder and folder-background locations.
    pub fn unregister_script(&self, key_name: &str, dry_run: bool) -> ContextResult<UnregisterReport> {
        self.unregister_script_from(key_name, &UNREGISTER_CONTEXTS, dry_run)
    }

    /// Removes `key_name` from each of `contexts`, including the per-extension
    /// locations of single files. Succeeds when at least one location held the key.
    pub fn unregister_script_from(
        &self,
        key_name: &str,
        contexts: &[ContextType],
        dry_run: bool,
    ) -> ContextResult<UnregisterReport> {
        ensure_valid(validate_registry_key(key_name), "Invalid key name")?;

        let mut report = UnregisterReport {
            key_name: key_name.to_string(),
            dry_run,
            removed_from: Vec::new(),
            not_found_in: Vec::new(),
            warnings: Vec::new(),
        };

        for context in contexts {
            let parents = match self.registry.entry_locations(*context) {
                Ok(parents) => parents,
                Err(e) => {
                    log::warn!("Could not enumerate '{}' locations: {}", context, e);
                    report.warnings.push(format!("{}: {}", context, e));
                    continue;
                }
            };

            let mut found = false;
            let mut failed = false;
            for parent in parents {
                let entry_path = join_path(&parent, key_name);
                let outcome = if dry_run {
                    self.registry.entry_exists(&entry_path)
                } else {
                    self.registry.remove_context_menu_entry(&entry_path)
                };
                match outcome {
                    Ok(true) => found = true,
                    Ok(false) => {}
                    Err(e) => {
                        log::warn!("Could not remove {}: {}", entry_path, e);
                        report.warnings.push(format!("{}: {}", entry_path, e));
                        failed = true;
                    }
                }
            }

            if found {
                report.removed_from.push(*context);
            } else if !failed {
                report.not_found_in.push(*context);
            }
        }

        if report.removed_from.is_empty() {
            let reason = if report.warnings.is_empty() {
                "entry not found in any location".to_string()
            } else {
                "no location could be removed".to_string()
            };
            return Err(ContextError::ContextMenu {
                operation: "unregister",
                target: key_name.to_string(),
                reason,
                details: report.warnings,
            });
        }
        Ok(report)
    }

    // --- LIST / BACKUP / RESTORE ---

    /// Managed entries per context type (all types by default). A location that
    /// cannot be read is reported as empty.
    pub fn list_entries(
        &self,
        contexts: Option<&[ContextType]>,
    ) -> BTreeMap<ContextType, Vec<RegistryEntry>> {
        contexts
            .unwrap_or(&ContextType::ALL)
            .iter()
            .map(|context| {
                let entries = self
                    .registry
                    .list_context_menu_entries(*context)
                    .unwrap_or_else(|e| {
                        log::warn!("Could not list '{}' entries: {}", context, e);
                        Vec::new()
                    });
                (*context, entries)
            })
            .collect()
    }

    pub fn backup_entries(&self, path: &Path) -> ContextResult<BackupSnapshot> {
        self.backup_entries_for(path, None)
    }

    /// Writes a snapshot of `contexts` (all types by default) to `path`.
    pub fn backup_entries_for(
        &self,
        path: &Path,
        contexts: Option<&[ContextType]>,
    ) -> ContextResult<BackupSnapshot> {
        let snapshot = self.registry.backup_registry_entries(contexts);
        self.backups
            .write(path, &snapshot)
            .map_err(|e| ContextError::ContextMenu {
                operation: "backup",
                target: path.display().to_string(),
                reason: e.to_string(),
                details: Vec::new(),
            })?;
        Ok(snapshot)
    }

    /// Validates the backup at `path` and re-applies its complete records.
    pub fn restore_entries(&self, path: &Path) -> ContextResult<RestoreReport> {
        let data = self.backups.read(path)?;
        let report = ensure_valid(validate_backup_data(&data), "Invalid backup file")?;
        for warning in &report.warnings {
            log::warn!("{}", warning);
        }

        let snapshot: BackupSnapshot = serde_json::from_value(data).map_err(|e| {
            ContextError::validation(
                format!("Backup '{}' does not match the backup schema", path.display()),
                vec![e.to_string()],
            )
        })?;

        let report = self.registry.restore_registry_entries(&snapshot);
        if report.failed > 0 {
            log::warn!("{} record(s) could not be restored", report.failed);
        }
        Ok(report)
    }

    // --- INSPECTION ---

    pub fn get_script_info(&self, path: &Path) -> ContextResult<ScriptInfo> {
        self.detector.get_script_info(path)
    }

    /// Whether `path` could be registered here, with every reason it could not.
    pub fn validate_script(&self, path: &Path) -> ValidationResult {
        let mut result = validate_script_path(path);

        if result.valid {
            match self.detector.get_script_info(path) {
                Ok(info) => {
                    result.detail("script_type", info.script_type.as_str());
                    if info.script_type == ScriptType::Unknown {
                        result.error(format!(
                            "Unsupported script type for '{}'",
                            path.display()
                        ));
                    }
                    if info.command.trim().is_empty() {
                        result.error("No command could be built for this script");
                    } else {
                        result.detail("command", info.command);
                    }
                }
                Err(e) => result.error(e.to_string()),
            }
        }

        result.merge(self.validator.check_permissions(), false);
        result.merge(self.validator.validate_windows_compatibility(), false);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{BACKGROUND_SHELL_PATH, DIRECTORY_SHELL_PATH, FILE_SHELL_PATH};
    use crate::core::script_detector::tests::FakeProbe;
    use crate::system::registry::MemoryRegistry;
    use std::fs;
    use tempfile::{TempDir, tempdir};

    fn manager(registry: Arc<MemoryRegistry>) -> ContextMenuManager {
        let probe = FakeProbe::default().with("python3", "/usr/bin/python3", "Python 3.11.2");
        ContextMenuManager::new(
            registry,
            PlatformInfo::windows(10, 0),
            ScriptDetector::new(Arc::new(probe)),
            IconManager::with_search_dirs(Vec::new(), Vec::new()),
            Arc::new(JsonBackupStore),
        )
    }

    fn script(dir: &TempDir, name: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, "print('hello')\n").unwrap();
        path
    }

    #[test]
    fn test_register_writes_both_default_locations() {
        let dir = tempdir().unwrap();
        let registry = Arc::new(MemoryRegistry::new());
        let m = manager(registry.clone());

        let outcome = m
            .register_script(&Registration::new(script(&dir, "deploy.py"), "Deploy"))
            .unwrap();
        assert!(!outcome.is_dry_run());
        assert_eq!(outcome.plan().key_name, "womm_py_deploy");

        for parent in [DIRECTORY_SHELL_PATH, BACKGROUND_SHELL_PATH] {
            let path = join_path(parent, "womm_py_deploy");
            assert_eq!(
                registry.get_value(&path, "").unwrap().as_deref(),
                Some("Deploy")
            );
        }
    }

    #[test]
    fn test_invalid_label_writes_nothing() {
        let dir = tempdir().unwrap();
        let registry = Arc::new(MemoryRegistry::new());
        let m = manager(registry.clone());

        let err = m
            .register_script(&Registration::new(script(&dir, "deploy.py"), "bad|label"))
            .unwrap_err();
        assert!(matches!(err, ContextError::Validation { .. }));
        assert!(!registry
            .key_exists(&join_path(DIRECTORY_SHELL_PATH, "womm_py_deploy"))
            .unwrap());
    }

    #[test]
    fn test_file_context_uses_single_item_token() {
        let dir = tempdir().unwrap();
        let registry = Arc::new(MemoryRegistry::new());
        let mut params = ContextParameters::new();
        params.add_context(ContextType::File);

        let outcome = manager(registry)
            .register_script(
                &Registration::new(script(&dir, "tool.py"), "Tool")
                    .params(params)
                    .dry_run(true),
            )
            .unwrap();
        let entries = &outcome.plan().entries;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].entry_path, join_path(FILE_SHELL_PATH, "womm_py_tool"));
        assert!(entries[0].command.ends_with("\"%1\""));
    }

    #[test]
    fn test_empty_context_set_is_rejected() {
        let dir = tempdir().unwrap();
        let m = manager(Arc::new(MemoryRegistry::new()));
        let err = m
            .register_script(
                &Registration::new(script(&dir, "tool.py"), "Tool").params(ContextParameters::new()),
            )
            .unwrap_err();
        assert!(err.to_string().contains("context"));
    }

    #[test]
    fn test_unregister_missing_key_fails() {
        let m = manager(Arc::new(MemoryRegistry::new()));
        let err = m.unregister_script("womm_py_ghost", false).unwrap_err();
        assert!(matches!(err, ContextError::ContextMenu { operation: "unregister", .. }));
    }

    #[test]
    fn test_unregister_dry_run_keeps_entries() {
        let dir = tempdir().unwrap();
        let registry = Arc::new(MemoryRegistry::new());
        let m = manager(registry.clone());
        m.register_script(&Registration::new(script(&dir, "deploy.py"), "Deploy"))
            .unwrap();

        let report = m.unregister_script("womm_py_deploy", true).unwrap();
        assert_eq!(report.removed_from.len(), 2);
        assert!(registry
            .key_exists(&join_path(DIRECTORY_SHELL_PATH, "womm_py_deploy"))
            .unwrap());
    }

    #[test]
    fn test_list_entries_reports_every_context() {
        let dir = tempdir().unwrap();
        let m = manager(Arc::new(MemoryRegistry::new()));
        m.register_script(&Registration::new(script(&dir, "deploy.py"), "Deploy"))
            .unwrap();

        let listing = m.list_entries(None);
        assert_eq!(listing.len(), ContextType::ALL.len());
        assert_eq!(listing[&ContextType::Directory].len(), 1);
        assert!(listing[&ContextType::File].is_empty());
    }

    #[test]
    fn test_restore_rejects_malformed_backup() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("backup.json");
        fs::write(&path, r#"{"metadata": {}}"#).unwrap();

        let err = manager(Arc::new(MemoryRegistry::new()))
            .restore_entries(&path)
            .unwrap_err();
        assert!(matches!(err, ContextError::Validation { .. }));
    }

    #[test]
    fn test_validate_script_rejects_unknown_types() {
        let dir = tempdir().unwrap();
        let m = manager(Arc::new(MemoryRegistry::new()));

        assert!(m.validate_script(&script(&dir, "ok.py")).valid);

        let result = m.validate_script(&script(&dir, "notes.txt"));
        assert!(!result.valid);
    }
}
