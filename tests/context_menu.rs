// tests/context_menu.rs

use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::{TempDir, tempdir};
use womm::constants::{BACKGROUND_SHELL_PATH, DIRECTORY_SHELL_PATH, MAX_LABEL_LENGTH};
use womm::core::backup_store::JsonBackupStore;
use womm::core::context_parameters::{ContextFlags, ContextParameters};
use womm::core::errors::ContextError;
use womm::core::icon_manager::IconManager;
use womm::core::manager::{ContextMenuManager, Registration};
use womm::core::script_detector::{InterpreterProbe, ScriptDetector};
use womm::models::ContextType;
use womm::system::platform::PlatformInfo;
use womm::system::registry::{MemoryRegistry, RegistryBackend, join_path};

const PYTHON: &str = r"C:\Python312\python.exe";

/// Pretends a single Python 3.12 is installed as `python`.
#[derive(Debug, Default)]
struct InstalledPython {
    versions: HashMap<PathBuf, String>,
}

impl InstalledPython {
    fn new() -> Self {
        let mut versions = HashMap::new();
        versions.insert(PathBuf::from(PYTHON), "Python 3.12.1".to_string());
        Self { versions }
    }
}

impl InterpreterProbe for InstalledPython {
    fn locate(&self, program: &str) -> Option<PathBuf> {
        (program == "python").then(|| PathBuf::from(PYTHON))
    }

    fn version_output(&self, interpreter: &Path) -> Option<String> {
        self.versions.get(interpreter).cloned()
    }
}

fn manager(registry: Arc<MemoryRegistry>) -> ContextMenuManager {
    ContextMenuManager::new(
        registry,
        PlatformInfo::windows(10, 0),
        ScriptDetector::new(Arc::new(InstalledPython::new())),
        IconManager::with_search_dirs(Vec::new(), Vec::new()),
        Arc::new(JsonBackupStore),
    )
}

fn write_script(dir: &TempDir, name: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, "import sys\nprint(sys.argv)\n").unwrap();
    path
}

fn entry_path(parent: &str) -> String {
    join_path(parent, "womm_py_deploy")
}

#[test]
fn registers_python_script_in_default_locations() {
    let dir = tempdir().unwrap();
    let registry = Arc::new(MemoryRegistry::new());
    let script = write_script(&dir, "deploy.py");

    let outcome = manager(registry.clone())
        .register_script(&Registration::new(&script, "Deploy"))
        .unwrap();

    let plan = outcome.plan();
    assert_eq!(plan.key_name, "womm_py_deploy");
    assert!(plan.command.contains(PYTHON));
    assert!(plan.command.ends_with("\"%V\""));

    for parent in [DIRECTORY_SHELL_PATH, BACKGROUND_SHELL_PATH] {
        let path = entry_path(parent);
        assert_eq!(registry.get_value(&path, "").unwrap().as_deref(), Some("Deploy"));
        let command = registry
            .get_value(&join_path(&path, "command"), "")
            .unwrap()
            .unwrap();
        assert!(command.contains(PYTHON));
        assert!(command.contains("\"%V\""));
    }
}

#[test]
fn dry_run_writes_nothing_and_matches_real_plan() {
    let dir = tempdir().unwrap();
    let registry = Arc::new(MemoryRegistry::new());
    let m = manager(registry.clone());
    let script = write_script(&dir, "deploy.py");

    let preview = m
        .register_script(&Registration::new(&script, "Deploy").dry_run(true))
        .unwrap();
    assert!(preview.is_dry_run());
    assert_eq!(registry.key_count(), 0);
    for parent in [DIRECTORY_SHELL_PATH, BACKGROUND_SHELL_PATH] {
        assert!(!registry.key_exists(&entry_path(parent)).unwrap());
    }

    let real = m
        .register_script(&Registration::new(&script, "Deploy"))
        .unwrap();
    assert_eq!(preview.plan().key_name, real.plan().key_name);
    assert_eq!(preview.plan().command, real.plan().command);
    assert_eq!(preview.plan().entries, real.plan().entries);
}

#[test]
fn partial_failure_reports_count_and_keeps_written_entries() {
    let dir = tempdir().unwrap();
    let registry = Arc::new(MemoryRegistry::new());
    registry.deny_writes_under(BACKGROUND_SHELL_PATH);
    let script = write_script(&dir, "deploy.py");

    let err = manager(registry.clone())
        .register_script(&Registration::new(&script, "Deploy"))
        .unwrap_err();

    assert!(matches!(err, ContextError::ContextMenu { .. }));
    assert!(err.to_string().contains("1/2 locations succeeded"));
    assert_eq!(err.details().len(), 1);
    // No rollback: the folder entry stays.
    assert!(registry.key_exists(&entry_path(DIRECTORY_SHELL_PATH)).unwrap());
    assert!(!registry.key_exists(&entry_path(BACKGROUND_SHELL_PATH)).unwrap());
}

#[test]
fn unregister_succeeds_when_only_one_location_has_the_key() {
    let registry = Arc::new(MemoryRegistry::new());
    let path = entry_path(BACKGROUND_SHELL_PATH);
    registry.set_value(&path, "", "Deploy").unwrap();
    registry
        .set_value(&join_path(&path, "command"), "", "\"deploy.py\" \"%V\"")
        .unwrap();

    let report = manager(registry.clone())
        .unregister_script("womm_py_deploy", false)
        .unwrap();

    assert_eq!(report.removed_from, vec![ContextType::Background]);
    assert_eq!(report.not_found_in, vec![ContextType::Directory]);
    assert!(!registry.key_exists(&path).unwrap());
}

#[test]
fn missing_icon_does_not_block_registration() {
    let dir = tempdir().unwrap();
    let registry = Arc::new(MemoryRegistry::new());
    let script = write_script(&dir, "deploy.py");

    let outcome = manager(registry.clone())
        .register_script(&Registration::new(&script, "Deploy").icon("doesnotexist.ico"))
        .unwrap();

    assert_eq!(outcome.plan().icon, None);
    assert!(outcome
        .plan()
        .warnings
        .iter()
        .any(|w| w.contains("doesnotexist.ico")));
    let path = entry_path(DIRECTORY_SHELL_PATH);
    assert!(registry.key_exists(&path).unwrap());
    assert_eq!(registry.get_value(&path, "Icon").unwrap(), None);
}

#[test]
fn backup_then_restore_reproduces_entries() {
    let dir = tempdir().unwrap();
    let registry = Arc::new(MemoryRegistry::new());
    let m = manager(registry.clone());

    m.register_script(&Registration::new(write_script(&dir, "deploy.py"), "Deploy"))
        .unwrap();
    let mut params = ContextParameters::new();
    params.add_context(ContextType::File);
    m.register_script(
        &Registration::new(write_script(&dir, "lint.py"), "Lint").params(params),
    )
    .unwrap();

    let snapshot_of = |m: &ContextMenuManager| -> BTreeSet<(ContextType, String, String)> {
        m.list_entries(None)
            .into_iter()
            .flat_map(|(context, entries)| {
                entries
                    .into_iter()
                    .map(move |e| (context, e.key_name, e.command.unwrap_or_default()))
            })
            .collect()
    };
    let before = snapshot_of(&m);
    assert_eq!(before.len(), 3);

    let backup = dir.path().join("backups").join("womm.json");
    let snapshot = m.backup_entries(&backup).unwrap();
    assert_eq!(snapshot.metadata.total_entries, 3);

    let keys: BTreeSet<String> = before.iter().map(|(_, key, _)| key.clone()).collect();
    for key in &keys {
        m.unregister_script_from(key, &ContextType::ALL, false).unwrap();
    }
    assert!(snapshot_of(&m).is_empty());

    let report = m.restore_entries(&backup).unwrap();
    assert_eq!(report.restored, 3);
    assert_eq!(report.failed, 0);
    assert_eq!(snapshot_of(&m), before);
}

#[test]
fn extension_entries_survive_backup_unregister_and_restore() {
    let dir = tempdir().unwrap();
    let registry = Arc::new(MemoryRegistry::new());
    let m = manager(registry.clone());

    let flags = ContextFlags {
        file: true,
        ..Default::default()
    };
    let params = ContextParameters::from_flags(&flags, &[], &[".log".to_string()]);
    let outcome = m
        .register_script(&Registration::new(write_script(&dir, "fmt.py"), "Format").params(params))
        .unwrap();
    let entry = r"Software\Classes\SystemFileAssociations\.log\shell\womm_py_fmt";
    assert_eq!(outcome.plan().entries.len(), 1);
    assert_eq!(outcome.plan().entries[0].entry_path, entry);
    assert!(registry.key_exists(entry).unwrap());

    let listed = m.list_entries(None);
    assert_eq!(listed[&ContextType::File].len(), 1);
    assert_eq!(listed[&ContextType::File][0].registry_path, entry);

    let backup = dir.path().join("womm.json");
    let snapshot = m.backup_entries(&backup).unwrap();
    assert_eq!(snapshot.metadata.total_entries, 1);

    let report = m
        .unregister_script_from("womm_py_fmt", &ContextType::ALL, false)
        .unwrap();
    assert_eq!(report.removed_from, vec![ContextType::File]);
    assert!(!registry.key_exists(entry).unwrap());

    let restored = m.restore_entries(&backup).unwrap();
    assert_eq!(restored.restored, 1);
    let command = registry
        .get_value(&join_path(entry, "command"), "")
        .unwrap()
        .unwrap();
    assert!(command.ends_with("\"%1\""));
}

#[test]
fn label_length_boundary() {
    let dir = tempdir().unwrap();
    let script = write_script(&dir, "deploy.py");
    let m = manager(Arc::new(MemoryRegistry::new()));

    let longest = "L".repeat(MAX_LABEL_LENGTH);
    assert!(m
        .register_script(&Registration::new(&script, longest).dry_run(true))
        .is_ok());

    let too_long = "L".repeat(MAX_LABEL_LENGTH + 1);
    let err = m
        .register_script(&Registration::new(&script, too_long).dry_run(true))
        .unwrap_err();
    assert!(matches!(err, ContextError::Validation { .. }));
}
