// src/system/registry.rs

//! Access to the per-user registry hive.
//!
//! All paths are relative to `HKEY_CURRENT_USER` and use `\` as separator.
//! The hive has no locking or transactions: two processes writing the same key
//! race, and the last writer wins without either noticing.

use std::collections::BTreeMap;
use std::sync::Mutex;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Access denied to '{path}'.")]
    AccessDenied { path: String },
    #[error("Key '{path}' was not found.")]
    NotFound { path: String },
    #[error("Registry operation on '{path}' failed: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("The registry is not available on this platform.")]
    Unsupported,
}

impl RegistryError {
    /// Classifies an I/O error raised while operating on `path`.
    pub fn from_io(path: &str, source: std::io::Error) -> Self {
        match source.kind() {
            std::io::ErrorKind::PermissionDenied => RegistryError::AccessDenied {
                path: path.to_string(),
            },
            std::io::ErrorKind::NotFound => RegistryError::NotFound {
                path: path.to_string(),
            },
            _ => RegistryError::Io {
                path: path.to_string(),
                source,
            },
        }
    }
}

pub type RegistryResult<T> = Result<T, RegistryError>;

/// The operations the context-menu core needs from a key/value store.
///
/// A value name of `""` addresses the key's default value.
pub trait RegistryBackend: Send + Sync + std::fmt::Debug {
    /// Creates `path` and any missing parents. Existing keys are left as they are.
    fn create_key(&self, path: &str) -> RegistryResult<()>;

    /// Writes a string value, creating the key if needed.
    fn set_value(&self, path: &str, name: &str, value: &str) -> RegistryResult<()>;

    /// Reads a string value. `Ok(None)` when either the key or the value is missing.
    fn get_value(&self, path: &str, name: &str) -> RegistryResult<Option<String>>;

    /// Deletes `path` with all its sub-keys. Returns `false` if it did not exist.
    fn delete_tree(&self, path: &str) -> RegistryResult<bool>;

    /// Names of the direct children of `path`. Empty when `path` does not exist.
    fn list_subkeys(&self, path: &str) -> RegistryResult<Vec<String>>;

    fn key_exists(&self, path: &str) -> RegistryResult<bool>;
}

/// Joins registry path segments with `\`.
pub fn join_path(parent: &str, child: &str) -> String {
    if parent.is_empty() {
        child.to_string()
    } else {
        format!(r"{}\{}", parent.trim_end_matches('\\'), child)
    }
}

// --- IN-MEMORY BACKEND ---

#[derive(Debug, Default)]
struct MemoryKey {
    /// Original spelling of the full path.
    path: String,
    values: BTreeMap<String, String>,
}

#[derive(Debug, Default)]
struct MemoryState {
    /// Keyed by lower-cased path; registry names are case-insensitive.
    keys: BTreeMap<String, MemoryKey>,
    denied_prefixes: Vec<String>,
}

/// A registry kept in memory. Used by tests and by callers that want to preview
/// what a set of operations would write.
#[derive(Debug, Default)]
pub struct MemoryRegistry {
    state: Mutex<MemoryState>,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every write at or below `prefix` fail with `AccessDenied`.
    pub fn deny_writes_under(&self, prefix: &str) {
        self.lock().denied_prefixes.push(prefix.to_ascii_lowercase());
    }

    /// Number of keys currently stored.
    pub fn key_count(&self) -> usize {
        self.lock().keys.len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryState> {
        // A poisoned lock only means another test thread panicked mid-write.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn check_writable(state: &MemoryState, path: &str) -> RegistryResult<()> {
        let lower = path.to_ascii_lowercase();
        if state.denied_prefixes.iter().any(|p| lower.starts_with(p.as_str())) {
            return Err(RegistryError::AccessDenied {
                path: path.to_string(),
            });
        }
        Ok(())
    }

    fn insert_with_parents(state: &mut MemoryState, path: &str) {
        let mut current = String::new();
        for segment in path.split('\\').filter(|s| !s.is_empty()) {
            current = join_path(&current, segment);
            state
                .keys
                .entry(current.to_ascii_lowercase())
                .or_insert_with(|| MemoryKey {
                    path: current.clone(),
                    values: BTreeMap::new(),
                });
        }
    }
}

impl RegistryBackend for MemoryRegistry {
    fn create_key(&self, path: &str) -> RegistryResult<()> {
        let mut state = self.lock();
        Self::check_writable(&state, path)?;
        Self::insert_with_parents(&mut state, path);
        Ok(())
    }

    fn set_value(&self, path: &str, name: &str, value: &str) -> RegistryResult<()> {
        let mut state = self.lock();
        Self::check_writable(&state, path)?;
        Self::insert_with_parents(&mut state, path);
        if let Some(key) = state.keys.get_mut(&path.to_ascii_lowercase()) {
            key.values.insert(name.to_string(), value.to_string());
        }
        Ok(())
    }

    fn get_value(&self, path: &str, name: &str) -> RegistryResult<Option<String>> {
        let state = self.lock();
        Ok(state
            .keys
            .get(&path.to_ascii_lowercase())
            .and_then(|key| key.values.get(name).cloned()))
    }

    fn delete_tree(&self, path: &str) -> RegistryResult<bool> {
        let mut state = self.lock();
        Self::check_writable(&state, path)?;
        let lower = path.to_ascii_lowercase();
        if !state.keys.contains_key(&lower) {
            return Ok(false);
        }
        let child_prefix = format!(r"{}\", lower);
        state
            .keys
            .retain(|k, _| k != &lower && !k.starts_with(&child_prefix));
        Ok(true)
    }

    fn list_subkeys(&self, path: &str) -> RegistryResult<Vec<String>> {
        let state = self.lock();
        let child_prefix = format!(r"{}\", path.to_ascii_lowercase());
        Ok(state
            .keys
            .iter()
            .filter_map(|(lower, key)| {
                let rest = lower.strip_prefix(&child_prefix)?;
                if rest.is_empty() || rest.contains('\\') {
                    return None;
                }
                key.path.rsplit('\\').next().map(str::to_string)
            })
            .collect())
    }

    fn key_exists(&self, path: &str) -> RegistryResult<bool> {
        Ok(self.lock().keys.contains_key(&path.to_ascii_lowercase()))
    }
}

// --- WINDOWS BACKEND ---

/// The real `HKEY_CURRENT_USER` hive, through `winreg`.
#[cfg(windows)]
#[derive(Debug, Default)]
pub struct WindowsRegistry;

#[cfg(windows)]
impl WindowsRegistry {
    pub fn current_user() -> Self {
        Self
    }

    fn root() -> winreg::RegKey {
        winreg::RegKey::predef(winreg::enums::HKEY_CURRENT_USER)
    }

    fn open(&self, path: &str) -> RegistryResult<Option<winreg::RegKey>> {
        match Self::root().open_subkey(path) {
            Ok(key) => Ok(Some(key)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(RegistryError::from_io(path, e)),
        }
    }
}

#[cfg(windows)]
impl RegistryBackend for WindowsRegistry {
    fn create_key(&self, path: &str) -> RegistryResult<()> {
        Self::root()
            .create_subkey(path)
            .map(|_| ())
            .map_err(|e| RegistryError::from_io(path, e))
    }

    fn set_value(&self, path: &str, name: &str, value: &str) -> RegistryResult<()> {
        let (key, _) = Self::root()
            .create_subkey(path)
            .map_err(|e| RegistryError::from_io(path, e))?;
        key.set_value(name, &value.to_string())
            .map_err(|e| RegistryError::from_io(path, e))
    }

    fn get_value(&self, path: &str, name: &str) -> RegistryResult<Option<String>> {
        let Some(key) = self.open(path)? else {
            return Ok(None);
        };
        match key.get_value::<String, _>(name) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(RegistryError::from_io(path, e)),
        }
    }

    fn delete_tree(&self, path: &str) -> RegistryResult<bool> {
        match Self::root().delete_subkey_all(path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(RegistryError::from_io(path, e)),
        }
    }

    fn list_subkeys(&self, path: &str) -> RegistryResult<Vec<String>> {
        let Some(key) = self.open(path)? else {
            return Ok(Vec::new());
        };
        key.enum_keys()
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| RegistryError::from_io(path, e))
    }

    fn key_exists(&self, path: &str) -> RegistryResult<bool> {
        Ok(self.open(path)?.is_some())
    }
}

/// The registry of the running user, or `Unsupported` off Windows.
pub fn system_registry() -> RegistryResult<std::sync::Arc<dyn RegistryBackend>> {
    #[cfg(windows)]
    {
        Ok(std::sync::Arc::new(WindowsRegistry::current_user()))
    }
    #[cfg(not(windows))]
    {
        Err(RegistryError::Unsupported)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_registry_set_and_get_is_case_insensitive() {
        let reg = MemoryRegistry::new();
        reg.set_value(r"Software\Classes\Directory\shell\womm_py_a", "", "A")
            .unwrap();
        assert_eq!(
            reg.get_value(r"software\classes\directory\SHELL\WOMM_PY_A", "")
                .unwrap()
                .as_deref(),
            Some("A")
        );
        assert_eq!(reg.get_value(r"Software\Missing", "").unwrap(), None);
    }

    #[test]
    fn test_memory_registry_lists_direct_children_only() {
        let reg = MemoryRegistry::new();
        reg.create_key(r"Root\shell\one\command").unwrap();
        reg.create_key(r"Root\shell\Two").unwrap();

        let mut children = reg.list_subkeys(r"Root\shell").unwrap();
        children.sort();
        assert_eq!(children, vec!["Two".to_string(), "one".to_string()]);
        assert!(reg.list_subkeys(r"Nope").unwrap().is_empty());
    }

    #[test]
    fn test_memory_registry_delete_tree_reports_absence() {
        let reg = MemoryRegistry::new();
        reg.create_key(r"Root\shell\one\command").unwrap();

        assert!(reg.delete_tree(r"Root\shell\one").unwrap());
        assert!(!reg.key_exists(r"Root\shell\one\command").unwrap());
        assert!(reg.key_exists(r"Root\shell").unwrap());
        assert!(!reg.delete_tree(r"Root\shell\one").unwrap());
    }

    #[test]
    fn test_memory_registry_denied_prefix() {
        let reg = MemoryRegistry::new();
        reg.deny_writes_under(r"Root\Locked");
        let err = reg.set_value(r"Root\Locked\x", "", "v").unwrap_err();
        assert!(matches!(err, RegistryError::AccessDenied { .. }));
        assert!(reg.set_value(r"Root\Open\x", "", "v").is_ok());
    }

    #[test]
    fn test_join_path() {
        assert_eq!(join_path(r"A\B\", "c"), r"A\B\c");
        assert_eq!(join_path("", "c"), "c");
    }
}
