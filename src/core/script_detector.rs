// src/core/script_detector.rs

use lazy_static::lazy_static;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::constants::{MIN_PYTHON_VERSION, PYTHON_CANDIDATES, SELECTION_TOKEN};
use crate::core::errors::{ContextError, ContextResult};
use crate::core::icon_manager;
use crate::core::validation::dotted_extension;
use crate::models::{ScriptInfo, ScriptType};
use crate::system::{executor, platform};

lazy_static! {
    static ref PYTHON_VERSION_RE: Regex = Regex::new(r"Python\s+(\d+)\.(\d+)").unwrap();
}

/// Finds interpreters and asks them for their version.
pub trait InterpreterProbe: Send + Sync + std::fmt::Debug {
    /// Absolute path of `program` if it can be launched.
    fn locate(&self, program: &str) -> Option<PathBuf>;

    /// Whatever `<interpreter> --version` printed, if it ran successfully.
    fn version_output(&self, interpreter: &Path) -> Option<String>;
}

/// Probes the real `PATH`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemProbe;

impl InterpreterProbe for SystemProbe {
    fn locate(&self, program: &str) -> Option<PathBuf> {
        platform::find_executable(program)
    }

    fn version_output(&self, interpreter: &Path) -> Option<String> {
        match executor::execute_and_capture_output(interpreter, &["--version"]) {
            Ok(out) => Some(out),
            Err(e) => {
                log::debug!("Version probe failed: {}", e);
                None
            }
        }
    }
}

/// Parses `Python 3.11.4` into `(3, 11)`.
pub fn parse_python_version(output: &str) -> Option<(u32, u32)> {
    let caps = PYTHON_VERSION_RE.captures(output)?;
    let major = caps.get(1)?.as_str().parse().ok()?;
    let minor = caps.get(2)?.as_str().parse().ok()?;
    Some((major, minor))
}

/// Wraps a value in double quotes, escaping embedded quotes.
pub fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\\\""))
}

/// Classifies scripts and builds the command line the shell will run.
#[derive(Debug, Clone)]
pub struct ScriptDetector {
    probe: Arc<dyn InterpreterProbe>,
}

impl Default for ScriptDetector {
    fn default() -> Self {
        Self::new(Arc::new(SystemProbe))
    }
}

impl ScriptDetector {
    pub fn new(probe: Arc<dyn InterpreterProbe>) -> Self {
        Self { probe }
    }

    /// Extension lookup. Unmapped extensions are `Unknown`, never an error.
    pub fn detect_type(&self, path: &Path) -> ScriptType {
        ScriptType::from_extension(&dotted_extension(path))
    }

    /// First candidate that is installed and at least 3.8, in preference order.
    pub fn find_python(&self) -> Option<PathBuf> {
        for candidate in PYTHON_CANDIDATES {
            let Some(path) = self.probe.locate(candidate) else {
                log::debug!("Python candidate '{}' not found", candidate);
                continue;
            };
            let version = self
                .probe
                .version_output(&path)
                .as_deref()
                .and_then(parse_python_version);
            match version {
                Some(v) if v >= MIN_PYTHON_VERSION => {
                    log::debug!("Using Python {}.{} at {}", v.0, v.1, path.display());
                    return Some(path);
                }
                Some(v) => log::debug!(
                    "Skipping Python {}.{} at {} (too old)",
                    v.0,
                    v.1,
                    path.display()
                ),
                None => log::debug!("Could not read the version of {}", path.display()),
            }
        }
        None
    }

    /// Builds the invocation for `path`. The placeholder defaults to the
    /// whole-selection token and is always appended as its own quoted argument.
    pub fn build_command(
        &self,
        script_type: ScriptType,
        path: &Path,
        placeholder: Option<&str>,
    ) -> ContextResult<String> {
        let absolute = absolute_path(path)?;
        let script = quote(&absolute.display().to_string());
        let token = quote(placeholder.unwrap_or(SELECTION_TOKEN));

        let command = match script_type {
            ScriptType::Python => match self.find_python() {
                Some(interpreter) => format!(
                    "{} {} {}",
                    quote(&interpreter.display().to_string()),
                    script,
                    token
                ),
                None => {
                    log::warn!("No Python 3.8+ interpreter found; falling back to the 'py' launcher");
                    format!("py -3 {} {}", script, token)
                }
            },
            ScriptType::PowerShell => format!(
                "powershell.exe -NoProfile -ExecutionPolicy Bypass -File {} {}",
                script, token
            ),
            ScriptType::Batch | ScriptType::Executable | ScriptType::Unknown => {
                format!("{} {}", script, token)
            }
        };
        Ok(command)
    }

    /// Detection, command and default icon in one snapshot.
    pub fn get_script_info(&self, path: &Path) -> ContextResult<ScriptInfo> {
        self.script_info_inner(path)
            .map_err(|e| e.with_script_path(path))
    }

    fn script_info_inner(&self, path: &Path) -> ContextResult<ScriptInfo> {
        let absolute = absolute_path(path)?;
        let script_type = self.detect_type(&absolute);
        let command = self.build_command(script_type, &absolute, None)?;
        Ok(ScriptInfo {
            script_type,
            extension: dotted_extension(&absolute),
            default_icon: icon_manager::default_icon_for(&absolute),
            placeholder: SELECTION_TOKEN.to_string(),
            command,
            path: absolute,
        })
    }
}

/// Resolves `path` against the current directory without the `\\?\` prefix.
fn absolute_path(path: &Path) -> ContextResult<PathBuf> {
    if path.as_os_str().is_empty() {
        return Err(ContextError::script(path, "empty script path"));
    }
    match dunce::canonicalize(path) {
        Ok(p) => Ok(p),
        Err(_) => std::path::absolute(path)
            .map_err(|e| ContextError::unexpected(format!("Cannot resolve '{}'", path.display()), e)),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::fs;
    use tempfile::tempdir;

    /// Answers probes from a fixed table of `name -> (path, --version output)`.
    #[derive(Debug, Default)]
    pub(crate) struct FakeProbe {
        pub(crate) installed: HashMap<String, (PathBuf, String)>,
    }

    impl FakeProbe {
        pub(crate) fn with(mut self, name: &str, path: &str, version: &str) -> Self {
            self.installed
                .insert(name.to_string(), (PathBuf::from(path), version.to_string()));
            self
        }
    }

    impl InterpreterProbe for FakeProbe {
        fn locate(&self, program: &str) -> Option<PathBuf> {
            self.installed.get(program).map(|(p, _)| p.clone())
        }

        fn version_output(&self, interpreter: &Path) -> Option<String> {
            self.installed
                .values()
                .find(|(p, _)| p == interpreter)
                .map(|(_, v)| v.clone())
        }
    }

    fn detector(probe: FakeProbe) -> ScriptDetector {
        ScriptDetector::new(Arc::new(probe))
    }

    #[test]
    fn test_detect_type_by_extension() {
        let d = detector(FakeProbe::default());
        assert_eq!(d.detect_type(Path::new("a.py")), ScriptType::Python);
        assert_eq!(d.detect_type(Path::new("a.PYW")), ScriptType::Python);
        assert_eq!(d.detect_type(Path::new("a.ps1")), ScriptType::PowerShell);
        assert_eq!(d.detect_type(Path::new("a.cmd")), ScriptType::Batch);
        assert_eq!(d.detect_type(Path::new("a.exe")), ScriptType::Executable);
        assert_eq!(d.detect_type(Path::new("a.rb")), ScriptType::Unknown);
        assert_eq!(d.detect_type(Path::new("Makefile")), ScriptType::Unknown);
    }

    #[test]
    fn test_parse_python_version() {
        assert_eq!(parse_python_version("Python 3.11.4\n"), Some((3, 11)));
        assert_eq!(parse_python_version("Python 2.7.18"), Some((2, 7)));
        assert_eq!(parse_python_version("garbage"), None);
    }

    #[test]
    fn test_find_python_skips_old_interpreters() {
        let probe = FakeProbe::default()
            .with("python3", "/usr/bin/python3", "Python 3.7.9")
            .with("python", "/opt/python", "Python 3.12.1");
        assert_eq!(
            detector(probe).find_python(),
            Some(PathBuf::from("/opt/python"))
        );
    }

    #[test]
    fn test_find_python_prefers_python3() {
        let probe = FakeProbe::default()
            .with("python3", "/usr/bin/python3", "Python 3.8.0")
            .with("python", "/opt/python", "Python 3.12.1");
        assert_eq!(
            detector(probe).find_python(),
            Some(PathBuf::from("/usr/bin/python3"))
        );
    }

    #[test]
    fn test_python_command_uses_interpreter_and_absolute_path() {
        let dir = tempdir().unwrap();
        let script = dir.path().join("deploy.py");
        fs::write(&script, "print('x')").unwrap();

        let d = detector(FakeProbe::default().with("python", "/opt/py/python", "Python 3.10.2"));
        let command = d.build_command(ScriptType::Python, &script, None).unwrap();
        let absolute = dunce::canonicalize(&script).unwrap();

        assert_eq!(
            command,
            format!("\"/opt/py/python\" \"{}\" \"%V\"", absolute.display())
        );
    }

    #[test]
    fn test_python_command_falls_back_to_launcher() {
        let d = detector(FakeProbe::default().with("python", "/old/python", "Python 2.7.18"));
        let command = d
            .build_command(ScriptType::Python, Path::new("/srv/tool.py"), Some("%1"))
            .unwrap();
        assert!(command.starts_with("py -3 "));
        assert!(command.ends_with("\"%1\""));
    }

    #[test]
    fn test_powershell_command_bypasses_execution_policy() {
        let d = detector(FakeProbe::default());
        let command = d
            .build_command(ScriptType::PowerShell, Path::new("/srv/x.ps1"), None)
            .unwrap();
        assert!(command.contains("-ExecutionPolicy Bypass -File"));
        assert!(command.ends_with("\"%V\""));
    }

    #[test]
    fn test_relative_paths_are_resolved() {
        let d = detector(FakeProbe::default());
        let command = d
            .build_command(ScriptType::Batch, Path::new("relative/run.bat"), None)
            .unwrap();
        let cwd = std::env::current_dir().unwrap();
        assert!(command.starts_with(&format!("\"{}", cwd.display())));
    }

    #[test]
    fn test_get_script_info() {
        let dir = tempdir().unwrap();
        let script = dir.path().join("run.bat");
        fs::write(&script, "@echo off").unwrap();

        let info = detector(FakeProbe::default()).get_script_info(&script).unwrap();
        assert_eq!(info.script_type, ScriptType::Batch);
        assert_eq!(info.extension, ".bat");
        assert_eq!(info.placeholder, "%V");
        assert!(info.default_icon.is_some());
        assert!(info.path.is_absolute());
    }

    #[test]
    fn test_get_script_info_attaches_path_to_errors() {
        let err = detector(FakeProbe::default())
            .get_script_info(Path::new(""))
            .unwrap_err();
        assert!(matches!(err, ContextError::Script { .. }));
    }
}
