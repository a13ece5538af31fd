// src/core/icon_manager.rs

use std::env;
use std::path::{Path, PathBuf};

use crate::core::errors::{ContextError, ContextResult};
use crate::core::validation;
use crate::system::platform;

const SHELL32: &str = r"%SystemRoot%\System32\shell32.dll";
const IMAGERES: &str = r"%SystemRoot%\System32\imageres.dll";
const CMD_EXE: &str = r"%SystemRoot%\System32\cmd.exe";
const POWERSHELL_EXE: &str = r"%SystemRoot%\System32\WindowsPowerShell\v1.0\powershell.exe";

/// Where a resolved icon came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IconSource {
    ExtensionDefault,
    SystemIcon,
    ExplicitPath,
    SearchDirectory,
    ExecutableSearch,
}

/// The outcome of a best-effort icon lookup. A missing icon never fails a
/// registration; the diagnostic says why nothing was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IconResolution {
    pub icon: Option<String>,
    pub source: Option<IconSource>,
    pub diagnostic: Option<String>,
}

impl IconResolution {
    fn found(icon: String, source: IconSource) -> Self {
        Self {
            icon: Some(icon),
            source: Some(source),
            diagnostic: None,
        }
    }

    fn missing(diagnostic: String) -> Self {
        Self {
            icon: None,
            source: None,
            diagnostic: Some(diagnostic),
        }
    }
}

/// Turns icon requests (`auto`, a named system icon, a path or a bare file name)
/// into references the shell can render.
#[derive(Debug, Clone)]
pub struct IconManager {
    search_dirs: Vec<PathBuf>,
    path_dirs: Vec<PathBuf>,
}

impl Default for IconManager {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl IconManager {
    /// Searches the well-known Windows directories (plus `extra_dirs`) and `PATH`.
    pub fn new(extra_dirs: Vec<PathBuf>) -> Self {
        let mut search_dirs = well_known_icon_dirs();
        search_dirs.extend(extra_dirs);
        Self {
            search_dirs,
            path_dirs: platform::path_dirs(),
        }
    }

    /// Uses exactly the given directories for bare-name and executable lookups.
    pub fn with_search_dirs(search_dirs: Vec<PathBuf>, path_dirs: Vec<PathBuf>) -> Self {
        Self {
            search_dirs,
            path_dirs,
        }
    }

    /// Resolves `request` for the script at `file_path`. First match wins:
    /// 1. absent or `auto`: the default for the file's extension
    /// 2. a named system icon
    /// 3. an existing icon path (`file,N` index notation allowed)
    /// 4. a bare file name found in the well-known directories
    /// 5. a program found on `PATH`
    ///
    /// `none` asks for no icon at all; `default` is an alias for `auto`.
    pub fn resolve_icon(&self, request: Option<&str>, file_path: Option<&Path>) -> IconResolution {
        if request.is_some_and(|r| r.trim().eq_ignore_ascii_case("none")) {
            return IconResolution {
                icon: None,
                source: None,
                diagnostic: None,
            };
        }
        match self.try_resolve_icon(request, file_path) {
            Ok((icon, source)) => {
                log::debug!("Icon resolved from {:?}: {}", source, icon);
                IconResolution::found(icon, source)
            }
            Err(e) => {
                log::warn!("{}", e);
                IconResolution::missing(e.to_string())
            }
        }
    }

    fn try_resolve_icon(
        &self,
        request: Option<&str>,
        file_path: Option<&Path>,
    ) -> ContextResult<(String, IconSource)> {
        let request = request.map(str::trim).filter(|r| !r.is_empty());

        let Some(request) = request.filter(|r| !r.eq_ignore_ascii_case("auto") && !r.eq_ignore_ascii_case("default"))
        else {
            let file_path = file_path.ok_or_else(|| icon_error("auto", "no file to derive an icon from"))?;
            return default_icon_for(file_path)
                .map(|icon| (icon, IconSource::ExtensionDefault))
                .ok_or_else(|| icon_error("auto", "no default icon for this file type"));
        };

        if let Some(icon) = system_icon(request) {
            return Ok((icon, IconSource::SystemIcon));
        }

        let expanded = shellexpand::full(request)
            .map(|s| s.into_owned())
            .unwrap_or_else(|_| request.to_string());

        if validation::validate_icon_path(&expanded).valid {
            return Ok((expanded, IconSource::ExplicitPath));
        }

        if !request.contains(['/', '\\']) {
            let (name, index) = split_icon_index(request);
            let found = self
                .search_dirs
                .iter()
                .map(|dir| dir.join(name))
                .find(|candidate| validation::validate_icon_path(&candidate.to_string_lossy()).valid);
            if let Some(path) = found {
                return Ok((with_index(&path, index), IconSource::SearchDirectory));
            }

            if let Some(path) = platform::find_executable_in(name, &self.path_dirs) {
                return Ok((with_index(&path, index), IconSource::ExecutableSearch));
            }
        }

        Err(icon_error(request, "not a system icon, an icon file, or a program on PATH"))
    }
}

fn icon_error(request: &str, message: &str) -> ContextError {
    ContextError::Icon {
        request: request.to_string(),
        message: message.to_string(),
    }
}

/// Splits `file.dll,-67` into `("file.dll", Some("-67"))`.
pub fn split_icon_index(icon: &str) -> (&str, Option<&str>) {
    match icon.rsplit_once(',') {
        Some((path, index)) if index.trim().parse::<i32>().is_ok() => (path, Some(index.trim())),
        _ => (icon, None),
    }
}

fn with_index(path: &Path, index: Option<&str>) -> String {
    match index {
        Some(i) => format!("{},{}", path.display(), i),
        None => path.display().to_string(),
    }
}

/// Icon shown for a script when the caller asked for `auto`.
pub fn default_icon_for(file_path: &Path) -> Option<String> {
    let extension = file_path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy().to_ascii_lowercase()))?;
    match extension.as_str() {
        // An executable carries its own icon.
        ".exe" => Some(format!("{},0", file_path.display())),
        ".py" | ".pyw" => Some(format!("{},-5302", IMAGERES)),
        ".ps1" => Some(format!("{},0", POWERSHELL_EXE)),
        ".bat" | ".cmd" => Some(format!("{},0", CMD_EXE)),
        _ => None,
    }
}

/// Named shortcuts for common system icons.
pub fn system_icon(name: &str) -> Option<String> {
    let icon = match name.to_ascii_lowercase().as_str() {
        "folder" => format!("{},3", SHELL32),
        "application" | "app" => format!("{},2", SHELL32),
        "settings" | "gear" => format!("{},-114", IMAGERES),
        "script" => format!("{},-68", IMAGERES),
        "python" => format!("{},-5302", IMAGERES),
        "terminal" | "cmd" => format!("{},0", CMD_EXE),
        "powershell" => format!("{},0", POWERSHELL_EXE),
        "warning" => format!("{},-84", IMAGERES),
        "info" => format!("{},-81", IMAGERES),
        _ => return None,
    };
    Some(icon)
}

fn well_known_icon_dirs() -> Vec<PathBuf> {
    let mut dirs = Vec::new();
    if let Some(root) = env::var_os("SystemRoot").or_else(|| env::var_os("windir")) {
        let root = PathBuf::from(root);
        dirs.push(root.join("System32"));
        dirs.push(root.clone());
        dirs.push(root.join("System32").join("WindowsPowerShell").join("v1.0"));
    }
    if let Some(program_files) = env::var_os("ProgramFiles") {
        dirs.push(PathBuf::from(program_files));
    }
    dirs
}
