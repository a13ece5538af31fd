// src/system/platform.rs

use lazy_static::lazy_static;
use regex::Regex;
use std::env;
use std::path::{Path, PathBuf};

use super::executor;

lazy_static! {
    static ref WINDOWS_VERSION_RE: Regex = Regex::new(r"(\d+)\.(\d+)(?:\.(\d+))?").unwrap();
}

/// The operating system the process runs on, as far as compatibility checks care.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformInfo {
    /// `"windows"` or `"unix"`, as in `std::env::consts::FAMILY`.
    pub family: String,
    pub os: String,
    /// `(major, minor)` when it could be determined.
    pub version: Option<(u32, u32)>,
}

impl PlatformInfo {
    /// Describes the running host. On Windows the version comes from `cmd /c ver`.
    pub fn detect() -> Self {
        let version = if cfg!(windows) {
            executor::execute_and_capture_output(Path::new("cmd"), &["/C", "ver"])
                .ok()
                .and_then(|out| parse_windows_version(&out))
        } else {
            None
        };
        Self {
            family: env::consts::FAMILY.to_string(),
            os: env::consts::OS.to_string(),
            version,
        }
    }

    /// A fixed Windows description, for callers that already know the host.
    pub fn windows(major: u32, minor: u32) -> Self {
        Self {
            family: "windows".to_string(),
            os: "windows".to_string(),
            version: Some((major, minor)),
        }
    }

    pub fn is_windows(&self) -> bool {
        self.family == "windows"
    }
}

/// Extracts `(major, minor)` from output like `Microsoft Windows [Version 10.0.19045.3803]`.
pub fn parse_windows_version(output: &str) -> Option<(u32, u32)> {
    let caps = WINDOWS_VERSION_RE.captures(output)?;
    let major = caps.get(1)?.as_str().parse().ok()?;
    let minor = caps.get(2)?.as_str().parse().ok()?;
    Some((major, minor))
}

/// Directories listed in `PATH`.
pub fn path_dirs() -> Vec<PathBuf> {
    env::var_os("PATH")
        .map(|p| env::split_paths(&p).collect())
        .unwrap_or_default()
}

/// Looks `name` up in `dirs`, also trying `PATHEXT` suffixes on Windows.
pub fn find_executable_in(name: &str, dirs: &[PathBuf]) -> Option<PathBuf> {
    let mut candidates = vec![name.to_string()];
    if cfg!(windows) && Path::new(name).extension().is_none() {
        let pathext = env::var("PATHEXT").unwrap_or_else(|_| ".COM;.EXE;.BAT;.CMD".to_string());
        candidates.extend(
            pathext
                .split(';')
                .filter(|e| !e.is_empty())
                .map(|ext| format!("{}{}", name, ext.to_ascii_lowercase())),
        );
    }

    dirs.iter()
        .flat_map(|dir| candidates.iter().map(move |c| dir.join(c)))
        .find(|candidate| candidate.is_file())
}

/// Looks `name` up in the directories of `PATH`.
pub fn find_executable(name: &str) -> Option<PathBuf> {
    find_executable_in(name, &path_dirs())
}
