// src/core/context_parameters.rs

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::constants::FILE_ASSOCIATIONS_PATH;
use crate::models::{ContextType, RegistryTarget, ValidationResult};
use crate::system::registry::join_path;

lazy_static! {
    /// `... "%V"`: the token is its own quoted argument.
    static ref QUOTED_TOKEN_RE: Regex = Regex::new(r#"\s*"%[1VvLlWw*]"\s*$"#).unwrap();
    /// `... "C:\app.exe %V"`: the token sits right before a closing quote.
    static ref TOKEN_THEN_QUOTE_RE: Regex = Regex::new(r#"%[1VvLlWw*]"\s*$"#).unwrap();
    /// `... %V`: an unquoted trailing token.
    static ref BARE_TOKEN_RE: Regex = Regex::new(r"\s+%[1VvLlWw*]\s*$").unwrap();
}

/// Named families of file extensions.
pub const FILE_TYPE_FAMILIES: &[(&str, &[&str])] = &[
    ("image", &[".jpg", ".jpeg", ".png", ".gif", ".bmp", ".tiff", ".webp", ".svg", ".ico"]),
    ("text", &[".txt", ".md", ".log", ".csv", ".ini", ".cfg"]),
    (
        "code",
        &[
            ".py", ".js", ".ts", ".rs", ".java", ".c", ".cpp", ".h", ".cs", ".go", ".rb", ".php",
            ".html", ".css", ".json", ".xml", ".yaml", ".yml", ".toml",
        ],
    ),
    ("document", &[".pdf", ".doc", ".docx", ".xls", ".xlsx", ".ppt", ".pptx", ".odt"]),
    ("archive", &[".zip", ".rar", ".7z", ".tar", ".gz", ".bz2", ".xz"]),
    ("audio", &[".mp3", ".wav", ".flac", ".ogg", ".m4a", ".aac"]),
    ("video", &[".mp4", ".avi", ".mkv", ".mov", ".wmv", ".webm"]),
];

/// Extensions of a named family, if the family exists.
pub fn family_extensions(name: &str) -> Option<&'static [&'static str]> {
    FILE_TYPE_FAMILIES
        .iter()
        .find(|(family, _)| *family == name)
        .map(|(_, exts)| *exts)
}

/// The high-level location switches a caller can set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContextFlags {
    pub directory: bool,
    pub background: bool,
    pub file: bool,
    pub files: bool,
    pub root: bool,
}

/// Where an entry appears and which files it applies to.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct ContextParameters {
    #[serde(default)]
    pub context_types: BTreeSet<ContextType>,
    /// Named families such as `image`.
    #[serde(default)]
    pub file_types: BTreeSet<String>,
    /// Custom extensions, each starting with `.`.
    #[serde(default)]
    pub extensions: BTreeSet<String>,
}

impl ContextParameters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Folders and folder backgrounds: what a registration targets when the
    /// caller did not say.
    pub fn default_contexts() -> Self {
        let mut params = Self::new();
        params.add_context(ContextType::Directory);
        params.add_context(ContextType::Background);
        params
    }

    /// Builds parameters from CLI-style switches. With no switch set, the
    /// defaults (folders and backgrounds) apply whatever filters are given.
    pub fn from_flags(flags: &ContextFlags, file_types: &[String], extensions: &[String]) -> Self {
        let mut params = Self::new();
        let switches = [
            (flags.directory, ContextType::Directory),
            (flags.background, ContextType::Background),
            (flags.file, ContextType::File),
            (flags.files, ContextType::Files),
            (flags.root, ContextType::Root),
        ];
        for (enabled, context) in switches {
            if enabled {
                params.add_context(context);
            }
        }

        for name in file_types.iter().chain(extensions) {
            params.add_file_type(name);
        }

        if params.context_types.is_empty() {
            params.add_context(ContextType::Directory);
            params.add_context(ContextType::Background);
        }
        params
    }

    pub fn add_context(&mut self, context: ContextType) -> &mut Self {
        self.context_types.insert(context);
        self
    }

    /// Adds a known family by name, or anything else as a custom extension.
    pub fn add_file_type(&mut self, name: &str) -> &mut Self {
        let normalized = name.trim().to_lowercase();
        if normalized.is_empty() {
            return self;
        }
        if family_extensions(&normalized).is_some() {
            self.file_types.insert(normalized);
            self
        } else {
            self.add_extension(&normalized)
        }
    }

    /// Adds a custom extension, lower-cased and prefixed with `.` if needed.
    pub fn add_extension(&mut self, extension: &str) -> &mut Self {
        let trimmed = extension.trim().to_lowercase();
        if trimmed.is_empty() {
            return self;
        }
        let normalized = if trimmed.starts_with('.') {
            trimmed
        } else {
            format!(".{}", trimmed)
        };
        self.extensions.insert(normalized);
        self
    }

    pub fn has_extension_filter(&self) -> bool {
        !self.file_types.is_empty() || !self.extensions.is_empty()
    }

    /// Every extension targeted, from families and custom entries.
    pub fn all_extensions(&self) -> BTreeSet<String> {
        let mut all: BTreeSet<String> = self
            .file_types
            .iter()
            .filter_map(|f| family_extensions(f))
            .flat_map(|exts| exts.iter().map(|e| e.to_string()))
            .collect();
        all.extend(self.extensions.iter().cloned());
        all
    }

    /// Selected contexts, with `Files` overriding `File`.
    pub fn effective_contexts(&self) -> Vec<ContextType> {
        let files = self.context_types.contains(&ContextType::Files);
        self.context_types
            .iter()
            .copied()
            .filter(|c| !(files && *c == ContextType::File))
            .collect()
    }

    /// The fixed registry location of each selected context.
    pub fn get_registry_paths(&self) -> Vec<String> {
        self.effective_contexts()
            .iter()
            .map(|c| c.registry_path().to_string())
            .collect()
    }

    /// Whether the extension filter takes effect: it narrows the single-file
    /// context only.
    pub fn filters_files(&self) -> bool {
        self.has_extension_filter() && self.effective_contexts().contains(&ContextType::File)
    }

    /// Every location a registration writes to. An effective extension filter
    /// replaces the catch-all single-file location with one per extension.
    pub fn registry_targets(&self) -> Vec<RegistryTarget> {
        let filtered = self.filters_files();
        let mut targets: Vec<RegistryTarget> = self
            .effective_contexts()
            .into_iter()
            .filter(|c| !(filtered && *c == ContextType::File))
            .map(|c| RegistryTarget {
                registry_path: c.registry_path().to_string(),
                context_type: c,
                extension: None,
            })
            .collect();

        if !filtered {
            return targets;
        }
        for extension in self.all_extensions() {
            let association = join_path(FILE_ASSOCIATIONS_PATH, &extension);
            targets.push(RegistryTarget {
                registry_path: join_path(&association, "shell"),
                context_type: ContextType::File,
                extension: Some(extension),
            });
        }
        targets
    }

    pub fn get_command_parameter(&self, context: ContextType) -> &'static str {
        context.placeholder()
    }

    /// Re-targets `base_command` at `context`, replacing any trailing placeholder
    /// so that rebuilding never stacks tokens.
    pub fn build_command(&self, base_command: &str, context: ContextType) -> String {
        let token = self.get_command_parameter(context);
        let quoted = format!(" \"{}\"", token);

        if QUOTED_TOKEN_RE.is_match(base_command) {
            return QUOTED_TOKEN_RE
                .replace(base_command, quoted.as_str())
                .into_owned();
        }
        if TOKEN_THEN_QUOTE_RE.is_match(base_command) {
            let replacement = format!("{}\"", token);
            return TOKEN_THEN_QUOTE_RE
                .replace(base_command, replacement.as_str())
                .into_owned();
        }
        if BARE_TOKEN_RE.is_match(base_command) {
            return BARE_TOKEN_RE
                .replace(base_command, quoted.as_str())
                .into_owned();
        }
        format!("{}{}", base_command.trim_end(), quoted)
    }

    pub fn validate_parameters(&self) -> ValidationResult {
        let mut result = ValidationResult::new();

        if self.context_types.is_empty() {
            result.error("At least one context type must be selected");
        }
        for extension in &self.extensions {
            if !extension.starts_with('.') || extension.len() < 2 {
                result.error(format!(
                    "Custom extension '{}' must start with '.' followed by a name",
                    extension
                ));
            }
        }
        if self.context_types.contains(&ContextType::File)
            && self.context_types.contains(&ContextType::Files)
        {
            result.warning("Both 'file' and 'files' are selected; 'files' takes precedence");
        }
        for family in &self.file_types {
            if family_extensions(family).is_none() {
                result.warning(format!("Unknown file type family '{}' is ignored", family));
            }
        }
        if self.has_extension_filter() && !self.filters_files() {
            result.warning("File type filters only apply to the 'file' context and are ignored");
        }

        result.detail(
            "contexts",
            self.effective_contexts()
                .iter()
                .map(ContextType::as_str)
                .collect::<Vec<_>>()
                .join(", "),
        );
        result
    }

    /// Human-readable summary of where the entry will appear.
    pub fn get_description(&self) -> Vec<String> {
        let mut lines: Vec<String> = self
            .registry_targets()
            .iter()
            .filter(|t| t.extension.is_none())
            .map(|t| t.context_type.description().to_string())
            .collect();

        let extensions = self.all_extensions();
        if self.filters_files() && !extensions.is_empty() {
            let list: Vec<&str> = extensions.iter().map(String::as_str).collect();
            lines.push(format!("right-click on files of type: {}", list.join(", ")));
        }
        lines
    }
}
