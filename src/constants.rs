// src/constants.rs

/// Prefix shared by every key name this crate creates. Listing and backup only
/// consider child keys carrying it.
pub const KEY_PREFIX: &str = "womm_";

/// Registry location (relative to HKEY_CURRENT_USER) for folder entries.
pub const DIRECTORY_SHELL_PATH: &str = r"Software\Classes\Directory\shell";

/// Registry location for entries shown on a folder's background.
pub const BACKGROUND_SHELL_PATH: &str = r"Software\Classes\Directory\Background\shell";

/// Registry location for entries shown on any single file.
pub const FILE_SHELL_PATH: &str = r"Software\Classes\*\shell";

/// Registry location for entries shown on multi-item selections.
pub const FILES_SHELL_PATH: &str = r"Software\Classes\AllFilesystemObjects\shell";

/// Registry location for entries shown on drive roots.
pub const ROOT_SHELL_PATH: &str = r"Software\Classes\Drive\shell";

/// Parent of the per-extension locations (`<this>\.jpg\shell`).
pub const FILE_ASSOCIATIONS_PATH: &str = r"Software\Classes\SystemFileAssociations";

/// Name of the nested sub-key holding the invocation string.
pub const COMMAND_SUBKEY: &str = "command";

/// Value name holding the icon reference. The display name is the default value.
pub const ICON_VALUE: &str = "Icon";

/// Throwaway key used to probe write access.
pub const PERMISSION_PROBE_KEY: &str = r"Software\Classes\Directory\shell\womm_permission_probe";

/// Token the shell replaces with the whole selection (folder, background, drive).
pub const SELECTION_TOKEN: &str = "%V";

/// Token the shell replaces with the single clicked item.
pub const SINGLE_ITEM_TOKEN: &str = "%1";

/// Script extensions accepted for registration.
pub const ALLOWED_SCRIPT_EXTENSIONS: &[&str] = &[".py", ".pyw", ".ps1", ".bat", ".cmd", ".exe"];

/// Extensions whose files are not probed for text readability.
pub const BINARY_SCRIPT_EXTENSIONS: &[&str] = &[".exe"];

/// Extensions accepted for explicit icon files.
pub const ALLOWED_ICON_EXTENSIONS: &[&str] = &[".ico", ".exe", ".dll", ".png", ".bmp", ".cur"];

/// Icon requests accepted verbatim by icon validation.
pub const ICON_SENTINELS: &[&str] = &["auto", "default", "none"];

/// Characters rejected in menu labels.
pub const LABEL_FORBIDDEN_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Device names that cannot be used as key names (compared case-insensitively).
pub const RESERVED_KEY_NAMES: &[&str] = &[
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

/// Longest accepted menu label, in characters.
pub const MAX_LABEL_LENGTH: usize = 100;

/// Longest accepted key name.
pub const MAX_KEY_NAME_LENGTH: usize = 255;

/// Longest accepted script path (classic MAX_PATH).
pub const MAX_SCRIPT_PATH_LENGTH: usize = 260;

/// Largest accepted icon file.
pub const MAX_ICON_SIZE: u64 = 10 * 1024 * 1024;

/// Python interpreters probed, in preference order.
pub const PYTHON_CANDIDATES: &[&str] = &["python3", "python", "py"];

/// Oldest Python accepted for registered commands.
pub const MIN_PYTHON_VERSION: (u32, u32) = (3, 8);

/// Oldest Windows release (major, minor) supported.
pub const MIN_WINDOWS_VERSION: (u32, u32) = (10, 0);

/// Version written into backup metadata.
pub const BACKUP_FORMAT_VERSION: &str = "1.0";

/// Name of the configuration file (inside the womm config directory).
pub const SETTINGS_FILENAME: &str = "config.toml";

/// Name of the default backup directory (inside the womm config directory).
pub const BACKUP_DIR_NAME: &str = "backups";
