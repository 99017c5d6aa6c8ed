//! Platform-specific directory utilities
//!
//! Provides consistent directory paths across different operating systems,
//! following platform conventions for config directories.

use std::path::PathBuf;

/// Get the platform-specific config directory for the minimap
///
/// Follows platform conventions:
/// - macOS: `~/Library/Application Support/minimap`
/// - Linux: `~/.config/minimap` (or `$XDG_CONFIG_HOME/minimap`)
/// - Windows: `%APPDATA%\minimap\config`
/// - Fallback: `./minimap`
pub fn config_dir() -> PathBuf {
    directories::ProjectDirs::from("", "", "minimap")
        .map(|dirs| dirs.config_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("./minimap"))
}

/// Default location of the persisted render settings
pub fn settings_file() -> PathBuf {
    config_dir().join("settings.json")
}
