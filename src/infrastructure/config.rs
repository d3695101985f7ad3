//! Configuration file management.
//!
//! Handles loading and saving TOML configuration files.

use std::fs;
use std::path::{Path, PathBuf};

use crate::domain::{AppConfig, AppError, Result};

/// Default configuration file content.
const DEFAULT_CONFIG: &str = r#"# Boox Notes Configuration
# Auto-generated - edit as needed

[paths]
# Base directory the folders below are resolved against
# (optional, defaults to the current directory)
# base_dir = "/path/to/vault"

# Folder with one subfolder per book
main_folder = "_boox"

# Subfolder of main_folder receiving staged exports and rendered notes
output_folder = "notes"

# Subfolder of main_folder receiving processed book folders
backup_folder = ".storage"

[export]
# Extension of staged raw exports
extension = "b2o"

# strftime pattern for highlight dates
date_format = "%-m/%-d/%Y, %-I:%M:%S %p"

[snapshot]
# "take-latest" stages the last file by name, "concatenate-all" stages all files
strategy = "take-latest"

[naming]
# [WIP] Comma separated list of words to ignore in note names
word_blacklist = ""

# [WIP] Try to remove junk from note names
beautify_note_names = true
"#;

/// Load configuration from `path`, or from the default location.
///
/// A missing file yields the built-in defaults.
///
/// # Errors
/// Returns error if file exists but cannot be read or parsed.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    let config_path = resolve_config_path(path);

    if config_path.exists() {
        load_config_from_file(&config_path)
    } else {
        tracing::debug!(path = %config_path.display(), "No config file, using defaults");
        Ok(AppConfig::default())
    }
}

/// Load configuration from a specific file.
///
/// # Errors
/// Returns error if file cannot be read or parsed.
pub fn load_config_from_file(path: &Path) -> Result<AppConfig> {
    let content = fs::read_to_string(path)
        .map_err(|e| AppError::io(format!("Failed to read config file: {}", path.display()), e))?;

    toml::from_str(&content).map_err(|e| AppError::Config {
        message: format!("Failed to parse config file: {e}"),
    })
}

/// Serialize configuration as TOML.
///
/// # Errors
/// Returns error if serialization fails.
pub fn config_to_toml(config: &AppConfig) -> Result<String> {
    toml::to_string_pretty(config).map_err(|e| AppError::Config {
        message: format!("Failed to serialize config: {e}"),
    })
}

/// Create the default configuration file if it doesn't exist.
///
/// Returns the path and whether the file was created.
///
/// # Errors
/// Returns error if file cannot be created.
pub fn ensure_config_exists(path: Option<&Path>) -> Result<(PathBuf, bool)> {
    let config_path = resolve_config_path(path);

    if config_path.exists() {
        return Ok((config_path, false));
    }

    if let Some(parent) = config_path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| AppError::io("Failed to create config directory", e))?;
    }

    fs::write(&config_path, DEFAULT_CONFIG)
        .map_err(|e| AppError::io("Failed to create default config", e))?;

    tracing::info!(path = %config_path.display(), "Created default configuration");

    Ok((config_path, true))
}

/// The explicit path if given, otherwise the default location.
#[must_use]
pub fn resolve_config_path(path: Option<&Path>) -> PathBuf {
    path.map_or_else(AppConfig::default_config_path, Path::to_path_buf)
}
