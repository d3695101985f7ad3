//! Configuration models.
//!
//! Mirrors the TOML configuration file: folder layout, export format,
//! snapshot strategy and the reserved note-naming options.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Folder layout relative to a base path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathConfig {
    /// Base directory everything else is resolved against.
    #[serde(default)]
    pub base_dir: Option<PathBuf>,

    /// Folder holding one subfolder per book.
    #[serde(default = "default_main_folder")]
    pub main_folder: String,

    /// Subfolder of the main folder receiving staged exports and notes.
    #[serde(default = "default_output_folder")]
    pub output_folder: String,

    /// Subfolder of the main folder receiving relocated book folders.
    #[serde(default = "default_backup_folder")]
    pub backup_folder: String,
}

impl Default for PathConfig {
    fn default() -> Self {
        Self {
            base_dir: None,
            main_folder: default_main_folder(),
            output_folder: default_output_folder(),
            backup_folder: default_backup_folder(),
        }
    }
}

fn default_main_folder() -> String {
    "_boox".to_string()
}

fn default_output_folder() -> String {
    "notes".to_string()
}

fn default_backup_folder() -> String {
    ".storage".to_string()
}

/// Raw export handling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Extension (without dot) of staged raw exports.
    #[serde(default = "default_extension")]
    pub extension: String,

    /// `chrono` strftime pattern used for highlight dates in notes.
    #[serde(default = "default_date_format")]
    pub date_format: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            extension: default_extension(),
            date_format: default_date_format(),
        }
    }
}

fn default_extension() -> String {
    "b2o".to_string()
}

/// en-US style, e.g. "4/1/2023, 10:00:00 AM"
fn default_date_format() -> String {
    "%-m/%-d/%Y, %-I:%M:%S %p".to_string()
}

/// How a folder with several exports is reduced to one staged file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SnapshotStrategy {
    /// Stage only the file whose name sorts last.
    #[default]
    TakeLatest,
    /// Stage every file, oldest name first, one after another.
    ConcatenateAll,
}

impl std::fmt::Display for SnapshotStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TakeLatest => write!(f, "take-latest"),
            Self::ConcatenateAll => write!(f, "concatenate-all"),
        }
    }
}

/// Snapshot behaviour.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SnapshotConfig {
    #[serde(default)]
    pub strategy: SnapshotStrategy,
}

/// Note naming options. Read and written, not acted on yet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamingConfig {
    /// Comma separated words to drop from note names.
    #[serde(default)]
    pub word_blacklist: String,

    /// Whether to clean up junk in note names.
    #[serde(default = "default_beautify")]
    pub beautify_note_names: bool,
}

impl Default for NamingConfig {
    fn default() -> Self {
        Self {
            word_blacklist: String::new(),
            beautify_note_names: default_beautify(),
        }
    }
}

const fn default_beautify() -> bool {
    true
}

impl NamingConfig {
    /// Blacklisted words, trimmed, empty entries removed.
    #[must_use]
    pub fn blacklisted_words(&self) -> Vec<&str> {
        self.word_blacklist
            .split(',')
            .map(str::trim)
            .filter(|w| !w.is_empty())
            .collect()
    }
}

/// Complete application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub paths: PathConfig,

    #[serde(default)]
    pub export: ExportConfig,

    #[serde(default)]
    pub snapshot: SnapshotConfig,

    #[serde(default)]
    pub naming: NamingConfig,
}

impl AppConfig {
    /// Get the base directory, falling back to the working directory.
    #[must_use]
    pub fn base_dir(&self) -> PathBuf {
        self.paths
            .base_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".boox-notes")
    }

    /// Default location of the configuration file.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        Self::default_data_dir().join("config.toml")
    }

    /// Folder holding the per-book source folders.
    #[must_use]
    pub fn main_dir(&self) -> PathBuf {
        self.base_dir().join(&self.paths.main_folder)
    }

    /// Staging folder for raw exports and rendered notes.
    #[must_use]
    pub fn output_dir(&self) -> PathBuf {
        self.main_dir().join(&self.paths.output_folder)
    }

    /// Folder receiving relocated book folders.
    #[must_use]
    pub fn backup_dir(&self) -> PathBuf {
        self.main_dir().join(&self.paths.backup_folder)
    }
}
