//! Folder snapshot service.
//!
//! Each subfolder of the main folder holds the exports of one book. The
//! newest export (by file name) is staged into the output folder and the
//! whole book folder is then moved to the backup folder.

use std::path::{Path, PathBuf};

use crate::domain::{AppConfig, AppError, FolderOutcome, FolderStatus, Result, SnapshotReport, SnapshotStrategy};
use crate::infrastructure::{
    copy_file, ensure_dir, list_entries, list_file_names, read_text, relocate_tree, write_text,
    EntryInfo, EntryKind,
};

use super::parser::NOTE_SEPARATOR;

/// Prefix of entries that are never treated as book folders.
const HIDDEN_PREFIX: char = '.';

/// Picks the most recent export: the greatest file name.
#[must_use]
pub fn select_latest(file_names: &[String]) -> Option<&str> {
    let mut sorted: Vec<&str> = file_names.iter().map(String::as_str).collect();
    sorted.sort_unstable_by(|a, b| b.cmp(a));
    sorted.first().copied()
}

/// Joins several raw exports into one export body.
///
/// The first non-empty export is kept whole; later ones lose their preamble
/// line and are appended as further blocks after a separator line.
#[must_use]
pub fn merge_exports<S: AsRef<str>>(exports: &[S]) -> String {
    let mut merged = String::new();

    for export in exports {
        let export = export.as_ref();
        if merged.is_empty() {
            merged.push_str(export);
        } else {
            let blocks = export.split_once('\n').map_or("", |(_, rest)| rest);
            if blocks.trim().is_empty() {
                continue;
            }
            merged.push_str(NOTE_SEPARATOR);
            merged.push('\n');
            merged.push_str(blocks);
        }

        if !merged.is_empty() && !merged.ends_with('\n') {
            merged.push('\n');
        }
    }

    merged
}

/// Service staging book folders and moving them to backup.
pub struct SnapshotManager {
    config: AppConfig,
}

impl SnapshotManager {
    /// Create a new snapshot manager.
    #[must_use]
    pub const fn new(config: AppConfig) -> Self {
        Self { config }
    }

    /// Create main, output and backup folders when missing.
    ///
    /// Returns the folders that were created.
    ///
    /// # Errors
    /// Returns error if a folder cannot be created.
    pub fn ensure_directories(&self) -> Result<Vec<PathBuf>> {
        let mut created = Vec::new();

        for dir in [
            self.config.main_dir(),
            self.config.output_dir(),
            self.config.backup_dir(),
        ] {
            if ensure_dir(&dir)? {
                tracing::info!(path = %dir.display(), "Created folder");
                created.push(dir);
            }
        }

        Ok(created)
    }

    /// Top-level entries of the main folder that are candidate book folders.
    ///
    /// # Errors
    /// Returns error if the main folder cannot be listed.
    pub fn source_entries(&self) -> Result<Vec<EntryInfo>> {
        let main_dir = self.config.main_dir();
        if !main_dir.is_dir() {
            return Err(AppError::FolderNotFound { path: main_dir });
        }

        Ok(list_entries(&main_dir)?
            .into_iter()
            .filter(|e| !self.is_reserved(&e.name))
            .collect())
    }

    /// Stage and back up every book folder.
    ///
    /// # Errors
    /// Returns error only if the main folder cannot be listed; per-folder
    /// failures are reported in the returned [`SnapshotReport`].
    pub fn run(&self) -> Result<SnapshotReport> {
        let entries = self.source_entries()?;

        tracing::info!(
            folders = entries.len(),
            strategy = %self.config.snapshot.strategy,
            "Snapshotting book folders"
        );

        let mut report = SnapshotReport::default();
        for entry in entries {
            let status = self.snapshot_folder(&entry);
            report.outcomes.push(FolderOutcome {
                folder: entry.name,
                status,
            });
        }

        tracing::info!(
            relocated = report.relocated_count(),
            failed = report.failed_count(),
            "Snapshot completed"
        );

        Ok(report)
    }

    /// Stage one folder, then relocate it if staging succeeded.
    pub fn snapshot_folder(&self, entry: &EntryInfo) -> FolderStatus {
        match entry.kind {
            EntryKind::Dir => {}
            EntryKind::Symlink => {
                tracing::debug!(entry = %entry.name, "Skipping symbolic link");
                return FolderStatus::Skipped {
                    reason: "symbolic link".into(),
                };
            }
            EntryKind::File | EntryKind::Other => {
                tracing::debug!(entry = %entry.name, "Skipping non-folder entry");
                return FolderStatus::Skipped {
                    reason: "not a folder".into(),
                };
            }
        }

        let files = match list_file_names(&entry.path) {
            Ok(files) if files.is_empty() => {
                tracing::debug!(folder = %entry.name, "Skipping folder without exports");
                return FolderStatus::Skipped {
                    reason: "no export files".into(),
                };
            }
            Ok(files) => files,
            Err(e) => {
                tracing::error!(folder = %entry.name, error = %e.with_cause(), "Failed to list folder");
                return FolderStatus::CopyFailed {
                    error: e.with_cause(),
                };
            }
        };

        let staged = self.staged_path(&entry.name);
        if let Err(e) = self.stage(&entry.path, &files, &staged) {
            tracing::error!(folder = %entry.name, error = %e.with_cause(), "Failed to stage export");
            return FolderStatus::CopyFailed {
                error: e.with_cause(),
            };
        }

        let backup = self.config.backup_dir().join(&entry.name);
        match relocate_tree(&entry.path, &backup) {
            Ok(summary) => {
                tracing::info!(
                    folder = %entry.name,
                    staged = %staged.display(),
                    files = summary.files,
                    "Folder moved to backup"
                );
                FolderStatus::Relocated { staged, backup }
            }
            Err(e) => {
                tracing::error!(folder = %entry.name, error = %e.with_cause(), "Failed to move folder to backup");
                FolderStatus::RelocationFailed {
                    staged,
                    error: e.with_cause(),
                }
            }
        }
    }

    /// Write the folder's snapshot to `target` according to the strategy.
    fn stage(&self, folder: &Path, files: &[String], target: &Path) -> Result<()> {
        match self.config.snapshot.strategy {
            SnapshotStrategy::TakeLatest => {
                let latest = select_latest(files).ok_or_else(|| AppError::InvalidData {
                    message: format!("No export in {}", folder.display()),
                })?;
                tracing::debug!(file = latest, "Staging most recent export");
                copy_file(&folder.join(latest), target)?;
            }
            SnapshotStrategy::ConcatenateAll => {
                // `files` is sorted ascending: oldest export first.
                let exports = files
                    .iter()
                    .map(|name| read_text(&folder.join(name)))
                    .collect::<Result<Vec<_>>>()?;
                write_text(target, &merge_exports(&exports))?;
            }
        }

        Ok(())
    }

    fn staged_path(&self, folder_name: &str) -> PathBuf {
        self.config
            .output_dir()
            .join(format!("{folder_name}.{}", self.config.export.extension))
    }

    fn is_reserved(&self, name: &str) -> bool {
        name.starts_with(HIDDEN_PREFIX)
            || name == self.config.paths.output_folder
            || name == self.config.paths.backup_folder
    }
}
