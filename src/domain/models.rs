//! Domain models for annotation exports and run results.
//!
//! These models represent the records decoded from a raw export and the
//! per-unit outcomes reported after a run.

use std::path::PathBuf;
use std::rc::Rc;

use serde::Serialize;

/// Format revision of a raw export, read from its body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportVersion {
    /// The only line-oriented layout currently understood.
    V1,
    /// Anything else. Skipped, not failed.
    Unrecognized,
}

impl std::fmt::Display for ExportVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::V1 => write!(f, "v1"),
            Self::Unrecognized => write!(f, "unrecognized"),
        }
    }
}

/// A single highlight decoded from one block of a raw export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteRecord {
    /// Chapter heading inherited from the nearest preceding heading line.
    ///
    /// Shared between every record of the same chapter; never empty.
    pub section: Option<Rc<str>>,
    /// Highlight timestamp exactly as exported (trimmed).
    pub highlight_date: String,
    /// Page or location label (trimmed).
    pub highlight_page: String,
    /// Highlighted text, lines joined with `\n`.
    pub quote: String,
}

impl NoteRecord {
    /// Section name, if any.
    #[must_use]
    pub fn section_name(&self) -> Option<&str> {
        self.section.as_deref()
    }
}

/// Title and authors of the book a raw export belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BookReference {
    pub title: String,
    pub authors: String,
}

/// What happened to one raw export during formatting.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FileStatus {
    /// A markdown note was written and the raw export removed.
    Rendered { note: PathBuf, records: usize },
    /// Left alone (for example an unrecognized version).
    Skipped { reason: String },
    /// Reading, rendering, writing or deleting failed.
    Failed { error: String },
}

/// Outcome for one raw export file.
#[derive(Debug, Clone, Serialize)]
pub struct FileOutcome {
    /// File name inside the output folder.
    pub file: String,
    #[serde(flatten)]
    pub status: FileStatus,
}

/// Summary of one Export Pipeline pass.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ExportReport {
    pub outcomes: Vec<FileOutcome>,
}

impl ExportReport {
    /// Number of notes written.
    #[must_use]
    pub fn rendered_count(&self) -> usize {
        self.count(|s| matches!(s, FileStatus::Rendered { .. }))
    }

    /// Number of files left untouched.
    #[must_use]
    pub fn skipped_count(&self) -> usize {
        self.count(|s| matches!(s, FileStatus::Skipped { .. }))
    }

    /// Number of files that failed.
    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.count(|s| matches!(s, FileStatus::Failed { .. }))
    }

    /// Total records written across all notes.
    #[must_use]
    pub fn record_count(&self) -> usize {
        self.outcomes
            .iter()
            .map(|o| match o.status {
                FileStatus::Rendered { records, .. } => records,
                _ => 0,
            })
            .sum()
    }

    fn count(&self, pred: impl Fn(&FileStatus) -> bool) -> usize {
        self.outcomes.iter().filter(|o| pred(&o.status)).count()
    }
}

/// What happened to one source folder during snapshotting.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FolderStatus {
    /// Snapshot staged and the folder moved to backup.
    Relocated { staged: PathBuf, backup: PathBuf },
    /// The snapshot could not be staged; source left untouched.
    CopyFailed { error: String },
    /// The snapshot was staged but moving the folder to backup failed.
    RelocationFailed { staged: PathBuf, error: String },
    /// Not a source unit (plain file, empty folder).
    Skipped { reason: String },
}

/// Outcome for one source folder.
#[derive(Debug, Clone, Serialize)]
pub struct FolderOutcome {
    pub folder: String,
    #[serde(flatten)]
    pub status: FolderStatus,
}

/// Summary of one Folder Snapshot Manager pass.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SnapshotReport {
    pub outcomes: Vec<FolderOutcome>,
}

impl SnapshotReport {
    /// Number of folders staged and backed up.
    #[must_use]
    pub fn relocated_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, FolderStatus::Relocated { .. }))
            .count()
    }

    /// Number of folders with a copy or relocation failure.
    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| {
                matches!(
                    o.status,
                    FolderStatus::CopyFailed { .. } | FolderStatus::RelocationFailed { .. }
                )
            })
            .count()
    }
}
