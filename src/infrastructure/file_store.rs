//! Filesystem primitives.
//!
//! Blocking read/write/copy helpers plus the staged relocation used to move
//! book folders into the backup tree.

use std::fs;
use std::path::{Path, PathBuf};

use crate::domain::{AppError, Result};

/// What a directory entry is, without following symbolic links.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Dir,
    Symlink,
    /// Sockets, FIFOs, devices.
    Other,
}

impl From<fs::FileType> for EntryKind {
    fn from(file_type: fs::FileType) -> Self {
        if file_type.is_symlink() {
            Self::Symlink
        } else if file_type.is_dir() {
            Self::Dir
        } else if file_type.is_file() {
            Self::File
        } else {
            Self::Other
        }
    }
}

/// A top-level entry of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryInfo {
    pub name: String,
    pub path: PathBuf,
    pub kind: EntryKind,
}

/// Lists a directory, sorted by name. Symbolic links are reported as links.
///
/// # Errors
/// Returns error if the directory cannot be read.
pub fn list_entries(dir: &Path) -> Result<Vec<EntryInfo>> {
    let entries = fs::read_dir(dir)
        .map_err(|e| AppError::io(format!("Failed to read directory {}", dir.display()), e))?;

    let mut out = Vec::new();
    for entry in entries {
        let entry = entry
            .map_err(|e| AppError::io(format!("Failed to read entry in {}", dir.display()), e))?;
        let path = entry.path();
        let file_type = entry
            .file_type()
            .map_err(|e| AppError::io(format!("Failed to read file type {}", path.display()), e))?;
        out.push(EntryInfo {
            name: entry.file_name().to_string_lossy().into_owned(),
            kind: file_type.into(),
            path,
        });
    }

    out.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(out)
}

/// Lists the names of regular files in a directory, sorted ascending.
///
/// # Errors
/// Returns error if the directory cannot be read.
pub fn list_file_names(dir: &Path) -> Result<Vec<String>> {
    Ok(list_entries(dir)?
        .into_iter()
        .filter(|e| e.kind == EntryKind::File)
        .map(|e| e.name)
        .collect())
}

/// Creates a directory (and parents) if missing. Returns whether it was created.
///
/// # Errors
/// Returns error if the directory cannot be created.
pub fn ensure_dir(path: &Path) -> Result<bool> {
    if path.is_dir() {
        return Ok(false);
    }

    fs::create_dir_all(path)
        .map_err(|e| AppError::io(format!("Failed to create directory {}", path.display()), e))?;
    Ok(true)
}

/// Reads a UTF-8 text file.
///
/// # Errors
/// Returns error if the file cannot be read or is not UTF-8.
pub fn read_text(path: &Path) -> Result<String> {
    fs::read_to_string(path)
        .map_err(|e| AppError::io(format!("Failed to read {}", path.display()), e))
}

/// Writes a text file, replacing any existing one.
///
/// # Errors
/// Returns error if the file cannot be written.
pub fn write_text(path: &Path, content: &str) -> Result<()> {
    fs::write(path, content)
        .map_err(|e| AppError::io(format!("Failed to write {}", path.display()), e))
}

/// Removes a single file.
///
/// # Errors
/// Returns error if the file cannot be removed.
pub fn remove_file(path: &Path) -> Result<()> {
    fs::remove_file(path)
        .map_err(|e| AppError::io(format!("Failed to remove {}", path.display()), e))
}

/// Copies one file, overwriting the destination.
///
/// # Errors
/// Returns error if the copy fails.
pub fn copy_file(from: &Path, to: &Path) -> Result<u64> {
    fs::copy(from, to).map_err(|e| {
        AppError::io(
            format!("Failed to copy {} to {}", from.display(), to.display()),
            e,
        )
    })
}

/// Result of a completed relocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelocationSummary {
    /// Files copied into the destination.
    pub files: usize,
    /// Bytes copied into the destination.
    pub bytes: u64,
    /// Symbolic links recreated in the destination.
    pub links: usize,
}

/// Moves a directory tree to `destination`, merging into any existing tree.
///
/// Every file is copied first and each copy is checked against its source
/// length; the source tree is removed only once all copies are verified.
/// Symbolic links are recreated as links and never followed. On failure
/// before removal the source is left intact (copies already made stay in
/// the destination).
///
/// # Errors
/// Returns error if copying, verification or source removal fails, or if
/// the tree holds an entry that cannot be moved as-is.
pub fn relocate_tree(source: &Path, destination: &Path) -> Result<RelocationSummary> {
    let mut copied = Vec::new();
    let mut links = 0;
    stage_tree(source, destination, &mut copied, &mut links)?;

    let summary = RelocationSummary {
        links,
        ..verify_copies(&copied)?
    };

    fs::remove_dir_all(source)
        .map_err(|e| AppError::io(format!("Failed to remove {}", source.display()), e))?;

    tracing::debug!(
        source = %source.display(),
        destination = %destination.display(),
        files = summary.files,
        bytes = summary.bytes,
        links = summary.links,
        "Relocated tree"
    );

    Ok(summary)
}

/// Copies `source` into `destination` recursively, recording each file pair.
fn stage_tree(
    source: &Path,
    destination: &Path,
    copied: &mut Vec<(PathBuf, PathBuf)>,
    links: &mut usize,
) -> Result<()> {
    ensure_dir(destination)?;

    for entry in list_entries(source)? {
        let target = destination.join(&entry.name);
        match entry.kind {
            EntryKind::Dir => stage_tree(&entry.path, &target, copied, links)?,
            EntryKind::File => {
                copy_file(&entry.path, &target)?;
                copied.push((entry.path, target));
            }
            EntryKind::Symlink => {
                copy_link(&entry.path, &target)?;
                *links += 1;
            }
            EntryKind::Other => {
                return Err(AppError::InvalidData {
                    message: format!("Cannot move special file {}", entry.path.display()),
                });
            }
        }
    }

    Ok(())
}

/// Recreates the link at `from` as `to`, replacing a file or link already there.
fn copy_link(from: &Path, to: &Path) -> Result<()> {
    let link_target = fs::read_link(from)
        .map_err(|e| AppError::io(format!("Failed to read link {}", from.display()), e))?;

    if let Ok(existing) = fs::symlink_metadata(to) {
        if existing.is_dir() {
            return Err(AppError::InvalidData {
                message: format!("Cannot replace directory {} with a link", to.display()),
            });
        }
        remove_file(to)?;
    }

    create_link(&link_target, to)?;

    let written = fs::read_link(to)
        .map_err(|e| AppError::io(format!("Failed to read link {}", to.display()), e))?;
    if written != link_target {
        return Err(AppError::InvalidData {
            message: format!(
                "Link {} points to {}, expected {}",
                to.display(),
                written.display(),
                link_target.display()
            ),
        });
    }

    Ok(())
}

#[cfg(unix)]
fn create_link(link_target: &Path, at: &Path) -> Result<()> {
    std::os::unix::fs::symlink(link_target, at)
        .map_err(|e| AppError::io(format!("Failed to create link {}", at.display()), e))
}

#[cfg(not(unix))]
fn create_link(_link_target: &Path, at: &Path) -> Result<()> {
    Err(AppError::InvalidData {
        message: format!("Cannot recreate symbolic link {}", at.display()),
    })
}

fn verify_copies(copied: &[(PathBuf, PathBuf)]) -> Result<RelocationSummary> {
    let mut summary = RelocationSummary::default();

    for (from, to) in copied {
        let expected = file_len(from)?;
        let actual = file_len(to)?;
        if expected != actual {
            return Err(AppError::InvalidData {
                message: format!(
                    "Copy of {} is {actual} bytes, expected {expected}",
                    from.display()
                ),
            });
        }
        summary.files += 1;
        summary.bytes += actual;
    }

    Ok(summary)
}

fn file_len(path: &Path) -> Result<u64> {
    fs::metadata(path)
        .map(|m| m.len())
        .map_err(|e| AppError::io(format!("Failed to read metadata {}", path.display()), e))
}
