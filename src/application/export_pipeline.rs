//! Export formatting service.
//!
//! Turns every staged raw export in the output folder into a markdown note
//! and removes the consumed export. Each file is handled on its own; a
//! failure is logged and recorded, and the batch moves on.

use std::path::{Path, PathBuf};

use crate::domain::{AppConfig, AppError, ExportReport, ExportVersion, FileOutcome, FileStatus, Result};
use crate::infrastructure::{list_file_names, read_text, remove_file, write_text};

use super::parser::{book_reference_from_path, detect_version, parse_records};
use super::renderer::{render_note, validate_date_format};

/// Extension of rendered notes.
const NOTE_EXTENSION: &str = "md";

/// A note rendered in memory, not yet written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedExport {
    pub markdown: String,
    pub records: usize,
}

/// Parses and renders one export body. `None` for an unrecognized version.
#[must_use]
pub fn render_export(path: &Path, body: &str, date_format: &str) -> Option<RenderedExport> {
    match detect_version(body) {
        ExportVersion::V1 => {
            let records = parse_records(body);
            let reference = book_reference_from_path(path);
            Some(RenderedExport {
                markdown: render_note(&reference, &records, date_format),
                records: records.len(),
            })
        }
        ExportVersion::Unrecognized => None,
    }
}

/// Service converting staged raw exports into notes.
pub struct ExportPipeline {
    output_dir: PathBuf,
    extension: String,
    date_format: String,
}

impl ExportPipeline {
    /// Create a pipeline over the configured output folder.
    ///
    /// # Errors
    /// Returns error if `export.date_format` cannot render a timestamp.
    pub fn new(config: &AppConfig) -> Result<Self> {
        validate_date_format(&config.export.date_format)?;

        Ok(Self {
            output_dir: config.output_dir(),
            extension: config.export.extension.clone(),
            date_format: config.export.date_format.clone(),
        })
    }

    /// Process every raw export currently in the output folder.
    ///
    /// # Errors
    /// Returns error only if the output folder cannot be listed; per-file
    /// failures are reported in the returned [`ExportReport`].
    pub fn run(&self) -> Result<ExportReport> {
        if !self.output_dir.is_dir() {
            return Err(AppError::FolderNotFound {
                path: self.output_dir.clone(),
            });
        }

        let files: Vec<String> = list_file_names(&self.output_dir)?
            .into_iter()
            .filter(|name| self.is_raw_export(name))
            .collect();

        tracing::info!(
            dir = %self.output_dir.display(),
            count = files.len(),
            "Formatting raw exports"
        );

        let mut report = ExportReport::default();
        for file in files {
            let path = self.output_dir.join(&file);
            let status = match self.process_file(&path) {
                Ok(status) => status,
                Err(e) => {
                    tracing::error!(file = %file, error = %e.with_cause(), "Failed to format export");
                    FileStatus::Failed {
                        error: e.with_cause(),
                    }
                }
            };
            report.outcomes.push(FileOutcome { file, status });
        }

        tracing::info!(
            rendered = report.rendered_count(),
            skipped = report.skipped_count(),
            failed = report.failed_count(),
            "Formatting completed"
        );

        Ok(report)
    }

    /// Convert one raw export; the export is deleted only after its note is written.
    ///
    /// # Errors
    /// Returns error if reading, writing or deleting fails.
    pub fn process_file(&self, path: &Path) -> Result<FileStatus> {
        let body = read_text(path)?;

        let Some(rendered) = render_export(path, &body, &self.date_format) else {
            tracing::debug!(file = %path.display(), "Skipping export with unrecognized version");
            return Ok(FileStatus::Skipped {
                reason: format!("{} version", ExportVersion::Unrecognized),
            });
        };

        let note = path.with_extension(NOTE_EXTENSION);
        write_text(&note, &rendered.markdown)?;
        remove_file(path)?;

        tracing::info!(
            note = %note.display(),
            records = rendered.records,
            "Note written"
        );

        Ok(FileStatus::Rendered {
            note,
            records: rendered.records,
        })
    }

    fn is_raw_export(&self, name: &str) -> bool {
        Path::new(name)
            .extension()
            .is_some_and(|ext| ext == self.extension.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    const BODY: &str = "v1\nChapter One\n2023-04-01 10:00:00 | 42\nthis continues a thought\n-------------------\n2023-04-02 11:00:00 | 43\nThis Starts Fresh\n";

    fn setup() -> (tempfile::TempDir, AppConfig) {
        let dir = tempdir().unwrap();
        let mut config = AppConfig::default();
        config.paths.base_dir = Some(dir.path().to_path_buf());
        fs::create_dir_all(config.output_dir()).unwrap();
        (dir, config)
    }

    #[test]
    fn test_run_renders_and_removes_export() {
        let (_dir, config) = setup();
        let raw = config.output_dir().join("My Book - Jane Doe.b2o");
        fs::write(&raw, BODY).unwrap();

        let report = ExportPipeline::new(&config).unwrap().run().unwrap();

        assert_eq!(report.rendered_count(), 1);
        assert_eq!(report.record_count(), 2);
        assert!(!raw.exists());

        let note = fs::read_to_string(config.output_dir().join("My Book - Jane Doe.md")).unwrap();
        assert!(note.starts_with("## My Book\n### Jane Doe\n\n#### Chapter One\n"));
        assert!(note.contains(">...this continues a thought\n"));
    }

    #[test]
    fn test_run_ignores_other_extensions() {
        let (_dir, config) = setup();
        fs::write(config.output_dir().join("Existing - Note.md"), "keep").unwrap();
        fs::write(config.output_dir().join("readme.txt"), "keep").unwrap();

        let report = ExportPipeline::new(&config).unwrap().run().unwrap();

        assert!(report.outcomes.is_empty());
        assert_eq!(
            fs::read_to_string(config.output_dir().join("Existing - Note.md")).unwrap(),
            "keep"
        );
    }

    #[test]
    fn test_empty_export_is_skipped_and_kept() {
        let (_dir, config) = setup();
        let raw = config.output_dir().join("Empty - Nobody.b2o");
        fs::write(&raw, "").unwrap();

        let report = ExportPipeline::new(&config).unwrap().run().unwrap();

        assert_eq!(report.skipped_count(), 1);
        assert!(raw.exists());
        assert!(!config.output_dir().join("Empty - Nobody.md").exists());
    }

    #[test]
    fn test_failure_does_not_stop_batch() {
        let (_dir, config) = setup();
        // Not UTF-8, so reading fails.
        fs::write(config.output_dir().join("A - Broken.b2o"), [0xff, 0xfe, 0x00]).unwrap();
        fs::write(config.output_dir().join("B - Fine.b2o"), BODY).unwrap();

        let report = ExportPipeline::new(&config).unwrap().run().unwrap();

        assert_eq!(report.failed_count(), 1);
        assert_eq!(report.rendered_count(), 1);
        assert!(config.output_dir().join("A - Broken.b2o").exists());
        assert!(config.output_dir().join("B - Fine.md").exists());
    }

    #[test]
    fn test_corrupt_block_is_dropped_without_failing() {
        let (_dir, config) = setup();
        let body = "v1\nChapter\n2023-01-01 09:00 | 1\nKept quote\n-------------------\n2023-01-02 09:00\nLost quote\n-------------------\n2023-01-03 09:00 | 3\nLater quote\n";
        fs::write(config.output_dir().join("Book - Author.b2o"), body).unwrap();

        let report = ExportPipeline::new(&config).unwrap().run().unwrap();

        assert_eq!(report.rendered_count(), 1);
        assert_eq!(report.record_count(), 2);
        let note = fs::read_to_string(config.output_dir().join("Book - Author.md")).unwrap();
        assert!(note.contains("Kept quote"));
        assert!(!note.contains("Lost quote"));
        assert!(!note.contains("#### 2023-01-02 09:00"));
        assert_eq!(note.matches("#### ").count(), 1);
        assert!(note.find("#### Chapter").unwrap() < note.find("Later quote").unwrap());
    }

    #[test]
    fn test_invalid_date_format_is_config_error() {
        let (_dir, mut config) = setup();
        config.export.date_format = "%Q".into();
        fs::write(config.output_dir().join("Book - Author.b2o"), BODY).unwrap();

        let err = ExportPipeline::new(&config).err().unwrap();

        assert!(matches!(err, AppError::Config { .. }));
        assert!(config.output_dir().join("Book - Author.b2o").exists());
    }

    #[test]
    fn test_missing_output_dir_is_error() {
        let dir = tempdir().unwrap();
        let mut config = AppConfig::default();
        config.paths.base_dir = Some(dir.path().to_path_buf());

        let err = ExportPipeline::new(&config).unwrap().run().unwrap_err();
        assert!(matches!(err, AppError::FolderNotFound { .. }));
    }

    #[test]
    fn test_render_export_unrecognized() {
        assert!(render_export(Path::new("x.b2o"), "", "%Y").is_none());
    }
}
