//! Output formatting for run reports.
//!
//! Supports multiple output formats: colored text summary, JSON, and table view.

use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Table};
use serde::Serialize;

use crate::domain::{AppError, ExportReport, FileStatus, FolderStatus, Result, SnapshotReport};

/// Output format options.
#[derive(Debug, Clone, Copy, Default)]
pub enum ReportFormat {
    /// Human-readable summary lines.
    #[default]
    Text,
    /// JSON format for programmatic use.
    Json,
    /// One row per file or folder.
    Table,
}

impl std::str::FromStr for ReportFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            "table" => Ok(Self::Table),
            _ => Err(format!("Unknown format: {s}. Use: text, json, table")),
        }
    }
}

/// Everything one invocation did.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<SnapshotReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub export: Option<ExportReport>,
}

/// Formats a run report in the requested format.
///
/// # Errors
/// Returns error if JSON serialization fails.
pub fn format_run_report(report: &RunReport, format: ReportFormat) -> Result<String> {
    match format {
        ReportFormat::Json => serde_json::to_string_pretty(report).map_err(AppError::json),
        ReportFormat::Table => Ok(format_run_table(report)),
        ReportFormat::Text => Ok(format_run_text(report)),
    }
}

fn format_run_text(report: &RunReport) -> String {
    let mut lines = Vec::new();

    if let Some(snapshot) = &report.snapshot {
        lines.push(format!("{}", "📚 Snapshot".bold()));
        for outcome in &snapshot.outcomes {
            lines.push(format!(
                "  {} {}",
                folder_marker(&outcome.status),
                outcome.folder
            ));
        }
        lines.push(format!(
            "  Folders: {} moved, {} failed",
            snapshot.relocated_count().to_string().green(),
            snapshot.failed_count().to_string().red()
        ));
    }

    if let Some(export) = &report.export {
        if !lines.is_empty() {
            lines.push(String::new());
        }
        lines.push(format!("{}", "📝 Notes".bold()));
        for outcome in &export.outcomes {
            lines.push(format!(
                "  {} {}",
                file_marker(&outcome.status),
                outcome.file
            ));
        }
        lines.push(format!(
            "  Notes: {} written ({} highlights), {} skipped, {} failed",
            export.rendered_count().to_string().green(),
            export.record_count().to_string().cyan(),
            export.skipped_count().to_string().yellow(),
            export.failed_count().to_string().red()
        ));
    }

    lines.join("\n")
}

fn format_run_table(report: &RunReport) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Stage", "Item", "Result", "Detail"]);

    if let Some(snapshot) = &report.snapshot {
        for outcome in &snapshot.outcomes {
            let (result, detail) = describe_folder(&outcome.status);
            table.add_row(vec!["snapshot", outcome.folder.as_str(), result, &detail]);
        }
    }

    if let Some(export) = &report.export {
        for outcome in &export.outcomes {
            let (result, detail) = describe_file(&outcome.status);
            table.add_row(vec!["format", outcome.file.as_str(), result, &detail]);
        }
    }

    table.to_string()
}

fn folder_marker(status: &FolderStatus) -> colored::ColoredString {
    match status {
        FolderStatus::Relocated { .. } => "✓".green(),
        FolderStatus::Skipped { .. } => "-".dimmed(),
        FolderStatus::CopyFailed { .. } | FolderStatus::RelocationFailed { .. } => "✗".red(),
    }
}

fn file_marker(status: &FileStatus) -> colored::ColoredString {
    match status {
        FileStatus::Rendered { .. } => "✓".green(),
        FileStatus::Skipped { .. } => "-".dimmed(),
        FileStatus::Failed { .. } => "✗".red(),
    }
}

fn describe_folder(status: &FolderStatus) -> (&'static str, String) {
    match status {
        FolderStatus::Relocated { backup, .. } => ("moved", backup.display().to_string()),
        FolderStatus::CopyFailed { error } => ("copy failed", truncate(error, 60)),
        FolderStatus::RelocationFailed { error, .. } => ("move failed", truncate(error, 60)),
        FolderStatus::Skipped { reason } => ("skipped", reason.clone()),
    }
}

fn describe_file(status: &FileStatus) -> (&'static str, String) {
    match status {
        FileStatus::Rendered { records, .. } => ("written", format!("{records} highlights")),
        FileStatus::Skipped { reason } => ("skipped", reason.clone()),
        FileStatus::Failed { error } => ("failed", truncate(error, 60)),
    }
}

/// Truncates a string to max chars with ellipsis.
fn truncate(s: &str, max_len: usize) -> String {
    let s = s.lines().next().unwrap_or(s);
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{cut}...")
    }
}
