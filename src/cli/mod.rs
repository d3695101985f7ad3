//! CLI interface using clap.
//!
//! Provides command-line arguments and subcommands for the tool.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::application::ReportFormat;

/// Boox Notes - turn e-reader highlight exports into markdown notes.
///
/// Typical cycle: boox-notes run  (stage newest exports, back up folders, write notes)
#[derive(Parser, Debug)]
#[command(name = "boox-notes")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose logging (use multiple times for more verbosity).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Configuration file (default: ~/.boox-notes/config.toml).
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Override the base directory the folders are resolved against.
    #[arg(short, long, global = true)]
    pub base_dir: Option<PathBuf>,

    /// Report format: text, table, or json.
    #[arg(short, long, default_value = "text", global = true)]
    pub format: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Prepare folders, stage the newest export of each book and write notes.
    Run,

    /// Stage the newest export of each book folder and move folders to backup.
    Snapshot,

    /// Turn staged raw exports into markdown notes.
    Format,

    /// Render one raw export to stdout without touching any files.
    Preview {
        /// Raw export file ("<Title> - <Authors>.<ext>").
        file: PathBuf,
    },

    /// Create the folder layout and a default configuration file.
    Init,

    /// Show the effective configuration.
    Config,
}

impl Cli {
    /// Parse the report format argument.
    pub fn report_format(&self) -> Result<ReportFormat, String> {
        self.format.parse()
    }
}
