//! Boox Notes - turn e-reader annotation exports into markdown notes.
//!
//! Each book has a folder of raw highlight exports under the main folder.
//! A run stages the newest export of every book into the output folder,
//! moves the book folder to the backup folder, and renders each staged
//! export as a markdown note grouped by chapter.
//!
//!   boox-notes run                  # Full cycle
//!   boox-notes snapshot             # Only stage exports and back up folders
//!   boox-notes format               # Only render staged exports
//!   boox-notes preview <file>       # Print the note for one export
//!   boox-notes init                 # Create folders and a default config

mod application;
mod cli;
mod domain;
mod infrastructure;

use std::path::Path;

use clap::Parser;
use colored::Colorize;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use application::{
    format_run_report, render_export, validate_date_format, ExportPipeline, ReportFormat,
    RunReport, SnapshotManager,
};
use cli::{Cli, Commands};
use domain::AppConfig;
use infrastructure::{config_to_toml, ensure_config_exists, load_config, read_text, resolve_config_path};

fn main() {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("{} {}", "Error:".red().bold(), e.with_cause());
        std::process::exit(1);
    }
}

/// Main application logic.
fn run(cli: Cli) -> domain::Result<()> {
    let format = cli
        .report_format()
        .map_err(|e| domain::AppError::Config { message: e })?;

    let config_path = cli.config;
    let mut config = load_config(config_path.as_deref())?;
    if let Some(base_dir) = cli.base_dir {
        config.paths.base_dir = Some(base_dir);
    }

    match cli.command {
        Commands::Run => cmd_run(config, format)?,
        Commands::Snapshot => cmd_snapshot(config, format)?,
        Commands::Format => cmd_format(&config, format)?,
        Commands::Preview { file } => cmd_preview(&config, &file)?,
        Commands::Init => cmd_init(config, config_path.as_deref())?,
        Commands::Config => cmd_config(&config, config_path.as_deref())?,
    }

    Ok(())
}

/// Full cycle: folders, snapshot, notes.
fn cmd_run(config: AppConfig, format: ReportFormat) -> domain::Result<()> {
    let pipeline = ExportPipeline::new(&config)?;
    let manager = SnapshotManager::new(config);

    manager.ensure_directories()?;
    let snapshot = manager.run()?;
    let export = pipeline.run()?;

    print_report(
        &RunReport {
            snapshot: Some(snapshot),
            export: Some(export),
        },
        format,
    )
}

/// Snapshot book folders only.
fn cmd_snapshot(config: AppConfig, format: ReportFormat) -> domain::Result<()> {
    let manager = SnapshotManager::new(config);
    manager.ensure_directories()?;

    print_report(
        &RunReport {
            snapshot: Some(manager.run()?),
            export: None,
        },
        format,
    )
}

/// Render staged exports only.
fn cmd_format(config: &AppConfig, format: ReportFormat) -> domain::Result<()> {
    print_report(
        &RunReport {
            snapshot: None,
            export: Some(ExportPipeline::new(config)?.run()?),
        },
        format,
    )
}

/// Print the note for one export.
fn cmd_preview(config: &AppConfig, file: &Path) -> domain::Result<()> {
    validate_date_format(&config.export.date_format)?;
    let body = read_text(file)?;
    let rendered = render_export(file, &body, &config.export.date_format).ok_or_else(|| {
        domain::AppError::InvalidData {
            message: format!("Unrecognized export version: {}", file.display()),
        }
    })?;

    tracing::info!(records = rendered.records, "Rendered preview");
    print!("{}", rendered.markdown);
    Ok(())
}

/// Create folders and a default configuration file.
fn cmd_init(config: AppConfig, config_path: Option<&Path>) -> domain::Result<()> {
    let (config_path, created) = ensure_config_exists(config_path)?;
    if created {
        println!("{} Created {}", "✓".green().bold(), config_path.display());
    } else {
        println!("  Config already at {}", config_path.display());
    }

    for dir in SnapshotManager::new(config).ensure_directories()? {
        println!("{} Created {}", "✓".green().bold(), dir.display());
    }

    Ok(())
}

/// Show the effective configuration.
fn cmd_config(config: &AppConfig, config_path: Option<&Path>) -> domain::Result<()> {
    let config_path = resolve_config_path(config_path);
    let status = if config_path.exists() {
        "loaded".green()
    } else {
        "not found, defaults".yellow()
    };

    println!("{} {} ({})", "⚙ Config".bold(), config_path.display(), status);
    println!("  Main folder:   {}", config.main_dir().display());
    println!("  Output folder: {}", config.output_dir().display());
    println!("  Backup folder: {}", config.backup_dir().display());

    let blacklist = config.naming.blacklisted_words();
    if !blacklist.is_empty() {
        println!("  Word blacklist (not applied yet): {}", blacklist.join(", "));
    }
    println!();
    print!("{}", config_to_toml(config)?);

    Ok(())
}

fn print_report(report: &RunReport, format: ReportFormat) -> domain::Result<()> {
    println!("{}", format_run_report(report, format)?);
    Ok(())
}

/// Setup tracing/logging based on verbosity level.
fn setup_logging(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).without_time().with_writer(std::io::stderr))
        .with(filter)
        .init();
}
