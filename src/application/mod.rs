//! Application layer - use cases and orchestration.
//!
//! This layer contains the parsing, rendering and file lifecycle logic
//! that turns e-reader exports into notes.

pub mod export_pipeline;
pub mod formatter;
pub mod parser;
pub mod renderer;
pub mod snapshot_manager;

pub use export_pipeline::{render_export, ExportPipeline};
pub use formatter::{format_run_report, ReportFormat, RunReport};
pub use renderer::validate_date_format;
pub use snapshot_manager::SnapshotManager;
