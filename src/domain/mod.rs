//! Domain layer - core types.
//!
//! This layer contains pure domain models, configuration and error types
//! without any IO.

pub mod error;
pub mod models;
pub mod settings;

pub use error::{AppError, Result};
pub use models::{
    BookReference, ExportReport, ExportVersion, FileOutcome, FileStatus, FolderOutcome,
    FolderStatus, NoteRecord, SnapshotReport,
};
pub use settings::{AppConfig, SnapshotStrategy};
