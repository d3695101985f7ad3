//! Infrastructure layer - external adapters (configuration file, filesystem).
//!
//! This layer handles all I/O operations.

pub mod config;
pub mod file_store;

pub use config::{config_to_toml, ensure_config_exists, load_config, resolve_config_path};
pub use file_store::{
    copy_file, ensure_dir, list_entries, list_file_names, read_text, relocate_tree, remove_file,
    write_text, EntryInfo, EntryKind,
};
