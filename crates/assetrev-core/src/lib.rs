//! Core types for assetrev.
//!
//! This crate provides the data model shared by the scanner, the manifest
//! writer and the command line front end: file records and fingerprints,
//! run configuration, destination path templates, and error types.

mod config;
mod error;
mod record;
mod template;

pub use config::{
    DEFAULT_CHANNEL_CAPACITY, DEFAULT_FILE_FILTER, OutputMode, RunConfig, RunConfigBuilder,
    ScanOptions, load_run_configs,
};
pub use error::{ConfigError, ManifestError, ScanError, ScanWarning, WarningKind};
pub use record::{FileRecord, Fingerprint};
pub use template::{
    DEFAULT_DEST_FORMAT, DestinationTemplate, PLACEHOLDER_FINGERPRINT, PLACEHOLDER_SRC_DIR,
    PLACEHOLDER_SRC_EXT, PLACEHOLDER_SRC_FILENAME, TemplateVars, split_extension,
};
