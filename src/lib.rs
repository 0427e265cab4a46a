//! assetrev - content-addressed asset manifests.
//!
//! For every file under a root directory whose name matches a filter,
//! assetrev computes a CRC-32 fingerprint and renders a revisioned
//! destination path from a template such as
//! `%srcdir%%srcfilename%.%crc32%%srcext%`. The resulting
//! source/destination/fingerprint/size records are streamed into a JSON
//! manifest for deployment tooling to consume.
//!
//! The work is split across the workspace crates:
//!
//! - `assetrev-core`: records, run configuration, templates, errors
//! - `assetrev-scan`: directory pre-count, concurrent tree scanner, hashing
//! - `assetrev-manifest`: streaming manifest writer
//!
//! This crate ties them together for one configuration at a time.

mod orchestrator;

pub use orchestrator::{RunError, RunReport, run_all, run_config};

pub use assetrev_core::{
    ConfigError, FileRecord, OutputMode, RunConfig, ScanOptions, ScanWarning, WarningKind,
    load_run_configs,
};
pub use assetrev_manifest::load_manifest;
pub use assetrev_scan::ScanProgress;
