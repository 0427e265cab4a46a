//! Concurrent directory scanning for assetrev.
//!
//! This crate walks a directory tree, fingerprints every file whose name
//! matches a filter, and streams the resulting [`FileRecord`]s while the walk
//! is still running.
//!
//! # Overview
//!
//! - [`TreeScanner`] runs a bounded pool of workers over a directory queue.
//!   It reports records, per-directory completion signals and non-fatal
//!   warnings on three bounded channels, and closes all of them when the tree
//!   is exhausted.
//! - [`DirectoryCounter`] pre-counts the directories a scan will visit, using
//!   the same symlink and cycle rules as the scanner.
//! - [`hash_file`] computes the CRC-32 fingerprint of a file.
//!
//! # Example
//!
//! ```rust,no_run
//! use assetrev_scan::{DestinationTemplate, FileFilter, ScanChannels, TreeScanner};
//! use tokio::sync::mpsc;
//!
//! # async fn demo() {
//! let (records, mut record_rx) = mpsc::channel(5);
//! let (done, mut done_rx) = mpsc::channel(5);
//! let (warnings, mut warning_rx) = mpsc::channel(5);
//!
//! let scanner = TreeScanner::new(FileFilter::new(r"\.css$"), DestinationTemplate::default());
//! let handle = scanner.spawn("/srv/static", ScanChannels { records, done, warnings });
//!
//! tokio::spawn(async move { while done_rx.recv().await.is_some() {} });
//! tokio::spawn(async move { while warning_rx.recv().await.is_some() {} });
//! while let Some(record) = record_rx.recv().await {
//!     println!("{} -> {}", record.source, record.destination);
//! }
//! let outcome = handle.await.unwrap();
//! println!("{} files", outcome.progress.files_recorded);
//! # }
//! ```

mod counter;
mod hasher;
mod lineage;
mod links;
mod progress;
mod scanner;

pub use counter::DirectoryCounter;
pub use hasher::{CRC32_POLYNOMIAL, hash_bytes, hash_file, hash_reader};
pub use lineage::Lineage;
pub use progress::ScanProgress;
pub use scanner::{DirectoryDone, FileFilter, ScanChannels, ScanOutcome, TreeScanner};

// Re-export core types for convenience
pub use assetrev_core::{
    DestinationTemplate, FileRecord, Fingerprint, RunConfig, ScanError, ScanOptions, ScanWarning,
    WarningKind,
};
