//! Manifest output for assetrev.
//!
//! [`ManifestWriter`] is a single consumer task: it drains the record
//! channel of a scan and appends each record to the manifest file as soon as
//! it arrives, so the document grows while the walk is still running.
//!
//! # Append mode
//!
//! With [`OutputMode::Append`] the previous manifest is read before the file
//! is truncated. Its records are written after the fresh ones, without any
//! deduplication:
//!
//! ```rust,no_run
//! use assetrev_manifest::{ManifestWriter, OutputMode};
//! use tokio::sync::mpsc;
//!
//! # async fn demo() {
//! let (tx, rx) = mpsc::channel(5);
//! let writer = ManifestWriter::new("/srv/www/manifest.json", OutputMode::Append).spawn(rx);
//! // ... a scan sends records into `tx` ...
//! drop(tx);
//! let summary = writer.await.unwrap().unwrap();
//! println!("{} new, {} carried over", summary.records_written, summary.prior_records);
//! # }
//! ```

mod format;
mod writer;

pub use format::{encode_entry, load_manifest, parse_manifest};
pub use writer::{ManifestSummary, ManifestWriter};

// Re-export core types
pub use assetrev_core::{FileRecord, ManifestError, OutputMode};
