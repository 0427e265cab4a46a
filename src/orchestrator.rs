//! Runs one configuration end to end.
//!
//! The directory pre-count runs first. Then the manifest writer and the tree
//! scanner start together, connected by the record channel, while this task
//! drains the completion and warning channels. Both close when the scanner
//! has processed the whole tree, after which the writer is awaited.

use std::path::PathBuf;

use humansize::{BINARY, format_size};
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{Instrument, debug, info, info_span, trace, warn};

use assetrev_core::{ManifestError, RunConfig, ScanOptions, ScanWarning, WarningKind};
use assetrev_manifest::ManifestWriter;
use assetrev_scan::{DirectoryCounter, ScanChannels, ScanProgress, TreeScanner};

/// Errors that end a single run.
#[derive(Debug, Error)]
pub enum RunError {
    /// The manifest could not be written.
    #[error(transparent)]
    Manifest(#[from] ManifestError),

    /// A background task panicked or was cancelled.
    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Outcome of one run.
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Scanned root.
    pub root: PathBuf,
    /// Written manifest.
    pub manifest: PathBuf,
    /// Directory total from the pre-count; `None` if the count failed.
    pub directories_expected: Option<u64>,
    /// Completion signals received.
    pub directories_scanned: u64,
    /// Records from this scan.
    pub records_written: u64,
    /// Records carried over from the previous manifest.
    pub prior_records: u64,
    /// Every entry that was skipped, in arrival order.
    pub warnings: Vec<ScanWarning>,
    /// Final scan counters.
    pub progress: ScanProgress,
}

impl RunReport {
    /// Whether any entry was skipped.
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Number of warnings of one kind.
    pub fn warnings_of(&self, kind: WarningKind) -> usize {
        self.warnings.iter().filter(|w| w.kind == kind).count()
    }

    /// Whether the pre-count and the completion signals agree.
    pub fn counts_agree(&self) -> bool {
        self.directories_expected == Some(self.directories_scanned)
    }
}

/// Run a single configuration.
pub async fn run_config(config: &RunConfig, options: &ScanOptions) -> Result<RunReport, RunError> {
    let root = config.root_dir.clone();

    let counter = DirectoryCounter::new(&root);
    let directories_expected = match tokio::task::spawn_blocking(move || counter.count()).await? {
        Ok(total) => {
            info!(path = %root.display(), directories = total, "Counted directories to process");
            Some(total)
        }
        Err(e) => {
            warn!(error = %e, "Directory pre-count failed");
            None
        }
    };

    let capacity = options.effective_capacity();
    let (record_tx, record_rx) = mpsc::channel(capacity);
    let (done_tx, mut done_rx) = mpsc::channel(capacity);
    let (warning_tx, mut warning_rx) = mpsc::channel(capacity);

    let writer = ManifestWriter::new(&config.output_filepath, config.output_mode).spawn(record_rx);
    let scanner = TreeScanner::from_config(config, options).spawn(
        &root,
        ScanChannels {
            records: record_tx,
            done: done_tx,
            warnings: warning_tx,
        },
    );

    let mut directories_scanned = 0u64;
    let mut warnings = Vec::new();
    loop {
        tokio::select! {
            Some(done) = done_rx.recv() => {
                directories_scanned += 1;
                trace!(
                    dir = %done.rel_dir,
                    files = done.files,
                    scanned = directories_scanned,
                    expected = ?directories_expected,
                    "Directory done"
                );
            }
            Some(warning) = warning_rx.recv() => {
                warn!(kind = ?warning.kind, "{}", warning);
                warnings.push(warning);
            }
            else => break,
        }
    }

    let outcome = scanner.await?;
    let summary = writer.await??;

    if let Some(expected) = directories_expected {
        if expected != directories_scanned {
            debug!(expected, scanned = directories_scanned, "Directory count mismatch");
        }
    }

    let report = RunReport {
        root,
        manifest: summary.path,
        directories_expected,
        directories_scanned,
        records_written: summary.records_written,
        prior_records: summary.prior_records,
        warnings,
        progress: outcome.progress,
    };
    info!(
        path = %report.root.display(),
        directories = report.directories_scanned,
        records = report.records_written,
        prior = report.prior_records,
        warnings = report.warnings.len(),
        hashed = %format_size(report.progress.bytes_hashed, BINARY),
        elapsed = ?report.progress.elapsed,
        "Run finished"
    );
    Ok(report)
}

/// Run configurations one after another.
///
/// A failed run does not stop the ones after it.
pub async fn run_all(
    configs: &[RunConfig],
    options: &ScanOptions,
) -> Vec<Result<RunReport, RunError>> {
    let mut results = Vec::with_capacity(configs.len());
    for (index, config) in configs.iter().enumerate() {
        let span = info_span!("run", index, root = %config.root_dir.display());
        results.push(run_config(config, options).instrument(span).await);
    }
    results
}
