//! Worker-pool directory scanner.
//!
//! A fixed number of workers pull directories from a shared queue. Each
//! directory is listed and processed on the blocking pool: subdirectories are
//! queued, matching files are fingerprinted and emitted as records, and once
//! every entry has been handled a [`DirectoryDone`] signal is sent.
//!
//! Completion is tracked with a pending-work counter. A directory is counted
//! before it is queued and released after its own entries are processed, so
//! the counter only reaches zero once the whole tree has been handled. The
//! workers then exit and drop their channel senders, which closes every
//! channel handed to the scanner.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use regex::Regex;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use assetrev_core::{
    DestinationTemplate, FileRecord, RunConfig, ScanOptions, ScanWarning, TemplateVars,
    WarningKind,
};

use crate::hasher::hash_file;
use crate::lineage::Lineage;
use crate::links::{LinkTarget, canonical_root, resolve_symlink};
use crate::progress::{ProgressTracker, ScanProgress};

/// Signal sent once all entries of a directory have been processed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryDone {
    /// Path the directory was read from.
    pub path: PathBuf,
    /// Root-relative directory, ending in `/`.
    pub rel_dir: String,
    /// Records emitted for files directly in this directory.
    pub files: u64,
}

/// Channels a scan reports into.
///
/// The scanner owns the senders; every channel closes when the scan ends.
#[derive(Debug)]
pub struct ScanChannels {
    pub records: mpsc::Sender<FileRecord>,
    pub done: mpsc::Sender<DirectoryDone>,
    pub warnings: mpsc::Sender<ScanWarning>,
}

/// Result of a finished scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanOutcome {
    pub progress: ScanProgress,
    /// The record channel closed before the scan finished.
    pub aborted: bool,
}

/// Regular expression matched against file names.
///
/// An invalid pattern is kept rather than rejected: every file then reports
/// an [`WarningKind::InvalidFilter`] warning and is skipped.
#[derive(Debug, Clone)]
pub struct FileFilter {
    compiled: Result<Regex, regex::Error>,
}

impl FileFilter {
    /// Compile a pattern. An empty pattern matches every name.
    pub fn new(pattern: &str) -> Self {
        let pattern = if pattern.is_empty() { ".*" } else { pattern };
        Self {
            compiled: Regex::new(pattern),
        }
    }

    /// Whether the pattern compiled.
    pub fn is_valid(&self) -> bool {
        self.compiled.is_ok()
    }

    /// Test a file name. Matching is unanchored.
    pub fn matches(&self, name: &str) -> Result<bool, &regex::Error> {
        self.compiled.as_ref().map(|re| re.is_match(name))
    }
}

/// Concurrent tree scanner.
#[derive(Debug)]
pub struct TreeScanner {
    filter: FileFilter,
    template: DestinationTemplate,
    workers: usize,
}

impl TreeScanner {
    /// Create a scanner with an explicit filter and template.
    pub fn new(filter: FileFilter, template: DestinationTemplate) -> Self {
        Self {
            filter,
            template,
            workers: ScanOptions::default().effective_workers(),
        }
    }

    /// Create a scanner for a run configuration.
    pub fn from_config(config: &RunConfig, options: &ScanOptions) -> Self {
        Self::new(
            FileFilter::new(config.effective_filter()),
            DestinationTemplate::new(config.effective_dest_format()),
        )
        .with_workers(options.effective_workers())
    }

    /// Set the number of directory workers.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Start scanning `root` in the background.
    pub fn spawn(self, root: impl Into<PathBuf>, channels: ScanChannels) -> JoinHandle<ScanOutcome> {
        let root = root.into();
        tokio::spawn(async move { self.run(root, channels).await })
    }

    /// Scan `root`, reporting into `channels`, and return once the whole
    /// tree has been processed.
    pub async fn run(self, root: impl Into<PathBuf>, channels: ScanChannels) -> ScanOutcome {
        let root = root.into();
        let (queue_tx, queue_rx) = mpsc::unbounded_channel();

        if !self.filter.is_valid() {
            warn!(path = %root.display(), "File filter is not a valid regular expression");
        }

        let shared = Arc::new(Shared {
            filter: self.filter,
            template: self.template,
            channels,
            queue: queue_tx,
            pending: AtomicUsize::new(0),
            finished: CancellationToken::new(),
            aborted: AtomicBool::new(false),
            progress: ProgressTracker::new(),
        });

        let lineage = Lineage::root(canonical_root(&root));
        shared.enqueue(DirTask {
            read_path: root.clone(),
            rel_dir: "/".to_string(),
            lineage,
        });

        let queue_rx = Arc::new(Mutex::new(queue_rx));
        let workers: Vec<JoinHandle<()>> = (0..self.workers)
            .map(|_| tokio::spawn(worker_loop(Arc::clone(&shared), Arc::clone(&queue_rx))))
            .collect();

        for worker in workers {
            if let Err(e) = worker.await {
                warn!(error = %e, "Scan worker failed");
            }
        }

        let outcome = ScanOutcome {
            progress: shared.progress.snapshot(),
            aborted: shared.aborted.load(Ordering::Acquire),
        };
        debug!(
            path = %root.display(),
            directories = outcome.progress.dirs_scanned,
            files = outcome.progress.files_recorded,
            aborted = outcome.aborted,
            "Scan finished"
        );
        outcome
    }
}

/// A directory waiting to be scanned.
#[derive(Debug)]
struct DirTask {
    read_path: PathBuf,
    rel_dir: String,
    lineage: Arc<Lineage>,
}

/// State shared by all workers of one scan.
struct Shared {
    filter: FileFilter,
    template: DestinationTemplate,
    channels: ScanChannels,
    queue: mpsc::UnboundedSender<DirTask>,
    pending: AtomicUsize,
    finished: CancellationToken,
    aborted: AtomicBool,
    progress: ProgressTracker,
}

async fn worker_loop(shared: Arc<Shared>, queue: Arc<Mutex<mpsc::UnboundedReceiver<DirTask>>>) {
    loop {
        let task = {
            let mut rx = queue.lock().await;
            tokio::select! {
                biased;
                _ = shared.finished.cancelled() => None,
                task = rx.recv() => task,
            }
        };
        let Some(task) = task else { break };

        let ctx = Arc::clone(&shared);
        if let Err(e) = tokio::task::spawn_blocking(move || ctx.scan_directory(task)).await {
            warn!(error = %e, "Directory task failed");
        }
        shared.release();
    }
}

impl Shared {
    fn enqueue(&self, task: DirTask) {
        self.pending.fetch_add(1, Ordering::AcqRel);
        if self.queue.send(task).is_err() {
            self.release();
        }
    }

    fn release(&self) {
        if self.pending.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.finished.cancel();
        }
    }

    fn abort(&self) {
        if !self.aborted.swap(true, Ordering::AcqRel) {
            warn!("Record channel closed, stopping scan");
        }
        self.finished.cancel();
    }

    fn is_stopped(&self) -> bool {
        self.aborted.load(Ordering::Acquire)
    }

    fn report(&self, warning: ScanWarning) {
        self.progress.record_warning();
        debug!(path = %warning.path.display(), kind = ?warning.kind, "{}", warning.message);
        let _ = self.channels.warnings.blocking_send(warning);
    }

    /// Process one directory. Runs on the blocking pool.
    fn scan_directory(&self, task: DirTask) {
        if self.is_stopped() {
            return;
        }

        let listing = match fs::read_dir(&task.read_path) {
            Ok(listing) => listing,
            Err(e) => {
                self.report(ScanWarning::from_io(&task.read_path, &e, WarningKind::ReadError));
                return;
            }
        };

        let mut entries = Vec::new();
        for entry in listing {
            match entry {
                Ok(entry) => entries.push(entry),
                Err(e) => {
                    self.report(ScanWarning::from_io(&task.read_path, &e, WarningKind::ReadError))
                }
            }
        }
        entries.sort_by_key(|e| e.file_name());

        let mut files = 0;
        for entry in entries {
            if self.is_stopped() {
                return;
            }

            let path = entry.path();
            let name = entry.file_name().to_string_lossy().into_owned();
            let file_type = match entry.file_type() {
                Ok(t) => t,
                Err(e) => {
                    self.report(ScanWarning::from_io(&path, &e, WarningKind::MetadataError));
                    continue;
                }
            };

            if file_type.is_dir() {
                let canonical = task.lineage.path().join(entry.file_name());
                self.descend(&task, &name, path, canonical);
            } else if file_type.is_symlink() {
                match resolve_symlink(&task.read_path, &path) {
                    Ok(LinkTarget::Directory {
                        resolved,
                        canonical,
                    }) => self.descend(&task, &name, resolved, canonical),
                    Ok(LinkTarget::File { resolved }) => {
                        if self.process_file(&task, &name, &resolved) {
                            files += 1;
                        }
                    }
                    Ok(LinkTarget::Special { .. }) => self.report(ScanWarning::unsupported(&path)),
                    Err(e) => self.report(ScanWarning::broken_symlink(&path, &e)),
                }
            } else if file_type.is_file() {
                if self.process_file(&task, &name, &path) {
                    files += 1;
                }
            } else {
                self.report(ScanWarning::unsupported(&path));
            }
        }

        self.progress.record_dir();
        trace!(path = %task.read_path.display(), files, "Directory done");
        let done = DirectoryDone {
            path: task.read_path,
            rel_dir: task.rel_dir,
            files,
        };
        let _ = self.channels.done.blocking_send(done);
    }

    fn descend(&self, parent: &DirTask, name: &str, read_path: PathBuf, canonical: PathBuf) {
        match parent.lineage.descend(canonical.clone()) {
            Some(lineage) => self.enqueue(DirTask {
                read_path,
                rel_dir: format!("{}{name}/", parent.rel_dir),
                lineage,
            }),
            None => self.report(ScanWarning::symlink_cycle(
                parent.read_path.join(name),
                canonical,
            )),
        }
    }

    /// Filter, fingerprint and emit one file. Returns whether a record was sent.
    ///
    /// The recorded size is the number of bytes fingerprinted.
    fn process_file(&self, dir: &DirTask, name: &str, path: &Path) -> bool {
        match self.filter.matches(name) {
            Ok(true) => {}
            Ok(false) => return false,
            Err(e) => {
                self.report(ScanWarning::invalid_filter(path, e));
                return false;
            }
        }

        let (fingerprint, size) = match hash_file(path) {
            Ok((fingerprint, size)) => (fingerprint.to_hex(), size),
            Err(e) => {
                self.report(ScanWarning::hash_error(path, &e));
                return false;
            }
        };

        let destination = self
            .template
            .render(&TemplateVars::for_file(&dir.rel_dir, name, &fingerprint));
        let record = FileRecord::new(format!("{}{name}", dir.rel_dir), destination, fingerprint, size);

        if self.channels.records.blocking_send(record).is_err() {
            self.abort();
            return false;
        }
        self.progress.record_file(size);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_defaults_to_everything() {
        let filter = FileFilter::new("");
        assert!(filter.is_valid());
        assert_eq!(filter.matches("anything.at.all"), Ok(true));
    }

    #[test]
    fn test_filter_is_unanchored() {
        let filter = FileFilter::new(r"\.css");
        assert_eq!(filter.matches("site.css"), Ok(true));
        assert_eq!(filter.matches("site.css.map"), Ok(true));
        assert_eq!(filter.matches("site.js"), Ok(false));
    }

    #[test]
    fn test_invalid_filter_is_kept() {
        let filter = FileFilter::new("([unclosed");
        assert!(!filter.is_valid());
        assert!(filter.matches("a.txt").is_err());
    }
}
