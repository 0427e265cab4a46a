//! Streaming manifest writer.

use std::path::{Path, PathBuf};

use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use assetrev_core::{FileRecord, ManifestError, OutputMode};

use crate::format::{CLOSE, OPEN, SEPARATOR, encode_entry, parse_manifest};

/// What a finished writer produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestSummary {
    /// Manifest path.
    pub path: PathBuf,
    /// Records received from the scan.
    pub records_written: u64,
    /// Records carried over from the previous manifest.
    pub prior_records: u64,
}

/// Consumes a record stream and writes it to a manifest file as it arrives.
///
/// In append mode the previous manifest at the same path is loaded first and
/// its records are written after the fresh ones. The file itself is always
/// created or truncated.
#[derive(Debug, Clone)]
pub struct ManifestWriter {
    path: PathBuf,
    mode: OutputMode,
}

impl ManifestWriter {
    /// Create a writer for `path`.
    pub fn new(path: impl Into<PathBuf>, mode: OutputMode) -> Self {
        Self {
            path: path.into(),
            mode,
        }
    }

    /// Start writing in the background.
    pub fn spawn(
        self,
        records: mpsc::Receiver<FileRecord>,
    ) -> JoinHandle<Result<ManifestSummary, ManifestError>> {
        tokio::spawn(async move { self.run(records).await })
    }

    /// Drain `records` into the manifest until the channel closes.
    pub async fn run(
        self,
        mut records: mpsc::Receiver<FileRecord>,
    ) -> Result<ManifestSummary, ManifestError> {
        let prior = match self.mode {
            OutputMode::Append => self.load_prior().await,
            OutputMode::Overwrite => Vec::new(),
        };

        let file = File::create(&self.path)
            .await
            .map_err(|source| ManifestError::Create {
                path: self.path.clone(),
                source,
            })?;
        let mut sink = EntrySink::new(&self.path, BufWriter::new(file));
        sink.write(OPEN).await?;

        let mut records_written = 0u64;
        while let Some(record) = records.recv().await {
            sink.push(&record).await?;
            records_written += 1;
        }

        for record in &prior {
            sink.push(record).await?;
        }
        sink.finish().await?;

        let summary = ManifestSummary {
            path: self.path,
            records_written,
            prior_records: prior.len() as u64,
        };
        info!(
            path = %summary.path.display(),
            records = summary.records_written,
            prior = summary.prior_records,
            "Manifest written"
        );
        Ok(summary)
    }

    /// Records of the previous manifest; unreadable or invalid means none.
    async fn load_prior(&self) -> Vec<FileRecord> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "No previous manifest to append");
                return Vec::new();
            }
        };
        match parse_manifest(&self.path, &bytes) {
            Ok(prior) => {
                debug!(path = %self.path.display(), records = prior.len(), "Loaded previous manifest");
                prior
            }
            Err(e) => {
                warn!(error = %e, "Ignoring previous manifest");
                Vec::new()
            }
        }
    }
}

/// Buffered writer that knows whether a separator is due.
struct EntrySink<'a> {
    path: &'a Path,
    out: BufWriter<File>,
    entries: u64,
}

impl<'a> EntrySink<'a> {
    fn new(path: &'a Path, out: BufWriter<File>) -> Self {
        Self {
            path,
            out,
            entries: 0,
        }
    }

    async fn write(&mut self, text: &str) -> Result<(), ManifestError> {
        self.out
            .write_all(text.as_bytes())
            .await
            .map_err(|source| ManifestError::Write {
                path: self.path.to_path_buf(),
                source,
            })
    }

    async fn push(&mut self, record: &FileRecord) -> Result<(), ManifestError> {
        let entry = encode_entry(record)?;
        if self.entries > 0 {
            self.write(SEPARATOR).await?;
        }
        self.write(&entry).await?;
        self.entries += 1;
        Ok(())
    }

    async fn finish(mut self) -> Result<(), ManifestError> {
        self.write(CLOSE).await?;
        self.out.flush().await.map_err(|source| ManifestError::Write {
            path: self.path.to_path_buf(),
            source,
        })
    }
}
