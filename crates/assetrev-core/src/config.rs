//! Run configuration types.

use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use derive_builder::Builder;
use serde::{Deserialize, Deserializer, Serialize};
use strum::{Display, EnumString};

use crate::error::ConfigError;
use crate::template::DEFAULT_DEST_FORMAT;

/// Filter used when a configuration leaves `file_filter` empty.
pub const DEFAULT_FILE_FILTER: &str = ".*";

/// Default capacity of the record, completion and warning channels.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 5;

/// How prior manifest content is treated when a run writes its output.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum OutputMode {
    /// Replace the manifest with the records of this run.
    #[default]
    Overwrite,
    /// Write this run's records, followed by the records of the previous manifest.
    Append,
}

impl OutputMode {
    /// Parse a mode string. Anything other than `"append"` selects overwrite.
    pub fn parse_lenient(raw: &str) -> Self {
        raw.parse().unwrap_or_default()
    }
}

impl<'de> Deserialize<'de> for OutputMode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.as_deref().map(Self::parse_lenient).unwrap_or_default())
    }
}

/// One entry of the run configuration list.
///
/// Every field may be omitted from the JSON document; omitted strings are
/// empty and an empty filter or destination format falls back to the default.
#[derive(Debug, Clone, Default, PartialEq, Eq, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
#[serde(default)]
pub struct RunConfig {
    /// Directory to scan.
    pub root_dir: PathBuf,

    /// Where the manifest is written.
    pub output_filepath: PathBuf,

    /// Regular expression matched against file names.
    #[builder(default)]
    pub file_filter: String,

    /// Destination path template.
    #[builder(default)]
    pub dest_format: String,

    /// Overwrite or append.
    #[builder(default)]
    pub output_mode: OutputMode,
}

impl RunConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        match self.root_dir {
            Some(ref root) if !root.as_os_str().is_empty() => {}
            Some(_) => return Err("Root directory cannot be empty".to_string()),
            None => return Err("Root directory is required".to_string()),
        }
        match self.output_filepath {
            Some(ref out) if !out.as_os_str().is_empty() => Ok(()),
            Some(_) => Err("Output file path cannot be empty".to_string()),
            None => Err("Output file path is required".to_string()),
        }
    }
}

impl RunConfig {
    /// Create a new run config builder.
    pub fn builder() -> RunConfigBuilder {
        RunConfigBuilder::default()
    }

    /// Create an overwrite-mode config with default filter and template.
    pub fn new(root_dir: impl Into<PathBuf>, output_filepath: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
            output_filepath: output_filepath.into(),
            ..Self::default()
        }
    }

    /// Parse a JSON array of run configurations.
    pub fn from_json(json: &str) -> Result<Vec<Self>, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// The filter pattern, with the empty string mapped to match-everything.
    pub fn effective_filter(&self) -> &str {
        if self.file_filter.is_empty() {
            DEFAULT_FILE_FILTER
        } else {
            &self.file_filter
        }
    }

    /// The destination template, with the empty string mapped to the default.
    pub fn effective_dest_format(&self) -> &str {
        if self.dest_format.is_empty() {
            DEFAULT_DEST_FORMAT
        } else {
            &self.dest_format
        }
    }

    /// Whether prior manifest records are carried over.
    pub fn is_append(&self) -> bool {
        self.output_mode == OutputMode::Append
    }
}

/// Load the run configuration list from a JSON file.
pub fn load_run_configs(path: impl AsRef<Path>) -> Result<Vec<RunConfig>, ConfigError> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    RunConfig::from_json(&raw).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Tuning for the scan engine, shared by every configuration of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanOptions {
    /// Capacity of each of the record, completion and warning channels.
    pub channel_capacity: usize,

    /// Number of directory workers (0 = one per available CPU).
    pub workers: usize,
}

impl ScanOptions {
    /// Options with the default channel capacity and automatic worker count.
    pub fn new() -> Self {
        Self {
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            workers: 0,
        }
    }

    /// Set the channel capacity.
    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity;
        self
    }

    /// Set the worker count.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Channel capacity clamped to at least one slot.
    pub fn effective_capacity(&self) -> usize {
        self.channel_capacity.max(1)
    }

    /// Worker count with `0` resolved against the host.
    pub fn effective_workers(&self) -> usize {
        match self.workers {
            0 => std::thread::available_parallelism()
                .map(NonZeroUsize::get)
                .unwrap_or(4),
            n => n,
        }
    }
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self::new()
    }
}
