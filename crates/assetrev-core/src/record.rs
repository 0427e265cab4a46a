//! Manifest record types.

use std::fmt;

use compact_str::{CompactString, format_compact};
use serde::{Deserialize, Serialize};

/// CRC-32 fingerprint of a file's content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint(pub u32);

impl Fingerprint {
    /// Create a fingerprint from a raw checksum value.
    pub fn new(value: u32) -> Self {
        Self(value)
    }

    /// Get the fingerprint as eight lowercase hex digits.
    pub fn to_hex(&self) -> CompactString {
        format_compact!("{:08x}", self.0)
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08x}", self.0)
    }
}

/// One manifest entry: where a file lives and where its revisioned copy goes.
///
/// Fields missing from a manifest read back from disk take their zero value,
/// so records written by other tools survive an append run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct FileRecord {
    /// Root-relative source path, with a leading separator.
    #[serde(rename = "src")]
    pub source: String,

    /// Destination rendered from the template.
    #[serde(rename = "dest")]
    pub destination: String,

    /// Hex-encoded fingerprint.
    #[serde(rename = "crc32")]
    pub fingerprint: CompactString,

    /// File size in bytes.
    pub size: u64,
}

impl FileRecord {
    /// Create a new record.
    pub fn new(
        source: impl Into<String>,
        destination: impl Into<String>,
        fingerprint: impl Into<CompactString>,
        size: u64,
    ) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
            fingerprint: fingerprint.into(),
            size,
        }
    }
}
