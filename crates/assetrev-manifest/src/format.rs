//! Manifest document layout.
//!
//! The manifest is a JSON array written one element at a time:
//!
//! ```text
//! [
//!   {
//!     "src": "/css/site.css",
//!     "dest": "/css/site.1c291ca3.css",
//!     "crc32": "1c291ca3",
//!     "size": 19
//!   },
//!   ...
//! ]
//! ```
//!
//! There is no newline after the closing bracket. An empty manifest is
//! `[`, a blank line, then `]`. Inside strings `<`, `>`, `&`, U+2028 and
//! U+2029 are written as `\uXXXX` escapes, the way Go's `encoding/json`
//! writes them, so manifests from either tool compare byte for byte.

use std::path::Path;

use assetrev_core::{FileRecord, ManifestError};

pub(crate) const OPEN: &str = "[\n";
pub(crate) const SEPARATOR: &str = ",\n";
pub(crate) const CLOSE: &str = "\n]";

const INDENT: &str = "  ";

/// Render one array element, indented one level.
pub fn encode_entry(record: &FileRecord) -> Result<String, serde_json::Error> {
    let pretty = serde_json::to_string_pretty(record)?;
    let mut entry = String::with_capacity(pretty.len() + 64);
    entry.push_str(INDENT);
    for c in pretty.chars() {
        match c {
            '\n' => entry.push_str("\n  "),
            '<' => entry.push_str("\\u003c"),
            '>' => entry.push_str("\\u003e"),
            '&' => entry.push_str("\\u0026"),
            '\u{2028}' => entry.push_str("\\u2028"),
            '\u{2029}' => entry.push_str("\\u2029"),
            c => entry.push(c),
        }
    }
    Ok(entry)
}

/// Parse a manifest document.
pub fn parse_manifest(path: &Path, bytes: &[u8]) -> Result<Vec<FileRecord>, ManifestError> {
    serde_json::from_slice(bytes).map_err(|source| ManifestError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Read and parse a manifest from disk.
pub fn load_manifest(path: impl AsRef<Path>) -> Result<Vec<FileRecord>, ManifestError> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|source| ManifestError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_manifest(path, &bytes)
}
