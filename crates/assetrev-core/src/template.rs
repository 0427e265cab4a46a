//! Destination path templates.
//!
//! A template is a plain string with placeholders that are substituted
//! literally for each file:
//!
//! | Placeholder     | Value                                             |
//! |-----------------|---------------------------------------------------|
//! | `%srcdir%`      | root-relative directory, ending in `/`            |
//! | `%srcfilename%` | file name without its extension                   |
//! | `%srcext%`      | extension including its dot, empty if none        |
//! | `%crc32%`       | hex fingerprint                                   |
//!
//! Substitution runs in the order directory, extension, file name,
//! fingerprint. Unknown placeholders are left as they are.

use serde::{Deserialize, Serialize};

/// Template used when a configuration does not set one.
pub const DEFAULT_DEST_FORMAT: &str = "%srcdir%%srcfilename%.%crc32%%srcext%";

pub const PLACEHOLDER_SRC_DIR: &str = "%srcdir%";
pub const PLACEHOLDER_SRC_FILENAME: &str = "%srcfilename%";
pub const PLACEHOLDER_SRC_EXT: &str = "%srcext%";
pub const PLACEHOLDER_FINGERPRINT: &str = "%crc32%";

/// Split a file name into stem and extension.
///
/// The extension starts at the last `.` and keeps it, so `.env` is all
/// extension and `archive.tar.gz` splits into `archive.tar` and `.gz`.
pub fn split_extension(file_name: &str) -> (&str, &str) {
    match file_name.rfind('.') {
        Some(idx) => file_name.split_at(idx),
        None => (file_name, ""),
    }
}

/// Values substituted into a template for one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TemplateVars<'a> {
    pub src_dir: &'a str,
    pub file_stem: &'a str,
    pub extension: &'a str,
    pub fingerprint: &'a str,
}

impl<'a> TemplateVars<'a> {
    /// Build the variables for a file name found in `src_dir`.
    pub fn for_file(src_dir: &'a str, file_name: &'a str, fingerprint: &'a str) -> Self {
        let (file_stem, extension) = split_extension(file_name);
        Self {
            src_dir,
            file_stem,
            extension,
            fingerprint,
        }
    }
}

/// A destination path template.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DestinationTemplate {
    pattern: String,
}

impl DestinationTemplate {
    /// Create a template. An empty pattern selects [`DEFAULT_DEST_FORMAT`].
    pub fn new(pattern: impl Into<String>) -> Self {
        let pattern = pattern.into();
        if pattern.is_empty() {
            Self::default()
        } else {
            Self { pattern }
        }
    }

    /// The raw template text.
    pub fn as_str(&self) -> &str {
        &self.pattern
    }

    /// Render the destination for one file.
    pub fn render(&self, vars: &TemplateVars<'_>) -> String {
        let mut rendered = self.pattern.clone();
        for (placeholder, value) in [
            (PLACEHOLDER_SRC_DIR, vars.src_dir),
            (PLACEHOLDER_SRC_EXT, vars.extension),
            (PLACEHOLDER_SRC_FILENAME, vars.file_stem),
            (PLACEHOLDER_FINGERPRINT, vars.fingerprint),
        ] {
            if rendered.contains(placeholder) {
                rendered = rendered.replace(placeholder, value);
            }
        }
        rendered
    }
}

impl Default for DestinationTemplate {
    fn default() -> Self {
        Self {
            pattern: DEFAULT_DEST_FORMAT.to_string(),
        }
    }
}
