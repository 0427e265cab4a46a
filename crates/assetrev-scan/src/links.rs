//! Symbolic link resolution shared by the counter and the scanner.
//!
//! Both walkers must follow exactly the same links, otherwise the number of
//! completion signals and the pre-computed directory count disagree.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// What a symbolic link points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum LinkTarget {
    /// A directory; `canonical` is its fully resolved path.
    Directory { resolved: PathBuf, canonical: PathBuf },
    /// A regular file.
    File { resolved: PathBuf },
    /// Anything else (FIFO, socket, device).
    Special { resolved: PathBuf },
}

/// Resolve the link `link` found in directory `dir`.
///
/// Absolute targets are used as they are. Relative targets are joined onto
/// `dir`, the directory the link was listed from.
pub(crate) fn resolve_symlink(dir: &Path, link: &Path) -> io::Result<LinkTarget> {
    let target = fs::read_link(link)?;
    let resolved = if target.is_absolute() {
        target
    } else {
        dir.join(target)
    };

    let metadata = fs::metadata(&resolved)?;
    if metadata.is_dir() {
        let canonical = fs::canonicalize(&resolved)?;
        Ok(LinkTarget::Directory {
            resolved,
            canonical,
        })
    } else if metadata.is_file() {
        Ok(LinkTarget::File { resolved })
    } else {
        Ok(LinkTarget::Special { resolved })
    }
}

/// Canonical form of the scan root, or the root itself if it cannot be resolved.
pub(crate) fn canonical_root(root: &Path) -> PathBuf {
    fs::canonicalize(root).unwrap_or_else(|_| root.to_path_buf())
}
