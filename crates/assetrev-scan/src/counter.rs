//! Directory pre-count.
//!
//! Walks the tree with the same rules as [`TreeScanner`](crate::TreeScanner)
//! and counts the directories it would visit, so the caller knows how many
//! completion signals to expect.

use std::fs::{self, ReadDir};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rayon::prelude::*;
use tracing::{debug, warn};

use assetrev_core::ScanError;

use crate::lineage::Lineage;
use crate::links::{LinkTarget, canonical_root, resolve_symlink};

/// Counts the directories a scan of `root` will visit.
#[derive(Debug, Clone)]
pub struct DirectoryCounter {
    root: PathBuf,
}

impl DirectoryCounter {
    /// Create a counter for a scan root.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Count the root and every directory below it, including directories
    /// reached through symbolic links.
    ///
    /// An unreadable root counts as zero and is not an error. An unreadable
    /// directory further down aborts the count. Links that cannot be resolved
    /// are not counted, and links back into their own ancestry are not
    /// followed.
    pub fn count(&self) -> Result<u64, ScanError> {
        let listing = match fs::read_dir(&self.root) {
            Ok(listing) => listing,
            Err(e) => {
                warn!(path = %self.root.display(), error = %e, "Cannot open scan root");
                return Ok(0);
            }
        };

        let lineage = Lineage::root(canonical_root(&self.root));
        let total = count_listing(&self.root, listing, &lineage)?;
        debug!(path = %self.root.display(), directories = total, "Counted directories");
        Ok(total)
    }
}

fn count_dir(path: &Path, lineage: &Arc<Lineage>) -> Result<u64, ScanError> {
    let listing = fs::read_dir(path).map_err(|e| ScanError::io(path, e))?;
    count_listing(path, listing, lineage)
}

fn count_listing(path: &Path, listing: ReadDir, lineage: &Arc<Lineage>) -> Result<u64, ScanError> {
    let mut subdirs: Vec<(PathBuf, Arc<Lineage>)> = Vec::new();
    let mut linked: Vec<(PathBuf, Arc<Lineage>)> = Vec::new();

    for entry in listing {
        let entry = entry.map_err(|e| ScanError::io(path, e))?;
        let file_type = entry.file_type().map_err(|e| ScanError::io(entry.path(), e))?;

        if file_type.is_dir() {
            if let Some(child) = lineage.descend(lineage.path().join(entry.file_name())) {
                subdirs.push((entry.path(), child));
            }
        } else if file_type.is_symlink() {
            if let Ok(LinkTarget::Directory {
                resolved,
                canonical,
            }) = resolve_symlink(path, &entry.path())
            {
                if let Some(child) = lineage.descend(canonical) {
                    linked.push((resolved, child));
                }
            }
        }
    }

    let nested: u64 = subdirs
        .par_iter()
        .map(|(dir, child)| count_dir(dir, child))
        .sum::<Result<u64, ScanError>>()?;

    // Failures below a followed link do not abort the count.
    let through_links: u64 = linked
        .par_iter()
        .map(|(dir, child)| count_dir(dir, child).unwrap_or(0))
        .sum();

    Ok(1 + nested + through_links)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_count_nested_tree() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::create_dir_all(root.join("a/b/c")).unwrap();
        fs::create_dir(root.join("d")).unwrap();
        fs::write(root.join("a/file.txt"), "x").unwrap();

        // root, a, b, c, d
        assert_eq!(DirectoryCounter::new(root).count().unwrap(), 5);
    }

    #[test]
    fn test_count_empty_root() {
        let temp = TempDir::new().unwrap();
        assert_eq!(DirectoryCounter::new(temp.path()).count().unwrap(), 1);
    }

    #[test]
    fn test_missing_root_counts_zero() {
        let temp = TempDir::new().unwrap();
        let counter = DirectoryCounter::new(temp.path().join("absent"));
        assert_eq!(counter.count().unwrap(), 0);
    }

    #[test]
    fn test_file_root_counts_zero() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("plain.txt");
        fs::write(&file, "x").unwrap();
        assert_eq!(DirectoryCounter::new(file).count().unwrap(), 0);
    }

    #[cfg(unix)]
    #[test]
    fn test_count_follows_directory_links() {
        use std::os::unix::fs::symlink;

        let temp = TempDir::new().unwrap();
        let root = temp.path().join("root");
        let outside = temp.path().join("outside");
        fs::create_dir_all(root.join("local")).unwrap();
        fs::create_dir_all(outside.join("nested")).unwrap();
        symlink(&outside, root.join("linked")).unwrap();
        symlink("local", root.join("relative")).unwrap();
        fs::write(outside.join("f.txt"), "x").unwrap();
        symlink(outside.join("f.txt"), root.join("file-link")).unwrap();

        // root, local, linked, linked/nested, relative
        assert_eq!(DirectoryCounter::new(&root).count().unwrap(), 5);
    }

    #[cfg(unix)]
    #[test]
    fn test_count_stops_at_cycles() {
        use std::os::unix::fs::symlink;

        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::create_dir_all(root.join("a/b")).unwrap();
        symlink("..", root.join("a/b/up")).unwrap();
        symlink(".", root.join("self")).unwrap();

        // root, a, b; both links point into their own ancestry
        assert_eq!(DirectoryCounter::new(root).count().unwrap(), 3);
    }
}
