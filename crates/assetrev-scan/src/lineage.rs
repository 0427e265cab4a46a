//! Directory lineage for symlink cycle detection.

use std::path::{Path, PathBuf};
use std::sync::Arc;

/// The canonical path of a directory together with those of its ancestors.
///
/// Each queued directory holds its own lineage. Lineages share their parent
/// chain, so descending costs one allocation regardless of depth. Only the
/// branch being walked is checked: two links to the same directory from
/// different branches are both followed, a link back into its own ancestry
/// is not.
#[derive(Debug)]
pub struct Lineage {
    path: PathBuf,
    parent: Option<Arc<Lineage>>,
}

impl Lineage {
    /// Start a lineage at the scan root.
    pub fn root(path: impl Into<PathBuf>) -> Arc<Self> {
        Arc::new(Self {
            path: path.into(),
            parent: None,
        })
    }

    /// Canonical path of this directory.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Check whether `path` is this directory or one of its ancestors.
    pub fn contains(&self, path: &Path) -> bool {
        self.ancestors().any(|l| l.path == path)
    }

    /// Extend the lineage with a child directory.
    ///
    /// Returns `None` if the child is already part of the lineage.
    pub fn descend(self: &Arc<Self>, canonical: PathBuf) -> Option<Arc<Self>> {
        if self.contains(&canonical) {
            return None;
        }
        Some(Arc::new(Self {
            path: canonical,
            parent: Some(Arc::clone(self)),
        }))
    }

    fn ancestors(&self) -> impl Iterator<Item = &Lineage> {
        std::iter::successors(Some(self), |l| l.parent.as_deref())
    }
}
