//! Typed paths into a catalog root.
//!
//! Centralizing path construction keeps the engines agreeing on where the
//! index document and run directories live.
use super::{RunEntry, INDEX_FILE_NAME};
use std::path::{Path, PathBuf};

/// Convenience wrapper for locating catalog artifacts.
#[derive(Debug, Clone)]
pub struct CatalogPaths {
    root: PathBuf,
}

impl CatalogPaths {
    /// Create a new path helper rooted at the catalog root.
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Return the catalog root used for path derivation.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Return the index document path.
    pub fn index_path(&self) -> PathBuf {
        self.root.join(INDEX_FILE_NAME)
    }

    /// Resolve the physical directory holding a run's data.
    ///
    /// The relative directory name wins over the stored absolute reference,
    /// which may still point at a previous catalog location.
    pub fn run_dir(&self, entry: &RunEntry) -> Option<PathBuf> {
        if let Some(name) = entry.directory_name.as_deref().filter(|n| !n.is_empty()) {
            return Some(self.root.join(name));
        }
        entry.backup_directory.as_deref().map(PathBuf::from)
    }
}
