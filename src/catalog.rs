//! Catalog facade: index lifecycle plus lazily derived statistics.
//!
//! Loading a catalog performs no I/O. The index is parsed on first access and
//! every derived value is cached until `refresh()` or `save()`; both are
//! explicit state transitions, so a cached value never outlives the snapshot
//! it was computed from.
use crate::error::{CatalogError, CatalogResult};
use crate::fs_util;
use crate::index::{load_index, write_index, BackupMethod, CatalogIndex, CatalogPaths, RunEntry};
use crate::rewrite::rewrite_paths;
use std::cell::OnceCell;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy)]
struct RunCounts {
    full: usize,
    differential: usize,
}

#[derive(Debug, Default)]
struct DerivedCache {
    counts: OnceCell<RunCounts>,
    size_bytes: OnceCell<Option<u64>>,
    last_run_size_bytes: OnceCell<Option<u64>>,
    last_full_run_size_bytes: OnceCell<Option<u64>>,
}

/// A backup catalog rooted at a directory holding the index document and
/// one subdirectory per run.
#[derive(Debug)]
pub struct Catalog {
    paths: CatalogPaths,
    index: OnceCell<Option<CatalogIndex>>,
    derived: DerivedCache,
}

impl Catalog {
    /// Bind a catalog to `root` without touching the disk.
    pub fn load(root: impl Into<PathBuf>) -> Self {
        Self {
            paths: CatalogPaths::new(root.into()),
            index: OnceCell::new(),
            derived: DerivedCache::default(),
        }
    }

    pub fn root(&self) -> &Path {
        self.paths.root()
    }

    pub fn paths(&self) -> &CatalogPaths {
        &self.paths
    }

    /// True when the index document exists at the root.
    pub fn is_valid(&self) -> bool {
        self.paths.index_path().is_file()
    }

    /// Drop the cached snapshot and every derived value, then reload.
    pub fn refresh(&mut self) {
        self.derived = DerivedCache::default();
        self.index = OnceCell::from(self.read_index());
    }

    /// The current index snapshot, or `None` when the document is missing or
    /// unreadable.
    pub fn index(&self) -> Option<&CatalogIndex> {
        self.index.get_or_init(|| self.read_index()).as_ref()
    }

    /// Mutable access for engines. Derived values are invalidated since the
    /// caller may change the run list.
    pub fn index_mut(&mut self) -> CatalogResult<&mut CatalogIndex> {
        self.index();
        self.derived = DerivedCache::default();
        let root = self.paths.root().to_path_buf();
        self.index
            .get_mut()
            .and_then(Option::as_mut)
            .ok_or(CatalogError::NotACatalog { root })
    }

    /// Persist the in-memory snapshot to the index document.
    pub fn save(&mut self) -> CatalogResult<()> {
        let path = self.paths.index_path();
        let index = self.index().ok_or_else(|| CatalogError::NotACatalog {
            root: self.paths.root().to_path_buf(),
        })?;
        write_index(&path, index)?;
        self.derived = DerivedCache::default();
        Ok(())
    }

    /// Resolve the physical directory of a run under this catalog.
    pub fn run_dir(&self, entry: &RunEntry) -> Option<PathBuf> {
        self.paths.run_dir(entry)
    }

    pub fn full_backup_count(&self) -> Option<usize> {
        self.counts().map(|counts| counts.full)
    }

    pub fn differential_backup_count(&self) -> Option<usize> {
        self.counts().map(|counts| counts.differential)
    }

    /// Newest backup that is not configuration-only.
    pub fn last_run(&self) -> Option<&RunEntry> {
        self.index()?.last_counted(None)
    }

    /// Newest Full backup that is not configuration-only.
    pub fn last_full_run(&self) -> Option<&RunEntry> {
        self.index()?.last_counted(Some(BackupMethod::Full))
    }

    /// Total bytes of every file under the root.
    pub fn size_bytes(&self) -> Option<u64> {
        *self
            .derived
            .size_bytes
            .get_or_init(|| self.measure(self.paths.root()))
    }

    pub fn last_run_size_bytes(&self) -> Option<u64> {
        *self.derived.last_run_size_bytes.get_or_init(|| {
            let dir = self.run_dir(self.last_run()?)?;
            self.measure(&dir)
        })
    }

    pub fn last_full_run_size_bytes(&self) -> Option<u64> {
        *self.derived.last_full_run_size_bytes.get_or_init(|| {
            let dir = self.run_dir(self.last_full_run()?)?;
            self.measure(&dir)
        })
    }

    /// Size of the last run as a percentage of the last Full run.
    pub fn last_run_size_percent(&self) -> Option<f64> {
        let last = self.last_run_size_bytes()?;
        let full = self.last_full_run_size_bytes()?;
        if full == 0 {
            return None;
        }
        Some(last as f64 * 100.0 / full as f64)
    }

    /// Subdirectories of the root that no index entry references.
    ///
    /// These are left behind when directory deletion fails after the index
    /// was already written.
    pub fn orphan_directories(&self) -> Option<Vec<PathBuf>> {
        let index = self.index()?;
        let referenced: BTreeSet<PathBuf> = index
            .runs
            .iter()
            .filter_map(|run| self.run_dir(run))
            .collect();
        let dirs = match fs_util::list_subdirectories(self.paths.root()) {
            Ok(dirs) => dirs,
            Err(err) => {
                tracing::warn!(root = %self.root().display(), error = %err, "orphan scan failed");
                return None;
            }
        };
        Some(
            dirs.into_iter()
                .filter(|dir| !referenced.contains(dir))
                .collect(),
        )
    }

    /// Point every run entry at this catalog's root and persist.
    ///
    /// Used after the catalog directory was moved or restored elsewhere.
    pub fn repair_paths(&mut self) -> CatalogResult<usize> {
        let root = self.paths.root().to_path_buf();
        let index = self.index_mut()?;
        let rewritten = rewrite_paths(index, &root);
        let changed = rewritten
            .runs
            .iter()
            .zip(&index.runs)
            .filter(|(after, before)| after.backup_directory != before.backup_directory)
            .count();
        *index = rewritten;
        self.save()?;
        tracing::info!(root = %root.display(), changed, "catalog paths repaired");
        Ok(changed)
    }

    fn counts(&self) -> Option<RunCounts> {
        let index = self.index()?;
        Some(*self.derived.counts.get_or_init(|| {
            let mut counts = RunCounts {
                full: 0,
                differential: 0,
            };
            for run in index.runs.iter().filter(|run| run.is_counted_backup()) {
                if run.is_full() {
                    counts.full += 1;
                } else if run.is_differential() {
                    counts.differential += 1;
                }
            }
            counts
        }))
    }

    fn read_index(&self) -> Option<CatalogIndex> {
        let path = self.paths.index_path();
        match load_index(&path) {
            Ok(index) => {
                tracing::debug!(path = %path.display(), runs = index.runs.len(), "index loaded");
                Some(index)
            }
            Err(err) => {
                tracing::debug!(error = %err, "catalog index unavailable");
                None
            }
        }
    }

    fn measure(&self, dir: &Path) -> Option<u64> {
        match fs_util::dir_size(dir) {
            Ok(bytes) => Some(bytes),
            Err(err) => {
                tracing::warn!(path = %dir.display(), error = %err, "size unknown");
                None
            }
        }
    }
}

/// Require a readable index before a mutating operation.
pub(crate) fn require_index(catalog: &Catalog) -> CatalogResult<&CatalogIndex> {
    catalog.index().ok_or_else(|| CatalogError::NotACatalog {
        root: catalog.root().to_path_buf(),
    })
}

#[cfg(test)]
#[path = "catalog_tests.rs"]
mod tests;
