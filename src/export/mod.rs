//! Archival export of a catalog subset.
//!
//! An export never mutates the source catalog. It writes a fresh index that
//! lists only the exported runs, next to copies of their directories, either
//! as a loose directory tree or as a single zip archive.
mod archive;
mod select;

pub use select::{export_cutoff, select_for_export, Cutoff, ExportMode};

use crate::catalog::{require_index, Catalog};
use crate::error::{CatalogError, CatalogResult, CleanupFailure};
use crate::fs_util;
use crate::index::{write_index, CatalogIndex, RunEntry, INDEX_FILE_NAME};
use crate::rewrite::rewrite_paths;
use archive::{archive_file_name, write_archive, ArchivedRun};
use std::fs;
use std::io;
use std::path::PathBuf;

/// Parameters of one export.
#[derive(Debug, Clone)]
pub struct ExportRequest {
    /// Existing directory that receives the export.
    pub destination: PathBuf,
    /// Subdirectory name, or archive base name when compressing.
    pub name: String,
    pub mode: ExportMode,
    pub ignore_errors: bool,
    pub no_compression: bool,
    /// Point `backup_directory` of exported runs at their new location.
    pub rewrite_paths: bool,
}

impl ExportRequest {
    pub fn new(destination: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self {
            destination: destination.into(),
            name: name.into(),
            mode: ExportMode::All,
            ignore_errors: false,
            no_compression: false,
            rewrite_paths: false,
        }
    }

    fn validate(&self) -> CatalogResult<()> {
        self.mode.validate()?;
        if self.name.trim().is_empty() {
            return Err(CatalogError::invalid("export name must be non-empty"));
        }
        if !self.destination.is_dir() {
            return Err(CatalogError::invalid(format!(
                "export destination {} does not exist",
                self.destination.display()
            )));
        }
        Ok(())
    }

    /// Root the exported runs live under once materialized.
    fn exported_root(&self) -> PathBuf {
        if self.no_compression {
            self.destination.join(&self.name)
        } else {
            self.destination.clone()
        }
    }
}

/// What an export wrote.
#[derive(Debug)]
pub struct ExportOutcome {
    pub exported: Vec<RunEntry>,
    /// The export directory or the archive file.
    pub written: PathBuf,
}

/// Build the index document an export would write, without touching disk.
///
/// Runs whose data cannot be located are dropped later, when the export is
/// materialized.
pub fn export_index(index: &CatalogIndex, request: &ExportRequest) -> CatalogIndex {
    let selected = select_for_export(index, request.mode, request.ignore_errors);
    let exported = index.with_runs(selected);
    if request.rewrite_paths {
        rewrite_paths(&exported, &request.exported_root())
    } else {
        exported
    }
}

/// Copy the selected runs of `catalog` into the destination.
pub fn export(catalog: &Catalog, request: &ExportRequest) -> CatalogResult<ExportOutcome> {
    request.validate()?;
    let index = require_index(catalog)?;
    let mut exported = export_index(index, request);
    tracing::info!(
        mode = ?request.mode,
        runs = exported.runs.len(),
        destination = %request.destination.display(),
        compressed = !request.no_compression,
        "exporting catalog"
    );

    let mut sources = Vec::with_capacity(exported.runs.len());
    exported.runs.retain(|run| match export_source(catalog, run) {
        Some(source) => {
            sources.push(source);
            true
        }
        None => {
            tracing::warn!(id = %run.id, "run data not found under catalog root; left out of export");
            false
        }
    });

    let written = if request.no_compression {
        let target = request.destination.join(&request.name);
        fs::create_dir_all(&target).map_err(|err| CatalogError::io(&target, err))?;
        write_index(&target.join(INDEX_FILE_NAME), &exported)?;
        let mut failures = Vec::new();
        for run in &sources {
            let dest = target.join(&run.name);
            if let Err(error) = fs_util::copy_dir_recursive(&run.source, &dest) {
                tracing::warn!(path = %dest.display(), error = %error, "failed to copy run directory");
                failures.push(CleanupFailure { path: dest, error });
            }
        }
        if !failures.is_empty() {
            return Err(CatalogError::Cleanup { failures });
        }
        target
    } else {
        let path = request.destination.join(archive_file_name(&request.name));
        let index_json = serde_json::to_vec_pretty(&exported)
            .map_err(|err| CatalogError::io(&path, io::Error::other(err)))?;
        write_archive(&path, &index_json, &sources).map_err(|source| CatalogError::Archive {
            path: path.clone(),
            source,
        })?;
        path
    };

    tracing::info!(written = %written.display(), runs = exported.runs.len(), "export complete");
    Ok(ExportOutcome {
        exported: exported.runs,
        written,
    })
}

/// Where a run's data is copied from, and the name it is stored under.
///
/// Named runs live at `root/<name>`. An unnamed run is exported only when its
/// stored location resolves strictly below the catalog root.
fn export_source(catalog: &Catalog, run: &RunEntry) -> Option<ArchivedRun> {
    if let Some(name) = run.directory_name.as_deref().filter(|name| !name.is_empty()) {
        return Some(ArchivedRun {
            name: name.to_string(),
            source: catalog.root().join(name),
        });
    }
    let root = fs::canonicalize(catalog.root()).ok()?;
    let source = fs::canonicalize(catalog.run_dir(run)?).ok()?;
    let relative = source.strip_prefix(&root).ok()?;
    let name = relative
        .components()
        .map(|part| part.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/");
    if name.is_empty() {
        return None;
    }
    Some(ArchivedRun { name, source })
}

#[cfg(test)]
#[path = "export_tests.rs"]
mod tests;
