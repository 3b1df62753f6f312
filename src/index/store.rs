//! Reading and writing the index document.
//!
//! Writes go through a temp file in the catalog root and a rename so readers
//! never observe a half-written document.
use super::CatalogIndex;
use crate::error::{CatalogError, CatalogResult};
use std::fs;
use std::io::{self, Write};
use std::path::Path;
use tempfile::NamedTempFile;

/// Load the index document from disk.
pub fn load_index(path: &Path) -> CatalogResult<CatalogIndex> {
    let bytes = fs::read(path).map_err(|err| CatalogError::io(path, err))?;
    serde_json::from_slice(&bytes).map_err(|source| CatalogError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Persist the index document in a stable JSON format.
pub fn write_index(path: &Path, index: &CatalogIndex) -> CatalogResult<()> {
    let parent = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent).map_err(|err| CatalogError::io(parent, err))?;
    let text = serde_json::to_vec_pretty(index)
        .map_err(|err| CatalogError::io(path, io::Error::other(err)))?;
    let mut tmp = NamedTempFile::new_in(parent).map_err(|err| CatalogError::io(parent, err))?;
    tmp.write_all(&text)
        .and_then(|_| tmp.as_file().sync_all())
        .map_err(|err| CatalogError::io(tmp.path(), err))?;
    tmp.persist(path)
        .map_err(|err| CatalogError::io(path, err.error))?;
    tracing::debug!(path = %path.display(), runs = index.runs.len(), "index written");
    Ok(())
}
