//! Filesystem helpers shared by the facade and the engines.
use crate::error::CleanupFailure;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Sum the sizes of every file under `root`.
///
/// Any unreadable entry fails the whole computation; callers treat the
/// result as advisory.
pub fn dir_size(root: &Path) -> io::Result<u64> {
    let mut total = 0u64;
    for entry in WalkDir::new(root) {
        let entry = entry.map_err(io::Error::from)?;
        if entry.file_type().is_file() {
            total += entry.metadata().map_err(io::Error::from)?.len();
        }
    }
    Ok(total)
}

/// Copy a directory tree, overwriting existing files.
///
/// Files in a directory are copied before its subdirectories are descended.
pub fn copy_dir_recursive(source: &Path, dest: &Path) -> io::Result<()> {
    fs::create_dir_all(dest)?;
    let mut subdirs = Vec::new();
    for entry in fs::read_dir(source)? {
        let entry = entry?;
        let path = entry.path();
        if entry.file_type()?.is_dir() {
            subdirs.push(path);
        } else {
            fs::copy(&path, dest.join(entry.file_name()))?;
        }
    }
    subdirs.sort();
    for subdir in subdirs {
        if let Some(name) = subdir.file_name() {
            copy_dir_recursive(&subdir, &dest.join(name))?;
        }
    }
    Ok(())
}

/// Every regular file under `root`, sorted.
pub fn collect_files_recursive(root: &Path) -> io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(io::Error::from)?;
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

/// Whether `path` resolves to a directory strictly below `root`.
///
/// Both sides are canonicalized, so `..` segments and symlinks are judged by
/// where they actually lead. Fails when either path cannot be resolved.
pub fn is_strictly_under(root: &Path, path: &Path) -> io::Result<bool> {
    let root = fs::canonicalize(root)?;
    let path = fs::canonicalize(path)?;
    Ok(path != root && path.starts_with(&root))
}

/// Delete each directory below `root`, collecting failures instead of
/// stopping.
///
/// Directories that are already gone count as removed. A directory that does
/// not resolve strictly below `root` is never touched and is reported as a
/// failure.
pub fn remove_dirs(root: &Path, dirs: &[PathBuf]) -> Vec<CleanupFailure> {
    let mut failures = Vec::new();
    for dir in dirs {
        let result = match is_strictly_under(root, dir) {
            Ok(true) => fs::remove_dir_all(dir),
            Ok(false) => Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("refusing to remove path outside catalog root {}", root.display()),
            )),
            Err(err) => Err(err),
        };
        match result {
            Ok(()) => tracing::debug!(path = %dir.display(), "run directory removed"),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(path = %dir.display(), "run directory already absent");
            }
            Err(err) => {
                tracing::warn!(path = %dir.display(), error = %err, "failed to remove run directory");
                failures.push(CleanupFailure {
                    path: dir.clone(),
                    error: err,
                });
            }
        }
    }
    failures
}

/// Immediate subdirectories of `root`, sorted.
pub fn list_subdirectories(root: &Path) -> io::Result<Vec<PathBuf>> {
    let mut dirs = Vec::new();
    for entry in fs::read_dir(root)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            dirs.push(entry.path());
        }
    }
    dirs.sort();
    Ok(dirs)
}
