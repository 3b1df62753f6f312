//! Path rewriting for catalog relocation.
use crate::index::CatalogIndex;
use std::path::{Path, MAIN_SEPARATOR};

/// Point every named run at `new_root/<directory_name>/`.
///
/// Entries without a usable directory name are left untouched, as is
/// every other field.
pub fn rewrite_paths(index: &CatalogIndex, new_root: &Path) -> CatalogIndex {
    let mut rewritten = index.clone();
    for run in &mut rewritten.runs {
        let Some(name) = run.directory_name.as_deref().filter(|name| !name.is_empty()) else {
            continue;
        };
        run.backup_directory = Some(with_trailing_separator(&new_root.join(name)));
    }
    rewritten
}

/// Render a directory path with exactly one trailing separator.
pub fn with_trailing_separator(path: &Path) -> String {
    let mut rendered = path.display().to_string();
    if !rendered.ends_with(MAIN_SEPARATOR) && !rendered.ends_with('/') {
        rendered.push(MAIN_SEPARATOR);
    }
    rendered
}
