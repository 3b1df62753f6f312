//! Retention grooming and archival export for file-backed backup catalogs.
//!
//! A catalog is a directory holding one index document (`spbrtoc.json`) and
//! one subdirectory per backup run. [`catalog::Catalog`] exposes the index
//! and derived statistics; [`retention`] trims old runs; [`export`] copies a
//! subset into an archive.
pub mod catalog;
pub mod config;
pub mod error;
pub mod export;
pub mod fs_util;
pub mod index;
pub mod report;
pub mod retention;
pub mod rewrite;

#[cfg(test)]
pub(crate) mod test_support;

pub use catalog::Catalog;
pub use error::{CatalogError, CatalogResult};
pub use export::{export, ExportMode, ExportOutcome, ExportRequest};
pub use index::{BackupMethod, CatalogIndex, RunEntry};
pub use retention::{purge, trim_by_count, trim_by_size, GroomOutcome};
pub use rewrite::rewrite_paths;
