//! Error taxonomy for catalog mutations.
//!
//! Read-only statistics never surface these; they collapse failures into
//! `None`. Mutating operations (trim, purge, export, path repair) return them.
use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

pub type CatalogResult<T> = Result<T, CatalogError>;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("not a catalog: no readable index document under {root}")]
    NotACatalog { root: PathBuf },

    #[error("invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse index document {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to write archive {path}: {source}")]
    Archive {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    #[error(
        "index persisted but {} run directories could not be processed: {}",
        .failures.len(),
        CleanupList(.failures)
    )]
    Cleanup { failures: Vec<CleanupFailure> },
}

impl CatalogError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        CatalogError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        CatalogError::InvalidParameters(message.into())
    }
}

/// One directory that could not be deleted or copied after the index was
/// already written.
#[derive(Debug)]
pub struct CleanupFailure {
    pub path: PathBuf,
    pub error: io::Error,
}

struct CleanupList<'a>(&'a [CleanupFailure]);

impl fmt::Display for CleanupList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, failure) in self.0.iter().enumerate() {
            if idx > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{} ({})", failure.path.display(), failure.error)?;
        }
        Ok(())
    }
}
