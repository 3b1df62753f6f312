//! Run selection for archival export.
use crate::error::{CatalogError, CatalogResult};
use crate::index::{CatalogIndex, RunEntry};

/// Which part of the history to carry into the archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportMode {
    #[default]
    All,
    /// Keep the N oldest eligible Full chains.
    IncludeOldest(usize),
    /// Drop the N newest eligible Full chains.
    ExcludeNewest(usize),
}

impl ExportMode {
    /// Build a mode from the two mutually exclusive count selectors.
    pub fn from_counts(include_oldest: Option<usize>, exclude_newest: Option<usize>) -> CatalogResult<Self> {
        match (include_oldest, exclude_newest) {
            (Some(_), Some(_)) => Err(CatalogError::invalid(
                "include-oldest and exclude-newest cannot be combined",
            )),
            (Some(0), None) | (None, Some(0)) => {
                Err(CatalogError::invalid("export count must be at least 1"))
            }
            (Some(n), None) => Ok(ExportMode::IncludeOldest(n)),
            (None, Some(n)) => Ok(ExportMode::ExcludeNewest(n)),
            (None, None) => Ok(ExportMode::All),
        }
    }

    pub(crate) fn validate(self) -> CatalogResult<()> {
        match self {
            ExportMode::IncludeOldest(0) | ExportMode::ExcludeNewest(0) => {
                Err(CatalogError::invalid("export count must be at least 1"))
            }
            _ => Ok(()),
        }
    }
}

/// Upper bound on directory numbers admitted into an export.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cutoff {
    Unbounded,
    Below(u64),
    Nothing,
}

impl Cutoff {
    pub fn admits(self, directory_number: u64) -> bool {
        match self {
            Cutoff::Unbounded => true,
            Cutoff::Below(cutoff) => directory_number < cutoff,
            Cutoff::Nothing => false,
        }
    }
}

/// Compute the directory-number bound for `mode`.
pub fn export_cutoff(index: &CatalogIndex, mode: ExportMode, ignore_errors: bool) -> Cutoff {
    let fulls = index.eligible_fulls(ignore_errors);
    let bound_at = |position: usize| {
        fulls
            .get(position)
            .map_or(Cutoff::Nothing, |run| Cutoff::Below(run.directory_number))
    };
    match mode {
        ExportMode::All => Cutoff::Unbounded,
        ExportMode::IncludeOldest(n) if n >= fulls.len() => Cutoff::Unbounded,
        ExportMode::IncludeOldest(n) => bound_at(fulls.len() - n - 1),
        ExportMode::ExcludeNewest(n) => match n.checked_sub(1) {
            None => Cutoff::Unbounded,
            Some(position) => bound_at(position),
        },
    }
}

/// Runs to export, oldest first.
///
/// Configuration-only runs and non-backup events are never exported. Unless
/// `ignore_errors` is set, a Differential only travels with a clean base Full.
pub fn select_for_export(index: &CatalogIndex, mode: ExportMode, ignore_errors: bool) -> Vec<RunEntry> {
    let cutoff = export_cutoff(index, mode, ignore_errors);
    let candidates: Vec<&RunEntry> = index
        .counted_backups_ascending()
        .into_iter()
        .filter(|run| cutoff.admits(run.directory_number))
        .collect();
    let selected = if ignore_errors {
        candidates
    } else {
        drop_broken_chains(candidates)
    };
    selected.into_iter().cloned().collect()
}

fn drop_broken_chains(ascending: Vec<&RunEntry>) -> Vec<&RunEntry> {
    let mut bad_chain = false;
    let mut kept = Vec::with_capacity(ascending.len());
    for run in ascending {
        if run.is_full() {
            bad_chain = run.has_errors();
            if bad_chain {
                continue;
            }
        } else if run.is_differential() && (bad_chain || run.has_errors()) {
            continue;
        }
        kept.push(run);
    }
    kept
}
