//! Retention grooming: count trim, size trim, and purge.
//!
//! Selection is a pure function of the index snapshot. Applying a selection
//! removes the entries, writes the index, and only then deletes the run
//! directories, so an interrupted pass leaves unreferenced directories rather
//! than index entries pointing at missing data.
//!
//! Differential runs are never selected on their own: every backup numbered
//! below a retained Full goes, which takes each Differential together with
//! the Full it was based on.
use crate::catalog::{require_index, Catalog};
use crate::error::{CatalogError, CatalogResult};
use crate::fs_util;
use crate::index::{CatalogIndex, RunEntry};
use std::collections::BTreeSet;
use std::path::PathBuf;

/// Entries removed by a grooming operation.
#[derive(Debug, Default)]
pub struct GroomOutcome {
    pub removed: Vec<RunEntry>,
    pub passes: usize,
}

impl GroomOutcome {
    pub fn removed_numbers(&self) -> Vec<u64> {
        let mut numbers: Vec<u64> = self.removed.iter().map(|r| r.directory_number).collect();
        numbers.sort_unstable();
        numbers
    }
}

/// Cutoff for keeping the `retain_count` newest eligible Full runs.
///
/// `None` when there are not enough eligible Fulls to trim anything.
pub fn count_cutoff(index: &CatalogIndex, retain_count: usize, ignore_errors: bool) -> Option<u64> {
    if retain_count == 0 {
        return None;
    }
    index
        .eligible_fulls(ignore_errors)
        .get(retain_count - 1)
        .map(|run| run.directory_number)
}

/// Cutoff that drops only the oldest eligible Full chain.
///
/// `None` once a single eligible Full remains.
pub fn oldest_chain_cutoff(index: &CatalogIndex, ignore_errors: bool) -> Option<u64> {
    let fulls = index.eligible_fulls(ignore_errors);
    if fulls.len() < 2 {
        return None;
    }
    fulls.iter().rev().nth(1).map(|run| run.directory_number)
}

/// Keep the `retain_count` newest eligible Full runs and everything after the
/// oldest of them.
pub fn trim_by_count(
    catalog: &mut Catalog,
    retain_count: usize,
    ignore_errors: bool,
) -> CatalogResult<GroomOutcome> {
    if retain_count == 0 {
        return Err(CatalogError::invalid("retain count must be at least 1"));
    }
    let index = require_index(catalog)?;
    let Some(cutoff) = count_cutoff(index, retain_count, ignore_errors) else {
        tracing::info!(
            retain_count,
            eligible = index.eligible_fulls(ignore_errors).len(),
            "not enough full backups to trim"
        );
        return Ok(GroomOutcome::default());
    };
    tracing::info!(retain_count, cutoff, "trimming catalog by count");
    let removed = delete_runs(catalog, |index| index.remove_backups_below(cutoff))?;
    Ok(GroomOutcome {
        removed,
        passes: 1,
    })
}

/// Drop the oldest Full chains until the catalog fits in `retain_size` bytes
/// or only one eligible Full remains.
///
/// Each pass reloads the index and re-measures the catalog. An unknown size
/// counts as over the limit.
pub fn trim_by_size(
    catalog: &mut Catalog,
    retain_size: u64,
    ignore_errors: bool,
) -> CatalogResult<GroomOutcome> {
    let mut outcome = GroomOutcome::default();
    loop {
        catalog.refresh();
        let index = require_index(catalog)?;
        let Some(cutoff) = oldest_chain_cutoff(index, ignore_errors) else {
            tracing::info!(retain_size, "single full backup left; size trim stops");
            break;
        };
        match catalog.size_bytes() {
            Some(size) if size <= retain_size => {
                tracing::info!(size, retain_size, "catalog within size limit");
                break;
            }
            Some(size) => tracing::info!(size, retain_size, cutoff, "catalog over size limit"),
            None => tracing::warn!(retain_size, cutoff, "catalog size unknown; trimming oldest chain"),
        }
        let removed = delete_runs(catalog, |index| index.remove_backups_below(cutoff))?;
        if removed.is_empty() {
            break;
        }
        outcome.passes += 1;
        outcome.removed.extend(removed);
    }
    catalog.refresh();
    Ok(outcome)
}

/// Remove every backup run. Restore events stay in the index.
pub fn purge(catalog: &mut Catalog) -> CatalogResult<GroomOutcome> {
    require_index(catalog)?;
    tracing::info!(root = %catalog.root().display(), "purging catalog");
    let removed = delete_runs(catalog, CatalogIndex::remove_all_backups)?;
    Ok(GroomOutcome {
        removed,
        passes: 1,
    })
}

/// Detach entries, persist the index, then delete their directories.
///
/// Directories still referenced by a surviving entry are kept. Only
/// directories strictly below the catalog root are ever deleted; anything
/// else is reported as a cleanup failure.
fn delete_runs(
    catalog: &mut Catalog,
    select: impl FnOnce(&mut CatalogIndex) -> Vec<RunEntry>,
) -> CatalogResult<Vec<RunEntry>> {
    let removed = select(catalog.index_mut()?);
    if removed.is_empty() {
        return Ok(removed);
    }
    catalog.save()?;
    tracing::info!(removed = removed.len(), "index updated");

    let index = require_index(catalog)?;
    let still_referenced: BTreeSet<PathBuf> = index
        .runs
        .iter()
        .filter_map(|run| catalog.run_dir(run))
        .collect();
    let dirs: Vec<PathBuf> = removed
        .iter()
        .filter_map(|run| catalog.run_dir(run))
        .filter(|dir| !still_referenced.contains(dir))
        .collect();
    let failures = fs_util::remove_dirs(catalog.root(), &dirs);
    if !failures.is_empty() {
        return Err(CatalogError::Cleanup { failures });
    }
    Ok(removed)
}

#[cfg(test)]
#[path = "retention_tests.rs"]
mod tests;
