//! Catalog builders for unit tests.
use crate::index::{load_index, write_index, BackupMethod, CatalogIndex, CatalogPaths, RunEntry};
use crate::rewrite::with_trailing_separator;
use serde_json::Map;
use std::fs;
use std::path::Path;

pub(crate) fn run(number: u64, method: BackupMethod) -> RunEntry {
    RunEntry {
        id: format!("00000000-0000-0000-0000-{number:012}"),
        directory_number: number,
        directory_name: Some(format!("spbr{number:04}")),
        backup_directory: None,
        method: Some(method),
        configuration_only: false,
        is_backup: true,
        error_count: 0,
        warning_count: 0,
        start_time: Some(format!("2026-03-{:02}T01:00:00Z", number % 28 + 1)),
        finish_time: Some(format!("2026-03-{:02}T02:00:00Z", number % 28 + 1)),
        requested_by: Some("CONTOSO\\spfarm".to_string()),
        top_component: Some("Farm".to_string()),
        extra: Map::new(),
        explicit_nulls: Default::default(),
    }
}

pub(crate) fn full(number: u64) -> RunEntry {
    run(number, BackupMethod::Full)
}

pub(crate) fn diff(number: u64) -> RunEntry {
    run(number, BackupMethod::Differential)
}

pub(crate) fn restore(number: u64) -> RunEntry {
    RunEntry {
        method: None,
        is_backup: false,
        ..run(number, BackupMethod::Full)
    }
}

pub(crate) fn with_errors(mut entry: RunEntry, errors: u32) -> RunEntry {
    entry.error_count = errors;
    entry
}

pub(crate) fn config_only(mut entry: RunEntry) -> RunEntry {
    entry.configuration_only = true;
    entry
}

/// Fulls at 1, 3, 5, 7 each followed by one Differential.
pub(crate) fn alternating_runs() -> Vec<RunEntry> {
    (1..=8)
        .map(|n| if n % 2 == 1 { full(n) } else { diff(n) })
        .collect()
}

/// Write the index and a payload file of `payload_bytes` in every run
/// directory.
pub(crate) fn write_catalog(root: &Path, runs: Vec<RunEntry>, payload_bytes: usize) {
    let paths = CatalogPaths::new(root.to_path_buf());
    let mut runs = runs;
    for run in &mut runs {
        let dir = paths.run_dir(run).expect("run directory");
        fs::create_dir_all(dir.join("content")).expect("create run directory");
        fs::write(dir.join("content").join("payload.bak"), vec![7u8; payload_bytes])
            .expect("write payload");
        fs::write(dir.join("spbackup.log"), b"log").expect("write log");
        run.backup_directory = Some(with_trailing_separator(&dir));
    }
    let index = CatalogIndex {
        runs,
        extra: Map::new(),
    };
    write_index(&paths.index_path(), &index).expect("write index");
}

/// Overwrite the stored location of run `number` in an existing catalog.
pub(crate) fn point_run_at(root: &Path, number: u64, name: Option<&str>, backup_directory: &Path) {
    let paths = CatalogPaths::new(root.to_path_buf());
    let mut index = load_index(&paths.index_path()).expect("index");
    let run = index
        .runs
        .iter_mut()
        .find(|run| run.directory_number == number)
        .expect("run");
    run.directory_name = name.map(str::to_string);
    run.backup_directory = Some(with_trailing_separator(backup_directory));
    write_index(&paths.index_path(), &index).expect("write index");
}

pub(crate) fn numbers(runs: &[RunEntry]) -> Vec<u64> {
    let mut numbers: Vec<u64> = runs.iter().map(|run| run.directory_number).collect();
    numbers.sort_unstable();
    numbers
}
