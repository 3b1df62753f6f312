//! Shared test infrastructure for integration tests.

use catalog_groom::index::{write_index, CatalogPaths};
use catalog_groom::{BackupMethod, CatalogIndex, RunEntry};
use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

/// A scratch catalog with one payload file per run directory.
pub struct CatalogFixture {
    pub dir: TempDir,
}

impl CatalogFixture {
    /// Build a catalog from `(directory_number, method, error_count)` rows.
    pub fn new(rows: &[(u64, BackupMethod, u32)], payload_bytes: usize) -> anyhow::Result<Self> {
        let dir = TempDir::new()?;
        let paths = CatalogPaths::new(dir.path().to_path_buf());
        let mut runs = Vec::with_capacity(rows.len());
        for &(number, method, errors) in rows {
            let name = format!("spbr{number:04}");
            let run_dir = dir.path().join(&name);
            fs::create_dir_all(run_dir.join("content"))?;
            fs::write(run_dir.join("content/payload.bak"), vec![1u8; payload_bytes])?;
            fs::write(run_dir.join("spbackup.xml"), b"<SPBackupRestoreHistory/>")?;
            let entry: RunEntry = serde_json::from_value(serde_json::json!({
                "id": format!("run-{number}"),
                "directory_number": number,
                "directory_name": name,
                "backup_directory": format!("{}/", run_dir.display()),
                "method": method,
                "is_backup": true,
                "error_count": errors,
                "start_time": "2026-10-01T01:00:00Z",
                "requested_by": "CONTOSO\\spfarm",
                "top_component": "Farm",
                "database_server": "SQL01"
            }))?;
            runs.push(entry);
        }
        let mut index = CatalogIndex {
            runs,
            ..CatalogIndex::default()
        };
        index
            .extra
            .insert("producer_version".to_string(), serde_json::json!("16.0.1"));
        write_index(&paths.index_path(), &index)?;
        Ok(Self { dir })
    }

    /// Fulls at odd numbers 1..=7, Differentials at even numbers 2..=8.
    pub fn alternating(payload_bytes: usize) -> anyhow::Result<Self> {
        let rows: Vec<(u64, BackupMethod, u32)> = (1..=8)
            .map(|n| {
                let method = if n % 2 == 1 {
                    BackupMethod::Full
                } else {
                    BackupMethod::Differential
                };
                (n, method, 0)
            })
            .collect();
        Self::new(&rows, payload_bytes)
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn run_dir_exists(&self, number: u64) -> bool {
        self.root().join(format!("spbr{number:04}")).is_dir()
    }
}

/// Sorted directory numbers of `runs`.
#[allow(dead_code)]
pub fn numbers(runs: &[RunEntry]) -> Vec<u64> {
    let mut numbers: Vec<u64> = runs.iter().map(|run| run.directory_number).collect();
    numbers.sort_unstable();
    numbers
}

/// Run the `cgroom` binary with `args`.
#[allow(dead_code)]
pub fn cgroom(args: &[&str]) -> anyhow::Result<Output> {
    let output = Command::new(env!("CARGO_BIN_EXE_cgroom"))
        .args(args)
        .env("RUST_LOG", "warn")
        .output()?;
    Ok(output)
}
