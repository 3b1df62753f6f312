use super::Catalog;
use crate::index::{write_index, CatalogIndex, INDEX_FILE_NAME};
use crate::test_support::{alternating_runs, config_only, full, restore, write_catalog};
use std::fs;

#[test]
fn missing_root_is_invalid_and_everything_is_unknown() {
    let dir = tempfile::tempdir().expect("tempdir");
    let catalog = Catalog::load(dir.path().join("nowhere"));

    assert!(!catalog.is_valid());
    assert!(catalog.index().is_none());
    assert_eq!(catalog.full_backup_count(), None);
    assert!(catalog.last_run().is_none());
    assert_eq!(catalog.size_bytes(), None);
    assert_eq!(catalog.last_run_size_percent(), None);
}

#[test]
fn unparsable_index_leaves_catalog_without_index() {
    let dir = tempfile::tempdir().expect("tempdir");
    fs::write(dir.path().join(INDEX_FILE_NAME), b"{ not json").expect("write");
    let mut catalog = Catalog::load(dir.path());
    catalog.refresh();

    assert!(catalog.is_valid());
    assert!(catalog.index().is_none());
    assert_eq!(catalog.differential_backup_count(), None);
    assert!(matches!(
        catalog.index_mut(),
        Err(crate::error::CatalogError::NotACatalog { .. })
    ));
}

#[test]
fn counts_and_last_runs_exclude_configuration_only_and_restores() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut runs = alternating_runs();
    runs.push(config_only(full(9)));
    runs.push(restore(10));
    write_catalog(dir.path(), runs, 16);
    let catalog = Catalog::load(dir.path());

    assert_eq!(catalog.full_backup_count(), Some(4));
    assert_eq!(catalog.differential_backup_count(), Some(4));
    assert_eq!(catalog.last_run().map(|r| r.directory_number), Some(8));
    assert_eq!(catalog.last_full_run().map(|r| r.directory_number), Some(7));
}

#[test]
fn sizes_are_cached_until_refresh() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_catalog(dir.path(), alternating_runs(), 100);
    let mut catalog = Catalog::load(dir.path());

    let before = catalog.size_bytes().expect("size");
    assert_eq!(catalog.last_run_size_bytes(), Some(103));
    assert_eq!(catalog.last_run_size_percent(), Some(100.0));

    fs::write(dir.path().join("spbr0008/extra.bak"), vec![0u8; 50]).expect("grow run");
    assert_eq!(catalog.size_bytes(), Some(before));

    catalog.refresh();
    assert_eq!(catalog.size_bytes(), Some(before + 50));
    assert_eq!(catalog.last_run_size_bytes(), Some(153));
}

#[test]
fn refresh_observes_external_index_changes() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_catalog(dir.path(), alternating_runs(), 1);
    let mut catalog = Catalog::load(dir.path());
    assert_eq!(catalog.full_backup_count(), Some(4));

    let index = CatalogIndex {
        runs: vec![full(1)],
        ..CatalogIndex::default()
    };
    write_index(&dir.path().join(INDEX_FILE_NAME), &index).expect("rewrite index");
    assert_eq!(catalog.full_backup_count(), Some(4));

    catalog.refresh();
    assert_eq!(catalog.full_backup_count(), Some(1));
}

#[test]
fn orphan_scan_lists_unreferenced_directories() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_catalog(dir.path(), alternating_runs(), 1);
    fs::create_dir_all(dir.path().join("spbr0099")).expect("create orphan");
    let catalog = Catalog::load(dir.path());

    let orphans = catalog.orphan_directories().expect("scan");
    assert_eq!(orphans, vec![dir.path().join("spbr0099")]);
}

#[test]
fn repair_paths_rebases_entries_on_current_root() {
    let original = tempfile::tempdir().expect("original");
    write_catalog(original.path(), alternating_runs(), 1);
    let moved = tempfile::tempdir().expect("moved");
    crate::fs_util::copy_dir_recursive(original.path(), moved.path()).expect("move catalog");

    let mut catalog = Catalog::load(moved.path());
    let changed = catalog.repair_paths().expect("repair");
    assert_eq!(changed, 8);

    catalog.refresh();
    let index = catalog.index().expect("index");
    for run in &index.runs {
        let dir = run.backup_directory.as_deref().expect("backup directory");
        assert!(dir.starts_with(&moved.path().display().to_string()));
    }
}
