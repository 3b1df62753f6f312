//! Zip materialization of an export.
use crate::index::INDEX_FILE_NAME;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;
use zip::result::ZipResult;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

const ARCHIVE_BUFFER_BYTES: usize = 4 * 1024 * 1024;

/// One run directory to place in the archive under `name/`.
pub(crate) struct ArchivedRun {
    pub name: String,
    pub source: PathBuf,
}

/// Append `.zip` unless the name already carries it.
pub(crate) fn archive_file_name(name: &str) -> String {
    if name.to_ascii_lowercase().ends_with(".zip") {
        name.to_string()
    } else {
        format!("{name}.zip")
    }
}

/// Create or overwrite `path` with the index at the root and every run
/// directory added recursively.
pub(crate) fn write_archive(path: &Path, index_json: &[u8], runs: &[ArchivedRun]) -> ZipResult<()> {
    let file = File::create(path)?;
    let mut zip = ZipWriter::new(BufWriter::with_capacity(ARCHIVE_BUFFER_BYTES, file));
    // zip64 headers so archives past 4 GiB stay readable
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .large_file(true);

    zip.start_file(INDEX_FILE_NAME, options)?;
    zip.write_all(index_json)?;

    for run in runs {
        add_directory(&mut zip, &run.source, &run.name, options)?;
    }
    let mut inner = zip.finish()?;
    inner.flush()?;
    Ok(())
}

fn add_directory<W: Write + io::Seek>(
    zip: &mut ZipWriter<W>,
    source: &Path,
    prefix: &str,
    options: SimpleFileOptions,
) -> ZipResult<()> {
    for entry in WalkDir::new(source).sort_by_file_name() {
        let entry = entry.map_err(io::Error::from)?;
        let rel = entry.path().strip_prefix(source).unwrap_or(entry.path());
        let name = archive_entry_name(prefix, rel);
        if entry.file_type().is_dir() {
            zip.add_directory(format!("{name}/"), options)?;
        } else if entry.file_type().is_file() {
            zip.start_file(name, options)?;
            let mut file = File::open(entry.path())?;
            io::copy(&mut file, zip)?;
        }
    }
    Ok(())
}

fn archive_entry_name(prefix: &str, rel: &Path) -> String {
    let mut name = prefix.trim_end_matches(['/', '\\']).to_string();
    for component in rel.components() {
        if let Component::Normal(part) = component {
            name.push('/');
            name.push_str(&part.to_string_lossy());
        }
    }
    name
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zip_suffix_is_added_once() {
        assert_eq!(archive_file_name("farm-2026"), "farm-2026.zip");
        assert_eq!(archive_file_name("farm.ZIP"), "farm.ZIP");
    }

    #[test]
    fn entry_names_use_forward_slashes() {
        let rel = Path::new("content").join("payload.bak");
        assert_eq!(
            archive_entry_name("spbr0001", &rel),
            "spbr0001/content/payload.bak"
        );
        assert_eq!(archive_entry_name("spbr0001/", Path::new("")), "spbr0001");
    }
}
