//! Run-history index document model.
//!
//! The index is a flat list of run entries shared with the backup producer and
//! the restore path. Fields this crate does not understand are carried through
//! `extra` so a rewrite never drops them.
use serde::{de, ser, Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::fmt;

/// File name of the index document at the catalog root.
pub const INDEX_FILE_NAME: &str = "spbrtoc.json";

mod paths;
mod store;

pub use paths::CatalogPaths;
pub use store::{load_index, write_index};

/// Backup method recorded by the producer.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BackupMethod {
    Full,
    Differential,
}

impl BackupMethod {
    /// Return the stable string identifier used in the index document.
    pub fn as_str(&self) -> &'static str {
        match self {
            BackupMethod::Full => "full",
            BackupMethod::Differential => "differential",
        }
    }
}

impl fmt::Display for BackupMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Optional known fields whose explicit `null` is kept on rewrite.
const NULLABLE_FIELDS: [&str; 7] = [
    "directory_name",
    "backup_directory",
    "method",
    "start_time",
    "finish_time",
    "requested_by",
    "top_component",
];

/// One backup or restore event.
///
/// Differential entries carry no link to their base; they depend on the
/// nearest lower-numbered Full entry.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(remote = "Self")]
pub struct RunEntry {
    pub id: String,
    pub directory_number: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub directory_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backup_directory: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<BackupMethod>,
    #[serde(default)]
    pub configuration_only: bool,
    #[serde(default)]
    pub is_backup: bool,
    #[serde(default)]
    pub error_count: u32,
    #[serde(default)]
    pub warning_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requested_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_component: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
    /// Known optional fields the source document spelled out as `null`.
    #[serde(skip)]
    pub(crate) explicit_nulls: BTreeSet<&'static str>,
}

impl<'de> Deserialize<'de> for RunEntry {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let fields = Map::<String, Value>::deserialize(deserializer)?;
        let explicit_nulls: BTreeSet<&'static str> = NULLABLE_FIELDS
            .into_iter()
            .filter(|key| fields.get(*key).is_some_and(Value::is_null))
            .collect();
        let mut entry = RunEntry::deserialize(Value::Object(fields)).map_err(de::Error::custom)?;
        entry.explicit_nulls = explicit_nulls;
        Ok(entry)
    }
}

impl Serialize for RunEntry {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut value =
            RunEntry::serialize(self, serde_json::value::Serializer).map_err(ser::Error::custom)?;
        if let Value::Object(fields) = &mut value {
            for key in &self.explicit_nulls {
                fields.entry(*key).or_insert(Value::Null);
            }
        }
        value.serialize(serializer)
    }
}

impl RunEntry {
    pub fn is_full(&self) -> bool {
        self.method == Some(BackupMethod::Full)
    }

    pub fn is_differential(&self) -> bool {
        self.method == Some(BackupMethod::Differential)
    }

    pub fn has_errors(&self) -> bool {
        self.error_count > 0
    }

    /// Backup runs that take part in count and size retention math.
    pub fn is_counted_backup(&self) -> bool {
        self.is_backup && !self.configuration_only
    }
}

/// In-memory snapshot of the index document.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct CatalogIndex {
    #[serde(default)]
    pub runs: Vec<RunEntry>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CatalogIndex {
    /// Full runs eligible as retention anchors, newest first.
    pub fn eligible_fulls(&self, ignore_errors: bool) -> Vec<&RunEntry> {
        let mut fulls: Vec<&RunEntry> = self
            .runs
            .iter()
            .filter(|run| run.is_counted_backup() && run.is_full())
            .filter(|run| ignore_errors || !run.has_errors())
            .collect();
        fulls.sort_by(|a, b| b.directory_number.cmp(&a.directory_number));
        fulls
    }

    /// Counted backup runs ordered oldest first.
    pub fn counted_backups_ascending(&self) -> Vec<&RunEntry> {
        let mut runs: Vec<&RunEntry> = self
            .runs
            .iter()
            .filter(|run| run.is_counted_backup())
            .collect();
        runs.sort_by_key(|run| run.directory_number);
        runs
    }

    /// Newest counted backup run, optionally restricted to one method.
    pub fn last_counted(&self, method: Option<BackupMethod>) -> Option<&RunEntry> {
        self.runs
            .iter()
            .filter(|run| run.is_counted_backup())
            .filter(|run| method.is_none() || run.method == method)
            .max_by_key(|run| run.directory_number)
    }

    /// Detach every backup entry numbered below `cutoff`.
    ///
    /// Restore and other non-backup events are never removed.
    pub fn remove_backups_below(&mut self, cutoff: u64) -> Vec<RunEntry> {
        self.remove_backups_where(|run| run.directory_number < cutoff)
    }

    /// Detach every backup entry.
    pub fn remove_all_backups(&mut self) -> Vec<RunEntry> {
        self.remove_backups_where(|_| true)
    }

    fn remove_backups_where(&mut self, predicate: impl Fn(&RunEntry) -> bool) -> Vec<RunEntry> {
        let (removed, kept): (Vec<RunEntry>, Vec<RunEntry>) = std::mem::take(&mut self.runs)
            .into_iter()
            .partition(|run| run.is_backup && predicate(run));
        self.runs = kept;
        removed
    }

    /// A copy of the document header with a different run list.
    pub fn with_runs(&self, runs: Vec<RunEntry>) -> CatalogIndex {
        CatalogIndex {
            runs,
            extra: self.extra.clone(),
        }
    }
}

#[cfg(test)]
#[path = "index_tests.rs"]
mod tests;
