//! File entries and tree snapshots

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A tree snapshot: non-directory entries keyed by relative path.
///
/// The BTreeMap keeps iteration in ascending lexicographic path order, so a
/// run processes (and logs) files in the same order every time.
pub type Snapshot = BTreeMap<String, FileEntry>;

/// Immutable description of one file at scan time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    /// Path relative to the endpoint's base
    pub relative_path: String,
    /// File size in bytes
    pub size: u64,
    /// Last modified time, UTC, second precision
    pub last_modified: DateTime<Utc>,
    /// Whether this entry is a directory (scan-time intermediate only;
    /// snapshots never contain directory entries)
    pub is_dir: bool,
}

impl FileEntry {
    pub fn new(
        relative_path: impl Into<String>,
        size: u64,
        last_modified: DateTime<Utc>,
        is_dir: bool,
    ) -> Self {
        Self {
            relative_path: relative_path.into(),
            size,
            last_modified,
            is_dir,
        }
    }

    /// Last segment of the relative path
    pub fn filename(&self) -> &str {
        self.relative_path
            .rsplit('/')
            .next()
            .unwrap_or(&self.relative_path)
    }

    /// Modification time as whole epoch seconds
    pub fn mtime_epoch(&self) -> i64 {
        self.last_modified.timestamp()
    }
}

impl std::fmt::Display for FileEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "path={};size={};lastModified={}",
            self.relative_path,
            self.size,
            self.last_modified.format("%Y-%m-%dT%H:%M:%S")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_filename() {
        let t = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let entry = FileEntry::new("/docs/report.pdf", 10, t, false);
        assert_eq!(entry.filename(), "report.pdf");

        let flat = FileEntry::new("report.pdf", 10, t, false);
        assert_eq!(flat.filename(), "report.pdf");
    }

    #[test]
    fn test_snapshot_iterates_sorted() {
        let t = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let mut snapshot = Snapshot::new();
        for path in ["/z.txt", "/a.txt", "/m/n.txt"] {
            snapshot.insert(path.to_string(), FileEntry::new(path, 1, t, false));
        }

        let order: Vec<&str> = snapshot.keys().map(String::as_str).collect();
        assert_eq!(order, vec!["/a.txt", "/m/n.txt", "/z.txt"]);
    }
}
