//! Source/target entry comparison

use serde::{Deserialize, Serialize};

use crate::entry::FileEntry;

/// Outcome of comparing a source entry against its target counterpart
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Comparison {
    /// Entries are considered equal, no copy needed
    Equal,
    /// A copy is needed; `reason` is the human-readable audit trail entry
    NeedsCopy { reason: String },
}

impl Comparison {
    pub fn needs_copy(&self) -> bool {
        matches!(self, Comparison::NeedsCopy { .. })
    }

    pub fn reason(&self) -> &str {
        match self {
            Comparison::Equal => "",
            Comparison::NeedsCopy { reason } => reason,
        }
    }
}

/// Entry comparator with configurable checks
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct FileComparator {
    /// Skip the modification-time check
    pub ignore_last_modified: bool,
    /// Skip the file-size check
    pub ignore_file_size: bool,
}

impl FileComparator {
    pub fn new(ignore_last_modified: bool, ignore_file_size: bool) -> Self {
        Self {
            ignore_last_modified,
            ignore_file_size,
        }
    }

    /// Decide whether `source` must be copied over `target`.
    ///
    /// An absent target always needs a copy. The mtime check runs before the
    /// size check and only fires when the source is strictly newer. A source
    /// size of exactly 0 never triggers a size-mismatch copy: a zero-byte
    /// source is treated as a possibly-truncated read and must not overwrite
    /// a real target.
    pub fn compare(&self, source: &FileEntry, target: Option<&FileEntry>) -> Comparison {
        let target = match target {
            Some(target) => target,
            None => {
                return Comparison::NeedsCopy {
                    reason: "new".to_string(),
                }
            }
        };

        if !self.ignore_last_modified && source.mtime_epoch() > target.mtime_epoch() {
            return Comparison::NeedsCopy {
                reason: format!(
                    "source last modified {} > target {}",
                    source.last_modified.format("%Y-%m-%dT%H:%M:%S"),
                    target.last_modified.format("%Y-%m-%dT%H:%M:%S")
                ),
            };
        }

        if !self.ignore_file_size && source.size != target.size && source.size > 0 {
            return Comparison::NeedsCopy {
                reason: format!(
                    "source size {} != target size {}",
                    source.size, target.size
                ),
            };
        }

        Comparison::Equal
    }
}
