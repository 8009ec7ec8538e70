//! Snapshot fingerprinting for cheap change detection
//!
//! The fingerprint is not a content digest: it hashes each entry's
//! `(path, size, mtime)` triple and XOR-folds the results, so it is
//! order-independent and collision-tolerant. Its only job is to let the
//! engine skip the target scan and diff when the source tree is provably
//! unchanged since the last recorded run for a pair.

use crate::entry::{FileEntry, Snapshot};

/// Stored in place of a fingerprint after a run with errors. Real
/// fingerprints always contain `_`, so the sentinel never matches one and
/// the next run is forced into a full rescan and diff.
pub const SENTINEL: &str = "0";

/// Hash one entry's identity triple
pub fn entry_hash(entry: &FileEntry) -> u64 {
    let path_crc = crc32fast::hash(entry.relative_path.as_bytes()) as u64;
    path_crc ^ entry.size ^ entry.mtime_epoch() as u64
}

/// Fingerprint a whole snapshot: XOR-fold of the entry hashes, rendered as
/// `"{entry_count}_{folded_value}"`
pub fn compute(snapshot: &Snapshot) -> String {
    let folded = snapshot.values().fold(0u64, |acc, entry| acc ^ entry_hash(entry));
    format!("{}_{}", snapshot.len(), folded)
}
