//! Mirroring Engine Library
//!
//! A one-directional file mirroring library providing:
//! - Local directory and WebDAV endpoint snapshots
//! - Change detection via a persisted snapshot fingerprint cache
//! - Metadata comparison with per-file audit reasons
//! - An atomic two-phase safe-replace copy protocol
//! - Glob-based ignore patterns and a bounded error budget
//! - Simulation (dry-run) with the full log narrative

pub mod cache;
pub mod comparator;
pub mod engine;
pub mod entry;
pub mod error;
pub mod filter;
pub mod fingerprint;
pub mod progress;
pub mod provider;
pub mod util;

// Re-export main types and functions
pub use cache::{pair_key, ChangeCache};
pub use comparator::{Comparison, FileComparator};
pub use engine::{SyncEngine, SyncOutcome, SyncSummary, SyncTask};
pub use entry::{FileEntry, Snapshot};
pub use error::{Result, SyncError};
pub use filter::IgnoreFilter;
pub use progress::{CountingProgress, NullProgress, Progress};
pub use provider::{resolve, LocalProvider, Provider, WebDavProvider};

use std::path::Path;

/// Run a single mirror pass with a one-off engine
pub async fn sync_folder(
    task: &SyncTask,
    progress: &mut dyn Progress,
    cache_path: impl AsRef<Path>,
) -> Result<SyncSummary> {
    let engine = SyncEngine::new(cache_path.as_ref());
    engine.run(task, progress).await
}

// Test modules
#[cfg(test)]
mod fingerprint_tests;
