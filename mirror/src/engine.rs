//! Sync engine orchestrating one source→target mirror run

use std::path::PathBuf;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::cache::{pair_key, ChangeCache};
use crate::comparator::{Comparison, FileComparator};
use crate::entry::FileEntry;
use crate::error::{Result, SyncError};
use crate::filter::IgnoreFilter;
use crate::fingerprint;
use crate::progress::Progress;
use crate::provider::{self, Provider, TEMP_PREFIX};
use crate::util::{format_elapsed, human_readable_size};

/// A run stops processing further files once the error counter passes this
const MAX_ERRORS: usize = 30;

/// Fixed pause after a rate-limited copy
const RATE_LIMIT_PAUSE: Duration = Duration::from_secs(30);

/// One sync invocation: the endpoint pair and its policy flags. The engine
/// has no opinion on where these values originate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncTask {
    /// Source endpoint address (local path or WebDAV URL)
    pub source: String,
    /// Target endpoint address
    pub target: String,
    /// Suppress the modification-time comparison
    #[serde(default)]
    pub ignore_last_modified: bool,
    /// Suppress the file-size comparison
    #[serde(default)]
    pub ignore_file_size: bool,
    /// Only mirror files directly under the endpoint roots
    #[serde(default)]
    pub ignore_subdirs: bool,
    /// Skip the fingerprint short-circuit and always scan the target
    #[serde(default)]
    pub ignore_hash: bool,
    /// Glob patterns excluding matching paths from the copy phase
    #[serde(default)]
    pub ignore_patterns: Vec<String>,
    /// Log the intended copies without performing any writes
    #[serde(default)]
    pub simulate: bool,
}

impl SyncTask {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            ignore_last_modified: false,
            ignore_file_size: false,
            ignore_subdirs: false,
            ignore_hash: false,
            ignore_patterns: Vec::new(),
            simulate: false,
        }
    }
}

/// How a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SyncOutcome {
    /// The source fingerprint matched the cached one; no target scan, no
    /// copies
    Unchanged,
    /// The full diff ran and every needed copy succeeded
    Completed,
    /// Errors occurred; the stored fingerprint was reset so the next run
    /// rescans
    Incomplete,
}

/// Result of one run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncSummary {
    pub files_copied: usize,
    pub errors: usize,
    pub outcome: SyncOutcome,
}

/// The synchronization engine. One engine value serves any number of
/// sequential or concurrent runs; all runs share the persisted fingerprint
/// store at the configured location.
#[derive(Debug)]
pub struct SyncEngine {
    cache: ChangeCache,
    rate_limit_pause: Duration,
}

impl SyncEngine {
    pub fn new(cache_path: impl Into<PathBuf>) -> Self {
        Self {
            cache: ChangeCache::new(cache_path),
            rate_limit_pause: RATE_LIMIT_PAUSE,
        }
    }

    /// Override the 429 pause, for tests
    #[doc(hidden)]
    pub fn with_rate_limit_pause(mut self, pause: Duration) -> Self {
        self.rate_limit_pause = pause;
        self
    }

    /// Run one mirror pass from `task.source` to `task.target`.
    ///
    /// Returns a scan error when either endpoint cannot be snapshotted;
    /// single-file copy failures are counted, logged, and reflected in the
    /// summary instead of aborting the run.
    pub async fn run(&self, task: &SyncTask, progress: &mut dyn Progress) -> Result<SyncSummary> {
        let source = provider::resolve(&task.source)?;
        let target = provider::resolve(&task.target)?;

        // In-flight temp artifacts of this or any concurrent run are never
        // sync candidates
        let mut patterns = task.ignore_patterns.clone();
        patterns.push(format!("*/{}*", TEMP_PREFIX));
        let filter = IgnoreFilter::new(patterns)?;

        info!(
            "sync artifacts from '{}' to '{}' using ignore patterns {}",
            source.address(),
            target.address(),
            filter.patterns().join(", ")
        );
        if task.ignore_last_modified {
            info!("suppressing last modified check");
        }
        if task.ignore_file_size {
            info!("suppressing file size check");
        }
        if task.ignore_subdirs {
            info!("ignoring sub dirs");
        }
        if task.ignore_hash {
            info!("ignoring hash");
        }
        if task.simulate {
            info!("simulate copying");
        }

        info!("scanning source {} ...", source.address());
        let start = Instant::now();
        let source_tree = match source.snapshot(task.ignore_subdirs).await {
            Ok(tree) => tree,
            Err(e) => {
                error!("error occurred by requesting {}: {}", source.address(), e);
                return Err(e);
            }
        };
        info!(
            "source {} - {} files found ({})",
            source.address(),
            source_tree.len(),
            format_elapsed(start.elapsed())
        );

        let key = pair_key(source.address(), target.address());
        let fingerprint = fingerprint::compute(&source_tree);

        if !task.ignore_hash {
            let previous = match self.cache.get(&key).await {
                Ok(previous) => previous,
                Err(e) => {
                    warn!("error occurred reading fingerprint store: {}", e);
                    None
                }
            };
            if previous.as_deref() == Some(fingerprint.as_str()) {
                info!("source {} - is unchanged", source.address());
                return Ok(SyncSummary {
                    files_copied: 0,
                    errors: 0,
                    outcome: SyncOutcome::Unchanged,
                });
            }
            if let Some(previous) = previous {
                debug!(
                    "fingerprint {} != previous fingerprint {} ({})",
                    fingerprint, previous, key
                );
            }
        }

        info!("scanning target {} ...", target.address());
        let start = Instant::now();
        let target_tree = match target.snapshot(task.ignore_subdirs).await {
            Ok(tree) => tree,
            Err(e) => {
                error!("error occurred by requesting {}: {}", target.address(), e);
                return Err(e);
            }
        };
        info!(
            "target {} - {} files found ({})",
            target.address(),
            target_tree.len(),
            format_elapsed(start.elapsed())
        );

        let comparator =
            FileComparator::new(task.ignore_last_modified, task.ignore_file_size);

        let mut files_copied = 0;
        let mut errors = 0;

        for (path, source_file) in &source_tree {
            if errors > MAX_ERRORS {
                warn!("too many errors, stop syncing");
                break;
            }

            let comparison = comparator.compare(source_file, target_tree.get(path));
            let reason = match comparison {
                Comparison::Equal => continue,
                Comparison::NeedsCopy { reason } => reason,
            };

            if filter.is_ignored(path) {
                debug!("ignore file {}", path);
                continue;
            }

            let details = format!(
                "{}, {}",
                human_readable_size(source_file.size),
                source_file.last_modified.format("%Y-%m-%dT%H:%M:%S")
            );

            if task.simulate {
                info!(
                    "simulate copying {}{} to {}{} ({}) REASON: '{}'",
                    source.address(),
                    path,
                    target.address(),
                    path,
                    details,
                    reason
                );
                files_copied += 1;
                notify(progress, &source, source_file);
                continue;
            }

            info!(
                "copying {}{} to {}{} ({}) REASON: '{}'",
                source.address(),
                path,
                target.address(),
                path,
                details,
                reason
            );
            let start = Instant::now();
            match copy_entry(&source, &target, source_file).await {
                Ok(()) => {
                    info!("elapsed time {}", format_elapsed(start.elapsed()));
                    files_copied += 1;
                    notify(progress, &source, source_file);
                }
                Err(SyncError::RateLimited { target, retry_after }) => {
                    errors += 1;
                    warn!(
                        "FILECOPY ERROR copying {} - got response status 429 (retry-after {:?})",
                        target, retry_after
                    );
                    info!(
                        "waiting {} sec to reduce request load ...",
                        self.rate_limit_pause.as_secs()
                    );
                    tokio::time::sleep(self.rate_limit_pause).await;
                }
                Err(e) => {
                    errors += 1;
                    warn!(
                        "FILECOPY ERROR copying {}{} to {}{}: {}",
                        source.address(),
                        path,
                        target.address(),
                        path,
                        e
                    );
                }
            }
        }

        // Any errors reset the stored fingerprint so the next run can never
        // wrongly short-circuit past the files that failed
        if !task.simulate {
            let value = if errors > 0 {
                debug!("resetting fingerprint");
                fingerprint::SENTINEL
            } else {
                fingerprint.as_str()
            };
            if let Err(e) = self.cache.update(&key, value).await {
                warn!("error occurred writing fingerprint store: {}", e);
            }
        }

        let outcome = if errors > 0 {
            info!(
                ">> {} errors occurred. Sync has been terminated (incomplete sync; {} file(s) copied)",
                errors, files_copied
            );
            SyncOutcome::Incomplete
        } else if files_copied > 0 {
            info!(">> {} file(s) copied", files_copied);
            SyncOutcome::Completed
        } else {
            info!(">> no changes");
            SyncOutcome::Completed
        };

        Ok(SyncSummary {
            files_copied,
            errors,
            outcome,
        })
    }
}

/// Copy one entry between the pair's providers with the direction-specific
/// safe-replace protocol
async fn copy_entry(source: &Provider, target: &Provider, entry: &FileEntry) -> Result<()> {
    let path = &entry.relative_path;
    match (source, target) {
        (Provider::Local(src), Provider::WebDav(dst)) => {
            dst.write(&src.full_path(path), path, entry.mtime_epoch()).await
        }
        (Provider::WebDav(src), Provider::Local(dst)) => {
            src.read(path, &dst.full_path(path), entry.mtime_epoch()).await
        }
        (Provider::Local(src), Provider::Local(dst)) => {
            dst.store(&src.full_path(path), path, entry.mtime_epoch()).await
        }
        (Provider::WebDav(src), Provider::WebDav(dst)) => Err(SyncError::copy_error(
            format!("{}{}", src.address(), path),
            format!("{}{}", dst.address(), path),
            "webdav to webdav copy is not supported",
        )),
    }
}

/// A copy whose source is local counts as an upload, one whose source is a
/// WebDAV share as a download
fn notify(progress: &mut dyn Progress, source: &Provider, entry: &FileEntry) {
    if source.kind() == "local" {
        progress.on_uploaded(entry.filename());
    } else {
        progress.on_downloaded(entry.filename());
    }
}
