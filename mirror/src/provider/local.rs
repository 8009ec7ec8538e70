//! Local filesystem provider

use std::path::{Path, PathBuf};

use chrono::{DateTime, TimeZone, Utc};
use filetime::FileTime;
use tokio::fs;
use tracing::{debug, info, warn};
use uuid::Uuid;
use walkdir::WalkDir;

use super::TEMP_PREFIX;
use crate::entry::{FileEntry, Snapshot};
use crate::error::{Result, SyncError};

/// Provider rooted at a local directory
#[derive(Debug)]
pub struct LocalProvider {
    root: PathBuf,
    address: String,
}

impl LocalProvider {
    pub fn new(address: impl Into<String>) -> Self {
        let address = address.into();
        Self {
            root: PathBuf::from(&address),
            address,
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    /// Absolute path of an entry inside this provider's tree
    pub fn full_path(&self, relative_path: &str) -> PathBuf {
        self.root.join(relative_path.trim_start_matches('/'))
    }

    /// Walk the rooted tree and record every regular file's size and mtime
    /// (truncated to whole seconds, UTC). With `ignore_subdirs`, only files
    /// directly under the root are included.
    pub async fn snapshot(&self, ignore_subdirs: bool) -> Result<Snapshot> {
        if !self.root.is_dir() {
            return Err(SyncError::scan_error(
                &self.address,
                "root is not a readable directory",
            ));
        }

        let mut walker = WalkDir::new(&self.root);
        if ignore_subdirs {
            walker = walker.max_depth(1);
        }

        let mut files = Snapshot::new();
        for result in walker {
            let dir_entry = result
                .map_err(|e| SyncError::scan_error(&self.address, format!("walk error: {}", e)))?;
            if !dir_entry.file_type().is_file() {
                continue;
            }

            let metadata = dir_entry.metadata().map_err(|e| {
                SyncError::scan_error(
                    &self.address,
                    format!("metadata error for '{}': {}", dir_entry.path().display(), e),
                )
            })?;

            let relative_path = self.relative_path(dir_entry.path())?;
            let entry = FileEntry::new(
                relative_path.clone(),
                metadata.len(),
                mtime_utc(&metadata),
                false,
            );
            files.insert(relative_path, entry);
        }

        Ok(files)
    }

    /// Copy a local file into this provider's tree with the safe-replace
    /// protocol: write a temporary sibling, rename it into place, stamp the
    /// modification time. The temp file is removed on every exit path.
    pub async fn store(
        &self,
        local_source: &Path,
        relative_path: &str,
        mtime_epoch: i64,
    ) -> Result<()> {
        let target = self.full_path(relative_path);
        let temp = temp_sibling(&target);
        make_parents(&temp).await?;

        let result = async {
            fs::copy(local_source, &temp).await.map_err(|e| {
                SyncError::copy_error(
                    local_source.display().to_string(),
                    target.display().to_string(),
                    format!("copy failed: {}", e),
                )
            })?;
            replace_with_mtime(&temp, &target, mtime_epoch).await
        }
        .await;

        remove_if_exists(&temp).await;
        result
    }

    fn relative_path(&self, path: &Path) -> Result<String> {
        let relative = path.strip_prefix(&self.root).map_err(|e| {
            SyncError::scan_error(
                &self.address,
                format!("failed to relativize '{}': {}", path.display(), e),
            )
        })?;
        Ok(format!("/{}", relative.to_string_lossy().replace('\\', "/")))
    }
}

/// Modification time truncated to whole seconds, UTC
fn mtime_utc(metadata: &std::fs::Metadata) -> DateTime<Utc> {
    let epoch = FileTime::from_last_modification_time(metadata).unix_seconds();
    Utc.timestamp_opt(epoch, 0).single().unwrap_or_default()
}

/// Temporary sibling name for a target path: same directory, the shared
/// temp prefix, and a process-unique suffix so concurrent operations on the
/// same target never collide
pub(crate) fn temp_sibling(target: &Path) -> PathBuf {
    let filename = target
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let temp_name = format!("{}{}_{}", TEMP_PREFIX, Uuid::new_v4(), filename);
    match target.parent() {
        Some(parent) => parent.join(temp_name),
        None => PathBuf::from(temp_name),
    }
}

/// Create the parent directories of a path as needed
pub(crate) async fn make_parents(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).await.map_err(|e| {
                warn!("could not create parent directory {}", parent.display());
                SyncError::Io(e)
            })?;
            info!("directory {} created", parent.display());
        }
    }
    Ok(())
}

/// Atomically move a fully written temp file over the target and stamp the
/// target's access/modification times
pub(crate) async fn replace_with_mtime(
    temp: &Path,
    target: &Path,
    mtime_epoch: i64,
) -> Result<()> {
    fs::rename(temp, target).await.map_err(|e| {
        SyncError::copy_error(
            temp.display().to_string(),
            target.display().to_string(),
            format!("replace failed: {}", e),
        )
    })?;

    let mtime = FileTime::from_unix_time(mtime_epoch, 0);
    filetime::set_file_times(target, mtime, mtime).map_err(|e| {
        SyncError::copy_error(
            temp.display().to_string(),
            target.display().to_string(),
            format!("failed to set mtime: {}", e),
        )
    })
}

/// Remove a scratch file, ignoring a missing one
pub(crate) async fn remove_if_exists(path: &Path) {
    match fs::remove_file(path).await {
        Ok(()) => debug!("removed temp file {}", path.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!("could not remove temp file {}: {}", path.display(), e),
    }
}
