//! Persisted fingerprint cache shared across sync pairs
//!
//! One JSON file holds the whole `"{source}->{target}" -> fingerprint`
//! mapping for every pair. A run reads its key once at the start and writes
//! it once at the end; the write re-reads the whole mapping, updates the one
//! key, and atomically replaces the file, so concurrent runs against the
//! same store never clobber each other's entries.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tokio::fs;
use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

use crate::error::{Result, SyncError};

/// Serializes every read-modify-write of the shared store file within this
/// process. Runs execute as tasks of one service process, so a process-wide
/// mutex is sufficient arbitration; the atomic rename below keeps even an
/// interrupted writer from leaving a torn file behind.
static STORE_LOCK: Mutex<()> = Mutex::const_new(());

/// Cache key for a sync pair
pub fn pair_key(source_address: &str, target_address: &str) -> String {
    format!("{}->{}", source_address, target_address)
}

/// Handle to the persisted fingerprint store
#[derive(Debug, Clone)]
pub struct ChangeCache {
    path: PathBuf,
}

impl ChangeCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Look up the fingerprint recorded for a pair key
    pub async fn get(&self, key: &str) -> Result<Option<String>> {
        let _guard = STORE_LOCK.lock().await;
        let map = self.load().await?;
        Ok(map.get(key).cloned())
    }

    /// Record a fingerprint for a pair key, preserving all other entries
    pub async fn update(&self, key: &str, fingerprint: &str) -> Result<()> {
        let _guard = STORE_LOCK.lock().await;

        let mut map = match self.load().await {
            Ok(map) => map,
            // A corrupt store must not block recording fresh state
            Err(e) => {
                debug!("discarding unreadable fingerprint store: {}", e);
                HashMap::new()
            }
        };
        map.insert(key.to_string(), fingerprint.to_string());

        self.replace(&map).await
    }

    async fn load(&self) -> Result<HashMap<String, String>> {
        let bytes = match fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(HashMap::new()),
            Err(e) => {
                return Err(SyncError::persist_error(
                    self.path.display().to_string(),
                    format!("failed to read store: {}", e),
                ))
            }
        };

        serde_json::from_slice(&bytes).map_err(|e| {
            SyncError::persist_error(
                self.path.display().to_string(),
                format!("failed to parse store: {}", e),
            )
        })
    }

    /// Write the whole mapping through a temp file and an atomic rename
    async fn replace(&self, map: &HashMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await.map_err(|e| {
                    SyncError::persist_error(
                        self.path.display().to_string(),
                        format!("failed to create store directory: {}", e),
                    )
                })?;
            }
        }

        let json = serde_json::to_vec_pretty(map).map_err(|e| {
            SyncError::persist_error(
                self.path.display().to_string(),
                format!("failed to serialize store: {}", e),
            )
        })?;

        let temp = self.path.with_extension(format!("tmp-{}", Uuid::new_v4()));
        let result = match fs::write(&temp, &json).await {
            Ok(()) => fs::rename(&temp, &self.path).await,
            Err(e) => Err(e),
        };

        if let Err(e) = result {
            let _ = fs::remove_file(&temp).await;
            return Err(SyncError::persist_error(
                self.path.display().to_string(),
                format!("failed to write store: {}", e),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_missing_store_reads_empty() {
        let dir = TempDir::new().unwrap();
        let cache = ChangeCache::new(dir.path().join("fingerprints.json"));
        assert_eq!(cache.get("a->b").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_round_trip() {
        let dir = TempDir::new().unwrap();
        let cache = ChangeCache::new(dir.path().join("fingerprints.json"));

        cache.update("a->b", "2_12345").await.unwrap();
        assert_eq!(cache.get("a->b").await.unwrap(), Some("2_12345".to_string()));

        // Re-open through a fresh handle: must survive "restart"
        let reopened = ChangeCache::new(dir.path().join("fingerprints.json"));
        assert_eq!(reopened.get("a->b").await.unwrap(), Some("2_12345".to_string()));
    }

    #[tokio::test]
    async fn test_update_preserves_other_pairs() {
        let dir = TempDir::new().unwrap();
        let cache = ChangeCache::new(dir.path().join("fingerprints.json"));

        cache.update("a->b", "1_1").await.unwrap();
        cache.update("c->d", "2_2").await.unwrap();
        cache.update("a->b", "3_3").await.unwrap();

        assert_eq!(cache.get("a->b").await.unwrap(), Some("3_3".to_string()));
        assert_eq!(cache.get("c->d").await.unwrap(), Some("2_2".to_string()));
    }

    #[tokio::test]
    async fn test_corrupt_store_is_reported_on_get() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("fingerprints.json");
        tokio::fs::write(&path, b"not json").await.unwrap();

        let cache = ChangeCache::new(&path);
        assert!(matches!(
            cache.get("a->b").await,
            Err(SyncError::Persist { .. })
        ));

        // but update still succeeds, discarding the corrupt content
        cache.update("a->b", "1_1").await.unwrap();
        assert_eq!(cache.get("a->b").await.unwrap(), Some("1_1".to_string()));
    }

    #[tokio::test]
    async fn test_no_temp_artifacts_left() {
        let dir = TempDir::new().unwrap();
        let cache = ChangeCache::new(dir.path().join("fingerprints.json"));
        cache.update("a->b", "1_1").await.unwrap();

        let mut names = Vec::new();
        let mut read = tokio::fs::read_dir(dir.path()).await.unwrap();
        while let Some(entry) = read.next_entry().await.unwrap() {
            names.push(entry.file_name().to_string_lossy().to_string());
        }
        assert_eq!(names, vec!["fingerprints.json"]);
    }
}
