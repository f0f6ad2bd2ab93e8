//! File-backed response store.
//!
//! Each entry is one JSON document named after the UUIDv5 of its key, so
//! arbitrary URLs map to safe, fixed-length file names.

use super::{CachedResponse, ResponseCache};
use crate::error::{NewsError, Result};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tokio::fs;
use uuid::Uuid;

const ENTRY_EXTENSION: &str = "json";

/// Directory-backed store bounded by the total size of its files.
pub struct DiskCache {
    dir: PathBuf,
    max_bytes: u64,
}

impl DiskCache {
    /// Open (creating if needed) a store rooted at `dir`.
    pub async fn open(dir: impl Into<PathBuf>, max_bytes: u64) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| NewsError::Cache(format!("create {}: {}", dir.display(), e)))?;
        Ok(DiskCache { dir, max_bytes })
    }

    /// Root directory of the store.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let name = Uuid::new_v5(&Uuid::NAMESPACE_URL, key.as_bytes());
        self.dir.join(format!("{}.{}", name, ENTRY_EXTENSION))
    }

    async fn entries_by_age(&self) -> Result<Vec<(PathBuf, u64, SystemTime)>> {
        let mut files = Vec::new();
        let mut dir = fs::read_dir(&self.dir)
            .await
            .map_err(|e| NewsError::Cache(format!("read {}: {}", self.dir.display(), e)))?;

        while let Some(item) = dir
            .next_entry()
            .await
            .map_err(|e| NewsError::Cache(e.to_string()))?
        {
            let path = item.path();
            if path.extension().and_then(|e| e.to_str()) != Some(ENTRY_EXTENSION) {
                continue;
            }
            let metadata = match item.metadata().await {
                Ok(metadata) => metadata,
                Err(_) => continue,
            };
            let modified = metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH);
            files.push((path, metadata.len(), modified));
        }

        files.sort_by_key(|(_, _, modified)| *modified);
        Ok(files)
    }

    async fn enforce_budget(&self, keep: &Path) -> Result<()> {
        let files = self.entries_by_age().await?;
        let mut total: u64 = files.iter().map(|(_, len, _)| len).sum();

        for (path, len, _) in files {
            if total <= self.max_bytes {
                break;
            }
            if path == keep {
                continue;
            }
            match fs::remove_file(&path).await {
                Ok(()) => {
                    tracing::debug!(path = %path.display(), "evicting cached response");
                    total -= len;
                }
                Err(e) if e.kind() == ErrorKind::NotFound => total -= len,
                Err(e) => return Err(NewsError::Cache(format!("evict {}: {}", path.display(), e))),
            }
        }
        Ok(())
    }
}

#[async_trait]
impl ResponseCache for DiskCache {
    async fn get(&self, key: &str) -> Result<Option<CachedResponse>> {
        let path = self.path_for(key);
        let raw = match fs::read(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(NewsError::Cache(format!("read {}: {}", path.display(), e))),
        };

        match serde_json::from_slice(&raw) {
            Ok(entry) => Ok(Some(entry)),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "discarding corrupt cache entry");
                let _ = fs::remove_file(&path).await;
                Ok(None)
            }
        }
    }

    async fn put(&self, key: &str, entry: CachedResponse) -> Result<()> {
        let path = self.path_for(key);
        let encoded = serde_json::to_vec(&entry).map_err(|e| NewsError::Cache(e.to_string()))?;
        if encoded.len() as u64 > self.max_bytes {
            tracing::debug!(key, size = encoded.len(), "response larger than cache budget, not stored");
            return Ok(());
        }

        // write-then-rename so readers never observe a partial file
        let staging = path.with_extension("tmp");
        fs::write(&staging, &encoded)
            .await
            .map_err(|e| NewsError::Cache(format!("write {}: {}", staging.display(), e)))?;
        fs::rename(&staging, &path)
            .await
            .map_err(|e| NewsError::Cache(format!("rename {}: {}", path.display(), e)))?;

        self.enforce_budget(&path).await
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let path = self.path_for(key);
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(NewsError::Cache(format!("remove {}: {}", path.display(), e))),
        }
    }

    async fn clear(&self) -> Result<()> {
        for (path, _, _) in self.entries_by_age().await? {
            match fs::remove_file(&path).await {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(NewsError::Cache(format!("remove {}: {}", path.display(), e))),
            }
        }
        Ok(())
    }
}
