//! JSON file storage backend.
//!
//! The whole key/value map is kept in one JSON object on disk. It is loaded
//! lazily on first access and rewritten after every change through a
//! temporary file and rename, so a crash never leaves a half-written file.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tokio::sync::{broadcast, Mutex};

use crate::backend::{StorageBackend, StorageChange, CHANGE_CHANNEL_CAPACITY};
use crate::error::StoreError;

type KeyValues = BTreeMap<String, serde_json::Value>;

/// Key/value storage persisted to a single JSON file.
pub struct JsonFileBackend {
    path: PathBuf,
    /// `None` until the file has been read.
    cache: Mutex<Option<KeyValues>>,
    changes: broadcast::Sender<StorageChange>,
}

impl JsonFileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            path: path.into(),
            cache: Mutex::new(None),
            changes,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_file(&self) -> Result<KeyValues, StoreError> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "Store file missing, starting empty");
                return Ok(KeyValues::new());
            }
            Err(e) => return Err(e.into()),
        };

        if raw.trim().is_empty() {
            return Ok(KeyValues::new());
        }

        serde_json::from_str(&raw).map_err(|e| {
            StoreError::Corrupt(format!("{} is not a JSON object: {e}", self.path.display()))
        })
    }

    async fn write_file(&self, data: &KeyValues) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let body = serde_json::to_string_pretty(data)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, body).await?;
        tokio::fs::rename(&tmp, &self.path).await?;

        tracing::trace!(path = %self.path.display(), keys = data.len(), "Store file written");
        Ok(())
    }

    /// Apply `mutate` to the loaded map, persist it, and report the change.
    async fn modify(
        &self,
        key: &str,
        mutate: impl FnOnce(&mut KeyValues) -> Option<serde_json::Value>,
    ) -> Result<(), StoreError> {
        let mut guard = self.cache.lock().await;
        if guard.is_none() {
            *guard = Some(self.read_file().await?);
        }
        let Some(data) = guard.as_mut() else {
            return Err(StoreError::Corrupt("store cache unavailable".to_string()));
        };

        let mut next = data.clone();
        let old = mutate(&mut next);
        let new = next.get(key).cloned();
        if old == new {
            return Ok(());
        }

        self.write_file(&next).await?;
        *data = next;
        drop(guard);

        let _ = self.changes.send(StorageChange::single(key, old, new));
        Ok(())
    }
}

impl StorageBackend for JsonFileBackend {
    async fn get(&self, key: &str) -> Result<Option<serde_json::Value>, StoreError> {
        let mut guard = self.cache.lock().await;
        if guard.is_none() {
            *guard = Some(self.read_file().await?);
        }
        Ok(guard.as_ref().and_then(|data| data.get(key).cloned()))
    }

    async fn set(&self, key: &str, value: serde_json::Value) -> Result<(), StoreError> {
        self.modify(key, |data| data.insert(key.to_string(), value))
            .await
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.modify(key, |data| data.remove(key)).await
    }

    fn subscribe(&self) -> broadcast::Receiver<StorageChange> {
        self.changes.subscribe()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
