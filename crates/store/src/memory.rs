//! In-memory storage backend.
//!
//! Cloning a [`MemoryBackend`] yields another handle onto the same map and
//! change channel, which is how tests model several tabs open at once.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, RwLock};

use crate::backend::{StorageBackend, StorageChange, CHANGE_CHANNEL_CAPACITY};
use crate::error::StoreError;

struct MemoryInner {
    data: RwLock<BTreeMap<String, serde_json::Value>>,
    changes: broadcast::Sender<StorageChange>,
    /// Simulated round-trip delay applied before every operation.
    latency: Duration,
}

/// Shared, in-process key/value map.
#[derive(Clone)]
pub struct MemoryBackend {
    inner: Arc<MemoryInner>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::with_latency(Duration::ZERO)
    }

    /// A backend whose every operation first waits `latency`.
    ///
    /// Under paused tokio time this makes the interleaving of concurrent
    /// read-modify-write cycles deterministic.
    pub fn with_latency(latency: Duration) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(MemoryInner {
                data: RwLock::new(BTreeMap::new()),
                changes,
                latency,
            }),
        }
    }

    async fn simulate_latency(&self) {
        if !self.inner.latency.is_zero() {
            tokio::time::sleep(self.inner.latency).await;
        }
    }

    /// Number of keys currently stored.
    pub async fn len(&self) -> usize {
        self.inner.data.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    fn notify(&self, change: StorageChange) {
        // No receivers simply means nobody is listening yet.
        let _ = self.inner.changes.send(change);
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl StorageBackend for MemoryBackend {
    async fn get(&self, key: &str) -> Result<Option<serde_json::Value>, StoreError> {
        self.simulate_latency().await;
        Ok(self.inner.data.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: serde_json::Value) -> Result<(), StoreError> {
        self.simulate_latency().await;
        let old = self
            .inner
            .data
            .write()
            .await
            .insert(key.to_string(), value.clone());

        if old.as_ref() != Some(&value) {
            self.notify(StorageChange::single(key, old, Some(value)));
        }
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.simulate_latency().await;
        let old = self.inner.data.write().await.remove(key);

        if old.is_some() {
            self.notify(StorageChange::single(key, old, None));
        }
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<StorageChange> {
        self.inner.changes.subscribe()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
