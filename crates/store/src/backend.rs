//! Key/value persistence backends.
//!
//! A backend offers asynchronous get/set/remove of JSON values by key and a
//! broadcast of every change it applies, whichever handle performed it. Two
//! [`AnnotationStore`](crate::AnnotationStore)s sharing one backend behave
//! like two browser tabs sharing extension storage.

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::error::StoreError;
use crate::file::JsonFileBackend;
use crate::memory::MemoryBackend;

/// Broadcast channel capacity for backend change notifications.
pub const CHANGE_CHANNEL_CAPACITY: usize = 256;

// ---------------------------------------------------------------------------
// Change notifications
// ---------------------------------------------------------------------------

/// Storage area a change was applied to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageArea {
    Local,
}

/// Old and new value of a single key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueChange {
    pub old_value: Option<serde_json::Value>,
    pub new_value: Option<serde_json::Value>,
}

/// A set of key changes applied together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageChange {
    pub area: StorageArea,
    pub changes: BTreeMap<String, ValueChange>,
}

impl StorageChange {
    /// A local-area change touching a single key.
    pub fn single(
        key: impl Into<String>,
        old_value: Option<serde_json::Value>,
        new_value: Option<serde_json::Value>,
    ) -> Self {
        let mut changes = BTreeMap::new();
        changes.insert(
            key.into(),
            ValueChange {
                old_value,
                new_value,
            },
        );
        Self {
            area: StorageArea::Local,
            changes,
        }
    }
}

// ---------------------------------------------------------------------------
// StorageBackend
// ---------------------------------------------------------------------------

/// Asynchronous key/value storage with change notification.
///
/// Operations issued from one caller on the same key are applied in order.
/// Nothing stronger is guaranteed across callers.
pub trait StorageBackend: Send + Sync + 'static {
    /// Read the value stored under `key`.
    fn get(
        &self,
        key: &str,
    ) -> impl Future<Output = Result<Option<serde_json::Value>, StoreError>> + Send;

    /// Store `value` under `key`, replacing any previous value.
    fn set(
        &self,
        key: &str,
        value: serde_json::Value,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Delete `key`. Deleting a missing key is not an error.
    fn remove(&self, key: &str) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Receive every change applied to this backend from now on.
    fn subscribe(&self) -> broadcast::Receiver<StorageChange>;
}

// ---------------------------------------------------------------------------
// Backend
// ---------------------------------------------------------------------------

/// Runtime-selected backend, used where the concrete type is configuration.
#[derive(Clone)]
pub enum Backend {
    Memory(MemoryBackend),
    File(Arc<JsonFileBackend>),
}

impl Backend {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Memory(_) => "memory",
            Self::File(_) => "file",
        }
    }
}

impl From<MemoryBackend> for Backend {
    fn from(backend: MemoryBackend) -> Self {
        Self::Memory(backend)
    }
}

impl From<JsonFileBackend> for Backend {
    fn from(backend: JsonFileBackend) -> Self {
        Self::File(Arc::new(backend))
    }
}

impl StorageBackend for Backend {
    async fn get(&self, key: &str) -> Result<Option<serde_json::Value>, StoreError> {
        match self {
            Self::Memory(b) => b.get(key).await,
            Self::File(b) => b.get(key).await,
        }
    }

    async fn set(&self, key: &str, value: serde_json::Value) -> Result<(), StoreError> {
        match self {
            Self::Memory(b) => b.set(key, value).await,
            Self::File(b) => b.set(key, value).await,
        }
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        match self {
            Self::Memory(b) => b.remove(key).await,
            Self::File(b) => b.remove(key).await,
        }
    }

    fn subscribe(&self) -> broadcast::Receiver<StorageChange> {
        match self {
            Self::Memory(b) => b.subscribe(),
            Self::File(b) => b.subscribe(),
        }
    }
}
