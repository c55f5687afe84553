//! Backend change relay.
//!
//! [`ChangeRelay`] listens to raw backend changes, picks out the notes
//! mapping key, and republishes the difference as one
//! [`EntryChange`](ytnote_events::EntryChange) per affected video. It runs
//! as a background task owned by an [`AnnotationStore`](crate::AnnotationStore).

use std::sync::Arc;

use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use ytnote_core::NotesMap;
use ytnote_events::{diff_maps, EventBus};

use crate::backend::StorageChange;

/// Background task translating backend changes into entry changes.
pub struct ChangeRelay;

impl ChangeRelay {
    /// Run until `cancel` fires or the backend's change channel closes.
    pub async fn run(
        key: &'static str,
        bus: Arc<EventBus>,
        mut receiver: broadcast::Receiver<StorageChange>,
        cancel: CancellationToken,
    ) {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::debug!("Change relay cancelled");
                    break;
                }
                received = receiver.recv() => match received {
                    Ok(change) => Self::relay(key, &bus, &change),
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!(
                            skipped = n,
                            "Change relay lagged, some entry changes were not published"
                        );
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        tracing::debug!("Backend change channel closed, relay shutting down");
                        break;
                    }
                }
            }
        }
    }

    fn relay(key: &str, bus: &EventBus, change: &StorageChange) {
        let Some(value_change) = change.changes.get(key) else {
            return;
        };

        let old = decode_map(value_change.old_value.as_ref());
        let new = decode_map(value_change.new_value.as_ref());
        let changes = diff_maps(&old, &new);

        tracing::debug!(videos = changes.len(), "Relaying notes change");
        for entry_change in changes {
            bus.publish(entry_change);
        }
    }
}

/// Decode a persisted mapping, treating absent or malformed values as empty.
pub fn decode_map(value: Option<&serde_json::Value>) -> NotesMap {
    let Some(value) = value else {
        return NotesMap::new();
    };
    match serde_json::from_value(value.clone()) {
        Ok(map) => map,
        Err(e) => {
            tracing::warn!(error = %e, "Ignoring malformed notes mapping in change notification");
            NotesMap::new()
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
