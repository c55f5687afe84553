//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] fans out [`EntryChange`]s to every component that renders
//! notes. It is designed to be shared via `Arc<EventBus>`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use ytnote_core::types::VideoId;
use ytnote_core::VideoEntry;

// ---------------------------------------------------------------------------
// EntryChange
// ---------------------------------------------------------------------------

/// The stored entry for one video changed.
///
/// `entry` is the value after the change, or `None` when the entry was
/// removed. Consumers that render must still re-read the store rather than
/// trust this payload; a later write may already have landed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryChange {
    pub video_id: VideoId,
    pub entry: Option<VideoEntry>,
    /// When the change was observed (UTC).
    pub observed_at: DateTime<Utc>,
}

impl EntryChange {
    pub fn new(video_id: impl Into<VideoId>, entry: Option<VideoEntry>) -> Self {
        Self {
            video_id: video_id.into(),
            entry,
            observed_at: Utc::now(),
        }
    }

    /// Whether this change concerns `video_id`.
    pub fn affects(&self, video_id: &str) -> bool {
        self.video_id == video_id
    }

    pub fn is_removal(&self) -> bool {
        self.entry.is_none()
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 256;

/// In-process fan-out event bus.
///
/// # Usage
///
/// ```rust
/// use ytnote_events::bus::{EntryChange, EventBus};
///
/// let bus = EventBus::default();
/// let mut rx = bus.subscribe();
///
/// bus.publish(EntryChange::new("abc123", None));
/// ```
pub struct EventBus {
    sender: broadcast::Sender<EntryChange>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full the oldest un-consumed changes are dropped
    /// and slow receivers observe `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish a change to all current subscribers.
    ///
    /// With no subscribers the change is silently dropped.
    pub fn publish(&self, change: EntryChange) {
        tracing::trace!(
            video_id = %change.video_id,
            removed = change.is_removal(),
            "Publishing entry change"
        );
        // Ignore the SendError: it only means there are zero receivers.
        let _ = self.sender.send(change);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EntryChange> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
