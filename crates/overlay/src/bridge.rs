//! Change-propagation bridge.
//!
//! Connects store changes to the attached overlay. A relevant change never
//! renders its own payload: the entry is read back from the store so that
//! whatever landed last is what gets shown.

use tokio::sync::broadcast::error::RecvError;
use ytnote_events::EntryChange;
use ytnote_store::{AnnotationStore, StorageBackend};

use crate::host::HostPage;
use crate::overlay::OverlayInstance;

/// What to do with a store notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Propagation {
    /// Re-read the attached entry and re-render.
    Refresh,
    /// The change concerns another video.
    Ignore,
    /// The store's channel closed; no further changes will arrive.
    Closed,
}

/// Decide how a received notification affects the overlay for `attached`.
pub fn classify(received: &Result<EntryChange, RecvError>, attached: Option<&str>) -> Propagation {
    match received {
        Ok(change) => match attached {
            Some(video_id) if change.affects(video_id) => Propagation::Refresh,
            _ => Propagation::Ignore,
        },
        // Missed changes may include ours.
        Err(RecvError::Lagged(skipped)) => {
            tracing::warn!(skipped, "Store change receiver lagged, refreshing");
            if attached.is_some() {
                Propagation::Refresh
            } else {
                Propagation::Ignore
            }
        }
        Err(RecvError::Closed) => Propagation::Closed,
    }
}

/// Re-render `overlay` from a fresh snapshot of its entry.
pub async fn refresh<H, B>(overlay: &mut OverlayInstance<H>, store: &AnnotationStore<B>)
where
    H: HostPage,
    B: StorageBackend,
{
    let entry = store.get_entry(overlay.video_id()).await;
    tracing::debug!(
        video_id = %overlay.video_id(),
        notes = entry.as_ref().map_or(0, |e| e.notes.len()),
        "Re-rendering overlay"
    );
    overlay.render(entry.as_ref());
}
