use std::time::Duration;

use tokio::sync::broadcast;
use ytnote_core::PageSnapshot;
use ytnote_events::EntryChange;
use ytnote_store::{AnnotationStore, MemoryBackend};

pub const VIDEO: &str = "abc123";

/// Page snapshot for [`VIDEO`], as seen from a watch page.
pub fn watch_page() -> PageSnapshot {
    PageSnapshot::new(
        "Rust in Production",
        format!("https://www.youtube.com/watch?v={VIDEO}&list=PL1&t=90s"),
    )
}

/// A store over a fresh in-memory backend.
pub fn memory_store() -> AnnotationStore<MemoryBackend> {
    AnnotationStore::new(MemoryBackend::new())
}

/// Wait (bounded) for the next entry change.
pub async fn next_change(rx: &mut broadcast::Receiver<EntryChange>) -> EntryChange {
    tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("timed out waiting for an entry change")
        .expect("entry change channel closed")
}
