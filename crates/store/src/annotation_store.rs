//! The annotation store.
//!
//! [`AnnotationStore`] owns every [`VideoEntry`]. The whole mapping is kept
//! under a single backend key ([`NOTES_KEY`]) and every mutation is a
//! read-modify-write of that mapping. Nothing makes this cycle
//! transactional: two overlapping cycles resolve to whichever write lands
//! last. Subscribers learn about writes only through [`AnnotationStore::subscribe`].

use std::sync::Arc;

use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use ytnote_core::note::{normalize_text, now_millis, validate_time};
use ytnote_core::search::{search_notes, SearchResults};
use ytnote_core::transfer::{export_json, merge_import, parse_import, ImportSummary, MergeStrategy};
use ytnote_core::{CoreError, Note, NotesMap, PageSnapshot, VideoEntry};
use ytnote_events::{EntryChange, EventBus};

use crate::backend::StorageBackend;
use crate::error::StoreError;
use crate::relay::ChangeRelay;

/// Backend key holding the `videoId -> VideoEntry` mapping.
pub const NOTES_KEY: &str = "notesByVideo";

/// Keyed persistence of per-video notes.
pub struct AnnotationStore<B: StorageBackend> {
    backend: B,
    bus: Arc<EventBus>,
    /// Stops the change relay when the store is dropped.
    relay_cancel: CancellationToken,
}

impl<B: StorageBackend> AnnotationStore<B> {
    /// Wrap `backend` and start relaying its changes.
    ///
    /// Must be called from within a tokio runtime: the relay runs as a
    /// spawned task for as long as the store lives.
    pub fn new(backend: B) -> Self {
        let bus = Arc::new(EventBus::default());
        let relay_cancel = CancellationToken::new();

        tokio::spawn(ChangeRelay::run(
            NOTES_KEY,
            Arc::clone(&bus),
            backend.subscribe(),
            relay_cancel.clone(),
        ));

        Self {
            backend,
            bus,
            relay_cancel,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Receive a change for every video whose entry changes, whoever wrote it.
    pub fn subscribe(&self) -> broadcast::Receiver<EntryChange> {
        self.bus.subscribe()
    }

    // -----------------------------------------------------------------------
    // Mapping I/O
    // -----------------------------------------------------------------------

    async fn read_map(&self) -> Result<NotesMap, StoreError> {
        match self.backend.get(NOTES_KEY).await? {
            None => Ok(NotesMap::new()),
            Some(value) => serde_json::from_value(value)
                .map_err(|e| StoreError::Corrupt(format!("notes mapping is malformed: {e}"))),
        }
    }

    async fn write_map(&self, map: &NotesMap) -> Result<(), StoreError> {
        let value = serde_json::to_value(map)?;
        self.backend.set(NOTES_KEY, value).await
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    /// The entry for `video_id`, if any.
    ///
    /// Never fails: an unreadable backend is logged and reported as absent.
    pub async fn get_entry(&self, video_id: &str) -> Option<VideoEntry> {
        match self.read_map().await {
            Ok(mut map) => map.remove(video_id),
            Err(e) => {
                tracing::warn!(
                    video_id,
                    error = %e,
                    "Failed to read notes, treating entry as absent"
                );
                None
            }
        }
    }

    /// The full mapping, for the management surface.
    pub async fn load_all(&self) -> Result<NotesMap, StoreError> {
        self.read_map().await
    }

    pub async fn search(&self, query: &str) -> Result<SearchResults, StoreError> {
        Ok(search_notes(&self.read_map().await?, query))
    }

    // -----------------------------------------------------------------------
    // Note CRUD
    // -----------------------------------------------------------------------

    /// Append a note at `time` to the entry for `video_id`.
    ///
    /// Creates the entry on first use and refreshes its title/URL snapshot
    /// from `page`. Blank `text` is a no-op and returns `Ok(None)`.
    pub async fn add_note(
        &self,
        video_id: &str,
        time: f64,
        text: &str,
        page: &PageSnapshot,
    ) -> Result<Option<Note>, StoreError> {
        let Some(text) = normalize_text(text) else {
            tracing::debug!(video_id, "Ignoring blank note");
            return Ok(None);
        };
        if video_id.is_empty() {
            return Err(CoreError::Validation("video id must not be empty".to_string()).into());
        }
        let time = validate_time(time)?;

        let mut map = self.read_map().await?;
        let entry = map
            .remove(video_id)
            .unwrap_or_else(|| VideoEntry::new(video_id, page))
            .with_page(page);
        let note = Note::new(time, text);
        let entry = entry.with_note_added(note.clone())?;
        map.insert(video_id.to_string(), entry);
        self.write_map(&map).await?;

        tracing::info!(video_id, note_id = %note.id, time = note.time, "Note added");
        Ok(Some(note))
    }

    /// Replace the text of an existing note.
    ///
    /// Blank `text` is a no-op (`Ok(None)`). A vanished entry or note yields
    /// a not-found error and writes nothing.
    pub async fn update_note(
        &self,
        video_id: &str,
        note_id: &str,
        text: &str,
    ) -> Result<Option<Note>, StoreError> {
        let Some(text) = normalize_text(text) else {
            tracing::debug!(video_id, note_id, "Ignoring blank note edit");
            return Ok(None);
        };

        let mut map = self.read_map().await?;
        let entry = map
            .remove(video_id)
            .ok_or_else(|| CoreError::entry_not_found(video_id))?;
        let (entry, note) = entry.with_note_text(note_id, text, now_millis())?;
        map.insert(video_id.to_string(), entry);
        self.write_map(&map).await?;

        tracing::info!(video_id, note_id, "Note updated");
        Ok(Some(note))
    }

    /// Remove a note, returning it.
    ///
    /// An entry left without notes is pruned from the mapping.
    pub async fn delete_note(&self, video_id: &str, note_id: &str) -> Result<Note, StoreError> {
        let mut map = self.read_map().await?;
        let entry = map
            .remove(video_id)
            .ok_or_else(|| CoreError::entry_not_found(video_id))?;
        let (entry, removed) = entry.without_note(note_id)?;
        let pruned = entry.is_empty();
        if !pruned {
            map.insert(video_id.to_string(), entry);
        }
        self.write_map(&map).await?;

        tracing::info!(video_id, note_id, pruned, "Note deleted");
        Ok(removed)
    }

    // -----------------------------------------------------------------------
    // Bulk operations
    // -----------------------------------------------------------------------

    /// Drop every note of `video_id`. Returns whether an entry existed.
    pub async fn remove_all_for_video(&self, video_id: &str) -> Result<bool, StoreError> {
        let mut map = self.read_map().await?;
        let existed = map.remove(video_id).is_some();
        if existed {
            self.write_map(&map).await?;
            tracing::info!(video_id, "All notes removed for video");
        }
        Ok(existed)
    }

    /// Delete the whole mapping.
    pub async fn clear_all(&self) -> Result<(), StoreError> {
        self.backend.remove(NOTES_KEY).await?;
        tracing::info!("All notes cleared");
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Export / import
    // -----------------------------------------------------------------------

    pub async fn export_json(&self) -> Result<String, StoreError> {
        Ok(export_json(&self.read_map().await?)?)
    }

    /// Import a previously exported mapping.
    ///
    /// The payload is validated in full before anything is written; a
    /// malformed payload changes nothing.
    pub async fn import_json(
        &self,
        payload: &str,
        strategy: MergeStrategy,
    ) -> Result<ImportSummary, StoreError> {
        let imported = parse_import(payload)?;

        let existing = self.read_map().await?;
        let (merged, summary) = merge_import(existing, imported, strategy);
        self.write_map(&merged).await?;

        tracing::info!(
            strategy = strategy.as_str(),
            videos_added = summary.videos_added,
            videos_updated = summary.videos_updated,
            notes = summary.notes_imported,
            "Notes imported"
        );
        Ok(summary)
    }
}

impl<B: StorageBackend> Drop for AnnotationStore<B> {
    fn drop(&mut self) {
        self.relay_cancel.cancel();
    }
}
