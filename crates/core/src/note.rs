//! Note and video entry records.
//!
//! The persisted shape is the JSON mapping `videoId -> VideoEntry` written by
//! earlier releases, so field names are camelCase and timestamps are epoch
//! milliseconds. All mutation goes through value-returning functions on
//! [`VideoEntry`]; the store applies them inside a read-modify-write cycle.

use std::collections::BTreeMap;

use chrono::SubsecRound;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{NoteId, Timestamp, VideoId};
use crate::video_url::canonical_url;

/// Prefix for generated note identifiers.
pub const NOTE_ID_PREFIX: &str = "n_";

/// The full persisted mapping, keyed by video identifier.
pub type NotesMap = BTreeMap<VideoId, VideoEntry>;

// ---------------------------------------------------------------------------
// Note
// ---------------------------------------------------------------------------

/// A single timestamped annotation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: NoteId,
    /// Playback offset in seconds. Stored unclamped; duration may be unknown
    /// at save time.
    pub time: f64,
    pub text: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: Timestamp,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "chrono::serde::ts_milliseconds_option"
    )]
    pub updated_at: Option<Timestamp>,
}

impl Note {
    /// Create a note with a fresh identifier and creation timestamp.
    ///
    /// `time` and `text` are expected to be validated already (see
    /// [`validate_time`] and [`normalize_text`]).
    pub fn new(time: f64, text: impl Into<String>) -> Self {
        Self {
            id: new_note_id(),
            time,
            text: text.into(),
            created_at: now_millis(),
            updated_at: None,
        }
    }
}

/// Generate an opaque note identifier.
pub fn new_note_id() -> NoteId {
    format!("{NOTE_ID_PREFIX}{}", uuid::Uuid::now_v7().simple())
}

/// Current time truncated to the millisecond precision that is persisted.
pub fn now_millis() -> Timestamp {
    chrono::Utc::now().trunc_subsecs(3)
}

/// Trim note text. Blank input yields `None`, which callers treat as a no-op.
pub fn normalize_text(text: &str) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Validate a playback offset and round it to hundredths of a second.
pub fn validate_time(time: f64) -> Result<f64, CoreError> {
    if !time.is_finite() {
        return Err(CoreError::Validation(
            "note time must be a finite number".to_string(),
        ));
    }
    if time < 0.0 {
        return Err(CoreError::Validation(format!(
            "note time must be non-negative, got {time}"
        )));
    }
    Ok((time * 100.0).round() / 100.0)
}

// ---------------------------------------------------------------------------
// Page snapshot
// ---------------------------------------------------------------------------

/// Title and location of the page at the moment a note is saved.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageSnapshot {
    pub title: String,
    pub url: String,
}

impl PageSnapshot {
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// VideoEntry
// ---------------------------------------------------------------------------

/// Every note saved for one video, plus a snapshot of its title and URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoEntry {
    pub video_id: VideoId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
    /// Insertion order. Use [`VideoEntry::sorted_notes`] for display.
    #[serde(default)]
    pub notes: Vec<Note>,
}

impl VideoEntry {
    /// An empty entry for `video_id` carrying the given page snapshot.
    pub fn new(video_id: impl Into<VideoId>, page: &PageSnapshot) -> Self {
        Self {
            video_id: video_id.into(),
            title: String::new(),
            url: String::new(),
            notes: Vec::new(),
        }
        .with_page(page)
    }

    /// Refresh the title/URL snapshot (last write wins).
    pub fn with_page(mut self, page: &PageSnapshot) -> Self {
        self.title = page.title.clone();
        self.url = canonical_url(&page.url);
        self
    }

    /// Append `note`. Fails if its id is already present.
    pub fn with_note_added(mut self, note: Note) -> Result<Self, CoreError> {
        if self.note(&note.id).is_some() {
            return Err(CoreError::Conflict(format!(
                "note '{}' already exists in video '{}'",
                note.id, self.video_id
            )));
        }
        self.notes.push(note);
        Ok(self)
    }

    /// Replace the text of `note_id`, stamping `updated_at`.
    ///
    /// Returns the updated entry and the updated note.
    pub fn with_note_text(
        mut self,
        note_id: &str,
        text: impl Into<String>,
        at: Timestamp,
    ) -> Result<(Self, Note), CoreError> {
        let note = self
            .notes
            .iter_mut()
            .find(|n| n.id == note_id)
            .ok_or_else(|| CoreError::note_not_found(note_id))?;
        note.text = text.into();
        note.updated_at = Some(at);
        let updated = note.clone();
        Ok((self, updated))
    }

    /// Remove `note_id`. Returns the remaining entry and the removed note.
    pub fn without_note(mut self, note_id: &str) -> Result<(Self, Note), CoreError> {
        let index = self
            .notes
            .iter()
            .position(|n| n.id == note_id)
            .ok_or_else(|| CoreError::note_not_found(note_id))?;
        let removed = self.notes.remove(index);
        Ok((self, removed))
    }

    pub fn note(&self, note_id: &str) -> Option<&Note> {
        self.notes.iter().find(|n| n.id == note_id)
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    /// Notes ordered by time ascending. Ties keep insertion order.
    pub fn sorted_notes(&self) -> Vec<&Note> {
        let mut notes: Vec<&Note> = self.notes.iter().collect();
        notes.sort_by(|a, b| a.time.total_cmp(&b.time));
        notes
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
