//! Export/import of the full notes mapping.
//!
//! The export format is the persisted mapping itself, pretty-printed. Import
//! is all-or-nothing: a payload is fully parsed and validated before any of
//! it is merged, so a malformed file never partially applies.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::note::{NotesMap, VideoEntry};

/// Suggested file name for exported notes.
pub const EXPORT_FILE_NAME: &str = "youtube-notes.json";

/// How an imported entry combines with one already stored for the same video.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MergeStrategy {
    /// The imported entry replaces the stored one wholesale.
    #[default]
    #[serde(rename = "replace")]
    ReplaceEntry,
    /// Notes are merged by id: imported notes overwrite same-id notes, new
    /// ids are appended. Title and URL come from the import.
    #[serde(rename = "merge")]
    MergeNotes,
}

impl MergeStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ReplaceEntry => "replace",
            Self::MergeNotes => "merge",
        }
    }
}

/// Counters describing what an import changed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSummary {
    /// Videos that were not present before.
    pub videos_added: usize,
    /// Videos that existed and were replaced or merged into.
    pub videos_updated: usize,
    /// Notes carried by the applied entries.
    pub notes_imported: usize,
}

/// Serialize the mapping for export.
pub fn export_json(map: &NotesMap) -> Result<String, CoreError> {
    serde_json::to_string_pretty(map)
        .map_err(|e| CoreError::Internal(format!("failed to serialize notes: {e}")))
}

/// Parse and validate an import payload.
pub fn parse_import(payload: &str) -> Result<NotesMap, CoreError> {
    let value: serde_json::Value = serde_json::from_str(payload)
        .map_err(|e| CoreError::Validation(format!("import is not valid JSON: {e}")))?;

    if !value.is_object() {
        return Err(CoreError::Validation(
            "import must be a JSON object keyed by video id".to_string(),
        ));
    }

    let map: NotesMap = serde_json::from_value(value)
        .map_err(|e| CoreError::Validation(format!("import has an invalid entry: {e}")))?;

    for (key, entry) in &map {
        validate_imported_entry(key, entry)?;
    }

    Ok(map)
}

fn validate_imported_entry(key: &str, entry: &VideoEntry) -> Result<(), CoreError> {
    if key.is_empty() {
        return Err(CoreError::Validation(
            "import contains an empty video id".to_string(),
        ));
    }
    if entry.video_id != key {
        return Err(CoreError::Validation(format!(
            "entry under '{key}' declares videoId '{}'",
            entry.video_id
        )));
    }

    let mut seen = HashSet::new();
    for note in &entry.notes {
        if !seen.insert(note.id.as_str()) {
            return Err(CoreError::Validation(format!(
                "video '{key}' contains duplicate note id '{}'",
                note.id
            )));
        }
        if !note.time.is_finite() || note.time < 0.0 {
            return Err(CoreError::Validation(format!(
                "note '{}' in video '{key}' has invalid time {}",
                note.id, note.time
            )));
        }
        if note.text.trim().is_empty() {
            return Err(CoreError::Validation(format!(
                "note '{}' in video '{key}' has empty text",
                note.id
            )));
        }
    }

    Ok(())
}

/// Merge a validated import into the stored mapping.
pub fn merge_import(
    mut existing: NotesMap,
    imported: NotesMap,
    strategy: MergeStrategy,
) -> (NotesMap, ImportSummary) {
    let mut summary = ImportSummary::default();

    for (video_id, incoming) in imported {
        let merged = match (existing.remove(&video_id), strategy) {
            (None, _) => {
                summary.videos_added += 1;
                incoming
            }
            (Some(_), MergeStrategy::ReplaceEntry) => {
                summary.videos_updated += 1;
                incoming
            }
            (Some(current), MergeStrategy::MergeNotes) => {
                summary.videos_updated += 1;
                merge_notes(current, incoming)
            }
        };

        summary.notes_imported += merged.notes.len();
        existing.insert(video_id, merged);
    }

    (existing, summary)
}

fn merge_notes(current: VideoEntry, incoming: VideoEntry) -> VideoEntry {
    let mut notes = current.notes;
    for note in incoming.notes {
        match notes.iter_mut().find(|n| n.id == note.id) {
            Some(slot) => *slot = note,
            None => notes.push(note),
        }
    }
    VideoEntry {
        video_id: incoming.video_id,
        title: incoming.title,
        url: incoming.url,
        notes,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::note::{Note, PageSnapshot};
    use assert_matches::assert_matches;

    fn entry(id: &str, texts: &[&str]) -> VideoEntry {
        let page = PageSnapshot::new(
            format!("Video {id}"),
            format!("https://www.youtube.com/watch?v={id}"),
        );
        texts
            .iter()
            .enumerate()
            .fold(VideoEntry::new(id, &page), |e, (i, text)| {
                e.with_note_added(Note::new(i as f64 * 10.0, *text)).unwrap()
            })
    }

    fn map_of(entries: Vec<VideoEntry>) -> NotesMap {
        entries.into_iter().map(|e| (e.video_id.clone(), e)).collect()
    }

    #[test]
    fn export_then_parse_round_trips() {
        let map = map_of(vec![entry("a", &["one", "two"]), entry("b", &["three"])]);
        let json = export_json(&map).unwrap();
        assert_eq!(parse_import(&json).unwrap(), map);
    }

    #[test]
    fn rejects_non_json() {
        assert_matches!(parse_import("not json"), Err(CoreError::Validation(_)));
    }

    #[test]
    fn rejects_non_object() {
        assert_matches!(parse_import("[1, 2]"), Err(CoreError::Validation(_)));
    }

    #[test]
    fn rejects_mismatched_video_id() {
        let payload = r#"{"a": {"videoId": "b", "notes": []}}"#;
        assert_matches!(parse_import(payload), Err(CoreError::Validation(_)));
    }

    #[test]
    fn rejects_duplicate_note_ids() {
        let payload = r#"{"a": {"videoId": "a", "notes": [
            {"id": "n_1", "time": 1, "text": "x", "createdAt": 1},
            {"id": "n_1", "time": 2, "text": "y", "createdAt": 2}
        ]}}"#;
        assert_matches!(parse_import(payload), Err(CoreError::Validation(_)));
    }

    #[test]
    fn rejects_whole_payload_on_one_bad_note() {
        let payload = r#"{
            "a": {"videoId": "a", "notes": [
                {"id": "n_1", "time": 1, "text": "ok", "createdAt": 1}
            ]},
            "b": {"videoId": "b", "notes": [
                {"id": "n_2", "time": -4, "text": "bad", "createdAt": 1}
            ]}
        }"#;
        assert_matches!(parse_import(payload), Err(CoreError::Validation(_)));
    }

    #[test]
    fn replace_strategy_swaps_whole_entry() {
        let existing = map_of(vec![entry("a", &["old one", "old two"]), entry("b", &["keep"])]);
        let imported = map_of(vec![entry("a", &["new"]), entry("c", &["fresh"])]);

        let (merged, summary) = merge_import(existing, imported, MergeStrategy::ReplaceEntry);

        assert_eq!(merged["a"].notes.len(), 1);
        assert_eq!(merged["a"].notes[0].text, "new");
        assert_eq!(merged["b"].notes[0].text, "keep");
        assert!(merged.contains_key("c"));
        assert_eq!(summary.videos_added, 1);
        assert_eq!(summary.videos_updated, 1);
        assert_eq!(summary.notes_imported, 2);
    }

    #[test]
    fn merge_strategy_unions_by_note_id() {
        let current = entry("a", &["first", "second"]);
        let mut incoming = current.clone();
        incoming.notes[0].text = "first (edited)".into();
        incoming.notes.remove(1);
        let incoming = incoming.with_note_added(Note::new(99.0, "third")).unwrap();

        let (merged, summary) = merge_import(
            map_of(vec![current]),
            map_of(vec![incoming]),
            MergeStrategy::MergeNotes,
        );

        let texts: Vec<&str> = merged["a"].notes.iter().map(|n| n.text.as_str()).collect();
        assert_eq!(texts, vec!["first (edited)", "second", "third"]);
        assert_eq!(summary.videos_updated, 1);
        assert_eq!(summary.notes_imported, 3);
    }

    #[test]
    fn empty_imported_entries_are_kept() {
        let imported = map_of(vec![entry("a", &[])]);
        let (merged, summary) =
            merge_import(NotesMap::new(), imported.clone(), MergeStrategy::ReplaceEntry);
        assert_eq!(merged, imported);
        assert_eq!(summary.videos_added, 1);
        assert_eq!(summary.notes_imported, 0);
    }

    #[test]
    fn empty_imported_entry_replaces_stored_notes() {
        let existing = map_of(vec![entry("a", &["kept?"])]);
        let imported = map_of(vec![entry("a", &[])]);

        let (replaced, _) =
            merge_import(existing.clone(), imported.clone(), MergeStrategy::ReplaceEntry);
        assert!(replaced["a"].notes.is_empty());

        let (merged, summary) = merge_import(existing, imported, MergeStrategy::MergeNotes);
        assert_eq!(merged["a"].notes.len(), 1);
        assert_eq!(summary.videos_updated, 1);
    }

    #[test]
    fn strategy_serde_names() {
        assert_eq!(serde_json::to_string(&MergeStrategy::ReplaceEntry).unwrap(), "\"replace\"");
        let parsed: MergeStrategy = serde_json::from_str("\"merge\"").unwrap();
        assert_eq!(parsed, MergeStrategy::MergeNotes);
        assert_eq!(MergeStrategy::default(), MergeStrategy::ReplaceEntry);
    }
}
