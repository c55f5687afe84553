//! Note search across all videos.
//!
//! Backs the management surface listing: a case-insensitive substring match
//! over the video title, note text and formatted timestamp, grouped by video.

use serde::Serialize;

use crate::note::{Note, NotesMap, VideoEntry};
use crate::time_format::format_time;
use crate::types::VideoId;

/// Notes of one video that matched a query.
#[derive(Debug, Clone, Serialize)]
pub struct SearchGroup {
    pub video_id: VideoId,
    pub title: String,
    pub url: String,
    /// Notes stored for the video, matched or not.
    pub total_notes: usize,
    /// Matching notes, ordered by time.
    pub notes: Vec<Note>,
}

/// Result of [`search_notes`].
#[derive(Debug, Clone, Serialize)]
pub struct SearchResults {
    pub query: String,
    pub total_matches: usize,
    pub groups: Vec<SearchGroup>,
}

/// Entries ordered for listing: most notes first, then by video id.
pub fn entries_by_note_count(map: &NotesMap) -> Vec<&VideoEntry> {
    let mut entries: Vec<&VideoEntry> = map.values().collect();
    entries.sort_by(|a, b| {
        b.notes
            .len()
            .cmp(&a.notes.len())
            .then_with(|| a.video_id.cmp(&b.video_id))
    });
    entries
}

fn note_matches(entry: &VideoEntry, note: &Note, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }
    let haystack = format!("{} {} {}", entry.title, note.text, format_time(note.time));
    haystack.to_lowercase().contains(needle)
}

/// Filter every stored note against `query`.
///
/// A blank query matches everything. Videos with no matching notes are
/// omitted.
pub fn search_notes(map: &NotesMap, query: &str) -> SearchResults {
    let needle = query.trim().to_lowercase();

    let groups: Vec<SearchGroup> = entries_by_note_count(map)
        .into_iter()
        .filter_map(|entry| {
            let notes: Vec<Note> = entry
                .sorted_notes()
                .into_iter()
                .filter(|note| note_matches(entry, note, &needle))
                .cloned()
                .collect();
            (!notes.is_empty()).then(|| SearchGroup {
                video_id: entry.video_id.clone(),
                title: entry.title.clone(),
                url: entry.url.clone(),
                total_notes: entry.notes.len(),
                notes,
            })
        })
        .collect();

    SearchResults {
        query: query.trim().to_string(),
        total_matches: groups.iter().map(|g| g.notes.len()).sum(),
        groups,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
