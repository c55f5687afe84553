//! Per-video diffing of whole-mapping snapshots.
//!
//! The backend reports changes at the granularity of its keys, and the whole
//! notes mapping lives under one key. Subscribers care about single videos,
//! so each backend change is split into one [`EntryChange`] per video whose
//! entry differs between the two snapshots.

use ytnote_core::NotesMap;

use crate::bus::EntryChange;

/// Changes needed to go from `old` to `new`, ordered by video id.
pub fn diff_maps(old: &NotesMap, new: &NotesMap) -> Vec<EntryChange> {
    let mut changes = Vec::new();

    for (video_id, entry) in new {
        if old.get(video_id) != Some(entry) {
            changes.push(EntryChange::new(video_id.clone(), Some(entry.clone())));
        }
    }
    for video_id in old.keys() {
        if !new.contains_key(video_id) {
            changes.push(EntryChange::new(video_id.clone(), None));
        }
    }

    changes.sort_by(|a, b| a.video_id.cmp(&b.video_id));
    changes
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
