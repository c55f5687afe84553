/// Opaque video identifier as used by the host platform (the `v` parameter).
pub type VideoId = String;

/// Opaque note identifier, unique within its owning entry.
pub type NoteId = String;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
