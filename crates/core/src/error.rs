#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Shorthand for a missing note inside an entry.
    pub fn note_not_found(note_id: &str) -> Self {
        Self::NotFound {
            entity: "Note",
            id: note_id.to_string(),
        }
    }

    /// Shorthand for a video that has no stored entry.
    pub fn entry_not_found(video_id: &str) -> Self {
        Self::NotFound {
            entity: "VideoEntry",
            id: video_id.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
