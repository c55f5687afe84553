use ytnote_store::StoreError;

/// Errors surfaced to callers of a [`SessionHandle`](crate::SessionHandle).
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The command needs an attached video and none is attached.
    #[error("No video is attached")]
    NotAttached,

    /// The session task has stopped.
    #[error("Page session is closed")]
    Closed,
}
