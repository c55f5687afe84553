use ytnote_core::CoreError;

/// Errors raised by storage backends and the annotation store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A domain-level error from `ytnote_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The persisted value exists but does not have the expected shape.
    #[error("Corrupt storage: {0}")]
    Corrupt(String),
}

impl StoreError {
    /// A note or entry vanished between being displayed and being edited.
    ///
    /// Callers treat this as a benign race: re-render and move on.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Core(core) if core.is_not_found())
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Core(CoreError::Validation(_)))
    }
}
