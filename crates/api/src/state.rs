use std::sync::Arc;

use ytnote_store::{AnnotationStore, Backend};

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc`).
#[derive(Clone)]
pub struct AppState {
    /// Notes store over the configured backend.
    pub store: Arc<AnnotationStore<Backend>>,
}
