use axum::routing::{get, post};
use axum::Router;

use crate::handlers::transfer;
use crate::state::AppState;

/// Export/import routes, merged at the `/api/v1` root.
///
/// ```text
/// GET    /export    -> export_notes
/// POST   /import    -> import_notes (?strategy)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/export", get(transfer::export_notes))
        .route("/import", post(transfer::import_notes))
}
