//! Route definitions for store-wide note operations.
//!
//! Mounted at `/notes` by `api_routes()`.

use axum::routing::delete;
use axum::Router;

use crate::handlers::notes;
use crate::state::AppState;

/// ```text
/// DELETE /    -> clear_all
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/", delete(notes::clear_all))
}
