pub mod health;
pub mod notes;
pub mod transfer;
pub mod videos;

use axum::routing::get;
use axum::Router;

use crate::handlers;
use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /videos                                          list
/// /videos/{video_id}                               get, delete
/// /videos/{video_id}/notes                         create
/// /videos/{video_id}/notes/{note_id}               update, delete
///
/// /notes                                           clear all (DELETE)
/// /search                                          search (?q)
///
/// /export                                          export mapping (GET)
/// /import                                          import mapping (POST, ?strategy)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/videos", videos::router())
        .nest("/notes", notes::router())
        .route("/search", get(handlers::search::search_notes))
        .merge(transfer::router())
}
