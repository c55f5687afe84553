//! Route definitions for per-video entries and their notes.
//!
//! Mounted at `/videos` by `api_routes()`.

use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::{notes, videos};
use crate::state::AppState;

/// Video routes.
///
/// ```text
/// GET    /                              -> list_videos
/// GET    /{video_id}                    -> get_video
/// DELETE /{video_id}                    -> delete_video
/// POST   /{video_id}/notes              -> create_note
/// PUT    /{video_id}/notes/{note_id}    -> update_note
/// DELETE /{video_id}/notes/{note_id}    -> delete_note
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(videos::list_videos))
        .route(
            "/{video_id}",
            get(videos::get_video).delete(videos::delete_video),
        )
        .route("/{video_id}/notes", post(notes::create_note))
        .route(
            "/{video_id}/notes/{note_id}",
            put(notes::update_note).delete(notes::delete_note),
        )
}
