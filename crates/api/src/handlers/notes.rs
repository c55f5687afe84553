//! Handlers for individual notes.
//!
//! Provides creating, editing and deleting notes of one video, plus
//! clearing every stored note.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use validator::Validate;
use ytnote_core::types::{NoteId, VideoId};
use ytnote_core::video_url::VIDEO_ID_PARAM;
use ytnote_core::PageSnapshot;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// Base URL used when a created note carries no page URL.
const DEFAULT_WATCH_URL: &str = "https://www.youtube.com/watch";

// ---------------------------------------------------------------------------
// Request bodies
// ---------------------------------------------------------------------------

/// Body for `POST /videos/{video_id}/notes`.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateNoteRequest {
    #[validate(range(min = 0.0))]
    pub time: f64,
    #[validate(length(min = 1, max = 10000))]
    pub text: String,
    /// Video title snapshot. Defaults to empty.
    pub title: Option<String>,
    /// Page URL snapshot. Defaults to the plain watch URL.
    #[validate(length(max = 2048))]
    pub url: Option<String>,
}

/// Body for `PUT /videos/{video_id}/notes/{note_id}`.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateNoteRequest {
    #[validate(length(min = 1, max = 10000))]
    pub text: String,
}

fn blank_text() -> AppError {
    AppError::BadRequest("note text must not be blank".to_string())
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /videos/{video_id}/notes
pub async fn create_note(
    State(state): State<AppState>,
    Path(video_id): Path<VideoId>,
    Json(input): Json<CreateNoteRequest>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;

    let url = input
        .url
        .unwrap_or_else(|| format!("{DEFAULT_WATCH_URL}?{VIDEO_ID_PARAM}={video_id}"));
    let page = PageSnapshot::new(input.title.unwrap_or_default(), url);

    let note = state
        .store
        .add_note(&video_id, input.time, &input.text, &page)
        .await?
        .ok_or_else(blank_text)?;

    tracing::info!(%video_id, note_id = %note.id, "Note created via API");
    Ok((StatusCode::CREATED, Json(DataResponse { data: note })))
}

/// PUT /videos/{video_id}/notes/{note_id}
pub async fn update_note(
    State(state): State<AppState>,
    Path((video_id, note_id)): Path<(VideoId, NoteId)>,
    Json(input): Json<UpdateNoteRequest>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;

    let note = state
        .store
        .update_note(&video_id, &note_id, &input.text)
        .await?
        .ok_or_else(blank_text)?;

    Ok(Json(DataResponse { data: note }))
}

/// DELETE /videos/{video_id}/notes/{note_id}
pub async fn delete_note(
    State(state): State<AppState>,
    Path((video_id, note_id)): Path<(VideoId, NoteId)>,
) -> AppResult<StatusCode> {
    state.store.delete_note(&video_id, &note_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /notes
///
/// Remove every stored note.
pub async fn clear_all(State(state): State<AppState>) -> AppResult<StatusCode> {
    state.store.clear_all().await?;
    tracing::warn!("All notes cleared via API");
    Ok(StatusCode::NO_CONTENT)
}
