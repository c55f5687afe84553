//! Handlers for per-video entries.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use ytnote_core::error::CoreError;
use ytnote_core::search::entries_by_note_count;
use ytnote_core::types::VideoId;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /videos
///
/// Every stored entry, most notes first.
pub async fn list_videos(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let map = state.store.load_all().await?;
    let entries: Vec<_> = entries_by_note_count(&map).into_iter().cloned().collect();

    Ok(Json(DataResponse { data: entries }))
}

/// GET /videos/{video_id}
pub async fn get_video(
    State(state): State<AppState>,
    Path(video_id): Path<VideoId>,
) -> AppResult<impl IntoResponse> {
    let entry = state
        .store
        .load_all()
        .await?
        .remove(&video_id)
        .ok_or_else(|| AppError::Core(CoreError::entry_not_found(&video_id)))?;

    Ok(Json(DataResponse { data: entry }))
}

/// DELETE /videos/{video_id}
///
/// Remove every note of the video.
pub async fn delete_video(
    State(state): State<AppState>,
    Path(video_id): Path<VideoId>,
) -> AppResult<StatusCode> {
    if !state.store.remove_all_for_video(&video_id).await? {
        return Err(AppError::Core(CoreError::entry_not_found(&video_id)));
    }

    tracing::info!(%video_id, "Video notes deleted via API");
    Ok(StatusCode::NO_CONTENT)
}
