use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

/// Query parameters for note search.
#[derive(Debug, Deserialize)]
pub struct SearchParams {
    /// Case-insensitive substring. Missing or blank matches every note.
    pub q: Option<String>,
}

/// GET /search?q=
///
/// Matching notes grouped by video, most notes first.
pub async fn search_notes(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> AppResult<impl IntoResponse> {
    let query = params.q.unwrap_or_default();
    let results = state.store.search(&query).await?;

    tracing::debug!(query = %query, matches = results.total_matches, "Notes searched");
    Ok(Json(DataResponse { data: results }))
}
