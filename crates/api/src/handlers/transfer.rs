//! Handlers for exporting and importing the whole notes mapping.

use axum::extract::{Query, State};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use ytnote_core::transfer::{MergeStrategy, EXPORT_FILE_NAME};

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

/// Query parameters for import.
#[derive(Debug, Deserialize)]
pub struct ImportParams {
    /// `replace` (default) or `merge`.
    pub strategy: Option<MergeStrategy>,
}

/// GET /export
///
/// The raw mapping as a JSON attachment.
pub async fn export_notes(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let body = state.store.export_json().await?;

    Ok((
        [
            (CONTENT_TYPE, "application/json".to_string()),
            (
                CONTENT_DISPOSITION,
                format!("attachment; filename=\"{EXPORT_FILE_NAME}\""),
            ),
        ],
        body,
    ))
}

/// POST /import?strategy=replace|merge
///
/// Body is a previously exported mapping. Rejected whole if any entry is
/// invalid.
pub async fn import_notes(
    State(state): State<AppState>,
    Query(params): Query<ImportParams>,
    body: String,
) -> AppResult<impl IntoResponse> {
    let strategy = params.strategy.unwrap_or_default();
    let summary = state.store.import_json(&body, strategy).await?;

    Ok(Json(DataResponse { data: summary }))
}
