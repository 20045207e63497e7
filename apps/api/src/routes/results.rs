use axum::{extract::State, http::HeaderMap, Json};
use serde::Serialize;
use tracing::info;

use crate::errors::AppError;
use crate::models::result::ResultRecord;
use crate::routes::session::session_id;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ResultsResponse {
    pub result: Option<ResultRecord>,
}

/// GET /results
/// Returns and evicts the caller's pending result; `null` when none is pending.
pub async fn results_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<ResultsResponse>, AppError> {
    let result = match session_id(&headers) {
        Some(session) => state.handoff.take(&session).await?,
        None => None,
    };
    info!(found = result.is_some(), "Results requested");
    Ok(Json(ResultsResponse { result }))
}
