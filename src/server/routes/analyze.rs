//! Report analysis endpoint.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Json, Router,
};
use serde::Deserialize;

use crate::report::{Analysis, UserProfile};
use crate::server::error::{ApiError, ApiResult};
use crate::server::state::AppState;

/// Request body for `POST /api/analyze_report`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    #[serde(default)]
    pub report_text: Option<String>,
    #[serde(default)]
    pub user_profile: Option<UserProfile>,
}

/// POST /api/analyze_report - Extract test values and explain them.
pub async fn analyze_report(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> ApiResult<Json<Analysis>> {
    let Json(request) =
        payload.map_err(|e| ApiError::bad_request_with("No data provided", e.body_text()))?;

    let report_text = request.report_text.unwrap_or_default();
    if report_text.trim().is_empty() {
        return Err(ApiError::bad_request("No report text provided"));
    }
    let profile = request.user_profile.unwrap_or_default();

    let analysis = state.analyzer.analyze(&report_text, &profile).await?;
    Ok(Json(analysis))
}

/// Create the analysis routes router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/analyze_report", post(analyze_report))
}
