//! Follow-up chat endpoints.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    routing::{delete, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::report::{TestResults, UserProfile};
use crate::server::error::{ApiError, ApiResult};
use crate::server::state::AppState;
use crate::session::ChatRequest;

/// Request body for `POST /api/chat`.
///
/// The browser also sends `reportText`; it is ignored because the extracted
/// `testData` already carries what the model needs.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub test_data: Option<TestResults>,
    #[serde(default)]
    pub user_profile: Option<UserProfile>,
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    pub response: String,
    pub session_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetResponse {
    pub session_id: String,
    pub cleared: bool,
}

/// POST /api/chat - Answer a question within a session.
pub async fn chat(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ChatBody>, JsonRejection>,
) -> ApiResult<Json<ChatResponse>> {
    let Json(body) =
        payload.map_err(|e| ApiError::bad_request_with("No data provided", e.body_text()))?;

    let message = body.message.unwrap_or_default();
    if message.trim().is_empty() {
        return Err(ApiError::bad_request("No message provided"));
    }

    let request = ChatRequest {
        session_id: body.session_id,
        message,
        profile: body.user_profile.unwrap_or_default(),
        test_data: body.test_data.unwrap_or_default(),
    };

    let reply = state.analyzer.chat(&request).await.map_err(ApiError::Chat)?;
    Ok(Json(ChatResponse {
        response: reply.response,
        session_id: reply.session_id,
    }))
}

/// DELETE /api/chat/{session_id} - Forget a session's transcript.
pub async fn reset_session(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Json<ResetResponse> {
    let cleared = state.analyzer.sessions().reset(&session_id).await;
    tracing::info!(session_id = %session_id, cleared, "Session reset");
    Json(ResetResponse {
        session_id,
        cleared,
    })
}

/// Create the chat routes router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/chat", post(chat))
        .route("/chat/{session_id}", delete(reset_session))
}
