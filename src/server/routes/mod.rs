//! API route handlers.

pub mod analyze;
pub mod chat;
pub mod extract;
pub mod health;

use std::sync::Arc;

use axum::Router;

use crate::server::state::AppState;

/// Create the combined API router with all routes under /api prefix.
///
/// Routes:
/// - GET    /api/health              - Health check
/// - POST   /api/extract_pdf         - Multipart PDF upload → plain text
/// - POST   /api/analyze_report      - Report text + profile → test data + insight
/// - POST   /api/chat                - Follow-up question within a session
/// - DELETE /api/chat/{session_id}   - Forget a session
pub fn api_routes(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .merge(health::router())
        .merge(extract::router())
        .merge(analyze::router())
        .merge(chat::router());

    Router::new().nest("/api", api).with_state(state)
}
