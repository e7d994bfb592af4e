//! Axum HTTP layer over [`crate::ReportAnalyzer`].
//!
//! Handlers validate input, call the analyzer and serialise the result;
//! all prompt and session logic stays in the library.

pub mod error;
pub mod routes;
pub mod state;

pub use error::{ApiError, ApiResult, ErrorResponse};
pub use routes::api_routes;
pub use state::AppState;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::analyze::ReportAnalyzer;

/// Create the Axum application with all routes and middleware.
pub fn create_app(analyzer: ReportAnalyzer) -> Router {
    create_app_with_state(AppState::new(analyzer))
}

/// Like [`create_app`], keeping a handle on the state for the caller.
///
/// This sets up:
/// - API routes under `/api`
/// - A request-body limit of `max_upload_bytes`
/// - CORS allowing any origin (the browser client is served elsewhere)
/// - Request tracing
pub fn create_app_with_state(state: Arc<AppState>) -> Router {
    let body_limit = state.analyzer.config().max_upload_bytes;

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(api_routes(state))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Bind `addr` and serve until the process receives Ctrl-C.
pub async fn serve(analyzer: ReportAnalyzer, addr: SocketAddr) -> std::io::Result<()> {
    let app = create_app(analyzer);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(addr = %listener.local_addr()?, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Could not install Ctrl-C handler");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
