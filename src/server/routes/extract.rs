//! PDF upload endpoint.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{multipart::MultipartRejection, Multipart, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::server::error::{ApiError, ApiResult};
use crate::server::state::AppState;

/// Response for a successful upload.
#[derive(Debug, Serialize, Deserialize)]
pub struct ExtractResponse {
    pub text: String,
}

/// POST /api/extract_pdf - Return the text of the uploaded `file` field.
pub async fn extract_pdf(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Json<ExtractResponse>> {
    let mut multipart =
        multipart.map_err(|e| ApiError::bad_request_with("No file provided", e.body_text()))?;

    let mut upload: Option<(Option<String>, Bytes)> = None;
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => return Err(multipart_error(e)),
        };
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().map(str::to_string);
        let bytes = field.bytes().await.map_err(multipart_error)?;
        upload = Some((file_name, bytes));
        break;
    }

    let (file_name, bytes) = upload.ok_or_else(|| ApiError::bad_request("No file provided"))?;
    if file_name.as_deref().map_or(true, str::is_empty) || bytes.is_empty() {
        return Err(ApiError::bad_request("No file selected"));
    }

    tracing::info!(
        file_name = file_name.as_deref().unwrap_or_default(),
        bytes = bytes.len(),
        "Extracting uploaded PDF"
    );
    let text = state.analyzer.extract_pdf_bytes(&bytes).await?;
    Ok(Json(ExtractResponse { text }))
}

fn multipart_error(e: axum::extract::multipart::MultipartError) -> ApiError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge(e.body_text())
    } else {
        ApiError::bad_request_with("Malformed upload", e.body_text())
    }
}

/// Create the upload routes router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/extract_pdf", post(extract_pdf))
}
