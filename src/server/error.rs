//! API errors and their JSON representation.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::InsightError;

/// Message shown to the patient when chat fails; the cause goes in `details`.
pub const CHAT_FAILURE_MESSAGE: &str = "Sorry, I couldn't process your request";

/// Structured JSON error response for API errors
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
        }
    }

    pub fn with_details(error: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: Some(details.into()),
        }
    }
}

/// API error types that map to HTTP status codes
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Bad request: {message}")]
    BadRequest {
        message: String,
        details: Option<String>,
    },

    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    #[error(transparent)]
    Insight(#[from] InsightError),

    /// Chat failures keep a friendly headline and report the cause separately.
    #[error("Chat failed: {0}")]
    Chat(InsightError),
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest {
            message: message.into(),
            details: None,
        }
    }

    pub fn bad_request_with(message: impl Into<String>, details: impl Into<String>) -> Self {
        ApiError::BadRequest {
            message: message.into(),
            details: Some(details.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_response) = match &self {
            ApiError::BadRequest { message, details } => {
                tracing::warn!(message = %message, "Bad request");
                let body = match details {
                    Some(d) => ErrorResponse::with_details(message.clone(), d.clone()),
                    None => ErrorResponse::new(message.clone()),
                };
                (StatusCode::BAD_REQUEST, body)
            }
            ApiError::PayloadTooLarge(detail) => {
                tracing::warn!(detail = %detail, "Upload rejected");
                (
                    StatusCode::PAYLOAD_TOO_LARGE,
                    ErrorResponse::with_details("Upload too large", detail.clone()),
                )
            }
            ApiError::Insight(err) if err.is_client_error() => {
                tracing::warn!(error = %err, "Rejected input");
                (StatusCode::BAD_REQUEST, ErrorResponse::new(err.to_string()))
            }
            ApiError::Insight(err) => {
                tracing::error!(error = %err, "Request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::new(err.to_string()),
                )
            }
            ApiError::Chat(err) => {
                tracing::error!(error = %err, "Chat endpoint error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::with_details(CHAT_FAILURE_MESSAGE, err.to_string()),
                )
            }
        };

        (status, Json(error_response)).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
