//! Mapping of domain errors onto HTTP responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use pulse_core::PulseError;
use serde::Serialize;
use tracing::error;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Pulse(#[from] PulseError),

    #[error("{0}")]
    NotFound(String),
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Pulse(e) if e.is_upstream() => StatusCode::BAD_GATEWAY,
            ApiError::Pulse(PulseError::Validation(_)) => StatusCode::BAD_REQUEST,
            ApiError::Pulse(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            ApiError::NotFound(_) => "not_found",
            ApiError::Pulse(e) => match e {
                PulseError::Connectivity(_) => "billing_unreachable",
                PulseError::Request { .. } => "billing_request_failed",
                PulseError::Decode(_) => "billing_decode_failed",
                PulseError::Validation(_) => "invalid_request",
                PulseError::Settings(_) => "settings_error",
                PulseError::Config(_) => "configuration_error",
                _ => "internal_error",
            },
        }
    }

    /// Internal failures are logged in full and reported generically.
    fn public_message(&self) -> String {
        match self {
            ApiError::Pulse(
                e @ (PulseError::Internal(_) | PulseError::Io(_) | PulseError::Serialization(_)),
            ) => {
                error!(error = %e, "Request failed");
                "Internal processing error".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        metrics::counter!("api.errors", "code" => self.code()).increment(1);
        let body = ErrorResponse {
            error: self.code().to_string(),
            message: self.public_message(),
        };
        (status, Json(body)).into_response()
    }
}
