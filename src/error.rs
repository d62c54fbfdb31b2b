//! Unified error types for the info service.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// Unified error type for the info service.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Configuration loading error.
    #[error("configuration error: {0}")]
    Config(#[from] envy::Error),

    /// No route matched the request path.
    #[error("no route for {path}")]
    NotFound {
        /// The path that was requested.
        path: String,
    },

    /// Request body was present but not valid JSON.
    #[error("invalid JSON body: {0}")]
    BadRequest(String),

    /// A dependency probe reported unhealthy.
    #[error("dependency unavailable: {name}")]
    DependencyUnavailable {
        /// Name of the failing dependency.
        name: String,
    },

    /// Timestamp formatting error.
    #[error("time formatting error: {0}")]
    Time(#[from] time::error::Format),

    /// JSON serialization error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ApiError {
    /// HTTP status this error surfaces as.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::DependencyUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Config(_) | ApiError::Time(_) | ApiError::Json(_) | ApiError::Io(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// JSON body returned for every error response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Canonical reason phrase, e.g. "Not Found".
    pub error: String,
    /// Human-readable detail.
    pub message: String,
    /// Numeric HTTP status, duplicated in the body.
    pub status_code: u16,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            error!("request failed: {}", self);
        }

        let body = ErrorBody {
            error: status.canonical_reason().unwrap_or("Error").to_string(),
            message: self.to_string(),
            status_code: status.as_u16(),
        };

        (status, Json(body)).into_response()
    }
}

/// Convenient Result type alias.
pub type Result<T> = std::result::Result<T, ApiError>;
