/// Unified error handling module
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::sync::Arc;

/// Unified error response format
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub ok: bool,
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

/// Cloneable so one refresh failure can be handed to every caller waiting on it
#[derive(Debug, Clone, thiserror::Error)]
pub enum ApiError {
    #[error("External API error: {0}")]
    ExternalApi(Arc<reqwest::Error>),
    #[error("Upstream returned status {status}: {url}")]
    UpstreamStatus { status: u16, url: String },
    #[error("Malformed upstream payload: {0}")]
    Payload(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    fn code(&self) -> &'static str {
        match self {
            ApiError::ExternalApi(e) if e.is_timeout() => "UPSTREAM_TIMEOUT",
            ApiError::ExternalApi(e) if e.is_decode() => "UPSTREAM_PAYLOAD",
            ApiError::ExternalApi(_) => "UPSTREAM_ERROR",
            ApiError::UpstreamStatus { status, .. } => match *status {
                400..=499 => "UPSTREAM_4XX",
                500..=599 => "UPSTREAM_5XX",
                _ => "UPSTREAM_ERROR",
            },
            ApiError::Payload(_) => "UPSTREAM_PAYLOAD",
            ApiError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_GATEWAY,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::ExternalApi(Arc::new(err))
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Payload(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let error_response = ErrorResponse {
            ok: false,
            error: ErrorDetail {
                code: self.code().to_string(),
                message: self.to_string(),
            },
        };

        (self.status(), Json(error_response)).into_response()
    }
}

/// Type alias for API results
pub type ApiResult<T> = Result<T, ApiError>;
