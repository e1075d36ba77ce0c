//! API error types with structured JSON responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::core_state::CoreError;
use crate::pipeline::prediction::{PredictionError, ValidationError};
use crate::session_bridge::StoreError;

/// Structured error response body for the browser.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: &'static str,
    pub message: String,
    /// Form field the user should correct.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    /// Where the browser should navigate instead.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect: Option<&'static str>,
}

/// API-level errors with HTTP status mapping.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("System offline: cannot reach prediction service")]
    Offline(String),
    #[error("{message}")]
    Backend { status: u16, message: String },
    #[error("Malformed prediction response: {0}")]
    BadBackendResponse(String),
    #[error("A prediction is already in progress")]
    InFlight,
    #[error("No prediction result available")]
    NoResult,
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Invalid request: {0}")]
    BadRequest(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut field = None;
        let mut redirect = None;
        let (status, code, message) = match &self {
            ApiError::Validation(err) => {
                field = Some(err.field().to_string()).filter(|f| !f.is_empty());
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "VALIDATION_FAILED",
                    err.to_string(),
                )
            }
            ApiError::Offline(reason) => {
                tracing::warn!(%reason, "Prediction backend offline");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "SYSTEM_OFFLINE",
                    "System offline: cannot reach prediction service".to_string(),
                )
            }
            ApiError::Backend { status, message } => {
                tracing::warn!(backend_status = status, "Prediction backend rejected request");
                (StatusCode::BAD_GATEWAY, "BACKEND_ERROR", message.clone())
            }
            ApiError::BadBackendResponse(detail) => {
                tracing::warn!(detail, "Malformed backend response");
                (
                    StatusCode::BAD_GATEWAY,
                    "BAD_BACKEND_RESPONSE",
                    "The prediction service returned an unreadable response".to_string(),
                )
            }
            ApiError::InFlight => (
                StatusCode::CONFLICT,
                "PREDICTION_IN_FLIGHT",
                "A prediction is already in progress".to_string(),
            ),
            ApiError::NoResult => {
                redirect = Some("/");
                (
                    StatusCode::NOT_FOUND,
                    "NO_RESULT",
                    "No prediction result available".to_string(),
                )
            }
            ApiError::NotFound(detail) => (StatusCode::NOT_FOUND, "NOT_FOUND", detail.clone()),
            ApiError::BadRequest(detail) => {
                (StatusCode::BAD_REQUEST, "BAD_REQUEST", detail.clone())
            }
            ApiError::Internal(detail) => {
                tracing::error!(detail, "API internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = ErrorBody {
            error: ErrorDetail {
                code,
                message,
                field,
                redirect,
            },
        };
        (status, Json(body)).into_response()
    }
}

impl From<PredictionError> for ApiError {
    fn from(err: PredictionError) -> Self {
        match err {
            PredictionError::Validation(e) => ApiError::Validation(e),
            PredictionError::Transport(reason) => ApiError::Offline(reason),
            PredictionError::Server { status, message } => ApiError::Backend { status, message },
            PredictionError::ResponseParsing(detail) => ApiError::BadBackendResponse(detail),
            PredictionError::InFlight => ApiError::InFlight,
            PredictionError::HttpClient(detail) => ApiError::Internal(detail),
            PredictionError::LockPoisoned => ApiError::Internal("lock poisoned".into()),
            PredictionError::TaskFailed(detail) => ApiError::Internal(detail),
            PredictionError::Store(e) => ApiError::Internal(e.to_string()),
        }
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::LockPoisoned => ApiError::Internal("lock poisoned".into()),
            CoreError::Store(e) => e.into(),
            CoreError::Client(e) => e.into(),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::Internal(err.to_string())
    }
}
