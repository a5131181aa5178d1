//! Error handling for the REST API server.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use recall_core::error::{ErrorCode, RecallError};
use serde::Serialize;
use std::fmt;

/// API error type.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: String,
    pub message: String,
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    pub fn new(status: StatusCode, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status,
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    // Common error constructors
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "BAD_REQUEST", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "NOT_FOUND", message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", message)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR", message)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.status, self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.code,
                message: self.message,
                details: self.details,
            },
        };

        (self.status, Json(body)).into_response()
    }
}

// Convert from recall-core errors
impl From<RecallError> for ApiError {
    fn from(err: RecallError) -> Self {
        let code = err.code();
        let suggestion = err.suggestion().map(str::to_string);

        let mut api = match err {
            RecallError::Validation {
                message, details, ..
            } => {
                let api = ApiError::validation(message);
                if details.is_empty() {
                    api
                } else {
                    api.with_details(serde_json::json!(details))
                }
            }
            RecallError::Authentication { message, .. } => ApiError::unauthorized(message),
            RecallError::NotFound { message, .. } => ApiError::not_found(message),
            RecallError::Configuration(msg) => ApiError::bad_request(msg),
            RecallError::UnsupportedProvider { provider } => {
                ApiError::bad_request(format!("Unsupported provider: {}", provider))
            }
            RecallError::Storage { message, .. } => {
                tracing::error!("Storage error: {}", message);
                ApiError::internal(format!("Storage error: {}", message))
            }
            RecallError::Parse { message, .. } => ApiError::bad_request(message),
            RecallError::Serialization(e) => {
                ApiError::internal(format!("Serialization error: {}", e))
            }
            RecallError::Io(e) => ApiError::internal(format!("IO error: {}", e)),
            RecallError::Internal(msg) => ApiError::internal(msg),
        };

        if code != ErrorCode::Internal {
            api.code = code.as_str().to_string();
        }
        if let Some(suggestion) = suggestion {
            let mut details = api.details.take().unwrap_or_else(|| serde_json::json!({}));
            if let Some(map) = details.as_object_mut() {
                map.insert("suggestion".to_string(), serde_json::Value::String(suggestion));
            }
            api.details = Some(details);
        }
        api
    }
}

/// Result type alias for API handlers.
pub type ApiResult<T> = Result<T, ApiError>;
