//! Application error type and its HTTP representation.
//!
//! Every failure of the shorten/resolve workflow is surfaced as an [`AppError`].
//! Handlers return it directly; [`IntoResponse`] renders a uniform JSON body:
//!
//! ```json
//! { "error": { "code": "quota_exhausted", "message": "...", "details": {} } }
//! ```

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::{Value, json};
use std::time::Duration;

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorInfo,
}

/// Serializable error payload.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorInfo {
    pub code: &'static str,
    pub message: String,
    pub details: Value,
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Malformed or missing input.
    #[error("{message}")]
    Validation { message: String, details: Value },

    /// The URL to shorten points back at this service.
    #[error("{message}")]
    SelfReferential { message: String, details: Value },

    /// The client used up its quota for the current window.
    #[error("{message}")]
    QuotaExhausted {
        message: String,
        retry_after: Duration,
    },

    #[error("{message}")]
    MissingParameter { message: String, details: Value },

    #[error("{message}")]
    NotFound { message: String, details: Value },

    #[error("{message}")]
    Conflict { message: String, details: Value },

    /// Communication with the backing store failed or timed out.
    #[error("{message}")]
    StoreUnavailable { message: String, details: Value },

    #[error("{message}")]
    Internal { message: String, details: Value },
}

impl AppError {
    pub fn bad_request(message: impl Into<String>, details: Value) -> Self {
        Self::Validation {
            message: message.into(),
            details,
        }
    }

    pub fn self_referential(message: impl Into<String>, details: Value) -> Self {
        Self::SelfReferential {
            message: message.into(),
            details,
        }
    }

    pub fn quota_exhausted(message: impl Into<String>, retry_after: Duration) -> Self {
        Self::QuotaExhausted {
            message: message.into(),
            retry_after,
        }
    }

    pub fn missing_parameter(message: impl Into<String>, details: Value) -> Self {
        Self::MissingParameter {
            message: message.into(),
            details,
        }
    }

    pub fn not_found(message: impl Into<String>, details: Value) -> Self {
        Self::NotFound {
            message: message.into(),
            details,
        }
    }

    pub fn conflict(message: impl Into<String>, details: Value) -> Self {
        Self::Conflict {
            message: message.into(),
            details,
        }
    }

    pub fn store_unavailable(message: impl Into<String>, details: Value) -> Self {
        Self::StoreUnavailable {
            message: message.into(),
            details,
        }
    }

    pub fn internal(message: impl Into<String>, details: Value) -> Self {
        Self::Internal {
            message: message.into(),
            details,
        }
    }

    /// HTTP status used when this error reaches the boundary.
    ///
    /// Unknown short codes answer `400` rather than `404`, matching the
    /// resolve contract of the public API.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation { .. }
            | Self::SelfReferential { .. }
            | Self::MissingParameter { .. }
            | Self::NotFound { .. } => StatusCode::BAD_REQUEST,
            Self::Conflict { .. } => StatusCode::CONFLICT,
            Self::QuotaExhausted { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::StoreUnavailable { .. } | Self::Internal { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "validation_error",
            Self::SelfReferential { .. } => "self_referential",
            Self::QuotaExhausted { .. } => "quota_exhausted",
            Self::MissingParameter { .. } => "missing_parameter",
            Self::NotFound { .. } => "not_found",
            Self::Conflict { .. } => "conflict",
            Self::StoreUnavailable { .. } => "store_unavailable",
            Self::Internal { .. } => "internal_error",
        }
    }

    pub fn to_error_info(&self) -> ErrorInfo {
        let details = match self {
            Self::QuotaExhausted { retry_after, .. } => {
                json!({ "retry_after_seconds": retry_after.as_secs() })
            }
            Self::Validation { details, .. }
            | Self::SelfReferential { details, .. }
            | Self::MissingParameter { details, .. }
            | Self::NotFound { details, .. }
            | Self::Conflict { details, .. }
            | Self::StoreUnavailable { details, .. }
            | Self::Internal { details, .. } => details.clone(),
        };

        ErrorInfo {
            code: self.code(),
            message: self.to_string(),
            details,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorBody {
            error: self.to_error_info(),
        };

        let mut response = (status, Json(body)).into_response();

        if let Self::QuotaExhausted { retry_after, .. } = &self
            && let Ok(value) = HeaderValue::from_str(&retry_after.as_secs().to_string())
        {
            response.headers_mut().insert(header::RETRY_AFTER, value);
        }

        response
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let details = serde_json::to_value(&errors).unwrap_or_else(|_| json!({}));
        AppError::bad_request("Request validation failed", details)
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::bad_request(
            "Invalid request body",
            json!({ "reason": rejection.body_text() }),
        )
    }
}

impl From<redis::RedisError> for AppError {
    fn from(e: redis::RedisError) -> Self {
        tracing::error!("Redis error: {}", e);
        AppError::store_unavailable("Store error", json!({ "kind": format!("{:?}", e.kind()) }))
    }
}
