// HTTP API Error Types
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::store::StoreError;

/// HTTP API error with appropriate status codes and client-facing messages.
///
/// The dashboard frontend expects `{ "error": string, "details"?: string }`
/// and French messages; both are part of the wire contract.
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    Validation(String),

    // 403 Forbidden - auth failures are 403 here, not 401 (legacy contract)
    Auth(String),
    Forbidden(String),

    // 404 Not Found
    NotFound(String),

    // 500 Internal Server Error, optionally carrying upstream error text.
    // Passing upstream text through `details` leaks store internals to the
    // client; kept intentionally for frontend compatibility.
    Upstream { message: String, details: Option<String> },
    Internal(String),
}

impl ApiError {
    /// Get HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Auth(_) | ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Upstream { .. } | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Get client-facing error message
    pub fn message(&self) -> &str {
        match self {
            ApiError::Validation(msg)
            | ApiError::Auth(msg)
            | ApiError::Forbidden(msg)
            | ApiError::NotFound(msg)
            | ApiError::Internal(msg) => msg,
            ApiError::Upstream { message, .. } => message,
        }
    }

    /// Convert to JSON response body
    pub fn to_json(&self) -> Value {
        match self {
            ApiError::Upstream { message, details } => {
                let mut body = json!({ "error": message });
                if let Some(details) = details {
                    body["details"] = json!(details);
                }
                body
            }
            _ => json!({ "error": self.message() }),
        }
    }
}

// Static constructor methods, mirroring how handlers raise errors
impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Validation(message.into())
    }

    pub fn auth(message: impl Into<String>) -> Self {
        ApiError::Auth(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn upstream(message: impl Into<String>, details: Option<String>) -> Self {
        ApiError::Upstream { message: message.into(), details }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::Internal(message.into())
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(msg) => ApiError::not_found(msg),
            StoreError::Upstream { status, message } => {
                tracing::error!("store error ({}): {}", status, message);
                ApiError::upstream(
                    "Erreur lors de l'accès aux données",
                    Some(message),
                )
            }
            StoreError::Transport(msg) => {
                tracing::error!("store transport error: {}", msg);
                ApiError::upstream("Erreur lors de l'accès aux données", Some(msg))
            }
            StoreError::InvalidResponse(msg) => {
                tracing::error!("store response parse error: {}", msg);
                ApiError::internal("Réponse du stockage invalide")
            }
        }
    }
}

// Standard error trait implementations
impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

// Automatic HTTP response conversion for Axum
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (self.status_code(), Json(self.to_json())).into_response()
    }
}

/// Handler result alias used by every route
pub type ApiResult<T> = Result<T, ApiError>;
