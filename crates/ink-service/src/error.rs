//! API error types and responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

/// API error type covering the ink-economy taxonomy.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Missing or invalid identity headers.
    #[error("unauthorized")]
    Unauthorized,

    /// Valid identity but insufficient role.
    #[error("forbidden")]
    Forbidden,

    /// Malformed or missing field, rejected before any write.
    #[error("validation error: {0}")]
    Validation(String),

    /// Unknown account, order, session, or package.
    #[error("not found: {0}")]
    NotFound(String),

    /// Invalid state transition, e.g. cancelling a credited order or
    /// double-settling a session.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Balance too low to accept new usage or a new session.
    #[error("insufficient ink points: balance={balance}")]
    InsufficientCredits {
        /// Current balance.
        balance: i64,
    },

    /// The upstream inference call failed or returned unusable usage.
    /// No charge is applied.
    #[error("upstream error: {0}")]
    Upstream(String),

    /// A store write failed before anything was applied.
    #[error("internal error: {0}")]
    Internal(String),
}

/// JSON error response body.
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message, details) = match &self {
            Self::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "unauthorized",
                self.to_string(),
                None,
            ),
            Self::Forbidden => (StatusCode::FORBIDDEN, "forbidden", self.to_string(), None),
            Self::Validation(msg) => (StatusCode::BAD_REQUEST, "validation", msg.clone(), None),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg.clone(), None),
            Self::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg.clone(), None),
            Self::InsufficientCredits { balance } => (
                StatusCode::PAYMENT_REQUIRED,
                "insufficient_credits",
                self.to_string(),
                Some(serde_json::json!({ "balance": balance })),
            ),
            Self::Upstream(msg) => (StatusCode::BAD_GATEWAY, "upstream", msg.clone(), None),
            Self::Internal(msg) => {
                tracing::error!(error = %msg, "Internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                    None,
                )
            }
        };

        let body = ErrorResponse {
            error: ErrorBody {
                code: code.to_string(),
                message,
                details,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<ink_store::StoreError> for ApiError {
    fn from(err: ink_store::StoreError) -> Self {
        match err {
            ink_store::StoreError::NotFound { entity, id } => {
                Self::NotFound(format!("{entity} not found: {id}"))
            }
            ink_store::StoreError::Database(msg) | ink_store::StoreError::Serialization(msg) => {
                Self::Internal(msg)
            }
        }
    }
}
