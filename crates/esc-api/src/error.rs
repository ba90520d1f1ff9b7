//! # API Error Types
//!
//! Structured error type implementing `axum::response::IntoResponse`.
//! Maps engine errors to HTTP status codes and JSON error bodies with a
//! machine-readable code. Internal and ledger error details are never
//! exposed to clients.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use esc_engine::EngineError;
use esc_ledger::LedgerError;
use esc_state::StateError;

/// Structured JSON error response body.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

/// Inner error detail.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "CONFLICT", "NOT_FOUND").
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

/// Application-level error type that implements [`IntoResponse`].
#[derive(Error, Debug)]
pub enum AppError {
    /// Resource not found (404).
    #[error("not found: {0}")]
    NotFound(String),

    /// Request validation failed (422).
    #[error("validation error: {0}")]
    Validation(String),

    /// Authentication failure — missing or invalid credentials (401).
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Authorization failure — caller may not perform this action (403).
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Conflict with current resource state (409). Recoverable: the
    /// message names the current derived state so the client can
    /// re-fetch and retry.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The ledger rejected the transaction or was unreachable (502).
    /// Details are logged, not returned.
    #[error("ledger error: {0}")]
    Ledger(String),

    /// Mirror store failure (503). Details are logged, not returned.
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),
}

impl AppError {
    /// HTTP status code and machine-readable error code for this error.
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR"),
            Self::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            Self::Forbidden(_) => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            Self::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            Self::Ledger(_) => (StatusCode::BAD_GATEWAY, "LEDGER_ERROR"),
            Self::StoreUnavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, "STORE_UNAVAILABLE"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        // Never expose ledger or store internals to clients.
        let message = match &self {
            Self::Ledger(_) => "the ledger rejected the transaction".to_string(),
            Self::StoreUnavailable(_) => "the service is temporarily unavailable".to_string(),
            other => other.to_string(),
        };

        match &self {
            Self::Ledger(_) => tracing::error!(error = %self, "ledger error"),
            Self::StoreUnavailable(_) => tracing::error!(error = %self, "mirror store error"),
            _ => {}
        }

        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message,
            },
        };
        (status, Json(body)).into_response()
    }
}

impl From<EngineError> for AppError {
    fn from(err: EngineError) -> Self {
        match err {
            // Role/action mismatches are authorization failures even
            // though the state machine reports them.
            EngineError::State(StateError::Forbidden { .. }) => Self::Forbidden(err.to_string()),
            EngineError::State(_) => Self::Conflict(err.to_string()),
            EngineError::Authorization(msg) => Self::Forbidden(msg),
            EngineError::Ledger(LedgerError::Unreachable(msg)) => Self::Ledger(msg),
            EngineError::Ledger(e) => Self::Ledger(e.to_string()),
            EngineError::Store(e) => Self::StoreUnavailable(e.to_string()),
            EngineError::NotFound(what) => Self::NotFound(what),
            EngineError::Validation(msg) => Self::Validation(msg),
        }
    }
}
