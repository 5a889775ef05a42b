//! Error types for the Attesta server.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

/// Application error type.
///
/// Authorization refusals (`NotAuthorized`, `NotApproved`, `NotOwner`) all
/// map to 403 but stay distinct variants so the engine's refusal reasons are
/// visible in logs and tests. Internal variants never leak their detail to
/// clients.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Caller could not be resolved to any institution.
    #[error("Not authorized: {0}")]
    NotAuthorized(String),

    /// Caller's institution exists but has not been approved for issuance.
    #[error("Institution not approved: {0}")]
    NotApproved(String),

    /// The certificate exists but belongs to another institution.
    #[error("Not owner: {0}")]
    NotOwner(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// The blob publisher could not store or resolve an artifact.
    #[error("Artifact storage unavailable: {0}")]
    Storage(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Short class name of the error, recorded in audit notes when a
    /// verification attempt itself fails.
    pub fn class(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "Validation",
            AppError::NotAuthorized(_) => "NotAuthorized",
            AppError::NotApproved(_) => "NotApproved",
            AppError::NotOwner(_) => "NotOwner",
            AppError::NotFound(_) => "NotFound",
            AppError::Storage(_) => "Storage",
            AppError::Database(_) => "Database",
            AppError::Internal(_) => "Internal",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotAuthorized(msg) => (StatusCode::FORBIDDEN, msg),
            AppError::NotApproved(msg) => (StatusCode::FORBIDDEN, msg),
            AppError::NotOwner(msg) => (StatusCode::FORBIDDEN, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Storage(msg) => {
                tracing::error!("Artifact storage unavailable: {}", msg);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "Artifact storage unavailable".to_string(),
                )
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}
