//! Public certificate verification endpoint.
//!
//! No identity required: anyone holding a certificate identifier (typically
//! scanned from the artifact's QR code) may check it. Every call lands one
//! row in the audit log, whatever the outcome.

use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::blob::BlobPublisher;
use crate::engine::{Engine, VerificationOutcome};
use crate::error::AppError;
use crate::store::{CertificateStore, InstitutionDirectory};

/// Query parameters for a verification request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyQuery {
    /// The certificate identifier to check.
    pub certificate_id: Option<String>,
}

/// Body of a verification response.
#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// Creates the verification router.
pub fn router<S, B>(engine: Engine<S, B>) -> Router
where
    S: CertificateStore + InstitutionDirectory,
    B: BlobPublisher,
{
    Router::new()
        .route("/verify", get(verify_certificate))
        .with_state(engine)
}

/// Requester IP as reported by the fronting proxy.
///
/// First hop of `X-Forwarded-For`, else `X-Real-Ip`, else `"unknown"`. The
/// value is audit metadata, not an access control input.
fn requester_ip(headers: &HeaderMap) -> String {
    if let Some(forwarded) = headers.get("x-forwarded-for").and_then(|v| v.to_str().ok()) {
        if let Some(first) = forwarded.split(',').next() {
            let first = first.trim();
            if !first.is_empty() {
                return first.to_string();
            }
        }
    }
    if let Some(real_ip) = headers.get("x-real-ip").and_then(|v| v.to_str().ok()) {
        let real_ip = real_ip.trim();
        if !real_ip.is_empty() {
            return real_ip.to_string();
        }
    }
    "unknown".to_string()
}

/// GET /api/v1/verify?certificateId=...
async fn verify_certificate<S, B>(
    State(engine): State<Engine<S, B>>,
    Query(query): Query<VerifyQuery>,
    headers: HeaderMap,
) -> Result<(StatusCode, Json<VerifyResponse>), AppError>
where
    S: CertificateStore + InstitutionDirectory,
    B: BlobPublisher,
{
    let certificate_ref = query
        .certificate_id
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| {
            AppError::Validation("certificateId query parameter is required".to_string())
        })?;

    let outcome = engine
        .verify(certificate_ref, &requester_ip(&headers))
        .await?;

    let (status, body) = match outcome {
        VerificationOutcome::Valid(view) => (
            StatusCode::OK,
            VerifyResponse {
                success: true,
                message: "Certificate is valid".to_string(),
                data: Some(serde_json::to_value(&*view).map_err(|e| {
                    AppError::Internal(format!("serializing verified view: {e}"))
                })?),
            },
        ),
        VerificationOutcome::Revoked { reason } => (
            StatusCode::FORBIDDEN,
            VerifyResponse {
                success: false,
                message: reason,
                data: None,
            },
        ),
        VerificationOutcome::Tampered { reason } => (
            StatusCode::CONFLICT,
            VerifyResponse {
                success: false,
                message: reason,
                data: None,
            },
        ),
        VerificationOutcome::NotFound { reason } => (
            StatusCode::NOT_FOUND,
            VerifyResponse {
                success: false,
                message: reason,
                data: None,
            },
        ),
    };

    Ok((status, Json(body)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forwarded_for_takes_first_hop() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            "203.0.113.7, 10.0.0.2, 10.0.0.1".parse().unwrap(),
        );
        assert_eq!(requester_ip(&headers), "203.0.113.7");
    }

    #[test]
    fn test_real_ip_is_the_fallback() {
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", "198.51.100.4".parse().unwrap());
        assert_eq!(requester_ip(&headers), "198.51.100.4");
    }

    #[test]
    fn test_no_proxy_headers_is_unknown() {
        assert_eq!(requester_ip(&HeaderMap::new()), "unknown");
    }

    #[test]
    fn test_empty_forwarded_for_falls_through() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", "  ".parse().unwrap());
        headers.insert("x-real-ip", "198.51.100.4".parse().unwrap());
        assert_eq!(requester_ip(&headers), "198.51.100.4");
    }
}
