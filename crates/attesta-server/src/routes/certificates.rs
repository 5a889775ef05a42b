//! Certificate issuance and lifecycle endpoints.
//!
//! Everything under `/certificates` requires a resolved caller identity;
//! the public verification path lives in [`super::verify`].

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::blob::BlobPublisher;
use crate::engine::{ClaimInput, Engine, IssuedCertificate};
use crate::error::AppError;
use crate::models::{Certificate, CertificateStatus};
use crate::routes::CallerIdentity;
use crate::store::{CertificateStore, InstitutionDirectory};

/// Request body for issuing a single certificate.
pub type IssueRequest = ClaimInput;

/// Request body for bulk issuance.
#[derive(Debug, Deserialize)]
pub struct BulkIssueRequest {
    /// Claims to issue, each an independent atomic unit.
    pub claims: Vec<ClaimInput>,
}

/// A certificate as returned to its issuing institution.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificateResponse {
    pub certificate_id: Uuid,
    pub institution_id: Uuid,
    pub full_name: String,
    pub program: String,
    pub field_of_study: String,
    pub issued_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<String>,
    pub issuer_name: String,
    pub issuer_email: String,
    pub status: CertificateStatus,
    pub integrity_hash: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact_locator: Option<String>,
    pub created_at: String,
}

impl From<Certificate> for CertificateResponse {
    fn from(certificate: Certificate) -> Self {
        Self {
            certificate_id: certificate.certificate_id,
            institution_id: certificate.institution_id,
            full_name: certificate.full_name,
            program: certificate.program,
            field_of_study: certificate.field_of_study,
            issued_at: certificate.issued_at.to_string(),
            expires_at: certificate.expires_at.map(|d| d.to_string()),
            issuer_name: certificate.issuer_name,
            issuer_email: certificate.issuer_email,
            status: certificate.status,
            integrity_hash: certificate.integrity_hash,
            artifact_locator: certificate.artifact_locator,
            created_at: certificate.created_at.to_rfc3339(),
        }
    }
}

/// Response for a successful issuance.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueResponse {
    #[serde(flatten)]
    pub certificate: CertificateResponse,
    /// True when the artifact is not yet published; retry via the artifact
    /// endpoint.
    pub artifact_pending: bool,
}

impl From<IssuedCertificate> for IssueResponse {
    fn from(issued: IssuedCertificate) -> Self {
        Self {
            certificate: issued.certificate.into(),
            artifact_pending: issued.artifact_pending,
        }
    }
}

/// One entry in a bulk issuance response, in claim order.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum BulkItem {
    Issued {
        #[serde(flatten)]
        certificate: Box<IssueResponse>,
    },
    Failed {
        error: String,
    },
}

/// Response for a bulk issuance.
#[derive(Debug, Serialize)]
pub struct BulkIssueResponse {
    /// Number of successfully issued certificates.
    pub issued: usize,
    /// Number of claims that failed.
    pub failed: usize,
    /// Per-claim results, in request order.
    pub items: Vec<BulkItem>,
}

/// Response for a successful revocation.
#[derive(Debug, Serialize)]
pub struct RevokeResponse {
    pub revoked: bool,
}

/// Creates the certificates router.
pub fn router<S, B>(engine: Engine<S, B>) -> Router
where
    S: CertificateStore + InstitutionDirectory,
    B: BlobPublisher,
{
    Router::new()
        .route("/", post(issue_certificate).get(list_certificates))
        .route("/bulk", post(issue_bulk))
        .route("/{id}/revoke", post(revoke_certificate))
        .route("/{id}/artifact", post(ensure_artifact))
        .with_state(engine)
}

/// POST /api/v1/certificates
async fn issue_certificate<S, B>(
    State(engine): State<Engine<S, B>>,
    caller: CallerIdentity,
    Json(claim): Json<IssueRequest>,
) -> Result<(StatusCode, Json<IssueResponse>), AppError>
where
    S: CertificateStore + InstitutionDirectory,
    B: BlobPublisher,
{
    let issued = engine.issue(claim, caller.user_id).await?;
    Ok((StatusCode::CREATED, Json(issued.into())))
}

/// POST /api/v1/certificates/bulk
async fn issue_bulk<S, B>(
    State(engine): State<Engine<S, B>>,
    caller: CallerIdentity,
    Json(request): Json<BulkIssueRequest>,
) -> Result<Json<BulkIssueResponse>, AppError>
where
    S: CertificateStore + InstitutionDirectory,
    B: BlobPublisher,
{
    if request.claims.is_empty() {
        return Err(AppError::Validation("claims must not be empty".to_string()));
    }

    let results = engine.issue_bulk(request.claims, caller.user_id).await;

    let mut issued = 0;
    let mut failed = 0;
    let items = results
        .into_iter()
        .map(|result| match result {
            Ok(record) => {
                issued += 1;
                BulkItem::Issued {
                    certificate: Box::new(record.into()),
                }
            }
            Err(e) => {
                failed += 1;
                BulkItem::Failed {
                    error: e.to_string(),
                }
            }
        })
        .collect();

    Ok(Json(BulkIssueResponse {
        issued,
        failed,
        items,
    }))
}

/// GET /api/v1/certificates
async fn list_certificates<S, B>(
    State(engine): State<Engine<S, B>>,
    caller: CallerIdentity,
) -> Result<Json<Vec<CertificateResponse>>, AppError>
where
    S: CertificateStore + InstitutionDirectory,
    B: BlobPublisher,
{
    let certificates = engine.list_certificates(caller.user_id).await?;
    Ok(Json(certificates.into_iter().map(Into::into).collect()))
}

/// POST /api/v1/certificates/{id}/revoke
async fn revoke_certificate<S, B>(
    State(engine): State<Engine<S, B>>,
    caller: CallerIdentity,
    Path(id): Path<Uuid>,
) -> Result<Json<RevokeResponse>, AppError>
where
    S: CertificateStore + InstitutionDirectory,
    B: BlobPublisher,
{
    engine.revoke(id, caller.user_id).await?;
    Ok(Json(RevokeResponse { revoked: true }))
}

/// POST /api/v1/certificates/{id}/artifact
///
/// Retries artifact rendering and publishing for an issued certificate.
/// Idempotent: a certificate with a locator is returned unchanged.
async fn ensure_artifact<S, B>(
    State(engine): State<Engine<S, B>>,
    caller: CallerIdentity,
    Path(id): Path<Uuid>,
) -> Result<Json<CertificateResponse>, AppError>
where
    S: CertificateStore + InstitutionDirectory,
    B: BlobPublisher,
{
    let certificate = engine.ensure_artifact(id, caller.user_id).await?;
    Ok(Json(certificate.into()))
}
