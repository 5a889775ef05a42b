//! The certificate engine: issuance, lifecycle, and verification.
//!
//! [`Engine`] owns the issuance orchestration, the one-way revocation latch,
//! and the public verification path. It holds no state of its own; all
//! durable state lives behind the storage and blob ports, so every call is
//! independent and may run fully in parallel with any other.
//!
//! The issuance ordering is deliberate: the certificate row commits first,
//! then the artifact renders and publishes. A storage outage during the
//! artifact step leaves an issued, verifiable certificate with a pending
//! artifact, retriable through [`Engine::ensure_artifact`] without minting a
//! new identifier.

use chrono::NaiveDate;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use attesta_crypto::{fingerprint, matches_fingerprint, FingerprintInput};
use attesta_render::{render_certificate, CertificateDocument};

use crate::blob::BlobPublisher;
use crate::error::AppError;
use crate::models::{
    AttemptStatus, Certificate, Institution, NewCertificate, NewVerificationAttempt,
};
use crate::store::{CertificateStore, InstitutionDirectory};

/// A credential claim as submitted by an issuing institution.
///
/// Dates arrive as ISO 8601 strings from the transport and are parsed during
/// validation, so a malformed date is a `ValidationFailed` naming the field
/// rather than a deserialization rejection with no audit value.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimInput {
    pub full_name: String,
    pub program: String,
    pub field_of_study: String,
    /// Conferral date, `YYYY-MM-DD`.
    pub issued_at: String,
    /// Optional expiry date, `YYYY-MM-DD`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<String>,
}

/// A claim that passed validation, with dates parsed.
#[derive(Debug)]
struct ValidClaim {
    full_name: String,
    program: String,
    field_of_study: String,
    issued_at: NaiveDate,
    expires_at: Option<NaiveDate>,
}

impl ClaimInput {
    /// Validates the claim and parses its dates.
    ///
    /// Every error names the offending field so bulk callers can report
    /// item-level failures a human can act on.
    fn validate(self) -> Result<ValidClaim, AppError> {
        fn required(name: &str, value: &str) -> Result<String, AppError> {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                return Err(AppError::Validation(format!("{name} must not be empty")));
            }
            Ok(trimmed.to_string())
        }

        fn parse_date(name: &str, value: &str) -> Result<NaiveDate, AppError> {
            NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| {
                AppError::Validation(format!("{name} must be an ISO date (YYYY-MM-DD)"))
            })
        }

        let full_name = required("fullName", &self.full_name)?;
        let program = required("program", &self.program)?;
        let field_of_study = required("fieldOfStudy", &self.field_of_study)?;
        let issued_at = parse_date("issuedAt", &required("issuedAt", &self.issued_at)?)?;
        let expires_at = match &self.expires_at {
            Some(raw) if !raw.trim().is_empty() => Some(parse_date("expiresAt", raw)?),
            _ => None,
        };

        if let Some(expires_at) = expires_at {
            if expires_at < issued_at {
                return Err(AppError::Validation(
                    "expiresAt must not precede issuedAt".to_string(),
                ));
            }
        }

        Ok(ValidClaim {
            full_name,
            program,
            field_of_study,
            issued_at,
            expires_at,
        })
    }
}

/// Result of a successful issuance.
#[derive(Debug, Clone, Serialize)]
pub struct IssuedCertificate {
    pub certificate: Certificate,
    /// True when the artifact could not be rendered or published; the
    /// certificate is issued and verifiable regardless.
    pub artifact_pending: bool,
}

/// Sanitized certificate view returned to anonymous verifiers.
///
/// Issuer identity is the denormalized as-of-issuance snapshot; the
/// institution's current directory entry is never consulted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifiedCertificate {
    pub certificate_id: Uuid,
    pub full_name: String,
    pub program: String,
    pub field_of_study: String,
    pub issued_at: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<NaiveDate>,
    pub issuer_name: String,
    pub integrity_hash: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact_locator: Option<String>,
}

/// Outcome of a public verification query.
///
/// `Tampered` is a detection outcome, not a stored state: the row's status
/// is untouched, the mismatch is only surfaced to the verifying caller.
#[derive(Debug, Clone)]
pub enum VerificationOutcome {
    Valid(Box<VerifiedCertificate>),
    Revoked { reason: String },
    Tampered { reason: String },
    NotFound { reason: String },
}

impl VerificationOutcome {
    /// Audit classification and note for this outcome.
    fn audit_parts(&self) -> (AttemptStatus, String) {
        match self {
            VerificationOutcome::Valid(_) => {
                (AttemptStatus::Valid, "certificate verified".to_string())
            }
            VerificationOutcome::Revoked { reason }
            | VerificationOutcome::Tampered { reason }
            | VerificationOutcome::NotFound { reason } => {
                (AttemptStatus::Invalid, reason.clone())
            }
        }
    }
}

/// Column width of `verification_attempts.certificate_ref`.
const CERTIFICATE_REF_MAX_CHARS: usize = 128;
/// Column width of `verification_attempts.requester_ip`.
const REQUESTER_IP_MAX_CHARS: usize = 45;

/// Clamps a caller-supplied string to an audit column's width. The audit
/// append must never fail on input length, so oversized values are recorded
/// truncated rather than rejected.
fn clamp_for_audit(value: &str, max_chars: usize) -> String {
    value.chars().take(max_chars).collect()
}

/// The certificate engine, generic over its storage and blob ports.
///
/// Cheap to clone; adapters share their underlying pool or state across
/// clones.
#[derive(Clone)]
pub struct Engine<S, B> {
    store: S,
    blobs: B,
    public_base_url: String,
}

impl<S, B> Engine<S, B>
where
    S: CertificateStore + InstitutionDirectory,
    B: BlobPublisher,
{
    pub fn new(store: S, blobs: B, public_base_url: &str) -> Self {
        Self {
            store,
            blobs,
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Public URL a verifier lands on when scanning a certificate's QR code.
    pub fn verify_url(&self, certificate_id: Uuid) -> String {
        format!(
            "{}/verify?certificateId={certificate_id}",
            self.public_base_url
        )
    }

    /// Blob key under which a certificate's artifact is published.
    fn artifact_key(certificate_id: Uuid) -> String {
        format!("certificates/{certificate_id}.pdf")
    }

    /// Issues a certificate for the institution operated by `caller_user_id`.
    ///
    /// The row commits before the artifact is attempted; an artifact failure
    /// is reported via `artifact_pending`, never by failing the issuance.
    pub async fn issue(
        &self,
        claim: ClaimInput,
        caller_user_id: Uuid,
    ) -> Result<IssuedCertificate, AppError> {
        let claim = claim.validate()?;
        let institution = self.issuing_institution(caller_user_id).await?;

        // Identity is allocated here, never reused; the primary key
        // constraint is the backstop for the negligible collision case.
        let certificate_id = Uuid::new_v4();

        let integrity_hash = fingerprint(&FingerprintInput {
            certificate_id,
            institution_id: institution.id,
            full_name: claim.full_name.clone(),
            program: claim.program.clone(),
            field_of_study: claim.field_of_study.clone(),
            issued_at: claim.issued_at,
        })
        .map_err(|e| AppError::Internal(format!("fingerprint computation failed: {e}")))?;

        let certificate = self
            .store
            .insert_certificate(NewCertificate {
                certificate_id,
                institution_id: institution.id,
                full_name: claim.full_name,
                program: claim.program,
                field_of_study: claim.field_of_study,
                issued_at: claim.issued_at,
                expires_at: claim.expires_at,
                issuer_name: institution.name.clone(),
                issuer_email: institution.email.clone(),
                integrity_hash,
            })
            .await?;

        tracing::info!(
            certificate_id = %certificate.certificate_id,
            institution_id = %institution.id,
            "certificate issued"
        );

        // The record is authoritative from here on; the artifact is
        // best-effort and retriable.
        match self.publish_artifact(&certificate).await {
            Ok(locator) => Ok(IssuedCertificate {
                certificate: Certificate {
                    artifact_locator: Some(locator),
                    ..certificate
                },
                artifact_pending: false,
            }),
            Err(e) => {
                tracing::warn!(
                    certificate_id = %certificate.certificate_id,
                    error = %e,
                    "artifact publish failed; certificate issued without locator"
                );
                Ok(IssuedCertificate {
                    certificate,
                    artifact_pending: true,
                })
            }
        }
    }

    /// Issues many claims as independent sub-operations.
    ///
    /// Results come back in claim order; a failed item never rolls back or
    /// blocks the others.
    pub async fn issue_bulk(
        &self,
        claims: Vec<ClaimInput>,
        caller_user_id: Uuid,
    ) -> Vec<Result<IssuedCertificate, AppError>> {
        join_all(
            claims
                .into_iter()
                .map(|claim| self.issue(claim, caller_user_id)),
        )
        .await
    }

    /// Renders, publishes, and records the artifact for a certificate whose
    /// locator is still unset. Idempotent: a certificate that already has a
    /// locator is returned as-is.
    pub async fn ensure_artifact(
        &self,
        certificate_id: Uuid,
        caller_user_id: Uuid,
    ) -> Result<Certificate, AppError> {
        let institution = self.issuing_institution(caller_user_id).await?;
        let certificate = self.require_certificate(certificate_id).await?;
        if certificate.institution_id != institution.id {
            return Err(AppError::NotOwner(
                "certificate belongs to another institution".to_string(),
            ));
        }

        if certificate.has_artifact() {
            return Ok(certificate);
        }

        let locator = self.publish_artifact(&certificate).await?;
        Ok(Certificate {
            artifact_locator: Some(locator),
            ..certificate
        })
    }

    /// Lists the caller's institution's certificates, newest first.
    pub async fn list_certificates(
        &self,
        caller_user_id: Uuid,
    ) -> Result<Vec<Certificate>, AppError> {
        let institution = self
            .store
            .institution_for_user(caller_user_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound("no institution registered for caller".to_string())
            })?;
        self.store.certificates_for_institution(institution.id).await
    }

    /// Revokes a certificate. One-way and idempotent: revoking an already
    /// revoked certificate succeeds without a second transition, and nothing
    /// reinstates it.
    pub async fn revoke(
        &self,
        certificate_id: Uuid,
        caller_user_id: Uuid,
    ) -> Result<(), AppError> {
        let institution = self
            .store
            .institution_for_user(caller_user_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound("no institution registered for caller".to_string())
            })?;
        let certificate = self.require_certificate(certificate_id).await?;
        if certificate.institution_id != institution.id {
            return Err(AppError::NotOwner(
                "certificate belongs to another institution".to_string(),
            ));
        }

        if certificate.is_revoked() {
            return Ok(());
        }

        self.store.mark_revoked(certificate_id).await?;
        tracing::info!(certificate_id = %certificate_id, "certificate revoked");
        Ok(())
    }

    /// Verifies a certificate by its public identifier.
    ///
    /// Exactly one audit row is appended per call, whatever happens: a
    /// definitive outcome audits as `valid`/`invalid`, and an unexpected
    /// failure audits as `errored` with the error class before propagating.
    pub async fn verify(
        &self,
        certificate_ref: &str,
        requester_ip: &str,
    ) -> Result<VerificationOutcome, AppError> {
        let result = self.verify_uncounted(certificate_ref).await;

        let (status, notes) = match &result {
            Ok(outcome) => outcome.audit_parts(),
            Err(e) => (AttemptStatus::Errored, e.class().to_string()),
        };
        self.store
            .record_attempt(NewVerificationAttempt {
                certificate_ref: clamp_for_audit(certificate_ref, CERTIFICATE_REF_MAX_CHARS),
                requester_ip: clamp_for_audit(requester_ip, REQUESTER_IP_MAX_CHARS),
                status,
                notes: Some(notes),
            })
            .await?;

        result
    }

    /// The verification decision, without the audit append.
    async fn verify_uncounted(
        &self,
        certificate_ref: &str,
    ) -> Result<VerificationOutcome, AppError> {
        // The raw ref may be anything a caller typed into a URL; an
        // unparseable one is simply an identifier no certificate has.
        let Ok(certificate_id) = Uuid::parse_str(certificate_ref.trim()) else {
            return Ok(VerificationOutcome::NotFound {
                reason: "certificate not found".to_string(),
            });
        };

        let Some(certificate) = self.store.certificate_by_id(certificate_id).await? else {
            return Ok(VerificationOutcome::NotFound {
                reason: "certificate not found".to_string(),
            });
        };

        if certificate.is_revoked() {
            return Ok(VerificationOutcome::Revoked {
                reason: "certificate has been revoked".to_string(),
            });
        }

        let intact = matches_fingerprint(
            &certificate.fingerprint_input(),
            &certificate.integrity_hash,
        )
        .map_err(|e| AppError::Internal(format!("fingerprint recomputation failed: {e}")))?;
        if !intact {
            tracing::warn!(
                certificate_id = %certificate.certificate_id,
                "integrity hash mismatch on stored certificate"
            );
            return Ok(VerificationOutcome::Tampered {
                reason: "certificate failed its integrity check".to_string(),
            });
        }

        // The locator is resolved lazily for rows where the publish landed
        // but the row update did not; the row itself stays untouched here.
        let artifact_locator = match &certificate.artifact_locator {
            Some(locator) => Some(locator.clone()),
            None => self
                .blobs
                .resolve(&Self::artifact_key(certificate.certificate_id))
                .await
                .unwrap_or_default(),
        };

        Ok(VerificationOutcome::Valid(Box::new(VerifiedCertificate {
            certificate_id: certificate.certificate_id,
            full_name: certificate.full_name,
            program: certificate.program,
            field_of_study: certificate.field_of_study,
            issued_at: certificate.issued_at,
            expires_at: certificate.expires_at,
            issuer_name: certificate.issuer_name,
            integrity_hash: certificate.integrity_hash,
            artifact_locator,
        })))
    }

    /// Resolves the caller's institution and checks its issuance standing.
    async fn issuing_institution(
        &self,
        caller_user_id: Uuid,
    ) -> Result<Institution, AppError> {
        let institution = self
            .store
            .institution_for_user(caller_user_id)
            .await?
            .ok_or_else(|| {
                AppError::NotAuthorized("no institution registered for caller".to_string())
            })?;
        if !institution.can_issue() {
            return Err(AppError::NotApproved(
                "institution has not been approved for issuance".to_string(),
            ));
        }
        Ok(institution)
    }

    async fn require_certificate(&self, certificate_id: Uuid) -> Result<Certificate, AppError> {
        self.store
            .certificate_by_id(certificate_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("certificate {certificate_id} not found")))
    }

    /// Renders the certificate artifact and publishes it, recording the
    /// locator on the row. Returns the locator.
    async fn publish_artifact(&self, certificate: &Certificate) -> Result<String, AppError> {
        let document = CertificateDocument {
            certificate_id: certificate.certificate_id.to_string(),
            full_name: certificate.full_name.clone(),
            program: certificate.program.clone(),
            field_of_study: certificate.field_of_study.clone(),
            issued_at: certificate.issued_at.to_string(),
            expires_at: certificate.expires_at.map(|d| d.to_string()),
            issuer_name: certificate.issuer_name.clone(),
            verify_url: self.verify_url(certificate.certificate_id),
        };
        let bytes = render_certificate(&document)
            .map_err(|e| AppError::Storage(format!("artifact rendering failed: {e}")))?;

        let key = Self::artifact_key(certificate.certificate_id);
        let locator = self.blobs.publish(&key, &bytes).await?;
        self.store
            .set_artifact_locator(certificate.certificate_id, &locator)
            .await?;
        Ok(locator)
    }
}
