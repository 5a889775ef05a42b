//! Storage ports for certificate records, institutions, and the audit log.
//!
//! The engine talks to storage through these traits so the full issuance and
//! verification logic runs against the in-memory adapter in tests and the
//! PostgreSQL adapter in production.

pub mod memory;
pub mod pg;

use std::future::Future;

use uuid::Uuid;

use crate::error::AppError;
use crate::models::{
    Certificate, Institution, NewCertificate, NewVerificationAttempt, VerificationAttempt,
};

pub use memory::MemoryStore;
pub use pg::PgStore;

/// Relational store for certificate records and the verification audit log.
///
/// Methods return explicitly `Send` futures so routers generic over the
/// store can prove their handlers `Send`.
pub trait CertificateStore: Clone + Send + Sync + 'static {
    /// Inserts a new certificate record. Fails if the certificate id is
    /// already taken.
    fn insert_certificate(
        &self,
        new: NewCertificate,
    ) -> impl Future<Output = Result<Certificate, AppError>> + Send;

    /// Fetches a certificate by its public identifier.
    fn certificate_by_id(
        &self,
        certificate_id: Uuid,
    ) -> impl Future<Output = Result<Option<Certificate>, AppError>> + Send;

    /// Lists an institution's certificates, newest first.
    fn certificates_for_institution(
        &self,
        institution_id: Uuid,
    ) -> impl Future<Output = Result<Vec<Certificate>, AppError>> + Send;

    /// Moves a certificate to the revoked state and returns the updated row.
    fn mark_revoked(
        &self,
        certificate_id: Uuid,
    ) -> impl Future<Output = Result<Certificate, AppError>> + Send;

    /// Records the public locator of a certificate's published artifact.
    fn set_artifact_locator(
        &self,
        certificate_id: Uuid,
        locator: &str,
    ) -> impl Future<Output = Result<(), AppError>> + Send;

    /// Appends a verification attempt to the audit log.
    fn record_attempt(
        &self,
        attempt: NewVerificationAttempt,
    ) -> impl Future<Output = Result<VerificationAttempt, AppError>> + Send;
}

/// Directory resolving authenticated accounts to the institution they
/// operate.
pub trait InstitutionDirectory: Clone + Send + Sync + 'static {
    /// Finds the institution operated by `user_id`, if any.
    fn institution_for_user(
        &self,
        user_id: Uuid,
    ) -> impl Future<Output = Result<Option<Institution>, AppError>> + Send;

    /// Finds an institution by its identifier.
    fn institution_by_id(
        &self,
        institution_id: Uuid,
    ) -> impl Future<Output = Result<Option<Institution>, AppError>> + Send;
}
