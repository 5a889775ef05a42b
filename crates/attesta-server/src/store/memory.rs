//! In-memory adapter for the storage ports.
//!
//! Backs the engine and router test suites, and doubles as a storage layer
//! for local experiments where a PostgreSQL instance is overkill. State is
//! shared across clones.

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{
    Certificate, CertificateStatus, Institution, NewCertificate, NewVerificationAttempt,
    VerificationAttempt,
};
use crate::store::{CertificateStore, InstitutionDirectory};

#[derive(Default)]
struct Inner {
    institutions: Vec<Institution>,
    certificates: Vec<Certificate>,
    attempts: Vec<VerificationAttempt>,
}

/// Storage backed by process memory.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>, AppError> {
        self.inner
            .lock()
            .map_err(|_| AppError::Internal("memory store mutex poisoned".to_string()))
    }

    /// Registers an institution in the directory.
    pub fn add_institution(&self, institution: Institution) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.institutions.push(institution);
        }
    }

    /// Snapshot of the audit log, in insertion order.
    pub fn attempts(&self) -> Vec<VerificationAttempt> {
        self.inner
            .lock()
            .map(|inner| inner.attempts.clone())
            .unwrap_or_default()
    }

    /// Edits a stored certificate row directly, bypassing the engine.
    /// Exists so tests can simulate store-level corruption. Returns false
    /// when no row has the given identifier.
    pub fn mutate_certificate(
        &self,
        certificate_id: Uuid,
        edit: impl FnOnce(&mut Certificate),
    ) -> bool {
        let Ok(mut inner) = self.inner.lock() else {
            return false;
        };
        match inner
            .certificates
            .iter_mut()
            .find(|c| c.certificate_id == certificate_id)
        {
            Some(certificate) => {
                edit(certificate);
                true
            }
            None => false,
        }
    }

    /// Number of stored certificate records.
    pub fn certificate_count(&self) -> usize {
        self.inner
            .lock()
            .map(|inner| inner.certificates.len())
            .unwrap_or_default()
    }
}

impl CertificateStore for MemoryStore {
    async fn insert_certificate(&self, new: NewCertificate) -> Result<Certificate, AppError> {
        let mut inner = self.lock()?;
        if inner
            .certificates
            .iter()
            .any(|c| c.certificate_id == new.certificate_id)
        {
            return Err(AppError::Internal(format!(
                "certificate id {} already exists",
                new.certificate_id
            )));
        }
        let certificate = Certificate {
            certificate_id: new.certificate_id,
            institution_id: new.institution_id,
            full_name: new.full_name,
            program: new.program,
            field_of_study: new.field_of_study,
            issued_at: new.issued_at,
            expires_at: new.expires_at,
            issuer_name: new.issuer_name,
            issuer_email: new.issuer_email,
            status: CertificateStatus::Valid,
            integrity_hash: new.integrity_hash,
            artifact_locator: None,
            created_at: Utc::now(),
        };
        inner.certificates.push(certificate.clone());
        Ok(certificate)
    }

    async fn certificate_by_id(
        &self,
        certificate_id: Uuid,
    ) -> Result<Option<Certificate>, AppError> {
        let inner = self.lock()?;
        Ok(inner
            .certificates
            .iter()
            .find(|c| c.certificate_id == certificate_id)
            .cloned())
    }

    async fn certificates_for_institution(
        &self,
        institution_id: Uuid,
    ) -> Result<Vec<Certificate>, AppError> {
        let inner = self.lock()?;
        // Insertion order reversed stands in for ORDER BY created_at DESC
        Ok(inner
            .certificates
            .iter()
            .rev()
            .filter(|c| c.institution_id == institution_id)
            .cloned()
            .collect())
    }

    async fn mark_revoked(&self, certificate_id: Uuid) -> Result<Certificate, AppError> {
        let mut inner = self.lock()?;
        let certificate = inner
            .certificates
            .iter_mut()
            .find(|c| c.certificate_id == certificate_id)
            .ok_or_else(|| AppError::NotFound(format!("certificate {certificate_id} not found")))?;
        certificate.status = CertificateStatus::Revoked;
        Ok(certificate.clone())
    }

    async fn set_artifact_locator(
        &self,
        certificate_id: Uuid,
        locator: &str,
    ) -> Result<(), AppError> {
        let mut inner = self.lock()?;
        let certificate = inner
            .certificates
            .iter_mut()
            .find(|c| c.certificate_id == certificate_id)
            .ok_or_else(|| AppError::NotFound(format!("certificate {certificate_id} not found")))?;
        certificate.artifact_locator = Some(locator.to_string());
        Ok(())
    }

    async fn record_attempt(
        &self,
        attempt: NewVerificationAttempt,
    ) -> Result<VerificationAttempt, AppError> {
        let mut inner = self.lock()?;
        let row = VerificationAttempt {
            id: Uuid::new_v4(),
            certificate_ref: attempt.certificate_ref,
            requester_ip: attempt.requester_ip,
            status: attempt.status,
            notes: attempt.notes,
            checked_at: Utc::now(),
        };
        inner.attempts.push(row.clone());
        Ok(row)
    }
}

impl InstitutionDirectory for MemoryStore {
    async fn institution_for_user(&self, user_id: Uuid) -> Result<Option<Institution>, AppError> {
        let inner = self.lock()?;
        Ok(inner
            .institutions
            .iter()
            .find(|i| i.user_id == user_id)
            .cloned())
    }

    async fn institution_by_id(
        &self,
        institution_id: Uuid,
    ) -> Result<Option<Institution>, AppError> {
        let inner = self.lock()?;
        Ok(inner
            .institutions
            .iter()
            .find(|i| i.id == institution_id)
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AttemptStatus;
    use chrono::NaiveDate;

    fn new_certificate(institution_id: Uuid) -> NewCertificate {
        NewCertificate {
            certificate_id: Uuid::new_v4(),
            institution_id,
            full_name: "Jane Doe".to_string(),
            program: "BSc".to_string(),
            field_of_study: "Physics".to_string(),
            issued_at: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            expires_at: None,
            issuer_name: "Aurora Technical University".to_string(),
            issuer_email: "registrar@aurora.example".to_string(),
            integrity_hash: "0".repeat(64),
        }
    }

    #[tokio::test]
    async fn test_insert_and_fetch_certificate() {
        let store = MemoryStore::new();
        let institution_id = Uuid::new_v4();

        let inserted = store
            .insert_certificate(new_certificate(institution_id))
            .await
            .unwrap();
        assert_eq!(inserted.status, CertificateStatus::Valid);
        assert_eq!(inserted.artifact_locator, None);

        let fetched = store
            .certificate_by_id(inserted.certificate_id)
            .await
            .unwrap()
            .expect("certificate should exist");
        assert_eq!(fetched.full_name, "Jane Doe");
    }

    #[tokio::test]
    async fn test_duplicate_certificate_id_is_rejected() {
        let store = MemoryStore::new();
        let mut new = new_certificate(Uuid::new_v4());
        new.certificate_id = Uuid::new_v4();

        store.insert_certificate(new.clone()).await.unwrap();
        let err = store.insert_certificate(new).await.unwrap_err();
        assert!(matches!(err, AppError::Internal(_)));
    }

    #[tokio::test]
    async fn test_listing_is_scoped_and_newest_first() {
        let store = MemoryStore::new();
        let mine = Uuid::new_v4();
        let theirs = Uuid::new_v4();

        let first = store
            .insert_certificate(new_certificate(mine))
            .await
            .unwrap();
        store
            .insert_certificate(new_certificate(theirs))
            .await
            .unwrap();
        let second = store
            .insert_certificate(new_certificate(mine))
            .await
            .unwrap();

        let listed = store.certificates_for_institution(mine).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].certificate_id, second.certificate_id);
        assert_eq!(listed[1].certificate_id, first.certificate_id);
    }

    #[tokio::test]
    async fn test_mark_revoked_is_idempotent() {
        let store = MemoryStore::new();
        let inserted = store
            .insert_certificate(new_certificate(Uuid::new_v4()))
            .await
            .unwrap();

        let once = store.mark_revoked(inserted.certificate_id).await.unwrap();
        assert_eq!(once.status, CertificateStatus::Revoked);

        let twice = store.mark_revoked(inserted.certificate_id).await.unwrap();
        assert_eq!(twice.status, CertificateStatus::Revoked);
    }

    #[tokio::test]
    async fn test_mark_revoked_unknown_certificate() {
        let store = MemoryStore::new();
        let err = store.mark_revoked(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_attempts_append_in_order() {
        let store = MemoryStore::new();
        for reference in ["first", "second"] {
            store
                .record_attempt(NewVerificationAttempt {
                    certificate_ref: reference.to_string(),
                    requester_ip: "203.0.113.7".to_string(),
                    status: AttemptStatus::Invalid,
                    notes: None,
                })
                .await
                .unwrap();
        }

        let attempts = store.attempts();
        assert_eq!(attempts.len(), 2);
        assert_eq!(attempts[0].certificate_ref, "first");
        assert_eq!(attempts[1].certificate_ref, "second");
    }

    #[tokio::test]
    async fn test_directory_resolves_by_user_and_id() {
        let store = MemoryStore::new();
        let institution_id = Uuid::new_v4();
        let user_id = Uuid::new_v4();
        store.add_institution(Institution {
            id: institution_id,
            name: "Aurora Technical University".to_string(),
            email: "registrar@aurora.example".to_string(),
            phone: None,
            address: None,
            website: None,
            approved: true,
            user_id,
            created_at: Utc::now(),
        });

        let found = store.institution_for_user(user_id).await.unwrap();
        assert!(found.is_some());

        let by_id = store.institution_by_id(institution_id).await.unwrap();
        assert_eq!(by_id.unwrap().user_id, user_id);

        let missing = store.institution_for_user(Uuid::new_v4()).await.unwrap();
        assert!(missing.is_none());
    }
}
