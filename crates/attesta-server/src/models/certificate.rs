//! Certificate record model.

use attesta_crypto::FingerprintInput;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use uuid::Uuid;

/// Lifecycle states of a certificate.
///
/// The lifecycle is one-way: `Valid` to `Revoked`. Nothing reinstates a
/// revoked certificate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[sqlx(type_name = "certificate_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum CertificateStatus {
    Valid,
    Revoked,
}

/// An issued certificate record.
///
/// `issuer_name` and `issuer_email` are copied from the institution row at
/// issuance time so the record stays self-describing even if the institution
/// later renames itself. They are not covered by the integrity hash; the
/// covered fields are exactly those in [`Certificate::fingerprint_input`].
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Certificate {
    /// Public identifier; the primary key and a fingerprint component.
    pub certificate_id: Uuid,
    /// Institution that issued this certificate.
    pub institution_id: Uuid,
    /// Full legal name of the holder.
    pub full_name: String,
    /// Program or degree attested.
    pub program: String,
    /// Field of study within the program.
    pub field_of_study: String,
    /// Date the credential was conferred.
    pub issued_at: NaiveDate,
    /// Optional expiry date.
    pub expires_at: Option<NaiveDate>,
    /// Issuing institution's display name at issuance time.
    pub issuer_name: String,
    /// Issuing institution's contact email at issuance time.
    pub issuer_email: String,
    /// Current lifecycle status.
    pub status: CertificateStatus,
    /// SHA-256 fingerprint over the identifying fields, lowercase hex.
    pub integrity_hash: String,
    /// Public URL of the rendered artifact, once published.
    pub artifact_locator: Option<String>,
    /// When this record was created.
    pub created_at: DateTime<Utc>,
}

/// Data required to insert a certificate record.
///
/// Status is not a field: new certificates always start `valid`, and the
/// artifact locator is attached only after a successful publish.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCertificate {
    pub certificate_id: Uuid,
    pub institution_id: Uuid,
    pub full_name: String,
    pub program: String,
    pub field_of_study: String,
    pub issued_at: NaiveDate,
    pub expires_at: Option<NaiveDate>,
    pub issuer_name: String,
    pub issuer_email: String,
    pub integrity_hash: String,
}

impl Certificate {
    /// Check if the certificate is in the valid state.
    pub fn is_valid(&self) -> bool {
        self.status == CertificateStatus::Valid
    }

    /// Check if the certificate has been revoked.
    pub fn is_revoked(&self) -> bool {
        self.status == CertificateStatus::Revoked
    }

    /// Check if the certificate has a published artifact.
    pub fn has_artifact(&self) -> bool {
        self.artifact_locator.is_some()
    }

    /// Check if the credential has passed its expiry date. Informational:
    /// expiry never changes the stored status.
    pub fn is_expired_on(&self, today: NaiveDate) -> bool {
        match self.expires_at {
            Some(expires_at) => today > expires_at,
            None => false,
        }
    }

    /// The fingerprint-covered field set of this record, used to recompute
    /// the integrity hash during verification.
    pub fn fingerprint_input(&self) -> FingerprintInput {
        FingerprintInput {
            certificate_id: self.certificate_id,
            institution_id: self.institution_id,
            full_name: self.full_name.clone(),
            program: self.program.clone(),
            field_of_study: self.field_of_study.clone(),
            issued_at: self.issued_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use attesta_crypto::{fingerprint, matches_fingerprint};

    fn sample() -> Certificate {
        Certificate {
            certificate_id: Uuid::new_v4(),
            institution_id: Uuid::new_v4(),
            full_name: "Jane Doe".to_string(),
            program: "Bachelor of Science".to_string(),
            field_of_study: "Computer Science".to_string(),
            issued_at: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            expires_at: None,
            issuer_name: "Aurora Technical University".to_string(),
            issuer_email: "registrar@aurora.example".to_string(),
            status: CertificateStatus::Valid,
            integrity_hash: String::new(),
            artifact_locator: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&CertificateStatus::Valid).unwrap(),
            "\"valid\""
        );
        assert_eq!(
            serde_json::to_string(&CertificateStatus::Revoked).unwrap(),
            "\"revoked\""
        );
    }

    #[test]
    fn test_status_helpers() {
        let mut certificate = sample();
        assert!(certificate.is_valid());
        assert!(!certificate.is_revoked());

        certificate.status = CertificateStatus::Revoked;
        assert!(!certificate.is_valid());
        assert!(certificate.is_revoked());
    }

    #[test]
    fn test_expiry_is_informational() {
        let mut certificate = sample();
        let expires = NaiveDate::from_ymd_opt(2026, 6, 1).unwrap();
        certificate.expires_at = Some(expires);

        // Not expired on the expiry date itself, expired the day after
        assert!(!certificate.is_expired_on(expires));
        assert!(certificate.is_expired_on(expires.succ_opt().unwrap()));
        // Still reported valid either way
        assert!(certificate.is_valid());
    }

    #[test]
    fn test_no_expiry_never_expires() {
        let certificate = sample();
        assert!(!certificate.is_expired_on(NaiveDate::from_ymd_opt(2999, 1, 1).unwrap()));
    }

    #[test]
    fn test_fingerprint_input_covers_identifying_fields() {
        let mut certificate = sample();
        certificate.integrity_hash = fingerprint(&certificate.fingerprint_input()).unwrap();

        assert!(matches_fingerprint(
            &certificate.fingerprint_input(),
            &certificate.integrity_hash
        )
        .unwrap());

        // Editing a covered field breaks the match
        certificate.program = "Master of Science".to_string();
        assert!(!matches_fingerprint(
            &certificate.fingerprint_input(),
            &certificate.integrity_hash
        )
        .unwrap());
    }

    #[test]
    fn test_issuer_fields_are_not_fingerprint_covered() {
        let mut certificate = sample();
        certificate.integrity_hash = fingerprint(&certificate.fingerprint_input()).unwrap();

        // Issuer display fields may be denormalized snapshots; changing them
        // must not read as tampering.
        certificate.issuer_name = "Renamed University".to_string();
        certificate.issuer_email = "new@aurora.example".to_string();
        assert!(matches_fingerprint(
            &certificate.fingerprint_input(),
            &certificate.integrity_hash
        )
        .unwrap());
    }
}
