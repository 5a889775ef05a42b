//! Certificate artifact rendering.
//!
//! Turns an issued certificate into a distributable PDF: one A4 page with
//! the claim text, issuance dates, and a QR verification code that deep-links
//! into the public verify endpoint. The renderer is pure — it takes a fully
//! resolved [`CertificateDocument`] and returns bytes, leaving storage and
//! URL construction to the caller.

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod pdf;
pub mod qr;

pub use pdf::render_certificate;
pub use qr::QrMatrix;

/// Errors produced while rendering a certificate artifact.
#[derive(Debug, Error)]
pub enum RenderError {
    /// A required document field was empty or whitespace-only.
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// The QR payload could not be encoded (typically: too long).
    #[error("QR encoding failed: {0}")]
    Qr(String),
}

/// A fully resolved certificate, ready to render.
///
/// Dates arrive pre-formatted (`YYYY-MM-DD`) so the renderer never touches a
/// calendar, and `verify_url` arrives complete so the renderer never knows
/// where the service is deployed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CertificateDocument {
    /// Public identifier printed on the page and embedded in the QR target
    pub certificate_id: String,
    /// Full legal name of the certificate holder
    pub full_name: String,
    /// Program or degree the certificate attests
    pub program: String,
    /// Field of study within the program
    pub field_of_study: String,
    /// Conferral date, pre-formatted
    pub issued_at: String,
    /// Expiry date, pre-formatted; omitted from the page when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<String>,
    /// Display name of the issuing institution
    pub issuer_name: String,
    /// Absolute URL the QR code resolves to
    pub verify_url: String,
}

impl CertificateDocument {
    /// Checks that every required field carries non-blank content.
    pub(crate) fn require_complete(&self) -> Result<(), RenderError> {
        let required: [(&'static str, &str); 7] = [
            ("certificate_id", &self.certificate_id),
            ("full_name", &self.full_name),
            ("program", &self.program),
            ("field_of_study", &self.field_of_study),
            ("issued_at", &self.issued_at),
            ("issuer_name", &self.issuer_name),
            ("verify_url", &self.verify_url),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(RenderError::MissingField(name));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete() -> CertificateDocument {
        CertificateDocument {
            certificate_id: "cert-1".to_string(),
            full_name: "Jane Doe".to_string(),
            program: "BSc".to_string(),
            field_of_study: "Physics".to_string(),
            issued_at: "2025-01-15".to_string(),
            expires_at: None,
            issuer_name: "Aurora Technical University".to_string(),
            verify_url: "https://attesta.example/verify?certificateId=cert-1".to_string(),
        }
    }

    #[test]
    fn test_complete_document_passes() {
        assert!(complete().require_complete().is_ok());
    }

    #[test]
    fn test_each_required_field_is_checked() {
        let fields: [(&str, fn(&mut CertificateDocument)); 7] = [
            ("certificate_id", |d| d.certificate_id.clear()),
            ("full_name", |d| d.full_name.clear()),
            ("program", |d| d.program.clear()),
            ("field_of_study", |d| d.field_of_study.clear()),
            ("issued_at", |d| d.issued_at.clear()),
            ("issuer_name", |d| d.issuer_name.clear()),
            ("verify_url", |d| d.verify_url.clear()),
        ];
        for (name, clear) in fields {
            let mut doc = complete();
            clear(&mut doc);
            match doc.require_complete() {
                Err(RenderError::MissingField(field)) => assert_eq!(field, name),
                other => panic!("expected MissingField({name}), got {other:?}"),
            }
        }
    }

    #[test]
    fn test_expires_at_is_not_required() {
        let mut doc = complete();
        doc.expires_at = None;
        assert!(doc.require_complete().is_ok());
    }

    #[test]
    fn test_deserializes_without_expires_at() {
        let json = r#"{
            "certificate_id": "cert-1",
            "full_name": "Jane Doe",
            "program": "BSc",
            "field_of_study": "Physics",
            "issued_at": "2025-01-15",
            "issuer_name": "Aurora Technical University",
            "verify_url": "https://attesta.example/verify?certificateId=cert-1"
        }"#;
        let doc: CertificateDocument = serde_json::from_str(json).unwrap();
        assert_eq!(doc.expires_at, None);
    }
}
