// Saved certificate records for offline commands

use anyhow::Result;
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use attesta_crypto::FingerprintInput;
use attesta_render::CertificateDocument;

/// A certificate record as returned by the server's issue and list
/// endpoints, saved to a file for offline fingerprint checks and artifact
/// previews.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificateRecord {
    pub certificate_id: Uuid,
    pub institution_id: Uuid,
    pub full_name: String,
    pub program: String,
    pub field_of_study: String,
    pub issued_at: NaiveDate,
    #[serde(default)]
    pub expires_at: Option<NaiveDate>,
    pub issuer_name: String,
    pub integrity_hash: String,
}

impl CertificateRecord {
    /// Loads a record from a JSON file.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read '{}': {}", path, e))?;
        serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse '{}': {}", path, e))
    }

    /// The fingerprint-covered field set of this record.
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

    /// The renderable document for this record, with the QR target supplied
    /// by the caller.
    pub fn document(&self, verify_url: &str) -> CertificateDocument {
        CertificateDocument {
            certificate_id: self.certificate_id.to_string(),
            full_name: self.full_name.clone(),
            program: self.program.clone(),
            field_of_study: self.field_of_study.clone(),
            issued_at: self.issued_at.to_string(),
            expires_at: self.expires_at.map(|d| d.to_string()),
            issuer_name: self.issuer_name.clone(),
            verify_url: verify_url.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn sample_json() -> String {
        serde_json::json!({
            "certificateId": "7a4a7908-31bc-4f4a-8dc1-3e0a0f6f55d1",
            "institutionId": "f3c4b1c2-6a5d-4e8f-9b0a-1c2d3e4f5a6b",
            "fullName": "Jane Doe",
            "program": "Bachelor of Science",
            "fieldOfStudy": "Computer Science",
            "issuedAt": "2025-06-01",
            "issuerName": "Aurora Technical University",
            "issuerEmail": "registrar@aurora.example",
            "status": "valid",
            "integrityHash": "9d2bfcf6eaf35caf60e3719b7ff1b2be3a8d1900f3cff8dbffc67e6cf05a1779",
            "createdAt": "2025-06-01T12:00:00Z"
        })
        .to_string()
    }

    #[test]
    fn test_loads_server_response_shape() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(sample_json().as_bytes()).unwrap();

        let record = CertificateRecord::load(file.path().to_str().unwrap()).unwrap();
        assert_eq!(record.full_name, "Jane Doe");
        assert_eq!(record.expires_at, None);
    }

    #[test]
    fn test_fingerprint_round_trip_from_saved_record() {
        let record: CertificateRecord = serde_json::from_str(&sample_json()).unwrap();
        let computed = attesta_crypto::fingerprint(&record.fingerprint_input()).unwrap();
        assert_eq!(computed, record.integrity_hash);
    }

    #[test]
    fn test_document_carries_the_verify_url() {
        let record: CertificateRecord = serde_json::from_str(&sample_json()).unwrap();
        let doc = record.document("https://attesta.example/verify?certificateId=x");
        assert_eq!(doc.verify_url, "https://attesta.example/verify?certificateId=x");
        assert_eq!(doc.certificate_id, record.certificate_id.to_string());
        assert_eq!(doc.issued_at, "2025-06-01");
    }
}
