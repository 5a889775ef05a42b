//! Input types for certificate fingerprinting.
//!
//! `FingerprintInput` is the exact field set covered by a certificate's
//! integrity hash. The serialized key names and value encodings are part of
//! the fingerprint format: renaming a field or changing how a value is
//! encoded changes every fingerprint, so treat this struct as a wire format,
//! not an internal convenience.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The identifying fields of a certificate, in fingerprint-covered form.
///
/// `certificate_id` is part of the input on purpose: two certificates that
/// attest identical claims for the same person still carry distinct
/// fingerprints, so a hash can never be replayed from one record to another.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FingerprintInput {
    /// Public identifier of the certificate record
    pub certificate_id: Uuid,
    /// Identifier of the issuing institution
    pub institution_id: Uuid,
    /// Full legal name of the certificate holder
    pub full_name: String,
    /// Program or degree the certificate attests
    pub program: String,
    /// Field of study within the program
    pub field_of_study: String,
    /// Date the credential was conferred (encodes as "YYYY-MM-DD")
    pub issued_at: NaiveDate,
}
