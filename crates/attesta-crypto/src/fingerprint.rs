// Certificate fingerprint computation and comparison

use anyhow::Result;

use crate::hash::sha256_hex;
use crate::jcs::canonical_bytes;
use crate::types::FingerprintInput;

/// Computes the integrity fingerprint for a certificate.
///
/// The fingerprint is `sha256(jcs(input))` as lowercase hex. Canonical JSON
/// gives every field an unambiguous boundary, so `full_name: "Jane|Doe"` and
/// `program: "BSc"` can never hash equal to `full_name: "Jane"` and
/// `program: "Doe|BSc"`. Including `certificate_id` makes the digest unique
/// per record even when two certificates attest identical claims.
///
/// # Errors
/// Fails only if canonical serialization fails, which for `FingerprintInput`
/// means a malformed date or similar construction bug upstream.
pub fn fingerprint(input: &FingerprintInput) -> Result<String> {
    let bytes = canonical_bytes(input)?;
    Ok(sha256_hex(&bytes))
}

/// Recomputes the fingerprint for `input` and compares it to a stored value.
///
/// Returns `Ok(true)` when the stored hash matches the recomputation exactly.
/// A mismatch is not an error: it is the signal that the record's covered
/// fields changed after issuance, and callers decide what to do with it.
pub fn matches_fingerprint(input: &FingerprintInput, stored: &str) -> Result<bool> {
    let computed = fingerprint(input)?;
    Ok(computed == stored)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use uuid::Uuid;

    fn sample() -> FingerprintInput {
        FingerprintInput {
            certificate_id: Uuid::parse_str("7a4a7908-31bc-4f4a-8dc1-3e0a0f6f55d1").unwrap(),
            institution_id: Uuid::parse_str("f3c4b1c2-6a5d-4e8f-9b0a-1c2d3e4f5a6b").unwrap(),
            full_name: "Jane Doe".to_string(),
            program: "Bachelor of Science".to_string(),
            field_of_study: "Computer Science".to_string(),
            issued_at: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
        }
    }

    #[test]
    fn test_known_fingerprint_vector() {
        // sha256 of the JCS form of `sample()`; pins the canonical encoding
        // so accidental field renames or encoding changes fail loudly.
        let digest = fingerprint(&sample()).unwrap();
        assert_eq!(
            digest,
            "9d2bfcf6eaf35caf60e3719b7ff1b2be3a8d1900f3cff8dbffc67e6cf05a1779"
        );
    }

    #[test]
    fn test_fingerprint_is_deterministic() {
        let input = sample();
        assert_eq!(fingerprint(&input).unwrap(), fingerprint(&input).unwrap());
    }

    #[test]
    fn test_every_field_is_covered() {
        let base = fingerprint(&sample()).unwrap();

        let mut input = sample();
        input.certificate_id = Uuid::parse_str("00000000-0000-4000-8000-000000000001").unwrap();
        assert_ne!(fingerprint(&input).unwrap(), base, "certificate_id not covered");

        let mut input = sample();
        input.institution_id = Uuid::parse_str("00000000-0000-4000-8000-000000000002").unwrap();
        assert_ne!(fingerprint(&input).unwrap(), base, "institution_id not covered");

        let mut input = sample();
        input.full_name = "Jane Roe".to_string();
        assert_ne!(fingerprint(&input).unwrap(), base, "full_name not covered");

        let mut input = sample();
        input.program = "Master of Science".to_string();
        assert_ne!(fingerprint(&input).unwrap(), base, "program not covered");

        let mut input = sample();
        input.field_of_study = "Mathematics".to_string();
        assert_ne!(fingerprint(&input).unwrap(), base, "field_of_study not covered");

        let mut input = sample();
        input.issued_at = NaiveDate::from_ymd_opt(2025, 6, 2).unwrap();
        assert_ne!(fingerprint(&input).unwrap(), base, "issued_at not covered");
    }

    #[test]
    fn test_field_boundaries_cannot_be_shifted() {
        // A delimiter-joined encoding would hash these two the same:
        // "Jane|Doe|BSc|..." from either split. Canonical JSON must not.
        let mut a = sample();
        a.full_name = "Jane".to_string();
        a.program = "Doe|BSc".to_string();

        let mut b = sample();
        b.full_name = "Jane|Doe".to_string();
        b.program = "BSc".to_string();

        assert_ne!(fingerprint(&a).unwrap(), fingerprint(&b).unwrap());
    }

    #[test]
    fn test_identical_claims_distinct_certificates() {
        // Same person, same program, same date, two record ids: the
        // fingerprints must differ so one hash can't vouch for the other.
        let a = sample();
        let mut b = sample();
        b.certificate_id = Uuid::new_v4();

        assert_ne!(fingerprint(&a).unwrap(), fingerprint(&b).unwrap());
    }

    #[test]
    fn test_matches_fingerprint_round_trip() {
        let input = sample();
        let stored = fingerprint(&input).unwrap();
        assert!(matches_fingerprint(&input, &stored).unwrap());
    }

    #[test]
    fn test_matches_fingerprint_detects_drift() {
        let input = sample();
        let stored = fingerprint(&input).unwrap();

        let mut tampered = input.clone();
        tampered.full_name = "John Doe".to_string();
        assert!(!matches_fingerprint(&tampered, &stored).unwrap());
    }

    #[test]
    fn test_mismatched_case_is_not_a_match() {
        let input = sample();
        let stored = fingerprint(&input).unwrap().to_uppercase();
        assert!(!matches_fingerprint(&input, &stored).unwrap());
    }
}
