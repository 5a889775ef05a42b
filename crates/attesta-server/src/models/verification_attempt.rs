//! Verification attempt audit model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use uuid::Uuid;

/// Outcome class recorded for a verification attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[sqlx(type_name = "attempt_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AttemptStatus {
    /// The certificate verified successfully.
    Valid,
    /// The certificate was missing, revoked, or failed its integrity check.
    Invalid,
    /// Reserved for checks that complete asynchronously.
    Pending,
    /// Verification itself failed before reaching an outcome.
    Errored,
}

/// One row in the verification audit log.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct VerificationAttempt {
    /// Unique identifier for this attempt.
    pub id: Uuid,
    /// Raw identifier the caller asked about. Deliberately not a foreign
    /// key: attempts against unknown or malformed identifiers are recorded
    /// too.
    pub certificate_ref: String,
    /// Requester's IP address as reported by the fronting proxy.
    pub requester_ip: String,
    /// Outcome class of the attempt.
    pub status: AttemptStatus,
    /// Human-readable detail about the outcome.
    pub notes: Option<String>,
    /// When the check happened.
    pub checked_at: DateTime<Utc>,
}

/// Data required to append an audit row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewVerificationAttempt {
    pub certificate_ref: String,
    pub requester_ip: String,
    pub status: AttemptStatus,
    pub notes: Option<String>,
}

impl VerificationAttempt {
    /// Check if the attempt ended in a definitive outcome.
    pub fn is_settled(&self) -> bool {
        matches!(self.status, AttemptStatus::Valid | AttemptStatus::Invalid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&AttemptStatus::Valid).unwrap(),
            "\"valid\""
        );
        assert_eq!(
            serde_json::to_string(&AttemptStatus::Invalid).unwrap(),
            "\"invalid\""
        );
        assert_eq!(
            serde_json::to_string(&AttemptStatus::Pending).unwrap(),
            "\"pending\""
        );
        assert_eq!(
            serde_json::to_string(&AttemptStatus::Errored).unwrap(),
            "\"errored\""
        );
    }

    #[test]
    fn test_settled_statuses() {
        let mut attempt = VerificationAttempt {
            id: Uuid::new_v4(),
            certificate_ref: "not-even-a-uuid".to_string(),
            requester_ip: "203.0.113.7".to_string(),
            status: AttemptStatus::Invalid,
            notes: Some("no certificate record for this identifier".to_string()),
            checked_at: Utc::now(),
        };
        assert!(attempt.is_settled());

        attempt.status = AttemptStatus::Valid;
        assert!(attempt.is_settled());

        attempt.status = AttemptStatus::Pending;
        assert!(!attempt.is_settled());

        attempt.status = AttemptStatus::Errored;
        assert!(!attempt.is_settled());
    }
}
