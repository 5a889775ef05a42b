//! Institution model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// An institution registered in the identity directory.
///
/// Institutions are created and approved out of band (operator tooling owns
/// that flow); the issuance engine only reads them.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Institution {
    /// Unique identifier for this institution.
    pub id: Uuid,
    /// Display name, printed on issued certificates.
    pub name: String,
    /// Contact email, denormalized onto issued certificates.
    pub email: String,
    /// Optional contact phone number.
    pub phone: Option<String>,
    /// Optional postal address.
    pub address: Option<String>,
    /// Optional public website.
    pub website: Option<String>,
    /// Whether an operator has approved this institution for issuance.
    pub approved: bool,
    /// Account that operates this institution.
    pub user_id: Uuid,
    /// When this institution was registered.
    pub created_at: DateTime<Utc>,
}

impl Institution {
    /// Check if the institution may issue certificates.
    pub fn can_issue(&self) -> bool {
        self.approved
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_approved_institutions_can_issue() {
        let mut institution = Institution {
            id: Uuid::new_v4(),
            name: "Aurora Technical University".to_string(),
            email: "registrar@aurora.example".to_string(),
            phone: None,
            address: None,
            website: Some("https://aurora.example".to_string()),
            approved: false,
            user_id: Uuid::new_v4(),
            created_at: Utc::now(),
        };
        assert!(!institution.can_issue());

        institution.approved = true;
        assert!(institution.can_issue());
    }
}
