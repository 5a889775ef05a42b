//! PostgreSQL adapter for the storage ports.

use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{
    Certificate, Institution, NewCertificate, NewVerificationAttempt, VerificationAttempt,
};
use crate::store::{CertificateStore, InstitutionDirectory};

/// Columns selected for certificate rows, in [`Certificate`] field order.
const CERTIFICATE_COLUMNS: &str = "certificate_id, institution_id, full_name, program, \
     field_of_study, issued_at, expires_at, issuer_name, issuer_email, status, \
     integrity_hash, artifact_locator, created_at";

/// Storage backed by a PostgreSQL pool.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl CertificateStore for PgStore {
    async fn insert_certificate(&self, new: NewCertificate) -> Result<Certificate, AppError> {
        let row = sqlx::query_as::<_, Certificate>(&format!(
            r#"
            INSERT INTO certificates
                (certificate_id, institution_id, full_name, program, field_of_study,
                 issued_at, expires_at, issuer_name, issuer_email, integrity_hash, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, NOW())
            RETURNING {CERTIFICATE_COLUMNS}
            "#
        ))
        .bind(new.certificate_id)
        .bind(new.institution_id)
        .bind(&new.full_name)
        .bind(&new.program)
        .bind(&new.field_of_study)
        .bind(new.issued_at)
        .bind(new.expires_at)
        .bind(&new.issuer_name)
        .bind(&new.issuer_email)
        .bind(&new.integrity_hash)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    async fn certificate_by_id(
        &self,
        certificate_id: Uuid,
    ) -> Result<Option<Certificate>, AppError> {
        let row = sqlx::query_as::<_, Certificate>(&format!(
            "SELECT {CERTIFICATE_COLUMNS} FROM certificates WHERE certificate_id = $1"
        ))
        .bind(certificate_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn certificates_for_institution(
        &self,
        institution_id: Uuid,
    ) -> Result<Vec<Certificate>, AppError> {
        let rows = sqlx::query_as::<_, Certificate>(&format!(
            "SELECT {CERTIFICATE_COLUMNS} FROM certificates \
             WHERE institution_id = $1 ORDER BY created_at DESC"
        ))
        .bind(institution_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn mark_revoked(&self, certificate_id: Uuid) -> Result<Certificate, AppError> {
        let row = sqlx::query_as::<_, Certificate>(&format!(
            r#"
            UPDATE certificates SET status = 'revoked'
            WHERE certificate_id = $1
            RETURNING {CERTIFICATE_COLUMNS}
            "#
        ))
        .bind(certificate_id)
        .fetch_optional(&self.pool)
        .await?;

        row.ok_or_else(|| AppError::NotFound(format!("certificate {certificate_id} not found")))
    }

    async fn set_artifact_locator(
        &self,
        certificate_id: Uuid,
        locator: &str,
    ) -> Result<(), AppError> {
        let result = sqlx::query(
            "UPDATE certificates SET artifact_locator = $2 WHERE certificate_id = $1",
        )
        .bind(certificate_id)
        .bind(locator)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "certificate {certificate_id} not found"
            )));
        }
        Ok(())
    }

    async fn record_attempt(
        &self,
        attempt: NewVerificationAttempt,
    ) -> Result<VerificationAttempt, AppError> {
        let row = sqlx::query_as::<_, VerificationAttempt>(
            r#"
            INSERT INTO verification_attempts
                (id, certificate_ref, requester_ip, status, notes, checked_at)
            VALUES ($1, $2, $3, $4, $5, NOW())
            RETURNING id, certificate_ref, requester_ip, status, notes, checked_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&attempt.certificate_ref)
        .bind(&attempt.requester_ip)
        .bind(attempt.status)
        .bind(&attempt.notes)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }
}

impl InstitutionDirectory for PgStore {
    async fn institution_for_user(&self, user_id: Uuid) -> Result<Option<Institution>, AppError> {
        let row = sqlx::query_as::<_, Institution>(
            r#"
            SELECT id, name, email, phone, address, website, approved, user_id, created_at
            FROM institutions
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn institution_by_id(
        &self,
        institution_id: Uuid,
    ) -> Result<Option<Institution>, AppError> {
        let row = sqlx::query_as::<_, Institution>(
            r#"
            SELECT id, name, email, phone, address, website, approved, user_id, created_at
            FROM institutions
            WHERE id = $1
            "#,
        )
        .bind(institution_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }
}
