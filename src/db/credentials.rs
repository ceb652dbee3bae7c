//! # Credential Store
//!
//! Durable storage for registered passkey credentials, keyed by the
//! credential ID the authenticator issued. Subjects are provisioned
//! implicitly: the first successful registration for a student ID creates
//! its namespace.

use chrono::Utc;
use sqlx::SqlitePool;

use crate::db::models::CredentialRecord;

#[derive(Debug, Clone)]
pub struct CredentialStore {
    pool: SqlitePool,
}

impl CredentialStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Persist a newly registered credential.
    pub async fn insert(&self, record: &CredentialRecord) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO webauthn_credentials
                 (id, subject, public_key, counter, transports, created_at, last_used_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&record.id)
        .bind(&record.subject)
        .bind(&record.public_key)
        .bind(record.counter)
        .bind(&record.transports)
        .bind(&record.created_at)
        .bind(&record.last_used_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// All credentials registered for a subject. Empty if the subject has
    /// never completed a registration.
    pub async fn list_for_subject(
        &self,
        subject: &str,
    ) -> Result<Vec<CredentialRecord>, sqlx::Error> {
        sqlx::query_as::<_, CredentialRecord>(
            "SELECT * FROM webauthn_credentials WHERE subject = ? ORDER BY created_at",
        )
        .bind(subject)
        .fetch_all(&self.pool)
        .await
    }

    /// Look up a credential by ID, scoped to a subject. A credential ID
    /// registered under a different subject is not visible here.
    pub async fn find(
        &self,
        credential_id: &str,
        subject: &str,
    ) -> Result<Option<CredentialRecord>, sqlx::Error> {
        sqlx::query_as::<_, CredentialRecord>(
            "SELECT * FROM webauthn_credentials WHERE id = ? AND subject = ?",
        )
        .bind(credential_id)
        .bind(subject)
        .fetch_optional(&self.pool)
        .await
    }

    /// Record the signature counter from a successful assertion and stamp
    /// the credential as used.
    pub async fn update_counter(
        &self,
        credential_id: &str,
        counter: i64,
    ) -> Result<(), sqlx::Error> {
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            "UPDATE webauthn_credentials SET counter = ?, last_used_at = ? WHERE id = ?",
        )
        .bind(counter)
        .bind(&now)
        .bind(credential_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
