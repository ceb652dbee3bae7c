//! # Challenge Store
//!
//! Holds the single outstanding challenge per (ceremony kind, subject) pair.
//! `put` replaces any previous row for the pair; `take` is an atomic
//! `DELETE ... RETURNING`, so a response replayed into two concurrent
//! `finish*` calls can only be verified once.

use sqlx::SqlitePool;

use crate::db::models::{CeremonyKind, ChallengeRecord};

#[derive(Debug, Clone)]
pub struct ChallengeStore {
    pool: SqlitePool,
}

impl ChallengeStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Store a challenge record, replacing any outstanding challenge for
    /// the same (kind, subject) pair.
    pub async fn put(&self, record: &ChallengeRecord) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO webauthn_challenges (kind, subject, challenge, created_at, expires_at)
             VALUES (?, ?, ?, ?, ?)
             ON CONFLICT (kind, subject) DO UPDATE SET
                 challenge = excluded.challenge,
                 created_at = excluded.created_at,
                 expires_at = excluded.expires_at",
        )
        .bind(record.kind)
        .bind(&record.subject)
        .bind(&record.challenge)
        .bind(&record.created_at)
        .bind(&record.expires_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Atomically consume the outstanding challenge for a pair. Returns
    /// `None` if there is none, or if the stored one had already expired
    /// (it is deleted either way — challenges are single-use).
    pub async fn take(
        &self,
        kind: CeremonyKind,
        subject: &str,
    ) -> Result<Option<ChallengeRecord>, sqlx::Error> {
        let record = sqlx::query_as::<_, ChallengeRecord>(
            "DELETE FROM webauthn_challenges
             WHERE kind = ? AND subject = ?
             RETURNING kind, subject, challenge, created_at, expires_at",
        )
        .bind(kind)
        .bind(subject)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record.filter(|r| !r.is_expired()))
    }

    /// Delete all expired challenges. Run periodically; `take` already
    /// refuses expired rows, this just keeps the table from growing.
    pub async fn evict_expired(&self) -> Result<u64, sqlx::Error> {
        let now = chrono::Utc::now().to_rfc3339();

        let result = sqlx::query("DELETE FROM webauthn_challenges WHERE expires_at < ?")
            .bind(&now)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
