//! # Database Models
//!
//! Row types for the challenge and credential tables. Timestamps are stored
//! as RFC 3339 text, which is what SQLite handles most naturally.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Which of the two WebAuthn ceremonies a challenge belongs to.
///
/// A registration challenge can never satisfy an authentication finish (or
/// vice versa): the two ceremonies keep separate rows in the challenge
/// table, keyed by this kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(rename_all = "lowercase")]
pub enum CeremonyKind {
    Registration,
    Authentication,
}

/// One outstanding challenge for a (ceremony, subject) pair.
///
/// At most one of these exists per pair; a new `start*` call replaces the
/// previous row. The record is deleted when the matching `finish*` consumes
/// it, whether verification succeeds or fails.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ChallengeRecord {
    pub kind: CeremonyKind,
    pub subject: String,

    /// Raw random challenge bytes (32 bytes). The client echoes these back
    /// base64url-encoded inside `clientDataJSON`.
    pub challenge: Vec<u8>,

    pub created_at: String,
    pub expires_at: String,
}

impl ChallengeRecord {
    pub fn new(kind: CeremonyKind, subject: String, challenge: Vec<u8>, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            kind,
            subject,
            challenge,
            created_at: now.to_rfc3339(),
            expires_at: (now + ttl).to_rfc3339(),
        }
    }

    /// An expired challenge is treated exactly like an absent one. A record
    /// with an unparseable timestamp is considered expired too.
    pub fn is_expired(&self) -> bool {
        match DateTime::parse_from_rfc3339(&self.expires_at) {
            Ok(expires_at) => Utc::now() > expires_at,
            Err(_) => true,
        }
    }
}

/// A registered passkey credential.
///
/// Only public material is stored; the private key never leaves the
/// authenticator. The signature counter must strictly increase with every
/// assertion, which is how cloned authenticators are detected.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct CredentialRecord {
    /// Credential ID as issued by the authenticator, base64url-encoded.
    pub id: String,

    /// The subject (student ID) this credential belongs to.
    pub subject: String,

    /// Uncompressed SEC1 P-256 public key (65 bytes).
    pub public_key: Vec<u8>,

    /// Last signature counter seen from this credential.
    pub counter: i64,

    /// Transport hints reported at registration ("internal", "usb", ...),
    /// stored as a JSON array.
    pub transports: Option<String>,

    pub created_at: String,
    pub last_used_at: Option<String>,
}

impl CredentialRecord {
    pub fn new(
        id: String,
        subject: String,
        public_key: Vec<u8>,
        counter: i64,
        transports: Option<Vec<String>>,
    ) -> Self {
        Self {
            id,
            subject,
            public_key,
            counter,
            transports: transports.and_then(|t| serde_json::to_string(&t).ok()),
            created_at: Utc::now().to_rfc3339(),
            last_used_at: None,
        }
    }
}
