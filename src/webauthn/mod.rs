//! # WebAuthn Ceremony Manager
//!
//! Drives the two WebAuthn ceremonies end-to-end on the server side.
//!
//! ## Ceremony shape
//! Both ceremonies are two round trips keyed by (kind, subject):
//! 1. `start_*` issues a fresh random challenge and stores it, replacing
//!    any outstanding challenge for the pair.
//! 2. `finish_*` atomically consumes the challenge (success or failure —
//!    challenges are single-use) and verifies the authenticator's response
//!    against the configured relying party and origin.
//!
//! There is no resting "verified" state: after a finish the pair is back to
//! having no challenge, and the portal turns a successful authentication
//! into whatever session it wants.
//!
//! ## Submodules
//! - `types`: wire types for options and responses
//! - `verify`: parsing and cryptographic verification primitives
//! - `registration`: credential creation ceremony
//! - `authentication`: assertion ceremony

pub mod authentication;
pub mod registration;
pub mod types;
pub mod verify;

use rand::RngCore;

use crate::config::Config;
use crate::db::{ChallengeStore, CredentialStore};

/// Challenge size in bytes. The protocol floor is 16; 32 matches what the
/// major server libraries issue.
const CHALLENGE_LEN: usize = 32;

/// Owns challenge lifecycle and response verification for both ceremonies.
///
/// Constructed once at startup with the relying-party identity and the two
/// stores injected; cheap to clone (the stores share a pool).
#[derive(Debug, Clone)]
pub struct CeremonyManager {
    rp_id: String,
    rp_name: String,
    origin: String,
    rp_id_hash: [u8; 32],
    challenge_ttl: chrono::Duration,
    challenges: ChallengeStore,
    credentials: CredentialStore,
}

impl CeremonyManager {
    pub fn new(config: &Config, challenges: ChallengeStore, credentials: CredentialStore) -> Self {
        Self {
            rp_id_hash: verify::rp_id_hash(&config.rp_id),
            rp_id: config.rp_id.clone(),
            rp_name: config.rp_name.clone(),
            origin: config.rp_origin.clone(),
            challenge_ttl: chrono::Duration::seconds(config.challenge_ttl_secs as i64),
            challenges,
            credentials,
        }
    }

    /// The credential store backing this manager, for read-only callers
    /// like the credential-listing endpoint.
    pub fn credentials(&self) -> &CredentialStore {
        &self.credentials
    }

    /// The challenge store, for the periodic eviction task.
    pub fn challenges(&self) -> &ChallengeStore {
        &self.challenges
    }

    fn fresh_challenge(&self) -> Vec<u8> {
        let mut bytes = vec![0u8; CHALLENGE_LEN];
        rand::rngs::OsRng.fill_bytes(&mut bytes);
        bytes
    }

    fn timeout_ms(&self) -> u32 {
        (self.challenge_ttl.num_milliseconds().max(0) as u64).min(u32::MAX as u64) as u32
    }
}
