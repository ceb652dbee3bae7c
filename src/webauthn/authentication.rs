//! # Authentication Ceremony
//!
//! Proving possession of a previously registered passkey. The assertion is
//! verified against the stored public key, and the signature counter must
//! strictly advance — a counter that stands still or goes backwards means
//! the response was replayed or the authenticator was cloned.

use super::types::{AuthenticationOptions, AuthenticationResponse, CredentialDescriptor};
use super::verify;
use super::CeremonyManager;
use crate::db::models::{CeremonyKind, ChallengeRecord};
use crate::error::CeremonyError;
use p256::ecdsa::VerifyingKey;

impl CeremonyManager {
    /// Issue a fresh authentication challenge and the request descriptor
    /// for `navigator.credentials.get()`.
    ///
    /// The subject's known credential IDs are enumerated in
    /// `allowCredentials` so the authenticator can select the right key.
    /// A subject with no credentials still gets a challenge; the finish
    /// step reports `UnknownCredential`.
    pub async fn start_authentication(
        &self,
        subject: &str,
    ) -> Result<AuthenticationOptions, CeremonyError> {
        if subject.is_empty() {
            return Err(CeremonyError::InvalidInput);
        }

        let known = self.credentials.list_for_subject(subject).await?;

        let challenge = self.fresh_challenge();
        let record = ChallengeRecord::new(
            CeremonyKind::Authentication,
            subject.to_string(),
            challenge.clone(),
            self.challenge_ttl,
        );
        self.challenges.put(&record).await?;

        Ok(AuthenticationOptions {
            challenge: verify::encode_base64url(&challenge),
            rp_id: self.rp_id.clone(),
            timeout: self.timeout_ms(),
            user_verification: "required",
            allow_credentials: known
                .into_iter()
                .map(|c| CredentialDescriptor {
                    ty: "public-key",
                    id: c.id,
                    transports: c.transports.and_then(|t| serde_json::from_str(&t).ok()),
                })
                .collect(),
        })
    }

    /// Verify an assertion response.
    ///
    /// The outstanding challenge is consumed atomically whatever the
    /// outcome. On success the stored signature counter is advanced to the
    /// value the authenticator reported.
    pub async fn finish_authentication(
        &self,
        subject: &str,
        response: &AuthenticationResponse,
    ) -> Result<(), CeremonyError> {
        if subject.is_empty() {
            return Err(CeremonyError::InvalidInput);
        }

        let record = self
            .challenges
            .take(CeremonyKind::Authentication, subject)
            .await?
            .ok_or(CeremonyError::NoCeremonyInProgress)?;

        let client_data = verify::parse_client_data(&response.response.client_data_json)?;
        if client_data.ceremony_type != "webauthn.get" {
            return Err(CeremonyError::MalformedResponse(format!(
                "unexpected client data type '{}'",
                client_data.ceremony_type
            )));
        }

        let credential = self
            .credentials
            .find(&response.id, subject)
            .await?
            .ok_or(CeremonyError::UnknownCredential)?;

        let response_challenge = verify::decode_base64url(&client_data.challenge)?;
        if response_challenge != record.challenge {
            return Err(CeremonyError::ChallengeMismatch);
        }

        if client_data.origin != self.origin {
            return Err(CeremonyError::OriginMismatch);
        }

        let auth_data_bytes = verify::decode_base64url(&response.response.authenticator_data)?;
        let auth_data = verify::parse_authenticator_data(&auth_data_bytes)?;
        if auth_data.rp_id_hash != self.rp_id_hash {
            return Err(CeremonyError::RelyingPartyMismatch);
        }
        if !auth_data.user_present() || !auth_data.user_verified() {
            return Err(CeremonyError::MalformedResponse(
                "user verification flags not set".into(),
            ));
        }

        let public_key = VerifyingKey::from_sec1_bytes(&credential.public_key).map_err(|_| {
            CeremonyError::StoreFailure("stored public key is not a valid P-256 key".into())
        })?;

        let client_data_bytes = verify::decode_base64url(&response.response.client_data_json)?;
        let signature = verify::decode_base64url(&response.response.signature)?;
        verify::verify_assertion_signature(
            &public_key,
            &auth_data_bytes,
            &client_data_bytes,
            &signature,
        )?;

        // Strictly-greater counter check. Authenticators that never
        // increment their counter always report 0 and are rejected here;
        // the portal's threat model prefers that over accepting replays.
        let reported = auth_data.sign_count as i64;
        if reported <= credential.counter {
            return Err(CeremonyError::PossibleCloneDetected);
        }

        self.credentials.update_counter(&credential.id, reported).await?;

        tracing::info!(subject, credential = %credential.id, "passkey assertion verified");
        Ok(())
    }
}
