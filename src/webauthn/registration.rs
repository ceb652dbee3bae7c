//! # Registration Ceremony
//!
//! Creating a new passkey for a subject. `start_registration` issues the
//! challenge and the creation options; `finish_registration` verifies the
//! attestation response and persists the credential.
//!
//! The challenge is consumed up front in the finish step, before any
//! verification: a ceremony may not be retried with the same challenge, so
//! a failed attempt leaves no outstanding state behind.

use super::types::{
    AuthenticatorSelection, CredentialDescriptor, PubKeyCredParam, RegistrationOptions,
    RegistrationResponse, RelyingParty, UserEntity,
};
use super::verify;
use super::CeremonyManager;
use crate::db::models::{CeremonyKind, ChallengeRecord, CredentialRecord};
use crate::error::CeremonyError;
use p256::elliptic_curve::sec1::ToEncodedPoint;

impl CeremonyManager {
    /// Issue a fresh registration challenge and the options descriptor the
    /// client hands to `navigator.credentials.create()`.
    ///
    /// Replaces any outstanding registration challenge for the subject.
    /// Already-registered credentials are listed in `excludeCredentials`
    /// so the authenticator refuses to create a duplicate.
    pub async fn start_registration(
        &self,
        subject: &str,
    ) -> Result<RegistrationOptions, CeremonyError> {
        if subject.is_empty() {
            return Err(CeremonyError::InvalidInput);
        }

        let existing = self.credentials.list_for_subject(subject).await?;

        let challenge = self.fresh_challenge();
        let record = ChallengeRecord::new(
            CeremonyKind::Registration,
            subject.to_string(),
            challenge.clone(),
            self.challenge_ttl,
        );
        self.challenges.put(&record).await?;

        Ok(RegistrationOptions {
            challenge: verify::encode_base64url(&challenge),
            rp: RelyingParty {
                id: self.rp_id.clone(),
                name: self.rp_name.clone(),
            },
            user: UserEntity {
                id: verify::encode_base64url(subject.as_bytes()),
                name: subject.to_string(),
                display_name: subject.to_string(),
            },
            pub_key_cred_params: vec![PubKeyCredParam {
                ty: "public-key",
                alg: -7,
            }],
            timeout: self.timeout_ms(),
            attestation: "none",
            authenticator_selection: AuthenticatorSelection {
                user_verification: "required",
                authenticator_attachment: "platform",
            },
            exclude_credentials: existing
                .into_iter()
                .map(|c| CredentialDescriptor {
                    ty: "public-key",
                    id: c.id,
                    transports: c.transports.and_then(|t| serde_json::from_str(&t).ok()),
                })
                .collect(),
        })
    }

    /// Verify an attestation response and persist the new credential.
    ///
    /// Checks, in order: outstanding challenge (consumed atomically, even
    /// on failure), client data shape and ceremony type, byte-exact
    /// challenge match, origin, attestation structure for mode "none",
    /// relying-party hash, user-verification flag, and attested credential
    /// consistency. Nothing is persisted unless every check passes.
    pub async fn finish_registration(
        &self,
        subject: &str,
        response: &RegistrationResponse,
    ) -> Result<(), CeremonyError> {
        if subject.is_empty() {
            return Err(CeremonyError::InvalidInput);
        }

        let record = self
            .challenges
            .take(CeremonyKind::Registration, subject)
            .await?
            .ok_or(CeremonyError::NoCeremonyInProgress)?;

        let client_data = verify::parse_client_data(&response.response.client_data_json)?;
        if client_data.ceremony_type != "webauthn.create" {
            return Err(CeremonyError::MalformedResponse(format!(
                "unexpected client data type '{}'",
                client_data.ceremony_type
            )));
        }

        let response_challenge = verify::decode_base64url(&client_data.challenge)?;
        if response_challenge != record.challenge {
            return Err(CeremonyError::ChallengeMismatch);
        }

        if client_data.origin != self.origin {
            return Err(CeremonyError::OriginMismatch);
        }

        let attestation_bytes = verify::decode_base64url(&response.response.attestation_object)?;
        let attestation = verify::parse_attestation_object(&attestation_bytes)?;
        // Attestation mode "none" was requested; anything else is not
        // structurally valid for this ceremony.
        if attestation.fmt != "none" || !attestation.att_stmt_empty {
            return Err(CeremonyError::MalformedResponse(format!(
                "unsupported attestation format '{}'",
                attestation.fmt
            )));
        }

        let auth_data = verify::parse_authenticator_data(&attestation.auth_data)?;
        if auth_data.rp_id_hash != self.rp_id_hash {
            return Err(CeremonyError::RelyingPartyMismatch);
        }
        if !auth_data.user_present() || !auth_data.user_verified() {
            return Err(CeremonyError::MalformedResponse(
                "user verification flags not set".into(),
            ));
        }

        let attested = auth_data.attested.ok_or_else(|| {
            CeremonyError::MalformedResponse("missing attested credential data".into())
        })?;

        let raw_id = verify::decode_base64url(&response.raw_id)?;
        if raw_id != attested.credential_id {
            return Err(CeremonyError::MalformedResponse(
                "rawId does not match attested credential id".into(),
            ));
        }

        let public_key = verify::decode_cose_p256(&attested.cose_key)?;
        let sec1 = public_key.to_encoded_point(false).as_bytes().to_vec();

        let credential = CredentialRecord::new(
            verify::encode_base64url(&attested.credential_id),
            subject.to_string(),
            sec1,
            auth_data.sign_count as i64,
            response.response.transports.clone(),
        );
        self.credentials.insert(&credential).await?;

        tracing::info!(subject, credential = %credential.id, "registered new passkey");
        Ok(())
    }
}
