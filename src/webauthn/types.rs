//! # WebAuthn API Types
//!
//! Request/response shapes for the ceremony endpoints. Field names follow
//! the W3C WebAuthn JSON conventions (`rawId`, `clientDataJSON`, ...) so the
//! browser-side `navigator.credentials` payloads deserialize directly.

use serde::{Deserialize, Serialize};

/// Options descriptor returned by `startRegistration`, consumed by the
/// client's `navigator.credentials.create()` call.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationOptions {
    /// base64url challenge bytes.
    pub challenge: String,
    pub rp: RelyingParty,
    pub user: UserEntity,
    pub pub_key_cred_params: Vec<PubKeyCredParam>,
    /// Client-side ceremony timeout, milliseconds.
    pub timeout: u32,
    /// Always "none": this service does not validate attestation chains.
    pub attestation: &'static str,
    pub authenticator_selection: AuthenticatorSelection,
    /// Credentials the subject already registered, so the authenticator
    /// refuses to create a duplicate.
    pub exclude_credentials: Vec<CredentialDescriptor>,
}

/// Options descriptor returned by `startAuthentication`, consumed by
/// `navigator.credentials.get()`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticationOptions {
    pub challenge: String,
    pub rp_id: String,
    pub timeout: u32,
    pub user_verification: &'static str,
    /// The subject's known credential IDs so the authenticator can pick
    /// the right key. May be empty for a subject with no passkeys; the
    /// finish step reports the failure in that case.
    pub allow_credentials: Vec<CredentialDescriptor>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RelyingParty {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserEntity {
    /// base64url of the subject identifier bytes.
    pub id: String,
    pub name: String,
    pub display_name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PubKeyCredParam {
    #[serde(rename = "type")]
    pub ty: &'static str,
    /// COSE algorithm identifier; -7 is ES256.
    pub alg: i32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticatorSelection {
    pub user_verification: &'static str,
    /// "platform" prefers built-in biometric sensors over roaming keys.
    pub authenticator_attachment: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct CredentialDescriptor {
    #[serde(rename = "type")]
    pub ty: &'static str,
    /// base64url credential ID.
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transports: Option<Vec<String>>,
}

/// Attestation response produced by `navigator.credentials.create()`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrationResponse {
    /// base64url credential ID.
    pub id: String,
    #[serde(rename = "rawId")]
    pub raw_id: String,
    pub response: AttestationPayload,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttestationPayload {
    #[serde(rename = "clientDataJSON")]
    pub client_data_json: String,
    #[serde(rename = "attestationObject")]
    pub attestation_object: String,
    #[serde(default)]
    pub transports: Option<Vec<String>>,
}

/// Assertion response produced by `navigator.credentials.get()`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthenticationResponse {
    pub id: String,
    #[serde(rename = "rawId")]
    pub raw_id: String,
    pub response: AssertionPayload,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssertionPayload {
    #[serde(rename = "clientDataJSON")]
    pub client_data_json: String,
    #[serde(rename = "authenticatorData")]
    pub authenticator_data: String,
    /// DER-encoded ECDSA signature, base64url.
    pub signature: String,
    #[serde(rename = "userHandle", default)]
    pub user_handle: Option<String>,
}

// Request bodies for the finish endpoints.

#[derive(Debug, Deserialize)]
pub struct RegisterFinishRequest {
    pub subject: String,
    pub response: RegistrationResponse,
}

#[derive(Debug, Deserialize)]
pub struct AuthFinishRequest {
    pub subject: String,
    pub response: AuthenticationResponse,
}

/// Query parameters for the start endpoints.
#[derive(Debug, Deserialize)]
pub struct StartParams {
    #[serde(default)]
    pub subject: Option<String>,
}

/// Credential metadata returned by the listing endpoint. Public key bytes
/// stay server-side.
#[derive(Debug, Serialize)]
pub struct CredentialSummary {
    pub id: String,
    pub transports: Option<Vec<String>>,
    pub created_at: String,
    pub last_used_at: Option<String>,
}
