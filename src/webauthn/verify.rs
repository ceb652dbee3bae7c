//! # Response Parsing & Verification Primitives
//!
//! The pieces of WebAuthn response checking that are pure functions of the
//! bytes: client-data decoding, authenticator-data layout, CBOR attestation
//! objects, COSE P-256 keys, and ECDSA assertion signatures. The ceremony
//! manager sequences these; nothing in this module touches storage.
//!
//! ## Wire formats handled here
//! - `clientDataJSON`: base64url JSON with `type`, `challenge`, `origin`
//! - `authenticatorData`: rpIdHash(32) ‖ flags(1) ‖ signCount(4)
//!   [‖ AAGUID(16) ‖ credIdLen(2) ‖ credId ‖ COSE key, when the AT flag is set]
//! - `attestationObject`: CBOR map {fmt, attStmt, authData}
//! - COSE key: CBOR map {1: 2 (EC2), 3: -7 (ES256), -1: 1 (P-256), -2: x, -3: y}

use base64::prelude::*;
use ciborium::value::Value;
use p256::ecdsa::signature::Verifier;
use p256::ecdsa::{Signature, VerifyingKey};
use serde::Deserialize;
use sha2::{Digest, Sha256};

use crate::error::CeremonyError;

/// User-present flag.
pub const FLAG_UP: u8 = 0x01;
/// User-verified flag. Required for every ceremony: the portal asks for
/// `userVerification: "required"` (biometric or PIN, not just a touch).
pub const FLAG_UV: u8 = 0x04;
/// Attested-credential-data-included flag.
pub const FLAG_AT: u8 = 0x40;

/// The subset of `clientDataJSON` the server checks. Browsers add more
/// fields (`crossOrigin`, `tokenBinding`); those are ignored.
#[derive(Debug, Deserialize)]
pub struct CollectedClientData {
    #[serde(rename = "type")]
    pub ceremony_type: String,
    /// base64url encoding of the issued challenge bytes.
    pub challenge: String,
    pub origin: String,
}

/// Parsed authenticator data.
#[derive(Debug)]
pub struct AuthenticatorData {
    pub rp_id_hash: [u8; 32],
    pub flags: u8,
    pub sign_count: u32,
    /// Present only when the AT flag is set (registration responses).
    pub attested: Option<AttestedCredential>,
}

impl AuthenticatorData {
    pub fn user_present(&self) -> bool {
        self.flags & FLAG_UP != 0
    }

    pub fn user_verified(&self) -> bool {
        self.flags & FLAG_UV != 0
    }
}

/// Attested credential data carried in a registration response.
#[derive(Debug)]
pub struct AttestedCredential {
    pub credential_id: Vec<u8>,
    /// COSE_Key CBOR bytes; decode with [`decode_cose_p256`].
    pub cose_key: Vec<u8>,
}

/// Decoded attestation object from a registration response.
#[derive(Debug)]
pub struct AttestationObject {
    pub fmt: String,
    pub att_stmt_empty: bool,
    pub auth_data: Vec<u8>,
}

pub fn decode_base64url(input: &str) -> Result<Vec<u8>, CeremonyError> {
    BASE64_URL_SAFE_NO_PAD
        .decode(input.as_bytes())
        .map_err(|_| CeremonyError::MalformedResponse("invalid base64url encoding".into()))
}

pub fn encode_base64url(input: &[u8]) -> String {
    BASE64_URL_SAFE_NO_PAD.encode(input)
}

/// SHA-256 of the relying-party ID, as embedded in authenticator data.
pub fn rp_id_hash(rp_id: &str) -> [u8; 32] {
    Sha256::digest(rp_id.as_bytes()).into()
}

/// Decode and parse a base64url `clientDataJSON` payload.
pub fn parse_client_data(encoded: &str) -> Result<CollectedClientData, CeremonyError> {
    let bytes = decode_base64url(encoded)?;
    serde_json::from_slice(&bytes)
        .map_err(|_| CeremonyError::MalformedResponse("client data is not valid JSON".into()))
}

/// Parse raw authenticator data bytes.
pub fn parse_authenticator_data(data: &[u8]) -> Result<AuthenticatorData, CeremonyError> {
    if data.len() < 37 {
        return Err(CeremonyError::MalformedResponse(
            "authenticator data shorter than 37 bytes".into(),
        ));
    }

    let mut rp_id_hash = [0u8; 32];
    rp_id_hash.copy_from_slice(&data[0..32]);
    let flags = data[32];
    let sign_count = u32::from_be_bytes([data[33], data[34], data[35], data[36]]);

    let attested = if flags & FLAG_AT != 0 {
        // AAGUID(16) + credIdLen(2) follow the fixed header.
        if data.len() < 37 + 18 {
            return Err(CeremonyError::MalformedResponse(
                "attested credential data truncated".into(),
            ));
        }
        let cred_id_len = u16::from_be_bytes([data[53], data[54]]) as usize;
        let cred_id_end = 55 + cred_id_len;
        if data.len() < cred_id_end {
            return Err(CeremonyError::MalformedResponse(
                "credential id truncated".into(),
            ));
        }
        Some(AttestedCredential {
            credential_id: data[55..cred_id_end].to_vec(),
            cose_key: data[cred_id_end..].to_vec(),
        })
    } else {
        None
    };

    Ok(AuthenticatorData {
        rp_id_hash,
        flags,
        sign_count,
        attested,
    })
}

/// Parse a CBOR attestation object ({fmt, attStmt, authData}).
pub fn parse_attestation_object(bytes: &[u8]) -> Result<AttestationObject, CeremonyError> {
    let malformed = |msg: &str| CeremonyError::MalformedResponse(msg.into());

    let value: Value = ciborium::from_reader(bytes)
        .map_err(|_| malformed("attestation object is not valid CBOR"))?;
    let Value::Map(map) = value else {
        return Err(malformed("attestation object is not a CBOR map"));
    };

    let field = |name: &str| -> Option<&Value> {
        map.iter().find_map(|(k, v)| match k {
            Value::Text(t) if t == name => Some(v),
            _ => None,
        })
    };

    let fmt = match field("fmt") {
        Some(Value::Text(t)) => t.clone(),
        _ => return Err(malformed("attestation object missing fmt")),
    };
    let att_stmt_empty = match field("attStmt") {
        Some(Value::Map(stmt)) => stmt.is_empty(),
        _ => return Err(malformed("attestation object missing attStmt")),
    };
    let auth_data = match field("authData") {
        Some(Value::Bytes(b)) => b.clone(),
        _ => return Err(malformed("attestation object missing authData")),
    };

    Ok(AttestationObject {
        fmt,
        att_stmt_empty,
        auth_data,
    })
}

/// Decode a COSE_Key CBOR map into a P-256 verifying key.
///
/// Only EC2 / ES256 / P-256 keys are accepted, matching the single
/// `pubKeyCredParams` entry this service offers at registration.
pub fn decode_cose_p256(cose: &[u8]) -> Result<VerifyingKey, CeremonyError> {
    let malformed = |msg: &str| CeremonyError::MalformedResponse(msg.into());

    let value: Value =
        ciborium::from_reader(cose).map_err(|_| malformed("COSE key is not valid CBOR"))?;
    let Value::Map(map) = value else {
        return Err(malformed("COSE key is not a CBOR map"));
    };

    let field = |label: i64| -> Option<&Value> {
        map.iter().find_map(|(k, v)| match k {
            Value::Integer(i) if i128::from(*i) == label as i128 => Some(v),
            _ => None,
        })
    };
    let int_field = |label: i64| -> Option<i128> {
        match field(label) {
            Some(Value::Integer(i)) => Some(i128::from(*i)),
            _ => None,
        }
    };

    // kty = 2 (EC2), alg = -7 (ES256), crv = 1 (P-256)
    if int_field(1) != Some(2) {
        return Err(malformed("COSE key type is not EC2"));
    }
    if int_field(3) != Some(-7) {
        return Err(malformed("COSE key algorithm is not ES256"));
    }
    if int_field(-1) != Some(1) {
        return Err(malformed("COSE key curve is not P-256"));
    }

    let coord = |label: i64, name: &str| -> Result<Vec<u8>, CeremonyError> {
        match field(label) {
            Some(Value::Bytes(b)) if b.len() == 32 => Ok(b.clone()),
            _ => Err(CeremonyError::MalformedResponse(format!(
                "COSE key {name} coordinate missing or not 32 bytes"
            ))),
        }
    };
    let x = coord(-2, "x")?;
    let y = coord(-3, "y")?;

    // Uncompressed SEC1 point: 0x04 || x || y.
    let mut sec1 = Vec::with_capacity(65);
    sec1.push(0x04);
    sec1.extend_from_slice(&x);
    sec1.extend_from_slice(&y);

    VerifyingKey::from_sec1_bytes(&sec1)
        .map_err(|_| malformed("COSE key coordinates are not a valid P-256 point"))
}

/// Verify a DER-encoded ECDSA assertion signature over
/// authenticatorData ‖ SHA-256(clientDataJSON).
pub fn verify_assertion_signature(
    key: &VerifyingKey,
    authenticator_data: &[u8],
    client_data_json: &[u8],
    signature_der: &[u8],
) -> Result<(), CeremonyError> {
    let signature =
        Signature::from_der(signature_der).map_err(|_| CeremonyError::SignatureInvalid)?;

    let mut message = authenticator_data.to_vec();
    message.extend_from_slice(&Sha256::digest(client_data_json));

    key.verify(&message, &signature)
        .map_err(|_| CeremonyError::SignatureInvalid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use p256::ecdsa::{signature::Signer, SigningKey};
    use p256::elliptic_curve::sec1::ToEncodedPoint;

    fn test_key() -> SigningKey {
        SigningKey::random(&mut rand::rngs::OsRng)
    }

    fn cose_from(key: &SigningKey) -> Vec<u8> {
        let point = key.verifying_key().to_encoded_point(false);
        let map = Value::Map(vec![
            (Value::Integer(1i64.into()), Value::Integer(2i64.into())),
            (Value::Integer(3i64.into()), Value::Integer((-7i64).into())),
            (Value::Integer((-1i64).into()), Value::Integer(1i64.into())),
            (
                Value::Integer((-2i64).into()),
                Value::Bytes(point.x().unwrap().to_vec()),
            ),
            (
                Value::Integer((-3i64).into()),
                Value::Bytes(point.y().unwrap().to_vec()),
            ),
        ]);
        let mut buf = Vec::new();
        ciborium::into_writer(&map, &mut buf).unwrap();
        buf
    }

    #[test]
    fn assertion_auth_data_layout() {
        let hash = rp_id_hash("localhost");
        let mut data = Vec::new();
        data.extend_from_slice(&hash);
        data.push(FLAG_UP | FLAG_UV);
        data.extend_from_slice(&42u32.to_be_bytes());

        let parsed = parse_authenticator_data(&data).unwrap();
        assert_eq!(parsed.rp_id_hash, hash);
        assert_eq!(parsed.sign_count, 42);
        assert!(parsed.user_present());
        assert!(parsed.user_verified());
        assert!(parsed.attested.is_none());
    }

    #[test]
    fn attested_credential_data_is_extracted() {
        let key = test_key();
        let cose = cose_from(&key);
        let cred_id = [0x77u8; 16];

        let mut data = Vec::new();
        data.extend_from_slice(&rp_id_hash("localhost"));
        data.push(FLAG_UP | FLAG_UV | FLAG_AT);
        data.extend_from_slice(&0u32.to_be_bytes());
        data.extend_from_slice(&[0u8; 16]); // AAGUID
        data.extend_from_slice(&(cred_id.len() as u16).to_be_bytes());
        data.extend_from_slice(&cred_id);
        data.extend_from_slice(&cose);

        let parsed = parse_authenticator_data(&data).unwrap();
        let attested = parsed.attested.unwrap();
        assert_eq!(attested.credential_id, cred_id);
        decode_cose_p256(&attested.cose_key).unwrap();
    }

    #[test]
    fn truncated_auth_data_is_rejected() {
        let err = parse_authenticator_data(&[0u8; 20]).unwrap_err();
        assert!(matches!(err, CeremonyError::MalformedResponse(_)));
    }

    #[test]
    fn cose_key_with_wrong_curve_is_rejected() {
        let key = test_key();
        let point = key.verifying_key().to_encoded_point(false);
        let map = Value::Map(vec![
            (Value::Integer(1i64.into()), Value::Integer(2i64.into())),
            (Value::Integer(3i64.into()), Value::Integer((-7i64).into())),
            // crv = 2 (P-384), which this service never offers
            (Value::Integer((-1i64).into()), Value::Integer(2i64.into())),
            (
                Value::Integer((-2i64).into()),
                Value::Bytes(point.x().unwrap().to_vec()),
            ),
            (
                Value::Integer((-3i64).into()),
                Value::Bytes(point.y().unwrap().to_vec()),
            ),
        ]);
        let mut buf = Vec::new();
        ciborium::into_writer(&map, &mut buf).unwrap();

        let err = decode_cose_p256(&buf).unwrap_err();
        assert!(matches!(err, CeremonyError::MalformedResponse(_)));
    }

    #[test]
    fn attestation_object_none_format() {
        let map = Value::Map(vec![
            (Value::Text("fmt".into()), Value::Text("none".into())),
            (Value::Text("attStmt".into()), Value::Map(vec![])),
            (Value::Text("authData".into()), Value::Bytes(vec![1, 2, 3])),
        ]);
        let mut buf = Vec::new();
        ciborium::into_writer(&map, &mut buf).unwrap();

        let parsed = parse_attestation_object(&buf).unwrap();
        assert_eq!(parsed.fmt, "none");
        assert!(parsed.att_stmt_empty);
        assert_eq!(parsed.auth_data, vec![1, 2, 3]);
    }

    #[test]
    fn assertion_signature_roundtrip() {
        let key = test_key();
        let auth_data = b"auth-data".to_vec();
        let client_data = br#"{"type":"webauthn.get"}"#.to_vec();

        let mut message = auth_data.clone();
        message.extend_from_slice(&Sha256::digest(&client_data));
        let signature: p256::ecdsa::Signature = key.sign(&message);
        let der = signature.to_der();

        verify_assertion_signature(key.verifying_key(), &auth_data, &client_data, der.as_bytes())
            .unwrap();

        // Any bit flip in the signed data must fail verification.
        let err = verify_assertion_signature(
            key.verifying_key(),
            b"auth-datb",
            &client_data,
            der.as_bytes(),
        )
        .unwrap_err();
        assert!(matches!(err, CeremonyError::SignatureInvalid));
    }

    #[test]
    fn client_data_parsing() {
        let json = br#"{"type":"webauthn.create","challenge":"AAEC","origin":"http://localhost:5173","crossOrigin":false}"#;
        let encoded = encode_base64url(json);

        let parsed = parse_client_data(&encoded).unwrap();
        assert_eq!(parsed.ceremony_type, "webauthn.create");
        assert_eq!(parsed.origin, "http://localhost:5173");
        assert_eq!(decode_base64url(&parsed.challenge).unwrap(), vec![0, 1, 2]);

        assert!(parse_client_data("not base64url!").is_err());
    }
}
