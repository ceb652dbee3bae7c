//! # Error Handling
//!
//! Two layers of errors live here:
//!
//! - [`CeremonyError`] is the domain taxonomy of the ceremony manager. Every
//!   way a registration or authentication ceremony can be rejected has its
//!   own variant, so callers can distinguish "bad ceremony" from
//!   "infrastructure fault".
//! - [`AppError`] wraps ceremony errors with the ceremony they occurred in
//!   (registration failures map to 400, authentication failures to 401) and
//!   adds the plain HTTP-level failures. Its `IntoResponse` impl turns
//!   handler `Result`s into JSON error responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Why a WebAuthn ceremony was rejected.
///
/// Verification failures are non-fatal: the outstanding challenge has
/// already been consumed by the time one of these is returned, so the
/// client must restart from `start*`. `StoreFailure` is the one variant
/// that signals an infrastructure fault rather than a bad ceremony.
#[derive(Error, Debug)]
pub enum CeremonyError {
    #[error("subject must not be empty")]
    InvalidInput,

    /// Finish was called without a matching start, after the challenge
    /// expired, or after the challenge was already consumed.
    #[error("no ceremony in progress for this subject")]
    NoCeremonyInProgress,

    #[error("response challenge does not match the issued challenge")]
    ChallengeMismatch,

    #[error("response origin does not match the expected origin")]
    OriginMismatch,

    #[error("response relying party does not match the configured relying party")]
    RelyingPartyMismatch,

    #[error("malformed authenticator response: {0}")]
    MalformedResponse(String),

    #[error("credential is not registered for this subject")]
    UnknownCredential,

    #[error("assertion signature verification failed")]
    SignatureInvalid,

    /// The reported signature counter did not advance past the stored one.
    #[error("signature counter did not increase; possible cloned authenticator")]
    PossibleCloneDetected,

    #[error("credential store failure: {0}")]
    StoreFailure(String),
}

impl From<sqlx::Error> for CeremonyError {
    fn from(err: sqlx::Error) -> Self {
        CeremonyError::StoreFailure(err.to_string())
    }
}

/// Application-wide error type returned by HTTP handlers.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("registration failed: {0}")]
    Registration(CeremonyError),

    #[error("authentication failed: {0}")]
    Authentication(CeremonyError),

    #[error("bad request: {0}")]
    BadRequest(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                // Generic message; don't leak database internals.
                (StatusCode::INTERNAL_SERVER_ERROR, "storage error".to_string())
            }
            AppError::Registration(CeremonyError::StoreFailure(e))
            | AppError::Authentication(CeremonyError::StoreFailure(e)) => {
                tracing::error!("Credential store failure: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "storage error".to_string())
            }
            AppError::Registration(CeremonyError::InvalidInput)
            | AppError::Authentication(CeremonyError::InvalidInput) => {
                (StatusCode::BAD_REQUEST, self.to_string())
            }
            AppError::Registration(e) => {
                tracing::warn!("Registration ceremony rejected: {}", e);
                (StatusCode::BAD_REQUEST, e.to_string())
            }
            AppError::Authentication(e) => {
                tracing::warn!("Authentication ceremony rejected: {}", e);
                (StatusCode::UNAUTHORIZED, e.to_string())
            }
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, self.to_string()),
        };

        let body = Json(json!({
            "ok": false,
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

/// Convenience alias for handler results.
pub type AppResult<T> = Result<T, AppError>;
