//! # HTTP Request Handlers
//!
//! Route handlers for the ceremony endpoints plus the health check, and
//! the router wiring them together. Handlers stay thin: extract, call the
//! ceremony manager, encode.

pub mod health;
pub mod webauthn;

use axum::routing::{get, post};
use axum::Router;

use crate::state::AppState;

/// Build the application router. Middleware layers (CORS, tracing) are
/// applied by the caller.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/webauthn/register/start", get(webauthn::register_start))
        .route("/webauthn/register/finish", post(webauthn::register_finish))
        .route("/webauthn/auth/start", get(webauthn::auth_start))
        .route("/webauthn/auth/finish", post(webauthn::auth_finish))
        .route("/webauthn/credentials", get(webauthn::list_credentials))
        .with_state(state)
}
