//! # Campus Passkey Service
//!
//! Standalone WebAuthn/passkey service for the campus academic portal.
//! Students register platform authenticators (Face ID, fingerprint readers)
//! against their student ID and later prove possession of the key to sign in.
//!
//! The portal itself (students, courses, attendance, grades) is a separate
//! application; it talks to this service over the `/webauthn/*` HTTP routes.

pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod state;
pub mod webauthn;
