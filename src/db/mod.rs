//! # Database Module
//!
//! SQLite-backed stores for the two kinds of WebAuthn state:
//! - `challenges`: ephemeral per-(ceremony, subject) challenge records
//! - `credentials`: durable registered passkey credentials
//!
//! Both stores are thin wrappers around a shared `SqlitePool`, constructed
//! at process start and injected into the ceremony manager.

pub mod challenges;
pub mod credentials;
pub mod models;

pub use challenges::ChallengeStore;
pub use credentials::CredentialStore;
