//! # Configuration Management
//!
//! Configuration comes from environment variables (with a `.env` file for
//! local development), 12-factor style.
//!
//! ## Environment Variables
//! - `HOST`: Server bind address (default: 127.0.0.1)
//! - `PORT`: Server port (default: 8080)
//! - `DATABASE_URL`: SQLite database connection string
//! - `RP_ID`: WebAuthn Relying Party ID (usually your domain)
//! - `RP_ORIGIN`: WebAuthn Relying Party Origin (full URL of the portal client)
//! - `RP_NAME`: Human-readable name shown during passkey creation
//! - `CHALLENGE_TTL_SECS`: Lifetime of an outstanding ceremony challenge

use anyhow::Result;
use std::env;

/// Application configuration.
///
/// The RP ID must match the domain the portal is served from, and the RP
/// origin must match exactly what the browser embeds in `clientDataJSON`,
/// or every ceremony fails verification.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,

    /// SQLite connection URL, e.g. "sqlite:campus_passkey.db?mode=rwc".
    pub database_url: String,

    /// WebAuthn Relying Party ID ("localhost" in development, the bare
    /// domain without scheme or port in production).
    pub rp_id: String,

    /// Full URL of the web client, including scheme and port.
    pub rp_origin: String,

    /// Display name shown to users when creating a passkey.
    pub rp_name: String,

    /// How long an issued challenge stays valid. Expired challenges are
    /// treated as absent and evicted by a background task.
    pub challenge_ttl_secs: u64,
}

impl Config {
    /// Load configuration from environment variables, falling back to
    /// development defaults. Fails only if a set variable does not parse.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Config {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()?,
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite:campus_passkey.db?mode=rwc".to_string()),
            rp_id: env::var("RP_ID").unwrap_or_else(|_| "localhost".to_string()),
            // The portal client runs on the Vite dev server port by default.
            rp_origin: env::var("RP_ORIGIN")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            rp_name: env::var("RP_NAME")
                .unwrap_or_else(|_| "Campus Academic System".to_string()),
            challenge_ttl_secs: env::var("CHALLENGE_TTL_SECS")
                .unwrap_or_else(|_| "300".to_string())
                .parse()?,
        })
    }

    /// Socket address for `tokio::net::TcpListener::bind()`.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
