//! # Application State
//!
//! Shared state for the axum handlers: the SQLite pool and the ceremony
//! manager built on top of it. Cloned per request; cheap because the pool
//! is itself a handle.

use anyhow::Result;
use sqlx::sqlite::SqlitePool;

use crate::config::Config;
use crate::db::{ChallengeStore, CredentialStore};
use crate::webauthn::CeremonyManager;

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub ceremonies: CeremonyManager,
}

impl AppState {
    /// Connect to the database, run embedded migrations, and wire the
    /// stores into a ceremony manager.
    pub async fn new(config: &Config) -> Result<Self> {
        let db = SqlitePool::connect(&config.database_url).await?;
        sqlx::migrate!("./migrations").run(&db).await?;

        let ceremonies = CeremonyManager::new(
            config,
            ChallengeStore::new(db.clone()),
            CredentialStore::new(db.clone()),
        );

        Ok(AppState { db, ceremonies })
    }
}
