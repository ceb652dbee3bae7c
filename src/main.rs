//! # Campus Passkey Service
//!
//! Server entry point: logging, configuration, state, the periodic
//! challenge-eviction task, and the HTTP listener.

use axum::http::HeaderValue;
use campus_passkey::config::Config;
use campus_passkey::handlers;
use campus_passkey::state::AppState;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,campus_passkey=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    tracing::info!("Configuration loaded: {:?}", config);

    let app_state = AppState::new(&config).await?;
    tracing::info!("Application state initialized");

    // Expired challenges are already invisible to `take`; this task keeps
    // the table from accumulating abandoned ceremonies.
    let challenges = app_state.ceremonies.challenges().clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(60));
        loop {
            interval.tick().await;
            match challenges.evict_expired().await {
                Ok(0) => {}
                Ok(n) => tracing::debug!("Evicted {} expired challenges", n),
                Err(e) => tracing::error!("Challenge eviction failed: {:?}", e),
            }
        }
    });

    // Only the portal client's origin may call this API from a browser.
    let cors = CorsLayer::new()
        .allow_origin(config.rp_origin.parse::<HeaderValue>()?)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = handlers::router(app_state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    let bind_addr = config.bind_address();
    tracing::info!("Starting server on {}", bind_addr);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
