//! TechDesk Portal - Main Entry Point

use anyhow::Context;
use techdesk_core::config::DEFAULT_CONFIG_PATH;
use techdesk_core::DeskConfig;
use techdesk_portal::{build_router, AppState};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("TechDesk Portal v{}", env!("CARGO_PKG_VERSION"));

    // Load config
    let config_path = std::env::var("TECHDESK_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.into());

    let config = DeskConfig::load(&config_path)
        .unwrap_or_else(|e| {
            tracing::warn!(path = %config_path, error = %e, "Config not loaded, using defaults");
            DeskConfig::default()
        })
        .with_env_overrides();

    let (state, _dispatcher) = AppState::bootstrap(&config)
        .await
        .context("failed to initialise services")?;
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    tracing::info!("Portal API listening on {}", config.bind_addr);

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
