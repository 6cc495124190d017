//! HTTP surface for Mausam
//!
//! Exposes weather, geocoding and assistant endpoints as JSON over axum.

pub mod error;
pub mod handlers;
pub mod router;
pub mod state;

pub use error::ApiError;
pub use router::create_router;
pub use state::AppState;

use anyhow::{Context, Result};
use mausam_core::Config;

/// Bind the configured address and serve until Ctrl-C.
pub async fn serve(config: &Config) -> Result<()> {
    let state = AppState::from_config(config).context("Failed to build application state")?;
    let app = create_router(state, config.server.enable_cors);

    let address = config.server.bind_address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;

    tracing::info!("Mausam listening on http://{}", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Mausam stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
