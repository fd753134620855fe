//! energies-site server entry point.
//!
//! Loads configuration, connects the selected backend and serves the site.

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use energies_site::app_state::AppState;
use energies_site::backend::Backends;
use energies_site::config::{LogFormat, SiteConfig};
use energies_site::server::build_app;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = SiteConfig::from_env()
        .map_err(|e| anyhow::anyhow!("invalid configuration: {e}"))?;

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match config.log_format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
        LogFormat::Pretty => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }
    tracing::info!(
        addr = %config.listen_addr,
        backend = ?config.backend_mode,
        "starting energies-site"
    );

    // Build backend and service layers
    let backends = Backends::connect(&config)
        .await
        .context("connecting to the backend")?;
    let listen_addr = config.listen_addr;
    let state = AppState::new(config, backends).context("building application state")?;

    // Start server
    let listener = tokio::net::TcpListener::bind(listen_addr)
        .await
        .with_context(|| format!("binding {listen_addr}"))?;
    tracing::info!(addr = %listen_addr, "server listening");

    axum::serve(listener, build_app(state)).await?;

    Ok(())
}
