//! duckgate daemon: loads configuration from the environment and serves the
//! OpenAI-compatible gateway.

use anyhow::Result;
use std::net::SocketAddr;
use tracing::info;
use tracing_subscriber::EnvFilter;

use duckgate_core::proxy::build_router;
use duckgate_core::Config;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env();
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));

    info!("duckgate starting on port {}", config.port);
    if !config.api_prefix.is_empty() {
        info!("API prefix: {}", config.api_prefix);
    }
    if config.api_key.is_empty() {
        info!("inbound auth disabled (API_KEY is empty)");
    }

    let app = build_router(config).map_err(|e| anyhow::anyhow!(e))?;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("listening on http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
