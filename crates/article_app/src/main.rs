mod config;
mod logging;
mod server;

use std::path::PathBuf;

use anyhow::Context;
use extract_logging::{extract_error, extract_info};

use crate::config::{load_config, DEFAULT_CONFIG_PATH};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
    let config = load_config(&config_path)?.with_api_key(std::env::var("LLM_API_KEY").ok());

    logging::initialize(config.log_destination, logging::parse_level(&config.log_level));
    extract_info!("article_app {} starting", env!("CARGO_PKG_VERSION"));

    let state = server::AppState::from_config(&config)?;
    let listener = tokio::net::TcpListener::bind(&config.bind_address)
        .await
        .with_context(|| format!("could not bind {}", config.bind_address))?;
    extract_info!(
        "listening on {} (llm endpoint {})",
        config.bind_address,
        if config.llm.is_some() { "enabled" } else { "disabled" }
    );

    axum::serve(listener, server::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;
    extract_info!("article_app stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        extract_error!("could not listen for shutdown signal: {err}");
    }
}
