//! # Mock GCM
//!
//! Standalone entry point for the mock push gateway.
//!
//! Settings are merged with command-line flags (or their environment
//! variables) first, then the preset file, then built-in defaults. The
//! server runs until Ctrl+C and then drains in-flight requests.

#![forbid(unsafe_code)]

mod cli;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use mock_gcm_core::Engine;
use mock_gcm_web::{MockGcmServer, Preset, ServerConfig};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use cli::{Cli, Commands};

const DEFAULT_FILTER: &str = "info,mock_gcm_web=debug,tower_http=debug";

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    match cli.command {
        Commands::Serve {
            api_key,
            bind,
            config,
        } => {
            let preset = match config {
                Some(path) => Preset::load(&path)
                    .with_context(|| format!("Failed to load preset {}", path.display()))?,
                None => Preset::default(),
            };
            serve(resolve_config(api_key, bind, &preset), &preset).await
        }
    }
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER)))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Flags win over the preset, the preset over the defaults.
fn resolve_config(api_key: Option<String>, bind: Option<String>, preset: &Preset) -> ServerConfig {
    let defaults = ServerConfig::default();
    ServerConfig {
        bind_address: bind
            .or_else(|| preset.bind_address.clone())
            .unwrap_or(defaults.bind_address),
        api_key: api_key
            .or_else(|| preset.api_key.clone())
            .unwrap_or(defaults.api_key),
    }
}

async fn serve(config: ServerConfig, preset: &Preset) -> Result<()> {
    let engine = Arc::new(Engine::new(&config.api_key));
    preset
        .apply(&engine)
        .context("Preset rejected by the gateway engine")?;

    let mut server = MockGcmServer::with_engine(config, engine);
    let addr = server
        .start()
        .await
        .context("Failed to start mock gateway")?;
    info!(%addr, "Mock GCM ready");

    wait_for_shutdown().await;

    server.stop().await.context("Mock gateway did not stop cleanly")?;
    info!("Shutdown complete");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C).
async fn wait_for_shutdown() {
    match signal::ctrl_c().await {
        Ok(()) => info!("Received Ctrl+C, initiating graceful shutdown"),
        Err(err) => error!("Failed to listen for shutdown signal: {}", err),
    }
}
