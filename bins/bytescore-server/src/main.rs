//! bytescore-server: HTTP endpoint for ByteScore reputation scores.

mod config;
mod routes;

use std::sync::Arc;

use anyhow::{Context, Result};
use bytescore_core::config::ScoringConfig;
use bytescore_engine::ScoringEngine;
use bytescore_rpc::{ProgramHistory, RpcClient, RpcLedger};
use tracing::info;

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<ScoringEngine>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = config::Config::from_env()?;
    init_logging("info", &config.log_format);

    let client = Arc::new(
        RpcClient::new(&config.rpc_url, config.rpc_timeout).context("failed to build RPC client")?,
    );
    let ledger = Arc::new(RpcLedger::new(Arc::clone(&client)));
    let history = Arc::new(ProgramHistory::new(client, config.program_id.clone()));
    let scoring = ScoringConfig::new().with_fetch_timeout(config.fetch_timeout);
    let engine = ScoringEngine::new(ledger, history, scoring).context("invalid scoring configuration")?;

    info!(
        rpc = %config.rpc_url,
        program = %config.program_id,
        bind = %config.bind_addr,
        "Starting bytescore-server"
    );

    let state = AppState { engine: Arc::new(engine) };
    let app = routes::router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    info!("ByteScore listening on http://{}", config.bind_addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    info!("bytescore-server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutdown signal received");
    }
}

/// Initialise the tracing subscriber. `RUST_LOG` overrides `level_str`.
fn init_logging(level_str: &str, format: &str) {
    use tracing_subscriber::filter::EnvFilter;
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level_str));

    if format == "json" {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_level(true))
            .init();
    }
}
