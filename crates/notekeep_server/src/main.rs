//! Notekeep HTTP server entry point.
//!
//! # Responsibility
//! - Parse flags/environment, start logging, and serve the notes API.
//! - Keep the store disconnected until the first request needs it.

use anyhow::Context;
use clap::Parser;
use log::{info, warn};
use notekeep_core::config::{STORE_DB_ENV, STORE_URI_ENV};
use notekeep_core::{default_log_level, init_logging, NoteStore, StoreConfig};
use notekeep_server::{router, AppState};
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "notekeep-server")]
#[command(about = "Serves the Notekeep notes collection over HTTP")]
struct Cli {
    /// Address to listen on
    #[arg(long, default_value = "127.0.0.1:3000", env = "NOTEKEEP_BIND")]
    bind: String,

    /// Data directory holding the notes database (`:memory:` for a throwaway store)
    #[arg(long, env = STORE_URI_ENV)]
    store_uri: Option<String>,

    /// Database name inside the data directory
    #[arg(long, env = STORE_DB_ENV)]
    store_db: Option<String>,

    /// trace|debug|info|warn|error
    #[arg(long, env = "NOTEKEEP_LOG_LEVEL")]
    log_level: Option<String>,

    /// Absolute directory for rolling log files; stderr when unset
    #[arg(long, env = "NOTEKEEP_LOG_DIR")]
    log_dir: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = cli.log_level.as_deref().unwrap_or_else(|| default_log_level());
    init_logging(level, cli.log_dir.as_deref()).map_err(anyhow::Error::msg)?;

    let config = StoreConfig::new(cli.store_uri, cli.store_db);
    if config.uri.is_none() {
        warn!(
            "event=server_start module=server status=warn reason=store_uri_missing env={STORE_URI_ENV}"
        );
    }
    let store = Arc::new(NoteStore::new(config));
    let app = router(AppState::new(store));

    let listener = tokio::net::TcpListener::bind(&cli.bind)
        .await
        .with_context(|| format!("failed to bind {}", cli.bind))?;
    info!(
        "event=server_start module=server status=ok addr={} version={}",
        cli.bind,
        notekeep_core::core_version()
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("event=server_stop module=server status=ok");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!("event=server_signal module=server status=error error={err}");
        std::future::pending::<()>().await;
    }
}
