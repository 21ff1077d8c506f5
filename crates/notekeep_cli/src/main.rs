//! Notekeep CLI entry point.
//!
//! # Responsibility
//! - Parse flags, start stderr logging, and run one command in a sync
//!   session against the configured server.

use clap::Parser;
use notekeep_cli::{run_session, Command, HttpNotesApi};
use notekeep_core::{init_logging, FileLegacyStore};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "notekeep")]
#[command(about = "Create, edit and delete notes stored on a Notekeep server")]
struct Cli {
    /// Server base URL
    #[arg(long, default_value = "http://127.0.0.1:3000", env = "NOTEKEEP_SERVER")]
    server: String,

    /// Directory of the pre-server local note storage
    #[arg(long, default_value = ".notekeep", env = "NOTEKEEP_LEGACY_DIR")]
    legacy_dir: PathBuf,

    /// trace|debug|info|warn|error
    #[arg(long, default_value = "warn", env = "NOTEKEEP_LOG_LEVEL")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level, None).map_err(anyhow::Error::msg)?;

    let api = Arc::new(HttpNotesApi::new(&cli.server));
    let legacy = Box::new(FileLegacyStore::new(cli.legacy_dir));
    let mut stdout = std::io::stdout().lock();
    run_session(api, legacy, cli.command, &mut stdout).await
}
