//! Keepsake server binary.

use anyhow::Result;
use clap::Parser;
use keepsake_server::{KeepsakeConfig, ObservabilityConfig, init_observability, serve};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "Keepsake upload server", long_about = None)]
struct Args {
    /// Configuration file (default: ./keepsake.toml if present)
    #[arg(short, long, env = "KEEPSAKE_CONFIG_FILE")]
    config: Option<PathBuf>,

    /// Directory uploads are stored in
    #[arg(short, long)]
    upload_dir: Option<PathBuf>,

    /// Listen address, e.g. 127.0.0.1:8000
    #[arg(short, long)]
    bind: Option<String>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Best effort: a missing .env is normal.
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    init_observability(&ObservabilityConfig {
        log_level: if args.verbose { "debug" } else { "info" }.to_string(),
        json_logs: args.json_logs,
    })?;

    let mut config = KeepsakeConfig::load(args.config.as_deref())?;
    if let Some(upload_dir) = args.upload_dir {
        config = config.with_upload_dir(upload_dir);
    }
    if let Some(bind) = args.bind {
        config = config.with_bind(bind);
    }

    tracing::info!(
        upload_dir = %config.upload_dir().display(),
        bind = %config.bind(),
        max_upload_bytes = config.max_upload_bytes(),
        allowed = ?config.allowed_types().media_types().collect::<Vec<_>>(),
        "Starting Keepsake"
    );

    serve(config).await?;
    Ok(())
}
