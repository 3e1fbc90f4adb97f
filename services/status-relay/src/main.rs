//! Status relay CLI
//!
//! Serves the bot status endpoint and relays outage notifications.

use std::path::PathBuf;

use clap::Parser;
use status_relay::{load_config, Config, RelayBuilder};
use tracing::Level;

#[derive(Parser)]
#[command(name = "status-relay")]
#[command(about = "Bot status endpoint with outage and recovery notifications")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listen port (overrides config file)
    #[arg(short, long)]
    port: Option<u16>,

    /// Poll the upstream in the background instead of only on request
    #[arg(long)]
    poll: bool,

    /// Log level
    #[arg(short, long, default_value = "info")]
    log_level: Level,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(args.log_level)
        .init();

    tracing::debug!(
        "Parsed command line arguments: config={:?}, port={:?}, poll={}, log_level={:?}",
        args.config,
        args.port,
        args.poll,
        args.log_level
    );

    let mut config = if let Some(config_path) = &args.config {
        tracing::debug!("Loading configuration from {:?}", config_path);
        load_config(config_path)?
    } else {
        tracing::debug!("Using default configuration");
        Config::default()
    };

    config.apply_env();

    if let Some(port) = args.port {
        config.server.port = port;
    }
    if args.poll {
        config.poller.enabled = true;
    }

    tracing::info!("Starting status relay");
    tracing::debug!(
        "Upstream configured: {}, webhook configured: {}, access gate: {}",
        config.upstream.url.is_some(),
        config.webhook.url.is_some(),
        config.access.internal_key.is_some()
    );

    RelayBuilder::new(config).build()?.start().await?;

    Ok(())
}
