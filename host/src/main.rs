use std::sync::Arc;

use reqpanel_host::{serve_lines, CommandRouter, HostConfig, LocalHost};
use tokio::io::BufReader;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // stdout carries the protocol; logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = HostConfig::from_env();
    tracing::info!(
        root = %config.root.display(),
        storage = ?config.storage_path,
        port = config.server_port,
        "starting host"
    );

    let router = Arc::new(CommandRouter::new(LocalHost::open(config).await?));
    serve_lines(router, BufReader::new(tokio::io::stdin()), tokio::io::stdout()).await?;

    tracing::info!("input closed, exiting");
    Ok(())
}
