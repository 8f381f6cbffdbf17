//! Lumina relay - holds the provider key and enforces a per-caller quota
//!
//! # Usage
//!
//! ```bash
//! # Key from the environment or a .env file
//! OPENAI_API_KEY=sk-... lumina-relay
//!
//! # Custom config and port
//! lumina-relay --config ./relay.toml --port 8787
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;

use lumina::relay::{start_server, OpenAiUpstream, RelayConfig};

/// Lumina relay server
#[derive(Parser, Debug)]
#[command(name = "lumina-relay")]
#[command(version, about, long_about = None)]
struct RelayArgs {
    /// Config file (default: ~/.lumina/relay.toml if present)
    #[arg(short = 'c', long, env = "LUMINA_RELAY_CONFIG")]
    config: Option<PathBuf>,

    /// Override the listen address
    #[arg(long)]
    host: Option<String>,

    /// Override the listen port
    #[arg(short = 'p', long, env = "PORT")]
    port: Option<u16>,

    /// Show verbose output (debug information)
    #[arg(short = 'v', long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = RelayArgs::parse();

    if let Err(e) = dotenvy::dotenv() {
        if !matches!(e, dotenvy::Error::Io(_)) {
            eprintln!("Failed to load .env file: {}", e);
        }
    }

    let log_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(format!("lumina={}", log_level).parse()?),
        )
        .init();

    let mut config = RelayConfig::load(args.config.as_deref()).await?;
    if let Some(host) = args.host {
        config.host = host;
    }
    if let Some(port) = args.port {
        config.port = port;
    }

    let provider =
        OpenAiUpstream::new(&config.provider).context("Failed to create provider client")?;
    let (addr, shutdown, server) = start_server(&config, Arc::new(provider)).await?;
    println!("Lumina relay running at http://{}", addr);

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;
    tracing::info!("[relay] Shutting down");
    shutdown.cancel();
    server.await.context("Relay server task failed")?;

    Ok(())
}
