//! dice-server: answers dice-roll queries over raw HTTP/1.1.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use dice_server::config::{load_config, read_config, validate_config, ConfigError, ServerConfig};
use dice_server::lifecycle::{self, Shutdown};
use dice_server::observability::logging;
use dice_server::BuiltinEngine;

#[derive(Debug, Parser)]
#[command(name = "dice-server")]
#[command(about = "HTTP server that evaluates tabletop dice rolls", long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override listener.bind_address
    #[arg(short, long)]
    bind: Option<String>,

    /// Override listener.max_connections
    #[arg(long)]
    max_connections: Option<usize>,
}

/// File (or defaults), then command-line overrides, then validation.
fn resolve_config(cli: &Cli) -> Result<ServerConfig, ConfigError> {
    let has_overrides = cli.bind.is_some() || cli.max_connections.is_some();
    let mut config = match &cli.config {
        Some(path) if !has_overrides => return load_config(path),
        Some(path) => read_config(path)?,
        None => ServerConfig::default(),
    };

    if let Some(bind) = &cli.bind {
        config.listener.bind_address = bind.clone();
    }
    if let Some(max_connections) = cli.max_connections {
        config.listener.max_connections = max_connections;
    }

    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = resolve_config(&cli)?;

    logging::init_logging(&config.observability.log_level);
    tracing::info!("dice-server v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        max_connections = config.listener.max_connections,
        max_head_bytes = config.limits.max_head_bytes,
        read_timeout_secs = ?config.timeouts.read_secs,
        "Configuration loaded"
    );

    let engine = Arc::new(BuiltinEngine::new());
    tracing::info!(systems = ?engine.systems().iter().collect::<Vec<_>>(), "Dice engine ready");

    let started = lifecycle::start(config, engine).await?;
    tracing::info!(address = %started.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server = tokio::spawn(started.server.run(started.listener, shutdown.subscribe()));

    lifecycle::shutdown_signal().await;
    shutdown.trigger();
    server.await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
