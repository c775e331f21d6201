//! Startup orchestration.
//!
//! # Responsibilities
//! - Initialize subsystems in dependency order
//! - Start the metrics endpoint when enabled
//! - Bind the listener last, so traffic arrives only when ready
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Config is loaded and validated by the caller

use std::net::SocketAddr;
use std::sync::Arc;

use thiserror::Error;

use crate::config::ServerConfig;
use crate::dice::DiceEngine;
use crate::http::DiceServer;
use crate::net::{Listener, ListenerError};
use crate::observability::metrics;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Listener(#[from] ListenerError),

    #[error("invalid metrics address '{0}'")]
    MetricsAddress(String),

    #[error("failed to start metrics endpoint: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),
}

/// A server ready to run, bound to its listener.
pub struct Started {
    pub server: DiceServer,
    pub listener: Listener,
}

impl Started {
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }
}

/// Bring up every subsystem for `config`.
pub async fn start(
    config: ServerConfig,
    engine: Arc<dyn DiceEngine>,
) -> Result<Started, StartupError> {
    if config.observability.metrics_enabled {
        let raw = &config.observability.metrics_address;
        let addr: SocketAddr = raw
            .parse()
            .map_err(|_| StartupError::MetricsAddress(raw.clone()))?;
        metrics::init_metrics(addr)?;
    }

    let listener = Listener::bind(&config.listener).await?;
    let server = DiceServer::new(config, engine);

    Ok(Started { server, listener })
}
