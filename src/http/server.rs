//! Dice server accept loop.
//!
//! # Responsibilities
//! - Accept connections within the connection limit
//! - Run each connection on its own task
//! - Isolate handler panics from the accept loop
//! - Drain in-flight connections on shutdown
//!
//! # Design Decisions
//! - The connection permit and tracker guard move into the task, so a slot
//!   frees up however the task ends
//! - Accept errors are logged and retried after a short pause
//! - Connections still running after the grace period are aborted

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::{JoinError, JoinSet};

use crate::config::ServerConfig;
use crate::dice::DiceEngine;
use crate::http::handler::ConnectionHandler;
use crate::net::{ConnectionTracker, Listener};

const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(50);

/// HTTP dice-roll server.
pub struct DiceServer {
    config: ServerConfig,
    handler: ConnectionHandler,
    tracker: ConnectionTracker,
}

impl DiceServer {
    pub fn new(config: ServerConfig, engine: Arc<dyn DiceEngine>) -> Self {
        let handler = ConnectionHandler::new(engine, &config);
        Self {
            config,
            handler,
            tracker: ConnectionTracker::new(),
        }
    }

    /// Accept connections until `shutdown` fires, then drain.
    pub async fn run(self, listener: Listener, mut shutdown: broadcast::Receiver<()>) {
        match listener.local_addr() {
            Ok(addr) => tracing::info!(address = %addr, "Dice server starting"),
            Err(e) => tracing::warn!(error = %e, "Dice server starting on unknown address"),
        }

        let mut tasks = JoinSet::new();

        loop {
            tokio::select! {
                _ = shutdown.recv() => {
                    tracing::info!(
                        active = self.tracker.active_count(),
                        "Shutdown requested, no longer accepting"
                    );
                    break;
                }
                accepted = listener.accept() => match accepted {
                    Ok((stream, peer_addr, permit)) => {
                        let handler = self.handler.clone();
                        let guard = self.tracker.track();
                        tasks.spawn(async move {
                            let _permit = permit;
                            let id = guard.id();
                            tracing::debug!(
                                connection_id = %id,
                                peer_addr = %peer_addr,
                                "Connection opened"
                            );
                            if let Err(e) = handler.handle(stream, id).await {
                                tracing::debug!(
                                    connection_id = %id,
                                    error = %e,
                                    "Connection closed without response"
                                );
                            }
                        });
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "Accept failed");
                        tokio::time::sleep(ACCEPT_ERROR_BACKOFF).await;
                    }
                },
                Some(joined) = tasks.join_next(), if !tasks.is_empty() => {
                    if let Err(e) = joined {
                        log_task_failure(e);
                    }
                }
            }
        }

        drop(listener);
        self.drain(tasks).await;
        tracing::info!("Dice server stopped");
    }

    async fn drain(&self, mut tasks: JoinSet<()>) {
        if tasks.is_empty() {
            return;
        }

        let grace = Duration::from_secs(self.config.timeouts.shutdown_grace_secs);
        tracing::info!(
            in_flight = tasks.len(),
            grace_secs = grace.as_secs(),
            "Draining connections"
        );

        let drained = tokio::time::timeout(grace, async {
            while let Some(joined) = tasks.join_next().await {
                if let Err(e) = joined {
                    log_task_failure(e);
                }
            }
        })
        .await;

        if drained.is_err() {
            tracing::warn!(
                remaining = tasks.len(),
                "Grace period elapsed, aborting connections"
            );
            tasks.abort_all();
            while tasks.join_next().await.is_some() {}
        }
    }
}

fn log_task_failure(e: JoinError) {
    if e.is_panic() {
        tracing::error!(error = %e, "Connection task panicked");
    } else if !e.is_cancelled() {
        tracing::warn!(error = %e, "Connection task failed");
    }
}
