//! Per-connection request handling.
//!
//! ```text
//! ReadingRequest → Decoding → Evaluating → Responding → Closed
//! ```
//! Every state moves forward only. Each failure picks an error response and
//! jumps straight to `Responding`; transport failures skip to `Closed`.

use std::sync::Arc;
use std::time::{Duration, Instant};

use thiserror::Error;
use tokio::io::{AsyncRead, AsyncWrite, BufReader};

use crate::config::ServerConfig;
use crate::dice::{self, DiceEngine, RollOutcome};
use crate::http::query::decode_query;
use crate::http::request::{read_request, RequestError};
use crate::http::response::{HttpStatus, Response};
use crate::net::ConnectionId;
use crate::observability::metrics;

pub const MALFORMED_REQUEST_MESSAGE: &str = "invalid http request format";
pub const INVALID_QUERY_MESSAGE: &str = "invalid request query";
pub const INVALID_INPUT_MESSAGE: &str = "不正な入力";

/// Why a connection ended without a complete response.
#[derive(Debug, Error)]
pub enum HandleError {
    #[error(transparent)]
    Read(RequestError),

    #[error("failed to write response: {0}")]
    Write(#[from] std::io::Error),
}

/// Shared, cheaply cloned handler. One clone per connection task.
#[derive(Clone)]
pub struct ConnectionHandler {
    engine: Arc<dyn DiceEngine>,
    max_head_bytes: usize,
    read_timeout: Option<Duration>,
}

impl ConnectionHandler {
    pub fn new(engine: Arc<dyn DiceEngine>, config: &ServerConfig) -> Self {
        Self {
            engine,
            max_head_bytes: config.limits.max_head_bytes,
            read_timeout: config.timeouts.read_secs.map(Duration::from_secs),
        }
    }

    /// Decode and evaluate a request target.
    pub fn respond_to_target(&self, target: &str) -> Response {
        let query = match decode_query(target) {
            Ok(query) => query,
            Err(e) => {
                tracing::debug!(target = %target, error = %e, "Rejected query");
                return Response::error(HttpStatus::BadRequest, INVALID_QUERY_MESSAGE);
            }
        };

        let outcome = dice::roll(self.engine.as_ref(), &query.game, &query.dice);
        metrics::record_roll(outcome.label());

        match outcome {
            RollOutcome::Success(text) => Response::ok(text),
            RollOutcome::NotSupported | RollOutcome::InvalidRoll => {
                tracing::debug!(
                    game = %query.game,
                    dice = %query.dice,
                    outcome = outcome.label(),
                    "Roll failed"
                );
                Response::error(HttpStatus::BadRequest, INVALID_INPUT_MESSAGE)
            }
        }
    }

    async fn read_head<R>(&self, reader: &mut R) -> Result<Option<String>, RequestError>
    where
        R: tokio::io::AsyncBufRead + Unpin,
    {
        let read = read_request(reader, self.max_head_bytes);
        let line = match self.read_timeout {
            Some(limit) => tokio::time::timeout(limit, read)
                .await
                .map_err(|_| RequestError::Timeout(limit.as_secs()))??,
            None => read.await?,
        };
        Ok(line.map(|line| line.target))
    }

    /// Serve exactly one request on `stream`, then close it.
    pub async fn handle<S>(&self, stream: S, id: ConnectionId) -> Result<HttpStatus, HandleError>
    where
        S: AsyncRead + AsyncWrite,
    {
        let start_time = Instant::now();
        let (read_half, mut write_half) = tokio::io::split(stream);
        let mut reader = BufReader::new(read_half);

        let (target, response) = match self.read_head(&mut reader).await {
            // A stream that ends before any request line has an empty target,
            // which the decoder rejects.
            Ok(target) => {
                let target = target.unwrap_or_default();
                let response = self.respond_to_target(&target);
                (target, response)
            }
            Err(e) if e.is_transport() => {
                tracing::debug!(
                    connection_id = %id,
                    error = %e,
                    "Connection dropped before request"
                );
                metrics::record_transport_failure();
                return Err(HandleError::Read(e));
            }
            Err(e) => {
                tracing::debug!(connection_id = %id, error = %e, "Malformed request");
                (
                    String::new(),
                    Response::error(HttpStatus::BadRequest, MALFORMED_REQUEST_MESSAGE),
                )
            }
        };

        if let Err(e) = response.write_to(&mut write_half).await {
            tracing::debug!(connection_id = %id, error = %e, "Failed to write response");
            metrics::record_transport_failure();
            return Err(HandleError::Write(e));
        }

        let status = response.status;
        metrics::record_request(status.code(), start_time);
        tracing::info!(
            connection_id = %id,
            target = %target,
            status = status.code(),
            elapsed_ms = start_time.elapsed().as_millis() as u64,
            "Request handled"
        );

        Ok(status)
    }
}
