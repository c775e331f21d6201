//! Metrics collection and exposition.
//!
//! # Metrics
//! - `dice_requests_total` (counter): responses sent, by status
//! - `dice_request_duration_seconds` (histogram): time from accept to response
//! - `dice_rolls_total` (counter): evaluator outcomes
//! - `dice_transport_failures_total` (counter): connections closed without a response
//! - `dice_active_connections` (gauge): live connections
//!
//! Without an installed recorder every call here is a no-op.

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_request(status: u16, start_time: Instant) {
    ::metrics::counter!("dice_requests_total", "status" => status.to_string()).increment(1);
    ::metrics::histogram!("dice_request_duration_seconds")
        .record(start_time.elapsed().as_secs_f64());
}

pub fn record_roll(outcome: &'static str) {
    ::metrics::counter!("dice_rolls_total", "outcome" => outcome).increment(1);
}

pub fn record_transport_failure() {
    ::metrics::counter!("dice_transport_failures_total").increment(1);
}

pub fn set_active_connections(active: u64) {
    ::metrics::gauge!("dice_active_connections").set(active as f64);
}
