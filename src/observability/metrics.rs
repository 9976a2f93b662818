//! Metrics collection and exposition.
//!
//! # Metrics
//! - `poller_probes_total` (counter): probes by endpoint and outcome
//! - `poller_consecutive_errors` (gauge): current error streak per endpoint
//! - `poller_backoff_delay_seconds` (histogram): resubmission delays
//! - `poller_resting_resources` (gauge): resources waiting out a backoff
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade; without an installed
//!   recorder every call is a no-op
//! - The Prometheus endpoint is opt-in

use std::net::SocketAddr;
use std::time::Duration;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and its HTTP listener.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_probe(endpoint: &str, success: bool) {
    let outcome = if success { "success" } else { "failure" };
    counter!(
        "poller_probes_total",
        "endpoint" => endpoint.to_string(),
        "outcome" => outcome
    )
    .increment(1);
}

pub fn record_consecutive_errors(endpoint: &str, errors: u32) {
    gauge!("poller_consecutive_errors", "endpoint" => endpoint.to_string()).set(f64::from(errors));
}

pub fn record_backoff_delay(delay: Duration) {
    histogram!("poller_backoff_delay_seconds").record(delay.as_secs_f64());
}

pub fn record_resting_resources(count: usize) {
    gauge!("poller_resting_resources").set(count as f64);
}
