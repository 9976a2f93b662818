//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (intervals > 0, at least one poller)
//! - Check that every endpoint is probeable by the configured probe kind
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: PipelineConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use thiserror::Error;
use url::Url;

use crate::config::schema::{PipelineConfig, ProbeKind};

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("no endpoints configured")]
    NoEndpoints,

    #[error("endpoint {0:?} is listed more than once")]
    DuplicateEndpoint(String),

    #[error("endpoint {endpoint:?} is invalid: {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    /// Zero pollers would leave the seeding task blocked forever on the
    /// pending handoff.
    #[error("polling.pollers must be at least 1")]
    NoPollers,

    #[error("{0} must be greater than zero")]
    ZeroDuration(&'static str),

    #[error("polling.max_backoff_ms ({max_ms}) is below polling.poll_interval_ms ({base_ms})")]
    BackoffCapBelowBase { max_ms: u64, base_ms: u64 },

    #[error("monitor.status_buffer must be at least 1")]
    ZeroStatusBuffer,

    #[error("observability.metrics_address {0:?} is not a socket address")]
    InvalidMetricsAddress(String),
}

/// Validate a fully deserialized configuration.
pub fn validate_config(config: &PipelineConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.endpoints.is_empty() {
        errors.push(ValidationError::NoEndpoints);
    }

    let mut seen = HashSet::new();
    for endpoint in &config.endpoints {
        if !seen.insert(endpoint.as_str()) {
            errors.push(ValidationError::DuplicateEndpoint(endpoint.clone()));
            continue;
        }
        if let Err(reason) = check_endpoint(endpoint, config.probe.kind) {
            errors.push(ValidationError::InvalidEndpoint {
                endpoint: endpoint.clone(),
                reason,
            });
        }
    }

    let polling = &config.polling;
    if polling.pollers == 0 {
        errors.push(ValidationError::NoPollers);
    }
    if polling.poll_interval_ms == 0 {
        errors.push(ValidationError::ZeroDuration("polling.poll_interval_ms"));
    }
    if let Some(max_ms) = polling.max_backoff_ms {
        if max_ms < polling.poll_interval_ms {
            errors.push(ValidationError::BackoffCapBelowBase {
                max_ms,
                base_ms: polling.poll_interval_ms,
            });
        }
    }

    if config.probe.timeout_ms == 0 {
        errors.push(ValidationError::ZeroDuration("probe.timeout_ms"));
    }

    if config.monitor.status_interval_ms == 0 {
        errors.push(ValidationError::ZeroDuration("monitor.status_interval_ms"));
    }
    if config.monitor.status_buffer == 0 {
        errors.push(ValidationError::ZeroStatusBuffer);
    }

    let observability = &config.observability;
    if observability.metrics_enabled
        && observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidMetricsAddress(
            observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_endpoint(endpoint: &str, kind: ProbeKind) -> Result<(), String> {
    match kind {
        ProbeKind::HttpHead => {
            let url = Url::parse(endpoint).map_err(|e| e.to_string())?;
            match url.scheme() {
                "http" => {}
                "https" => return Err("https is not supported by the http_head probe".to_string()),
                other => return Err(format!("unsupported scheme {other:?}")),
            }
            if url.host_str().is_none() {
                return Err("missing host".to_string());
            }
            Ok(())
        }
        ProbeKind::TcpConnect => crate::probe::tcp::connect_target(endpoint)
            .map(|_| ())
            .map_err(|e| e.to_string()),
    }
}
