//! Liveness probes.
//!
//! # Responsibilities
//! - Define the `Probe` capability consumed by pollers
//! - Provide HTTP HEAD and TCP connect transports
//!
//! # Design Decisions
//! - A probe reports transport failure as `ProbeError`, never by panicking
//! - Every probe carries its own deadline; a poller never waits unbounded
//! - No TLS: `https://` endpoints are rejected by the HTTP probe

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::{ProbeConfig, ProbeKind};

pub mod http;
pub mod tcp;

pub use http::HttpHeadProbe;
pub use tcp::TcpConnectProbe;

/// What a probe observed when it reached the endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeOutcome {
    /// Human-readable result, e.g. `"200 OK"`.
    pub status_text: String,
    /// Whether this outcome resets the endpoint's error counter.
    pub success: bool,
}

impl ProbeOutcome {
    pub fn success(status_text: impl Into<String>) -> Self {
        Self {
            status_text: status_text.into(),
            success: true,
        }
    }

    pub fn failure(status_text: impl Into<String>) -> Self {
        Self {
            status_text: status_text.into(),
            success: false,
        }
    }
}

/// Transport-level failure of a single probe attempt.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProbeError {
    #[error("invalid endpoint {endpoint:?}: {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    #[error("unsupported scheme {0:?}")]
    UnsupportedScheme(String),

    #[error("probe timed out after {0:?}")]
    Timeout(Duration),

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("request failed: {0}")]
    Request(String),
}

/// A liveness check against one endpoint.
#[async_trait]
pub trait Probe: Send + Sync + fmt::Debug {
    async fn probe(&self, endpoint: &str) -> Result<ProbeOutcome, ProbeError>;
}

/// Build the probe selected by configuration.
pub fn from_config(config: &ProbeConfig) -> Arc<dyn Probe> {
    match config.kind {
        ProbeKind::HttpHead => Arc::new(HttpHeadProbe::new(config)),
        ProbeKind::TcpConnect => Arc::new(TcpConnectProbe::new(config.timeout())),
    }
}

/// Render an error and its sources as one line, outermost first.
pub(crate) fn error_chain(err: &dyn std::error::Error) -> String {
    let mut text = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let cause_text = cause.to_string();
        if !text.contains(&cause_text) {
            text.push_str(": ");
            text.push_str(&cause_text);
        }
        source = cause.source();
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Error)]
    #[error("outer")]
    struct Outer(#[source] std::io::Error);

    #[test]
    fn error_chain_includes_sources() {
        let err = Outer(std::io::Error::new(
            std::io::ErrorKind::ConnectionRefused,
            "connection refused",
        ));
        assert_eq!(error_chain(&err), "outer: connection refused");
    }

    #[test]
    fn factory_honours_kind() {
        let mut config = ProbeConfig::default();
        assert!(format!("{:?}", from_config(&config)).contains("HttpHeadProbe"));

        config.kind = ProbeKind::TcpConnect;
        assert!(format!("{:?}", from_config(&config)).contains("TcpConnectProbe"));
    }
}
