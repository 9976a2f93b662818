//! TCP connect liveness probe.

use std::time::Duration;

use async_trait::async_trait;
use tokio::net::TcpStream;
use tokio::time;
use url::Url;

use crate::probe::{Probe, ProbeError, ProbeOutcome};

/// Succeeds when a TCP handshake to the endpoint completes in time.
#[derive(Debug, Clone)]
pub struct TcpConnectProbe {
    timeout: Duration,
}

impl TcpConnectProbe {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

/// Resolve an endpoint into a `host:port` connect target.
///
/// Accepts URLs (`http://host/` uses the scheme's default port) and bare
/// `host:port` pairs.
pub fn connect_target(endpoint: &str) -> Result<String, ProbeError> {
    let invalid = |reason: &str| ProbeError::InvalidEndpoint {
        endpoint: endpoint.to_string(),
        reason: reason.to_string(),
    };

    if endpoint.contains("://") {
        let url = Url::parse(endpoint).map_err(|e| invalid(&e.to_string()))?;
        let host = url.host_str().ok_or_else(|| invalid("missing host"))?;
        let port = url
            .port_or_known_default()
            .ok_or_else(|| invalid("missing port"))?;
        // IPv6 hosts come back bracketed from `host_str`.
        return Ok(format!("{host}:{port}"));
    }

    let (host, port) = endpoint
        .rsplit_once(':')
        .ok_or_else(|| invalid("expected host:port"))?;
    if host.is_empty() {
        return Err(invalid("missing host"));
    }
    port.parse::<u16>().map_err(|_| invalid("invalid port"))?;
    Ok(endpoint.to_string())
}

#[async_trait]
impl Probe for TcpConnectProbe {
    async fn probe(&self, endpoint: &str) -> Result<ProbeOutcome, ProbeError> {
        let target = connect_target(endpoint)?;

        match time::timeout(self.timeout, TcpStream::connect(&target)).await {
            Ok(Ok(_stream)) => Ok(ProbeOutcome::success("connected")),
            Ok(Err(e)) => Err(ProbeError::Connect(e.to_string())),
            Err(_) => Err(ProbeError::Timeout(self.timeout)),
        }
    }
}
