//! HTTP HEAD liveness probe.
//!
//! # Responsibilities
//! - Issue one HEAD request per probe with a per-probe deadline
//! - Turn the response status into the status text (`"200 OK"`)
//! - Classify transport errors (connect vs request vs timeout)

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use http_body_util::Empty;
use hyper::{header::USER_AGENT, Method, Request, StatusCode, Uri};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use tokio::time;

use crate::config::ProbeConfig;
use crate::probe::{error_chain, Probe, ProbeError, ProbeOutcome};

/// Sends a single HEAD request per probe.
///
/// Redirects are not followed: a `3xx` answer is the reported status and
/// counts as a success, since the endpoint responded.
pub struct HttpHeadProbe {
    client: Client<HttpConnector, Empty<Bytes>>,
    timeout: Duration,
    user_agent: String,
    server_errors_are_failures: bool,
}

impl HttpHeadProbe {
    pub fn new(config: &ProbeConfig) -> Self {
        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(config.timeout()));

        let client = Client::builder(TokioExecutor::new()).build(connector);

        Self {
            client,
            timeout: config.timeout(),
            user_agent: config.user_agent.clone(),
            server_errors_are_failures: config.server_errors_are_failures,
        }
    }

    fn parse_endpoint(endpoint: &str) -> Result<Uri, ProbeError> {
        let uri = endpoint
            .parse::<Uri>()
            .map_err(|e| ProbeError::InvalidEndpoint {
                endpoint: endpoint.to_string(),
                reason: e.to_string(),
            })?;

        match uri.scheme_str() {
            Some("http") => Ok(uri),
            Some(other) => Err(ProbeError::UnsupportedScheme(other.to_string())),
            None => Err(ProbeError::InvalidEndpoint {
                endpoint: endpoint.to_string(),
                reason: "missing scheme".to_string(),
            }),
        }
    }
}

impl fmt::Debug for HttpHeadProbe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpHeadProbe")
            .field("timeout", &self.timeout)
            .field("user_agent", &self.user_agent)
            .field("server_errors_are_failures", &self.server_errors_are_failures)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Probe for HttpHeadProbe {
    async fn probe(&self, endpoint: &str) -> Result<ProbeOutcome, ProbeError> {
        let uri = Self::parse_endpoint(endpoint)?;

        let request = Request::builder()
            .method(Method::HEAD)
            .uri(uri)
            .header(USER_AGENT, self.user_agent.as_str())
            .body(Empty::<Bytes>::new())
            .map_err(|e| ProbeError::Request(e.to_string()))?;

        match time::timeout(self.timeout, self.client.request(request)).await {
            Ok(Ok(response)) => {
                let status = response.status();
                let text = status_line(status);
                if self.server_errors_are_failures && status.is_server_error() {
                    tracing::debug!(endpoint, status = %text, "Probe got server error");
                    Ok(ProbeOutcome::failure(text))
                } else {
                    Ok(ProbeOutcome::success(text))
                }
            }
            Ok(Err(e)) if e.is_connect() => Err(ProbeError::Connect(error_chain(&e))),
            Ok(Err(e)) => Err(ProbeError::Request(error_chain(&e))),
            Err(_) => Err(ProbeError::Timeout(self.timeout)),
        }
    }
}

/// `"200 OK"`, or just the code when it has no canonical reason.
pub fn status_line(status: StatusCode) -> String {
    match status.canonical_reason() {
        Some(reason) => format!("{} {}", status.as_u16(), reason),
        None => status.as_u16().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::SocketAddr;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    async fn serve_once_forever(status_line: &'static str) -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                tokio::spawn(async move {
                    let mut buf = [0u8; 1024];
                    let _ = socket.read(&mut buf).await;
                    let response = format!(
                        "HTTP/1.1 {status_line}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n"
                    );
                    let _ = socket.write_all(response.as_bytes()).await;
                    let _ = socket.shutdown().await;
                });
            }
        });
        addr
    }

    fn probe_with(timeout_ms: u64, server_errors_are_failures: bool) -> HttpHeadProbe {
        HttpHeadProbe::new(&ProbeConfig {
            timeout_ms,
            server_errors_are_failures,
            ..ProbeConfig::default()
        })
    }

    #[tokio::test]
    async fn reports_status_line() {
        let addr = serve_once_forever("200 OK").await;
        let outcome = probe_with(2_000, false)
            .probe(&format!("http://{addr}/"))
            .await
            .unwrap();
        assert_eq!(outcome, ProbeOutcome::success("200 OK"));
    }

    #[tokio::test]
    async fn server_errors_succeed_unless_configured() {
        let addr = serve_once_forever("503 Service Unavailable").await;
        let url = format!("http://{addr}/");

        let lenient = probe_with(2_000, false).probe(&url).await.unwrap();
        assert_eq!(lenient, ProbeOutcome::success("503 Service Unavailable"));

        let strict = probe_with(2_000, true).probe(&url).await.unwrap();
        assert_eq!(strict, ProbeOutcome::failure("503 Service Unavailable"));
    }

    #[tokio::test]
    async fn redirect_is_reported_not_followed() {
        let addr = serve_once_forever("301 Moved Permanently").await;
        let outcome = probe_with(2_000, true)
            .probe(&format!("http://{addr}/"))
            .await
            .unwrap();
        assert_eq!(outcome, ProbeOutcome::success("301 Moved Permanently"));
    }

    #[tokio::test]
    async fn refused_connection_is_connect_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = probe_with(2_000, false)
            .probe(&format!("http://{addr}/"))
            .await
            .unwrap_err();
        assert!(matches!(err, ProbeError::Connect(_)), "{err:?}");
    }

    #[tokio::test]
    async fn silent_backend_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let err = probe_with(100, false)
            .probe(&format!("http://{addr}/"))
            .await
            .unwrap_err();
        assert_eq!(err, ProbeError::Timeout(Duration::from_millis(100)));
    }

    #[tokio::test]
    async fn rejects_unprobeable_endpoints() {
        let probe = probe_with(100, false);

        let err = probe.probe("https://secure.example/").await.unwrap_err();
        assert_eq!(err, ProbeError::UnsupportedScheme("https".into()));

        let err = probe.probe("example.com").await.unwrap_err();
        assert!(matches!(err, ProbeError::InvalidEndpoint { .. }));

        let err = probe.probe("not a url").await.unwrap_err();
        assert!(matches!(err, ProbeError::InvalidEndpoint { .. }));
    }

    #[test]
    fn status_line_without_reason() {
        assert_eq!(status_line(StatusCode::NOT_FOUND), "404 Not Found");
        assert_eq!(status_line(StatusCode::from_u16(599).unwrap()), "599");
    }
}
