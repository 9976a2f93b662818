//! Shared utilities for integration and load testing.

#![allow(dead_code)]

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use endpoint_poller::config::PipelineConfig;
use endpoint_poller::Snapshot;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::broadcast;

fn status_line(status: u16) -> &'static str {
    match status {
        200 => "200 OK",
        404 => "404 Not Found",
        429 => "429 Too Many Requests",
        500 => "500 Internal Server Error",
        502 => "502 Bad Gateway",
        503 => "503 Service Unavailable",
        _ => "200 OK",
    }
}

/// Start a mock backend that answers every request with a fixed status.
pub async fn start_mock_backend(status: u16) -> SocketAddr {
    start_programmable_backend(move || async move { status }).await
}

/// Start a backend whose status is computed per request.
pub async fn start_programmable_backend<F, Fut>(f: F) -> SocketAddr
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = u16> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let f = Arc::new(f);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let f = f.clone();
                    tokio::spawn(async move {
                        let mut buf = [0u8; 1024];
                        let _ = socket.read(&mut buf).await;
                        let status = f().await;
                        let response = format!(
                            "HTTP/1.1 {}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
                            status_line(status)
                        );
                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

/// An address nothing is listening on.
pub async fn closed_port() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

/// Short intervals so real-time tests finish quickly.
pub fn fast_config(endpoints: Vec<String>, pollers: usize) -> PipelineConfig {
    let mut config = PipelineConfig {
        endpoints,
        ..PipelineConfig::default()
    };
    config.polling.pollers = pollers;
    config.polling.poll_interval_ms = 100;
    config.polling.error_timeout_ms = 50;
    config.polling.max_backoff_ms = Some(500);
    config.probe.timeout_ms = 1_000;
    config.monitor.status_interval_ms = 100;
    config
}

/// Wait for the first snapshot matching `done`, or panic after `limit`.
pub async fn wait_for_snapshot(
    snapshots: &mut broadcast::Receiver<Snapshot>,
    limit: Duration,
    done: impl Fn(&Snapshot) -> bool,
) -> Snapshot {
    let result = tokio::time::timeout(limit, async {
        loop {
            match snapshots.recv().await {
                Ok(snapshot) if done(&snapshot) => return snapshot,
                Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => panic!("snapshot stream closed"),
            }
        }
    })
    .await;

    match result {
        Ok(snapshot) => snapshot,
        Err(_) => panic!("no matching snapshot within {limit:?}"),
    }
}
