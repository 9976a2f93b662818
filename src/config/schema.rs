//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the poller.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration for the polling pipeline.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Endpoints to poll. Fixed for the lifetime of the process.
    pub endpoints: Vec<String>,

    /// Worker pool and backoff settings.
    pub polling: PollingConfig,

    /// Liveness probe settings.
    pub probe: ProbeConfig,

    /// State monitor settings.
    pub monitor: MonitorConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            endpoints: vec![
                "http://www.google.com/".to_string(),
                "http://golang.org/".to_string(),
                "http://blog.golang.org/".to_string(),
            ],
            polling: PollingConfig::default(),
            probe: ProbeConfig::default(),
            monitor: MonitorConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

/// Worker pool and rescheduling configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PollingConfig {
    /// Number of poller tasks. Also the maximum number of in-flight probes.
    pub pollers: usize,

    /// Delay before re-probing a healthy endpoint, in milliseconds.
    pub poll_interval_ms: u64,

    /// Extra delay per consecutive error, in milliseconds.
    pub error_timeout_ms: u64,

    /// Upper bound on the resubmission delay. Unset means unbounded.
    pub max_backoff_ms: Option<u64>,
}

impl PollingConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn error_timeout(&self) -> Duration {
        Duration::from_millis(self.error_timeout_ms)
    }

    pub fn max_backoff(&self) -> Option<Duration> {
        self.max_backoff_ms.map(Duration::from_millis)
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            pollers: 2,
            poll_interval_ms: 60_000,
            error_timeout_ms: 10_000,
            max_backoff_ms: None,
        }
    }
}

/// Which transport the liveness probe uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeKind {
    /// HTTP HEAD request; status line becomes the status text.
    HttpHead,
    /// Plain TCP connect to host:port.
    TcpConnect,
}

/// Probe configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProbeConfig {
    pub kind: ProbeKind,

    /// Per-probe deadline in milliseconds (connect + response head).
    pub timeout_ms: u64,

    /// User-Agent header sent with HTTP probes.
    pub user_agent: String,

    /// Count 5xx responses as failures for backoff purposes.
    pub server_errors_are_failures: bool,
}

impl ProbeConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            kind: ProbeKind::HttpHead,
            timeout_ms: 10_000,
            user_agent: concat!("endpoint-poller/", env!("CARGO_PKG_VERSION")).to_string(),
            server_errors_are_failures: false,
        }
    }
}

/// State monitor configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// How often the current state is logged, in milliseconds.
    pub status_interval_ms: u64,

    /// Capacity of the status event channel.
    pub status_buffer: usize,
}

impl MonitorConfig {
    pub fn status_interval(&self) -> Duration {
        Duration::from_millis(self.status_interval_ms)
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            status_interval_ms: 10_000,
            status_buffer: 1,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` takes precedence.
    pub log_level: String,

    pub log_format: LogFormat,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
