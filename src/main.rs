use std::path::PathBuf;

use clap::Parser;

use endpoint_poller::config::{self, ConfigError, LogFormat, PipelineConfig};
use endpoint_poller::lifecycle::{signals, Shutdown};
use endpoint_poller::observability::{logging, metrics};
use endpoint_poller::polling::Pipeline;
use endpoint_poller::probe;

#[derive(Parser, Debug)]
#[command(name = "endpoint-poller")]
#[command(about = "Poll a fixed set of endpoints and log their liveness", long_about = None)]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Endpoint to poll. Repeat for several; replaces the configured list.
    #[arg(short, long = "endpoint", value_name = "URL")]
    endpoints: Vec<String>,

    /// Number of poller tasks.
    #[arg(long)]
    pollers: Option<usize>,

    #[arg(long, value_name = "MS")]
    poll_interval_ms: Option<u64>,

    #[arg(long, value_name = "MS")]
    error_timeout_ms: Option<u64>,

    #[arg(long, value_name = "MS")]
    max_backoff_ms: Option<u64>,

    /// How often the current state is logged.
    #[arg(long, value_name = "MS")]
    status_interval_ms: Option<u64>,

    #[arg(long)]
    log_level: Option<String>,

    /// Emit logs as JSON.
    #[arg(long)]
    json_logs: bool,
}

impl Cli {
    fn apply(&self, config: &mut PipelineConfig) {
        if !self.endpoints.is_empty() {
            config.endpoints = self.endpoints.clone();
        }
        if let Some(pollers) = self.pollers {
            config.polling.pollers = pollers;
        }
        if let Some(ms) = self.poll_interval_ms {
            config.polling.poll_interval_ms = ms;
        }
        if let Some(ms) = self.error_timeout_ms {
            config.polling.error_timeout_ms = ms;
        }
        if self.max_backoff_ms.is_some() {
            config.polling.max_backoff_ms = self.max_backoff_ms;
        }
        if let Some(ms) = self.status_interval_ms {
            config.monitor.status_interval_ms = ms;
        }
        if let Some(level) = &self.log_level {
            config.observability.log_level = level.clone();
        }
        if self.json_logs {
            config.observability.log_format = LogFormat::Json;
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => config::read_config(path)?,
        None => PipelineConfig::default(),
    };
    cli.apply(&mut config);
    config::validate_config(&config).map_err(ConfigError::Validation)?;

    logging::init_logging(&config.observability)?;

    tracing::info!(
        endpoints = config.endpoints.len(),
        pollers = config.polling.pollers,
        poll_interval_ms = config.polling.poll_interval_ms,
        error_timeout_ms = config.polling.error_timeout_ms,
        status_interval_ms = config.monitor.status_interval_ms,
        probe = ?config.probe.kind,
        "endpoint-poller starting"
    );

    if config.observability.metrics_enabled {
        // Validation already checked the address.
        let addr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr)?;
    }

    let probe = probe::from_config(&config.probe);
    let pipeline = Pipeline::new(&config, probe)?;

    let shutdown = Shutdown::new();
    signals::spawn_signal_handler(shutdown.clone());

    let snapshot = pipeline.run(shutdown).await?;
    println!("{}", serde_json::to_string_pretty(&snapshot)?);

    tracing::info!("Shutdown complete");
    Ok(())
}
