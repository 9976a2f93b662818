//! Concurrent endpoint liveness poller.
//!
//! A fixed pool of pollers probes a fixed set of endpoints, a single monitor
//! task owns the last-known status of each, and every endpoint is probed
//! again after a delay that grows linearly with its error streak.

pub mod config;
pub mod lifecycle;
pub mod monitor;
pub mod observability;
pub mod polling;
pub mod probe;
pub mod resilience;

pub use config::PipelineConfig;
pub use lifecycle::Shutdown;
pub use monitor::Snapshot;
pub use polling::{Pipeline, PipelineError};
