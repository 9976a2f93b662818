//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → CLI overrides (main.rs)
//!     → validation.rs (semantic checks)
//!     → PipelineConfig (validated, immutable)
//!     → sections handed to pipeline, probe, monitor, observability
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; the endpoint set never changes at runtime
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, read_config, ConfigError};
pub use schema::{
    LogFormat, MonitorConfig, ObservabilityConfig, PipelineConfig, PollingConfig, ProbeConfig,
    ProbeKind,
};
pub use validation::{validate_config, ValidationError};
