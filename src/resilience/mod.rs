//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Probe result:
//!     → Resource error counter (reset on success, +1 on failure)
//!     → backoff.rs (delay = base + error_timeout × errors, optional cap)
//!     → scheduler sleeps, then resubmits
//! ```
//!
//! # Design Decisions
//! - Probe failures are data, never fatal
//! - Linear, deterministic backoff (no jitter) so schedules are testable
//! - No circuit breaking; a failing endpoint is simply probed less often

pub mod backoff;

pub use backoff::BackoffPolicy;
