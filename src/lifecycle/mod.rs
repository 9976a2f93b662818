//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Shutdown::trigger
//!
//! Shutdown (shutdown.rs):
//!     trigger → every ShutdownSignal resolves
//!     → pollers, delay tasks, seeder, monitor leave their wait
//!     → pipeline joins them and returns the final snapshot
//! ```
//!
//! # Design Decisions
//! - One flag, many observers; late subscribers still see it
//! - Shutdown is the only way the pipeline stops in normal operation

pub mod shutdown;
pub mod signals;

pub use shutdown::{Shutdown, ShutdownSignal};
