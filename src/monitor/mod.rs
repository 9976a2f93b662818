//! State monitoring subsystem.
//!
//! # Data Flow
//! ```text
//! Pollers ──StatusEvent──▶ mpsc ──▶ StateMonitor (aggregator.rs)
//!                                      │ owns StatusTable (state.rs)
//!                         ticker ─────▶│
//!                                      ▼
//!                              Snapshot → log + broadcast subscribers
//! ```
//!
//! # Design Decisions
//! - The table is never shared; only copies of data cross task boundaries
//! - Snapshots are ordered by endpoint so equal states compare equal

pub mod aggregator;
pub mod state;

pub use aggregator::StateMonitor;
pub use state::{Snapshot, StatusEvent, StatusTable};
