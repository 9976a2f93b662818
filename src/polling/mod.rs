//! Polling subsystem.
//!
//! # Data Flow
//! ```text
//! Pipeline ──seed──▶ pending ──▶ Poller ×N ──StatusEvent──▶ StateMonitor
//!    ▲                  ▲           │
//!    │                  │           ▼
//!    │          BackoffScheduler ◀─ completed
//!    └── hand-off loop ─────────────┘
//! ```
//!
//! # Design Decisions
//! - `pending` and `completed` are zero-capacity rendezvous channels; at most
//!   N resources are in flight, with no admission logic beyond that
//! - A `Resource` is a move-only value, so it is always in exactly one place:
//!   a channel, a poller, or a resting task
//! - No locks or shared counters; tasks only exchange owned values

pub mod pipeline;
pub mod poller;
pub mod resource;
pub mod scheduler;

pub use pipeline::{Pipeline, PipelineError};
pub use poller::{Poller, PollerExit};
pub use resource::Resource;
pub use scheduler::{BackoffScheduler, Resubmission};
