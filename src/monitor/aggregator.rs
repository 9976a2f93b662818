//! The state monitor task.
//!
//! # Responsibilities
//! - Own the `StatusTable` for its whole lifetime
//! - Apply status events as they arrive
//! - Publish a snapshot on every timer tick
//!
//! # Design Decisions
//! - Single owner, no locks: other tasks only ever hold a `Sender<StatusEvent>`
//! - `tokio::select!` picks uniformly among ready branches, so neither the
//!   ticker nor a busy event stream can starve the other
//! - Each branch runs to completion before the next wait, so a snapshot never
//!   observes a half-applied update

use std::time::Duration;

use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::config::MonitorConfig;
use crate::lifecycle::ShutdownSignal;
use crate::monitor::state::{Snapshot, StatusEvent, StatusTable};

pub struct StateMonitor {
    updates: mpsc::Receiver<StatusEvent>,
    table: StatusTable,
    interval: Duration,
    snapshots: broadcast::Sender<Snapshot>,
    shutdown: ShutdownSignal,
}

impl StateMonitor {
    /// Create a monitor and the sender pollers use to report to it.
    pub fn new(
        config: &MonitorConfig,
        snapshots: broadcast::Sender<Snapshot>,
        shutdown: ShutdownSignal,
    ) -> (mpsc::Sender<StatusEvent>, Self) {
        let (tx, rx) = mpsc::channel(config.status_buffer.max(1));
        let monitor = Self {
            updates: rx,
            table: StatusTable::new(),
            interval: config.status_interval(),
            snapshots,
            shutdown,
        };
        (tx, monitor)
    }

    /// Spawn the monitor, returning its status path and a handle that
    /// resolves to the final table.
    pub fn start(
        config: &MonitorConfig,
        snapshots: broadcast::Sender<Snapshot>,
        shutdown: ShutdownSignal,
    ) -> (mpsc::Sender<StatusEvent>, JoinHandle<StatusTable>) {
        let (tx, monitor) = Self::new(config, snapshots, shutdown);
        (tx, tokio::spawn(monitor.run()))
    }

    /// Run until shutdown or until every status sender is gone.
    pub async fn run(mut self) -> StatusTable {
        tracing::info!(interval = ?self.interval, "State monitor starting");

        let mut ticker = time::interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = self.shutdown.recv() => {
                    tracing::debug!("State monitor received shutdown signal");
                    break;
                }
                _ = ticker.tick() => self.publish(),
                received = self.updates.recv() => match received {
                    Some(event) => self.record(event),
                    None => {
                        tracing::debug!("All status senders closed");
                        break;
                    }
                },
            }
        }

        // Keep whatever was already reported before the stop.
        self.updates.close();
        while let Ok(event) = self.updates.try_recv() {
            self.record(event);
        }

        tracing::info!("State monitor stopped, final state follows");
        self.table.snapshot().log();
        self.table
    }

    fn record(&mut self, event: StatusEvent) {
        let endpoint = event.endpoint.clone();
        let status = event.status_text.clone();
        match self.table.apply(event) {
            Some(previous) if previous == status => {}
            previous => {
                tracing::debug!(
                    endpoint = %endpoint,
                    previous = previous.as_deref().unwrap_or("<none>"),
                    status = %status,
                    "Status changed"
                );
            }
        }
    }

    fn publish(&self) {
        let snapshot = self.table.snapshot();
        snapshot.log();
        // No subscribers is the normal case outside of tests.
        let _ = self.snapshots.send(snapshot);
    }
}
