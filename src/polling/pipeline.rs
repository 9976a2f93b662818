//! Pipeline orchestration.
//!
//! # Responsibilities
//! - Create the pending and completed handoff paths
//! - Start the state monitor and the poller pool
//! - Seed the pending path, then feed completed resources to the scheduler
//! - On shutdown, join every task and return the final snapshot

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::broadcast;
use tokio::task::{JoinError, JoinSet};

use crate::config::{MonitorConfig, PipelineConfig};
use crate::lifecycle::{Shutdown, ShutdownSignal};
use crate::monitor::{Snapshot, StateMonitor};
use crate::polling::poller::{Poller, PollerExit};
use crate::polling::resource::Resource;
use crate::polling::scheduler::BackoffScheduler;
use crate::probe::Probe;
use crate::resilience::BackoffPolicy;

/// Snapshots kept for slow subscribers before they start lagging.
const SNAPSHOT_BACKLOG: usize = 16;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// With no pollers the seeding task would block forever on the
    /// zero-capacity pending path.
    #[error("at least one poller is required")]
    NoPollers,

    #[error("no endpoints to poll")]
    NoEndpoints,

    #[error("pipeline task failed: {0}")]
    TaskFailed(#[from] JoinError),
}

pub struct Pipeline {
    endpoints: Vec<String>,
    pollers: usize,
    policy: BackoffPolicy,
    monitor: MonitorConfig,
    probe: Arc<dyn Probe>,
    snapshots: broadcast::Sender<Snapshot>,
}

impl Pipeline {
    pub fn new(config: &PipelineConfig, probe: Arc<dyn Probe>) -> Result<Self, PipelineError> {
        if config.polling.pollers == 0 {
            return Err(PipelineError::NoPollers);
        }
        if config.endpoints.is_empty() {
            return Err(PipelineError::NoEndpoints);
        }

        let (snapshots, _) = broadcast::channel(SNAPSHOT_BACKLOG);
        Ok(Self {
            endpoints: config.endpoints.clone(),
            pollers: config.polling.pollers,
            policy: BackoffPolicy::from_config(&config.polling),
            monitor: config.monitor.clone(),
            probe,
            snapshots,
        })
    }

    /// Receive every periodic snapshot the monitor publishes.
    pub fn subscribe(&self) -> broadcast::Receiver<Snapshot> {
        self.snapshots.subscribe()
    }

    /// Run until `shutdown` fires, then drain and return the final state.
    pub async fn run(self, shutdown: Shutdown) -> Result<Snapshot, PipelineError> {
        let (pending_tx, pending_rx) = flume::bounded::<Resource>(0);
        let (completed_tx, completed_rx) = flume::bounded::<Resource>(0);

        let (status_tx, monitor) =
            StateMonitor::start(&self.monitor, self.snapshots.clone(), shutdown.subscribe());

        let mut pollers = JoinSet::new();
        for id in 0..self.pollers {
            let poller = Poller::new(
                id,
                self.probe.clone(),
                pending_rx.clone(),
                completed_tx.clone(),
                status_tx.clone(),
                shutdown.subscribe(),
            );
            pollers.spawn(poller.run());
        }
        // Only pollers hold these now, so the paths close when the pool is gone.
        drop(pending_rx);
        drop(completed_tx);
        drop(status_tx);

        tracing::info!(
            pollers = self.pollers,
            endpoints = self.endpoints.len(),
            "Polling pipeline started"
        );

        // Seeding runs apart from the hand-off loop: with fewer pollers than
        // endpoints the rendezvous sends wait on resources coming back
        // through `completed`.
        let seeder = tokio::spawn(seed(
            self.endpoints,
            pending_tx.clone(),
            shutdown.subscribe(),
        ));
        let mut scheduler = BackoffScheduler::new(self.policy, pending_tx, shutdown.clone());

        let mut stop = shutdown.subscribe();
        loop {
            tokio::select! {
                _ = stop.recv() => {
                    tracing::info!("Shutdown requested, draining pipeline");
                    break;
                }
                received = completed_rx.recv_async() => match received {
                    Ok(resource) => {
                        scheduler.schedule(resource);
                    }
                    Err(_) => {
                        tracing::warn!("Every poller has stopped");
                        break;
                    }
                },
            }
        }

        // Stop everything else too if the pool died on its own.
        shutdown.trigger();
        drop(completed_rx);

        let mut failure: Option<JoinError> = None;

        match seeder.await {
            Ok(seeded) => tracing::debug!(seeded, "Seeder finished"),
            Err(e) => note_failure(&mut failure, "seeder", e),
        }

        while let Some(joined) = pollers.join_next().await {
            match joined {
                Ok(PollerExit::Shutdown) => {}
                Ok(PollerExit::Disconnected) => tracing::debug!("Poller exited on closed path"),
                Err(e) => note_failure(&mut failure, "poller", e),
            }
        }

        scheduler.drain().await;

        let table = monitor.await;
        tracing::info!("Polling pipeline stopped");

        if let Some(e) = failure {
            return Err(e.into());
        }
        Ok(table?.into_snapshot())
    }
}

fn note_failure(slot: &mut Option<JoinError>, task: &str, error: JoinError) {
    tracing::error!(task, error = %error, "Pipeline task failed");
    slot.get_or_insert(error);
}

/// Put one fresh resource per endpoint on the pending path.
async fn seed(
    endpoints: Vec<String>,
    pending: flume::Sender<Resource>,
    mut shutdown: ShutdownSignal,
) -> usize {
    let mut seeded = 0;
    for endpoint in endpoints {
        tokio::select! {
            _ = shutdown.recv() => break,
            sent = pending.send_async(Resource::new(endpoint)) => {
                if sent.is_err() {
                    break;
                }
                seeded += 1;
            }
        }
    }
    seeded
}
