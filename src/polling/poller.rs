//! Poller workers.
//!
//! # Responsibilities
//! - Take one `Resource` at a time from the pending path
//! - Probe it, report a `StatusEvent`, hand the resource to the completed path
//!
//! # Design Decisions
//! - Probe failures never leave the loop; only shutdown or a closed path does
//! - Every wait races the shutdown signal
//! - A resource held when shutdown arrives is dropped with the poller

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::lifecycle::ShutdownSignal;
use crate::monitor::StatusEvent;
use crate::polling::resource::Resource;
use crate::probe::Probe;

/// Why a poller stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollerExit {
    Shutdown,
    /// A peer path (pending, status, or completed) closed underneath it.
    Disconnected,
}

pub struct Poller {
    id: usize,
    probe: Arc<dyn Probe>,
    pending: flume::Receiver<Resource>,
    completed: flume::Sender<Resource>,
    status: mpsc::Sender<StatusEvent>,
    shutdown: ShutdownSignal,
}

impl Poller {
    pub fn new(
        id: usize,
        probe: Arc<dyn Probe>,
        pending: flume::Receiver<Resource>,
        completed: flume::Sender<Resource>,
        status: mpsc::Sender<StatusEvent>,
        shutdown: ShutdownSignal,
    ) -> Self {
        Self {
            id,
            probe,
            pending,
            completed,
            status,
            shutdown,
        }
    }

    pub async fn run(mut self) -> PollerExit {
        tracing::debug!(poller = self.id, "Poller starting");
        let exit = self.work().await;
        tracing::debug!(poller = self.id, reason = ?exit, "Poller stopped");
        exit
    }

    async fn work(&mut self) -> PollerExit {
        loop {
            let mut resource = tokio::select! {
                _ = self.shutdown.recv() => return PollerExit::Shutdown,
                received = self.pending.recv_async() => match received {
                    Ok(resource) => resource,
                    Err(_) => return PollerExit::Disconnected,
                },
            };

            let event = tokio::select! {
                _ = self.shutdown.recv() => return PollerExit::Shutdown,
                event = resource.poll(self.probe.as_ref()) => event,
            };

            tracing::trace!(
                poller = self.id,
                endpoint = %event.endpoint,
                status = %event.status_text,
                "Probe complete"
            );

            tokio::select! {
                _ = self.shutdown.recv() => return PollerExit::Shutdown,
                sent = self.status.send(event) => if sent.is_err() {
                    return PollerExit::Disconnected;
                },
            }

            tokio::select! {
                _ = self.shutdown.recv() => return PollerExit::Shutdown,
                sent = self.completed.send_async(resource) => if sent.is_err() {
                    return PollerExit::Disconnected;
                },
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::Shutdown;
    use crate::probe::{ProbeError, ProbeOutcome};
    use async_trait::async_trait;
    use std::time::Duration;

    #[derive(Debug)]
    struct FailsOn(&'static str);

    #[async_trait]
    impl Probe for FailsOn {
        async fn probe(&self, endpoint: &str) -> Result<ProbeOutcome, ProbeError> {
            if endpoint == self.0 {
                Err(ProbeError::Connect("connection refused".into()))
            } else {
                Ok(ProbeOutcome::success("200 OK"))
            }
        }
    }

    #[derive(Debug)]
    struct Hangs;

    #[async_trait]
    impl Probe for Hangs {
        async fn probe(&self, _endpoint: &str) -> Result<ProbeOutcome, ProbeError> {
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn reports_then_hands_back() {
        let shutdown = Shutdown::new();
        let (pending_tx, pending_rx) = flume::bounded(0);
        let (completed_tx, completed_rx) = flume::bounded(0);
        let (status_tx, mut status_rx) = mpsc::channel(1);

        let poller = Poller::new(
            0,
            Arc::new(FailsOn("http://down/")),
            pending_rx,
            completed_tx,
            status_tx,
            shutdown.subscribe(),
        );
        let handle = tokio::spawn(poller.run());

        pending_tx.send_async(Resource::new("http://down/")).await.unwrap();
        let event = status_rx.recv().await.unwrap();
        assert_eq!(event, StatusEvent::new("http://down/", "connection failed: connection refused"));
        let resource = completed_rx.recv_async().await.unwrap();
        assert_eq!(resource.consecutive_errors(), 1);

        // The same resource goes round again and keeps its streak.
        pending_tx.send_async(resource).await.unwrap();
        status_rx.recv().await.unwrap();
        let resource = completed_rx.recv_async().await.unwrap();
        assert_eq!(resource.consecutive_errors(), 2);

        pending_tx.send_async(Resource::new("http://up/")).await.unwrap();
        assert_eq!(status_rx.recv().await.unwrap().status_text, "200 OK");
        assert_eq!(completed_rx.recv_async().await.unwrap().consecutive_errors(), 0);

        shutdown.trigger();
        assert_eq!(handle.await.unwrap(), PollerExit::Shutdown);
    }

    #[tokio::test]
    async fn shutdown_interrupts_probe() {
        let shutdown = Shutdown::new();
        let (pending_tx, pending_rx) = flume::bounded(0);
        let (completed_tx, _completed_rx) = flume::bounded(0);
        let (status_tx, _status_rx) = mpsc::channel(1);

        let handle = tokio::spawn(
            Poller::new(0, Arc::new(Hangs), pending_rx, completed_tx, status_tx, shutdown.subscribe())
                .run(),
        );
        pending_tx.send_async(Resource::new("http://slow/")).await.unwrap();
        shutdown.trigger();

        let exit = tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("poller should stop promptly")
            .unwrap();
        assert_eq!(exit, PollerExit::Shutdown);
    }

    #[tokio::test]
    async fn closed_pending_path_stops_poller() {
        let shutdown = Shutdown::new();
        let (pending_tx, pending_rx) = flume::bounded::<Resource>(0);
        let (completed_tx, _completed_rx) = flume::bounded(0);
        let (status_tx, _status_rx) = mpsc::channel(1);
        drop(pending_tx);

        let exit = Poller::new(
            0,
            Arc::new(Hangs),
            pending_rx,
            completed_tx,
            status_tx,
            shutdown.subscribe(),
        )
        .run()
        .await;
        assert_eq!(exit, PollerExit::Disconnected);
    }
}
