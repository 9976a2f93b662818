//! Backoff scheduler: delayed resubmission of completed resources.
//!
//! One lightweight task per resting resource, so a long backoff on one
//! endpoint never holds up another. Finished tasks are reaped on every
//! `schedule` call; `drain` waits for the rest at shutdown.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;
use tokio::time;

use crate::lifecycle::{Shutdown, ShutdownSignal};
use crate::observability::metrics;
use crate::polling::resource::Resource;
use crate::resilience::BackoffPolicy;

/// How a single resubmission task ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resubmission {
    /// Handed back to a poller.
    Resubmitted,
    /// Shutdown arrived while the resource was resting or queued.
    Cancelled,
    /// No poller is left to receive it.
    Disconnected,
}

pub struct BackoffScheduler {
    policy: BackoffPolicy,
    pending: flume::Sender<Resource>,
    shutdown: Shutdown,
    resting: JoinSet<Resubmission>,
    live: Arc<AtomicUsize>,
}

/// Counts one resting resource for as long as its task is alive.
struct RestingGuard(Arc<AtomicUsize>);

impl RestingGuard {
    fn new(live: Arc<AtomicUsize>) -> Self {
        let now = live.fetch_add(1, Ordering::Relaxed) + 1;
        metrics::record_resting_resources(now);
        Self(live)
    }
}

impl Drop for RestingGuard {
    fn drop(&mut self) {
        let now = self.0.fetch_sub(1, Ordering::Relaxed) - 1;
        metrics::record_resting_resources(now);
    }
}

impl BackoffScheduler {
    pub fn new(policy: BackoffPolicy, pending: flume::Sender<Resource>, shutdown: Shutdown) -> Self {
        Self {
            policy,
            pending,
            shutdown,
            resting: JoinSet::new(),
            live: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Start the wait-then-resubmit task for `resource`. Never blocks.
    pub fn schedule(&mut self, resource: Resource) -> Duration {
        self.reap();

        let delay = self.policy.delay_for(resource.consecutive_errors());
        tracing::debug!(
            endpoint = %resource.endpoint(),
            consecutive_errors = resource.consecutive_errors(),
            delay = ?delay,
            "Resource resting"
        );
        metrics::record_backoff_delay(delay);

        let pending = self.pending.clone();
        let shutdown = self.shutdown.subscribe();
        let guard = RestingGuard::new(self.live.clone());
        self.resting.spawn(async move {
            let _guard = guard;
            resubmit_after(delay, resource, pending, shutdown).await
        });
        delay
    }

    /// Number of resources currently resting or waiting to be resubmitted.
    pub fn resting(&self) -> usize {
        self.live.load(Ordering::Relaxed)
    }

    /// Forget tasks that have already finished.
    pub fn reap(&mut self) {
        while let Some(result) = self.resting.try_join_next() {
            log_join(result);
        }
    }

    /// Wait for every outstanding task. Call after triggering shutdown.
    pub async fn drain(mut self) {
        while let Some(result) = self.resting.join_next().await {
            log_join(result);
        }
    }
}

fn log_join(result: Result<Resubmission, tokio::task::JoinError>) {
    match result {
        Ok(Resubmission::Resubmitted) => {}
        Ok(other) => tracing::trace!(outcome = ?other, "Resubmission ended early"),
        Err(e) => tracing::error!(error = %e, "Resubmission task failed"),
    }
}

async fn resubmit_after(
    delay: Duration,
    resource: Resource,
    pending: flume::Sender<Resource>,
    mut shutdown: ShutdownSignal,
) -> Resubmission {
    tokio::select! {
        _ = shutdown.recv() => return Resubmission::Cancelled,
        _ = time::sleep(delay) => {}
    }

    tokio::select! {
        _ = shutdown.recv() => Resubmission::Cancelled,
        sent = pending.send_async(resource) => match sent {
            Ok(()) => Resubmission::Resubmitted,
            Err(_) => Resubmission::Disconnected,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Instant;

    fn policy() -> BackoffPolicy {
        BackoffPolicy::new(Duration::from_secs(60), Duration::from_secs(10), None)
    }

    fn failed(times: u32) -> Resource {
        let mut resource = Resource::new("http://a/");
        for _ in 0..times {
            resource.record_failure();
        }
        resource
    }

    #[tokio::test(start_paused = true)]
    async fn resubmits_after_linear_delay() {
        let shutdown = Shutdown::new();
        let (tx, rx) = flume::bounded(0);
        let mut scheduler = BackoffScheduler::new(policy(), tx, shutdown.clone());

        let start = Instant::now();
        assert_eq!(scheduler.schedule(failed(2)), Duration::from_secs(80));
        assert_eq!(scheduler.resting(), 1);

        let resource = rx.recv_async().await.unwrap();
        assert_eq!(resource.consecutive_errors(), 2);
        assert!(start.elapsed() >= Duration::from_secs(80));
        assert!(start.elapsed() < Duration::from_secs(81));

        scheduler.drain().await;
    }

    #[tokio::test(start_paused = true)]
    async fn slow_endpoint_does_not_block_fast_one() {
        let shutdown = Shutdown::new();
        let (tx, rx) = flume::bounded(0);
        let mut scheduler = BackoffScheduler::new(policy(), tx, shutdown.clone());

        let mut slow = Resource::new("http://slow/");
        for _ in 0..5 {
            slow.record_failure();
        }
        scheduler.schedule(slow);
        scheduler.schedule(Resource::new("http://fast/"));

        assert_eq!(rx.recv_async().await.unwrap().endpoint(), "http://fast/");
        assert_eq!(rx.recv_async().await.unwrap().endpoint(), "http://slow/");
        scheduler.drain().await;
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_cancels_resting_resources() {
        let shutdown = Shutdown::new();
        let (tx, _rx) = flume::bounded(0);
        let mut scheduler = BackoffScheduler::new(policy(), tx, shutdown.clone());

        scheduler.schedule(failed(0));
        scheduler.schedule(failed(3));
        shutdown.trigger();

        let start = Instant::now();
        scheduler.drain().await;
        assert!(start.elapsed() < Duration::from_secs(60));
    }

    #[tokio::test(start_paused = true)]
    async fn finished_tasks_are_reaped() {
        let shutdown = Shutdown::new();
        let (tx, rx) = flume::bounded(0);
        let mut scheduler = BackoffScheduler::new(policy(), tx, shutdown.clone());

        scheduler.schedule(failed(0));
        let resource = rx.recv_async().await.unwrap();
        time::sleep(Duration::from_millis(1)).await;

        scheduler.schedule(resource);
        assert_eq!(scheduler.resting(), 1);

        shutdown.trigger();
        scheduler.drain().await;
    }

    #[tokio::test(start_paused = true)]
    async fn resting_count_drops_without_another_schedule() {
        let shutdown = Shutdown::new();
        let (tx, rx) = flume::bounded(0);
        let mut scheduler = BackoffScheduler::new(policy(), tx, shutdown.clone());

        scheduler.schedule(failed(0));
        scheduler.schedule(failed(4));
        assert_eq!(scheduler.resting(), 2);

        let first = rx.recv_async().await.unwrap();
        assert_eq!(first.consecutive_errors(), 0);
        time::sleep(Duration::from_millis(1)).await;
        assert_eq!(scheduler.resting(), 1);

        shutdown.trigger();
        let live = scheduler.live.clone();
        scheduler.drain().await;
        assert_eq!(live.load(Ordering::Relaxed), 0);
    }
}
