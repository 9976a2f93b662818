//! The unit of polling work.

use crate::monitor::StatusEvent;
use crate::observability::metrics;
use crate::probe::Probe;

/// An endpoint plus its current error streak.
///
/// Deliberately not `Clone`: a `Resource` moves between the pending path, a
/// poller, and the scheduler, so whoever holds it is its only reader and
/// writer.
#[derive(Debug, PartialEq, Eq)]
pub struct Resource {
    endpoint: String,
    consecutive_errors: u32,
}

impl Resource {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            consecutive_errors: 0,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn consecutive_errors(&self) -> u32 {
        self.consecutive_errors
    }

    pub fn record_success(&mut self) {
        self.consecutive_errors = 0;
    }

    pub fn record_failure(&mut self) {
        self.consecutive_errors = self.consecutive_errors.saturating_add(1);
    }

    /// Probe the endpoint once and update the error streak.
    ///
    /// Never fails: transport errors become the event's status text.
    pub async fn poll(&mut self, probe: &dyn Probe) -> StatusEvent {
        let status_text = match probe.probe(&self.endpoint).await {
            Ok(outcome) if outcome.success => {
                self.record_success();
                outcome.status_text
            }
            Ok(outcome) => {
                self.record_failure();
                tracing::warn!(
                    endpoint = %self.endpoint,
                    status = %outcome.status_text,
                    consecutive_errors = self.consecutive_errors,
                    "Probe reported unhealthy endpoint"
                );
                outcome.status_text
            }
            Err(e) => {
                self.record_failure();
                tracing::warn!(
                    endpoint = %self.endpoint,
                    error = %e,
                    consecutive_errors = self.consecutive_errors,
                    "Probe failed"
                );
                e.to_string()
            }
        };

        metrics::record_probe(&self.endpoint, self.consecutive_errors == 0);
        metrics::record_consecutive_errors(&self.endpoint, self.consecutive_errors);

        StatusEvent::new(self.endpoint.clone(), status_text)
    }
}
