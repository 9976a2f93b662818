//! Linear backoff for resubmitting polled endpoints.

use std::time::Duration;

use crate::config::PollingConfig;

/// `base + error_timeout × consecutive_errors`, optionally capped.
///
/// Growth is unbounded when no cap is configured; the counter only grows
/// while probes keep failing and resets on the next success.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    base: Duration,
    error_timeout: Duration,
    max: Option<Duration>,
}

impl BackoffPolicy {
    pub fn new(base: Duration, error_timeout: Duration, max: Option<Duration>) -> Self {
        Self {
            base,
            error_timeout,
            max,
        }
    }

    pub fn from_config(config: &PollingConfig) -> Self {
        Self::new(
            config.poll_interval(),
            config.error_timeout(),
            config.max_backoff(),
        )
    }

    /// Delay before a resource with `consecutive_errors` is probed again.
    pub fn delay_for(&self, consecutive_errors: u32) -> Duration {
        let delay = self
            .base
            .saturating_add(self.error_timeout.saturating_mul(consecutive_errors));
        match self.max {
            Some(max) => delay.min(max),
            None => delay,
        }
    }

    pub fn base(&self) -> Duration {
        self.base
    }
}
