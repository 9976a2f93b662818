//! Status events, the status table, and snapshots.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

/// Result of one probe, sent from a poller to the state monitor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusEvent {
    pub endpoint: String,
    pub status_text: String,
}

impl StatusEvent {
    pub fn new(endpoint: impl Into<String>, status_text: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            status_text: status_text.into(),
        }
    }
}

/// Last-known status per endpoint. Owned by exactly one monitor task.
#[derive(Debug, Default)]
pub struct StatusTable {
    entries: BTreeMap<String, String>,
}

impl StatusTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an event, returning the status it replaced.
    pub fn apply(&mut self, event: StatusEvent) -> Option<String> {
        self.entries.insert(event.endpoint, event.status_text)
    }

    pub fn get(&self, endpoint: &str) -> Option<&str> {
        self.entries.get(endpoint).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            entries: self.entries.clone(),
        }
    }

    pub fn into_snapshot(self) -> Snapshot {
        Snapshot {
            entries: self.entries,
        }
    }
}

/// Point-in-time copy of the status table, ordered by endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Snapshot {
    entries: BTreeMap<String, String>,
}

impl Snapshot {
    pub fn get(&self, endpoint: &str) -> Option<&str> {
        self.entries.get(endpoint).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Emit the snapshot to the log, one event per endpoint.
    pub fn log(&self) {
        tracing::info!(endpoints = self.len(), "Current state:");
        for (endpoint, status) in self.iter() {
            tracing::info!(endpoint, status, "  endpoint status");
        }
    }
}

impl fmt::Display for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Current state:")?;
        for (endpoint, status) in self.iter() {
            writeln!(f, " {endpoint} {status}")?;
        }
        Ok(())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Snapshot {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}
