//! Bounded in-memory log of detected malicious or anomalous input.
//!
//! One recorder is created at startup and handed to everything that can
//! detect an incident (validator, rate limiters, analytics intake). The
//! buffer keeps the most recent entries only; the oldest are evicted once
//! capacity is reached.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

pub const DEFAULT_CAPACITY: usize = 1000;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum IncidentKind {
    XssAttempt,
    InvalidColor,
    RateLimitExceeded,
    MaliciousAnalyticsData,
}

impl IncidentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            IncidentKind::XssAttempt => "xss_attempt",
            IncidentKind::InvalidColor => "invalid_color",
            IncidentKind::RateLimitExceeded => "rate_limit_exceeded",
            IncidentKind::MaliciousAnalyticsData => "malicious_analytics_data",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Incident {
    pub at: DateTime<Utc>,
    pub kind: IncidentKind,
    pub detail: String,
}

#[derive(Debug)]
pub struct IncidentRecorder {
    capacity: usize,
    entries: Mutex<VecDeque<Incident>>,
}

impl IncidentRecorder {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: Mutex::new(VecDeque::new()),
        }
    }

    pub fn record(&self, kind: IncidentKind, detail: impl Into<String>) {
        let incident = Incident {
            at: Utc::now(),
            kind,
            detail: detail.into(),
        };
        tracing::warn!(kind = kind.as_str(), detail = %incident.detail, "security incident");

        let mut entries = self.entries.lock().expect("incident log poisoned");
        if entries.len() == self.capacity {
            entries.pop_front();
        }
        entries.push_back(incident);
    }

    pub fn total(&self) -> usize {
        self.entries.lock().expect("incident log poisoned").len()
    }

    /// Count of incidents recorded within the last `window`.
    pub fn count_since(&self, window: Duration) -> usize {
        let cutoff = Utc::now() - window;
        self.entries
            .lock()
            .expect("incident log poisoned")
            .iter()
            .filter(|i| i.at > cutoff)
            .count()
    }

    /// Per-kind counts of incidents recorded within the last `window`.
    pub fn counts_by_kind_since(&self, window: Duration) -> HashMap<&'static str, usize> {
        let cutoff = Utc::now() - window;
        let mut counts = HashMap::new();
        for incident in self
            .entries
            .lock()
            .expect("incident log poisoned")
            .iter()
            .filter(|i| i.at > cutoff)
        {
            *counts.entry(incident.kind.as_str()).or_insert(0) += 1;
        }
        counts
    }

    pub fn snapshot(&self) -> Vec<Incident> {
        self.entries
            .lock()
            .expect("incident log poisoned")
            .iter()
            .cloned()
            .collect()
    }
}

impl Default for IncidentRecorder {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
