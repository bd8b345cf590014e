//! Monitor status and per-poll bookkeeping

use std::fmt;

use chrono::{DateTime, Utc};

use super::escalation::EscalationTimer;
use crate::probe::ProbeOutcome;

/// Last known status of the monitored target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Status {
    /// No probe has completed yet
    #[default]
    Unknown,
    Up,
    Down,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Unknown => write!(f, "unknown"),
            Status::Up => write!(f, "up"),
            Status::Down => write!(f, "down"),
        }
    }
}

/// Result of a single poll, stamped with the time it was observed
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeResult {
    pub success: bool,
    pub observed_at: DateTime<Utc>,
    /// Human-readable reason for a failed probe
    pub detail: Option<String>,
}

impl ProbeResult {
    /// Create a successful result
    pub fn success(observed_at: DateTime<Utc>) -> Self {
        Self {
            success: true,
            observed_at,
            detail: None,
        }
    }

    /// Create a failed result with a reason
    pub fn failure(observed_at: DateTime<Utc>, detail: impl Into<String>) -> Self {
        Self {
            success: false,
            observed_at,
            detail: Some(detail.into()),
        }
    }

    /// Map a probe outcome; anything but a clean zero exit is a failure
    pub fn from_outcome(outcome: &ProbeOutcome, observed_at: DateTime<Utc>) -> Self {
        if outcome.is_success() {
            Self::success(observed_at)
        } else {
            Self::failure(observed_at, outcome.to_string())
        }
    }
}

/// What the monitor decided to do after a poll
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Nothing to send
    Idle,
    /// An alert is due
    Notify,
}

/// State owned by the monitoring loop
#[derive(Debug, Clone)]
pub struct MonitorState {
    pub status: Status,
    /// Present only while the target is down
    pub timer: Option<EscalationTimer>,
    /// Time of the most recent successful probe
    pub last_success: Option<DateTime<Utc>>,
    pub started_at: DateTime<Utc>,
}

impl MonitorState {
    /// Create the initial state for a loop started at `started_at`
    pub fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            status: Status::Unknown,
            timer: None,
            last_success: None,
            started_at,
        }
    }

    /// Check if the target is currently down
    pub fn is_down(&self) -> bool {
        self.status == Status::Down
    }
}
