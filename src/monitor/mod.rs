//! Liveness monitoring
//!
//! Polls a probe, tracks up/down transitions and escalates alerts with a
//! backoff schedule while the target stays down.

pub mod checker;
pub mod escalation;
pub mod state;

pub use checker::{Monitor, MonitorError};
pub use escalation::{BackoffSchedule, EscalationTimer, ScheduleError};
pub use state::{Decision, MonitorState, ProbeResult, Status};
