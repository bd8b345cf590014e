//! Monitoring loop
//!
//! Polls the probe at a fixed interval, tracks whether the target is up or
//! down, and asks the escalation timer whether an alert is due while it is
//! down. The loop owns all of its state; nothing is shared.

use std::future::Future;

use chrono::{DateTime, Utc};

use super::escalation::EscalationTimer;
use super::state::{Decision, MonitorState, ProbeResult, Status};
use crate::config::MonitorConfig;
use crate::notify::{MessageKind, Notifier, NotifierError};
use crate::probe::Probe;

/// Drives the poll, evaluate, notify, sleep cycle
pub struct Monitor<P, N> {
    config: MonitorConfig,
    probe: P,
    notifier: N,
    state: MonitorState,
}

impl<P: Probe, N: Notifier> Monitor<P, N> {
    /// Create a new monitor; status starts as unknown
    pub fn new(config: MonitorConfig, probe: P, notifier: N) -> Self {
        Self {
            config,
            probe,
            notifier,
            state: MonitorState::new(Utc::now()),
        }
    }

    /// Get the loop's current state
    pub fn state(&self) -> &MonitorState {
        &self.state
    }

    /// Get the last known status
    pub fn status(&self) -> Status {
        self.state.status
    }

    /// Run until `shutdown` resolves.
    ///
    /// In test mode a single test notification is sent and the probe is
    /// never run.
    pub async fn run<F>(mut self, shutdown: F) -> Result<(), MonitorError>
    where
        F: Future<Output = ()>,
    {
        let started_at = self.state.started_at;
        tracing::info!(started_at = %started_at, "Starting");

        if self.config.send_test_and_exit {
            tracing::info!("Running send_test_email_and_exit");
            self.notifier.notify(Utc::now(), MessageKind::Test).await?;
            return Ok(());
        }

        tracing::info!(
            command = %self.config.command,
            poll_interval = ?self.config.poll_interval,
            probe_timeout = ?self.config.probe_timeout,
            "Monitoring"
        );

        tokio::pin!(shutdown);
        loop {
            self.poll().await;

            tokio::select! {
                _ = tokio::time::sleep(self.config.poll_interval) => {}
                _ = &mut shutdown => {
                    tracing::info!("Monitor shutting down");
                    break;
                }
            }
        }

        Ok(())
    }

    /// Run the probe once and act on the result
    pub async fn poll(&mut self) -> Decision {
        let outcome = self
            .probe
            .run(&self.config.command, self.config.probe_timeout)
            .await;
        let result = ProbeResult::from_outcome(&outcome, Utc::now());
        self.handle(result).await
    }

    /// Apply a probe result and send an alert if one is due
    pub async fn handle(&mut self, result: ProbeResult) -> Decision {
        let now = result.observed_at;
        let decision = self.observe(&result);

        if decision == Decision::Notify {
            tracing::warn!(at = %now, "Sending email");
            if let Err(e) = self.notifier.notify(now, MessageKind::Alert).await {
                tracing::error!(error = %e, "Failed to send notification");
            }
        }

        decision
    }

    /// State transition for one probe result, without side effects beyond
    /// logging
    pub fn observe(&mut self, result: &ProbeResult) -> Decision {
        let now = result.observed_at;

        if result.success {
            if self.state.status != Status::Up {
                tracing::info!(at = %now, previous = %self.state.status, "Probe success");
            }
            self.state.status = Status::Up;
            self.state.last_success = Some(now);
            self.state.timer = None;
            return Decision::Idle;
        }

        if self.state.status != Status::Down {
            tracing::warn!(
                at = %now,
                previous = %self.state.status,
                reason = result.detail.as_deref().unwrap_or("unknown"),
                "Now failing"
            );
            self.state.status = Status::Down;
        }

        let schedule = &self.config.schedule;
        let timer = self
            .state
            .timer
            .get_or_insert_with(|| EscalationTimer::new(schedule.clone(), now));

        if timer.should_send(now) {
            Decision::Notify
        } else {
            Decision::Idle
        }
    }

    /// Time the current outage's escalation timer is anchored at
    pub fn escalation_anchor(&self) -> Option<DateTime<Utc>> {
        self.state.timer.as_ref().map(|t| t.anchor())
    }
}

/// Monitor errors
#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    #[error("Notification failed: {0}")]
    Notify(#[from] NotifierError),
}
