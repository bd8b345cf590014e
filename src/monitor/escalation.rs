//! Failure escalation timing
//!
//! An [`EscalationTimer`] is created when a failure is first observed and
//! decides, on every poll while the failure persists, whether another
//! notification is due. Delays come from a [`BackoffSchedule`] and are
//! measured from the previous send; the last delay repeats forever.

use std::time::Duration;

use chrono::{DateTime, Utc};

/// Longest accepted delay (100 years); anything longer could never be reached
pub const MAX_DELAY: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

/// Ordered, non-empty list of delays between notifications
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackoffSchedule {
    delays: Vec<chrono::Duration>,
}

impl BackoffSchedule {
    /// Build a schedule, rejecting empty lists and delays longer than [`MAX_DELAY`]
    pub fn new(delays: Vec<Duration>) -> Result<Self, ScheduleError> {
        if delays.is_empty() {
            return Err(ScheduleError::Empty);
        }

        let delays = delays
            .into_iter()
            .enumerate()
            .map(|(index, delay)| {
                if delay > MAX_DELAY {
                    return Err(ScheduleError::OutOfRange { index, delay });
                }
                chrono::Duration::from_std(delay)
                    .map_err(|_| ScheduleError::OutOfRange { index, delay })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { delays })
    }

    /// Build a schedule from whole seconds
    pub fn from_secs(secs: &[u64]) -> Result<Self, ScheduleError> {
        Self::new(secs.iter().map(|s| Duration::from_secs(*s)).collect())
    }

    /// Number of distinct stages
    pub fn stage_count(&self) -> usize {
        self.delays.len()
    }

    /// Delay for a stage. Stages past the end reuse the final delay.
    pub fn delay(&self, stage: usize) -> chrono::Duration {
        let last = self.delays.len() - 1;
        self.delays[stage.min(last)]
    }

    /// Index of the final, repeating stage
    pub fn last_stage(&self) -> usize {
        self.delays.len() - 1
    }
}

/// Tracks how long a failure has persisted since the last notification
#[derive(Debug, Clone)]
pub struct EscalationTimer {
    schedule: BackoffSchedule,
    /// Failure onset, then the time of the most recent send
    anchor: DateTime<Utc>,
    /// Current position in the schedule, clamped at the last stage
    stage: usize,
}

impl EscalationTimer {
    /// Start a timer anchored at the failure onset
    pub fn new(schedule: BackoffSchedule, now: DateTime<Utc>) -> Self {
        Self {
            schedule,
            anchor: now,
            stage: 0,
        }
    }

    /// Returns true when a notification is due at `now`.
    ///
    /// A true result advances the schedule by one stage (unless already at
    /// the last) and re-anchors at `now`, so the next send is measured from
    /// this one.
    pub fn should_send(&mut self, now: DateTime<Utc>) -> bool {
        let threshold = match self
            .anchor
            .checked_add_signed(self.schedule.delay(self.stage))
        {
            Some(t) => t,
            // Unreachable threshold
            None => return false,
        };

        if now < threshold {
            return false;
        }

        if self.stage < self.schedule.last_stage() {
            self.stage += 1;
        }
        self.anchor = now;
        true
    }

    /// Time the current delay is measured from
    pub fn anchor(&self) -> DateTime<Utc> {
        self.anchor
    }

    /// Get the current schedule stage
    pub fn stage(&self) -> usize {
        self.stage
    }

    /// Delay that must elapse after the anchor before the next send
    pub fn current_delay(&self) -> chrono::Duration {
        self.schedule.delay(self.stage)
    }

    /// Earliest time the next notification can be sent
    pub fn next_due(&self) -> Option<DateTime<Utc>> {
        self.anchor.checked_add_signed(self.current_delay())
    }
}

/// Backoff schedule construction errors
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("Backoff schedule must contain at least one delay")]
    Empty,

    #[error("Backoff delay {index} ({delay:?}) is out of range")]
    OutOfRange { index: usize, delay: Duration },
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    fn secs(n: i64) -> chrono::Duration {
        chrono::Duration::seconds(n)
    }

    #[test]
    fn test_empty_schedule_rejected() {
        assert_eq!(BackoffSchedule::new(vec![]), Err(ScheduleError::Empty));
        assert_eq!(BackoffSchedule::from_secs(&[]), Err(ScheduleError::Empty));
    }

    #[test]
    fn test_out_of_range_delay_rejected() {
        let err = BackoffSchedule::new(vec![Duration::from_secs(1), Duration::MAX]).unwrap_err();
        assert!(matches!(err, ScheduleError::OutOfRange { index: 1, .. }));
    }

    #[test]
    fn test_delay_beyond_max_rejected() {
        let err = BackoffSchedule::from_secs(&[10, 9_000_000_000_000]).unwrap_err();
        assert!(matches!(err, ScheduleError::OutOfRange { index: 1, .. }));

        let err = BackoffSchedule::new(vec![MAX_DELAY + Duration::from_secs(1)]).unwrap_err();
        assert!(matches!(err, ScheduleError::OutOfRange { index: 0, .. }));
    }

    #[test]
    fn test_max_delay_is_reachable() {
        let schedule = BackoffSchedule::new(vec![MAX_DELAY]).unwrap();
        let mut timer = EscalationTimer::new(schedule, t0());

        let due = timer.next_due().unwrap();
        assert!(!timer.should_send(due - secs(1)));
        assert!(timer.should_send(due));
    }

    #[test]
    fn test_schedule_clamps_to_last_delay() {
        let schedule = BackoffSchedule::from_secs(&[5, 10, 20]).unwrap();
        assert_eq!(schedule.stage_count(), 3);
        assert_eq!(schedule.delay(0), secs(5));
        assert_eq!(schedule.delay(2), secs(20));
        assert_eq!(schedule.delay(3), secs(20));
        assert_eq!(schedule.delay(100), secs(20));
    }

    #[test]
    fn test_not_due_before_first_delay() {
        let schedule = BackoffSchedule::from_secs(&[6 * 3600, 12 * 3600]).unwrap();
        let mut timer = EscalationTimer::new(schedule, t0());

        let just_before = t0() + secs(6 * 3600) - chrono::Duration::milliseconds(1);
        assert!(!timer.should_send(just_before));
        assert_eq!(timer.anchor(), t0());
        assert_eq!(timer.stage(), 0);

        assert!(timer.should_send(t0() + secs(6 * 3600)));
    }

    #[test]
    fn test_true_advances_one_stage_and_reanchors() {
        let schedule = BackoffSchedule::from_secs(&[10, 20, 40]).unwrap();
        let mut timer = EscalationTimer::new(schedule, t0());

        let sent_at = t0() + secs(11);
        assert!(timer.should_send(sent_at));
        assert_eq!(timer.stage(), 1);
        assert_eq!(timer.anchor(), sent_at);
        assert_eq!(timer.current_delay(), secs(20));
        assert_eq!(timer.next_due(), Some(sent_at + secs(20)));
    }

    #[test]
    fn test_same_instant_does_not_double_send() {
        let schedule = BackoffSchedule::from_secs(&[10, 20]).unwrap();
        let mut timer = EscalationTimer::new(schedule, t0());

        let now = t0() + secs(10);
        assert!(timer.should_send(now));
        assert!(!timer.should_send(now));
        assert_eq!(timer.stage(), 1);
    }

    #[test]
    fn test_single_delay_repeats_forever() {
        let schedule = BackoffSchedule::from_secs(&[30]).unwrap();
        let mut timer = EscalationTimer::new(schedule, t0());

        for n in 1..=10 {
            let now = t0() + secs(30 * n);
            assert!(!timer.should_send(now - secs(1)));
            assert!(timer.should_send(now));
            assert_eq!(timer.stage(), 0);
            assert_eq!(timer.anchor(), now);
        }
    }

    #[test]
    fn test_ten_then_twenty_scenario() {
        let schedule = BackoffSchedule::from_secs(&[10, 20]).unwrap();
        let mut timer = EscalationTimer::new(schedule, t0());

        assert!(!timer.should_send(t0() + secs(9)));

        assert!(timer.should_send(t0() + secs(10)));
        assert_eq!(timer.anchor(), t0() + secs(10));
        assert_eq!(timer.current_delay(), secs(20));

        assert!(!timer.should_send(t0() + secs(29)));

        assert!(timer.should_send(t0() + secs(30)));
        assert_eq!(timer.anchor(), t0() + secs(30));
        assert_eq!(timer.current_delay(), secs(20));

        assert!(timer.should_send(t0() + secs(50)));
    }

    #[test]
    fn test_delays_measured_from_previous_send() {
        let hour = 3600;
        let schedule = BackoffSchedule::from_secs(&[6 * hour, 12 * hour, 24 * hour]).unwrap();
        let mut timer = EscalationTimer::new(schedule, t0());

        // A late poll shifts every later send
        let first = t0() + secs(7 * hour as i64);
        assert!(timer.should_send(first));
        assert!(!timer.should_send(first + secs(12 * hour as i64 - 1)));
        let second = first + secs(12 * hour as i64);
        assert!(timer.should_send(second));
        let third = second + secs(24 * hour as i64);
        assert!(timer.should_send(third));
        assert!(timer.should_send(third + secs(24 * hour as i64)));
        assert_eq!(timer.stage(), 2);
    }

    #[test]
    fn test_zero_delay_fires_every_poll() {
        let schedule = BackoffSchedule::from_secs(&[0]).unwrap();
        let mut timer = EscalationTimer::new(schedule, t0());
        assert!(timer.should_send(t0()));
        assert!(timer.should_send(t0()));
    }

    #[test]
    fn test_earlier_timestamp_is_not_due() {
        let schedule = BackoffSchedule::from_secs(&[10]).unwrap();
        let mut timer = EscalationTimer::new(schedule, t0());
        assert!(!timer.should_send(t0() - secs(60)));
    }
}
