//! Time sources for the tracker.
//!
//! The tracker never reads the system clock on its own: every evaluation
//! takes an explicit `now`. Hosts pass [`SystemClock`]; tests use
//! [`ManualClock`] and move time by hand.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Utc};

/// Source of "now".
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Manually advanced clock. Clones share the same instant.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    pub fn set(&self, at: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner) = at;
    }

    pub fn advance(&self, by: Duration) -> DateTime<Utc> {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now += by;
        *now
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Fixed evaluation cadence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntervalClock {
    period: StdDuration,
}

impl IntervalClock {
    pub const DEFAULT_PERIOD: StdDuration = StdDuration::from_secs(60);

    /// A zero period is bumped to one second.
    pub fn new(period: StdDuration) -> Self {
        Self {
            period: period.max(StdDuration::from_secs(1)),
        }
    }

    pub fn from_secs(secs: u64) -> Self {
        Self::new(StdDuration::from_secs(secs))
    }

    pub fn period(&self) -> StdDuration {
        self.period
    }

    /// Tokio interval for this cadence. Missed ticks are skipped rather than
    /// replayed in a burst.
    pub fn ticker(&self) -> tokio::time::Interval {
        let mut interval = tokio::time::interval(self.period);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        interval
    }
}

impl Default for IntervalClock {
    fn default() -> Self {
        Self::new(Self::DEFAULT_PERIOD)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn manual_clock_clones_share_time() {
        let start = Utc.with_ymd_and_hms(2025, 3, 1, 8, 0, 0).unwrap();
        let clock = ManualClock::new(start);
        let other = clock.clone();

        clock.advance(Duration::minutes(31));
        assert_eq!(other.now(), start + Duration::minutes(31));

        other.set(start);
        assert_eq!(clock.now(), start);
    }

    #[test]
    fn interval_clock_has_floor() {
        assert_eq!(IntervalClock::from_secs(0).period(), StdDuration::from_secs(1));
        assert_eq!(IntervalClock::default().period(), StdDuration::from_secs(60));
    }
}
