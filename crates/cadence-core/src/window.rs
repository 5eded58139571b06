//! Completion window evaluation.
//!
//! Maps `(now, last completion, creation, interval)` to a [`WindowState`].
//! Everything here is a pure function of its arguments: callers pick `now`
//! once per scan pass and reuse it for every goal.
//!
//! ## Due-time policy
//!
//! A goal that has never been completed is anchored at its creation time, so
//! it first becomes due at `created_at + interval`. Creating a goal never
//! produces an instant reminder.
//!
//! ```text
//! Pending --(interval elapses)--> Overdue --(completion)--> Satisfied
//!                                    ^                          |
//!                                    +---(interval elapses)-----+
//! ```

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Where a goal stands relative to its completion window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowState {
    /// Never completed and the first interval has not elapsed yet.
    Pending,
    /// Completed within the current interval.
    Satisfied,
    /// The interval elapsed without a completion.
    Overdue,
}

impl WindowState {
    /// Whether a completion would be accepted in this state.
    pub fn accepts_completion(self) -> bool {
        !matches!(self, WindowState::Satisfied)
    }
}

/// Classify a goal's window at `now`.
pub fn evaluate(
    now: DateTime<Utc>,
    last_completed_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    interval_minutes: u32,
) -> WindowState {
    let anchor = last_completed_at.unwrap_or(created_at);
    if now - anchor < interval(interval_minutes) {
        if last_completed_at.is_some() {
            WindowState::Satisfied
        } else {
            WindowState::Pending
        }
    } else {
        WindowState::Overdue
    }
}

/// The instant the current window closes.
pub fn due_at(
    last_completed_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    interval_minutes: u32,
) -> DateTime<Utc> {
    last_completed_at.unwrap_or(created_at) + interval(interval_minutes)
}

/// Whole minutes left until the goal is due, rounded up. Returns 0 once due.
pub fn minutes_remaining(
    now: DateTime<Utc>,
    last_completed_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    interval_minutes: u32,
) -> u64 {
    let remaining = due_at(last_completed_at, created_at, interval_minutes) - now;
    let ms = remaining.num_milliseconds();
    if ms <= 0 {
        return 0;
    }
    (ms as u64).div_ceil(60_000)
}

fn interval(interval_minutes: u32) -> Duration {
    Duration::minutes(i64::from(interval_minutes))
}
