//! Per-goal runtime state and reminder deduplication.
//!
//! The `reminded` flag is edge-triggered: it flips to true the first time a
//! goal is observed overdue, and stays true until a completion (or the goal
//! leaving the overdue window) clears it. A reminder therefore fires once per
//! overdue period, never once per tick.

use serde::{Deserialize, Serialize};

use crate::stats::GoalStats;
use crate::window::WindowState;

/// Outcome of feeding a window observation through the deduplicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReminderDecision {
    /// First overdue observation in this period: deliver a reminder.
    Fire,
    /// Overdue, but the reminder for this period already went out.
    Suppressed,
    /// Not overdue; nothing to remind about.
    NotDue,
}

/// Runtime state the tracker keeps for each live goal. Never persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoalRuntimeState {
    /// True iff a reminder already fired for the current overdue period.
    pub reminded: bool,
    pub stats: GoalStats,
    /// True while an auto-reset deadline is pending for this goal.
    pub reset_timer_armed: bool,
}

impl GoalRuntimeState {
    /// Apply a window observation.
    ///
    /// The flag is set and the miss counted before the caller attempts any
    /// delivery, so a failing notifier can never cause a second reminder.
    pub fn observe(&mut self, state: WindowState) -> ReminderDecision {
        match state {
            WindowState::Overdue if self.reminded => ReminderDecision::Suppressed,
            WindowState::Overdue => {
                self.reminded = true;
                self.stats.record_miss();
                ReminderDecision::Fire
            }
            WindowState::Pending | WindowState::Satisfied => {
                self.reminded = false;
                ReminderDecision::NotDue
            }
        }
    }

    /// Record an accepted completion. Re-arms overdue detection.
    pub fn accept_completion(&mut self) {
        self.stats.record_completion();
        self.reminded = false;
    }
}
