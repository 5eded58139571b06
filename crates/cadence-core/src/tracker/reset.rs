//! Auto-reset scheduler.
//!
//! Like the rest of the tracker this is wall-clock based and has no internal
//! thread: deadlines are recorded here and the caller collects expired ones
//! with [`ResetScheduler::take_due`]. The runner sleeps until
//! [`ResetScheduler::next_deadline`] so resets fire on time without polling.
//!
//! Each arm hands out a token. A fired reset only takes effect if the goal
//! still holds the same token, which makes a stale fire (goal deleted or
//! re-armed in between) a no-op.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};

use crate::goal::GoalId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ArmedReset {
    deadline: DateTime<Utc>,
    token: u64,
}

/// An expired reset handed back by [`ResetScheduler::take_due`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DueReset {
    pub goal_id: GoalId,
    pub token: u64,
    pub deadline: DateTime<Utc>,
}

/// One-shot reset deadlines, at most one per goal.
#[derive(Debug, Default)]
pub struct ResetScheduler {
    armed: HashMap<GoalId, ArmedReset>,
    next_token: u64,
}

impl ResetScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule a reset for `goal_id` at `now + delay_minutes`.
    ///
    /// Returns the new token, or `None` if the goal already has a pending
    /// reset (arming is idempotent; the existing deadline is kept).
    pub fn arm(&mut self, goal_id: &GoalId, now: DateTime<Utc>, delay_minutes: u32) -> Option<u64> {
        if self.armed.contains_key(goal_id) {
            return None;
        }
        self.next_token += 1;
        let token = self.next_token;
        self.armed.insert(
            goal_id.clone(),
            ArmedReset {
                deadline: now + Duration::minutes(i64::from(delay_minutes)),
                token,
            },
        );
        Some(token)
    }

    /// Drop the pending reset for `goal_id`. Returns whether one existed.
    pub fn cancel(&mut self, goal_id: &GoalId) -> bool {
        self.armed.remove(goal_id).is_some()
    }

    pub fn is_armed(&self, goal_id: &GoalId) -> bool {
        self.armed.contains_key(goal_id)
    }

    pub fn deadline(&self, goal_id: &GoalId) -> Option<DateTime<Utc>> {
        self.armed.get(goal_id).map(|a| a.deadline)
    }

    /// Earliest pending deadline.
    pub fn next_deadline(&self) -> Option<DateTime<Utc>> {
        self.armed.values().map(|a| a.deadline).min()
    }

    /// Remove and return every reset whose deadline is at or before `now`,
    /// earliest first.
    pub fn take_due(&mut self, now: DateTime<Utc>) -> Vec<DueReset> {
        let due_ids: Vec<GoalId> = self
            .armed
            .iter()
            .filter(|(_, armed)| armed.deadline <= now)
            .map(|(id, _)| id.clone())
            .collect();

        let mut due: Vec<DueReset> = due_ids
            .into_iter()
            .filter_map(|goal_id| {
                let armed = self.armed.remove(&goal_id)?;
                Some(DueReset {
                    goal_id,
                    token: armed.token,
                    deadline: armed.deadline,
                })
            })
            .collect();
        due.sort_by(|a, b| a.deadline.cmp(&b.deadline).then_with(|| a.goal_id.cmp(&b.goal_id)));
        due
    }

    pub fn len(&self) -> usize {
        self.armed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.armed.is_empty()
    }
}
