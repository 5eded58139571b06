use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::goal::{Goal, GoalId};

/// What happened to a goal that the user should hear about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeKind {
    Created,
    Completed,
    Deleted,
    /// The goal's interval elapsed without a completion.
    Overdue,
}

impl NoticeKind {
    /// Whether this notice deserves an audible cue in addition to the text.
    pub fn wants_sound(self) -> bool {
        matches!(self, NoticeKind::Overdue)
    }
}

/// Every user-visible state change in the tracker produces a Notice.
/// Notices are handed to a [`Notifier`](crate::notify::Notifier) after all
/// locks are released.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub goal_id: GoalId,
    pub label: String,
    pub kind: NoticeKind,
    pub at: DateTime<Utc>,
}

impl Notice {
    pub fn for_goal(goal: &Goal, kind: NoticeKind, at: DateTime<Utc>) -> Self {
        Self {
            goal_id: goal.id.clone(),
            label: goal.label.clone(),
            kind,
            at,
        }
    }

    /// One-line message suitable for a toast or terminal line.
    pub fn message(&self) -> String {
        match self.kind {
            NoticeKind::Created => format!("New goal \"{}\" created", self.label),
            NoticeKind::Completed => format!("Nice work! \"{}\" marked done", self.label),
            NoticeKind::Deleted => format!("Goal \"{}\" deleted", self.label),
            NoticeKind::Overdue => format!("Reminder: \"{}\" is due", self.label),
        }
    }
}
