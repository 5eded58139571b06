//! Goal data model.
//!
//! A [`Goal`] is owned by the goal store: its id, streak and completion
//! timestamp are whatever the store last reported. The tracker only reads
//! these values and layers its own runtime state on top.

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::window::{self, WindowState};

/// Opaque goal identifier assigned by the goal store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GoalId(String);

impl GoalId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GoalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for GoalId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for GoalId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Identifies the user a goal belongs to. Goals are partitioned per owner.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerId(String);

impl OwnerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for OwnerId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Kind of habit a goal tracks.
///
/// The built-in kinds are closed; anything else goes through `Custom`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalType {
    MoodCheckin,
    Hydration,
    JournalStreak,
    Custom(String),
}

const CUSTOM_PREFIX: &str = "custom:";

impl GoalType {
    /// Stable storage key: `mood_checkin`, `hydration`, `journal_streak`, or
    /// `custom:<label>` so a custom label never collides with a built-in.
    pub fn key(&self) -> Cow<'_, str> {
        match self {
            GoalType::MoodCheckin => Cow::Borrowed("mood_checkin"),
            GoalType::Hydration => Cow::Borrowed("hydration"),
            GoalType::JournalStreak => Cow::Borrowed("journal_streak"),
            GoalType::Custom(label) => Cow::Owned(format!("{CUSTOM_PREFIX}{label}")),
        }
    }

    /// Inverse of [`GoalType::key`]. Unprefixed unknown keys are read as
    /// custom labels.
    pub fn from_key(key: &str) -> Self {
        if let Some(label) = key.strip_prefix(CUSTOM_PREFIX) {
            return GoalType::Custom(label.to_string());
        }
        match key {
            "mood_checkin" => GoalType::MoodCheckin,
            "hydration" => GoalType::Hydration,
            "journal_streak" => GoalType::JournalStreak,
            other => GoalType::Custom(other.to_string()),
        }
    }

    /// Human-readable name.
    pub fn display_name(&self) -> &str {
        match self {
            GoalType::MoodCheckin => "Mood Check-In",
            GoalType::Hydration => "Hydration",
            GoalType::JournalStreak => "Journaling",
            GoalType::Custom(label) => label,
        }
    }

    pub fn is_custom(&self) -> bool {
        matches!(self, GoalType::Custom(_))
    }
}

impl fmt::Display for GoalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for GoalType {
    type Err = ValidationError;

    /// Accepts both `snake_case` and `kebab-case` spellings of the built-in
    /// kinds. Any other non-empty string becomes a custom type.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::InvalidValue {
                field: "goal_type".into(),
                message: "must not be empty".into(),
            });
        }
        let normalized = trimmed.to_ascii_lowercase().replace('-', "_");
        Ok(match normalized.as_str() {
            "mood_checkin" => GoalType::MoodCheckin,
            "hydration" => GoalType::Hydration,
            "journal_streak" => GoalType::JournalStreak,
            _ => GoalType::Custom(trimmed.to_string()),
        })
    }
}

/// A recurring habit goal as reported by the goal store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Goal {
    pub id: GoalId,
    pub owner_id: OwnerId,
    pub label: String,
    pub goal_type: GoalType,
    /// Recurrence period in minutes, always >= 1.
    pub interval_minutes: u32,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub last_completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub streak: u32,
}

impl Goal {
    pub fn interval(&self) -> Duration {
        Duration::minutes(i64::from(self.interval_minutes))
    }

    pub fn window_state(&self, now: DateTime<Utc>) -> WindowState {
        window::evaluate(
            now,
            self.last_completed_at,
            self.created_at,
            self.interval_minutes,
        )
    }

    /// Minutes until the goal is due again; 0 once it is due.
    pub fn minutes_remaining(&self, now: DateTime<Utc>) -> u64 {
        window::minutes_remaining(
            now,
            self.last_completed_at,
            self.created_at,
            self.interval_minutes,
        )
    }

    /// The instant the current window closes.
    pub fn due_at(&self) -> DateTime<Utc> {
        window::due_at(self.last_completed_at, self.created_at, self.interval_minutes)
    }
}

/// Validated input for creating a goal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewGoal {
    pub label: String,
    pub goal_type: GoalType,
    pub interval_minutes: u32,
}

impl NewGoal {
    /// Validate and normalize creation input. The label is trimmed.
    pub fn new(
        label: &str,
        goal_type: GoalType,
        interval_minutes: u32,
    ) -> Result<Self, ValidationError> {
        let label = label.trim();
        if label.is_empty() {
            return Err(ValidationError::EmptyLabel);
        }
        if interval_minutes < 1 {
            return Err(ValidationError::IntervalTooShort(interval_minutes));
        }
        if let GoalType::Custom(custom) = &goal_type {
            if custom.trim().is_empty() {
                return Err(ValidationError::InvalidValue {
                    field: "goal_type".into(),
                    message: "custom type label must not be empty".into(),
                });
            }
        }
        Ok(Self {
            label: label.to_string(),
            goal_type,
            interval_minutes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn goal_type_parses_builtin_spellings() {
        assert_eq!("mood_checkin".parse::<GoalType>().unwrap(), GoalType::MoodCheckin);
        assert_eq!("mood-checkin".parse::<GoalType>().unwrap(), GoalType::MoodCheckin);
        assert_eq!("Hydration".parse::<GoalType>().unwrap(), GoalType::Hydration);
        assert_eq!(
            "journal-streak".parse::<GoalType>().unwrap(),
            GoalType::JournalStreak
        );
    }

    #[test]
    fn goal_type_falls_back_to_custom() {
        let parsed = "Stretch".parse::<GoalType>().unwrap();
        assert_eq!(parsed, GoalType::Custom("Stretch".to_string()));
        assert_eq!(parsed.key(), "custom:Stretch");
        assert_eq!(GoalType::from_key("custom:Stretch"), parsed);
        assert!(parsed.is_custom());
        assert!("  ".parse::<GoalType>().is_err());
    }

    #[test]
    fn goal_type_serializes_snake_case() {
        let json = serde_json::to_string(&GoalType::JournalStreak).unwrap();
        assert_eq!(json, "\"journal_streak\"");
    }

    #[test]
    fn new_goal_rejects_empty_label() {
        assert_eq!(
            NewGoal::new("   ", GoalType::Hydration, 30),
            Err(ValidationError::EmptyLabel)
        );
    }

    #[test]
    fn new_goal_rejects_zero_interval() {
        assert_eq!(
            NewGoal::new("Drink water", GoalType::Hydration, 0),
            Err(ValidationError::IntervalTooShort(0))
        );
    }

    #[test]
    fn new_goal_trims_label() {
        let goal = NewGoal::new("  Drink water ", GoalType::Hydration, 1).unwrap();
        assert_eq!(goal.label, "Drink water");
        assert_eq!(goal.interval_minutes, 1);
    }
}
