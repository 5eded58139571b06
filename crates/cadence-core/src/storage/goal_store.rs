//! Goal store abstraction.
//!
//! The store owns goal identity and persistence, including the streak. The
//! tracker only calls into it; it never assumes anything about the storage
//! format behind it.

use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::error::{CoreError, Result};
use crate::goal::{Goal, GoalId, NewGoal, OwnerId};

/// Every goal persistence backend implements this trait.
///
/// Failures that are not about a specific missing goal must be reported as
/// [`CoreError::StoreUnavailable`] so callers can tell them apart from
/// [`CoreError::NotFound`].
pub trait GoalStore: Send + Sync {
    /// All goals belonging to `owner_id`, oldest first.
    fn list(&self, owner_id: &OwnerId) -> Result<Vec<Goal>>;

    /// Persist a new goal and return it with its store-assigned id.
    fn create(&self, owner_id: &OwnerId, goal: &NewGoal, created_at: DateTime<Utc>) -> Result<Goal>;

    /// Remove a goal. Unknown ids yield [`CoreError::NotFound`].
    fn delete(&self, goal_id: &GoalId) -> Result<()>;

    /// Record a completion at `at`, update the streak by the store's policy
    /// and return the updated goal.
    fn mark_complete(&self, goal_id: &GoalId, at: DateTime<Utc>) -> Result<Goal>;
}

/// Streak policy shared by the bundled stores.
///
/// A completion within two intervals of the previous one extends the streak;
/// anything later (or a first completion) restarts it at 1.
pub fn next_streak(
    previous: Option<DateTime<Utc>>,
    streak: u32,
    at: DateTime<Utc>,
    interval_minutes: u32,
) -> u32 {
    match previous {
        Some(prev) if at - prev <= Duration::minutes(2 * i64::from(interval_minutes)) => {
            streak.saturating_add(1)
        }
        _ => 1,
    }
}

/// In-memory goal store.
///
/// Used by tests and by hosts that keep goals elsewhere and only need the
/// tracker. Ids are random UUIDs.
#[derive(Debug, Default)]
pub struct MemoryGoalStore {
    goals: Mutex<BTreeMap<GoalId, Goal>>,
}

impl MemoryGoalStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a goal verbatim, keeping its id.
    pub fn insert(&self, goal: Goal) {
        self.goals
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(goal.id.clone(), goal);
    }

    pub fn get(&self, goal_id: &GoalId) -> Option<Goal> {
        self.goals
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(goal_id)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.goals.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl GoalStore for MemoryGoalStore {
    fn list(&self, owner_id: &OwnerId) -> Result<Vec<Goal>> {
        let goals = self.goals.lock().unwrap_or_else(PoisonError::into_inner);
        let mut owned: Vec<Goal> = goals
            .values()
            .filter(|g| &g.owner_id == owner_id)
            .cloned()
            .collect();
        owned.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(owned)
    }

    fn create(
        &self,
        owner_id: &OwnerId,
        goal: &NewGoal,
        created_at: DateTime<Utc>,
    ) -> Result<Goal> {
        let created = Goal {
            id: GoalId::new(Uuid::new_v4().to_string()),
            owner_id: owner_id.clone(),
            label: goal.label.clone(),
            goal_type: goal.goal_type.clone(),
            interval_minutes: goal.interval_minutes,
            created_at,
            last_completed_at: None,
            streak: 0,
        };
        self.insert(created.clone());
        Ok(created)
    }

    fn delete(&self, goal_id: &GoalId) -> Result<()> {
        self.goals
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(goal_id)
            .map(|_| ())
            .ok_or_else(|| CoreError::NotFound(goal_id.clone()))
    }

    fn mark_complete(&self, goal_id: &GoalId, at: DateTime<Utc>) -> Result<Goal> {
        let mut goals = self.goals.lock().unwrap_or_else(PoisonError::into_inner);
        let goal = goals
            .get_mut(goal_id)
            .ok_or_else(|| CoreError::NotFound(goal_id.clone()))?;
        goal.streak = next_streak(goal.last_completed_at, goal.streak, at, goal.interval_minutes);
        goal.last_completed_at = Some(at);
        Ok(goal.clone())
    }
}
