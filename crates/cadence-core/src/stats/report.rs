//! Aggregate statistics across all tracked goals.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::GoalStats;
use crate::goal::{GoalId, GoalType};
use crate::window::WindowState;

/// One goal's line in a [`StatsReport`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalStatsRow {
    pub goal_id: GoalId,
    pub label: String,
    pub goal_type: GoalType,
    /// Streak as persisted by the goal store.
    pub streak: u32,
    pub state: WindowState,
    pub stats: GoalStats,
}

/// Counters summed over every goal of one type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeBreakdown {
    /// Storage key of the goal type (`hydration`, `custom:<label>`, ...).
    pub goal_type: String,
    pub goals: usize,
    pub stats: GoalStats,
}

/// Snapshot of completion statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsReport {
    pub generated_at: DateTime<Utc>,
    pub goals: Vec<GoalStatsRow>,
    pub totals: GoalStats,
    pub by_type: Vec<TypeBreakdown>,
    /// Completed / (completed + missed) over all goals.
    pub completion_rate: Option<f64>,
    /// Goals currently overdue.
    pub overdue: usize,
}

impl StatsReport {
    /// Build a report from per-goal rows. Rows are sorted by label, then id,
    /// so the output is stable across runs.
    pub fn build(mut goals: Vec<GoalStatsRow>, generated_at: DateTime<Utc>) -> Self {
        goals.sort_by(|a, b| a.label.cmp(&b.label).then_with(|| a.goal_id.cmp(&b.goal_id)));

        let mut totals = GoalStats::default();
        let mut by_type: BTreeMap<String, TypeBreakdown> = BTreeMap::new();
        let mut overdue = 0;

        for row in &goals {
            totals.completed += row.stats.completed;
            totals.missed += row.stats.missed;
            if row.state == WindowState::Overdue {
                overdue += 1;
            }

            let key = row.goal_type.key().into_owned();
            let entry = by_type.entry(key.clone()).or_insert_with(|| TypeBreakdown {
                goal_type: key,
                goals: 0,
                stats: GoalStats::default(),
            });
            entry.goals += 1;
            entry.stats.completed += row.stats.completed;
            entry.stats.missed += row.stats.missed;
        }

        Self {
            generated_at,
            completion_rate: totals.completion_rate(),
            goals,
            totals,
            by_type: by_type.into_values().collect(),
            overdue,
        }
    }
}
