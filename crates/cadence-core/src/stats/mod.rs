//! Completion statistics for tracked goals.
//!
//! Counters are process-lifetime: they start at zero when a goal is first
//! observed and are discarded together with the goal. They are a view layered
//! over the store's persisted streak, not a replacement for it.

mod counters;
mod report;

pub use counters::GoalStats;
pub use report::{GoalStatsRow, StatsReport, TypeBreakdown};
