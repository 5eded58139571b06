use serde::{Deserialize, Serialize};

/// Per-goal completed/missed counters. Both only ever grow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoalStats {
    /// Accepted completions.
    pub completed: u64,
    /// Overdue periods that produced a reminder.
    pub missed: u64,
}

impl GoalStats {
    pub fn record_completion(&mut self) {
        self.completed = self.completed.saturating_add(1);
    }

    pub fn record_miss(&mut self) {
        self.missed = self.missed.saturating_add(1);
    }

    /// Periods observed so far (completed or missed).
    pub fn total(&self) -> u64 {
        self.completed.saturating_add(self.missed)
    }

    /// Share of observed periods that were completed, 0.0 .. 1.0.
    /// `None` until anything has been observed.
    pub fn completion_rate(&self) -> Option<f64> {
        let total = self.total();
        if total == 0 {
            return None;
        }
        Some(self.completed as f64 / total as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_start_at_zero() {
        let stats = GoalStats::default();
        assert_eq!(stats.completed, 0);
        assert_eq!(stats.missed, 0);
        assert_eq!(stats.completion_rate(), None);
    }

    #[test]
    fn completion_rate_mixes_both_counters() {
        let mut stats = GoalStats::default();
        stats.record_completion();
        stats.record_completion();
        stats.record_completion();
        stats.record_miss();
        assert_eq!(stats.total(), 4);
        assert_eq!(stats.completion_rate(), Some(0.75));
    }
}
