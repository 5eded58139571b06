//! Async driver for the goal controller.
//!
//! The controller itself never sleeps. The runner wakes it on the interval
//! cadence and additionally at the earliest pending auto-reset deadline, so a
//! reset takes effect on time even with a long tick period. Every
//! `refresh_every_ticks` ticks the snapshot is reloaded from the store; a
//! failed reload is logged and the runner carries on with what it has.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::clock::IntervalClock;
use crate::goal::OwnerId;
use crate::tracker::GoalController;

/// Totals for one [`Runner::run`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub ticks: u64,
    pub reminders: u64,
    pub resets_fired: u64,
    pub refresh_failures: u64,
}

pub struct Runner {
    controller: Arc<GoalController>,
    owner: OwnerId,
    cadence: IntervalClock,
    refresh_every_ticks: u64,
}

impl Runner {
    pub fn new(controller: Arc<GoalController>, owner: OwnerId, cadence: IntervalClock) -> Self {
        Self {
            controller,
            owner,
            cadence,
            refresh_every_ticks: 10,
        }
    }

    /// Reload from the store every `n` ticks. Zero disables periodic reloads;
    /// the initial load always happens.
    pub fn refresh_every(mut self, n: u64) -> Self {
        self.refresh_every_ticks = n;
        self
    }

    fn refresh(&self, summary: &mut RunSummary) {
        match self.controller.load_goals(&self.owner) {
            Ok(goals) => debug!(owner_id = %self.owner, count = goals.len(), "snapshot refreshed"),
            Err(e) => {
                summary.refresh_failures += 1;
                warn!(owner_id = %self.owner, error = %e, "refresh failed; keeping last snapshot");
            }
        }
    }

    fn tick(&self, summary: &mut RunSummary) {
        let report = self.controller.tick(self.controller.now());
        summary.ticks += 1;
        summary.reminders += report.reminders as u64;
        summary.resets_fired += report.resets_fired as u64;
    }

    /// Time until the earliest armed auto-reset, zero if it is already due.
    fn until_next_reset(&self) -> Option<Duration> {
        let deadline = self.controller.next_reset_deadline()?;
        Some((deadline - self.controller.now()).to_std().unwrap_or(Duration::ZERO))
    }

    /// Drive the controller until `shutdown` resolves.
    pub async fn run<F>(self, shutdown: F) -> RunSummary
    where
        F: Future<Output = ()>,
    {
        let mut summary = RunSummary::default();
        let mut ticker = self.cadence.ticker();
        tokio::pin!(shutdown);

        info!(
            owner_id = %self.owner,
            period_secs = self.cadence.period().as_secs(),
            "runner started"
        );
        self.refresh(&mut summary);

        loop {
            let reset_in = self.until_next_reset();

            tokio::select! {
                biased;

                _ = &mut shutdown => break,

                _ = ticker.tick() => {
                    if self.refresh_every_ticks > 0
                        && summary.ticks > 0
                        && summary.ticks % self.refresh_every_ticks == 0
                    {
                        self.refresh(&mut summary);
                    }
                    self.tick(&mut summary);
                }

                _ = tokio::time::sleep(reset_in.unwrap_or_default()), if reset_in.is_some() => {
                    self.tick(&mut summary);
                }
            }
        }

        info!(
            ticks = summary.ticks,
            reminders = summary.reminders,
            resets_fired = summary.resets_fired,
            "runner stopped"
        );
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::Clock;
    use crate::error::{CoreError, Result};
    use crate::events::NoticeKind;
    use crate::goal::{Goal, GoalId, GoalType, NewGoal};
    use crate::notify::MemoryNotifier;
    use crate::storage::{GoalStore, MemoryGoalStore};
    use chrono::{DateTime, TimeZone, Utc};

    /// Wall time that follows tokio's (pausable) clock.
    struct TokioClock {
        base: DateTime<Utc>,
        start: tokio::time::Instant,
    }

    impl TokioClock {
        fn new() -> Self {
            Self {
                base: Utc.with_ymd_and_hms(2025, 3, 1, 8, 0, 0).unwrap(),
                start: tokio::time::Instant::now(),
            }
        }
    }

    impl Clock for TokioClock {
        fn now(&self) -> DateTime<Utc> {
            self.base + chrono::Duration::from_std(self.start.elapsed()).unwrap()
        }
    }

    struct DownStore;

    impl GoalStore for DownStore {
        fn list(&self, _owner_id: &OwnerId) -> Result<Vec<Goal>> {
            Err(CoreError::store_unavailable("offline"))
        }

        fn create(&self, _: &OwnerId, _: &NewGoal, _: DateTime<Utc>) -> Result<Goal> {
            Err(CoreError::store_unavailable("offline"))
        }

        fn delete(&self, _goal_id: &GoalId) -> Result<()> {
            Err(CoreError::store_unavailable("offline"))
        }

        fn mark_complete(&self, _goal_id: &GoalId, _at: DateTime<Utc>) -> Result<Goal> {
            Err(CoreError::store_unavailable("offline"))
        }
    }

    fn setup() -> (Arc<GoalController>, Arc<MemoryNotifier>, OwnerId) {
        let notifier = Arc::new(MemoryNotifier::new());
        let controller = Arc::new(GoalController::new(
            Arc::new(MemoryGoalStore::new()),
            notifier.clone(),
            Arc::new(TokioClock::new()),
        ));
        (controller, notifier, OwnerId::from("user-1"))
    }

    #[tokio::test(start_paused = true)]
    async fn reminds_once_across_ticks() {
        let (controller, notifier, owner) = setup();
        controller
            .create_goal(&owner, "Water", GoalType::Hydration, 1)
            .unwrap();

        let runner = Runner::new(controller.clone(), owner, IntervalClock::from_secs(60));
        let summary = runner
            .run(tokio::time::sleep(Duration::from_secs(150)))
            .await;

        assert_eq!(summary.ticks, 3);
        assert_eq!(summary.reminders, 1);
        assert_eq!(notifier.count(NoticeKind::Overdue), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn wakes_for_reset_deadline_between_ticks() {
        let (controller, notifier, owner) = setup();
        let goal = controller
            .create_goal(&owner, "Water", GoalType::Hydration, 1)
            .unwrap();
        controller.complete_goal(&goal.id, controller.now()).unwrap();

        let runner = Runner::new(controller.clone(), owner, IntervalClock::from_secs(3600));
        let summary = runner
            .run(tokio::time::sleep(Duration::from_secs(90)))
            .await;

        assert_eq!(summary.resets_fired, 1);
        assert_eq!(summary.reminders, 1);
        assert_eq!(notifier.count(NoticeKind::Overdue), 1);
        assert_eq!(controller.next_reset_deadline(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn refresh_failures_do_not_stop_ticking() {
        let controller = Arc::new(GoalController::new(
            Arc::new(DownStore),
            Arc::new(MemoryNotifier::new()),
            Arc::new(TokioClock::new()),
        ));
        let runner = Runner::new(controller, OwnerId::from("user-1"), IntervalClock::from_secs(60))
            .refresh_every(1);
        let summary = runner
            .run(tokio::time::sleep(Duration::from_secs(150)))
            .await;

        assert_eq!(summary.ticks, 3);
        assert_eq!(summary.refresh_failures, 3);
    }
}
