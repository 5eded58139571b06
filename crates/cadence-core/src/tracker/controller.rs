//! Goal lifecycle controller.
//!
//! Owns the in-memory goal snapshot: an index from goal id to the goal as last
//! reported by the store plus its runtime state. `load_goals`, `create_goal`
//! and `delete_goal` are the only operations that change membership.
//!
//! Locking: every tracked goal sits behind its own mutex so a tick and a
//! completion on the same goal are serialized while different goals proceed
//! independently. Locks are always taken in the order registry, goal,
//! resets, and notices are dispatched only after every lock is released.
//! The deletion log is only ever taken on its own or right after the
//! registry.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, TryLockError};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use super::reset::{DueReset, ResetScheduler};
use super::runtime::{GoalRuntimeState, ReminderDecision};
use crate::clock::Clock;
use crate::error::{CoreError, Result};
use crate::events::{Notice, NoticeKind};
use crate::goal::{Goal, GoalId, GoalType, NewGoal, OwnerId};
use crate::notify::Notifier;
use crate::stats::{GoalStats, GoalStatsRow, StatsReport};
use crate::storage::GoalStore;
use crate::window::WindowState;

#[derive(Debug)]
struct TrackedGoal {
    goal: Goal,
    runtime: GoalRuntimeState,
    /// Cleared (under the goal lock) when the goal is deleted or dropped by a
    /// reload. Holders of a stale `Arc` check it before acting.
    live: bool,
    /// Token of the reset currently armed for this goal.
    reset_token: Option<u64>,
}

impl TrackedGoal {
    fn new(goal: Goal) -> Self {
        Self {
            goal,
            runtime: GoalRuntimeState::default(),
            live: true,
            reset_token: None,
        }
    }

    fn clear_reset(&mut self) {
        self.reset_token = None;
        self.runtime.reset_timer_armed = false;
    }
}

type Slot = Arc<Mutex<TrackedGoal>>;

/// Deletions recorded while a reload's store read is in flight.
///
/// `load_goals` lists the store before it takes the registry lock, so a
/// delete can land in between. Each reload notes the generation it started
/// at; any goal deleted at a later generation is left out of the merge.
#[derive(Debug, Default)]
struct DeletionLog {
    generation: u64,
    /// Goal id to the generation of its deletion.
    tombstones: HashMap<GoalId, u64>,
    /// Start generation of each reload in flight, with a count.
    loads: BTreeMap<u64, usize>,
}

impl DeletionLog {
    fn begin_load(&mut self) -> u64 {
        *self.loads.entry(self.generation).or_default() += 1;
        self.generation
    }

    fn record(&mut self, goal_id: &GoalId) {
        self.generation += 1;
        if !self.loads.is_empty() {
            self.tombstones.insert(goal_id.clone(), self.generation);
        }
    }

    fn deleted_since(&self, started: u64, goal_id: &GoalId) -> bool {
        self.tombstones
            .get(goal_id)
            .is_some_and(|&deleted_at| deleted_at > started)
    }

    fn finish_load(&mut self, started: u64) {
        if let Some(count) = self.loads.get_mut(&started) {
            *count -= 1;
            if *count == 0 {
                self.loads.remove(&started);
            }
        }
        match self.loads.keys().next().copied() {
            Some(oldest) => self.tombstones.retain(|_, deleted_at| *deleted_at > oldest),
            None => self.tombstones.clear(),
        }
    }
}

/// Read-only view of one tracked goal.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GoalView {
    pub goal: Goal,
    pub state: WindowState,
    pub minutes_remaining: u64,
    pub runtime: GoalRuntimeState,
}

/// What a single [`GoalController::tick`] did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TickReport {
    /// Goals whose window state was evaluated.
    pub evaluated: usize,
    /// Overdue reminders that fired.
    pub reminders: usize,
    /// Auto-resets that expired and took effect.
    pub resets_fired: usize,
    /// Goals skipped because another operation held their lock.
    pub skipped_busy: usize,
}

/// Orchestrates window evaluation, reminder dedup, stats and auto-resets
/// for every tracked goal against a [`GoalStore`] and a [`Notifier`].
pub struct GoalController {
    store: Arc<dyn GoalStore>,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
    registry: RwLock<HashMap<GoalId, Slot>>,
    resets: Mutex<ResetScheduler>,
    deletions: Mutex<DeletionLog>,
}

fn lock_goal(slot: &Slot) -> MutexGuard<'_, TrackedGoal> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

impl GoalController {
    pub fn new(
        store: Arc<dyn GoalStore>,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            notifier,
            clock,
            registry: RwLock::new(HashMap::new()),
            resets: Mutex::new(ResetScheduler::new()),
            deletions: Mutex::new(DeletionLog::default()),
        }
    }

    /// Current time according to the controller's clock.
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    fn slot(&self, goal_id: &GoalId) -> Option<Slot> {
        self.registry
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(goal_id)
            .cloned()
    }

    fn slots(&self) -> Vec<Slot> {
        self.registry
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect()
    }

    fn resets(&self) -> MutexGuard<'_, ResetScheduler> {
        self.resets.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn deletions(&self) -> MutexGuard<'_, DeletionLog> {
        self.deletions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn dispatch(&self, notices: Vec<Notice>) {
        for notice in notices {
            if let Err(e) = self.notifier.notify(&notice) {
                warn!(
                    goal_id = %notice.goal_id,
                    kind = ?notice.kind,
                    error = %e,
                    "notifier failed"
                );
            }
        }
    }

    /// Fetch `owner_id`'s goals from the store and merge them into the
    /// snapshot.
    ///
    /// Known goals keep their runtime state and take the store's fields. New
    /// ids get fresh runtime state. Tracked goals of this owner that the
    /// store no longer reports are discarded along with any armed reset.
    /// Goals deleted through this controller while the store was being read
    /// stay deleted. On a store failure the snapshot is left untouched.
    pub fn load_goals(&self, owner_id: &OwnerId) -> Result<Vec<Goal>> {
        let started = self.deletions().begin_load();
        let listed = match self.store.list(owner_id) {
            Ok(goals) => goals,
            Err(e) => {
                self.deletions().finish_load(started);
                return Err(e);
            }
        };

        let mut registry = self.registry.write().unwrap_or_else(PoisonError::into_inner);
        let goals: Vec<Goal> = {
            let mut deletions = self.deletions();
            let goals = listed
                .into_iter()
                .filter(|goal| !deletions.deleted_since(started, &goal.id))
                .collect();
            deletions.finish_load(started);
            goals
        };
        let mut added = 0usize;

        for goal in &goals {
            match registry.get(&goal.id) {
                Some(slot) => {
                    let mut tracked = lock_goal(slot);
                    tracked.goal = goal.clone();
                }
                None => {
                    let slot = Arc::new(Mutex::new(TrackedGoal::new(goal.clone())));
                    registry.insert(goal.id.clone(), slot);
                    added += 1;
                }
            }
        }

        let stale: Vec<GoalId> = registry
            .iter()
            .filter(|(id, slot)| {
                !goals.iter().any(|g| &g.id == *id) && &lock_goal(slot).goal.owner_id == owner_id
            })
            .map(|(id, _)| id.clone())
            .collect();

        for id in &stale {
            if let Some(slot) = registry.remove(id) {
                let mut tracked = lock_goal(&slot);
                tracked.live = false;
                tracked.clear_reset();
                self.resets().cancel(id);
            }
        }

        debug!(
            %owner_id,
            total = goals.len(),
            added,
            discarded = stale.len(),
            "goals loaded"
        );
        Ok(goals)
    }

    /// Validate, persist and start tracking a new goal.
    pub fn create_goal(
        &self,
        owner_id: &OwnerId,
        label: &str,
        goal_type: GoalType,
        interval_minutes: u32,
    ) -> Result<Goal> {
        let new_goal = NewGoal::new(label, goal_type, interval_minutes)?;
        let created_at = self.clock.now();
        let goal = self.store.create(owner_id, &new_goal, created_at)?;

        let slot = Arc::new(Mutex::new(TrackedGoal::new(goal.clone())));
        self.registry
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(goal.id.clone(), slot);

        info!(goal_id = %goal.id, %owner_id, interval_minutes, "goal created");
        self.dispatch(vec![Notice::for_goal(&goal, NoticeKind::Created, created_at)]);
        Ok(goal)
    }

    /// Record a completion at `now`.
    ///
    /// A goal still inside its window is rejected with
    /// [`CoreError::TooSoon`]. Otherwise the store persists the completion,
    /// the completed counter goes up by one, the reminder flag is cleared
    /// and an auto-reset is armed for one interval. Nothing changes if the
    /// store call fails.
    pub fn complete_goal(&self, goal_id: &GoalId, now: DateTime<Utc>) -> Result<Goal> {
        let slot = self
            .slot(goal_id)
            .ok_or_else(|| CoreError::NotFound(goal_id.clone()))?;
        let mut tracked = lock_goal(&slot);
        if !tracked.live {
            return Err(CoreError::NotFound(goal_id.clone()));
        }

        let state = tracked.goal.window_state(now);
        if !state.accepts_completion() {
            return Err(CoreError::TooSoon {
                goal_id: goal_id.clone(),
                minutes_remaining: tracked.goal.minutes_remaining(now),
            });
        }

        let updated = self.store.mark_complete(goal_id, now)?;
        tracked.goal = updated.clone();
        tracked.runtime.accept_completion();

        if let Some(token) = self.resets().arm(goal_id, now, updated.interval_minutes) {
            tracked.reset_token = Some(token);
            tracked.runtime.reset_timer_armed = true;
        }
        let stats = tracked.runtime.stats;
        drop(tracked);

        info!(
            %goal_id,
            streak = updated.streak,
            completed = stats.completed,
            "goal completed"
        );
        self.dispatch(vec![Notice::for_goal(&updated, NoticeKind::Completed, now)]);
        Ok(updated)
    }

    /// Delete a goal from the store and stop tracking it.
    ///
    /// Any armed reset is cancelled; one that is already mid-fire finds the
    /// goal no longer live and does nothing. If the store reports the goal
    /// missing, local state is dropped anyway and `NotFound` is returned. On
    /// any other store failure nothing changes.
    pub fn delete_goal(&self, goal_id: &GoalId) -> Result<()> {
        let Some(slot) = self.slot(goal_id) else {
            self.store.delete(goal_id)?;
            let _registry = self.registry.write().unwrap_or_else(PoisonError::into_inner);
            self.deletions().record(goal_id);
            info!(%goal_id, "untracked goal deleted from store");
            return Ok(());
        };

        let mut tracked = lock_goal(&slot);
        let missing_in_store = match self.store.delete(goal_id) {
            Ok(()) => false,
            Err(CoreError::NotFound(_)) => true,
            Err(e) => return Err(e),
        };

        let was_live = tracked.live;
        tracked.live = false;
        tracked.clear_reset();
        self.resets().cancel(goal_id);
        let notice = Notice::for_goal(&tracked.goal, NoticeKind::Deleted, self.clock.now());
        drop(tracked);

        {
            let mut registry = self.registry.write().unwrap_or_else(PoisonError::into_inner);
            if registry.get(goal_id).is_some_and(|current| Arc::ptr_eq(current, &slot)) {
                registry.remove(goal_id);
            }
            self.deletions().record(goal_id);
        }

        if missing_in_store {
            warn!(%goal_id, "goal already gone from store; dropped local state");
            return Err(CoreError::NotFound(goal_id.clone()));
        }
        info!(%goal_id, "goal deleted");
        if was_live {
            self.dispatch(vec![notice]);
        }
        Ok(())
    }

    /// One evaluation pass at `now`.
    ///
    /// Expired auto-resets are applied first, then every tracked goal is
    /// classified and fed through the reminder deduplicator. The pass only
    /// reads the in-memory snapshot; a goal whose lock is held elsewhere is
    /// skipped and picked up by the next tick.
    pub fn tick(&self, now: DateTime<Utc>) -> TickReport {
        let mut report = TickReport::default();

        let due = self.resets().take_due(now);
        report.resets_fired = self.apply_resets(due);

        let mut notices = Vec::new();
        for slot in self.slots() {
            let mut tracked = match slot.try_lock() {
                Ok(guard) => guard,
                Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
                Err(TryLockError::WouldBlock) => {
                    report.skipped_busy += 1;
                    continue;
                }
            };
            if !tracked.live {
                continue;
            }

            report.evaluated += 1;
            let state = tracked.goal.window_state(now);
            if tracked.runtime.observe(state) == ReminderDecision::Fire {
                report.reminders += 1;
                notices.push(Notice::for_goal(&tracked.goal, NoticeKind::Overdue, now));
            }
        }

        if report.reminders > 0 || report.resets_fired > 0 {
            debug!(
                evaluated = report.evaluated,
                reminders = report.reminders,
                resets_fired = report.resets_fired,
                skipped_busy = report.skipped_busy,
                "tick"
            );
        }
        self.dispatch(notices);
        report
    }

    /// Apply resets already taken from the scheduler. A reset whose goal was
    /// deleted or re-armed since then is ignored.
    fn apply_resets(&self, due: Vec<DueReset>) -> usize {
        let mut fired = 0;
        for reset in due {
            let Some(slot) = self.slot(&reset.goal_id) else {
                continue;
            };
            let mut tracked = lock_goal(&slot);
            if tracked.live && tracked.reset_token == Some(reset.token) {
                tracked.clear_reset();
                fired += 1;
                debug!(goal_id = %reset.goal_id, deadline = %reset.deadline, "auto-reset fired");
            }
        }
        fired
    }

    /// Snapshot of a single tracked goal.
    pub fn goal(&self, goal_id: &GoalId, now: DateTime<Utc>) -> Option<GoalView> {
        let slot = self.slot(goal_id)?;
        let tracked = lock_goal(&slot);
        tracked.live.then(|| view(&tracked, now))
    }

    /// Snapshot of every tracked goal, oldest first.
    pub fn goals(&self, now: DateTime<Utc>) -> Vec<GoalView> {
        let mut views: Vec<GoalView> = self
            .slots()
            .iter()
            .filter_map(|slot| {
                let tracked = lock_goal(slot);
                tracked.live.then(|| view(&tracked, now))
            })
            .collect();
        views.sort_by(|a, b| {
            a.goal
                .created_at
                .cmp(&b.goal.created_at)
                .then_with(|| a.goal.id.cmp(&b.goal.id))
        });
        views
    }

    pub fn stats(&self, goal_id: &GoalId) -> Option<GoalStats> {
        let slot = self.slot(goal_id)?;
        let tracked = lock_goal(&slot);
        tracked.live.then_some(tracked.runtime.stats)
    }

    pub fn stats_report(&self, now: DateTime<Utc>) -> StatsReport {
        let rows = self
            .goals(now)
            .into_iter()
            .map(|v| GoalStatsRow {
                goal_id: v.goal.id,
                label: v.goal.label,
                goal_type: v.goal.goal_type,
                streak: v.goal.streak,
                state: v.state,
                stats: v.runtime.stats,
            })
            .collect();
        StatsReport::build(rows, now)
    }

    /// Earliest pending auto-reset deadline, if any.
    pub fn next_reset_deadline(&self) -> Option<DateTime<Utc>> {
        self.resets().next_deadline()
    }

    pub fn tracked_count(&self) -> usize {
        self.registry.read().unwrap_or_else(PoisonError::into_inner).len()
    }
}

fn view(tracked: &TrackedGoal, now: DateTime<Utc>) -> GoalView {
    GoalView {
        goal: tracked.goal.clone(),
        state: tracked.goal.window_state(now),
        minutes_remaining: tracked.goal.minutes_remaining(now),
        runtime: tracked.runtime,
    }
}
