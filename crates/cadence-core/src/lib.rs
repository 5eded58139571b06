//! # Cadence Core Library
//!
//! Core logic for recurring habit goals: deciding when a goal is due,
//! reminding once per overdue period, counting completions and misses, and
//! re-opening a goal one interval after it was completed. The CLI is a thin
//! layer over this crate.
//!
//! ## Architecture
//!
//! - **Window evaluation**: a pure function of `now`, the last completion and
//!   the goal interval
//! - **Tracker**: the [`GoalController`] owns the in-memory snapshot, per-goal
//!   runtime state and the auto-reset deadlines. Like a wall-clock state
//!   machine it has no thread of its own; the caller invokes `tick()`
//! - **Runner**: an async loop that calls `tick()` on a fixed cadence and at
//!   reset deadlines
//! - **Storage**: the [`GoalStore`] trait with SQLite and in-memory
//!   implementations, plus TOML configuration
//! - **Notify**: the [`Notifier`] trait and terminal, tracing and queued
//!   implementations
//!
//! ## Key Components
//!
//! - [`GoalController`]: goal lifecycle and reminder engine
//! - [`SqliteGoalStore`]: persistent goal store
//! - [`Config`]: application configuration management

pub mod clock;
pub mod error;
pub mod events;
pub mod goal;
pub mod notify;
pub mod runner;
pub mod stats;
pub mod storage;
pub mod tracker;
pub mod window;

pub use clock::{Clock, IntervalClock, ManualClock, SystemClock};
pub use error::{ConfigError, CoreError, DatabaseError, NotifyError, Result, ValidationError};
pub use events::{Notice, NoticeKind};
pub use goal::{Goal, GoalId, GoalType, NewGoal, OwnerId};
pub use notify::{
    MemoryNotifier, MuteNotifier, Notifier, QueuedNotifier, TerminalNotifier, TracingNotifier,
};
pub use runner::{RunSummary, Runner};
pub use stats::{GoalStats, StatsReport};
pub use storage::{Config, GoalStore, MemoryGoalStore, SqliteGoalStore};
pub use tracker::{GoalController, GoalRuntimeState, GoalView, TickReport};
pub use window::WindowState;
