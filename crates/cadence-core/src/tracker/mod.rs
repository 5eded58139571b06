//! Goal tracking: runtime state, reminder dedup, auto-resets and the
//! controller that ties them to a goal store and a notifier.

mod controller;
mod reset;
mod runtime;

pub use controller::{GoalController, GoalView, TickReport};
pub use reset::{DueReset, ResetScheduler};
pub use runtime::{GoalRuntimeState, ReminderDecision};
