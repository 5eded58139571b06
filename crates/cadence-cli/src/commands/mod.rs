pub mod completions;
pub mod config;
pub mod goal;
pub mod watch;

use std::sync::Arc;

use cadence_core::{
    Config, GoalController, MuteNotifier, Notifier, OwnerId, SqliteGoalStore, SystemClock,
    TerminalNotifier,
};

/// Owner from the flag, the config, `$USER`, or `local`, in that order.
pub fn resolve_owner(flag: Option<String>, config: &Config) -> OwnerId {
    flag.or_else(|| config.tracker.owner.clone())
        .or_else(|| std::env::var("USER").ok())
        .filter(|s| !s.trim().is_empty())
        .map(OwnerId::new)
        .unwrap_or_else(|| OwnerId::from("local"))
}

/// Notifier for one-shot commands: terminal lines on stderr, or nothing.
pub fn terminal_notifier(config: &Config) -> Arc<dyn Notifier> {
    if config.notifications.enabled {
        Arc::new(TerminalNotifier::stderr(config.notifications.sound))
    } else {
        Arc::new(MuteNotifier)
    }
}

/// Controller over the configured SQLite store, loaded with `owner`'s goals.
pub fn open_controller(
    config: &Config,
    owner: &OwnerId,
    notifier: Arc<dyn Notifier>,
) -> Result<GoalController, Box<dyn std::error::Error>> {
    let store = SqliteGoalStore::open(config.database_path()?)?;
    let controller = GoalController::new(Arc::new(store), notifier, Arc::new(SystemClock));
    controller.load_goals(owner)?;
    Ok(controller)
}
