use std::sync::Arc;
use std::time::Duration;

use cadence_core::{
    Config, GoalController, GoalId, IntervalClock, MuteNotifier, Notifier, QueuedNotifier,
    Runner, SqliteGoalStore, SystemClock, TerminalNotifier,
};
use clap::Args;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, warn};

use super::resolve_owner;

/// Watch goals and remind when they fall overdue.
///
/// While running, lines on stdin are read as commands: `complete <id>`
/// records a completion through the watching controller.
#[derive(Args)]
pub struct WatchArgs {
    /// Seconds between evaluations (defaults to tracker.tick_interval_secs)
    #[arg(long)]
    tick_secs: Option<u64>,
    /// Stop after this many seconds instead of waiting for Ctrl-C
    #[arg(long)]
    duration_secs: Option<u64>,
}

async fn shutdown_signal(limit: Option<Duration>) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "cannot listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };
    match limit {
        Some(limit) => {
            tokio::select! {
                _ = ctrl_c => {}
                _ = tokio::time::sleep(limit) => {}
            }
        }
        None => ctrl_c.await,
    }
}

fn handle_command(controller: &GoalController, line: &str) {
    let mut words = line.split_whitespace();
    match (words.next(), words.next(), words.next()) {
        (None, _, _) => {}
        (Some("complete"), Some(id), None) => {
            match controller.complete_goal(&GoalId::from(id), controller.now()) {
                Ok(goal) => eprintln!("Completed: {} (streak {})", goal.label, goal.streak),
                Err(e) => eprintln!("error: {e}"),
            }
        }
        _ => eprintln!("unknown command: {} (expected: complete <id>)", line.trim()),
    }
}

async fn read_commands(controller: Arc<GoalController>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => handle_command(&controller, &line),
            Ok(None) => break,
            Err(e) => {
                warn!(error = %e, "cannot read commands from stdin");
                break;
            }
        }
    }
    debug!("stdin closed; no further commands");
}

pub fn run(args: WatchArgs, owner: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let owner = resolve_owner(owner, &config);
    let store = SqliteGoalStore::open(config.database_path()?)?;
    let tick_secs = args.tick_secs.unwrap_or(config.tracker.tick_interval_secs);
    let cadence = IntervalClock::from_secs(tick_secs);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    let result = runtime.block_on(async move {
        let notifications = &config.notifications;
        let (notifier, worker) = if notifications.enabled {
            let (queue, worker) = QueuedNotifier::spawn(
                Arc::new(TerminalNotifier::stderr(notifications.sound)),
                notifications.queue_capacity,
                Duration::from_millis(notifications.delivery_timeout_ms),
            );
            (Arc::new(queue) as Arc<dyn Notifier>, Some(worker))
        } else {
            (Arc::new(MuteNotifier) as Arc<dyn Notifier>, None)
        };

        let controller = Arc::new(GoalController::new(
            Arc::new(store),
            notifier,
            Arc::new(SystemClock),
        ));
        if let Err(e) = controller.load_goals(&owner) {
            warn!(error = %e, "initial goal load failed");
        }
        let commands = tokio::spawn(read_commands(controller.clone()));

        let summary = Runner::new(controller.clone(), owner, cadence)
            .refresh_every(config.tracker.refresh_every_ticks)
            .run(shutdown_signal(args.duration_secs.map(Duration::from_secs)))
            .await;
        commands.abort();
        let _ = commands.await;

        let report = controller.stats_report(controller.now());
        drop(controller);

        if let Some(worker) = worker {
            let grace = Duration::from_millis(notifications.delivery_timeout_ms);
            if tokio::time::timeout(grace, worker).await.is_err() {
                warn!("pending notifications dropped at shutdown");
            }
        }

        tracing::info!(ticks = summary.ticks, reminders = summary.reminders, "watch finished");
        println!("{}", serde_json::to_string_pretty(&report)?);
        Ok::<(), Box<dyn std::error::Error>>(())
    });

    // A stdin read still blocked on the terminal must not hold up exit.
    runtime.shutdown_background();
    result
}
