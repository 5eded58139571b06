use cadence_core::{Config, GoalId, GoalType, GoalView, WindowState};
use chrono::Utc;
use clap::Subcommand;

use super::{open_controller, resolve_owner, terminal_notifier};

#[derive(Subcommand)]
pub enum GoalAction {
    /// Create a recurring goal
    Create {
        /// Goal label
        label: String,
        /// Goal type: mood-checkin, hydration, journal-streak, or any custom label
        #[arg(long = "type", short = 't', default_value = "hydration")]
        goal_type: String,
        /// Recurrence interval in minutes
        #[arg(long, short = 'i', default_value_t = 60)]
        interval: u32,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List goals
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Mark a goal as done now
    Complete {
        /// Goal ID
        id: String,
    },
    /// Delete a goal
    Delete {
        /// Goal ID
        id: String,
    },
    /// Show window state for one goal or all goals
    Status {
        /// Goal ID (all goals when omitted)
        id: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn state_label(state: WindowState) -> &'static str {
    match state {
        WindowState::Pending => "pending",
        WindowState::Satisfied => "done",
        WindowState::Overdue => "OVERDUE",
    }
}

fn print_status(view: &GoalView) {
    let due = match view.state {
        WindowState::Overdue => "due now".to_string(),
        _ => format!("due in {} min", view.minutes_remaining),
    };
    println!(
        "{:<36}  {:<8}  {:<14}  streak {:<3}  {}",
        view.goal.id,
        state_label(view.state),
        due,
        view.goal.streak,
        view.goal.label
    );
}

pub fn run(action: GoalAction, owner: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let owner = resolve_owner(owner, &config);
    let controller = open_controller(&config, &owner, terminal_notifier(&config))?;

    match action {
        GoalAction::Create {
            label,
            goal_type,
            interval,
            json,
        } => {
            let goal_type: GoalType = goal_type.parse()?;
            let goal = controller.create_goal(&owner, &label, goal_type, interval)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&goal)?);
            } else {
                println!("Goal created: {}", goal.id);
            }
        }
        GoalAction::List { json } => {
            let views = controller.goals(Utc::now());
            if json {
                let goals: Vec<_> = views.into_iter().map(|v| v.goal).collect();
                println!("{}", serde_json::to_string_pretty(&goals)?);
            } else if views.is_empty() {
                println!("No goals.");
            } else {
                for v in &views {
                    println!(
                        "{:<36}  {:<16}  every {:>4} min  {}",
                        v.goal.id,
                        v.goal.goal_type.display_name(),
                        v.goal.interval_minutes,
                        v.goal.label
                    );
                }
            }
        }
        GoalAction::Complete { id } => {
            let goal = controller.complete_goal(&GoalId::from(id), Utc::now())?;
            println!("Completed: {} (streak {})", goal.label, goal.streak);
        }
        GoalAction::Delete { id } => {
            controller.delete_goal(&GoalId::from(id.clone()))?;
            println!("Goal deleted: {id}");
        }
        GoalAction::Status { id, json } => {
            let now = Utc::now();
            let views = match id {
                Some(id) => {
                    let id = GoalId::from(id);
                    let view = controller
                        .goal(&id, now)
                        .ok_or_else(|| format!("goal not found: {id}"))?;
                    vec![view]
                }
                None => controller.goals(now),
            };
            if json {
                println!("{}", serde_json::to_string_pretty(&views)?);
            } else {
                views.iter().for_each(print_status);
            }
        }
    }
    Ok(())
}
