use clap::Subcommand;
use studyflow_core::Config;

use super::{open_tracker, print_json, CmdResult};

#[derive(Subcommand)]
pub enum TaskAction {
    /// Add a task
    Add {
        /// Task text
        text: Vec<String>,
    },
    /// List tasks as JSON
    List,
    /// Remove a task
    Remove { id: String },
    /// Toggle a task's completed flag
    Toggle { id: String },
    /// Set a task's priority (clamped to 1-5)
    Priority {
        id: String,
        #[arg(allow_negative_numbers = true)]
        priority: i64,
    },
}

pub fn run(action: TaskAction) -> CmdResult {
    let config = Config::load_or_default();
    let mut tracker = open_tracker(&config)?;

    match action {
        TaskAction::Add { text } => print_json(&tracker.add_task(&text.join(" "))?),
        TaskAction::List => print_json(tracker.tasks()),
        TaskAction::Remove { id } => print_json(&tracker.remove_task(&id)?),
        TaskAction::Toggle { id } => print_json(&tracker.toggle_task(&id)?),
        TaskAction::Priority { id, priority } => {
            print_json(&tracker.update_task_priority(&id, priority)?)
        }
    }
}
