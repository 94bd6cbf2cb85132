use clap::Subcommand;
use studyflow_core::Config;

use super::{open_tracker, print_json, CmdResult};

#[derive(Subcommand)]
pub enum StatsAction {
    /// Print all statistics as JSON
    Show,
    /// Erase all progress (timer durations and technique are kept)
    Reset,
    /// Replace the daily motivation text
    Motivation {
        /// Motivation text
        text: Vec<String>,
    },
    /// List focus tips, optionally adding one
    Tips {
        /// Tip to append
        #[arg(long)]
        add: Option<String>,
    },
    /// Set the long-term study goal in hours
    TargetHours { hours: u32 },
}

pub fn run(action: StatsAction) -> CmdResult {
    let config = Config::load_or_default();
    let mut tracker = open_tracker(&config)?;

    match action {
        StatsAction::Show => {}
        StatsAction::Reset => tracker.reset_progress(),
        StatsAction::Motivation { text } => tracker.update_daily_motivation(&text.join(" ")),
        StatsAction::Tips { add } => {
            if let Some(tip) = add {
                tracker.add_focus_tip(&tip);
            }
            return print_json(&tracker.stats().focus_tips);
        }
        StatsAction::TargetHours { hours } => tracker.update_target_hours(hours),
    }

    print_json(tracker.stats())
}
