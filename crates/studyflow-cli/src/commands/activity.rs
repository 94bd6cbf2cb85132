use chrono::NaiveDate;
use clap::Subcommand;
use studyflow_core::Config;

use super::{open_tracker, print_json, CmdResult};

#[derive(Subcommand)]
pub enum ActivityAction {
    /// Print the last N days, ending today
    Window {
        /// Number of days (defaults to `activity.default_window_days`)
        #[arg(long)]
        days: Option<u32>,
    },
    /// Print the record for one date, or null
    Date {
        /// Date as YYYY-MM-DD
        date: NaiveDate,
    },
}

pub fn run(action: ActivityAction) -> CmdResult {
    let config = Config::load_or_default();
    let tracker = open_tracker(&config)?;

    match action {
        ActivityAction::Window { days } => {
            let days = days.unwrap_or(config.activity.default_window_days);
            print_json(&tracker.view_window(days))
        }
        ActivityAction::Date { date } => print_json(&tracker.get_activity_for_date(date)),
    }
}
