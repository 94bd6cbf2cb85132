use clap::Subcommand;
use studyflow_core::{Config, CoreError};

use super::{open_tracker, print_json, CmdResult};

#[derive(Subcommand)]
pub enum AchievementsAction {
    /// List every achievement with its progress
    List,
    /// Unlock an achievement
    Unlock { id: String },
    /// Overwrite an achievement's progress
    Progress { id: String, value: f64 },
}

pub fn run(action: AchievementsAction) -> CmdResult {
    let config = Config::load_or_default();
    let mut tracker = open_tracker(&config)?;

    let id = match action {
        AchievementsAction::List => return print_json(tracker.achievements()),
        AchievementsAction::Unlock { id } => {
            tracker.unlock_achievement(&id)?;
            id
        }
        AchievementsAction::Progress { id, value } => {
            tracker.update_achievement_progress(&id, value)?;
            id
        }
    };

    let achievement = tracker
        .achievements()
        .iter()
        .find(|a| a.id == id)
        .ok_or(CoreError::NotFound { kind: "achievement", id: id.clone() })?;
    print_json(achievement)
}
