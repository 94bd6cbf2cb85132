pub mod achievements;
pub mod activity;
pub mod config;
pub mod stats;
pub mod task;
pub mod timer;

use serde::Serialize;
use studyflow_core::{Config, Store, StudyTracker};

pub type CmdResult = Result<(), Box<dyn std::error::Error>>;

/// Open the store and hydrate a tracker. Building the tracker runs the
/// daily rollover check, so every invocation sees the current day.
pub fn open_tracker(config: &Config) -> Result<StudyTracker, Box<dyn std::error::Error>> {
    let store = Store::from_config(config)?;
    Ok(StudyTracker::builder().store(store).build()?)
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> CmdResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
