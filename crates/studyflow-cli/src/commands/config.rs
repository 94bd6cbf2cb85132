use clap::Subcommand;
use studyflow_core::{Config, ConfigError};

use super::{print_json, CmdResult};

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Get a config value
    Get {
        /// Config key (e.g. "timer.tick_interval_ms", "logging.filter")
        key: String,
    },
    /// Set a config value
    Set {
        /// Config key
        key: String,
        /// New value
        value: String,
    },
    /// List all config values
    List,
    /// Reset config to defaults
    Reset,
}

pub fn run(action: ConfigAction) -> CmdResult {
    match action {
        ConfigAction::Get { key } => {
            let config = Config::load()?;
            let value = config.get(&key).ok_or(ConfigError::UnknownKey(key))?;
            println!("{value}");
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load()?;
            config.set(&key, &value)?;
            config.save()?;
            println!("ok");
        }
        ConfigAction::List => {
            let config = Config::load()?;
            print_json(&config)?;
        }
        ConfigAction::Reset => {
            Config::default().save()?;
            println!("config reset to defaults");
        }
    }
    Ok(())
}
