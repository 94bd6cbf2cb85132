mod config;
pub mod keys;
pub mod migrations;
mod store;

pub use config::{
    ActivityConfig, Config, LoggingConfig, RolloverConfig, StorageConfig, TimerLoopConfig,
};
pub use store::Store;

use std::path::PathBuf;

use crate::error::ConfigError;

/// Returns the Studyflow data directory, creating it if needed.
///
/// Resolution order:
/// 1. `STUDYFLOW_DATA_DIR`, used verbatim.
/// 2. `~/.config/studyflow-dev/` when `STUDYFLOW_ENV=dev`.
/// 3. `~/.config/studyflow/`.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = match std::env::var_os("STUDYFLOW_DATA_DIR") {
        Some(dir) => PathBuf::from(dir),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("STUDYFLOW_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("studyflow-dev")
            } else {
                base_dir.join("studyflow")
            }
        }
    };

    std::fs::create_dir_all(&dir).map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
