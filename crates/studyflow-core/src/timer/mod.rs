mod config;
mod engine;

pub use config::{Technique, TimerConfig, BREAK_MINUTES, FOCUS_MINUTES, TARGET_SESSIONS};
pub use engine::{SessionKind, TimerEngine, TimerPhase};
