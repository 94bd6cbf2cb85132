//! # Studyflow Core Library
//!
//! Business logic for the Studyflow study-session tracker. Every operation is
//! available through the standalone `studyflow` CLI, which is a thin layer
//! over this crate.
//!
//! ## Architecture
//!
//! - **Timer Engine**: a tick-driven focus/break state machine; the caller
//!   invokes `tick()` once per second while it runs
//! - **Stats / Activity / Achievements**: updated in that order whenever a
//!   focus session completes
//! - **Storage**: SQLite key-value persistence and TOML configuration
//! - **Runtime**: tokio tasks driving the tick loop and the daily rollover
//!
//! ## Key Components
//!
//! - [`StudyTracker`]: owns every component and runs the completion cascade
//! - [`TrackerBuilder`]: wires a tracker from a [`Store`] and a [`Clock`]
//! - [`TimerRuntime`]: async driver for a shared tracker
//! - [`Config`]: application configuration management

pub mod achievements;
pub mod activity;
pub mod clock;
pub mod error;
pub mod events;
pub mod runtime;
pub mod stats;
pub mod storage;
pub mod tasks;
pub mod timer;
pub mod tracker;

pub use achievements::{Achievement, AchievementCategory, AchievementEngine, DailyProgress, ProgressMetric};
pub use activity::{ActivityDay, ActivityLedger};
pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{ConfigError, CoreError, DatabaseError, Result, ValidationError};
pub use events::{Event, EventBus, SubscriberResult, Subscription};
pub use runtime::TimerRuntime;
pub use stats::{Level, StatsEngine, StatsSnapshot};
pub use storage::{Config, Store};
pub use tasks::{Task, TaskList};
pub use timer::{SessionKind, Technique, TimerConfig, TimerEngine, TimerPhase};
pub use tracker::{StudyTracker, TrackerBuilder};
