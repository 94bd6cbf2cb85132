use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

pub const FOCUS_MINUTES: RangeInclusive<u32> = 1..=60;
pub const BREAK_MINUTES: RangeInclusive<u32> = 1..=30;
pub const TARGET_SESSIONS: RangeInclusive<u32> = 1..=10;

/// Named focus/break splits offered in settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Technique {
    /// 25 minutes focus, 5 minutes break, 4 sessions.
    #[default]
    #[serde(rename = "pomodoro")]
    Pomodoro,
    /// 52 minutes focus, 17 minutes break.
    #[serde(rename = "52-17")]
    FiftyTwoSeventeen,
    /// Whatever the user dialed in.
    #[serde(rename = "custom")]
    Custom,
}

impl Technique {
    pub fn as_str(&self) -> &'static str {
        match self {
            Technique::Pomodoro => "pomodoro",
            Technique::FiftyTwoSeventeen => "52-17",
            Technique::Custom => "custom",
        }
    }

    /// Preset (focus, break, target sessions). `None` fields are left alone.
    pub fn preset(&self) -> (Option<u32>, Option<u32>, Option<u32>) {
        match self {
            Technique::Pomodoro => (Some(25), Some(5), Some(4)),
            Technique::FiftyTwoSeventeen => (Some(52), Some(17), None),
            Technique::Custom => (None, None, None),
        }
    }
}

impl fmt::Display for Technique {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Technique {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pomodoro" => Ok(Technique::Pomodoro),
            "52-17" | "52/17" => Ok(Technique::FiftyTwoSeventeen),
            "custom" => Ok(Technique::Custom),
            other => Err(ValidationError::InvalidValue {
                field: "technique".into(),
                message: format!("unknown technique '{other}' (expected pomodoro, 52-17 or custom)"),
            }),
        }
    }
}

/// User timer preferences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerConfig {
    pub focus_minutes: u32,
    pub break_minutes: u32,
    pub target_sessions: u32,
    pub technique: Technique,
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            focus_minutes: 25,
            break_minutes: 5,
            target_sessions: 4,
            technique: Technique::Pomodoro,
        }
    }
}

impl TimerConfig {
    /// Bring every field back into its allowed range.
    pub fn clamped(self) -> Self {
        Self {
            focus_minutes: clamp_to(self.focus_minutes, &FOCUS_MINUTES),
            break_minutes: clamp_to(self.break_minutes, &BREAK_MINUTES),
            target_sessions: clamp_to(self.target_sessions, &TARGET_SESSIONS),
            technique: self.technique,
        }
    }
}

pub(crate) fn clamp_to(value: u32, range: &RangeInclusive<u32>) -> u32 {
    value.clamp(*range.start(), *range.end())
}
