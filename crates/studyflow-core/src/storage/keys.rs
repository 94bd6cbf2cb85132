//! Store key names.
//!
//! These are the persisted names of every value the engines own. They are
//! camelCase, matching the established on-disk layout.

pub const TIMER_STATE: &str = "timerState";
pub const IS_BREAK: &str = "isBreak";
pub const ELAPSED_TIME: &str = "elapsedTime";
pub const FOCUS_TIME: &str = "focusTime";
pub const BREAK_TIME: &str = "breakTime";
pub const TARGET_SESSIONS: &str = "targetSessions";
pub const SESSIONS_COMPLETED: &str = "sessionsCompleted";
pub const TIMER_TECHNIQUE: &str = "timerTechnique";

pub const STREAK: &str = "streak";
pub const BEST_STREAK: &str = "bestStreak";
pub const SESSIONS_TODAY: &str = "sessionsToday";
pub const FOCUSED_TIME_TODAY: &str = "focusedTimeToday";
pub const TOTAL_SESSIONS: &str = "totalSessions";
pub const TOTAL_HOURS: &str = "totalHours";
pub const TOTAL_MINUTES: &str = "totalMinutes";
pub const TARGET_HOURS: &str = "targetHours";
pub const LEVEL: &str = "level";
pub const LEVEL_PROGRESS: &str = "levelProgress";
pub const LEVEL_MINUTES: &str = "levelMinutes";
pub const NEXT_LEVEL: &str = "nextLevel";
pub const HOURS_TO_NEXT_LEVEL: &str = "hoursToNextLevel";
pub const DAILY_MOTIVATION: &str = "dailyMotivation";
pub const FOCUS_TIPS: &str = "focusTips";
pub const LAST_LOGIN_DATE: &str = "lastLoginDate";

pub const ACHIEVEMENTS: &str = "achievements";
pub const ACTIVITY_DATA: &str = "activityData";
pub const TASKS: &str = "tasks";

/// User preferences that survive a full progress reset.
pub const RESET_EXCLUSIONS: [&str; 3] = [FOCUS_TIME, BREAK_TIME, TIMER_TECHNIQUE];
