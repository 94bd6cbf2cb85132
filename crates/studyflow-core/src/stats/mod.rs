//! Cumulative study statistics, level progress and streak bookkeeping.
//!
//! `complete_session` is the only write path driven by the timer. Streak
//! changes come from the daily rollover, which the tracker runs because it
//! needs the activity ledger's record for yesterday.

mod level;

pub use level::{level_name, next_level_name, Level, LEVEL_NAMES};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::events::Event;
use crate::storage::{keys, Store};

pub const DEFAULT_MOTIVATION: &str = "Focus on the process, not just the outcome";
pub const DEFAULT_TARGET_HOURS: u32 = 200;
const BASE_HOURS_TO_NEXT_LEVEL: u32 = 10;

pub fn default_focus_tips() -> Vec<String> {
    vec![
        "Take a 2-minute break every 25 minutes to maintain peak focus".to_string(),
        "Stay hydrated and keep a water bottle at your desk".to_string(),
    ]
}

/// Published view of the stats engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub streak: u32,
    pub best_streak: u32,
    pub sessions_today: u32,
    /// Minutes focused today.
    pub focused_time_today: u32,
    pub total_sessions: u64,
    pub total_hours: u64,
    /// Always below 60; overflow is carried into `total_hours`.
    pub total_minutes: u32,
    pub target_hours: u32,
    pub level: Level,
    /// Percent toward the next level, in `[0, 100)`. Derived from
    /// `level_minutes`.
    pub level_progress: f64,
    /// Focused minutes accumulated within the current level.
    pub level_minutes: u32,
    pub next_level: String,
    pub hours_to_next_level: u32,
    pub last_reset_date: NaiveDate,
    pub daily_motivation: String,
    pub focus_tips: Vec<String>,
}

impl StatsSnapshot {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            streak: 0,
            best_streak: 0,
            sessions_today: 0,
            focused_time_today: 0,
            total_sessions: 0,
            total_hours: 0,
            total_minutes: 0,
            target_hours: DEFAULT_TARGET_HOURS,
            level: Level::default(),
            level_progress: 0.0,
            level_minutes: 0,
            next_level: next_level_name(1),
            hours_to_next_level: BASE_HOURS_TO_NEXT_LEVEL,
            last_reset_date: today,
            daily_motivation: DEFAULT_MOTIVATION.to_string(),
            focus_tips: default_focus_tips(),
        }
    }

    /// Total focused time as fractional hours.
    pub fn total_hours_f64(&self) -> f64 {
        self.total_hours as f64 + self.total_minutes as f64 / 60.0
    }

    /// Minutes needed to complete the current level.
    pub fn level_threshold_minutes(&self) -> u32 {
        self.hours_to_next_level.max(1).saturating_mul(60)
    }
}

fn progress_percent(level_minutes: u32, threshold_minutes: u32) -> f64 {
    f64::from(level_minutes) * 100.0 / f64::from(threshold_minutes.max(1))
}

#[derive(Debug, Clone)]
pub struct StatsEngine {
    state: StatsSnapshot,
}

impl StatsEngine {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            state: StatsSnapshot::new(today),
        }
    }

    /// Restore from the store. Out-of-range values are repaired so the
    /// published invariants hold even for hand-edited data.
    pub fn hydrate(store: &Store, today: NaiveDate) -> Self {
        let d = StatsSnapshot::new(today);
        let streak: u32 = store.load(keys::STREAK, d.streak);
        let best_streak: u32 = store.load(keys::BEST_STREAK, d.best_streak);
        let total_hours: u64 = store.load(keys::TOTAL_HOURS, d.total_hours);
        let total_minutes: u32 = store.load(keys::TOTAL_MINUTES, d.total_minutes);
        let level_progress: f64 = store.load(keys::LEVEL_PROGRESS, d.level_progress);
        let hours_to_next_level: u32 = store
            .load(keys::HOURS_TO_NEXT_LEVEL, d.hours_to_next_level)
            .max(1);
        let threshold = hours_to_next_level.saturating_mul(60);

        // Older data only carries the percentage; recover whole minutes from it.
        let derived_minutes = if level_progress.is_finite() {
            (level_progress.clamp(0.0, 100.0) / 100.0 * f64::from(threshold)).round() as u32
        } else {
            0
        };
        let level_minutes: u32 = store
            .load(keys::LEVEL_MINUTES, derived_minutes)
            .min(threshold - 1);
        let target_hours: u32 = store.load(keys::TARGET_HOURS, d.target_hours);

        let mut level: Level = store.load(keys::LEVEL, d.level);
        level.number = level.number.max(1);

        Self {
            state: StatsSnapshot {
                streak,
                best_streak: best_streak.max(streak),
                sessions_today: store.load(keys::SESSIONS_TODAY, d.sessions_today),
                focused_time_today: store.load(keys::FOCUSED_TIME_TODAY, d.focused_time_today),
                total_sessions: store.load(keys::TOTAL_SESSIONS, d.total_sessions),
                total_hours: total_hours + u64::from(total_minutes / 60),
                total_minutes: total_minutes % 60,
                target_hours: if target_hours == 0 { DEFAULT_TARGET_HOURS } else { target_hours },
                level,
                level_progress: progress_percent(level_minutes, threshold),
                level_minutes,
                next_level: store.load(keys::NEXT_LEVEL, d.next_level),
                hours_to_next_level,
                last_reset_date: store.load(keys::LAST_LOGIN_DATE, d.last_reset_date),
                daily_motivation: store.load(keys::DAILY_MOTIVATION, d.daily_motivation),
                focus_tips: store.load(keys::FOCUS_TIPS, d.focus_tips),
            },
        }
    }

    pub fn persist(&self, store: &Store) {
        let s = &self.state;
        store.save(keys::STREAK, &s.streak);
        store.save(keys::BEST_STREAK, &s.best_streak);
        store.save(keys::SESSIONS_TODAY, &s.sessions_today);
        store.save(keys::FOCUSED_TIME_TODAY, &s.focused_time_today);
        store.save(keys::TOTAL_SESSIONS, &s.total_sessions);
        store.save(keys::TOTAL_HOURS, &s.total_hours);
        store.save(keys::TOTAL_MINUTES, &s.total_minutes);
        store.save(keys::TARGET_HOURS, &s.target_hours);
        store.save(keys::LEVEL, &s.level);
        store.save(keys::LEVEL_PROGRESS, &s.level_progress);
        store.save(keys::LEVEL_MINUTES, &s.level_minutes);
        store.save(keys::NEXT_LEVEL, &s.next_level);
        store.save(keys::HOURS_TO_NEXT_LEVEL, &s.hours_to_next_level);
        store.save(keys::LAST_LOGIN_DATE, &s.last_reset_date);
        store.save(keys::DAILY_MOTIVATION, &s.daily_motivation);
        store.save(keys::FOCUS_TIPS, &s.focus_tips);
    }

    pub fn snapshot(&self) -> &StatsSnapshot {
        &self.state
    }

    /// Record one completed focus session of `minutes` length.
    ///
    /// Returns a `LevelUp` event when the session pushed progress to 100%.
    /// A single crossing yields a single level; surplus progress is dropped.
    /// Progress is counted in whole minutes so the threshold is exact.
    pub fn complete_session(&mut self, minutes: u32) -> Option<Event> {
        let s = &mut self.state;
        s.sessions_today += 1;
        s.focused_time_today += minutes;
        s.total_sessions += 1;

        let total_minutes = s.total_minutes + minutes;
        s.total_hours += u64::from(total_minutes / 60);
        s.total_minutes = total_minutes % 60;

        let threshold = s.level_threshold_minutes();
        let level_minutes = s.level_minutes.saturating_add(minutes);

        if level_minutes >= threshold {
            self.level_up();
            let s = &self.state;
            tracing::info!(level = s.level.number, name = %s.level.name, "level up");
            Some(Event::LevelUp {
                level: s.level.clone(),
                next_level: s.next_level.clone(),
                hours_to_next_level: s.hours_to_next_level,
            })
        } else {
            s.level_minutes = level_minutes;
            s.level_progress = progress_percent(level_minutes, threshold);
            None
        }
    }

    fn level_up(&mut self) {
        let s = &mut self.state;
        let number = s.level.number + 1;
        s.level = Level {
            name: level_name(number),
            number,
        };
        s.next_level = next_level_name(number);
        s.hours_to_next_level = BASE_HOURS_TO_NEXT_LEVEL * (number + 1);
        s.level_progress = 0.0;
        s.level_minutes = 0;
    }

    pub fn increment_streak(&mut self) {
        let s = &mut self.state;
        s.streak += 1;
        s.best_streak = s.best_streak.max(s.streak);
    }

    pub fn reset_streak(&mut self) {
        self.state.streak = 0;
    }

    /// Whether `today` is a new calendar day relative to the last reset.
    pub fn needs_rollover(&self, today: NaiveDate) -> bool {
        self.state.last_reset_date != today
    }

    /// Clear the per-day counters and stamp `today`.
    ///
    /// Returns `false` (and changes nothing) if `today` was already stamped.
    pub fn begin_day(&mut self, today: NaiveDate) -> bool {
        if !self.needs_rollover(today) {
            return false;
        }
        let s = &mut self.state;
        s.sessions_today = 0;
        s.focused_time_today = 0;
        s.last_reset_date = today;
        true
    }

    /// Zero all progress. Motivation text and tips are kept.
    pub fn reset_all_progress(&mut self, today: NaiveDate) {
        let fresh = StatsSnapshot::new(today);
        let s = &mut self.state;
        *s = StatsSnapshot {
            target_hours: s.target_hours,
            daily_motivation: std::mem::take(&mut s.daily_motivation),
            focus_tips: std::mem::take(&mut s.focus_tips),
            ..fresh
        };
    }

    pub fn update_daily_motivation(&mut self, text: &str) {
        self.state.daily_motivation = text.trim().to_string();
    }

    pub fn add_focus_tip(&mut self, tip: &str) {
        let tip = tip.trim();
        if !tip.is_empty() {
            self.state.focus_tips.push(tip.to_string());
        }
    }

    pub fn update_target_hours(&mut self, hours: u32) {
        self.state.target_hours = hours.max(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, d).unwrap()
    }

    #[test]
    fn complete_session_rolls_minutes_into_hours() {
        let mut stats = StatsEngine::new(day(1));
        stats.complete_session(50);
        stats.complete_session(25);
        let s = stats.snapshot();
        assert_eq!(s.total_sessions, 2);
        assert_eq!(s.sessions_today, 2);
        assert_eq!(s.focused_time_today, 75);
        assert_eq!(s.total_hours, 1);
        assert_eq!(s.total_minutes, 15);
    }

    #[test]
    fn progress_carries_between_sessions() {
        let mut stats = StatsEngine::new(day(1));
        // 60 minutes of a 10 hour level = 10%.
        stats.complete_session(60);
        assert!((stats.snapshot().level_progress - 10.0).abs() < 1e-9);
        stats.complete_session(30);
        assert!((stats.snapshot().level_progress - 15.0).abs() < 1e-9);
    }

    #[test]
    fn exact_threshold_levels_up_once() {
        let mut stats = StatsEngine::new(day(1));
        for _ in 0..9 {
            assert!(stats.complete_session(60).is_none());
        }
        let event = stats.complete_session(60);
        assert!(matches!(event, Some(Event::LevelUp { .. })));

        let s = stats.snapshot();
        assert_eq!(s.level, Level { name: "Silver".into(), number: 2 });
        assert_eq!(s.next_level, "Gold");
        assert_eq!(s.hours_to_next_level, 30);
        assert_eq!(s.level_progress, 0.0);
    }

    #[test]
    fn uneven_session_lengths_level_up_exactly_at_threshold() {
        // 12 * 50 and 30 * 20 land exactly on 600 minutes; 86 * 7 passes it.
        for (minutes, sessions) in [(50u32, 12usize), (20, 30), (7, 86)] {
            let mut stats = StatsEngine::new(day(1));
            let ups: Vec<usize> = (1..=sessions)
                .filter(|_| stats.complete_session(minutes).is_some())
                .collect();
            assert_eq!(ups, vec![sessions], "{minutes}-minute sessions");

            let s = stats.snapshot();
            assert_eq!(s.level.number, 2);
            assert_eq!(s.level_minutes, 0);
            assert_eq!(s.level_progress, 0.0);
        }
    }

    #[test]
    fn hydrate_recovers_minutes_from_percentage() {
        let store = Store::open_memory("test").unwrap();
        store.save(keys::LEVEL_PROGRESS, &50.0f64);
        let stats = StatsEngine::hydrate(&store, day(1));
        assert_eq!(stats.snapshot().level_minutes, 300);
        assert_eq!(stats.snapshot().level_progress, 50.0);
    }

    #[test]
    fn oversized_session_still_levels_up_once() {
        let mut stats = StatsEngine::new(day(1));
        // 60 hours in a single call is far past the 10 hour threshold.
        stats.complete_session(60 * 60);
        assert_eq!(stats.snapshot().level.number, 2);
        assert_eq!(stats.snapshot().level_progress, 0.0);
    }

    #[test]
    fn streak_tracks_best() {
        let mut stats = StatsEngine::new(day(1));
        stats.increment_streak();
        stats.increment_streak();
        stats.reset_streak();
        stats.increment_streak();
        assert_eq!(stats.snapshot().streak, 1);
        assert_eq!(stats.snapshot().best_streak, 2);
    }

    #[test]
    fn begin_day_runs_once_per_date() {
        let mut stats = StatsEngine::new(day(1));
        stats.complete_session(25);
        assert!(!stats.begin_day(day(1)));
        assert_eq!(stats.snapshot().sessions_today, 1);

        assert!(stats.begin_day(day(2)));
        assert_eq!(stats.snapshot().sessions_today, 0);
        assert_eq!(stats.snapshot().focused_time_today, 0);
        assert_eq!(stats.snapshot().total_sessions, 1);
        assert!(!stats.begin_day(day(2)));
    }

    #[test]
    fn reset_all_progress_restores_defaults_but_keeps_motivation() {
        let mut stats = StatsEngine::new(day(1));
        for _ in 0..10 {
            stats.complete_session(60);
        }
        for _ in 0..5 {
            stats.increment_streak();
        }
        stats.update_daily_motivation("Keep going");

        stats.reset_all_progress(day(3));
        let s = stats.snapshot();
        assert_eq!(s.total_sessions, 0);
        assert_eq!(s.streak, 0);
        assert_eq!(s.best_streak, 0);
        assert_eq!(s.level, Level::default());
        assert_eq!(s.next_level, "Silver");
        assert_eq!(s.hours_to_next_level, 10);
        assert_eq!(s.daily_motivation, "Keep going");
        assert_eq!(s.last_reset_date, day(3));
    }

    #[test]
    fn hydrate_repairs_inconsistent_values() {
        let store = Store::open_memory("test").unwrap();
        store.save(keys::STREAK, &7u32);
        store.save(keys::BEST_STREAK, &3u32);
        store.save(keys::TOTAL_HOURS, &2u64);
        store.save(keys::TOTAL_MINUTES, &130u32);
        store.save(keys::TARGET_HOURS, &0u32);

        let s = StatsEngine::hydrate(&store, day(1)).snapshot().clone();
        assert_eq!(s.best_streak, 7);
        assert_eq!(s.total_hours, 4);
        assert_eq!(s.total_minutes, 10);
        assert_eq!(s.target_hours, DEFAULT_TARGET_HOURS);
    }

    #[test]
    fn persist_and_hydrate_roundtrip() {
        let store = Store::open_memory("test").unwrap();
        let mut stats = StatsEngine::new(day(1));
        stats.complete_session(95);
        stats.increment_streak();
        stats.persist(&store);

        let restored = StatsEngine::hydrate(&store, day(9));
        assert_eq!(restored.snapshot(), stats.snapshot());
    }

    proptest! {
        #[test]
        fn minutes_are_conserved(sessions in proptest::collection::vec(0u32..=600, 0..60)) {
            let mut stats = StatsEngine::new(day(1));
            let mut sum: u64 = 0;
            for m in &sessions {
                stats.complete_session(*m);
                sum += u64::from(*m);
                let s = stats.snapshot();
                prop_assert!(s.total_minutes < 60);
                prop_assert!(s.level_progress >= 0.0 && s.level_progress < 100.0);
            }
            let s = stats.snapshot();
            prop_assert_eq!(s.total_hours * 60 + u64::from(s.total_minutes), sum);
            prop_assert_eq!(s.total_sessions, sessions.len() as u64);
        }

        #[test]
        fn best_streak_never_trails(ops in proptest::collection::vec(any::<bool>(), 0..200)) {
            let mut stats = StatsEngine::new(day(1));
            for increment in ops {
                if increment {
                    stats.increment_streak();
                } else {
                    stats.reset_streak();
                }
                prop_assert!(stats.snapshot().best_streak >= stats.snapshot().streak);
            }
        }
    }
}
