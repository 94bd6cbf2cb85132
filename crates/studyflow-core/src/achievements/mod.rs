//! Achievement catalog and unlock tracking.
//!
//! Definitions are fixed in [`catalog`]. Only `progress` and `unlocked` are
//! user state; they are persisted as part of the full list and overlaid onto
//! the catalog by id when hydrating, so catalog text changes take effect on
//! existing installs.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::events::Event;
use crate::stats::StatsSnapshot;
use crate::storage::{keys, Store};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AchievementCategory {
    Daily,
    Streak,
    CumulativeProgress,
}

/// The quantity an achievement's progress is measured in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressMetric {
    StreakDays,
    TotalSessions,
    FocusHours,
    /// Days on which a per-day goal was met.
    QualifyingDays,
}

impl ProgressMetric {
    /// The category an achievement measured in this metric belongs to.
    pub fn category(self) -> AchievementCategory {
        match self {
            Self::StreakDays => AchievementCategory::Streak,
            Self::TotalSessions | Self::FocusHours => AchievementCategory::CumulativeProgress,
            Self::QualifyingDays => AchievementCategory::Daily,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Achievement {
    pub id: String,
    pub title: String,
    pub description: String,
    pub category: AchievementCategory,
    pub metric: ProgressMetric,
    pub unlocked: bool,
    pub progress: f64,
    pub target: u32,
}

impl Achievement {
    fn new(
        id: &str,
        title: &str,
        description: &str,
        category: AchievementCategory,
        metric: ProgressMetric,
        target: u32,
    ) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            description: description.to_string(),
            category,
            metric,
            unlocked: false,
            progress: 0.0,
            target,
        }
    }

    fn target_f64(&self) -> f64 {
        f64::from(self.target)
    }

    /// Set progress, unlocking when the target is reached.
    ///
    /// Returns `true` if this call unlocked the achievement.
    fn set_progress(&mut self, value: f64) -> bool {
        let value = if value.is_finite() { value.max(0.0) } else { 0.0 };
        let was_unlocked = self.unlocked;
        self.unlocked = was_unlocked || value >= self.target_f64();
        self.progress = if self.unlocked {
            value.max(self.target_f64())
        } else {
            value
        };
        self.unlocked && !was_unlocked
    }

    fn unlocked_event(&self) -> Event {
        Event::AchievementUnlocked {
            id: self.id.clone(),
            title: self.title.clone(),
        }
    }
}

/// The built-in achievement definitions, all locked with zero progress.
pub fn catalog() -> Vec<Achievement> {
    use AchievementCategory::*;
    use ProgressMetric::*;

    vec![
        Achievement::new(
            "1",
            "Academic Comeback",
            "Complete 3 sessions every day for 5 days",
            Daily,
            QualifyingDays,
            5,
        ),
        Achievement::new(
            "2",
            "First Steps",
            "Complete your first focus session",
            CumulativeProgress,
            TotalSessions,
            1,
        ),
        Achievement::new("3", "On a Roll", "Study 7 days in a row", Streak, StreakDays, 7),
        Achievement::new(
            "4",
            "Deep Diver",
            "Focus for 10 hours in total",
            CumulativeProgress,
            FocusHours,
            10,
        ),
        Achievement::new(
            "5",
            "Centurion",
            "Complete 100 focus sessions",
            CumulativeProgress,
            TotalSessions,
            100,
        ),
        Achievement::new(
            "6",
            "Month of Mastery",
            "Study 30 days in a row",
            Streak,
            StreakDays,
            30,
        ),
        Achievement::new(
            "7",
            "Marathon Mind",
            "Focus for 100 hours in total",
            CumulativeProgress,
            FocusHours,
            100,
        ),
    ]
}

/// Progress source for [`AchievementCategory::Daily`] achievements.
///
/// Returning `None` leaves the achievement untouched.
pub trait DailyProgress: Send + Sync {
    fn progress(&self, achievement: &Achievement, stats: &StatsSnapshot) -> Option<f64>;
}

/// Reports nothing, so daily achievements only move through explicit
/// `unlock`/`update_progress` calls.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDailyProgress;

impl DailyProgress for NoDailyProgress {
    fn progress(&self, _achievement: &Achievement, _stats: &StatsSnapshot) -> Option<f64> {
        None
    }
}

/// Persisted per-achievement state. Unknown fields are ignored.
#[derive(Debug, Deserialize)]
struct StoredProgress {
    id: String,
    #[serde(default)]
    unlocked: bool,
    #[serde(default)]
    progress: f64,
}

pub struct AchievementEngine {
    achievements: Vec<Achievement>,
    daily: Box<dyn DailyProgress>,
}

impl std::fmt::Debug for AchievementEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AchievementEngine")
            .field("achievements", &self.achievements)
            .finish_non_exhaustive()
    }
}

impl Default for AchievementEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl AchievementEngine {
    pub fn new() -> Self {
        Self {
            achievements: catalog(),
            daily: Box::new(NoDailyProgress),
        }
    }

    pub fn with_daily_progress(mut self, daily: Box<dyn DailyProgress>) -> Self {
        self.daily = daily;
        self
    }

    pub fn hydrate(store: &Store) -> Self {
        let mut engine = Self::new();
        let stored: Vec<StoredProgress> = store.load(keys::ACHIEVEMENTS, Vec::new());
        for record in stored {
            let Some(achievement) = engine.find_mut(&record.id) else {
                tracing::debug!(id = %record.id, "ignoring stored progress for unknown achievement");
                continue;
            };
            achievement.unlocked = record.unlocked;
            achievement.set_progress(record.progress);
        }
        engine
    }

    pub fn persist(&self, store: &Store) {
        store.save(keys::ACHIEVEMENTS, &self.achievements);
    }

    pub fn all(&self) -> &[Achievement] {
        &self.achievements
    }

    pub fn get(&self, id: &str) -> Option<&Achievement> {
        self.achievements.iter().find(|a| a.id == id)
    }

    fn find_mut(&mut self, id: &str) -> Option<&mut Achievement> {
        self.achievements.iter_mut().find(|a| a.id == id)
    }

    fn require_mut(&mut self, id: &str) -> Result<&mut Achievement> {
        self.find_mut(id).ok_or_else(|| CoreError::NotFound {
            kind: "achievement",
            id: id.to_string(),
        })
    }

    /// Refresh progress of every locked achievement from `stats`.
    ///
    /// Returns one `AchievementUnlocked` event per newly unlocked entry.
    pub fn check_all(&mut self, stats: &StatsSnapshot) -> Vec<Event> {
        let mut events = Vec::new();
        for i in 0..self.achievements.len() {
            if self.achievements[i].unlocked {
                continue;
            }
            // Progress is read from the metric; the category is display grouping.
            let value = match self.achievements[i].metric {
                ProgressMetric::StreakDays => Some(f64::from(stats.streak)),
                ProgressMetric::TotalSessions => Some(stats.total_sessions as f64),
                ProgressMetric::FocusHours => Some(stats.total_hours_f64()),
                ProgressMetric::QualifyingDays => {
                    self.daily.progress(&self.achievements[i], stats)
                }
            };

            let Some(value) = value else { continue };
            let achievement = &mut self.achievements[i];
            if achievement.set_progress(value) {
                tracing::info!(id = %achievement.id, title = %achievement.title, "achievement unlocked");
                events.push(achievement.unlocked_event());
            }
        }
        events
    }

    /// Unlock unconditionally. Progress is raised to the target.
    ///
    /// Returns the unlock event, or `None` if it was already unlocked.
    pub fn unlock(&mut self, id: &str) -> Result<Option<Event>> {
        let achievement = self.require_mut(id)?;
        if achievement.unlocked {
            return Ok(None);
        }
        achievement.unlocked = true;
        achievement.progress = achievement.progress.max(achievement.target_f64());
        tracing::info!(id = %achievement.id, "achievement unlocked manually");
        Ok(Some(achievement.unlocked_event()))
    }

    /// Overwrite progress. Reaching the target unlocks; nothing relocks.
    pub fn update_progress(&mut self, id: &str, value: f64) -> Result<Option<Event>> {
        let achievement = self.require_mut(id)?;
        Ok(achievement
            .set_progress(value)
            .then(|| achievement.unlocked_event()))
    }

    /// Back to the pristine catalog.
    pub fn reset(&mut self) {
        self.achievements = catalog();
    }
}
