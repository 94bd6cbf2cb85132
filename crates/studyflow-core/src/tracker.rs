//! The study tracker: one owner for every stateful component.
//!
//! All mutations go through [`StudyTracker`]. A completed focus session is
//! propagated by a direct call chain inside [`StudyTracker::tick`]:
//!
//! ```text
//! daily rollover (if the clock crossed midnight)
//!   -> TimerEngine::tick -> SessionCompleted
//!   -> StatsEngine::complete_session
//!   -> ActivityLedger::record_session
//!   -> AchievementEngine::check_all(post-update stats)
//!   -> EventBus::publish (external observers)
//! ```
//!
//! Every committed change is written back to the [`Store`] before the
//! corresponding events are published.

use std::sync::Arc;

use chrono::NaiveDate;

use crate::achievements::{Achievement, AchievementEngine, DailyProgress};
use crate::activity::{ActivityDay, ActivityLedger};
use crate::clock::{Clock, SystemClock};
use crate::error::{CoreError, Result};
use crate::events::{Event, EventBus, SubscriberResult, Subscription};
use crate::stats::{StatsEngine, StatsSnapshot};
use crate::storage::{keys, Store};
use crate::tasks::{Task, TaskList};
use crate::timer::{Technique, TimerEngine};

/// Wires a [`StudyTracker`] from its collaborators.
///
/// The store is required. The clock defaults to [`SystemClock`] and daily
/// achievement progress to [`crate::achievements::NoDailyProgress`].
#[derive(Default)]
pub struct TrackerBuilder {
    store: Option<Store>,
    clock: Option<Arc<dyn Clock>>,
    daily_progress: Option<Box<dyn DailyProgress>>,
}

impl TrackerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn store(mut self, store: Store) -> Self {
        self.store = Some(store);
        self
    }

    pub fn clock<C: Clock + 'static>(mut self, clock: C) -> Self {
        self.clock = Some(Arc::new(clock));
        self
    }

    pub fn daily_progress<D: DailyProgress + 'static>(mut self, daily: D) -> Self {
        self.daily_progress = Some(Box::new(daily));
        self
    }

    /// Hydrate every component from the store and run the startup checks
    /// (daily rollover, then one achievement pass).
    ///
    /// # Errors
    /// Returns [`CoreError::MissingProvider`] if no store was supplied.
    pub fn build(self) -> Result<StudyTracker> {
        let store = self.store.ok_or(CoreError::MissingProvider("store"))?;
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let today = clock.today();

        let mut achievements = AchievementEngine::hydrate(&store);
        if let Some(daily) = self.daily_progress {
            achievements = achievements.with_daily_progress(daily);
        }

        let mut tracker = StudyTracker {
            timer: TimerEngine::hydrate(&store),
            stats: StatsEngine::hydrate(&store, today),
            ledger: ActivityLedger::hydrate(&store),
            achievements,
            tasks: TaskList::hydrate(&store),
            bus: EventBus::new(),
            store,
            clock,
        };

        tracker.check_daily_rollover();
        tracker.check_achievements();
        tracker.persist_all();
        tracing::debug!(namespace = tracker.store.namespace(), %today, "tracker ready");
        Ok(tracker)
    }
}

pub struct StudyTracker {
    store: Store,
    clock: Arc<dyn Clock>,
    timer: TimerEngine,
    stats: StatsEngine,
    ledger: ActivityLedger,
    achievements: AchievementEngine,
    tasks: TaskList,
    bus: EventBus,
}

impl std::fmt::Debug for StudyTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StudyTracker")
            .field("timer", &self.timer)
            .field("stats", &self.stats)
            .field("ledger", &self.ledger)
            .field("tasks", &self.tasks)
            .field("bus", &self.bus)
            .finish_non_exhaustive()
    }
}

impl StudyTracker {
    pub fn builder() -> TrackerBuilder {
        TrackerBuilder::new()
    }

    // ── Accessors ────────────────────────────────────────────────────

    pub fn timer(&self) -> &TimerEngine {
        &self.timer
    }

    pub fn stats(&self) -> &StatsSnapshot {
        self.stats.snapshot()
    }

    pub fn activity(&self) -> &ActivityLedger {
        &self.ledger
    }

    pub fn achievements(&self) -> &[Achievement] {
        self.achievements.all()
    }

    pub fn tasks(&self) -> &[Task] {
        self.tasks.all()
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    /// Current timer state as a `StateSnapshot` event.
    pub fn timer_snapshot(&self) -> Event {
        self.timer.snapshot()
    }

    // ── Observers ────────────────────────────────────────────────────

    pub fn subscribe<F>(&mut self, callback: F) -> Subscription
    where
        F: FnMut(&Event) -> SubscriberResult + Send + 'static,
    {
        self.bus.subscribe(callback)
    }

    pub fn on_session_complete<F>(&mut self, callback: F) -> Subscription
    where
        F: FnMut() -> SubscriberResult + Send + 'static,
    {
        self.bus.on_session_complete(callback)
    }

    pub fn unsubscribe(&mut self, handle: Subscription) -> bool {
        self.bus.unsubscribe(handle)
    }

    fn publish(&mut self, events: &[Event]) {
        for event in events {
            let failures = self.bus.publish(event);
            if failures > 0 {
                tracing::debug!(failures, "event delivered with subscriber failures");
            }
        }
    }

    // ── Timer ────────────────────────────────────────────────────────

    fn commit_timer(&mut self, event: Option<Event>) -> bool {
        let Some(event) = event else {
            return false;
        };
        self.timer.persist(&self.store);
        self.publish(std::slice::from_ref(&event));
        true
    }

    /// Returns `false` if the timer was already running.
    pub fn start_timer(&mut self) -> bool {
        let event = self.timer.start();
        if event.is_some() {
            tracing::info!(kind = ?self.timer.kind(), elapsed = self.timer.elapsed_secs(), "timer started");
        }
        self.commit_timer(event)
    }

    pub fn pause_timer(&mut self) -> bool {
        let event = self.timer.pause();
        if event.is_some() {
            tracing::info!(elapsed = self.timer.elapsed_secs(), "timer paused");
        }
        self.commit_timer(event)
    }

    pub fn reset_timer(&mut self) -> bool {
        let event = self.timer.reset();
        tracing::info!("timer reset");
        self.commit_timer(event)
    }

    pub fn skip_to_break(&mut self) -> bool {
        let event = self.timer.skip_to_break();
        if event.is_some() {
            tracing::info!("skipped to break");
        }
        self.commit_timer(event)
    }

    /// Advance the timer by one second and run the completion cascade.
    ///
    /// A pending day rollover is applied first, so a session finished after
    /// midnight is counted toward the new day. Returns every event produced,
    /// in publication order.
    pub fn tick(&mut self) -> Vec<Event> {
        if !self.timer.is_running() {
            return Vec::new();
        }

        let mut events = self.apply_rollover();
        for event in self.timer.tick() {
            let completed_minutes = match &event {
                Event::SessionCompleted { minutes, .. } => Some(*minutes),
                _ => None,
            };
            events.push(event);
            if let Some(minutes) = completed_minutes {
                events.extend(self.complete_session(minutes));
            }
        }
        self.timer.persist(&self.store);

        if !events.is_empty() {
            tracing::debug!(count = events.len(), "tick produced events");
        }
        self.publish(&events);
        events
    }

    fn complete_session(&mut self, minutes: u32) -> Vec<Event> {
        let today = self.clock.today();
        let mut events = Vec::new();

        events.extend(self.stats.complete_session(minutes));
        self.ledger.record_session(today, minutes);
        events.extend(self.achievements.check_all(self.stats.snapshot()));

        self.stats.persist(&self.store);
        self.ledger.persist(&self.store);
        self.achievements.persist(&self.store);

        let s = self.stats.snapshot();
        tracing::info!(
            minutes,
            total_sessions = s.total_sessions,
            sessions_today = s.sessions_today,
            "focus session completed"
        );
        events
    }

    pub fn update_focus_time(&mut self, minutes: u32) {
        self.timer.update_focus_time(minutes);
        self.timer.persist(&self.store);
    }

    pub fn update_break_time(&mut self, minutes: u32) {
        self.timer.update_break_time(minutes);
        self.timer.persist(&self.store);
    }

    pub fn update_target_sessions(&mut self, sessions: u32) {
        self.timer.update_target_sessions(sessions);
        self.timer.persist(&self.store);
    }

    pub fn set_timer_technique(&mut self, technique: Technique) {
        self.timer.set_technique(technique);
        self.timer.persist(&self.store);
        tracing::info!(%technique, "timer technique changed");
    }

    // ── Tasks ────────────────────────────────────────────────────────

    pub fn add_task(&mut self, text: &str) -> Result<Task> {
        let task = self.tasks.add(text, self.clock.now_ms())?.clone();
        self.tasks.persist(&self.store);
        Ok(task)
    }

    pub fn remove_task(&mut self, id: &str) -> Result<Task> {
        let task = self.tasks.remove(id)?;
        self.tasks.persist(&self.store);
        Ok(task)
    }

    pub fn toggle_task(&mut self, id: &str) -> Result<Task> {
        let task = self.tasks.toggle(id)?.clone();
        self.tasks.persist(&self.store);
        Ok(task)
    }

    pub fn update_task_priority(&mut self, id: &str, priority: i64) -> Result<Task> {
        let task = self.tasks.set_priority(id, priority)?.clone();
        self.tasks.persist(&self.store);
        Ok(task)
    }

    // ── Stats ────────────────────────────────────────────────────────

    pub fn update_daily_motivation(&mut self, text: &str) {
        self.stats.update_daily_motivation(text);
        self.store
            .save(keys::DAILY_MOTIVATION, &self.stats.snapshot().daily_motivation);
    }

    pub fn add_focus_tip(&mut self, tip: &str) {
        self.stats.add_focus_tip(tip);
        self.store
            .save(keys::FOCUS_TIPS, &self.stats.snapshot().focus_tips);
    }

    pub fn update_target_hours(&mut self, hours: u32) {
        self.stats.update_target_hours(hours);
        self.store
            .save(keys::TARGET_HOURS, &self.stats.snapshot().target_hours);
    }

    /// Start a new calendar day if the clock has moved past the last one.
    ///
    /// Clears the per-day counters, then keeps the streak alive if
    /// yesterday has recorded activity and breaks it otherwise. Runs at most
    /// once per day.
    pub fn check_daily_rollover(&mut self) -> Option<Event> {
        let events = self.apply_rollover();
        self.publish(&events);
        events.into_iter().next()
    }

    /// Rollover bookkeeping without publishing. Returns the `DailyRollover`
    /// event followed by any achievements it unlocked, or nothing if today
    /// was already started.
    fn apply_rollover(&mut self) -> Vec<Event> {
        let today = self.clock.today();
        if !self.stats.begin_day(today) {
            return Vec::new();
        }

        let yesterday = self.clock.yesterday();
        let streak_kept = self
            .ledger
            .get_activity_for_date(yesterday)
            .is_some_and(|day| day.intensity > 0);
        if streak_kept {
            self.stats.increment_streak();
        } else {
            self.stats.reset_streak();
        }
        self.stats.persist(&self.store);

        let streak = self.stats.snapshot().streak;
        tracing::info!(%today, streak, streak_kept, "daily rollover");

        let mut events = vec![Event::DailyRollover {
            date: today,
            streak,
            streak_kept,
        }];
        events.extend(self.check_achievements_quiet());
        events
    }

    /// Wipe all progress.
    ///
    /// Timer durations and technique survive; everything else in the store
    /// is removed and each component is rebuilt from defaults.
    pub fn reset_progress(&mut self) {
        let today = self.clock.today();
        match self.store.retain_only(&keys::RESET_EXCLUSIONS) {
            Ok(removed) => tracing::debug!(removed, "store keys cleared"),
            Err(e) => tracing::warn!(error = %e, "failed to clear store during reset"),
        }

        self.stats.reset_all_progress(today);
        self.ledger.clear();
        self.achievements.reset();
        self.tasks.clear();
        self.timer = TimerEngine::hydrate(&self.store);
        self.persist_all();

        tracing::info!("progress reset");
        self.publish(&[Event::ProgressReset {
            at: chrono::Utc::now(),
        }]);
    }

    // ── Achievements ─────────────────────────────────────────────────

    /// Progress moves even when nothing unlocks, so this always persists.
    fn check_achievements_quiet(&mut self) -> Vec<Event> {
        let events = self.achievements.check_all(self.stats.snapshot());
        self.achievements.persist(&self.store);
        events
    }

    /// Re-evaluate every locked achievement against the current stats.
    pub fn check_achievements(&mut self) -> Vec<Event> {
        let events = self.check_achievements_quiet();
        self.publish(&events);
        events
    }

    /// Returns `false` if it was already unlocked.
    pub fn unlock_achievement(&mut self, id: &str) -> Result<bool> {
        let event = self.achievements.unlock(id)?;
        self.achievements.persist(&self.store);
        Ok(self.publish_optional(event))
    }

    /// Returns `true` if this update unlocked the achievement.
    pub fn update_achievement_progress(&mut self, id: &str, progress: f64) -> Result<bool> {
        let event = self.achievements.update_progress(id, progress)?;
        self.achievements.persist(&self.store);
        Ok(self.publish_optional(event))
    }

    fn publish_optional(&mut self, event: Option<Event>) -> bool {
        match event {
            Some(event) => {
                self.publish(std::slice::from_ref(&event));
                true
            }
            None => false,
        }
    }

    // ── Activity ─────────────────────────────────────────────────────

    pub fn get_activity_for_date(&self, date: NaiveDate) -> Option<&ActivityDay> {
        self.ledger.get_activity_for_date(date)
    }

    /// The last `days` days ending today, capped at
    /// [`crate::activity::MAX_WINDOW_DAYS`].
    pub fn view_window(&self, days: u32) -> Vec<ActivityDay> {
        self.ledger.view_window(self.clock.today(), days)
    }

    fn persist_all(&self) {
        self.timer.persist(&self.store);
        self.stats.persist(&self.store);
        self.ledger.persist(&self.store);
        self.achievements.persist(&self.store);
        self.tasks.persist(&self.store);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use std::sync::Mutex;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    fn tracker_at(clock: &FixedClock) -> StudyTracker {
        StudyTracker::builder()
            .store(Store::open_memory("test").unwrap())
            .clock(clock.clone())
            .build()
            .unwrap()
    }

    fn complete_focus(tracker: &mut StudyTracker) -> Vec<Event> {
        tracker.start_timer();
        let secs = tracker.timer().duration_secs(crate::timer::SessionKind::Focus);
        (0..secs).flat_map(|_| tracker.tick()).collect()
    }

    #[test]
    fn build_without_store_fails() {
        let err = TrackerBuilder::new().build().unwrap_err();
        assert!(matches!(err, CoreError::MissingProvider("store")));
    }

    #[test]
    fn session_cascade_updates_every_component() {
        let clock = FixedClock::new(date(4));
        let mut tracker = tracker_at(&clock);
        tracker.update_focus_time(1);

        let events = complete_focus(&mut tracker);
        assert!(matches!(events[0], Event::PhaseCompleted { .. }));
        assert!(events[1].is_session_completed());
        assert!(events
            .iter()
            .any(|e| matches!(e, Event::AchievementUnlocked { id, .. } if id == "2")));

        assert_eq!(tracker.stats().total_sessions, 1);
        assert_eq!(tracker.get_activity_for_date(date(4)).unwrap().minutes, 1);
        assert!(tracker.timer().is_break());
    }

    #[test]
    fn observers_see_post_update_state_in_order() {
        let clock = FixedClock::new(date(4));
        let mut tracker = tracker_at(&clock);
        tracker.update_focus_time(1);

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        tracker.on_session_complete(move || {
            sink.lock().unwrap().push("first");
            Ok(())
        });
        tracker.on_session_complete(|| panic!("broken observer"));
        let sink = Arc::clone(&seen);
        let handle = tracker.on_session_complete(move || {
            sink.lock().unwrap().push("third");
            Ok(())
        });

        complete_focus(&mut tracker);
        assert_eq!(*seen.lock().unwrap(), vec!["first", "third"]);

        assert!(tracker.unsubscribe(handle));
        tracker.reset_timer();
        complete_focus(&mut tracker);
        assert_eq!(*seen.lock().unwrap(), vec!["first", "third", "first"]);
    }

    #[test]
    fn rollover_keeps_streak_after_active_day() {
        let clock = FixedClock::new(date(4));
        let mut tracker = tracker_at(&clock);
        tracker.update_focus_time(1);
        complete_focus(&mut tracker);

        clock.set_today(date(5));
        let event = tracker.check_daily_rollover();
        assert!(matches!(
            event,
            Some(Event::DailyRollover { streak: 1, streak_kept: true, .. })
        ));
        assert_eq!(tracker.stats().sessions_today, 0);
        assert!(tracker.check_daily_rollover().is_none());
    }

    #[test]
    fn rollover_breaks_streak_after_idle_day() {
        let clock = FixedClock::new(date(4));
        let mut tracker = tracker_at(&clock);
        tracker.update_focus_time(1);
        complete_focus(&mut tracker);
        clock.set_today(date(5));
        tracker.check_daily_rollover();

        clock.set_today(date(7));
        tracker.check_daily_rollover();
        assert_eq!(tracker.stats().streak, 0);
        assert_eq!(tracker.stats().best_streak, 1);
    }

    #[test]
    fn session_finished_after_midnight_counts_for_new_day() {
        let clock = FixedClock::new(date(4));
        let mut tracker = tracker_at(&clock);
        tracker.update_focus_time(1);
        tracker.start_timer();
        for _ in 0..59 {
            tracker.tick();
        }

        clock.set_today(date(5));
        let events = tracker.tick();
        assert!(matches!(events[0], Event::DailyRollover { streak_kept: false, .. }));
        assert!(events.iter().any(Event::is_session_completed));

        let stats = tracker.stats();
        assert_eq!(stats.sessions_today, 1);
        assert_eq!(stats.focused_time_today, 1);
        assert_eq!(stats.last_reset_date, date(5));
        assert!(tracker.get_activity_for_date(date(4)).is_none());
        assert_eq!(tracker.get_activity_for_date(date(5)).unwrap().minutes, 1);

        assert!(tracker.check_daily_rollover().is_none());
        assert_eq!(tracker.stats().sessions_today, 1);
    }

    #[test]
    fn rollover_persists_streak_progress_without_unlock() {
        let clock = FixedClock::new(date(4));
        let mut tracker = tracker_at(&clock);
        tracker.update_focus_time(1);
        complete_focus(&mut tracker);

        clock.set_today(date(5));
        tracker.check_daily_rollover();
        assert_eq!(tracker.stats().streak, 1);

        let stored = AchievementEngine::hydrate(tracker.store());
        let on_a_roll = stored.get("3").unwrap();
        assert!(!on_a_roll.unlocked);
        assert_eq!(on_a_roll.progress, 1.0);
    }

    #[test]
    fn reset_progress_keeps_timer_preferences() {
        let clock = FixedClock::new(date(4));
        let mut tracker = tracker_at(&clock);
        tracker.set_timer_technique(Technique::FiftyTwoSeventeen);
        tracker.add_task("Revise notes").unwrap();
        tracker.unlock_achievement("3").unwrap();
        tracker.update_focus_time(1);
        complete_focus(&mut tracker);

        tracker.reset_progress();
        assert_eq!(tracker.stats().total_sessions, 0);
        assert!(tracker.tasks().is_empty());
        assert!(tracker.activity().is_empty());
        assert!(tracker.achievements().iter().all(|a| !a.unlocked));
        assert_eq!(tracker.timer().config().focus_minutes, 1);
        assert_eq!(tracker.timer().config().break_minutes, 17);
        assert_eq!(tracker.timer().config().technique, Technique::FiftyTwoSeventeen);
        assert!(!tracker.timer().is_running());
    }

    #[test]
    fn state_survives_rebuild() {
        let clock = FixedClock::new(date(4));
        let store_path = tempfile::tempdir().unwrap();
        let db = store_path.path().join("studyflow.db");

        {
            let mut tracker = StudyTracker::builder()
                .store(Store::open(&db, "test").unwrap())
                .clock(clock.clone())
                .build()
                .unwrap();
            tracker.update_focus_time(1);
            complete_focus(&mut tracker);
            tracker.add_task("Flashcards").unwrap();
        }

        let tracker = StudyTracker::builder()
            .store(Store::open(&db, "test").unwrap())
            .clock(clock)
            .build()
            .unwrap();
        assert_eq!(tracker.stats().total_sessions, 1);
        assert_eq!(tracker.tasks().len(), 1);
        assert!(tracker.timer().is_break());
        assert_eq!(tracker.view_window(1)[0].minutes, 1);
    }
}
