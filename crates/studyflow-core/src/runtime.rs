//! Async driver for the tracker: the 1 Hz tick task and the rollover poll.
//!
//! The tracker lives behind a `tokio::sync::Mutex`. The tick task and user
//! commands each take the lock and run to completion, so a tick never
//! interleaves with a command. Pausing or resetting aborts the tick task
//! immediately; the task also exits on its own on the first tick where the
//! timer is no longer running.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};

use crate::storage::Config;
use crate::tracker::StudyTracker;

#[derive(Clone)]
pub struct TimerRuntime {
    tracker: Arc<Mutex<StudyTracker>>,
    ticker: Arc<Mutex<Option<JoinHandle<()>>>>,
    running: Arc<watch::Sender<bool>>,
    tick_interval: Duration,
    rollover_interval: Duration,
}

impl TimerRuntime {
    pub fn new(tracker: StudyTracker, config: &Config) -> Self {
        let running = tracker.timer().is_running();
        Self {
            tracker: Arc::new(Mutex::new(tracker)),
            ticker: Arc::new(Mutex::new(None)),
            running: Arc::new(watch::Sender::new(running)),
            tick_interval: Duration::from_millis(config.timer.tick_interval_ms.max(1)),
            rollover_interval: Duration::from_secs(config.rollover.poll_interval_secs.max(1)),
        }
    }

    /// Shared handle to the tracker for commands and queries.
    pub fn tracker(&self) -> Arc<Mutex<StudyTracker>> {
        Arc::clone(&self.tracker)
    }

    /// Start (or resume) the timer and make sure the tick task is alive.
    ///
    /// Returns `false` if the timer was already running.
    pub async fn start(&self) -> bool {
        let started = {
            let mut tracker = self.tracker.lock().await;
            let started = tracker.start_timer();
            self.running.send_replace(true);
            started
        };
        self.spawn_ticker(started).await;
        started
    }

    pub async fn pause(&self) -> bool {
        let paused = self.tracker.lock().await.pause_timer();
        self.cancel_ticker().await;
        paused
    }

    pub async fn reset(&self) -> bool {
        let reset = self.tracker.lock().await.reset_timer();
        self.cancel_ticker().await;
        reset
    }

    pub async fn skip_to_break(&self) -> bool {
        self.tracker.lock().await.skip_to_break()
    }

    /// Resolves once the timer is Idle or Paused.
    pub async fn wait_idle(&self) {
        let mut rx = self.running.subscribe();
        // The sender lives in `self`, so the channel cannot close here.
        let _ = rx.wait_for(|running| !*running).await;
    }

    /// Poll for a calendar-day change every `rollover.poll_interval_secs`.
    pub fn spawn_rollover_poll(&self) -> JoinHandle<()> {
        let tracker = Arc::clone(&self.tracker);
        let period = self.rollover_interval;
        tokio::spawn(async move {
            let mut interval = time::interval_at(Instant::now() + period, period);
            loop {
                interval.tick().await;
                if let Some(event) = tracker.lock().await.check_daily_rollover() {
                    tracing::debug!(?event, "rollover poll applied");
                }
            }
        })
    }

    /// With `restart`, any previous tick task is aborted first; otherwise a
    /// live task is left alone.
    async fn spawn_ticker(&self, restart: bool) {
        let mut ticker_guard = self.ticker.lock().await;
        match ticker_guard.take() {
            Some(handle) if !restart && !handle.is_finished() => {
                *ticker_guard = Some(handle);
                return;
            }
            Some(handle) => handle.abort(),
            None => {}
        }

        let tracker = Arc::clone(&self.tracker);
        let running = Arc::clone(&self.running);
        let period = self.tick_interval;

        let handle = tokio::spawn(async move {
            // First tick lands one period after start, not immediately.
            let mut interval = time::interval_at(Instant::now() + period, period);
            loop {
                interval.tick().await;
                let mut guard = tracker.lock().await;
                if guard.timer().is_running() {
                    guard.tick();
                }
                if !guard.timer().is_running() {
                    // Published under the lock so a concurrent start() wins.
                    running.send_replace(false);
                    break;
                }
            }
            tracing::debug!("tick task finished");
        });

        *ticker_guard = Some(handle);
    }

    async fn cancel_ticker(&self) {
        if let Some(handle) = self.ticker.lock().await.take() {
            handle.abort();
        }
        self.running.send_replace(false);
    }

    /// Stop the tick task without touching timer state.
    pub async fn shutdown(&self) {
        self.cancel_ticker().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::storage::Store;
    use crate::timer::TimerPhase;
    use chrono::NaiveDate;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 9, d).unwrap()
    }

    fn runtime(clock: &FixedClock) -> TimerRuntime {
        let mut tracker = StudyTracker::builder()
            .store(Store::open_memory("test").unwrap())
            .clock(clock.clone())
            .build()
            .unwrap();
        tracker.update_focus_time(1);
        tracker.update_break_time(1);
        TimerRuntime::new(tracker, &Config::default())
    }

    #[tokio::test(start_paused = true)]
    async fn runs_focus_and_break_to_idle() {
        let rt = runtime(&FixedClock::new(date(2)));
        assert!(rt.start().await);
        rt.wait_idle().await;

        let tracker = rt.tracker();
        let tracker = tracker.lock().await;
        assert_eq!(tracker.timer().phase(), TimerPhase::Idle);
        assert!(!tracker.timer().is_break());
        assert_eq!(tracker.timer().sessions_completed(), 1);
        assert_eq!(tracker.stats().total_sessions, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn pause_stops_ticking_immediately() {
        let rt = runtime(&FixedClock::new(date(2)));
        rt.start().await;
        time::sleep(Duration::from_millis(10_500)).await;
        assert!(rt.pause().await);
        rt.wait_idle().await;

        time::sleep(Duration::from_secs(30)).await;
        let tracker = rt.tracker();
        let tracker = tracker.lock().await;
        assert_eq!(tracker.timer().phase(), TimerPhase::Paused);
        assert_eq!(tracker.timer().elapsed_secs(), 10);
    }

    #[tokio::test(start_paused = true)]
    async fn start_twice_keeps_one_ticker() {
        let rt = runtime(&FixedClock::new(date(2)));
        assert!(rt.start().await);
        assert!(!rt.start().await);
        time::sleep(Duration::from_millis(5_500)).await;
        rt.pause().await;
        assert_eq!(rt.tracker().lock().await.timer().elapsed_secs(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn reset_returns_to_idle() {
        let rt = runtime(&FixedClock::new(date(2)));
        rt.start().await;
        time::sleep(Duration::from_millis(3_500)).await;
        assert!(rt.reset().await);
        rt.wait_idle().await;
        let tracker = rt.tracker();
        let tracker = tracker.lock().await;
        assert_eq!(tracker.timer().phase(), TimerPhase::Idle);
        assert_eq!(tracker.timer().elapsed_secs(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_stops_ticks_but_keeps_phase() {
        let rt = runtime(&FixedClock::new(date(2)));
        rt.start().await;
        time::sleep(Duration::from_millis(4_500)).await;
        rt.shutdown().await;
        rt.wait_idle().await;

        time::sleep(Duration::from_secs(10)).await;
        let tracker = rt.tracker();
        let tracker = tracker.lock().await;
        assert_eq!(tracker.timer().phase(), TimerPhase::Running);
        assert_eq!(tracker.timer().elapsed_secs(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn rollover_poll_picks_up_new_day() {
        let clock = FixedClock::new(date(2));
        let rt = runtime(&clock);
        rt.start().await;
        rt.wait_idle().await;

        let poll = rt.spawn_rollover_poll();
        clock.set_today(date(3));
        time::sleep(Duration::from_secs(3_601)).await;

        {
            let tracker = rt.tracker();
            let tracker = tracker.lock().await;
            assert_eq!(tracker.stats().sessions_today, 0);
            assert_eq!(tracker.stats().streak, 1);
        }
        poll.abort();
    }
}
