use std::panic::{catch_unwind, AssertUnwindSafe};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::stats::Level;
use crate::timer::{SessionKind, TimerPhase};

/// Every state change in the system produces an Event.
/// The tracker returns them to callers; observers subscribe to them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    TimerStarted {
        kind: SessionKind,
        elapsed_secs: u32,
        duration_secs: u32,
        at: DateTime<Utc>,
    },
    TimerPaused {
        kind: SessionKind,
        elapsed_secs: u32,
        at: DateTime<Utc>,
    },
    TimerReset {
        at: DateTime<Utc>,
    },
    SkippedToBreak {
        at: DateTime<Utc>,
    },
    /// A focus or break countdown reached its duration.
    PhaseCompleted {
        kind: SessionKind,
        at: DateTime<Utc>,
    },
    /// A focus phase completed. Only focus completions count as sessions.
    SessionCompleted {
        minutes: u32,
        sessions_completed: u32,
        at: DateTime<Utc>,
    },
    LevelUp {
        level: Level,
        next_level: String,
        hours_to_next_level: u32,
    },
    /// The calendar day changed since the last rollover check.
    DailyRollover {
        date: NaiveDate,
        streak: u32,
        streak_kept: bool,
    },
    AchievementUnlocked {
        id: String,
        title: String,
    },
    ProgressReset {
        at: DateTime<Utc>,
    },
    StateSnapshot {
        phase: TimerPhase,
        kind: SessionKind,
        elapsed_secs: u32,
        remaining_secs: u32,
        sessions_completed: u32,
        target_sessions: u32,
        at: DateTime<Utc>,
    },
}

impl Event {
    pub fn is_session_completed(&self) -> bool {
        matches!(self, Event::SessionCompleted { .. })
    }
}

/// Outcome reported by a subscriber. Errors are logged, never propagated.
pub type SubscriberResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

type Subscriber = Box<dyn FnMut(&Event) -> SubscriberResult + Send>;

/// Handle returned by [`EventBus::subscribe`]; pass it back to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Subscription(u64);

/// Synchronous, ordered observer list.
///
/// Subscribers are invoked in registration order, once per published event.
/// A subscriber that returns an error or panics is logged and skipped; the
/// remaining subscribers still run and the publisher is unaffected.
#[derive(Default)]
pub struct EventBus {
    next_id: u64,
    subscribers: Vec<(Subscription, Subscriber)>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&mut self, callback: F) -> Subscription
    where
        F: FnMut(&Event) -> SubscriberResult + Send + 'static,
    {
        let handle = Subscription(self.next_id);
        self.next_id += 1;
        self.subscribers.push((handle, Box::new(callback)));
        handle
    }

    /// Register a zero-argument callback fired once per completed focus session.
    pub fn on_session_complete<F>(&mut self, mut callback: F) -> Subscription
    where
        F: FnMut() -> SubscriberResult + Send + 'static,
    {
        self.subscribe(move |event| {
            if event.is_session_completed() {
                callback()
            } else {
                Ok(())
            }
        })
    }

    /// Returns `false` if the handle was already removed.
    pub fn unsubscribe(&mut self, handle: Subscription) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(h, _)| *h != handle);
        self.subscribers.len() != before
    }

    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }

    /// Deliver `event` to every subscriber. Returns how many failed.
    pub fn publish(&mut self, event: &Event) -> usize {
        let mut failures = 0;
        for (handle, subscriber) in self.subscribers.iter_mut() {
            match catch_unwind(AssertUnwindSafe(|| subscriber(event))) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    failures += 1;
                    tracing::warn!(subscriber = handle.0, error = %e, "event subscriber failed");
                }
                Err(_) => {
                    failures += 1;
                    tracing::warn!(subscriber = handle.0, "event subscriber panicked");
                }
            }
        }
        failures
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}
