//! Timer engine implementation.
//!
//! The timer engine is a tick-driven state machine. It does not own a thread
//! or a clock: the runtime calls `tick()` once per second while the timer is
//! running, and every call advances the countdown by exactly one second.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Running(Focus) -> Running(Break) -> Idle
//!            |    ^
//!            v    |
//!           Paused
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = TimerEngine::new(TimerConfig::default());
//! engine.start();
//! // Once per second while running:
//! for event in engine.tick() { /* PhaseCompleted, SessionCompleted */ }
//! ```

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::config::{clamp_to, Technique, TimerConfig, BREAK_MINUTES, FOCUS_MINUTES, TARGET_SESSIONS};
use crate::events::Event;
use crate::storage::{keys, Store};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerPhase {
    #[default]
    Idle,
    Running,
    Paused,
    /// Transient: accepted when hydrated, treated like `Idle` by `start()`.
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionKind {
    Focus,
    Break,
}

/// Core timer engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerEngine {
    config: TimerConfig,
    phase: TimerPhase,
    is_break: bool,
    /// Seconds elapsed in the current phase.
    elapsed_secs: u32,
    sessions_completed: u32,
}

impl TimerEngine {
    /// Create an idle timer at the start of a focus phase.
    pub fn new(config: TimerConfig) -> Self {
        Self {
            config: config.clamped(),
            phase: TimerPhase::Idle,
            is_break: false,
            elapsed_secs: 0,
            sessions_completed: 0,
        }
    }

    /// Restore from the store, substituting defaults for anything missing.
    pub fn hydrate(store: &Store) -> Self {
        let defaults = TimerConfig::default();
        let config = TimerConfig {
            focus_minutes: store.load(keys::FOCUS_TIME, defaults.focus_minutes),
            break_minutes: store.load(keys::BREAK_TIME, defaults.break_minutes),
            target_sessions: store.load(keys::TARGET_SESSIONS, defaults.target_sessions),
            technique: store.load(keys::TIMER_TECHNIQUE, defaults.technique),
        }
        .clamped();

        let sessions_completed: u32 = store.load(keys::SESSIONS_COMPLETED, 0);
        Self {
            phase: store.load(keys::TIMER_STATE, TimerPhase::Idle),
            is_break: store.load(keys::IS_BREAK, false),
            elapsed_secs: store.load(keys::ELAPSED_TIME, 0),
            sessions_completed: sessions_completed.min(config.target_sessions),
            config,
        }
    }

    pub fn persist(&self, store: &Store) {
        store.save(keys::TIMER_STATE, &self.phase);
        store.save(keys::IS_BREAK, &self.is_break);
        store.save(keys::ELAPSED_TIME, &self.elapsed_secs);
        store.save(keys::SESSIONS_COMPLETED, &self.sessions_completed);
        self.persist_config(store);
    }

    pub fn persist_config(&self, store: &Store) {
        store.save(keys::FOCUS_TIME, &self.config.focus_minutes);
        store.save(keys::BREAK_TIME, &self.config.break_minutes);
        store.save(keys::TARGET_SESSIONS, &self.config.target_sessions);
        store.save(keys::TIMER_TECHNIQUE, &self.config.technique);
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn phase(&self) -> TimerPhase {
        self.phase
    }

    pub fn is_running(&self) -> bool {
        self.phase == TimerPhase::Running
    }

    pub fn is_break(&self) -> bool {
        self.is_break
    }

    pub fn kind(&self) -> SessionKind {
        if self.is_break {
            SessionKind::Break
        } else {
            SessionKind::Focus
        }
    }

    pub fn elapsed_secs(&self) -> u32 {
        self.elapsed_secs
    }

    pub fn sessions_completed(&self) -> u32 {
        self.sessions_completed
    }

    pub fn config(&self) -> &TimerConfig {
        &self.config
    }

    pub fn duration_secs(&self, kind: SessionKind) -> u32 {
        let minutes = match kind {
            SessionKind::Focus => self.config.focus_minutes,
            SessionKind::Break => self.config.break_minutes,
        };
        minutes.saturating_mul(60)
    }

    pub fn remaining_secs(&self) -> u32 {
        self.duration_secs(self.kind())
            .saturating_sub(self.elapsed_secs)
    }

    /// Build a full state snapshot event.
    pub fn snapshot(&self) -> Event {
        Event::StateSnapshot {
            phase: self.phase,
            kind: self.kind(),
            elapsed_secs: self.elapsed_secs,
            remaining_secs: self.remaining_secs(),
            sessions_completed: self.sessions_completed,
            target_sessions: self.config.target_sessions,
            at: Utc::now(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn start(&mut self) -> Option<Event> {
        match self.phase {
            TimerPhase::Idle | TimerPhase::Paused | TimerPhase::Completed => {
                self.phase = TimerPhase::Running;
                let kind = self.kind();
                Some(Event::TimerStarted {
                    kind,
                    elapsed_secs: self.elapsed_secs,
                    duration_secs: self.duration_secs(kind),
                    at: Utc::now(),
                })
            }
            TimerPhase::Running => None,
        }
    }

    pub fn pause(&mut self) -> Option<Event> {
        match self.phase {
            TimerPhase::Running => {
                self.phase = TimerPhase::Paused;
                Some(Event::TimerPaused {
                    kind: self.kind(),
                    elapsed_secs: self.elapsed_secs,
                    at: Utc::now(),
                })
            }
            _ => None,
        }
    }

    pub fn reset(&mut self) -> Option<Event> {
        self.phase = TimerPhase::Idle;
        self.elapsed_secs = 0;
        self.is_break = false;
        Some(Event::TimerReset { at: Utc::now() })
    }

    /// Jump straight to a break. Ignored while running or already on break.
    pub fn skip_to_break(&mut self) -> Option<Event> {
        if self.phase == TimerPhase::Running || self.is_break {
            return None;
        }
        self.is_break = true;
        self.elapsed_secs = 0;
        Some(Event::SkippedToBreak { at: Utc::now() })
    }

    /// Advance one second. Only has an effect while running.
    ///
    /// Returns `PhaseCompleted` when the countdown reaches its duration,
    /// followed by `SessionCompleted` when the finished phase was a focus
    /// phase.
    pub fn tick(&mut self) -> Vec<Event> {
        if self.phase != TimerPhase::Running {
            return Vec::new();
        }

        self.elapsed_secs = self.elapsed_secs.saturating_add(1);
        let kind = self.kind();
        if self.elapsed_secs < self.duration_secs(kind) {
            return Vec::new();
        }

        let at = Utc::now();
        let mut events = vec![Event::PhaseCompleted { kind, at }];
        self.elapsed_secs = 0;
        match kind {
            SessionKind::Focus => {
                self.sessions_completed =
                    (self.sessions_completed + 1).min(self.config.target_sessions);
                self.is_break = true;
                events.push(Event::SessionCompleted {
                    minutes: self.config.focus_minutes,
                    sessions_completed: self.sessions_completed,
                    at,
                });
            }
            SessionKind::Break => {
                self.is_break = false;
                self.phase = TimerPhase::Idle;
            }
        }
        events
    }

    // ── Configuration ────────────────────────────────────────────────
    //
    // Changes apply immediately to the next duration comparison; elapsed
    // time is never rescaled.

    pub fn update_focus_time(&mut self, minutes: u32) {
        self.config.focus_minutes = clamp_to(minutes, &FOCUS_MINUTES);
    }

    pub fn update_break_time(&mut self, minutes: u32) {
        self.config.break_minutes = clamp_to(minutes, &BREAK_MINUTES);
    }

    pub fn update_target_sessions(&mut self, sessions: u32) {
        self.config.target_sessions = clamp_to(sessions, &TARGET_SESSIONS);
        self.sessions_completed = self.sessions_completed.min(self.config.target_sessions);
    }

    /// Select a technique and apply its preset durations.
    pub fn set_technique(&mut self, technique: Technique) {
        self.config.technique = technique;
        let (focus, brk, target) = technique.preset();
        if let Some(m) = focus {
            self.update_focus_time(m);
        }
        if let Some(m) = brk {
            self.update_break_time(m);
        }
        if let Some(n) = target {
            self.update_target_sessions(n);
        }
    }
}

impl Default for TimerEngine {
    fn default() -> Self {
        Self::new(TimerConfig::default())
    }
}
