//! Time source used by the tracker.
//!
//! Day boundaries follow the local calendar. Tests substitute [`FixedClock`]
//! to walk across midnight deterministically.

use std::sync::{Arc, Mutex};

use chrono::{Duration, Local, NaiveDate, Utc};

pub trait Clock: Send + Sync {
    /// Current local calendar day.
    fn today(&self) -> NaiveDate;

    /// Milliseconds since the Unix epoch.
    fn now_ms(&self) -> i64;

    fn yesterday(&self) -> NaiveDate {
        self.today() - Duration::days(1)
    }
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }

    fn now_ms(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}

/// Manually advanced clock. Cloned handles share the same instant.
#[derive(Debug, Clone)]
pub struct FixedClock {
    inner: Arc<Mutex<(NaiveDate, i64)>>,
}

impl FixedClock {
    pub fn new(today: NaiveDate) -> Self {
        let epoch_ms = today
            .and_hms_opt(9, 0, 0)
            .map(|dt| dt.and_utc().timestamp_millis())
            .unwrap_or_default();
        Self {
            inner: Arc::new(Mutex::new((today, epoch_ms))),
        }
    }

    pub fn set_today(&self, today: NaiveDate) {
        if let Ok(mut guard) = self.inner.lock() {
            let delta = (today - guard.0).num_milliseconds();
            guard.0 = today;
            guard.1 += delta;
        }
    }

    pub fn advance_days(&self, days: i64) {
        let today = self.today();
        self.set_today(today + Duration::days(days));
    }
}

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.inner.lock().map(|g| g.0).unwrap_or_default()
    }

    fn now_ms(&self) -> i64 {
        self.inner.lock().map(|g| g.1).unwrap_or_default()
    }
}
