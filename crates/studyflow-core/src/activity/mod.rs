//! Per-day activity ledger backing the calendar heatmap.
//!
//! One record per calendar day, created lazily by the first session of that
//! day and only ever grown. Intensity is always derived from minutes via
//! [`intensity_for`]; it is recomputed on load so stored data cannot drift.

use std::collections::BTreeMap;

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::storage::{keys, Store};

pub const MAX_INTENSITY: u8 = 4;

/// Longest window [`ActivityLedger::view_window`] will build (about ten years).
pub const MAX_WINDOW_DAYS: u32 = 3660;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityDay {
    pub date: NaiveDate,
    pub minutes: u32,
    pub intensity: u8,
}

impl ActivityDay {
    pub fn new(date: NaiveDate, minutes: u32) -> Self {
        Self {
            date,
            minutes,
            intensity: intensity_for(minutes),
        }
    }

    pub fn empty(date: NaiveDate) -> Self {
        Self::new(date, 0)
    }
}

/// Heatmap bucket for a day's focused minutes.
///
/// 0 minutes -> 0, then one step per started hour: 1-59 -> 1, 60-119 -> 2,
/// 120-179 -> 3, 180+ -> 4.
pub fn intensity_for(minutes: u32) -> u8 {
    if minutes == 0 {
        return 0;
    }
    let bucket = 1 + minutes / 60;
    bucket.min(u32::from(MAX_INTENSITY)) as u8
}

#[derive(Debug, Clone, Default)]
pub struct ActivityLedger {
    days: BTreeMap<NaiveDate, ActivityDay>,
}

impl ActivityLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hydrate(store: &Store) -> Self {
        let stored: Vec<ActivityDay> = store.load(keys::ACTIVITY_DATA, Vec::new());
        let mut days = BTreeMap::new();
        for day in stored {
            // Later duplicates win; intensity is recomputed either way.
            days.insert(day.date, ActivityDay::new(day.date, day.minutes));
        }
        Self { days }
    }

    pub fn persist(&self, store: &Store) {
        let days: Vec<&ActivityDay> = self.days.values().collect();
        store.save(keys::ACTIVITY_DATA, &days);
    }

    /// Add `minutes` to `today`'s record, creating it if needed.
    pub fn record_session(&mut self, today: NaiveDate, minutes: u32) -> &ActivityDay {
        let day = self
            .days
            .entry(today)
            .or_insert_with(|| ActivityDay::empty(today));
        day.minutes = day.minutes.saturating_add(minutes);
        day.intensity = intensity_for(day.minutes);
        tracing::debug!(date = %today, minutes = day.minutes, intensity = day.intensity, "activity recorded");
        day
    }

    pub fn get_activity_for_date(&self, date: NaiveDate) -> Option<&ActivityDay> {
        self.days.get(&date)
    }

    /// `days` entries in chronological order ending with `today`, capped at
    /// [`MAX_WINDOW_DAYS`]. Dates without a record are filled with empty days.
    /// Dates before the start of the calendar are skipped.
    pub fn view_window(&self, today: NaiveDate, days: u32) -> Vec<ActivityDay> {
        let days = days.min(MAX_WINDOW_DAYS);
        (0..u64::from(days))
            .rev()
            .filter_map(|offset| today.checked_sub_days(Days::new(offset)))
            .map(|date| {
                self.days
                    .get(&date)
                    .cloned()
                    .unwrap_or_else(|| ActivityDay::empty(date))
            })
            .collect()
    }

    /// Every stored record, oldest first.
    pub fn days(&self) -> impl Iterator<Item = &ActivityDay> {
        self.days.values()
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    pub fn clear(&mut self) {
        self.days.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use proptest::prelude::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
    }

    #[test]
    fn intensity_buckets() {
        assert_eq!(intensity_for(0), 0);
        assert_eq!(intensity_for(1), 1);
        assert_eq!(intensity_for(59), 1);
        assert_eq!(intensity_for(60), 2);
        assert_eq!(intensity_for(179), 3);
        assert_eq!(intensity_for(180), 4);
        assert_eq!(intensity_for(10_000), 4);
    }

    #[test]
    fn record_session_accumulates() {
        let mut ledger = ActivityLedger::new();
        assert_eq!(ledger.record_session(day(3), 25).intensity, 1);
        let d = ledger.record_session(day(3), 50).clone();
        assert_eq!(d.minutes, 75);
        assert_eq!(d.intensity, 2);
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn view_window_fills_gaps_and_ends_today() {
        let mut ledger = ActivityLedger::new();
        ledger.record_session(day(2), 30);
        ledger.record_session(day(5), 120);

        let window = ledger.view_window(day(5), 5);
        let dates: Vec<_> = window.iter().map(|d| d.date).collect();
        assert_eq!(dates, vec![day(1), day(2), day(3), day(4), day(5)]);
        assert_eq!(window[1].minutes, 30);
        assert_eq!(window[2], ActivityDay::empty(day(3)));
        assert_eq!(window[4].intensity, 3);
        assert_eq!(ledger.len(), 2);
    }

    #[test]
    fn zero_day_window_is_empty() {
        let ledger = ActivityLedger::new();
        assert!(ledger.view_window(day(5), 0).is_empty());
    }

    #[test]
    fn huge_window_is_capped() {
        let mut ledger = ActivityLedger::new();
        ledger.record_session(day(5), 30);
        let window = ledger.view_window(day(5), 100_000_000);
        assert_eq!(window.len(), MAX_WINDOW_DAYS as usize);
        assert_eq!(window.last().unwrap().minutes, 30);
        assert_eq!(
            window[0].date,
            day(5) - Duration::days(i64::from(MAX_WINDOW_DAYS) - 1)
        );

        let window = ledger.view_window(day(5), u32::MAX);
        assert_eq!(window.len(), MAX_WINDOW_DAYS as usize);
    }

    #[test]
    fn window_stops_at_calendar_start() {
        let ledger = ActivityLedger::new();
        let window = ledger.view_window(NaiveDate::MIN, 5);
        assert_eq!(window, vec![ActivityDay::empty(NaiveDate::MIN)]);
    }

    #[test]
    fn hydrate_recomputes_intensity() {
        let store = Store::open_memory("test").unwrap();
        store
            .kv_set(
                keys::ACTIVITY_DATA,
                r#"[{"date":"2024-06-01","minutes":50,"intensity":0}]"#,
            )
            .unwrap();
        let ledger = ActivityLedger::hydrate(&store);
        assert_eq!(ledger.get_activity_for_date(day(1)).unwrap().intensity, 1);
    }

    #[test]
    fn persist_and_hydrate_roundtrip() {
        let store = Store::open_memory("test").unwrap();
        let mut ledger = ActivityLedger::new();
        ledger.record_session(day(7), 45);
        ledger.record_session(day(1), 200);
        ledger.persist(&store);

        let restored = ActivityLedger::hydrate(&store);
        let days: Vec<_> = restored.days().cloned().collect();
        assert_eq!(days, vec![ActivityDay::new(day(1), 200), ActivityDay::new(day(7), 45)]);
    }

    proptest! {
        #[test]
        fn window_length_and_order(
            recorded in proptest::collection::vec((0i64..400, 1u32..300), 0..40),
            len in 0u32..400,
        ) {
            let today = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
            let mut ledger = ActivityLedger::new();
            for (offset, minutes) in recorded {
                ledger.record_session(today - Duration::days(offset), minutes);
            }
            let first = ledger.view_window(today, len);
            let second = ledger.view_window(today, len);
            prop_assert_eq!(first.len(), len as usize);
            prop_assert!(first.windows(2).all(|w| w[0].date + Duration::days(1) == w[1].date));
            if let Some(last) = first.last() {
                prop_assert_eq!(last.date, today);
            }
            prop_assert_eq!(first, second);
        }
    }
}
