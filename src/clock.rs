//! Time sources.
//!
//! Sessions and the rewards engine read "now" through [`Clock`] so that hosts
//! can drive them from the wall clock and tests can drive them from a
//! [`ManualClock`].

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{Local, NaiveDate, TimeZone, Utc};

/// Source of the current instant and calendar day.
pub trait Clock {
    /// Milliseconds since the Unix epoch.
    fn now_ms(&self) -> i64;

    /// The user's current calendar date.
    fn today(&self) -> NaiveDate;
}

/// Wall clock; the calendar day follows the device's local time zone so it
/// lines up with "steps since midnight".
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as i64
    }

    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// Settable clock. Clones share the same instant.
///
/// The calendar day is derived from the instant in UTC, so advancing by
/// 86,400,000 ms always moves to the next day.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<AtomicI64>,
}

impl ManualClock {
    pub fn new(now_ms: i64) -> Self {
        Self {
            now: Arc::new(AtomicI64::new(now_ms)),
        }
    }

    /// Start at midnight UTC of `date`.
    pub fn at_date(date: NaiveDate) -> Self {
        let midnight = date.and_hms_opt(0, 0, 0).unwrap_or_default();
        Self::new(Utc.from_utc_datetime(&midnight).timestamp_millis())
    }

    pub fn set(&self, now_ms: i64) {
        self.now.store(now_ms, Ordering::SeqCst);
    }

    pub fn advance(&self, ms: i64) {
        self.now.fetch_add(ms, Ordering::SeqCst);
    }

    pub fn advance_days(&self, days: i64) {
        self.advance(days * 86_400_000);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }

    fn today(&self) -> NaiveDate {
        Utc.timestamp_millis_opt(self.now_ms())
            .single()
            .map(|dt| dt.date_naive())
            .unwrap_or_default()
    }
}
