//! Reference-instant providers and local time formatting.

use chrono::{DateTime, TimeZone, Utc};
use chrono_tz::Tz;

/// Source of the instant a monitoring run is anchored to.
pub trait Clock {
    /// Current instant in epoch seconds (fractional part dropped).
    fn now_timestamp(&self) -> i64;
}

impl<T: Clock + ?Sized> Clock for Box<T> {
    fn now_timestamp(&self) -> i64 {
        (**self).now_timestamp()
    }
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_timestamp(&self) -> i64 {
        Utc::now().timestamp()
    }
}

/// A clock frozen at a configured instant, used for verification runs and
/// replaying recorded data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock {
    timestamp: i64,
}

impl FixedClock {
    pub fn new(timestamp: i64) -> Self {
        Self { timestamp }
    }
}

impl Clock for FixedClock {
    fn now_timestamp(&self) -> i64 {
        self.timestamp
    }
}

fn to_local(timestamp: i64, tz: Tz) -> Option<DateTime<Tz>> {
    Utc.timestamp_opt(timestamp, 0)
        .single()
        .map(|utc| utc.with_timezone(&tz))
}

/// Format an epoch timestamp as `HH:MM:SS` in the given timezone.
pub fn format_local_time(timestamp: i64, tz: Tz) -> String {
    to_local(timestamp, tz)
        .map(|t| t.format("%H:%M:%S").to_string())
        .unwrap_or_else(|| timestamp.to_string())
}

/// Format an epoch timestamp as a full local date-time with offset.
pub fn format_local_datetime(timestamp: i64, tz: Tz) -> String {
    to_local(timestamp, tz)
        .map(|t| t.format("%Y-%m-%d %H:%M:%S%:z").to_string())
        .unwrap_or_else(|| timestamp.to_string())
}
