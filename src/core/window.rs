//! Time windows and the windowed reading fetch.
//!
//! A window ends at the run's reference instant and reaches back a fixed
//! length. Both ends are inclusive.

use crate::core::reading::Reading;
use crate::store::{ReadingStore, StoreError};
use serde::{Deserialize, Serialize};

/// A closed interval of epoch seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Window {
    /// First second of the window
    pub start: i64,
    /// Last second of the window (the reference instant)
    pub end: i64,
}

impl Window {
    /// Create the window of `length_secs` ending at `end`.
    pub fn ending_at(end: i64, length_secs: i64) -> Self {
        Self {
            start: end.saturating_sub(length_secs.max(0)),
            end,
        }
    }

    /// Check if a timestamp falls within this window.
    pub fn contains(&self, timestamp: i64) -> bool {
        timestamp >= self.start && timestamp <= self.end
    }

    /// Length of the window in seconds.
    pub fn duration_secs(&self) -> i64 {
        self.end - self.start
    }
}

/// Fetches the readings of one device that fall inside a window.
#[derive(Debug, Clone, Copy)]
pub struct WindowFetcher {
    window_length_secs: i64,
}

impl WindowFetcher {
    pub fn new(window_length_secs: i64) -> Self {
        Self { window_length_secs }
    }

    /// The window anchored at `reference`.
    pub fn window_for(&self, reference: i64) -> Window {
        Window::ending_at(reference, self.window_length_secs)
    }

    /// Fetch readings for `device_id` in the window ending at `reference`,
    /// sorted ascending by timestamp.
    ///
    /// Stores may order keys as strings, so every returned key is re-checked
    /// as an integer. Keys or bodies that don't parse are skipped.
    pub fn fetch<S: ReadingStore + ?Sized>(
        &self,
        store: &S,
        device_id: &str,
        reference: i64,
    ) -> Result<(Window, Vec<Reading>), StoreError> {
        let window = self.window_for(reference);
        let entries = store.entries_in_key_range(
            device_id,
            &window.start.to_string(),
            &window.end.to_string(),
        )?;

        let mut readings = Vec::with_capacity(entries.len());
        for (key, body) in entries {
            let timestamp = match key.parse::<i64>() {
                Ok(ts) => ts,
                Err(_) => {
                    tracing::warn!(device = %device_id, "Ignoring invalid timestamp key: {key}");
                    continue;
                }
            };
            if !window.contains(timestamp) {
                continue;
            }
            match Reading::from_body(timestamp, body) {
                Ok(reading) => readings.push(reading),
                Err(e) => {
                    tracing::warn!(device = %device_id, "Ignoring malformed reading at {key}: {e}");
                }
            }
        }

        readings.sort_by_key(|r| r.timestamp);

        if readings.is_empty() {
            tracing::info!(device = %device_id, "No readings within the time window");
        }
        Ok((window, readings))
    }
}
