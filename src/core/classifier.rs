//! Per-reading threshold classification.
//!
//! Each reading is checked against three independent thresholds. A reading
//! that trips at least one of them counts as an anomaly.

use crate::core::clock::format_local_time;
use crate::core::reading::Reading;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

pub const LABEL_HIGH_TEMPERATURE: &str = "high temperature";
pub const LABEL_EXCESSIVE_SMOKE: &str = "excessive smoke";
pub const LABEL_HIGH_CO: &str = "high carbon monoxide";
pub const STATUS_NORMAL: &str = "normal";

/// Alert thresholds. A signal trips when strictly above its threshold.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    /// Temperature in °C
    pub temperature: f64,
    /// MQ-2 smoke sensor value
    pub mq2: f64,
    /// MQ-7 carbon monoxide sensor value
    pub mq7: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            temperature: 45.0,
            mq2: 2500.0,
            mq7: 150.0,
        }
    }
}

/// Which conditions a reading tripped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassificationResult {
    pub temp_alert: bool,
    pub mq2_alert: bool,
    pub mq7_alert: bool,
    /// Triggered condition names in fixed order: temperature, smoke, CO
    pub labels: Vec<&'static str>,
    /// Local `HH:MM:SS` of the reading
    pub time_str: String,
}

impl ClassificationResult {
    /// Whether any condition fired.
    pub fn is_anomaly(&self) -> bool {
        !self.labels.is_empty()
    }

    /// Joined labels, or `normal` when nothing fired.
    pub fn status(&self) -> String {
        if self.labels.is_empty() {
            STATUS_NORMAL.to_string()
        } else {
            self.labels.join(", ")
        }
    }
}

/// Classify a reading against the thresholds.
pub fn classify(reading: &Reading, thresholds: &Thresholds, tz: Tz) -> ClassificationResult {
    let temp_alert = reading.temperature > thresholds.temperature;
    let mq2_alert = reading.mq2 > thresholds.mq2;
    let mq7_alert = reading.mq7 > thresholds.mq7;

    let labels = [
        (temp_alert, LABEL_HIGH_TEMPERATURE),
        (mq2_alert, LABEL_EXCESSIVE_SMOKE),
        (mq7_alert, LABEL_HIGH_CO),
    ]
    .into_iter()
    .filter_map(|(fired, label)| fired.then_some(label))
    .collect();

    ClassificationResult {
        temp_alert,
        mq2_alert,
        mq7_alert,
        labels,
        time_str: format_local_time(reading.timestamp, tz),
    }
}
