//! Sensor reading types.
//!
//! A reading is stored under its device partition, keyed by the epoch second
//! it was taken at. The body carries the three signals we classify.

use serde::{Deserialize, Serialize};

/// Opaque identifier of a physical sensor unit.
pub type DeviceId = String;

/// A single sensor sample.
///
/// Fields absent from the stored body default to zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    /// Epoch seconds; also the store's sort key
    #[serde(skip)]
    pub timestamp: i64,
    /// Temperature in °C
    #[serde(default)]
    pub temperature: f64,
    /// MQ-2 sensor value (smoke proxy)
    #[serde(default)]
    pub mq2: f64,
    /// MQ-7 sensor value (carbon monoxide proxy)
    #[serde(default)]
    pub mq7: f64,
}

impl Reading {
    pub fn new(timestamp: i64, temperature: f64, mq2: f64, mq7: f64) -> Self {
        Self {
            timestamp,
            temperature,
            mq2,
            mq7,
        }
    }

    /// Build a reading from a stored JSON body and its timestamp key.
    pub fn from_body(timestamp: i64, body: serde_json::Value) -> Result<Self, serde_json::Error> {
        let mut reading: Reading = serde_json::from_value(body)?;
        reading.timestamp = timestamp;
        Ok(reading)
    }
}
