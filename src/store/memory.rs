//! In-memory reading store.
//!
//! Backs offline replay of a database export and the test suite. Keys are
//! ordered like the remote store orders `$key`: integer keys first,
//! numerically, then every other key as a string.

use crate::core::reading::DeviceId;
use crate::store::{RawEntry, ReadingStore, StoreError};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::path::Path;

/// Compare two partition keys in store order.
fn key_order(a: &str, b: &str) -> Ordering {
    match (a.parse::<i64>(), b.parse::<i64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y).then_with(|| a.cmp(b)),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    partitions: BTreeMap<DeviceId, BTreeMap<String, serde_json::Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert (or replace) one entry.
    pub fn insert(&mut self, device_id: &str, key: &str, body: serde_json::Value) {
        self.partitions
            .entry(device_id.to_string())
            .or_default()
            .insert(key.to_string(), body);
    }

    /// Build a store from a JSON export.
    ///
    /// Accepts either the whole database (`{"<root>": {"<device>": {...}}}`)
    /// or just the reading partition (`{"<device>": {"<ts>": {...}}}`).
    pub fn from_export(export: serde_json::Value, root: &str) -> Result<Self, StoreError> {
        let mut top = match export {
            serde_json::Value::Object(map) => map,
            serde_json::Value::Null => return Ok(Self::new()),
            _ => {
                return Err(StoreError::Decode(
                    "Export must be a JSON object".to_string(),
                ))
            }
        };

        let partition = match top.remove(root) {
            Some(serde_json::Value::Object(map)) => map,
            Some(serde_json::Value::Null) => return Ok(Self::new()),
            Some(_) => {
                return Err(StoreError::Decode(format!(
                    "Export field '{root}' must be a JSON object"
                )))
            }
            None => top,
        };

        let mut store = Self::new();
        for (device_id, readings) in partition {
            match readings {
                serde_json::Value::Object(entries) => {
                    for (key, body) in entries {
                        store.insert(&device_id, &key, body);
                    }
                }
                other => {
                    tracing::warn!(device = %device_id, "Ignoring non-object partition: {other}");
                }
            }
        }
        Ok(store)
    }

    /// Load a JSON export from disk.
    pub fn load_export(path: &Path, root: &str) -> Result<Self, StoreError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| StoreError::Config(format!("Failed to read {path:?}: {e}")))?;
        let export: serde_json::Value =
            serde_json::from_str(&content).map_err(|e| StoreError::Decode(e.to_string()))?;
        Self::from_export(export, root)
    }

    /// Newest integer timestamp key across all devices, if any.
    pub fn latest_timestamp(&self) -> Option<i64> {
        self.partitions
            .values()
            .flat_map(|entries| entries.keys())
            .filter_map(|key| key.parse::<i64>().ok())
            .max()
    }

    /// Number of device partitions.
    pub fn device_count(&self) -> usize {
        self.partitions.len()
    }
}

impl ReadingStore for MemoryStore {
    fn device_ids(&self) -> Result<Vec<DeviceId>, StoreError> {
        Ok(self.partitions.keys().cloned().collect())
    }

    fn entries_in_key_range(
        &self,
        device_id: &str,
        start_key: &str,
        end_key: &str,
    ) -> Result<Vec<RawEntry>, StoreError> {
        let Some(entries) = self.partitions.get(device_id) else {
            return Ok(Vec::new());
        };
        if key_order(start_key, end_key) == Ordering::Greater {
            return Ok(Vec::new());
        }

        let mut matched: Vec<RawEntry> = entries
            .iter()
            .filter(|(key, _)| {
                key_order(start_key, key) != Ordering::Greater
                    && key_order(key, end_key) != Ordering::Greater
            })
            .map(|(key, body)| (key.clone(), body.clone()))
            .collect();
        matched.sort_by(|a, b| key_order(&a.0, &b.0));
        Ok(matched)
    }
}
