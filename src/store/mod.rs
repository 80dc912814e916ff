//! Access to the time-ordered reading store.
//!
//! Readings live under `/<root>/<device_id>/<epoch_seconds>`. The store is
//! queried two ways: a shallow listing of device partitions, and a key-range
//! query inside one partition.

pub mod firebase;
pub mod memory;

use crate::core::reading::DeviceId;
use std::collections::BTreeSet;

pub use firebase::{BlockingFirebaseStore, FirebaseClient, FirebaseConfig};
pub use memory::MemoryStore;

/// A raw store entry: the key as stored and its JSON body.
pub type RawEntry = (String, serde_json::Value);

/// A key-ordered store of sensor readings.
pub trait ReadingStore {
    /// List the top-level device partition keys without reading bodies.
    fn device_ids(&self) -> Result<Vec<DeviceId>, StoreError>;

    /// Fetch the entries of one device whose key lies in `[start_key, end_key]`
    /// under the store's own (string) key ordering.
    fn entries_in_key_range(
        &self,
        device_id: &str,
        start_key: &str,
        end_key: &str,
    ) -> Result<Vec<RawEntry>, StoreError>;
}

impl<T: ReadingStore + ?Sized> ReadingStore for &T {
    fn device_ids(&self) -> Result<Vec<DeviceId>, StoreError> {
        (**self).device_ids()
    }

    fn entries_in_key_range(
        &self,
        device_id: &str,
        start_key: &str,
        end_key: &str,
    ) -> Result<Vec<RawEntry>, StoreError> {
        (**self).entries_in_key_range(device_id, start_key, end_key)
    }
}

impl<T: ReadingStore + ?Sized> ReadingStore for Box<T> {
    fn device_ids(&self) -> Result<Vec<DeviceId>, StoreError> {
        (**self).device_ids()
    }

    fn entries_in_key_range(
        &self,
        device_id: &str,
        start_key: &str,
        end_key: &str,
    ) -> Result<Vec<RawEntry>, StoreError> {
        (**self).entries_in_key_range(device_id, start_key, end_key)
    }
}

/// Discover the set of known devices.
///
/// An absent or empty partition yields an empty set.
pub fn enumerate_devices<S: ReadingStore + ?Sized>(
    store: &S,
) -> Result<BTreeSet<DeviceId>, StoreError> {
    let devices: BTreeSet<DeviceId> = store.device_ids()?.into_iter().collect();
    if devices.is_empty() {
        tracing::info!("No devices found in the store");
    } else {
        tracing::debug!(count = devices.len(), "Enumerated devices");
    }
    Ok(devices)
}

/// Store access errors.
#[derive(Debug)]
pub enum StoreError {
    /// Configuration error
    Config(String),
    /// Network/HTTP error
    Network(String),
    /// Store returned an error response
    Server { status: u16, message: String },
    /// Response body could not be decoded
    Decode(String),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Config(msg) => write!(f, "Store config error: {msg}"),
            StoreError::Network(msg) => write!(f, "Store network error: {msg}"),
            StoreError::Server { status, message } => {
                write!(f, "Store server error ({status}): {message}")
            }
            StoreError::Decode(msg) => write!(f, "Store decode error: {msg}"),
        }
    }
}

impl std::error::Error for StoreError {}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_enumerate_devices_empty_store() {
        let store = MemoryStore::new();
        assert!(enumerate_devices(&store).unwrap().is_empty());
    }

    #[test]
    fn test_enumerate_devices_lists_partitions() {
        let mut store = MemoryStore::new();
        store.insert("d2", "100", json!({}));
        store.insert("d1", "100", json!({}));
        store.insert("d1", "200", json!({}));

        let devices: Vec<_> = enumerate_devices(&store).unwrap().into_iter().collect();
        assert_eq!(devices, vec!["d1".to_string(), "d2".to_string()]);
    }

    #[test]
    fn test_store_error_display() {
        let err = StoreError::Server {
            status: 401,
            message: "Permission denied".to_string(),
        };
        assert_eq!(err.to_string(), "Store server error (401): Permission denied");
    }
}
