//! Firebase Realtime Database REST backend.
//!
//! Uses the database's REST surface: `shallow=true` listings for device
//! discovery and `orderBy="$key"` range queries for readings.

use crate::core::reading::DeviceId;
use crate::store::{RawEntry, ReadingStore, StoreError};
use reqwest::Url;

/// Store connection settings.
#[derive(Debug, Clone)]
pub struct FirebaseConfig {
    /// Database base URL, e.g. `https://<project>.firebaseio.com`
    pub database_url: String,
    /// Optional `auth` query token (database secret or ID token)
    pub auth_token: Option<String>,
    /// Top-level path holding one partition per device
    pub root: String,
}

impl FirebaseConfig {
    pub fn new(database_url: impl Into<String>, root: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            auth_token: None,
            root: root.into(),
        }
    }

    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    /// REST URL of a node, built from path segments below the base URL.
    fn node_url(&self, segments: &[&str]) -> Result<Url, StoreError> {
        if self.database_url.trim().is_empty() {
            return Err(StoreError::Config("Database URL is not set".to_string()));
        }
        let mut url = Url::parse(&self.database_url)
            .map_err(|e| StoreError::Config(format!("Invalid database URL: {e}")))?;

        let mut parts: Vec<String> = self
            .root
            .split('/')
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        parts.extend(segments.iter().map(|s| s.to_string()));
        match parts.last_mut() {
            Some(last) => last.push_str(".json"),
            None => parts.push(".json".to_string()),
        }

        url.path_segments_mut()
            .map_err(|_| StoreError::Config("Database URL cannot be a base".to_string()))?
            .pop_if_empty()
            .extend(parts);
        Ok(url)
    }

    /// URL of the device listing.
    pub fn root_url(&self) -> Result<Url, StoreError> {
        self.node_url(&[])
    }

    /// URL of one device partition.
    pub fn device_url(&self, device_id: &str) -> Result<Url, StoreError> {
        self.node_url(&[device_id])
    }
}

/// Async client for the Realtime Database REST API.
pub struct FirebaseClient {
    config: FirebaseConfig,
    client: reqwest::Client,
}

impl FirebaseClient {
    pub fn new(config: FirebaseConfig) -> Result<Self, StoreError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .map_err(|e| StoreError::Config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { config, client })
    }

    async fn get_json(
        &self,
        url: Url,
        params: &[(&str, String)],
    ) -> Result<serde_json::Value, StoreError> {
        let mut request = self.client.get(url).query(params);
        if let Some(ref token) = self.config.auth_token {
            request = request.query(&[("auth", token)]);
        }

        let response = request
            .send()
            .await
            .map_err(|e| StoreError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(StoreError::Server {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))
    }

    /// Shallow listing of device partition keys.
    pub async fn device_ids(&self) -> Result<Vec<DeviceId>, StoreError> {
        let url = self.config.root_url()?;
        let body = self
            .get_json(url, &[("shallow", "true".to_string())])
            .await?;

        match body {
            serde_json::Value::Null => Ok(Vec::new()),
            serde_json::Value::Object(map) => Ok(map.into_iter().map(|(k, _)| k).collect()),
            other => Err(StoreError::Decode(format!(
                "Expected an object of device ids, got: {other}"
            ))),
        }
    }

    /// Entries of one device ordered by key within `[start_key, end_key]`.
    pub async fn entries_in_key_range(
        &self,
        device_id: &str,
        start_key: &str,
        end_key: &str,
    ) -> Result<Vec<RawEntry>, StoreError> {
        let url = self.config.device_url(device_id)?;
        // Query parameters are JSON-encoded values.
        let params = [
            ("orderBy", "\"$key\"".to_string()),
            ("startAt", serde_json::Value::from(start_key).to_string()),
            ("endAt", serde_json::Value::from(end_key).to_string()),
        ];
        let body = self.get_json(url, &params).await?;

        match body {
            serde_json::Value::Null => Ok(Vec::new()),
            serde_json::Value::Object(map) => Ok(map.into_iter().collect()),
            other => Err(StoreError::Decode(format!(
                "Expected an object of readings for '{device_id}', got: {other}"
            ))),
        }
    }
}

/// Blocking store facade for the synchronous monitoring run.
pub struct BlockingFirebaseStore {
    inner: FirebaseClient,
    runtime: tokio::runtime::Runtime,
}

impl BlockingFirebaseStore {
    pub fn new(config: FirebaseConfig) -> Result<Self, StoreError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| StoreError::Config(format!("Failed to create runtime: {e}")))?;

        Ok(Self {
            inner: FirebaseClient::new(config)?,
            runtime,
        })
    }
}

impl ReadingStore for BlockingFirebaseStore {
    fn device_ids(&self) -> Result<Vec<DeviceId>, StoreError> {
        self.runtime.block_on(self.inner.device_ids())
    }

    fn entries_in_key_range(
        &self,
        device_id: &str,
        start_key: &str,
        end_key: &str,
    ) -> Result<Vec<RawEntry>, StoreError> {
        self.runtime
            .block_on(self.inner.entries_in_key_range(device_id, start_key, end_key))
    }
}
