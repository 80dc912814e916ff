//! Configuration for the Firewatch agent.
//!
//! Settings are read from a JSON file in the user config directory, then
//! credentials and the run mode are overridden from the environment (a `.env`
//! file is honoured by the binary).

use crate::core::analyzer::AnalysisSettings;
use crate::core::classifier::Thresholds;
use crate::notify::telegram::{TelegramConfig, DEFAULT_API_BASE};
use crate::store::FirebaseConfig;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const ENV_DATABASE_URL: &str = "FIREBASE_DATABASE_URL";
pub const ENV_AUTH_TOKEN: &str = "FIREBASE_AUTH_TOKEN";
pub const ENV_BOT_TOKEN: &str = "TELEGRAM_BOT_TOKEN";
pub const ENV_CHAT_ID: &str = "TELEGRAM_CHAT_ID";
pub const ENV_MODE: &str = "FIREWATCH_MODE";
pub const ENV_REFERENCE_TIMESTAMP: &str = "FIREWATCH_REFERENCE_TIMESTAMP";
pub const ENV_TIMEZONE: &str = "FIREWATCH_TIMEZONE";

/// How the reference instant is chosen and whether normal status is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    /// Anchor windows at the current time
    #[default]
    Live,
    /// Anchor windows at a fixed instant and report normal status too
    Verification,
}

impl std::str::FromStr for RunMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "live" => Ok(RunMode::Live),
            "verification" | "test" => Ok(RunMode::Verification),
            other => Err(ConfigError::Invalid(format!("Unknown run mode '{other}'"))),
        }
    }
}

/// Main configuration for the agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Alert thresholds
    pub thresholds: Thresholds,

    /// Length of the analysis window
    #[serde(with = "duration_serde")]
    pub window_duration: Duration,

    /// Anomalous readings in a window needed to raise a fire alert
    pub fire_alert_count: usize,

    /// IANA timezone for displayed times
    pub timezone: String,

    /// Run mode
    pub mode: RunMode,

    /// Fixed reference instant (epoch seconds) for verification runs
    pub reference_timestamp: Option<i64>,

    /// Send "status normal" messages; defaults to on in verification mode
    pub notify_on_normal: Option<bool>,

    /// Reading store settings
    pub store: StoreSettings,

    /// Telegram settings
    pub telegram: TelegramSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            thresholds: Thresholds::default(),
            window_duration: Duration::from_secs(5 * 60),
            fire_alert_count: 3,
            timezone: "Asia/Taipei".to_string(),
            mode: RunMode::Live,
            reference_timestamp: None,
            notify_on_normal: None,
            store: StoreSettings::default(),
            telegram: TelegramSettings::default(),
        }
    }
}

/// Reading store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    pub database_url: String,
    pub auth_token: Option<String>,
    /// Path holding one partition per device
    pub root: String,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            database_url: String::new(),
            auth_token: None,
            root: "sensor_data".to_string(),
        }
    }
}

/// Telegram settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelegramSettings {
    pub api_base: String,
    pub bot_token: String,
    pub chat_id: String,
}

impl Default for TelegramSettings {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            bot_token: String::new(),
            chat_id: String::new(),
        }
    }
}

impl Config {
    /// Load configuration from the default location and apply the
    /// environment.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::load_from(&Self::config_path())?;
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Load configuration from a file, falling back to defaults when absent.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            let content =
                std::fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;
            let config: Config = serde_json::from_str(&content)
                .map_err(|e| ConfigError::ParseError(e.to_string()))?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::config_path())
    }

    /// Save configuration to a file.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::IoError(e.to_string()))?;
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(path, content).map_err(|e| ConfigError::IoError(e.to_string()))?;

        Ok(())
    }

    /// Get the path to the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("firewatch-agent")
            .join("config.json")
    }

    /// Override credentials and mode from environment-style lookups.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_DATABASE_URL) {
            self.store.database_url = url;
        }
        if let Some(token) = lookup(ENV_AUTH_TOKEN) {
            self.store.auth_token = Some(token);
        }
        if let Some(token) = lookup(ENV_BOT_TOKEN) {
            self.telegram.bot_token = token;
        }
        if let Some(chat_id) = lookup(ENV_CHAT_ID) {
            self.telegram.chat_id = chat_id;
        }
        if let Some(mode) = lookup(ENV_MODE) {
            self.mode = mode.parse()?;
        }
        if let Some(ts) = lookup(ENV_REFERENCE_TIMESTAMP) {
            let ts = ts.trim().parse::<i64>().map_err(|e| {
                ConfigError::Invalid(format!("{ENV_REFERENCE_TIMESTAMP} '{ts}': {e}"))
            })?;
            self.reference_timestamp = Some(ts);
        }
        if let Some(tz) = lookup(ENV_TIMEZONE) {
            self.timezone = tz;
        }
        Ok(())
    }

    /// Parsed display timezone.
    pub fn tz(&self) -> Result<Tz, ConfigError> {
        self.timezone
            .parse::<Tz>()
            .map_err(|e| ConfigError::Invalid(format!("Unknown timezone '{}': {e}", self.timezone)))
    }

    /// Whether normal-status messages are sent.
    pub fn notify_on_normal(&self) -> bool {
        self.notify_on_normal
            .unwrap_or(self.mode == RunMode::Verification)
    }

    /// The fixed reference instant, if this run uses one.
    ///
    /// Verification mode requires one.
    pub fn fixed_reference(&self) -> Result<Option<i64>, ConfigError> {
        match (self.mode, self.reference_timestamp) {
            (RunMode::Verification, None) => Err(ConfigError::Invalid(
                "Verification mode needs a reference timestamp".to_string(),
            )),
            (RunMode::Verification, Some(ts)) => Ok(Some(ts)),
            (RunMode::Live, _) => Ok(None),
        }
    }

    /// Validate and freeze the settings used by the analysis pipeline.
    pub fn settings(&self) -> Result<AnalysisSettings, ConfigError> {
        if self.fire_alert_count == 0 {
            return Err(ConfigError::Invalid(
                "fire_alert_count must be at least 1".to_string(),
            ));
        }
        let window_secs = i64::try_from(self.window_duration.as_secs())
            .map_err(|_| ConfigError::Invalid("window_duration is too large".to_string()))?;
        if window_secs == 0 {
            return Err(ConfigError::Invalid(
                "window_duration must be positive".to_string(),
            ));
        }

        Ok(AnalysisSettings {
            thresholds: self.thresholds,
            window_secs,
            fire_alert_count: self.fire_alert_count,
            timezone: self.tz()?,
            notify_on_normal: self.notify_on_normal(),
        })
    }

    /// Store connection settings.
    pub fn firebase(&self) -> FirebaseConfig {
        let config = FirebaseConfig::new(&self.store.database_url, &self.store.root);
        match self.store.auth_token {
            Some(ref token) => config.with_auth_token(token),
            None => config,
        }
    }

    /// Telegram connection settings.
    pub fn telegram(&self) -> TelegramConfig {
        TelegramConfig::new(&self.telegram.bot_token, &self.telegram.chat_id)
            .with_api_base(&self.telegram.api_base)
    }

    /// Copy with credentials masked, for display.
    pub fn redacted(&self) -> Self {
        fn mask(s: &str) -> String {
            if s.is_empty() {
                String::new()
            } else {
                "********".to_string()
            }
        }

        let mut config = self.clone();
        config.store.auth_token = config.store.auth_token.as_deref().map(mask);
        config.telegram.bot_token = mask(&config.telegram.bot_token);
        config
    }
}

/// Configuration errors.
#[derive(Debug)]
pub enum ConfigError {
    IoError(String),
    ParseError(String),
    SerializeError(String),
    Invalid(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "IO error: {e}"),
            ConfigError::ParseError(e) => write!(f, "Parse error: {e}"),
            ConfigError::SerializeError(e) => write!(f, "Serialize error: {e}"),
            ConfigError::Invalid(e) => write!(f, "Invalid configuration: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Serde support for Duration.
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_secs().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.window_duration, Duration::from_secs(300));
        assert_eq!(config.thresholds, Thresholds::default());
        assert_eq!(config.fire_alert_count, 3);
        assert_eq!(config.mode, RunMode::Live);
        assert!(!config.notify_on_normal());

        let settings = config.settings().unwrap();
        assert_eq!(settings.window_secs, 300);
        assert_eq!(settings.timezone, chrono_tz::Asia::Taipei);
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config
            .apply_env(env(&[
                (ENV_DATABASE_URL, "https://demo.firebaseio.com"),
                (ENV_BOT_TOKEN, "123:abc"),
                (ENV_CHAT_ID, "42"),
                (ENV_MODE, "verification"),
                (ENV_REFERENCE_TIMESTAMP, "1747057201"),
            ]))
            .unwrap();

        assert_eq!(config.store.database_url, "https://demo.firebaseio.com");
        assert_eq!(config.telegram.bot_token, "123:abc");
        assert_eq!(config.mode, RunMode::Verification);
        assert_eq!(config.fixed_reference().unwrap(), Some(1_747_057_201));
        assert!(config.notify_on_normal());
    }

    #[test]
    fn test_invalid_env_values() {
        let mut config = Config::default();
        assert!(config.apply_env(env(&[(ENV_MODE, "sometimes")])).is_err());
        assert!(config
            .apply_env(env(&[(ENV_REFERENCE_TIMESTAMP, "yesterday")]))
            .is_err());
    }

    #[test]
    fn test_verification_requires_reference() {
        let config = Config {
            mode: RunMode::Verification,
            ..Config::default()
        };
        assert!(config.fixed_reference().is_err());
    }

    #[test]
    fn test_notify_on_normal_override() {
        let config = Config {
            mode: RunMode::Verification,
            notify_on_normal: Some(false),
            ..Config::default()
        };
        assert!(!config.notify_on_normal());
    }

    #[test]
    fn test_settings_validation() {
        let config = Config {
            fire_alert_count: 0,
            ..Config::default()
        };
        assert!(config.settings().is_err());

        let config = Config {
            timezone: "Mars/Olympus".to_string(),
            ..Config::default()
        };
        assert!(config.settings().is_err());

        let config = Config {
            window_duration: Duration::ZERO,
            ..Config::default()
        };
        assert!(config.settings().is_err());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{ "window_duration": 600, "thresholds": { "temperature": 50, "mq2": 2000, "mq7": 100 } }"#,
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.window_duration, Duration::from_secs(600));
        assert_eq!(config.thresholds.temperature, 50.0);
        assert_eq!(config.fire_alert_count, 3);
        assert_eq!(config.store.root, "sensor_data");
    }

    #[test]
    fn test_save_and_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let config = Config {
            fire_alert_count: 5,
            ..Config::default()
        };
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.fire_alert_count, 5);
    }

    #[test]
    fn test_rewriting_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "fire_alert_count": 4 }"#).unwrap();

        Config::load_from(&path).unwrap().save_to(&path).unwrap();

        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written["fire_alert_count"], 4);
        assert_eq!(written["window_duration"], 300);
        assert_eq!(written["store"]["root"], "sensor_data");
        assert_eq!(written["telegram"]["bot_token"], "");
    }

    #[test]
    fn test_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("absent.json")).unwrap();
        assert_eq!(config.fire_alert_count, 3);
    }

    #[test]
    fn test_redacted_masks_secrets() {
        let mut config = Config::default();
        config.telegram.bot_token = "123:abc".to_string();
        config.store.auth_token = Some("secret".to_string());

        let redacted = config.redacted();
        assert_eq!(redacted.telegram.bot_token, "********");
        assert_eq!(redacted.store.auth_token.as_deref(), Some("********"));
        assert_eq!(Config::default().redacted().telegram.bot_token, "");
    }
}
