//! Telegram Bot API notifier.

use crate::notify::{Notifier, NotifyError};
use reqwest::StatusCode;

pub const DEFAULT_API_BASE: &str = "https://api.telegram.org";

/// Bot credentials and destination chat.
#[derive(Debug, Clone)]
pub struct TelegramConfig {
    /// API base URL (default: https://api.telegram.org)
    pub api_base: String,
    /// Bot token issued by BotFather
    pub bot_token: String,
    /// Destination chat id
    pub chat_id: String,
}

impl TelegramConfig {
    pub fn new(bot_token: impl Into<String>, chat_id: impl Into<String>) -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            bot_token: bot_token.into(),
            chat_id: chat_id.into(),
        }
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    fn method_url(&self, method: &str) -> String {
        format!(
            "{}/bot{}/{}",
            self.api_base.trim_end_matches('/'),
            self.bot_token,
            method
        )
    }

    /// URL of the `sendMessage` method.
    pub fn send_message_url(&self) -> String {
        self.method_url("sendMessage")
    }

    /// URL of the `getMe` method.
    pub fn get_me_url(&self) -> String {
        self.method_url("getMe")
    }

    fn validate(&self) -> Result<(), NotifyError> {
        if self.bot_token.trim().is_empty() {
            return Err(NotifyError::Config("Bot token is not set".to_string()));
        }
        if self.chat_id.trim().is_empty() {
            return Err(NotifyError::Config("Chat id is not set".to_string()));
        }
        Ok(())
    }
}

/// Async Telegram client.
pub struct TelegramClient {
    config: TelegramConfig,
    client: reqwest::Client,
}

impl TelegramClient {
    pub fn new(config: TelegramConfig) -> Result<Self, NotifyError> {
        config.validate()?;
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .map_err(|e| NotifyError::Config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { config, client })
    }

    /// Check that the bot token is accepted.
    pub async fn test_connection(&self) -> Result<bool, NotifyError> {
        let response = self
            .client
            .get(self.config.get_me_url())
            .send()
            .await
            .map_err(|e| NotifyError::Network(e.to_string()))?;

        Ok(response.status() == StatusCode::OK)
    }

    /// Send a text message to the configured chat. Only HTTP 200 counts as
    /// delivered.
    pub async fn send_message(&self, text: &str) -> Result<(), NotifyError> {
        let params = [("chat_id", self.config.chat_id.as_str()), ("text", text)];
        let response = self
            .client
            .post(self.config.send_message_url())
            .form(&params)
            .send()
            .await
            .map_err(|e| NotifyError::Network(e.to_string()))?;

        let status = response.status();
        tracing::debug!(status = status.as_u16(), "Telegram sendMessage answered");
        if status != StatusCode::OK {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(NotifyError::Rejected {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }
}

/// Blocking Telegram notifier for the synchronous monitoring run.
pub struct BlockingTelegramNotifier {
    inner: TelegramClient,
    runtime: tokio::runtime::Runtime,
}

impl BlockingTelegramNotifier {
    pub fn new(config: TelegramConfig) -> Result<Self, NotifyError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| NotifyError::Config(format!("Failed to create runtime: {e}")))?;

        Ok(Self {
            inner: TelegramClient::new(config)?,
            runtime,
        })
    }

    /// Check that the bot token is accepted.
    pub fn test_connection(&self) -> Result<bool, NotifyError> {
        self.runtime.block_on(self.inner.test_connection())
    }
}

impl Notifier for BlockingTelegramNotifier {
    fn send(&self, message: &str) -> Result<(), NotifyError> {
        self.runtime.block_on(self.inner.send_message(message))
    }
}
