//! Outbound notification sinks.
//!
//! A notifier delivers one text message to a fixed destination. Failures are
//! returned to the caller, which logs them; they never stop a monitoring run.

pub mod console;
pub mod telegram;

pub use console::ConsoleNotifier;
pub use telegram::{BlockingTelegramNotifier, TelegramClient, TelegramConfig};

/// A "send text message" sink.
pub trait Notifier {
    fn send(&self, message: &str) -> Result<(), NotifyError>;
}

impl<T: Notifier + ?Sized> Notifier for &T {
    fn send(&self, message: &str) -> Result<(), NotifyError> {
        (**self).send(message)
    }
}

impl<T: Notifier + ?Sized> Notifier for Box<T> {
    fn send(&self, message: &str) -> Result<(), NotifyError> {
        (**self).send(message)
    }
}

/// Notification delivery errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotifyError {
    /// Configuration error
    Config(String),
    /// Network/HTTP error
    Network(String),
    /// The sink answered with a non-success status
    Rejected { status: u16, body: String },
}

impl std::fmt::Display for NotifyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotifyError::Config(msg) => write!(f, "Notifier config error: {msg}"),
            NotifyError::Network(msg) => write!(f, "Notifier network error: {msg}"),
            NotifyError::Rejected { status, body } => {
                write!(f, "Notification rejected ({status}): {body}")
            }
        }
    }
}

impl std::error::Error for NotifyError {}
