//! Firewatch Agent - windowed fire-risk monitor for remote sensors.
//!
//! Each run looks at the last few minutes of readings from every device in
//! the store, classifies each reading against temperature, smoke and carbon
//! monoxide thresholds, and sends a fire alert when enough readings in the
//! window are anomalous.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Firewatch Agent                         │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌─────────────┐   ┌─────────────┐   ┌─────────────┐       │
//! │  │   Device    │──▶│   Window    │──▶│   Window    │       │
//! │  │ Enumerator  │   │   Fetcher   │   │  Analyzer   │       │
//! │  └─────────────┘   └─────────────┘   └─────────────┘       │
//! │         ▲                 ▲                 │              │
//! │         │                 │                 ▼              │
//! │  ┌─────────────────────────────┐     ┌─────────────┐       │
//! │  │     Reading store (REST)    │     │  Notifier   │       │
//! │  └─────────────────────────────┘     └─────────────┘       │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use firewatch_agent::{Config, ConsoleNotifier, MemoryStore, Orchestrator, SystemClock};
//!
//! let config = Config::default();
//! let settings = config.settings().expect("valid configuration");
//! let store = MemoryStore::new();
//!
//! let orchestrator = Orchestrator::new(store, ConsoleNotifier, SystemClock, settings);
//! let report = orchestrator.run().expect("store reachable");
//! println!("{}", report.summary());
//! ```

pub mod config;
pub mod core;
pub mod notify;
pub mod orchestrator;
pub mod report;
pub mod store;

// Re-export key types at crate root for convenience
pub use config::{Config, ConfigError, RunMode};
pub use self::core::{
    AnalysisOutcome, AnalysisSettings, Clock, Decision, Delivery, FixedClock, Reading,
    SystemClock, Thresholds, Window, WindowAnalyzer, WindowFetcher,
};
pub use notify::{BlockingTelegramNotifier, ConsoleNotifier, Notifier, NotifyError, TelegramConfig};
pub use orchestrator::Orchestrator;
pub use report::{DeviceReport, RunReport, RunStats};
pub use store::{BlockingFirebaseStore, FirebaseConfig, MemoryStore, ReadingStore, StoreError};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
