//! Core monitoring pipeline.
//!
//! This module contains:
//! - Reading types and the time window fetch
//! - Per-reading threshold classification
//! - Window analysis and the fire alert decision
//! - Reference clocks and local time formatting

pub mod analyzer;
pub mod classifier;
pub mod clock;
pub mod reading;
pub mod window;

// Re-export commonly used types
pub use analyzer::{AnalysisOutcome, AnalysisSettings, Decision, Delivery, WindowAnalyzer};
pub use classifier::{classify, ClassificationResult, Thresholds};
pub use clock::{format_local_datetime, format_local_time, Clock, FixedClock, SystemClock};
pub use reading::{DeviceId, Reading};
pub use window::{Window, WindowFetcher};
