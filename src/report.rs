//! Per-run report of what happened to each device.
//!
//! Nothing here is persisted; the report lives for one invocation and is
//! printed by the CLI when the run finishes.

use crate::core::analyzer::{AnalysisOutcome, Decision, Delivery};
use crate::core::reading::DeviceId;
use crate::core::window::Window;
use uuid::Uuid;

/// What happened to one device during a run.
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceReport {
    /// Readings were found and analysed
    Analyzed(AnalysisOutcome),
    /// Nothing in the window; analysis skipped
    NoReadings { device_id: DeviceId },
    /// Fetching the window failed; other devices were still processed
    FetchFailed { device_id: DeviceId, reason: String },
}

impl DeviceReport {
    pub fn device_id(&self) -> &str {
        match self {
            DeviceReport::Analyzed(outcome) => &outcome.device_id,
            DeviceReport::NoReadings { device_id } => device_id,
            DeviceReport::FetchFailed { device_id, .. } => device_id,
        }
    }

    pub fn outcome(&self) -> Option<&AnalysisOutcome> {
        match self {
            DeviceReport::Analyzed(outcome) => Some(outcome),
            _ => None,
        }
    }
}

/// Summary of one monitoring run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub run_id: Uuid,
    /// Window every device was analysed over
    pub window: Window,
    pub devices: Vec<DeviceReport>,
}

/// Aggregate counters over a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    pub devices_seen: usize,
    pub devices_analyzed: usize,
    pub devices_without_readings: usize,
    pub fetch_failures: usize,
    pub alerts: usize,
    pub notifications_sent: usize,
    pub notification_failures: usize,
}

impl RunReport {
    pub fn new(run_id: Uuid, window: Window) -> Self {
        Self {
            run_id,
            window,
            devices: Vec::new(),
        }
    }

    pub fn push(&mut self, device: DeviceReport) {
        self.devices.push(device);
    }

    /// Find the report for one device.
    pub fn device(&self, device_id: &str) -> Option<&DeviceReport> {
        self.devices.iter().find(|d| d.device_id() == device_id)
    }

    /// Devices whose window raised a fire alert.
    pub fn alerted_devices(&self) -> Vec<&str> {
        self.devices
            .iter()
            .filter_map(DeviceReport::outcome)
            .filter(|o| o.decision == Decision::Alert)
            .map(|o| o.device_id.as_str())
            .collect()
    }

    pub fn stats(&self) -> RunStats {
        let mut stats = RunStats {
            devices_seen: self.devices.len(),
            ..RunStats::default()
        };
        for device in &self.devices {
            match device {
                DeviceReport::Analyzed(outcome) => {
                    stats.devices_analyzed += 1;
                    if outcome.decision == Decision::Alert {
                        stats.alerts += 1;
                    }
                    match outcome.delivery {
                        Delivery::Sent => stats.notifications_sent += 1,
                        Delivery::Failed(_) => stats.notification_failures += 1,
                        Delivery::NotSent => {}
                    }
                }
                DeviceReport::NoReadings { .. } => stats.devices_without_readings += 1,
                DeviceReport::FetchFailed { .. } => stats.fetch_failures += 1,
            }
        }
        stats
    }

    /// Get a summary string for display.
    pub fn summary(&self) -> String {
        let stats = self.stats();
        let mut out = format!(
            "Run {} (window {} ~ {}):\n\
             - Devices seen: {}\n\
             - Devices analysed: {}\n\
             - Devices without readings: {}\n\
             - Fetch failures: {}\n\
             - Fire alerts: {}\n\
             - Notifications sent: {} (failed: {})",
            self.run_id,
            self.window.start,
            self.window.end,
            stats.devices_seen,
            stats.devices_analyzed,
            stats.devices_without_readings,
            stats.fetch_failures,
            stats.alerts,
            stats.notifications_sent,
            stats.notification_failures,
        );

        for device in &self.devices {
            let line = match device {
                DeviceReport::Analyzed(o) => format!(
                    "\n  {}: {:?}, {}/{} anomalous, notification {}",
                    o.device_id, o.decision, o.anomaly_count, o.readings_analyzed, o.delivery
                ),
                DeviceReport::NoReadings { device_id } => {
                    format!("\n  {device_id}: no readings in window")
                }
                DeviceReport::FetchFailed { device_id, reason } => {
                    format!("\n  {device_id}: fetch failed ({reason})")
                }
            };
            out.push_str(&line);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::NotifyError;

    fn outcome(device_id: &str, decision: Decision, delivery: Delivery) -> AnalysisOutcome {
        AnalysisOutcome {
            device_id: device_id.to_string(),
            readings_analyzed: 5,
            anomaly_count: if decision == Decision::Alert { 4 } else { 0 },
            anomaly_details: Vec::new(),
            decision,
            message: String::new(),
            delivery,
        }
    }

    fn sample_report() -> RunReport {
        let mut report = RunReport::new(Uuid::new_v4(), Window::ending_at(1000, 300));
        report.push(DeviceReport::Analyzed(outcome(
            "d1",
            Decision::Alert,
            Delivery::Sent,
        )));
        report.push(DeviceReport::Analyzed(outcome(
            "d2",
            Decision::Normal,
            Delivery::Failed(NotifyError::Network("timeout".to_string())),
        )));
        report.push(DeviceReport::NoReadings {
            device_id: "d3".to_string(),
        });
        report.push(DeviceReport::FetchFailed {
            device_id: "d4".to_string(),
            reason: "Store network error: refused".to_string(),
        });
        report
    }

    #[test]
    fn test_stats_counting() {
        let stats = sample_report().stats();
        assert_eq!(
            stats,
            RunStats {
                devices_seen: 4,
                devices_analyzed: 2,
                devices_without_readings: 1,
                fetch_failures: 1,
                alerts: 1,
                notifications_sent: 1,
                notification_failures: 1,
            }
        );
    }

    #[test]
    fn test_lookup_and_alerted() {
        let report = sample_report();
        assert_eq!(report.alerted_devices(), vec!["d1"]);
        assert!(matches!(
            report.device("d3"),
            Some(DeviceReport::NoReadings { .. })
        ));
        assert!(report.device("d9").is_none());
    }

    #[test]
    fn test_summary_format() {
        let summary = sample_report().summary();
        assert!(summary.contains("Devices seen: 4"));
        assert!(summary.contains("Fire alerts: 1"));
        assert!(summary.contains("d1: Alert, 4/5 anomalous, notification sent"));
        assert!(summary.contains("d3: no readings in window"));
        assert!(summary.contains("d4: fetch failed"));
    }
}
