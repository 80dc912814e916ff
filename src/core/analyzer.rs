//! Window analysis: tally anomalous readings and decide whether to alert.

use crate::core::classifier::{classify, Thresholds};
use crate::core::reading::{DeviceId, Reading};
use crate::notify::{Notifier, NotifyError};
use chrono_tz::Tz;

/// Immutable settings for one monitoring run.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisSettings {
    pub thresholds: Thresholds,
    /// Window length in seconds
    pub window_secs: i64,
    /// Anomalous readings needed to raise a fire alert
    pub fire_alert_count: usize,
    /// Timezone used for displayed times
    pub timezone: Tz,
    /// Also send the "status normal" message when no alert is raised
    pub notify_on_normal: bool,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            thresholds: Thresholds::default(),
            window_secs: 300,
            fire_alert_count: 3,
            timezone: chrono_tz::Asia::Taipei,
            notify_on_normal: false,
        }
    }
}

/// Outcome of the aggregate decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Alert,
    Normal,
}

/// What happened to the notification for one device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    /// No message was due
    NotSent,
    Sent,
    Failed(NotifyError),
}

impl std::fmt::Display for Delivery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Delivery::NotSent => write!(f, "not sent"),
            Delivery::Sent => write!(f, "sent"),
            Delivery::Failed(e) => write!(f, "failed: {e}"),
        }
    }
}

/// Result of analysing one device's window.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisOutcome {
    pub device_id: DeviceId,
    pub readings_analyzed: usize,
    pub anomaly_count: usize,
    /// `[HH:MM:SS] <labels>` per anomalous reading, in reading order
    pub anomaly_details: Vec<String>,
    pub decision: Decision,
    /// Message built for the decision
    pub message: String,
    pub delivery: Delivery,
}

/// Build the fire alert message.
pub fn alert_message(device_id: &str, anomaly_count: usize, details: &[String]) -> String {
    format!(
        "WARNING: device {device_id} detected multiple anomalies ({anomaly_count} total):\n{}",
        details.join("\n")
    )
}

/// Build the normal status message.
pub fn normal_message(device_id: &str) -> String {
    format!("Device [{device_id}] status normal.")
}

/// Classifies a device's readings and applies the alert rule.
#[derive(Debug, Clone)]
pub struct WindowAnalyzer {
    settings: AnalysisSettings,
}

impl WindowAnalyzer {
    pub fn new(settings: AnalysisSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &AnalysisSettings {
        &self.settings
    }

    /// Classify every reading and decide, without notifying.
    pub fn evaluate(&self, device_id: &str, readings: &[Reading]) -> AnalysisOutcome {
        let tz = self.settings.timezone;
        let mut anomaly_details = Vec::new();

        for reading in readings {
            let result = classify(reading, &self.settings.thresholds, tz);
            let status = result.status();
            tracing::info!(
                "[{device_id}] [{}] Temp: {}°C | MQ2: {} | MQ7: {} → {status}",
                result.time_str,
                reading.temperature,
                reading.mq2,
                reading.mq7,
            );

            if result.is_anomaly() {
                anomaly_details.push(format!("[{}] {status}", result.time_str));
            }
        }

        let anomaly_count = anomaly_details.len();
        let (decision, message) =
            if !readings.is_empty() && anomaly_count >= self.settings.fire_alert_count {
                (
                    Decision::Alert,
                    alert_message(device_id, anomaly_count, &anomaly_details),
                )
            } else {
                (Decision::Normal, normal_message(device_id))
            };

        AnalysisOutcome {
            device_id: device_id.to_string(),
            readings_analyzed: readings.len(),
            anomaly_count,
            anomaly_details,
            decision,
            message,
            delivery: Delivery::NotSent,
        }
    }

    /// Analyse the window and send the resulting message when one is due.
    ///
    /// Delivery failures are logged and recorded in the outcome.
    pub fn analyze<N: Notifier + ?Sized>(
        &self,
        device_id: &str,
        readings: &[Reading],
        notifier: &N,
    ) -> AnalysisOutcome {
        if readings.is_empty() {
            tracing::info!("[{device_id}] No readings within the time window");
            return self.evaluate(device_id, readings);
        }

        tracing::info!("[{device_id}] Analysing {} readings", readings.len());
        let mut outcome = self.evaluate(device_id, readings);

        let should_send = match outcome.decision {
            Decision::Alert => {
                tracing::warn!("{}", outcome.message);
                true
            }
            Decision::Normal => {
                tracing::info!("{}", outcome.message);
                self.settings.notify_on_normal
            }
        };

        if should_send {
            outcome.delivery = match notifier.send(&outcome.message) {
                Ok(()) => {
                    tracing::info!(device = %device_id, "Notification sent");
                    Delivery::Sent
                }
                Err(e) => {
                    tracing::error!(device = %device_id, "Failed to send notification: {e}");
                    Delivery::Failed(e)
                }
            };
        }

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[derive(Default)]
    struct Recorder {
        sent: RefCell<Vec<String>>,
        fail: bool,
    }

    impl Notifier for Recorder {
        fn send(&self, message: &str) -> Result<(), NotifyError> {
            self.sent.borrow_mut().push(message.to_string());
            if self.fail {
                Err(NotifyError::Rejected {
                    status: 400,
                    body: "chat not found".to_string(),
                })
            } else {
                Ok(())
            }
        }
    }

    const BASE: i64 = 1_747_057_201;

    fn hot_readings(hot: usize, normal: usize) -> Vec<Reading> {
        let mut readings = Vec::new();
        for i in 0..hot {
            readings.push(Reading::new(BASE + i as i64, 50.0, 100.0, 10.0));
        }
        for i in 0..normal {
            readings.push(Reading::new(BASE + (hot + i) as i64, 25.0, 100.0, 10.0));
        }
        readings
    }

    #[test]
    fn test_alert_at_trigger_count() {
        let analyzer = WindowAnalyzer::new(AnalysisSettings::default());
        let outcome = analyzer.evaluate("d1", &hot_readings(3, 0));
        assert_eq!(outcome.decision, Decision::Alert);
        assert_eq!(outcome.anomaly_count, 3);

        let outcome = analyzer.evaluate("d1", &hot_readings(2, 5));
        assert_eq!(outcome.decision, Decision::Normal);
        assert_eq!(outcome.anomaly_count, 2);
    }

    #[test]
    fn test_alert_message_lists_details() {
        let analyzer = WindowAnalyzer::new(AnalysisSettings::default());
        let outcome = analyzer.evaluate("d1", &hot_readings(3, 1));
        assert_eq!(
            outcome.anomaly_details,
            vec![
                "[21:40:01] high temperature",
                "[21:40:02] high temperature",
                "[21:40:03] high temperature",
            ]
        );
        assert_eq!(
            outcome.message,
            "WARNING: device d1 detected multiple anomalies (3 total):\n\
             [21:40:01] high temperature\n\
             [21:40:02] high temperature\n\
             [21:40:03] high temperature"
        );
    }

    #[test]
    fn test_evaluate_is_deterministic() {
        let analyzer = WindowAnalyzer::new(AnalysisSettings::default());
        let readings = hot_readings(4, 3);
        assert_eq!(
            analyzer.evaluate("d1", &readings),
            analyzer.evaluate("d1", &readings)
        );
    }

    #[test]
    fn test_empty_window_sends_nothing() {
        let settings = AnalysisSettings {
            notify_on_normal: true,
            ..AnalysisSettings::default()
        };
        let recorder = Recorder::default();
        let outcome = WindowAnalyzer::new(settings).analyze("d1", &[], &recorder);
        assert_eq!(outcome.readings_analyzed, 0);
        assert_eq!(outcome.delivery, Delivery::NotSent);
        assert!(recorder.sent.borrow().is_empty());
    }

    #[test]
    fn test_normal_notification_toggle() {
        let readings = hot_readings(0, 2);

        let recorder = Recorder::default();
        let outcome =
            WindowAnalyzer::new(AnalysisSettings::default()).analyze("d2", &readings, &recorder);
        assert_eq!(outcome.decision, Decision::Normal);
        assert_eq!(outcome.delivery, Delivery::NotSent);
        assert!(recorder.sent.borrow().is_empty());

        let settings = AnalysisSettings {
            notify_on_normal: true,
            ..AnalysisSettings::default()
        };
        let recorder = Recorder::default();
        let outcome = WindowAnalyzer::new(settings).analyze("d2", &readings, &recorder);
        assert_eq!(outcome.delivery, Delivery::Sent);
        assert_eq!(*recorder.sent.borrow(), vec!["Device [d2] status normal."]);
    }

    #[test]
    fn test_delivery_failure_is_recorded() {
        let recorder = Recorder {
            fail: true,
            ..Recorder::default()
        };
        let outcome = WindowAnalyzer::new(AnalysisSettings::default()).analyze(
            "d1",
            &hot_readings(5, 0),
            &recorder,
        );
        assert_eq!(outcome.decision, Decision::Alert);
        assert!(matches!(
            outcome.delivery,
            Delivery::Failed(NotifyError::Rejected { status: 400, .. })
        ));
        assert_eq!(recorder.sent.borrow().len(), 1);
    }

    #[test]
    fn test_custom_trigger_count() {
        let settings = AnalysisSettings {
            fire_alert_count: 1,
            ..AnalysisSettings::default()
        };
        let outcome = WindowAnalyzer::new(settings).evaluate("d1", &hot_readings(1, 0));
        assert_eq!(outcome.decision, Decision::Alert);
    }
}
