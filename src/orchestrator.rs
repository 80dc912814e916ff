//! Drives one monitoring run across every device in the store.

use crate::core::analyzer::{AnalysisSettings, WindowAnalyzer};
use crate::core::clock::{format_local_datetime, Clock};
use crate::core::window::WindowFetcher;
use crate::notify::Notifier;
use crate::report::{DeviceReport, RunReport};
use crate::store::{enumerate_devices, ReadingStore, StoreError};
use uuid::Uuid;

/// Runs enumerate → fetch → analyse for every device, one device at a time.
pub struct Orchestrator<S, N, C> {
    store: S,
    notifier: N,
    clock: C,
    fetcher: WindowFetcher,
    analyzer: WindowAnalyzer,
}

impl<S, N, C> Orchestrator<S, N, C>
where
    S: ReadingStore,
    N: Notifier,
    C: Clock,
{
    pub fn new(store: S, notifier: N, clock: C, settings: AnalysisSettings) -> Self {
        Self {
            store,
            notifier,
            clock,
            fetcher: WindowFetcher::new(settings.window_secs),
            analyzer: WindowAnalyzer::new(settings),
        }
    }

    /// Execute one run.
    ///
    /// Only a failed device enumeration is returned as an error; per-device
    /// failures are recorded in the report and the run moves on.
    pub fn run(&self) -> Result<RunReport, StoreError> {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("run", %run_id);
        let _guard = span.enter();

        let reference = self.clock.now_timestamp();
        let window = self.fetcher.window_for(reference);
        let mut report = RunReport::new(run_id, window);

        let devices = enumerate_devices(&self.store)?;
        let tz = self.analyzer.settings().timezone;

        for device_id in devices {
            let (window, readings) = match self.fetcher.fetch(&self.store, &device_id, reference) {
                Ok(fetched) => fetched,
                Err(e) => {
                    tracing::error!(device = %device_id, "Failed to fetch readings: {e}");
                    report.push(DeviceReport::FetchFailed {
                        device_id,
                        reason: e.to_string(),
                    });
                    continue;
                }
            };

            if readings.is_empty() {
                report.push(DeviceReport::NoReadings { device_id });
                continue;
            }

            tracing::info!(
                "=== device {device_id} window: {} ~ {}",
                format_local_datetime(window.start, tz),
                format_local_datetime(window.end, tz),
            );
            let outcome = self.analyzer.analyze(&device_id, &readings, &self.notifier);
            report.push(DeviceReport::Analyzed(outcome));
        }

        let stats = report.stats();
        tracing::info!(
            devices = stats.devices_seen,
            alerts = stats.alerts,
            "Run complete"
        );
        Ok(report)
    }
}
