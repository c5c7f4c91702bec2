//! Monitor: probes, tracker and reporter wired into one tick

use super::probe::ProbeSet;
use super::report::Reporter;
use super::scheduler::Tick;
use super::tracker::{StateTracker, StatusReport};
use crate::utils::MonitorError;
use async_trait::async_trait;
use tracing::debug;

/// Runs the probe set and reports transitions
///
/// Owns the only [`StateTracker`]; it starts uninitialized, so the first
/// tick after construction always produces the initial report.
pub struct Monitor {
    probes: ProbeSet,
    tracker: StateTracker,
    reporter: Box<dyn Reporter>,
}

impl Monitor {
    pub fn new(probes: ProbeSet, reporter: Box<dyn Reporter>) -> Self {
        Self {
            probes,
            tracker: StateTracker::new(),
            reporter,
        }
    }

    pub fn tracker(&self) -> &StateTracker {
        &self.tracker
    }

    /// Run one tick and return the report emitted, if any
    pub async fn tick_once(&mut self) -> Option<StatusReport> {
        let results = self.probes.run_all().await;

        for result in &results {
            debug!(
                probe = result.name(),
                ok = result.ok,
                detail = result.detail.as_deref().unwrap_or(""),
                "probe finished"
            );
        }

        let report = self.tracker.observe(&results)?;
        self.reporter.emit(&report);
        Some(report)
    }
}

#[async_trait]
impl Tick for Monitor {
    async fn tick(&mut self) -> Result<(), MonitorError> {
        self.tick_once().await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::mock_session::{MockPinger, MockShareConnector, MockShareMode};
    use crate::core::probes::standard_probe_set;
    use crate::core::report::MemoryReporter;
    use crate::core::scheduler::Scheduler;
    use crate::models::{ConfigLayer, MonitorConfig};
    use std::sync::Arc;
    use std::time::Duration;

    fn config(filename: Option<String>) -> MonitorConfig {
        MonitorConfig::validate(ConfigLayer {
            host: Some("fileserver".to_string()),
            filename,
            ..Default::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_session_outage_and_recovery() {
        let pinger = MockPinger::new(true);
        let connector = MockShareConnector::available();
        let reporter = MemoryReporter::new();

        let probes = standard_probe_set(
            &config(None),
            Arc::new(pinger.clone()),
            Arc::new(connector.clone()),
        );
        let mut monitor = Monitor::new(probes, Box::new(reporter.clone()));

        monitor.tick_once().await;
        connector.set_mode(MockShareMode::Refused);
        monitor.tick_once().await;
        monitor.tick_once().await;
        connector.set_mode(MockShareMode::Available {
            signing_required: false,
            authenticated: true,
        });
        monitor.tick_once().await;

        assert_eq!(
            reporter.reports(),
            vec![
                vec!["Initial status", "Ping: true", "Cifs: true"],
                vec!["Status changed", "Cifs: false"],
                vec!["Status changed", "Cifs: true"],
            ]
            .into_iter()
            .map(|r| r.into_iter().map(String::from).collect::<Vec<_>>())
            .collect::<Vec<_>>()
        );
        assert_eq!(pinger.calls(), 4);
        assert_eq!(connector.opened(), connector.released());
    }

    #[tokio::test(start_paused = true)]
    async fn test_scheduler_drives_monitor() {
        let reporter = MemoryReporter::new();
        let probes = standard_probe_set(
            &config(None),
            Arc::new(MockPinger::new(true)),
            Arc::new(MockShareConnector::available()),
        );
        let mut monitor = Monitor::new(probes, Box::new(reporter.clone()));

        let ticks = Scheduler::new(Duration::from_millis(1000))
            .run(
                &mut monitor,
                tokio::time::sleep(Duration::from_millis(10_500)),
            )
            .await
            .unwrap();

        assert_eq!(ticks, 11);
        assert_eq!(reporter.reports().len(), 1);
        assert!(monitor.tracker().is_initialized());
    }
}
