//! Report sinks

use super::tracker::StatusReport;
use std::sync::{Arc, Mutex};
use tracing::info;

/// Destination for status reports
///
/// Lines of one report must be written in the order given.
pub trait Reporter: Send + Sync {
    fn emit(&self, report: &StatusReport);
}

/// Writes reports to the log at INFO level
#[derive(Debug, Default, Clone, Copy)]
pub struct LogReporter;

impl Reporter for LogReporter {
    fn emit(&self, report: &StatusReport) {
        info!("-- {} --", report.header());
        for line in &report.lines {
            info!("{}", line.render());
        }
    }
}

/// Keeps rendered reports in memory
///
/// Useful when embedding the monitor and for tests. Clones share storage.
#[derive(Debug, Default, Clone)]
pub struct MemoryReporter {
    reports: Arc<Mutex<Vec<Vec<String>>>>,
}

impl MemoryReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rendered lines of every report so far, oldest first
    pub fn reports(&self) -> Vec<Vec<String>> {
        self.reports
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }
}

impl Reporter for MemoryReporter {
    fn emit(&self, report: &StatusReport) {
        if let Ok(mut reports) = self.reports.lock() {
            reports.push(report.render_lines());
        }
    }
}
