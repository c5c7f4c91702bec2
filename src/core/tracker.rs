//! Edge-triggered status tracking
//!
//! The tracker remembers the outcomes it last *reported* and turns each
//! tick's fresh results into a [`StatusReport`] only when something differs.
//! Building the report and committing the new state happen in the same call,
//! so a transition can never be absorbed without being reported.

use super::probe::{ProbeKind, ProbeResult};
use std::collections::HashMap;

/// One probe line in a report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusLine {
    pub kind: ProbeKind,
    pub ok: bool,
}

impl StatusLine {
    /// e.g. "Ping: true"
    pub fn render(&self) -> String {
        format!("{}: {}", self.kind.label(), self.ok)
    }
}

/// Block of lines describing a transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusReport {
    /// First report since process start
    pub initial: bool,
    pub lines: Vec<StatusLine>,
}

impl StatusReport {
    pub fn header(&self) -> &'static str {
        if self.initial {
            "Initial status"
        } else {
            "Status changed"
        }
    }

    /// Header followed by one line per reported probe
    pub fn render_lines(&self) -> Vec<String> {
        std::iter::once(self.header().to_string())
            .chain(self.lines.iter().map(StatusLine::render))
            .collect()
    }
}

/// Last reported outcome per probe
#[derive(Debug, Default)]
pub struct StateTracker {
    last_reported: HashMap<ProbeKind, bool>,
    initialized: bool,
}

impl StateTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Last reported outcome of a probe, `None` before the first report
    pub fn last_reported(&self, kind: ProbeKind) -> Option<bool> {
        self.last_reported.get(&kind).copied()
    }

    /// Fold one tick's results into the tracker
    ///
    /// Returns the report to emit, or `None` when nothing changed since the
    /// last report. State is only updated when a report is returned.
    pub fn observe(&mut self, results: &[ProbeResult]) -> Option<StatusReport> {
        let mut ordered: Vec<&ProbeResult> = results.iter().collect();
        ordered.sort_by_key(|r| r.kind);

        let changed: Vec<&ProbeResult> = ordered
            .into_iter()
            .filter(|r| !self.initialized || self.last_reported.get(&r.kind) != Some(&r.ok))
            .collect();

        if changed.is_empty() {
            return None;
        }

        let report = StatusReport {
            initial: !self.initialized,
            lines: changed
                .iter()
                .filter(|r| r.enabled)
                .map(|r| StatusLine {
                    kind: r.kind,
                    ok: r.ok,
                })
                .collect(),
        };

        for result in results {
            self.last_reported.insert(result.kind, result.ok);
        }
        self.initialized = true;

        Some(report)
    }
}
