//! Probe abstraction
//!
//! A probe performs one accessibility check and folds every failure into a
//! [`ProbeResult`]. Probes never return errors: a failed check is data for the
//! state tracker, not control flow.

use async_trait::async_trait;
use std::fmt;

/// The probes known to the monitor, in report order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ProbeKind {
    Reachability,
    AuthenticatedSession,
    FileReadability,
}

impl ProbeKind {
    /// All kinds in the fixed evaluation and report order
    pub const ALL: [ProbeKind; 3] = [
        ProbeKind::Reachability,
        ProbeKind::AuthenticatedSession,
        ProbeKind::FileReadability,
    ];

    /// Stable machine name (e.g. "reachability")
    pub fn name(&self) -> &'static str {
        match self {
            ProbeKind::Reachability => "reachability",
            ProbeKind::AuthenticatedSession => "authenticated_session",
            ProbeKind::FileReadability => "file_readability",
        }
    }

    /// Label used in status report lines
    pub fn label(&self) -> &'static str {
        match self {
            ProbeKind::Reachability => "Ping",
            ProbeKind::AuthenticatedSession => "Cifs",
            ProbeKind::FileReadability => "Read file",
        }
    }
}

impl fmt::Display for ProbeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Outcome of one probe run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeResult {
    pub kind: ProbeKind,
    /// Whether the check passed
    pub ok: bool,
    /// Failure reason or other diagnostic text
    pub detail: Option<String>,
    /// False when the probe is switched off by configuration
    pub enabled: bool,
}

impl ProbeResult {
    pub fn passed(kind: ProbeKind) -> Self {
        Self {
            kind,
            ok: true,
            detail: None,
            enabled: true,
        }
    }

    pub fn failed(kind: ProbeKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            ok: false,
            detail: Some(detail.into()),
            enabled: true,
        }
    }

    /// A disabled probe always reports ok and never shows up in a report
    pub fn disabled(kind: ProbeKind) -> Self {
        Self {
            kind,
            ok: true,
            detail: None,
            enabled: false,
        }
    }

    pub fn name(&self) -> &'static str {
        self.kind.name()
    }
}

/// A single accessibility check
#[async_trait]
pub trait Probe: Send + Sync {
    fn kind(&self) -> ProbeKind;

    /// Run the check once. Implementations must not panic or return early on
    /// failure; every error becomes `ok: false`.
    async fn run(&self) -> ProbeResult;
}

/// Ordered set of probes executed once per tick
pub struct ProbeSet {
    probes: Vec<Box<dyn Probe>>,
}

impl ProbeSet {
    /// Build a set; probes are sorted into report order
    pub fn new(mut probes: Vec<Box<dyn Probe>>) -> Self {
        probes.sort_by_key(|p| p.kind());
        Self { probes }
    }

    pub fn len(&self) -> usize {
        self.probes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.probes.is_empty()
    }

    /// Run every probe sequentially in order
    ///
    /// A failing probe does not stop the ones after it.
    pub async fn run_all(&self) -> Vec<ProbeResult> {
        let mut results = Vec::with_capacity(self.probes.len());
        for probe in &self.probes {
            results.push(probe.run().await);
        }
        results
    }
}
