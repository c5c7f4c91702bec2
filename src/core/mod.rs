//! Core monitoring engine (platform-agnostic)
//!
//! CRITICAL: This module MUST NOT import platform-specific code. Probes reach
//! the outside world only through the capability traits in [`session`].

pub mod monitor;
pub mod probe;
pub mod probes;
pub mod report;
pub mod scheduler;
pub mod session;
pub mod tracker;

// Test utilities for mock capabilities (tests only)
#[cfg(test)]
pub mod mock_session;

pub use monitor::Monitor;
pub use probe::{Probe, ProbeKind, ProbeResult, ProbeSet};
pub use probes::{standard_probe_set, FileProbe, ReachabilityProbe, SessionProbe};
pub use report::{LogReporter, MemoryReporter, Reporter};
pub use scheduler::{Scheduler, Tick};
pub use session::{Pinger, SessionParams, ShareConnector, ShareSession};
pub use tracker::{StateTracker, StatusLine, StatusReport};
