//! sharewatch - availability monitor for a file share host
//!
//! Core library: probes, transition tracking and the tick scheduler, plus the
//! platform capabilities the binary wires into them.

// Public modules
pub mod constants;
pub mod core;
pub mod logger;
pub mod models;
pub mod platform;
pub mod utils;

// Re-export commonly used types
pub use core::{
    standard_probe_set, LogReporter, Monitor, Probe, ProbeKind, ProbeResult, ProbeSet, Reporter,
    Scheduler, StateTracker, StatusReport,
};
pub use models::{ConfigLayer, MonitorConfig, SecureString, ShareCredentials, Username};
pub use utils::{ConfigError, MonitorError, PingError, SessionError};
