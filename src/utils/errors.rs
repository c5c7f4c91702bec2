//! Error types for sharewatch
//!
//! All error types use thiserror for clean error handling.
//! SECURITY: Error messages MUST NOT contain passwords or sensitive data.

use std::time::Duration;

/// Top-level error type for the monitor
///
/// Probe failures never show up here; they are folded into a `ProbeResult`
/// at the probe boundary. Only faults outside the probes end up as a
/// `MonitorError`.
#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Tick failed: {0}")]
    Tick(String),
}

/// Errors from share session establishment
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Server rejected negotiation (status 0x{0:08X})")]
    Rejected(u32),

    #[error("Authentication failed (status 0x{0:08X})")]
    Authentication(u32),
}

/// Errors from the host reachability check
#[derive(Debug, thiserror::Error)]
pub enum PingError {
    #[error("Failed to start ping: {0}")]
    Spawn(String),

    #[error("No reply from host ({0})")]
    NoReply(String),

    #[error("Ping did not finish within {0:?}")]
    Timeout(Duration),
}

/// Errors from loading or validating the monitor configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Host is required")]
    MissingHost,

    #[error("Invalid host: {0}")]
    InvalidHost(String),

    #[error("Invalid port: {0}")]
    InvalidPort(u32),

    #[error("Tick time must be greater than zero")]
    InvalidTickTime,

    #[error("Invalid username: {0}")]
    InvalidUsername(String),

    #[error("Failed to read config file {path}: {reason}")]
    Read { path: String, reason: String },

    #[error("Failed to parse config file {path}: {reason}")]
    Parse { path: String, reason: String },
}
