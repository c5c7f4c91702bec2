//! # Utilities Module
//!
//! Cross-cutting concerns shared by the engine and the platform capabilities.
//!
//! - [`errors`]: Typed error hierarchy using `thiserror` for domain-specific errors
//!
//! Error types live here so that `core` and `platform` can both depend on
//! them without depending on each other.

pub mod errors;

pub use errors::{ConfigError, MonitorError, PingError, SessionError};
