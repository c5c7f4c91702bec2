//! # Domain Models
//!
//! Configuration and credential types.
//!
//! ## Security Design
//!
//! The [`SecureString`] type holds the share password:
//! - Password data is zeroed on drop to prevent leakage via swap/core dumps
//! - Never exposed in `Debug` or `Display` implementations
//!
//! Passwords reach the process through the command line, the
//! `SHAREWATCH_PASSWORD` environment variable or a config file, and are never
//! written to logs.

pub mod config;
pub mod credentials;

pub use config::{ConfigLayer, MonitorConfig};
pub use credentials::{SecureString, ShareCredentials, Username};
