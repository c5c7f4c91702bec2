//! External capabilities consumed by the probes
//!
//! These traits keep the engine free of platform code and allow testing
//! without a real share host. Concrete implementations live in
//! `src/platform/`.

use crate::models::ShareCredentials;
use crate::utils::{PingError, SessionError};
use async_trait::async_trait;

/// Parameters for establishing a share session
#[derive(Debug, Clone)]
pub struct SessionParams {
    pub host: String,
    pub port: u16,
    pub credentials: ShareCredentials,
}

impl SessionParams {
    /// `host:port` for socket addressing and log lines
    pub fn target(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// An established session with the share host
///
/// Callers must hand the session back through [`ShareSession::release`]
/// once they are done with it.
#[async_trait]
pub trait ShareSession: Send {
    /// Server requires message signing
    fn signing_required(&self) -> bool;

    /// Session carries an authenticated user
    fn is_authenticated(&self) -> bool;

    /// Negotiated protocol dialect (e.g. "3.0.2")
    fn dialect(&self) -> String;

    /// Tear the session down and free its resources
    async fn release(self: Box<Self>);
}

/// Establishes sessions with a share host
#[async_trait]
pub trait ShareConnector: Send + Sync {
    /// Open a session. On error no resources may remain held.
    async fn connect(&self, params: &SessionParams) -> Result<Box<dyn ShareSession>, SessionError>;
}

/// Single round-trip reachability check against a host
#[async_trait]
pub trait Pinger: Send + Sync {
    async fn ping(&self, host: &str) -> Result<(), PingError>;
}
