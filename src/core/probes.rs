//! The three accessibility probes run every tick
//!
//! Each probe wraps one external capability and converts whatever that
//! capability reports into a [`ProbeResult`]:
//! - [`ReachabilityProbe`] - one ping round-trip to the host
//! - [`SessionProbe`] - establish (and release) a share session
//! - [`FileProbe`] - existence check plus a full read of a configured file
//!
//! # Example
//!
//! ```ignore
//! use sharewatch::core::standard_probe_set;
//! use sharewatch::platform::{SmbConnector, SystemPinger};
//!
//! let probes = standard_probe_set(&config, Arc::new(SystemPinger::new()), Arc::new(SmbConnector::new()));
//! let results = probes.run_all().await;
//! ```

use super::probe::{Probe, ProbeKind, ProbeResult, ProbeSet};
use super::session::{Pinger, SessionParams, ShareConnector};
use crate::models::MonitorConfig;
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, warn};

/// Network reachability via a single ping
pub struct ReachabilityProbe {
    host: String,
    pinger: Arc<dyn Pinger>,
}

impl ReachabilityProbe {
    pub fn new(host: impl Into<String>, pinger: Arc<dyn Pinger>) -> Self {
        Self {
            host: host.into(),
            pinger,
        }
    }
}

#[async_trait]
impl Probe for ReachabilityProbe {
    fn kind(&self) -> ProbeKind {
        ProbeKind::Reachability
    }

    async fn run(&self) -> ProbeResult {
        debug!("Trying to ping {} ...", self.host);

        match self.pinger.ping(&self.host).await {
            Ok(()) => {
                debug!("Pinging successful");
                ProbeResult::passed(self.kind())
            }
            Err(e) => {
                warn!(host = %self.host, error = %e, "ping failed");
                debug!("Pinging failed");
                ProbeResult::failed(self.kind(), e.to_string())
            }
        }
    }
}

/// Share session establishment
///
/// Success means the session came up. The signing and authentication flags
/// reported by the server are logged but do not affect the outcome.
pub struct SessionProbe {
    params: SessionParams,
    connector: Arc<dyn ShareConnector>,
}

impl SessionProbe {
    pub fn new(params: SessionParams, connector: Arc<dyn ShareConnector>) -> Self {
        Self { params, connector }
    }
}

#[async_trait]
impl Probe for SessionProbe {
    fn kind(&self) -> ProbeKind {
        ProbeKind::AuthenticatedSession
    }

    async fn run(&self) -> ProbeResult {
        debug!(
            "Trying CIFS login to {} as {} ...",
            self.params.target(),
            self.params.credentials.display_account()
        );

        let session = match self.connector.connect(&self.params).await {
            Ok(session) => session,
            Err(e) => {
                warn!(target_host = %self.params.target(), error = %e, "share session failed");
                return ProbeResult::failed(self.kind(), e.to_string());
            }
        };

        if session.signing_required() {
            debug!("Signing is required");
        } else {
            debug!("Signing is not required");
        }

        if session.is_authenticated() {
            debug!("Login successful");
        } else {
            debug!("Login not authenticated");
        }

        let detail = format!(
            "dialect {}, signing required: {}, authenticated: {}",
            session.dialect(),
            session.signing_required(),
            session.is_authenticated()
        );

        session.release().await;

        ProbeResult {
            detail: Some(detail),
            ..ProbeResult::passed(self.kind())
        }
    }
}

/// Readability of a configured file
///
/// With no path configured the probe is disabled and always passes.
pub struct FileProbe {
    path: Option<PathBuf>,
}

impl FileProbe {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }

    pub fn is_enabled(&self) -> bool {
        self.path.is_some()
    }
}

#[async_trait]
impl Probe for FileProbe {
    fn kind(&self) -> ProbeKind {
        ProbeKind::FileReadability
    }

    async fn run(&self) -> ProbeResult {
        let Some(path) = &self.path else {
            return ProbeResult::disabled(self.kind());
        };

        debug!("Trying to read file {} ...", path.display());

        // Existence and read are separate steps; the file may vanish in between.
        let result = match tokio::fs::try_exists(path).await {
            Ok(true) => match tokio::fs::read(path).await {
                Ok(_) => ProbeResult::passed(self.kind()),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "file read failed");
                    ProbeResult::failed(self.kind(), format!("read failed: {}", e))
                }
            },
            Ok(false) => ProbeResult::failed(self.kind(), "file does not exist"),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "file existence check failed");
                ProbeResult::failed(self.kind(), format!("existence check failed: {}", e))
            }
        };

        if result.ok {
            debug!("Reading file {} successful", path.display());
        } else {
            debug!("Reading file {} failed", path.display());
        }

        result
    }
}

/// Build the fixed probe set for a configuration
pub fn standard_probe_set(
    config: &MonitorConfig,
    pinger: Arc<dyn Pinger>,
    connector: Arc<dyn ShareConnector>,
) -> ProbeSet {
    let params = SessionParams {
        host: config.host.clone(),
        port: config.port,
        credentials: config.credentials.clone(),
    };

    ProbeSet::new(vec![
        Box::new(ReachabilityProbe::new(config.host.clone(), pinger)),
        Box::new(SessionProbe::new(params, connector)),
        Box::new(FileProbe::new(config.filename.clone())),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::mock_session::{MockPinger, MockShareConnector, MockShareMode};
    use crate::models::{ConfigLayer, ShareCredentials};

    fn params() -> SessionParams {
        SessionParams {
            host: "fileserver".to_string(),
            port: 445,
            credentials: ShareCredentials::default(),
        }
    }

    #[tokio::test]
    async fn test_reachability_ok() {
        let pinger = MockPinger::new(true);
        let probe = ReachabilityProbe::new("fileserver", Arc::new(pinger.clone()));

        let result = probe.run().await;
        assert!(result.ok);
        assert_eq!(result.kind, ProbeKind::Reachability);
        assert_eq!(pinger.calls(), 1);
    }

    #[tokio::test]
    async fn test_reachability_failure_is_data() {
        let probe = ReachabilityProbe::new("fileserver", Arc::new(MockPinger::new(false)));

        let result = probe.run().await;
        assert!(!result.ok);
        assert!(result.detail.unwrap().contains("fileserver unreachable"));
    }

    #[tokio::test]
    async fn test_session_ok_releases_session() {
        let connector = MockShareConnector::available();
        let probe = SessionProbe::new(params(), Arc::new(connector.clone()));

        let result = probe.run().await;
        assert!(result.ok);
        assert_eq!(connector.opened(), 1);
        assert_eq!(connector.released(), 1);
    }

    #[tokio::test]
    async fn test_session_flags_do_not_gate_outcome() {
        let connector = MockShareConnector::new(MockShareMode::Available {
            signing_required: false,
            authenticated: false,
        });
        let probe = SessionProbe::new(params(), Arc::new(connector.clone()));

        let result = probe.run().await;
        assert!(result.ok);
        assert!(result.detail.unwrap().contains("authenticated: false"));
    }

    #[tokio::test]
    async fn test_session_refused_is_not_ok() {
        let connector = MockShareConnector::new(MockShareMode::Refused);
        let probe = SessionProbe::new(params(), Arc::new(connector.clone()));

        let result = probe.run().await;
        assert!(!result.ok);
        assert!(result.detail.unwrap().contains("connection refused"));
        assert_eq!(connector.opened(), 0);
        assert_eq!(connector.released(), 0);
    }

    #[tokio::test]
    async fn test_session_partial_open_never_leaks() {
        let connector = MockShareConnector::new(MockShareMode::FailsAfterOpen);
        let probe = SessionProbe::new(params(), Arc::new(connector.clone()));

        for _ in 0..5 {
            assert!(!probe.run().await.ok);
        }
        assert_eq!(connector.opened(), 5);
        assert_eq!(connector.released(), 5);
    }

    #[tokio::test]
    async fn test_file_probe_disabled_passes() {
        let probe = FileProbe::new(None);
        assert!(!probe.is_enabled());

        let result = probe.run().await;
        assert!(result.ok);
        assert!(!result.enabled);
    }

    #[tokio::test]
    async fn test_file_probe_reads_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("share.txt");
        std::fs::write(&path, b"payload").unwrap();

        let result = FileProbe::new(Some(path)).run().await;
        assert!(result.ok);
        assert!(result.enabled);
    }

    #[tokio::test]
    async fn test_file_probe_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = FileProbe::new(Some(dir.path().join("gone.txt"))).run().await;
        assert!(!result.ok);
        assert_eq!(result.detail.as_deref(), Some("file does not exist"));
    }

    #[tokio::test]
    async fn test_file_probe_exists_but_unreadable() {
        // A directory exists but cannot be read as a file.
        let dir = tempfile::tempdir().unwrap();
        let result = FileProbe::new(Some(dir.path().to_path_buf())).run().await;
        assert!(!result.ok);
        assert!(result.detail.unwrap().starts_with("read failed"));
    }

    #[tokio::test]
    async fn test_standard_set_order() {
        let config = MonitorConfig::validate(ConfigLayer {
            host: Some("fileserver".to_string()),
            ..Default::default()
        })
        .unwrap();

        let set = standard_probe_set(
            &config,
            Arc::new(MockPinger::new(true)),
            Arc::new(MockShareConnector::available()),
        );
        let results = set.run_all().await;

        assert_eq!(
            results.iter().map(|r| r.kind).collect::<Vec<_>>(),
            ProbeKind::ALL.to_vec()
        );
        assert!(!results[2].enabled);
    }
}
