//! Monitor configuration
//!
//! Settings arrive as layers: an optional JSON file and the command line.
//! Later layers override earlier ones field by field, defaults fill the rest,
//! and the merged result is validated once into a [`MonitorConfig`].

use super::credentials::{SecureString, ShareCredentials, Username};
use crate::constants::{DEFAULT_SHARE_PORT, DEFAULT_TICK_MS, MAX_HOSTNAME_LENGTH};
use crate::utils::{ConfigError, MonitorError};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// One layer of optional settings (config file or command line)
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigLayer {
    pub host: Option<String>,
    pub port: Option<u32>,
    pub user: Option<String>,
    pub domain: Option<String>,
    pub workstation: Option<String>,
    pub password: Option<String>,
    pub filename: Option<String>,
    pub ticktime: Option<u64>,
}

impl ConfigLayer {
    /// Load a layer from a JSON file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        Self::from_json(&raw).map_err(|e| match e {
            ConfigError::Parse { reason, .. } => ConfigError::Parse {
                path: path.display().to_string(),
                reason,
            },
            other => other,
        })
    }

    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(raw).map_err(|e| ConfigError::Parse {
            path: "<inline>".to_string(),
            reason: e.to_string(),
        })
    }

    /// Overlay `other` on top of `self`; set fields in `other` win
    pub fn merge(self, other: ConfigLayer) -> ConfigLayer {
        ConfigLayer {
            host: other.host.or(self.host),
            port: other.port.or(self.port),
            user: other.user.or(self.user),
            domain: other.domain.or(self.domain),
            workstation: other.workstation.or(self.workstation),
            password: other.password.or(self.password),
            filename: other.filename.or(self.filename),
            ticktime: other.ticktime.or(self.ticktime),
        }
    }
}

/// Validated monitor settings
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    pub host: String,
    pub port: u16,
    pub credentials: ShareCredentials,
    /// File to read each tick; `None` disables the file probe
    pub filename: Option<PathBuf>,
    pub tick: Duration,
}

impl MonitorConfig {
    /// Optional JSON file first, then `overrides` on top
    pub fn load(config_file: Option<&Path>, overrides: ConfigLayer) -> Result<Self, MonitorError> {
        let mut layers = Vec::new();
        if let Some(path) = config_file {
            layers.push(ConfigLayer::from_file(path)?);
        }
        layers.push(overrides);
        Ok(Self::from_layers(layers)?)
    }

    /// Merge layers in order (lowest precedence first) and validate
    pub fn from_layers(layers: impl IntoIterator<Item = ConfigLayer>) -> Result<Self, ConfigError> {
        let merged = layers
            .into_iter()
            .fold(ConfigLayer::default(), ConfigLayer::merge);
        Self::validate(merged)
    }

    pub fn validate(layer: ConfigLayer) -> Result<Self, ConfigError> {
        let host = layer
            .host
            .map(|h| h.trim().to_string())
            .filter(|h| !h.is_empty())
            .ok_or(ConfigError::MissingHost)?;

        if host.len() > MAX_HOSTNAME_LENGTH {
            return Err(ConfigError::InvalidHost(format!(
                "exceeds maximum length ({})",
                MAX_HOSTNAME_LENGTH
            )));
        }
        // A leading dash would be taken as an option by the ping utility.
        if host.starts_with('-') || host.chars().any(char::is_whitespace) {
            return Err(ConfigError::InvalidHost(host));
        }

        let port = match layer.port {
            None => DEFAULT_SHARE_PORT,
            Some(p) => match u16::try_from(p) {
                Ok(p) if p != 0 => p,
                _ => return Err(ConfigError::InvalidPort(p)),
            },
        };

        let tick_ms = layer.ticktime.unwrap_or(DEFAULT_TICK_MS);
        if tick_ms == 0 {
            return Err(ConfigError::InvalidTickTime);
        }

        let user = match layer.user.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(name) => Some(Username::new(name)?),
        };

        let credentials = ShareCredentials::new(
            user,
            layer.domain.unwrap_or_default(),
            layer.workstation.unwrap_or_default(),
            SecureString::new(layer.password.unwrap_or_default()),
        );

        let filename = layer
            .filename
            .filter(|f| !f.is_empty())
            .map(PathBuf::from);

        Ok(MonitorConfig {
            host,
            port,
            credentials,
            filename,
            tick: Duration::from_millis(tick_ms),
        })
    }

    /// Whether the file probe has anything to read
    pub fn file_probe_enabled(&self) -> bool {
        self.filename.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn host_only(host: &str) -> ConfigLayer {
        ConfigLayer {
            host: Some(host.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_defaults_applied() {
        let config = MonitorConfig::validate(host_only("fileserver")).unwrap();
        assert_eq!(config.host, "fileserver");
        assert_eq!(config.port, 445);
        assert_eq!(config.tick, Duration::from_millis(1000));
        assert!(config.filename.is_none());
        assert!(!config.file_probe_enabled());
        assert!(config.credentials.user().is_none());
    }

    #[test]
    fn test_missing_host_rejected() {
        let err = MonitorConfig::validate(ConfigLayer::default()).unwrap_err();
        assert!(matches!(err, ConfigError::MissingHost));

        let err = MonitorConfig::validate(host_only("   ")).unwrap_err();
        assert!(matches!(err, ConfigError::MissingHost));
    }

    #[test]
    fn test_invalid_host_rejected() {
        assert!(matches!(
            MonitorConfig::validate(host_only("file server")),
            Err(ConfigError::InvalidHost(_))
        ));
        assert!(matches!(
            MonitorConfig::validate(host_only("-c")),
            Err(ConfigError::InvalidHost(_))
        ));
        assert!(matches!(
            MonitorConfig::validate(host_only(&"a".repeat(300))),
            Err(ConfigError::InvalidHost(_))
        ));
    }

    #[test]
    fn test_port_bounds() {
        let mut layer = host_only("fs");
        layer.port = Some(0);
        assert!(matches!(
            MonitorConfig::validate(layer.clone()),
            Err(ConfigError::InvalidPort(0))
        ));

        layer.port = Some(70000);
        assert!(matches!(
            MonitorConfig::validate(layer.clone()),
            Err(ConfigError::InvalidPort(70000))
        ));

        layer.port = Some(1445);
        assert_eq!(MonitorConfig::validate(layer).unwrap().port, 1445);
    }

    #[test]
    fn test_zero_ticktime_rejected() {
        let mut layer = host_only("fs");
        layer.ticktime = Some(0);
        assert!(matches!(
            MonitorConfig::validate(layer),
            Err(ConfigError::InvalidTickTime)
        ));
    }

    #[test]
    fn test_empty_filename_disables_file_probe() {
        let mut layer = host_only("fs");
        layer.filename = Some(String::new());
        let config = MonitorConfig::validate(layer).unwrap();
        assert!(!config.file_probe_enabled());
    }

    #[test]
    fn test_later_layer_wins() {
        let file = ConfigLayer::from_json(
            r#"{"host": "from-file", "port": 1445, "user": "alice", "ticktime": 250}"#,
        )
        .unwrap();
        let cli = ConfigLayer {
            host: Some("from-cli".to_string()),
            ..Default::default()
        };

        let config = MonitorConfig::from_layers([file, cli]).unwrap();
        assert_eq!(config.host, "from-cli");
        assert_eq!(config.port, 1445);
        assert_eq!(config.tick, Duration::from_millis(250));
        assert_eq!(config.credentials.user().unwrap().as_str(), "alice");
    }

    #[test]
    fn test_unknown_field_rejected() {
        let err = ConfigLayer::from_json(r#"{"hostname": "fs"}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_from_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sharewatch.json");
        std::fs::write(&path, "{ not json").unwrap();

        match ConfigLayer::from_file(&path) {
            Err(ConfigError::Parse { path: reported, .. }) => {
                assert!(reported.ends_with("sharewatch.json"))
            }
            other => panic!("expected parse error, got {:?}", other),
        }

        let missing = dir.path().join("missing.json");
        assert!(matches!(
            ConfigLayer::from_file(&missing),
            Err(ConfigError::Read { .. })
        ));
    }

    #[test]
    fn test_load_layers_file_under_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sharewatch.json");
        std::fs::write(&path, r#"{"host": "fs01", "ticktime": 250}"#).unwrap();

        let overrides = ConfigLayer {
            host: Some("fs02".to_string()),
            ..Default::default()
        };
        let config = MonitorConfig::load(Some(&path), overrides).unwrap();
        assert_eq!(config.host, "fs02");
        assert_eq!(config.tick, Duration::from_millis(250));
    }

    #[test]
    fn test_load_errors_are_monitor_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.json");
        assert!(matches!(
            MonitorConfig::load(Some(&missing), host_only("fs")),
            Err(MonitorError::Config(ConfigError::Read { .. }))
        ));

        assert!(matches!(
            MonitorConfig::load(None, ConfigLayer::default()),
            Err(MonitorError::Config(ConfigError::MissingHost))
        ));
    }
}
