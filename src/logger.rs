//! Logging setup
//!
//! Console output always goes to stderr. With a log file configured, the same
//! events are appended to that file as well; a file over [`MAX_LOG_BYTES`] is
//! moved aside to `<name>.log.bak` before logging starts.

use crate::constants::{ENV_LOG_VERBOSE, MAX_LOG_BYTES};
use crate::utils::MonitorError;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Debug, Clone, Default)]
pub struct LogOptions {
    /// Debug-level output for this crate
    pub verbose: bool,
    /// Optional file receiving a copy of every log line
    pub file: Option<PathBuf>,
}

impl LogOptions {
    /// `--verbose` or `SHAREWATCH_LOG_VERBOSE=1`
    pub fn verbose_requested(flag: bool) -> bool {
        flag || std::env::var(ENV_LOG_VERBOSE)
            .map(|v| v == "1")
            .unwrap_or(false)
    }
}

fn default_directive(verbose: bool) -> &'static str {
    if verbose {
        "sharewatch=debug"
    } else {
        "sharewatch=info"
    }
}

/// Move an oversized log file to `.log.bak`, replacing an older backup
pub fn rotate_if_needed(path: &Path, max_bytes: u64) -> std::io::Result<bool> {
    match fs::metadata(path) {
        Ok(meta) if meta.len() > max_bytes => {
            let backup = path.with_extension("log.bak");
            let _ = fs::remove_file(&backup);
            fs::rename(path, &backup)?;
            Ok(true)
        }
        _ => Ok(false),
    }
}

/// Create parent directories, rotate and open `path` for appending
pub fn open_log_file(path: &Path) -> Result<File, MonitorError> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    rotate_if_needed(path, MAX_LOG_BYTES)?;
    Ok(OpenOptions::new().create(true).append(true).open(path)?)
}

/// Install the global subscriber
///
/// `RUST_LOG` takes precedence over the verbosity flag.
pub fn init_logging(options: &LogOptions) -> Result<(), MonitorError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(options.verbose)));

    let file_layer = match &options.file {
        Some(path) => {
            let file = open_log_file(path)?;
            Some(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .try_init()
        .map_err(|e| MonitorError::Io(std::io::Error::new(std::io::ErrorKind::Other, e.to_string())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rotation_moves_large_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sharewatch.log");
        fs::write(&path, vec![b'x'; 64]).unwrap();

        assert!(rotate_if_needed(&path, 32).unwrap());
        assert!(!path.exists());
        assert!(dir.path().join("sharewatch.log.bak").exists());
    }

    #[test]
    fn test_rotation_keeps_small_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sharewatch.log");
        fs::write(&path, b"short").unwrap();

        assert!(!rotate_if_needed(&path, 1024).unwrap());
        assert!(path.exists());
    }

    #[test]
    fn test_rotation_missing_file_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        assert!(!rotate_if_needed(&dir.path().join("none.log"), 0).unwrap());
    }

    #[test]
    fn test_default_directive() {
        assert_eq!(default_directive(true), "sharewatch=debug");
        assert_eq!(default_directive(false), "sharewatch=info");
    }

    #[test]
    fn test_open_log_file_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("sharewatch.log");

        open_log_file(&path).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_log_file_under_regular_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        fs::write(&blocker, b"x").unwrap();

        let options = LogOptions {
            verbose: false,
            file: Some(blocker.join("sharewatch.log")),
        };
        assert!(matches!(init_logging(&options), Err(MonitorError::Io(_))));
    }
}
