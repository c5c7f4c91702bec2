//! Reachability check using the host's `ping` utility

use crate::constants::PING_GUARD_TIMEOUT_SECS;
use crate::core::session::Pinger;
use crate::utils::PingError;
use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;

/// Sends one echo request with the system `ping` command
///
/// Success means the utility exited with status zero. The utility's own
/// reply timeout applies; the guard timeout only catches a hung process.
pub struct SystemPinger {
    program: String,
    guard: Duration,
}

impl SystemPinger {
    pub fn new() -> Self {
        Self::with_program("ping")
    }

    /// Use a different executable that accepts ping's arguments
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            guard: Duration::from_secs(PING_GUARD_TIMEOUT_SECS),
        }
    }

    pub fn with_guard_timeout(mut self, guard: Duration) -> Self {
        self.guard = guard;
        self
    }

    fn command(&self, host: &str) -> Command {
        let mut cmd = Command::new(&self.program);
        if cfg!(windows) {
            cmd.args(["-n", "1"]);
        } else {
            cmd.args(["-c", "1"]);
        }
        cmd.arg(host)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        #[cfg(windows)]
        {
            cmd.creation_flags(crate::constants::CREATE_NO_WINDOW);
        }

        cmd
    }
}

impl Default for SystemPinger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Pinger for SystemPinger {
    async fn ping(&self, host: &str) -> Result<(), PingError> {
        let output = timeout(self.guard, self.command(host).output())
            .await
            .map_err(|_| PingError::Timeout(self.guard))?
            .map_err(|e| PingError::Spawn(format!("{}: {}", self.program, e)))?;

        if output.status.success() {
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        let reason = match stderr.trim() {
            "" => output.status.to_string(),
            msg => format!("{}: {}", output.status, msg),
        };
        Err(PingError::NoReply(reason))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_program_is_spawn_error() {
        let pinger = SystemPinger::with_program("sharewatch-no-such-ping-binary");
        let err = pinger.ping("localhost").await.unwrap_err();
        assert!(matches!(err, PingError::Spawn(_)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_zero_exit_is_success() {
        let pinger = SystemPinger::with_program("true");
        assert!(pinger.ping("fileserver").await.is_ok());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_nonzero_exit_is_no_reply() {
        let pinger = SystemPinger::with_program("false");
        let err = pinger.ping("fileserver").await.unwrap_err();
        assert!(matches!(err, PingError::NoReply(_)));
    }
}
