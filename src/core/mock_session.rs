//! Mock capabilities for testing without a real share host
//!
//! Each mock exposes switches that tests flip between ticks to simulate a
//! host going up or down, and counters to verify sessions are released.

use super::session::{Pinger, SessionParams, ShareConnector, ShareSession};
use crate::utils::{PingError, SessionError};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

/// Pinger whose answer is controlled by the test
#[derive(Clone)]
pub struct MockPinger {
    reachable: Arc<AtomicBool>,
    calls: Arc<AtomicUsize>,
}

impl MockPinger {
    pub fn new(reachable: bool) -> Self {
        Self {
            reachable: Arc::new(AtomicBool::new(reachable)),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn set_reachable(&self, reachable: bool) {
        self.reachable.store(reachable, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl Pinger for MockPinger {
    async fn ping(&self, host: &str) -> Result<(), PingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.reachable.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(PingError::NoReply(format!("{} unreachable", host)))
        }
    }
}

/// Simulated server behaviour
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockShareMode {
    /// Negotiation succeeds with the given flags
    Available {
        signing_required: bool,
        authenticated: bool,
    },
    /// Connection refused before any session exists
    Refused,
    /// Session object created, then the handshake fails; the mock releases
    /// the partial session itself before reporting the error
    FailsAfterOpen,
}

#[derive(Clone)]
pub struct MockShareConnector {
    mode: Arc<std::sync::Mutex<MockShareMode>>,
    opened: Arc<AtomicUsize>,
    released: Arc<AtomicUsize>,
}

impl MockShareConnector {
    pub fn new(mode: MockShareMode) -> Self {
        Self {
            mode: Arc::new(std::sync::Mutex::new(mode)),
            opened: Arc::new(AtomicUsize::new(0)),
            released: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn available() -> Self {
        Self::new(MockShareMode::Available {
            signing_required: true,
            authenticated: true,
        })
    }

    pub fn set_mode(&self, mode: MockShareMode) {
        *self.mode.lock().unwrap() = mode;
    }

    /// Sessions created (including partially opened ones)
    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }
}

struct MockShareSession {
    signing_required: bool,
    authenticated: bool,
    released: Arc<AtomicUsize>,
}

#[async_trait::async_trait]
impl ShareSession for MockShareSession {
    fn signing_required(&self) -> bool {
        self.signing_required
    }

    fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    fn dialect(&self) -> String {
        "3.0.2".to_string()
    }

    async fn release(self: Box<Self>) {
        self.released.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait::async_trait]
impl ShareConnector for MockShareConnector {
    async fn connect(&self, params: &SessionParams) -> Result<Box<dyn ShareSession>, SessionError> {
        let mode = *self.mode.lock().unwrap();
        match mode {
            MockShareMode::Refused => Err(SessionError::Connection(format!(
                "{}: connection refused",
                params.target()
            ))),
            MockShareMode::FailsAfterOpen => {
                self.opened.fetch_add(1, Ordering::SeqCst);
                let partial = Box::new(MockShareSession {
                    signing_required: false,
                    authenticated: false,
                    released: self.released.clone(),
                });
                partial.release().await;
                Err(SessionError::Protocol("negotiate response truncated".to_string()))
            }
            MockShareMode::Available {
                signing_required,
                authenticated,
            } => {
                self.opened.fetch_add(1, Ordering::SeqCst);
                Ok(Box::new(MockShareSession {
                    signing_required,
                    authenticated,
                    released: self.released.clone(),
                }))
            }
        }
    }
}
