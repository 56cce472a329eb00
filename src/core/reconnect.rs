// Reconnect module - open/retry policy wrapped around a transport

use crate::core::interrupt::Interrupt;
use crate::core::transport::Transport;
use crate::domain::config::ConnectTimeout;
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

/// Pause between two connect attempts.
pub const RETRY_INTERVAL: Duration = Duration::from_millis(100);

/// Which timeout applies to a connect sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectPhase {
    /// First connection at startup.
    Initial,
    /// Re-establishing a link that dropped.
    Later,
}

impl fmt::Display for ConnectPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectPhase::Initial => write!(f, "initial"),
            ConnectPhase::Later => write!(f, "later"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Connecting,
    Connected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub timeout_first: ConnectTimeout,
    pub timeout_later: ConnectTimeout,
}

impl ReconnectPolicy {
    pub fn new(timeout_first: ConnectTimeout, timeout_later: ConnectTimeout) -> Self {
        Self {
            timeout_first,
            timeout_later,
        }
    }

    pub fn timeout_for(&self, phase: ConnectPhase) -> ConnectTimeout {
        match phase {
            ConnectPhase::Initial => self.timeout_first,
            ConnectPhase::Later => self.timeout_later,
        }
    }
}

/// Successful connect sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectReport {
    pub attempts: u32,
    pub elapsed: Duration,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConnectError {
    #[error("Gave up {phase} connect after {attempts} attempts ({elapsed:?})")]
    TimedOut {
        phase: ConnectPhase,
        attempts: u32,
        elapsed: Duration,
    },
    #[error("Interrupted during {phase} connect")]
    Cancelled { phase: ConnectPhase },
}

/// Drives `Transport::open` until it succeeds, the phase budget runs out, or
/// the operator interrupts.
#[derive(Debug)]
pub struct Reconnector {
    policy: ReconnectPolicy,
    retry_interval: Duration,
    state: LinkState,
}

impl Reconnector {
    pub fn new(policy: ReconnectPolicy) -> Self {
        Self {
            policy,
            retry_interval: RETRY_INTERVAL,
            state: LinkState::Connecting,
        }
    }

    pub fn with_retry_interval(mut self, interval: Duration) -> Self {
        self.retry_interval = interval;
        self
    }

    pub fn policy(&self) -> &ReconnectPolicy {
        &self.policy
    }

    pub fn state(&self) -> LinkState {
        self.state
    }

    pub async fn connect<T: Transport + ?Sized>(
        &mut self,
        transport: &mut T,
        phase: ConnectPhase,
        interrupt: &mut Interrupt,
    ) -> Result<ConnectReport, ConnectError> {
        self.state = LinkState::Connecting;
        let timeout = self.policy.timeout_for(phase);
        let retry_interval = self.retry_interval;

        let result = tokio::select! {
            biased;
            _ = interrupt.triggered() => Err(ConnectError::Cancelled { phase }),
            result = attempt_until_deadline(transport, phase, timeout, retry_interval) => result,
        };

        match &result {
            Ok(_) => self.state = LinkState::Connected,
            Err(ConnectError::Cancelled { .. }) => warn!("Connect interrupted by operator"),
            Err(err) => error!("{}", err),
        }
        result
    }
}

async fn attempt_until_deadline<T: Transport + ?Sized>(
    transport: &mut T,
    phase: ConnectPhase,
    timeout: ConnectTimeout,
    retry_interval: Duration,
) -> Result<ConnectReport, ConnectError> {
    let started = Instant::now();
    let mut attempts = 0u32;
    info!(transport = %transport, %phase, %timeout, "Opening connection");

    loop {
        attempts += 1;
        match transport.open() {
            Ok(()) => {
                let elapsed = started.elapsed();
                info!(transport = %transport, attempts, "Connected");
                return Ok(ConnectReport { attempts, elapsed });
            }
            Err(err) if attempts == 1 => {
                warn!(transport = %transport, error = %err, "Connect failed, will retry");
            }
            Err(err) => {
                debug!(transport = %transport, attempts, error = %err, "Connect attempt failed");
            }
        }

        tokio::time::sleep(retry_interval).await;

        let elapsed = started.elapsed();
        if timeout.is_exceeded(elapsed) {
            return Err(ConnectError::TimedOut {
                phase,
                attempts,
                elapsed,
            });
        }
    }
}
