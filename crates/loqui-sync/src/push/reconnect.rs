//! Reconnect policy and connection lifecycle.

use serde::{Deserialize, Serialize};

/// Default fixed delay between push reconnect attempts.
pub const DEFAULT_RECONNECT_DELAY_MS: u64 = 3_000;

const MAX_BACKOFF_SHIFT: u32 = 16;

/// How long to wait before reconnecting.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReconnectPolicy {
    /// Same delay every time, retried forever.
    Fixed {
        /// Delay in milliseconds.
        delay_ms: u64,
    },
    /// `min(max, base * 2^attempt)`, shortened by up to half through jitter.
    Backoff {
        /// First delay.
        base_ms: u64,
        /// Ceiling.
        max_ms: u64,
    },
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self::Fixed {
            delay_ms: DEFAULT_RECONNECT_DELAY_MS,
        }
    }
}

impl ReconnectPolicy {
    /// Delay before reconnect number `attempt` (zero-based). `jitter` in `[0, 1]`
    /// removes up to half of a backoff delay; fixed delays ignore it.
    #[must_use]
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    pub fn delay_ms(&self, attempt: u32, jitter: f64) -> u64 {
        match *self {
            Self::Fixed { delay_ms } => delay_ms,
            Self::Backoff { base_ms, max_ms } => {
                let factor = 1u64 << attempt.min(MAX_BACKOFF_SHIFT);
                let capped = base_ms.saturating_mul(factor).min(max_ms);
                let jitter = if jitter.is_finite() { jitter.clamp(0.0, 1.0) } else { 0.0 };
                let trimmed = (capped as f64 * jitter / 2.0) as u64;
                capped - trimmed
            }
        }
    }
}

/// Push connection lifecycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ConnectionState {
    /// Not connected and nothing scheduled.
    #[default]
    Disconnected,
    /// Socket opening.
    Connecting,
    /// Socket open.
    Connected,
    /// Waiting to reconnect.
    Waiting {
        /// Epoch milliseconds of the scheduled attempt.
        retry_at_ms: u64,
    },
    /// Torn down; no further attempts.
    Closed,
}

impl ConnectionState {
    /// Short label for status badges.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Disconnected => "offline",
            Self::Connecting => "connecting",
            Self::Connected => "live",
            Self::Waiting { .. } => "reconnecting",
            Self::Closed => "closed",
        }
    }
}

/// Lifecycle bookkeeping for one push channel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Reconnector {
    policy: ReconnectPolicy,
    state: ConnectionState,
    attempt: u32,
}

impl Reconnector {
    /// Disconnected channel using `policy`.
    #[must_use]
    pub const fn new(policy: ReconnectPolicy) -> Self {
        Self {
            policy,
            state: ConnectionState::Disconnected,
            attempt: 0,
        }
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> ConnectionState {
        self.state
    }

    /// Start a connection attempt. Refused while one is open or in progress, and
    /// after teardown.
    pub const fn begin_connect(&mut self) -> bool {
        match self.state {
            ConnectionState::Disconnected | ConnectionState::Waiting { .. } => {
                self.state = ConnectionState::Connecting;
                true
            }
            ConnectionState::Connecting | ConnectionState::Connected | ConnectionState::Closed => {
                false
            }
        }
    }

    /// The socket opened; the backoff resets.
    pub const fn on_open(&mut self) {
        if matches!(self.state, ConnectionState::Connecting) {
            self.state = ConnectionState::Connected;
            self.attempt = 0;
        }
    }

    /// The socket closed or failed to open at `now_ms`. Returns the delay of the
    /// newly scheduled attempt, or `None` when one is already pending or the
    /// channel was torn down.
    pub fn on_close(&mut self, now_ms: u64, jitter: f64) -> Option<u64> {
        match self.state {
            ConnectionState::Waiting { .. } | ConnectionState::Closed => None,
            ConnectionState::Disconnected
            | ConnectionState::Connecting
            | ConnectionState::Connected => {
                let delay = self.policy.delay_ms(self.attempt, jitter);
                self.attempt = self.attempt.saturating_add(1);
                self.state = ConnectionState::Waiting {
                    retry_at_ms: now_ms.saturating_add(delay),
                };
                Some(delay)
            }
        }
    }

    /// Tear down; nothing is scheduled afterwards.
    pub const fn close(&mut self) {
        self.state = ConnectionState::Closed;
    }
}
