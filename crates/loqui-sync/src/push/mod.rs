//! Server-push status channel.
//!
//! # Design
//! - Frames are decoded into [`frame::PushEvent`]s; anything malformed is dropped.
//! - [`reconnect::Reconnector`] owns the connection lifecycle and guarantees at most
//!   one pending retry.
//! - [`listener::PushListener`] drives both over an injected socket and timer.

pub mod frame;
pub mod listener;
pub mod reconnect;

use reconnect::ConnectionState;
use thiserror::Error;

/// Push channel status as shown to the user.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConnectionStatus {
    /// Lifecycle state.
    pub state: ConnectionState,
    /// Reason the last connection ended, if it ended abnormally.
    pub last_error: Option<String>,
    /// Connections opened so far.
    pub connects: u32,
}

/// Socket-level failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PushError {
    /// The socket could not be opened.
    #[error("push connect failed: {0}")]
    Connect(String),
    /// The open socket reported an error.
    #[error("push socket error: {0}")]
    Socket(String),
}
