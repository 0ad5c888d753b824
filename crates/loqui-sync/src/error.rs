//! Errors surfaced by backend calls.

use loqui_api_models::ErrorBody;
use std::fmt::{self, Display, Formatter};

/// Result alias for backend calls.
pub type ApiResult<T> = Result<T, ApiError>;

/// Failure of a single backend request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// The request never produced an HTTP response (network down, CORS, aborted).
    Transport(String),
    /// The backend answered with a non-success status.
    Server {
        /// HTTP status code.
        status: u16,
        /// Human-readable detail extracted from the body.
        detail: String,
    },
    /// The response body did not match the expected shape.
    Decode(String),
}

impl ApiError {
    /// Build a server error from a status code and the raw response body.
    ///
    /// The body's `detail` wins; otherwise the status text, otherwise a generic
    /// `Request failed: <status>` message.
    #[must_use]
    pub fn from_response(status: u16, status_text: &str, body: &[u8]) -> Self {
        let detail = serde_json::from_slice::<ErrorBody>(body)
            .ok()
            .and_then(|parsed| parsed.message())
            .or_else(|| {
                let text = status_text.trim();
                (!text.is_empty()).then(|| text.to_string())
            })
            .unwrap_or_else(|| format!("Request failed: {status}"));
        Self::Server { status, detail }
    }

    /// Whether the failure happened before any response arrived.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    /// HTTP status when the backend answered.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Server { status, .. } => Some(*status),
            Self::Transport(_) | Self::Decode(_) => None,
        }
    }
}

impl Display for ApiError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport(message) => write!(f, "backend unreachable: {message}"),
            Self::Server { detail, .. } => f.write_str(detail),
            Self::Decode(message) => write!(f, "unexpected response: {message}"),
        }
    }
}

impl std::error::Error for ApiError {}
