//! Push frame decoding and application.

use crate::features::models::state;
use crate::store::AppStore;
use loqui_api_models::{ModelStatus, ModelVariant, PushFrame};
use thiserror::Error;

/// Event name for model status frames.
pub const MODEL_STATUS_EVENT: &str = "model_status";

/// A decoded push frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PushEvent {
    /// A model changed status.
    ModelStatus {
        /// Variant concerned.
        variant: ModelVariant,
        /// New status.
        status: ModelStatus,
        /// Error text; absent means cleared.
        error: Option<String>,
    },
    /// An event this client does not handle.
    Other(String),
}

/// Reason a frame was dropped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    /// Not JSON, or not the frame envelope.
    #[error("malformed push frame: {0}")]
    Malformed(String),
    /// A `model_status` frame without a required field.
    #[error("model_status frame is missing `{0}`")]
    MissingField(&'static str),
}

/// Decode one text frame.
///
/// # Errors
///
/// Returns [`FrameError`] for invalid JSON or a `model_status` frame without a
/// variant or status.
pub fn decode_frame(text: &str) -> Result<PushEvent, FrameError> {
    let frame: PushFrame =
        serde_json::from_str(text).map_err(|err| FrameError::Malformed(err.to_string()))?;
    if frame.event != MODEL_STATUS_EVENT {
        return Ok(PushEvent::Other(frame.event));
    }
    let variant = frame
        .variant
        .filter(|variant| !variant.is_empty())
        .ok_or(FrameError::MissingField("variant"))?;
    let status = frame.status.ok_or(FrameError::MissingField("status"))?;
    Ok(PushEvent::ModelStatus {
        variant: ModelVariant::from(variant),
        status: ModelStatus::parse(&status),
        error: frame.error,
    })
}

/// Apply a decoded event received at `now_ms`. Returns whether the selection moved.
pub fn apply_event(store: &mut AppStore, event: PushEvent, now_ms: u64) -> bool {
    match event {
        PushEvent::ModelStatus {
            variant,
            status,
            error,
        } => state::apply_status_push(&mut store.models, &variant, status, error, now_ms),
        PushEvent::Other(_) => false,
    }
}
