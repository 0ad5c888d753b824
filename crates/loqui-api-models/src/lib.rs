#![forbid(unsafe_code)]
#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls
)]
#![warn(missing_docs, unreachable_pub, unused_must_use)]
#![allow(clippy::multiple_crate_versions)]
//! Shared HTTP and WebSocket DTOs for the Loqui TTS service.
//!
//! Both the browser front-end and the CLI decode server payloads through these
//! types so the wire contract lives in one place. Decoding is deliberately
//! lenient (unknown statuses, naive timestamps, missing optional fields) since
//! the backend evolves independently of the clients.

use std::collections::BTreeMap;
use std::fmt::{self, Display, Formatter};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// Named model configuration offered by the backend (e.g. `turbo-4bit`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModelVariant(String);

impl ModelVariant {
    /// Wrap a raw variant identifier.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Borrow the identifier as sent on the wire.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ModelVariant {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.0)
    }
}

impl From<&str> for ModelVariant {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ModelVariant {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Lifecycle status of a model variant as reported by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum ModelStatus {
    /// Weights are not present locally.
    #[default]
    NotDownloaded,
    /// Weights are being fetched.
    Downloading,
    /// Weights are present but not in memory.
    Downloaded,
    /// Model is being loaded into memory.
    Loading,
    /// Model is resident and ready to synthesise.
    Loaded,
    /// Model is being released.
    Unloading,
    /// Last lifecycle transition failed.
    Error,
    /// Status string this client does not know about yet.
    Unknown(String),
}

impl ModelStatus {
    /// Wire representation of the status.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::NotDownloaded => "not_downloaded",
            Self::Downloading => "downloading",
            Self::Downloaded => "downloaded",
            Self::Loading => "loading",
            Self::Loaded => "loaded",
            Self::Unloading => "unloading",
            Self::Error => "error",
            Self::Unknown(raw) => raw,
        }
    }

    /// Parse a wire status, keeping unrecognised values verbatim.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "not_downloaded" => Self::NotDownloaded,
            "downloading" => Self::Downloading,
            "downloaded" => Self::Downloaded,
            "loading" => Self::Loading,
            "loaded" => Self::Loaded,
            "unloading" => Self::Unloading,
            "error" => Self::Error,
            other => Self::Unknown(other.to_string()),
        }
    }

    /// True while the backend is transitioning the model.
    #[must_use]
    pub const fn is_busy(&self) -> bool {
        matches!(self, Self::Downloading | Self::Loading | Self::Unloading)
    }
}

impl Display for ModelStatus {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl Serialize for ModelStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ModelStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::parse(&raw))
    }
}

/// Status snapshot for one model variant (`GET /models/`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelState {
    /// Variant this state describes.
    pub variant: ModelVariant,
    /// Current lifecycle status.
    pub status: ModelStatus,
    /// Failure message for the last transition, if any.
    #[serde(default)]
    pub error: Option<String>,
    /// Download completion in `[0, 1]`; meaningful only while downloading.
    #[serde(default)]
    pub download_progress: f64,
}

impl ModelState {
    /// Fresh state for a variant nothing is known about yet.
    #[must_use]
    pub fn new(variant: ModelVariant) -> Self {
        Self {
            variant,
            status: ModelStatus::NotDownloaded,
            error: None,
            download_progress: 0.0,
        }
    }
}

/// Compute device descriptor (`GET /models/device`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    /// Backend device key (e.g. `mps`, `cuda`, `cpu`).
    pub device: String,
    /// Hardware name.
    pub name: String,
    /// Short label shown in the header.
    pub label: String,
}

/// Result of one synthesis call (`POST /tts/generate`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateResponse {
    /// Identifier shared with the history record.
    pub id: String,
    /// URL the generated audio is served from.
    pub audio_url: String,
    /// Text that was synthesised.
    pub text: String,
    /// Variant that produced the audio.
    pub model_variant: ModelVariant,
    /// Language code when the variant is multilingual.
    #[serde(default)]
    pub language: Option<String>,
    /// Length of the produced audio in seconds.
    pub duration_seconds: f64,
    /// Wall time the backend spent generating.
    pub generation_time_seconds: f64,
    /// Sample rate of the produced audio.
    pub sample_rate: u32,
}

/// Persisted record of a past generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Record identifier.
    pub id: String,
    /// Text that was synthesised.
    pub text: String,
    /// Variant that produced the audio.
    pub model_variant: ModelVariant,
    /// Language code when the variant is multilingual.
    #[serde(default)]
    pub language: Option<String>,
    /// Exaggeration parameter used.
    #[serde(default)]
    pub exaggeration: Option<f64>,
    /// CFG weight parameter used.
    #[serde(default)]
    pub cfg_weight: Option<f64>,
    /// Length of the produced audio in seconds.
    pub duration_seconds: f64,
    /// Wall time the backend spent generating.
    pub generation_time_seconds: f64,
    /// URL the audio is served from.
    pub audio_url: String,
    /// Creation time; naive server timestamps are read as UTC.
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub created_at: DateTime<Utc>,
}

/// Page of history records (`GET /history/`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryListResponse {
    /// Records, newest first.
    pub items: Vec<HistoryEntry>,
    /// Total number of records on the server.
    pub total: u64,
}

/// Generic acknowledgement body (`DELETE /history/{id}`, `POST /models/shutdown`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ack {
    /// Whether the server applied the request.
    #[serde(default)]
    pub ok: bool,
}

/// Response to `DELETE /history/`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClearHistoryResponse {
    /// Whether the server applied the request.
    #[serde(default)]
    pub ok: bool,
    /// Number of records removed.
    pub deleted: u64,
}

/// CPU section of [`SystemInfo`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CpuInfo {
    /// Physical core count.
    pub cores_physical: Option<u32>,
    /// Logical core count.
    pub cores_logical: Option<u32>,
    /// Current frequency in MHz.
    pub frequency_mhz: Option<f64>,
    /// Utilisation percentage.
    pub usage_percent: Option<f64>,
}

/// Memory section of [`SystemInfo`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryInfo {
    /// Installed memory in GiB.
    pub total_gb: Option<f64>,
    /// Available memory in GiB.
    pub available_gb: Option<f64>,
    /// Used memory in GiB.
    pub used_gb: Option<f64>,
    /// Used percentage.
    pub percent: Option<f64>,
}

/// GPU / accelerator section of [`SystemInfo`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GpuInfo {
    /// GPU core count.
    pub cores: Option<u32>,
    /// Neural engine core count.
    pub neural_engine_cores: Option<u32>,
    /// Accelerator memory in use, GiB.
    pub metal_active_gb: Option<f64>,
    /// Peak accelerator memory, GiB.
    pub metal_peak_gb: Option<f64>,
    /// Accelerator cache, GiB.
    pub metal_cache_gb: Option<f64>,
}

/// Disk section of [`SystemInfo`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiskInfo {
    /// Disk size in GiB.
    pub total_gb: Option<f64>,
    /// Free space in GiB.
    pub free_gb: Option<f64>,
    /// Used percentage.
    pub percent: Option<f64>,
}

/// Model section of [`SystemInfo`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadedModelInfo {
    /// Variant currently resident, if any.
    pub loaded_variant: Option<ModelVariant>,
}

/// Host diagnostics (`GET /system/info`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemInfo {
    /// Chip / CPU brand string.
    pub chip: Option<String>,
    /// Operating system label.
    pub os: Option<String>,
    /// CPU details.
    pub cpu: CpuInfo,
    /// Memory details.
    pub memory: MemoryInfo,
    /// Accelerator details.
    pub gpu: GpuInfo,
    /// Disk details.
    pub disk: DiskInfo,
    /// Software component versions keyed by name.
    pub software: BTreeMap<String, String>,
    /// Loaded model details.
    pub model: LoadedModelInfo,
}

/// Raw push-channel frame as sent over the WebSocket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushFrame {
    /// Event name (`model_status` is the only one consumed today).
    pub event: String,
    /// Variant the event refers to.
    #[serde(default)]
    pub variant: Option<String>,
    /// New status string.
    #[serde(default)]
    pub status: Option<String>,
    /// Failure message accompanying an `error` status.
    #[serde(default)]
    pub error: Option<String>,
}

/// FastAPI-style error body (`{"detail": ...}`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Either a message string or a list of validation issues.
    #[serde(default)]
    pub detail: Value,
}

impl ErrorBody {
    /// Human-readable message extracted from the detail payload.
    #[must_use]
    pub fn message(&self) -> Option<String> {
        match &self.detail {
            Value::String(message) if !message.trim().is_empty() => Some(message.clone()),
            Value::Array(issues) => {
                let parts: Vec<String> = issues
                    .iter()
                    .filter_map(|issue| issue.get("msg").and_then(Value::as_str))
                    .map(str::to_string)
                    .collect();
                if parts.is_empty() {
                    None
                } else {
                    Some(parts.join("; "))
                }
            }
            _ => None,
        }
    }
}

/// Reference voice clip attached to a generation request.
#[derive(Clone, PartialEq, Eq)]
pub struct ReferenceAudio {
    /// Original file name, forwarded in the multipart part.
    pub file_name: String,
    /// MIME type reported by the source, if known.
    pub content_type: Option<String>,
    /// Raw file contents.
    pub bytes: Vec<u8>,
}

impl fmt::Debug for ReferenceAudio {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("ReferenceAudio")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Multipart field name for the reference clip.
pub const REFERENCE_AUDIO_FIELD: &str = "reference_audio";

/// Parameters for `POST /tts/generate`.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerateRequest {
    /// Text to synthesise.
    pub text: String,
    /// Variant to synthesise with.
    pub variant: ModelVariant,
    /// Language code, only for variants that accept one.
    pub language: Option<String>,
    /// Emotional exaggeration.
    pub exaggeration: f64,
    /// Classifier-free guidance weight.
    pub cfg_weight: f64,
    /// Sampling temperature.
    pub temperature: f64,
    /// Playback speed multiplier.
    pub speed: f64,
    /// Optional reference voice clip.
    pub reference_audio: Option<ReferenceAudio>,
    /// Optional transcript of the reference clip.
    pub ref_text: Option<String>,
}

impl GenerateRequest {
    /// Text fields of the multipart form, in wire order. The reference clip is
    /// attached separately under [`REFERENCE_AUDIO_FIELD`].
    #[must_use]
    pub fn form_fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = vec![
            ("text", self.text.clone()),
            ("variant", self.variant.to_string()),
        ];
        if let Some(language) = self.language.as_ref().filter(|l| !l.trim().is_empty()) {
            fields.push(("language", language.clone()));
        }
        fields.push(("exaggeration", self.exaggeration.to_string()));
        fields.push(("cfg_weight", self.cfg_weight.to_string()));
        fields.push(("temperature", self.temperature.to_string()));
        fields.push(("speed", self.speed.to_string()));
        if let Some(ref_text) = self.ref_text.as_ref().filter(|t| !t.trim().is_empty()) {
            fields.push(("ref_text", ref_text.clone()));
        }
        fields
    }
}

mod timestamp {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer, de::Error as _};

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| D::Error::custom(format!("invalid timestamp '{raw}'")))
    }

    pub(super) fn parse(raw: &str) -> Option<DateTime<Utc>> {
        if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
            return Some(parsed.with_timezone(&Utc));
        }
        ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
            .iter()
            .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
            .map(|naive| naive.and_utc())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};
    use serde_json::json;

    #[test]
    fn model_state_decodes_known_and_unknown_statuses() {
        let states: Vec<ModelState> = serde_json::from_value(json!([
            {"variant": "turbo-4bit", "status": "loaded", "error": null, "download_progress": 1.0},
            {"variant": "qwen-1.7b", "status": "quantizing"}
        ]))
        .unwrap();
        assert_eq!(states[0].status, ModelStatus::Loaded);
        assert_eq!(states[0].variant.as_str(), "turbo-4bit");
        assert_eq!(states[1].status, ModelStatus::Unknown("quantizing".into()));
        assert!(states[1].error.is_none());
        assert!(states[1].download_progress.abs() < f64::EPSILON);
    }

    #[test]
    fn status_serialises_as_wire_string() {
        let value = serde_json::to_value(ModelStatus::NotDownloaded).unwrap();
        assert_eq!(value, json!("not_downloaded"));
        assert!(ModelStatus::Loading.is_busy());
        assert!(!ModelStatus::Loaded.is_busy());
    }

    #[test]
    fn history_entry_accepts_naive_timestamps() {
        let entry: HistoryEntry = serde_json::from_value(json!({
            "id": "a1",
            "text": "hello",
            "model_variant": "turbo-8bit",
            "duration_seconds": 1.5,
            "generation_time_seconds": 0.4,
            "audio_url": "/api/audio/a1.wav",
            "created_at": "2026-03-04T05:06:07.123456"
        }))
        .unwrap();
        assert_eq!(entry.created_at.month(), 3);
        assert_eq!(entry.created_at.hour(), 5);
        assert!(entry.language.is_none());
        assert!(entry.exaggeration.is_none());
    }

    #[test]
    fn history_entry_accepts_offset_timestamps() {
        let parsed = timestamp::parse("2026-03-04T05:06:07+02:00").unwrap();
        assert_eq!(parsed.hour(), 3);
        assert!(timestamp::parse("yesterday").is_none());
    }

    #[test]
    fn error_body_extracts_string_and_validation_details() {
        let plain: ErrorBody = serde_json::from_value(json!({"detail": "Model not loaded"})).unwrap();
        assert_eq!(plain.message().as_deref(), Some("Model not loaded"));

        let issues: ErrorBody = serde_json::from_value(json!({
            "detail": [{"loc": ["body", "text"], "msg": "field required"}]
        }))
        .unwrap();
        assert_eq!(issues.message().as_deref(), Some("field required"));

        let empty: ErrorBody = serde_json::from_value(json!({})).unwrap();
        assert!(empty.message().is_none());
    }

    #[test]
    fn form_fields_skip_blank_optionals() {
        let request = GenerateRequest {
            text: "hi".into(),
            variant: "multilingual".into(),
            language: Some(String::new()),
            exaggeration: 0.5,
            cfg_weight: 0.3,
            temperature: 0.8,
            speed: 1.0,
            reference_audio: None,
            ref_text: Some("  ".into()),
        };
        let names: Vec<&str> = request.form_fields().iter().map(|(name, _)| *name).collect();
        assert_eq!(
            names,
            vec!["text", "variant", "exaggeration", "cfg_weight", "temperature", "speed"]
        );
    }

    #[test]
    fn reference_audio_debug_hides_bytes() {
        let clip = ReferenceAudio {
            file_name: "voice.wav".into(),
            content_type: None,
            bytes: vec![0; 4096],
        };
        let rendered = format!("{clip:?}");
        assert!(rendered.contains("len: 4096"));
        assert!(!rendered.contains("0, 0"));
    }

    #[test]
    fn clear_response_and_push_frame_decode() {
        let cleared: ClearHistoryResponse =
            serde_json::from_value(json!({"ok": true, "deleted": 12})).unwrap();
        assert_eq!(cleared.deleted, 12);
        let frame: PushFrame =
            serde_json::from_value(json!({"event": "model_status", "variant": "turbo-8bit", "status": "loaded"}))
                .unwrap();
        assert_eq!(frame.variant.as_deref(), Some("turbo-8bit"));
        assert!(frame.error.is_none());
    }

    #[test]
    fn system_info_tolerates_partial_payloads() {
        let info: SystemInfo = serde_json::from_value(json!({
            "chip": "Apple M3",
            "memory": {"total_gb": 36.0},
            "software": {"python": "3.12.1"},
            "model": {"loaded_variant": "turbo-4bit"}
        }))
        .unwrap();
        assert_eq!(info.memory.total_gb, Some(36.0));
        assert!(info.cpu.cores_logical.is_none());
        assert_eq!(
            info.model.loaded_variant,
            Some(ModelVariant::new("turbo-4bit"))
        );
    }
}
