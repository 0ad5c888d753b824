//! Backend surface consumed by the controllers.
//!
//! # Design
//! - The trait is `?Send` so the browser client (single-threaded futures) and the
//!   CLI client share one definition.
//! - Route construction lives in [`paths`] so both HTTP stacks hit identical URLs.

use crate::error::ApiResult;
use async_trait::async_trait;
use loqui_api_models::{
    Ack, ClearHistoryResponse, DeviceInfo, GenerateRequest, GenerateResponse,
    HistoryListResponse, ModelState, ModelVariant, SystemInfo,
};

/// REST client for the TTS backend.
#[async_trait(?Send)]
pub trait TtsApi {
    /// `GET /models/`: status of every known variant.
    async fn list_models(&self) -> ApiResult<Vec<ModelState>>;
    /// `GET /models/device`: compute device the backend runs on.
    async fn device(&self) -> ApiResult<DeviceInfo>;
    /// `POST /models/{variant}/load`: request a download/load.
    async fn load_model(&self, variant: &ModelVariant) -> ApiResult<ModelState>;
    /// `POST /models/shutdown`: unload whatever model is resident.
    async fn shutdown(&self) -> ApiResult<Ack>;
    /// `GET /system/info`: host and runtime facts.
    async fn system_info(&self) -> ApiResult<SystemInfo>;
    /// `POST /tts/generate`: synthesize speech (multipart form).
    async fn generate(&self, request: &GenerateRequest) -> ApiResult<GenerateResponse>;
    /// `GET /history/?limit&offset`: one page of past generations, newest first.
    async fn history(&self, limit: u32, offset: u32) -> ApiResult<HistoryListResponse>;
    /// `DELETE /history/{id}`.
    async fn delete_history_entry(&self, id: &str) -> ApiResult<Ack>;
    /// `DELETE /history/`.
    async fn clear_history(&self) -> ApiResult<ClearHistoryResponse>;
}

/// Route builders relative to the API base path.
pub mod paths {
    use loqui_api_models::ModelVariant;

    /// Model list.
    pub const MODELS: &str = "/models/";
    /// Device description.
    pub const DEVICE: &str = "/models/device";
    /// Model shutdown.
    pub const SHUTDOWN: &str = "/models/shutdown";
    /// System information.
    pub const SYSTEM_INFO: &str = "/system/info";
    /// Speech generation.
    pub const GENERATE: &str = "/tts/generate";
    /// History collection.
    pub const HISTORY: &str = "/history/";
    /// Push channel, relative to the base path.
    pub const PUSH: &str = "/ws";

    /// Load endpoint for one variant.
    #[must_use]
    pub fn load_model(variant: &ModelVariant) -> String {
        format!("/models/{}/load", urlencoding::encode(variant.as_str()))
    }

    /// One history page.
    #[must_use]
    pub fn history_page(limit: u32, offset: u32) -> String {
        format!("{HISTORY}?limit={limit}&offset={offset}")
    }

    /// A single history record.
    #[must_use]
    pub fn history_entry(id: &str) -> String {
        format!("/history/{}", urlencoding::encode(id))
    }

    /// Join a base (`/api`, `http://host:8000/api/`) with a route.
    #[must_use]
    pub fn join(base: &str, path: &str) -> String {
        let base = base.trim_end_matches('/');
        if path.starts_with('/') {
            format!("{base}{path}")
        } else {
            format!("{base}/{path}")
        }
    }

    /// Derive the push URL from an absolute HTTP(S) API base.
    ///
    /// Returns `None` when the base is not absolute (`/api`); callers then resolve
    /// it against the page origin.
    #[must_use]
    pub fn push_url(api_base: &str) -> Option<String> {
        let (scheme, rest) = api_base.split_once("://")?;
        let ws_scheme = match scheme {
            "https" => "wss",
            "http" => "ws",
            "ws" | "wss" => scheme,
            _ => return None,
        };
        Some(join(&format!("{ws_scheme}://{rest}"), PUSH))
    }
}
