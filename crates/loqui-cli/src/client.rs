//! HTTP client, push socket, errors, and clock for the CLI.

use std::fmt::{self, Display, Formatter};
use std::rc::Rc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use anyhow::anyhow;
use async_trait::async_trait;
use futures_util::{StreamExt, future};
use loqui_api_models::{
    Ack, ClearHistoryResponse, DeviceInfo, GenerateRequest, GenerateResponse, HistoryListResponse,
    ModelState, ModelVariant, REFERENCE_AUDIO_FIELD, SystemInfo,
};
use loqui_sync::features::generation::{GenerateError, GenerationController};
use loqui_sync::features::history::HistorySync;
use loqui_sync::features::models::ModelSync;
use loqui_sync::features::system::SystemSync;
use loqui_sync::push::PushError;
use loqui_sync::push::listener::{PushConnector, PushStream};
use loqui_sync::transport::paths;
use loqui_sync::{ApiError, ApiResult, SessionStore, SyncConfig, Timer, TtsApi};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

/// CLI-level error type to distinguish validation from operational failures.
#[derive(Debug)]
pub(crate) enum CliError {
    Validation(String),
    Failure(anyhow::Error),
}

/// Convenience alias for functions returning a `CliError`.
pub(crate) type CliResult<T> = Result<T, CliError>;

impl CliError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub(crate) fn failure(error: impl Into<anyhow::Error>) -> Self {
        Self::Failure(error.into())
    }

    pub(crate) const fn exit_code(&self) -> i32 {
        match self {
            Self::Validation(_) => 2,
            Self::Failure(_) => 3,
        }
    }

    pub(crate) fn display_message(&self) -> String {
        match self {
            Self::Validation(message) => message.clone(),
            Self::Failure(error) => format!("{error:#}"),
        }
    }
}

impl Display for CliError {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str("cli error")
    }
}

impl std::error::Error for CliError {}

impl From<ApiError> for CliError {
    fn from(err: ApiError) -> Self {
        classify_api_error(err)
    }
}

impl From<GenerateError> for CliError {
    fn from(err: GenerateError) -> Self {
        match err {
            GenerateError::Blocked(reason) => Self::validation(reason.to_string()),
            GenerateError::Api(api) => classify_api_error(api),
        }
    }
}

/// Client mistakes become validation errors; everything else is a failure.
pub(crate) fn classify_api_error(err: ApiError) -> CliError {
    match err {
        ApiError::Server { status, detail } if matches!(status, 400 | 404 | 409 | 422) => {
            CliError::validation(detail)
        }
        ApiError::Server { status, detail } => {
            CliError::failure(anyhow!("{detail} (status {status})"))
        }
        other => CliError::failure(anyhow!(other)),
    }
}

/// Parse the API URL provided to the CLI.
pub(crate) fn parse_url(input: &str) -> Result<Url, String> {
    input
        .parse::<Url>()
        .map_err(|err| format!("invalid URL '{input}': {err}"))
}

/// Millisecond wall clock.
#[must_use]
pub(crate) fn timestamp_now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|duration| u64::try_from(duration.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}

/// `reqwest` implementation of the backend surface.
pub(crate) struct HttpApi {
    client: Client,
    base_url: Url,
}

impl HttpApi {
    pub(crate) const fn new(client: Client, base_url: Url) -> Self {
        Self { client, base_url }
    }

    fn url(&self, path: &str) -> ApiResult<Url> {
        paths::join(self.base_url.as_str(), path)
            .parse()
            .map_err(|err| ApiError::Transport(format!("invalid request URL: {err}")))
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> ApiResult<T> {
        let response = request
            .send()
            .await
            .map_err(|err| ApiError::Transport(err.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.bytes().await.unwrap_or_default();
            return Err(ApiError::from_response(
                status.as_u16(),
                status.canonical_reason().unwrap_or_default(),
                &body,
            ));
        }
        response
            .json::<T>()
            .await
            .map_err(|err| ApiError::Decode(err.to_string()))
    }

    /// Fetch generated audio. Relative URLs resolve against the API origin.
    pub(crate) async fn download(&self, audio_url: &str) -> ApiResult<Vec<u8>> {
        let url = self
            .base_url
            .join(audio_url)
            .map_err(|err| ApiError::Transport(format!("invalid audio URL: {err}")))?;
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|err| ApiError::Transport(err.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::from_response(
                status.as_u16(),
                status.canonical_reason().unwrap_or_default(),
                &[],
            ));
        }
        response
            .bytes()
            .await
            .map(|bytes| bytes.to_vec())
            .map_err(|err| ApiError::Transport(err.to_string()))
    }

    fn generate_form(request: &GenerateRequest) -> ApiResult<Form> {
        let mut form = Form::new();
        for (name, value) in request.form_fields() {
            form = form.text(name, value);
        }
        if let Some(reference) = &request.reference_audio {
            let mut part = Part::bytes(reference.bytes.clone()).file_name(reference.file_name.clone());
            if let Some(content_type) = &reference.content_type {
                part = part
                    .mime_str(content_type)
                    .map_err(|err| ApiError::Transport(format!("invalid content type: {err}")))?;
            }
            form = form.part(REFERENCE_AUDIO_FIELD, part);
        }
        Ok(form)
    }
}

#[async_trait(?Send)]
impl TtsApi for HttpApi {
    async fn list_models(&self) -> ApiResult<Vec<ModelState>> {
        self.send(self.client.get(self.url(paths::MODELS)?)).await
    }

    async fn device(&self) -> ApiResult<DeviceInfo> {
        self.send(self.client.get(self.url(paths::DEVICE)?)).await
    }

    async fn load_model(&self, variant: &ModelVariant) -> ApiResult<ModelState> {
        self.send(self.client.post(self.url(&paths::load_model(variant))?))
            .await
    }

    async fn shutdown(&self) -> ApiResult<Ack> {
        self.send(self.client.post(self.url(paths::SHUTDOWN)?)).await
    }

    async fn system_info(&self) -> ApiResult<SystemInfo> {
        self.send(self.client.get(self.url(paths::SYSTEM_INFO)?))
            .await
    }

    async fn generate(&self, request: &GenerateRequest) -> ApiResult<GenerateResponse> {
        let form = Self::generate_form(request)?;
        self.send(
            self.client
                .post(self.url(paths::GENERATE)?)
                .multipart(form),
        )
        .await
    }

    async fn history(&self, limit: u32, offset: u32) -> ApiResult<HistoryListResponse> {
        self.send(
            self.client
                .get(self.url(&paths::history_page(limit, offset))?),
        )
        .await
    }

    async fn delete_history_entry(&self, id: &str) -> ApiResult<Ack> {
        self.send(self.client.delete(self.url(&paths::history_entry(id))?))
            .await
    }

    async fn clear_history(&self) -> ApiResult<ClearHistoryResponse> {
        self.send(self.client.delete(self.url(paths::HISTORY)?)).await
    }
}

/// Tokio clock with random jitter.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct TokioTimer;

#[async_trait(?Send)]
impl Timer for TokioTimer {
    fn now_ms(&self) -> u64 {
        timestamp_now_ms()
    }

    async fn sleep_ms(&self, ms: u64) {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }

    fn jitter(&self) -> f64 {
        rand::random::<f64>()
    }
}

/// Push socket over `tokio-tungstenite`.
pub(crate) struct SocketConnector {
    url: String,
}

impl SocketConnector {
    pub(crate) const fn new(url: String) -> Self {
        Self { url }
    }
}

#[async_trait(?Send)]
impl PushConnector for SocketConnector {
    async fn connect(&self) -> Result<PushStream, PushError> {
        let (socket, _response) = connect_async(self.url.as_str())
            .await
            .map_err(|err| PushError::Connect(err.to_string()))?;
        let frames = socket.filter_map(|message| {
            future::ready(match message {
                Ok(Message::Text(text)) => Some(Ok(text.as_str().to_owned())),
                Ok(Message::Binary(bytes)) => String::from_utf8(bytes.to_vec()).ok().map(Ok),
                Ok(_) => None,
                Err(err) => Some(Err(PushError::Socket(err.to_string()))),
            })
        });
        Ok(frames.boxed_local())
    }
}

/// Shared handles passed to command handlers.
#[derive(Clone)]
pub(crate) struct AppContext {
    pub(crate) api: Rc<HttpApi>,
    pub(crate) store: SessionStore,
    pub(crate) config: SyncConfig,
    pub(crate) base_url: Url,
}

impl AppContext {
    pub(crate) fn new(client: Client, base_url: Url, config: SyncConfig) -> Self {
        Self {
            api: Rc::new(HttpApi::new(client, base_url.clone())),
            store: SessionStore::new(),
            config,
            base_url,
        }
    }

    pub(crate) fn models(&self) -> ModelSync<HttpApi, SessionStore> {
        ModelSync::new(Rc::clone(&self.api), self.store.clone(), &self.config)
    }

    pub(crate) fn history(&self) -> HistorySync<HttpApi, SessionStore> {
        HistorySync::new(
            Rc::clone(&self.api),
            self.store.clone(),
            self.config.history_page_size,
        )
    }

    pub(crate) fn generation(&self) -> GenerationController<HttpApi, SessionStore> {
        GenerationController::new(Rc::clone(&self.api), self.store.clone(), self.history())
    }

    pub(crate) fn system(&self) -> SystemSync<HttpApi, SessionStore> {
        SystemSync::new(
            Rc::clone(&self.api),
            self.store.clone(),
            self.config.system_poll_interval_ms,
        )
    }

    /// WebSocket URL for the push channel.
    pub(crate) fn push_url(&self) -> CliResult<String> {
        paths::push_url(self.base_url.as_str()).ok_or_else(|| {
            CliError::validation(format!(
                "cannot derive a push URL from '{}'; use an http(s) API URL",
                self.base_url
            ))
        })
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::AppContext;
    use httpmock::MockServer;
    use loqui_sync::SyncConfig;
    use reqwest::Client;

    pub(crate) fn context_with(server: &MockServer) -> AppContext {
        let base = server.url("/api").parse().expect("mock URL");
        let config = SyncConfig {
            poll_interval_ms: 20,
            ..SyncConfig::default()
        };
        AppContext::new(Client::new(), base, config)
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::context_with;
    use super::*;
    use httpmock::MockServer;
    use httpmock::prelude::*;
    use loqui_api_models::ModelStatus;
    use serde_json::json;

    #[tokio::test]
    async fn list_models_decodes_payload() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(GET).path("/api/models/");
            then.status(200).json_body(json!([
                {"variant": "turbo-4bit", "status": "loaded", "error": null, "download_progress": 1.0},
                {"variant": "qwen-1.7b", "status": "downloading", "error": null, "download_progress": 0.25}
            ]));
        });

        let ctx = context_with(&server);
        let models = ctx.api.list_models().await.expect("models");
        mock.assert();
        assert_eq!(models.len(), 2);
        assert_eq!(models[0].status, ModelStatus::Loaded);
    }

    #[tokio::test]
    async fn server_detail_is_surfaced() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(POST).path("/api/models/bogus/load");
            then.status(404).json_body(json!({"detail": "Unknown variant: bogus"}));
        });

        let ctx = context_with(&server);
        let err = ctx
            .api
            .load_model(&ModelVariant::from("bogus"))
            .await
            .expect_err("unknown variant");
        assert_eq!(
            err,
            ApiError::Server {
                status: 404,
                detail: "Unknown variant: bogus".into()
            }
        );
        assert!(matches!(classify_api_error(err), CliError::Validation(message) if message.contains("bogus")));
    }

    #[tokio::test]
    async fn history_page_sends_query() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/api/history/")
                .query_param("limit", "50")
                .query_param("offset", "0");
            then.status(200).json_body(json!({"items": [], "total": 0}));
        });

        let ctx = context_with(&server);
        let page = ctx.api.history(50, 0).await.expect("page");
        mock.assert();
        assert_eq!(page.total, 0);
    }

    #[tokio::test]
    async fn unreachable_backend_is_transport_failure() {
        let ctx = AppContext::new(
            Client::new(),
            "http://127.0.0.1:9/api".parse().expect("url"),
            SyncConfig::default(),
        );
        let err = ctx.api.device().await.expect_err("refused");
        assert!(err.is_transport());
        assert_eq!(CliError::from(err).exit_code(), 3);
    }

    #[test]
    fn push_url_follows_base_scheme() {
        let ctx = AppContext::new(
            Client::new(),
            "https://tts.example/api".parse().expect("url"),
            SyncConfig::default(),
        );
        assert_eq!(ctx.push_url().expect("push url"), "wss://tts.example/api/ws");
    }

    #[test]
    fn blocked_generation_is_validation() {
        let err = CliError::from(GenerateError::Blocked(
            loqui_sync::features::generation::BlockedReason::EmptyText,
        ));
        assert_eq!(err.exit_code(), 2);
        assert_eq!(err.display_message(), "enter some text to speak");
    }
}
