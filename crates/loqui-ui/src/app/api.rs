//! REST bindings over `gloo-net`.

use async_trait::async_trait;
use gloo::file::Blob;
use gloo_net::http::{Request, Response};
use loqui_api_models::{
    Ack, ClearHistoryResponse, DeviceInfo, GenerateRequest, GenerateResponse, HistoryListResponse,
    ModelState, ModelVariant, REFERENCE_AUDIO_FIELD, SystemInfo,
};
use loqui_sync::transport::paths;
use loqui_sync::{ApiError, ApiResult, TtsApi};
use serde::de::DeserializeOwned;
use web_sys::FormData;

/// Browser client for the backend REST API.
#[derive(Clone, Debug)]
pub(crate) struct GlooApi {
    base_url: String,
}

impl GlooApi {
    pub(crate) fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        paths::join(&self.base_url, path)
    }

    async fn send<T: DeserializeOwned>(request: Request) -> ApiResult<T> {
        let response = request
            .send()
            .await
            .map_err(|err| ApiError::Transport(err.to_string()))?;
        let response = Self::check(response).await?;
        response
            .json::<T>()
            .await
            .map_err(|err| ApiError::Decode(err.to_string()))
    }

    async fn check(response: Response) -> ApiResult<Response> {
        if response.ok() {
            return Ok(response);
        }
        let status = response.status();
        let status_text = response.status_text();
        let body = response.binary().await.unwrap_or_default();
        Err(ApiError::from_response(status, &status_text, &body))
    }

    fn generate_form(request: &GenerateRequest) -> ApiResult<FormData> {
        let form = FormData::new().map_err(|err| js_error("form-data failed", &err))?;
        for (name, value) in request.form_fields() {
            form.append_with_str(name, &value)
                .map_err(|err| js_error("append field", &err))?;
        }
        if let Some(reference) = &request.reference_audio {
            let blob: web_sys::Blob =
                Blob::new_with_options(reference.bytes.as_slice(), reference.content_type.as_deref())
                    .into();
            form.append_with_blob_and_filename(REFERENCE_AUDIO_FIELD, &blob, &reference.file_name)
                .map_err(|err| js_error("attach reference", &err))?;
        }
        Ok(form)
    }
}

fn js_error(context: &str, err: &wasm_bindgen::JsValue) -> ApiError {
    ApiError::Transport(format!("{context}: {err:?}"))
}

#[async_trait(?Send)]
impl TtsApi for GlooApi {
    async fn list_models(&self) -> ApiResult<Vec<ModelState>> {
        Self::send(Request::get(&self.url(paths::MODELS))).await
    }

    async fn device(&self) -> ApiResult<DeviceInfo> {
        Self::send(Request::get(&self.url(paths::DEVICE))).await
    }

    async fn load_model(&self, variant: &ModelVariant) -> ApiResult<ModelState> {
        Self::send(Request::post(&self.url(&paths::load_model(variant)))).await
    }

    async fn shutdown(&self) -> ApiResult<Ack> {
        Self::send(Request::post(&self.url(paths::SHUTDOWN))).await
    }

    async fn system_info(&self) -> ApiResult<SystemInfo> {
        Self::send(Request::get(&self.url(paths::SYSTEM_INFO))).await
    }

    async fn generate(&self, request: &GenerateRequest) -> ApiResult<GenerateResponse> {
        let form = Self::generate_form(request)?;
        Self::send(Request::post(&self.url(paths::GENERATE)).body(form)).await
    }

    async fn history(&self, limit: u32, offset: u32) -> ApiResult<HistoryListResponse> {
        Self::send(Request::get(&self.url(&paths::history_page(limit, offset)))).await
    }

    async fn delete_history_entry(&self, id: &str) -> ApiResult<Ack> {
        Self::send(Request::delete(&self.url(&paths::history_entry(id)))).await
    }

    async fn clear_history(&self) -> ApiResult<ClearHistoryResponse> {
        Self::send(Request::delete(&self.url(paths::HISTORY))).await
    }
}
