//! In-memory fakes for the controller and listener tests.

#![allow(dead_code, unreachable_pub)]

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use futures_util::StreamExt;
use futures_util::stream;
use loqui_api_models::{
    Ack, ClearHistoryResponse, DeviceInfo, GenerateRequest, GenerateResponse, HistoryEntry,
    HistoryListResponse, ModelState, ModelStatus, ModelVariant, SystemInfo,
};
use loqui_sync::push::PushError;
use loqui_sync::push::listener::{ListenerHandle, PushConnector, PushStream};
use loqui_sync::{ApiError, ApiResult, Timer, TtsApi};
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;

pub fn variant(id: &str) -> ModelVariant {
    ModelVariant::from(id)
}

pub fn model(id: &str, status: ModelStatus) -> ModelState {
    ModelState {
        status,
        ..ModelState::new(variant(id))
    }
}

pub fn history_entry(index: usize) -> HistoryEntry {
    HistoryEntry {
        id: format!("rec-{index}"),
        text: format!("sample number {index}"),
        model_variant: variant("turbo-4bit"),
        language: None,
        exaggeration: Some(0.5),
        cfg_weight: Some(0.5),
        duration_seconds: 2.5,
        generation_time_seconds: 0.8,
        audio_url: format!("/api/audio/rec-{index}.wav"),
        created_at: Utc
            .with_ymd_and_hms(2025, 4, 2, 8, 0, 0)
            .single()
            .expect("timestamp"),
    }
}

pub fn transport_error() -> ApiError {
    ApiError::Transport("connection refused".into())
}

/// Scriptable backend.
pub struct FakeApi {
    pub models: RefCell<ApiResult<Vec<ModelState>>>,
    pub device: RefCell<ApiResult<DeviceInfo>>,
    pub load_result: RefCell<ApiResult<ModelState>>,
    pub load_calls: RefCell<Vec<ModelVariant>>,
    pub load_probe: RefCell<Option<Box<dyn Fn()>>>,
    pub shutdown_calls: Cell<usize>,
    pub system: RefCell<ApiResult<SystemInfo>>,
    pub records: RefCell<Vec<HistoryEntry>>,
    pub history_error: RefCell<Option<ApiError>>,
    pub history_calls: RefCell<Vec<(u32, u32)>>,
    pub delete_error: RefCell<Option<ApiError>>,
    pub clear_error: RefCell<Option<ApiError>>,
    pub generate_result: RefCell<ApiResult<GenerateResponse>>,
    pub generate_calls: RefCell<Vec<GenerateRequest>>,
}

impl Default for FakeApi {
    fn default() -> Self {
        Self {
            models: RefCell::new(Ok(Vec::new())),
            device: RefCell::new(Ok(DeviceInfo {
                device: "mps".into(),
                name: "Apple M3 Max".into(),
                label: "Apple M3 Max (Metal)".into(),
            })),
            load_result: RefCell::new(Ok(model("turbo-4bit", ModelStatus::NotDownloaded))),
            load_calls: RefCell::default(),
            load_probe: RefCell::default(),
            shutdown_calls: Cell::new(0),
            system: RefCell::new(Ok(SystemInfo::default())),
            records: RefCell::default(),
            history_error: RefCell::default(),
            history_calls: RefCell::default(),
            delete_error: RefCell::default(),
            clear_error: RefCell::default(),
            generate_result: RefCell::new(Ok(generate_response("gen-1"))),
            generate_calls: RefCell::default(),
        }
    }
}

pub fn generate_response(id: &str) -> GenerateResponse {
    GenerateResponse {
        id: id.into(),
        audio_url: format!("/api/audio/{id}.wav"),
        text: "Hello".into(),
        model_variant: variant("turbo-4bit"),
        language: None,
        duration_seconds: 1.5,
        generation_time_seconds: 0.4,
        sample_rate: 24_000,
    }
}

impl FakeApi {
    pub fn with_records(count: usize) -> Self {
        let api = Self::default();
        *api.records.borrow_mut() = (0..count).map(history_entry).collect();
        api
    }
}

#[async_trait(?Send)]
impl TtsApi for FakeApi {
    async fn list_models(&self) -> ApiResult<Vec<ModelState>> {
        self.models.borrow().clone()
    }

    async fn device(&self) -> ApiResult<DeviceInfo> {
        self.device.borrow().clone()
    }

    async fn load_model(&self, variant: &ModelVariant) -> ApiResult<ModelState> {
        if let Some(probe) = self.load_probe.borrow().as_ref() {
            probe();
        }
        self.load_calls.borrow_mut().push(variant.clone());
        self.load_result.borrow().clone()
    }

    async fn shutdown(&self) -> ApiResult<Ack> {
        self.shutdown_calls.set(self.shutdown_calls.get() + 1);
        Ok(Ack { ok: true })
    }

    async fn system_info(&self) -> ApiResult<SystemInfo> {
        self.system.borrow().clone()
    }

    async fn generate(&self, request: &GenerateRequest) -> ApiResult<GenerateResponse> {
        self.generate_calls.borrow_mut().push(request.clone());
        let result = self.generate_result.borrow().clone();
        if let Ok(response) = &result {
            let mut entry = history_entry(0);
            entry.id.clone_from(&response.id);
            self.records.borrow_mut().insert(0, entry);
        }
        result
    }

    async fn history(&self, limit: u32, offset: u32) -> ApiResult<HistoryListResponse> {
        self.history_calls.borrow_mut().push((limit, offset));
        if let Some(err) = self.history_error.borrow().clone() {
            return Err(err);
        }
        let records = self.records.borrow();
        let items = records
            .iter()
            .skip(offset as usize)
            .take(limit as usize)
            .cloned()
            .collect();
        Ok(HistoryListResponse {
            items,
            total: records.len() as u64,
        })
    }

    async fn delete_history_entry(&self, id: &str) -> ApiResult<Ack> {
        if let Some(err) = self.delete_error.borrow().clone() {
            return Err(err);
        }
        self.records.borrow_mut().retain(|entry| entry.id != id);
        Ok(Ack { ok: true })
    }

    async fn clear_history(&self) -> ApiResult<ClearHistoryResponse> {
        if let Some(err) = self.clear_error.borrow().clone() {
            return Err(err);
        }
        let deleted = self.records.borrow().len() as u64;
        self.records.borrow_mut().clear();
        Ok(ClearHistoryResponse { ok: true, deleted })
    }
}

/// Virtual clock; sleeping advances it instantly.
#[derive(Default)]
pub struct FakeTimer {
    pub now: Cell<u64>,
    pub sleeps: RefCell<Vec<u64>>,
}

#[async_trait(?Send)]
impl Timer for &FakeTimer {
    fn now_ms(&self) -> u64 {
        self.now.get()
    }

    async fn sleep_ms(&self, ms: u64) {
        self.sleeps.borrow_mut().push(ms);
        self.now.set(self.now.get() + ms);
        tokio::task::yield_now().await;
    }
}

/// One scripted connection: frames then a clean close, or a failure to connect.
pub enum Session {
    Frames(Vec<&'static str>),
    Refused,
}

/// Connector replaying [`Session`]s; closes the listener when the script runs out.
pub struct ScriptedConnector<'a> {
    pub sessions: RefCell<VecDeque<Session>>,
    pub timer: &'a FakeTimer,
    pub connect_times: RefCell<Vec<u64>>,
    pub handle: RefCell<Option<ListenerHandle>>,
}

impl<'a> ScriptedConnector<'a> {
    pub fn new(timer: &'a FakeTimer, sessions: Vec<Session>) -> Self {
        Self {
            sessions: RefCell::new(sessions.into()),
            timer,
            connect_times: RefCell::default(),
            handle: RefCell::default(),
        }
    }
}

#[async_trait(?Send)]
impl PushConnector for &ScriptedConnector<'_> {
    async fn connect(&self) -> Result<PushStream, PushError> {
        self.connect_times.borrow_mut().push(self.timer.now.get());
        let next = self.sessions.borrow_mut().pop_front();
        match next {
            Some(Session::Frames(frames)) => Ok(stream::iter(
                frames.into_iter().map(|frame| Ok(frame.to_string())),
            )
            .boxed_local()),
            Some(Session::Refused) => Err(PushError::Connect("connection refused".into())),
            None => {
                if let Some(handle) = self.handle.borrow().as_ref() {
                    handle.close();
                }
                Err(PushError::Connect("script exhausted".into()))
            }
        }
    }
}
