//! End-to-end session scenarios against an in-memory backend.

mod support;

use loqui_api_models::ModelStatus;
use loqui_sync::features::history::HistorySync;
use loqui_sync::features::models::ModelSync;
use loqui_sync::push::frame::{apply_event, decode_frame};
use loqui_sync::{SessionStore, StoreHandle, SyncConfig};
use std::cell::RefCell;
use std::rc::Rc;
use support::{FakeApi, model, transport_error, variant};

#[tokio::test]
async fn poll_selects_the_loaded_variant() {
    let api = Rc::new(FakeApi::default());
    *api.models.borrow_mut() = Ok(vec![
        model("turbo-fp16", ModelStatus::Downloaded),
        model("turbo-8bit", ModelStatus::NotDownloaded),
        model("turbo-4bit", ModelStatus::Loaded),
        model("multilingual", ModelStatus::NotDownloaded),
        model("qwen-1.7b", ModelStatus::NotDownloaded),
    ]);
    let store = SessionStore::new();
    store.reduce(|state| state.models.selected = variant("turbo-fp16"));
    let sync = ModelSync::new(api, store.clone(), &SyncConfig::default());

    sync.tick(1_000).await;

    let state = store.snapshot();
    assert_eq!(state.models.selected, variant("turbo-4bit"));
    assert_eq!(
        state.models.by_variant[&variant("turbo-4bit")].status,
        ModelStatus::Loaded
    );
    assert_eq!(
        state.device.map(|device| device.label),
        Some("Apple M3 Max (Metal)".to_string())
    );
}

#[tokio::test]
async fn select_and_load_is_visible_before_the_response() {
    let api = Rc::new(FakeApi::default());
    let store = SessionStore::new();
    let seen = Rc::new(RefCell::new(None));
    {
        let store = store.clone();
        let seen = seen.clone();
        *api.load_probe.borrow_mut() = Some(Box::new(move || {
            let state = store.snapshot();
            let status = state.models.by_variant[&variant("qwen-1.7b")].status.clone();
            *seen.borrow_mut() = Some((state.models.selected, status));
        }));
    }
    let sync = ModelSync::new(api.clone(), store.clone(), &SyncConfig::default());

    sync.select_and_load(&variant("qwen-1.7b"), 5_000)
        .await
        .expect("load accepted");

    assert_eq!(
        seen.borrow().clone(),
        Some((variant("qwen-1.7b"), ModelStatus::Downloading))
    );
    assert_eq!(api.load_calls.borrow().as_slice(), &[variant("qwen-1.7b")]);
}

#[tokio::test]
async fn failed_load_keeps_optimistic_state_until_deadline() {
    let api = Rc::new(FakeApi::default());
    *api.load_result.borrow_mut() = Err(transport_error());
    *api.models.borrow_mut() = Err(transport_error());
    let store = SessionStore::new();
    let sync = ModelSync::new(api, store.clone(), &SyncConfig::default());

    let result = sync.select_and_load(&variant("qwen-1.7b"), 1_000).await;
    assert!(result.is_err());
    assert_eq!(
        store.snapshot().models.by_variant[&variant("qwen-1.7b")].status,
        ModelStatus::Downloading
    );

    sync.tick(6_000).await;
    assert_eq!(store.snapshot().models.selected, variant("qwen-1.7b"));

    sync.tick(31_000).await;
    let state = store.snapshot();
    assert_eq!(
        state.models.by_variant[&variant("qwen-1.7b")].status,
        ModelStatus::NotDownloaded
    );
    assert_eq!(state.models.selected, variant("turbo-4bit"));
}

#[test]
fn error_frame_then_loaded_frame_clears_the_error() {
    let store = SessionStore::new();
    for (frame, at) in [
        (
            r#"{"event":"model_status","variant":"qwen-1.7b","status":"error","error":"OOM"}"#,
            10,
        ),
        (
            r#"{"event":"model_status","variant":"qwen-1.7b","status":"loaded"}"#,
            20,
        ),
    ] {
        let event = decode_frame(frame).expect("frame");
        store.reduce(|state| {
            apply_event(state, event, at);
        });
    }
    let state = store.snapshot();
    let entry = &state.models.by_variant[&variant("qwen-1.7b")];
    assert_eq!(entry.status, ModelStatus::Loaded);
    assert_eq!(entry.error, None);
    assert_eq!(state.models.selected, variant("qwen-1.7b"));
}

#[tokio::test]
async fn clear_all_empties_history_only_on_success() {
    let api = Rc::new(FakeApi::with_records(12));
    let store = SessionStore::new();
    let history = HistorySync::new(api.clone(), store.clone(), 50);
    history.refresh().await.expect("refresh");
    assert_eq!(store.snapshot().history.entries.len(), 12);
    assert_eq!(store.snapshot().history.total, 12);

    *api.clear_error.borrow_mut() = Some(transport_error());
    assert!(history.clear_all().await.is_err());
    let state = store.snapshot();
    assert_eq!(state.history.entries.len(), 12);
    assert_eq!(state.history.total, 12);

    *api.clear_error.borrow_mut() = None;
    assert_eq!(history.clear_all().await.expect("cleared"), 12);
    let state = store.snapshot();
    assert!(state.history.entries.is_empty());
    assert_eq!(state.history.total, 0);
}

#[tokio::test]
async fn every_known_variant_keeps_one_entry() {
    let api = Rc::new(FakeApi::default());
    *api.models.borrow_mut() = Ok(vec![
        model("turbo-4bit", ModelStatus::Loaded),
        model("experimental", ModelStatus::Downloaded),
    ]);
    let store = SessionStore::new();
    let sync = ModelSync::new(api, store.clone(), &SyncConfig::default());

    sync.tick(1).await;
    sync.tick(2).await;
    store.reduce(|state| {
        let event = decode_frame(
            r#"{"event":"model_status","variant":"experimental","status":"loading"}"#,
        )
        .expect("frame");
        apply_event(state, event, 3);
    });

    let state = store.snapshot();
    assert_eq!(state.models.order.len(), state.models.by_variant.len());
    let mut order = state.models.order.clone();
    order.sort();
    order.dedup();
    assert_eq!(order.len(), state.models.by_variant.len());
    assert!(state.models.by_variant.contains_key(&variant("experimental")));
}
