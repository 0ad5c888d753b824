//! Push listener reconnect behaviour with a scripted socket.

mod support;

use async_trait::async_trait;
use loqui_api_models::ModelStatus;
use loqui_sync::push::PushError;
use loqui_sync::push::listener::{ListenerHandle, PushConnector, PushListener, PushStream};
use loqui_sync::push::reconnect::ConnectionState;
use loqui_sync::{ReconnectPolicy, SessionStore, StoreHandle, Timer};
use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;
use support::{FakeTimer, ScriptedConnector, Session, variant};
use tokio::task::LocalSet;
use tokio::time::Instant;

const LOADING: &str = r#"{"event":"model_status","variant":"qwen-1.7b","status":"loading"}"#;
const LOADED: &str = r#"{"event":"model_status","variant":"qwen-1.7b","status":"loaded"}"#;

#[tokio::test]
async fn reconnects_after_fixed_delay_forever() {
    let timer = FakeTimer::default();
    let connector = ScriptedConnector::new(
        &timer,
        vec![
            Session::Frames(vec![LOADING]),
            Session::Refused,
            Session::Refused,
            Session::Frames(vec!["garbage", LOADED]),
        ],
    );
    let (handle, _registration) = ListenerHandle::pair();
    *connector.handle.borrow_mut() = Some(handle.clone());
    let store = SessionStore::new();
    let listener = PushListener::new(&connector, &timer, store.clone(), ReconnectPolicy::default());

    listener.run(handle).await;

    assert_eq!(
        connector.connect_times.borrow().as_slice(),
        &[0, 3_000, 6_000, 9_000, 12_000]
    );
    assert_eq!(timer.sleeps.borrow().as_slice(), &[3_000; 4]);

    let state = store.snapshot();
    assert_eq!(
        state.models.by_variant[&variant("qwen-1.7b")].status,
        ModelStatus::Loaded
    );
    assert_eq!(state.models.selected, variant("qwen-1.7b"));
    assert_eq!(state.connection.state, ConnectionState::Closed);
    assert_eq!(state.connection.connects, 2);
}

#[tokio::test]
async fn backoff_grows_and_resets_after_open() {
    let timer = FakeTimer::default();
    let connector = ScriptedConnector::new(
        &timer,
        vec![
            Session::Refused,
            Session::Refused,
            Session::Frames(vec![]),
            Session::Refused,
        ],
    );
    let (handle, _registration) = ListenerHandle::pair();
    *connector.handle.borrow_mut() = Some(handle.clone());
    let listener = PushListener::new(
        &connector,
        &timer,
        SessionStore::new(),
        ReconnectPolicy::Backoff {
            base_ms: 1_000,
            max_ms: 30_000,
        },
    );

    listener.run(handle).await;

    assert_eq!(
        timer.sleeps.borrow().as_slice(),
        &[1_000, 2_000, 1_000, 2_000]
    );
}

#[tokio::test]
async fn closed_handle_stops_before_connecting() {
    let timer = FakeTimer::default();
    let connector = ScriptedConnector::new(&timer, vec![Session::Frames(vec![LOADED])]);
    let (handle, _registration) = ListenerHandle::pair();
    handle.close();
    let store = SessionStore::new();
    let listener = PushListener::new(&connector, &timer, store.clone(), ReconnectPolicy::default());

    listener.run(handle).await;

    assert!(connector.connect_times.borrow().is_empty());
    assert_eq!(store.snapshot().connection.state, ConnectionState::Closed);
}

#[tokio::test]
async fn connection_errors_are_reported_while_waiting() {
    let timer = FakeTimer::default();
    let connector = ScriptedConnector::new(&timer, vec![Session::Refused]);
    let (handle, _registration) = ListenerHandle::pair();
    *connector.handle.borrow_mut() = Some(handle.clone());
    let store = SessionStore::new();
    let observed = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
    {
        let observed = observed.clone();
        store.subscribe(move |state| {
            observed
                .borrow_mut()
                .push((state.connection.state, state.connection.last_error.clone()));
        });
    }
    let listener = PushListener::new(&connector, &timer, store.clone(), ReconnectPolicy::default());

    listener.run(handle).await;

    let observed = observed.borrow();
    assert!(observed.contains(&(
        ConnectionState::Waiting { retry_at_ms: 3_000 },
        Some("push connect failed: connection refused".into())
    )));
}

/// Clock backed by tokio's (pausable) timer.
struct TokioClock {
    origin: Instant,
}

#[async_trait(?Send)]
impl Timer for TokioClock {
    fn now_ms(&self) -> u64 {
        u64::try_from(self.origin.elapsed().as_millis()).unwrap_or(u64::MAX)
    }

    async fn sleep_ms(&self, ms: u64) {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }
}

/// Refuses every connection and counts the attempts.
struct RefusingConnector {
    attempts: Rc<Cell<u32>>,
}

#[async_trait(?Send)]
impl PushConnector for RefusingConnector {
    async fn connect(&self) -> Result<PushStream, PushError> {
        self.attempts.set(self.attempts.get() + 1);
        Err(PushError::Connect("connection refused".into()))
    }
}

#[tokio::test(start_paused = true)]
async fn closing_during_reconnect_wait_cancels_the_retry() {
    LocalSet::new()
        .run_until(async {
            let attempts = Rc::new(Cell::new(0));
            let store = SessionStore::new();
            let listener = PushListener::new(
                RefusingConnector {
                    attempts: attempts.clone(),
                },
                TokioClock {
                    origin: Instant::now(),
                },
                store.clone(),
                ReconnectPolicy::default(),
            );
            let (handle, run) = listener.start();
            let task = tokio::task::spawn_local(run);

            tokio::time::sleep(Duration::from_millis(1_000)).await;
            assert_eq!(attempts.get(), 1);
            assert!(matches!(
                store.snapshot().connection.state,
                ConnectionState::Waiting { .. }
            ));

            handle.close();
            tokio::time::sleep(Duration::from_secs(20)).await;

            assert_eq!(attempts.get(), 1);
            assert!(task.is_finished());
            task.await.expect("listener task");
        })
        .await;
}
