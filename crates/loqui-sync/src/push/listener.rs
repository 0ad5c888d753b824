//! Push listener loop.
//!
//! # Design
//! - One loop per session: connect, apply frames until the socket ends, wait the
//!   policy delay, repeat. There is no retry limit.
//! - The loop only ever holds one socket and one pending timer.
//! - [`ListenerHandle::close`] stops the loop; aborting the spawned future drops any
//!   open socket and pending sleep with it.

use super::frame::{apply_event, decode_frame};
use super::reconnect::{ConnectionState, ReconnectPolicy, Reconnector};
use super::PushError;
use crate::store::StoreHandle;
use crate::timer::Timer;
use async_trait::async_trait;
use futures_util::future::{AbortHandle, AbortRegistration, Abortable};
use futures_util::stream::LocalBoxStream;
use futures_util::StreamExt;
use std::cell::Cell;
use std::future::Future;
use std::rc::Rc;
use tracing::{debug, info};

/// Text frames from one open socket; the stream ends when the socket closes.
pub type PushStream = LocalBoxStream<'static, Result<String, PushError>>;

/// Opens push sockets.
#[async_trait(?Send)]
pub trait PushConnector {
    /// Open a new socket.
    async fn connect(&self) -> Result<PushStream, PushError>;
}

/// Stops a running listener.
#[derive(Clone, Debug)]
pub struct ListenerHandle {
    closed: Rc<Cell<bool>>,
    abort: AbortHandle,
}

impl ListenerHandle {
    /// Handle plus the registration used to make the loop abortable.
    #[must_use]
    pub fn pair() -> (Self, AbortRegistration) {
        let (abort, registration) = AbortHandle::new_pair();
        (
            Self {
                closed: Rc::new(Cell::new(false)),
                abort,
            },
            registration,
        )
    }

    /// Stop the listener. No reconnect is attempted afterwards.
    pub fn close(&self) {
        self.closed.set(true);
        self.abort.abort();
    }

    /// Whether [`close`](Self::close) was called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.get()
    }
}

/// Applies pushed model status frames to the store, reconnecting forever.
pub struct PushListener<C, T, S> {
    connector: C,
    timer: T,
    store: S,
    policy: ReconnectPolicy,
}

impl<C, T, S> PushListener<C, T, S>
where
    C: PushConnector,
    T: Timer,
    S: StoreHandle,
{
    /// Listener using `policy` between attempts.
    pub const fn new(connector: C, timer: T, store: S, policy: ReconnectPolicy) -> Self {
        Self {
            connector,
            timer,
            store,
            policy,
        }
    }

    /// Handle plus the future to spawn on the host executor.
    pub fn start(self) -> (ListenerHandle, impl Future<Output = ()>)
    where
        C: 'static,
        T: 'static,
        S: 'static,
    {
        let (handle, registration) = ListenerHandle::pair();
        let run = Abortable::new(self.run(handle.clone()), registration);
        (handle, async move {
            if run.await.is_err() {
                debug!("push listener aborted");
            }
        })
    }

    /// Run until `handle` is closed.
    pub async fn run(self, handle: ListenerHandle) {
        let mut reconnector = Reconnector::new(self.policy);
        while !handle.is_closed() {
            if !reconnector.begin_connect() {
                break;
            }
            self.publish(reconnector.state(), None, false);

            let reason = match self.connector.connect().await {
                Ok(stream) => {
                    reconnector.on_open();
                    info!("push channel connected");
                    self.publish(reconnector.state(), None, true);
                    self.drain(stream, &handle).await
                }
                Err(err) => Some(err.to_string()),
            };
            if handle.is_closed() {
                break;
            }

            let now = self.timer.now_ms();
            let Some(delay) = reconnector.on_close(now, self.timer.jitter()) else {
                break;
            };
            info!(delay_ms = delay, reason = reason.as_deref().unwrap_or("closed"), "push channel lost; reconnecting");
            self.publish(reconnector.state(), reason, false);
            self.timer.sleep_ms(delay).await;
        }
        reconnector.close();
        self.publish(reconnector.state(), None, false);
    }

    async fn drain(&self, mut stream: PushStream, handle: &ListenerHandle) -> Option<String> {
        while let Some(item) = stream.next().await {
            if handle.is_closed() {
                return None;
            }
            match item {
                Ok(text) => self.handle_text(&text),
                Err(err) => return Some(err.to_string()),
            }
        }
        None
    }

    fn handle_text(&self, text: &str) {
        match decode_frame(text) {
            Ok(event) => {
                let now = self.timer.now_ms();
                self.store.reduce(|store| {
                    apply_event(store, event, now);
                });
            }
            Err(err) => debug!(error = %err, "dropping push frame"),
        }
    }

    fn publish(&self, state: ConnectionState, error: Option<String>, opened: bool) {
        self.store.reduce(|store| {
            let connection = &mut store.connection;
            connection.state = state;
            if error.is_some() || opened {
                connection.last_error = error;
            }
            if opened {
                connection.connects = connection.connects.saturating_add(1);
            }
        });
    }
}
