//! Host facts polled for the statistics view.

use crate::store::StoreHandle;
use crate::timer::Timer;
use crate::transport::TtsApi;
use std::rc::Rc;
use tracing::debug;

/// Polls `/system/info` into the store.
pub struct SystemSync<A: ?Sized, S> {
    api: Rc<A>,
    store: S,
    interval_ms: u64,
}

impl<A, S> SystemSync<A, S>
where
    A: TtsApi + ?Sized,
    S: StoreHandle,
{
    /// Controller polling every `interval_ms`.
    pub const fn new(api: Rc<A>, store: S, interval_ms: u64) -> Self {
        Self {
            api,
            store,
            interval_ms,
        }
    }

    /// Fetch once. Failures keep the previous snapshot.
    pub async fn refresh(&self) -> bool {
        match self.api.system_info().await {
            Ok(info) => {
                self.store.reduce(|store| store.system = Some(info));
                true
            }
            Err(err) => {
                debug!(error = %err, "system info poll failed");
                false
            }
        }
    }

    /// Poll forever.
    pub async fn run_polling<T: Timer + ?Sized>(&self, timer: &T) {
        loop {
            self.refresh().await;
            timer.sleep_ms(self.interval_ms).await;
        }
    }
}
