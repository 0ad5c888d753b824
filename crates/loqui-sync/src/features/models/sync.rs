//! Model controller: polling, optimistic loads, and shutdown.
//!
//! # Design
//! - Polling is best effort: failures are logged at debug and the next tick retries.
//! - `select_and_load` writes the optimistic state before the request leaves, so
//!   views react immediately. The push channel or a later poll settles the real
//!   status; an uncorroborated load is rolled back on the first tick past its
//!   deadline.

use super::state::{self, SnapshotOutcome};
use crate::config::SyncConfig;
use crate::error::ApiResult;
use crate::store::StoreHandle;
use crate::timer::Timer;
use crate::transport::TtsApi;
use futures_util::future;
use loqui_api_models::ModelVariant;
use std::rc::Rc;
use tracing::{debug, info, warn};

/// Keeps the model slice and device info in line with the backend.
pub struct ModelSync<A: ?Sized, S> {
    api: Rc<A>,
    store: S,
    poll_interval_ms: u64,
    optimistic_timeout_ms: u64,
}

impl<A: ?Sized, S: Clone> Clone for ModelSync<A, S> {
    fn clone(&self) -> Self {
        Self {
            api: Rc::clone(&self.api),
            store: self.store.clone(),
            poll_interval_ms: self.poll_interval_ms,
            optimistic_timeout_ms: self.optimistic_timeout_ms,
        }
    }
}

impl<A, S> ModelSync<A, S>
where
    A: TtsApi + ?Sized,
    S: StoreHandle,
{
    /// Controller using the intervals from `config`.
    pub const fn new(api: Rc<A>, store: S, config: &SyncConfig) -> Self {
        Self {
            api,
            store,
            poll_interval_ms: config.poll_interval_ms,
            optimistic_timeout_ms: config.optimistic_timeout_ms,
        }
    }

    /// Fetch the model list and device together and merge them into the store.
    ///
    /// `now_ms` is the issue time used to discard records that a push has
    /// already superseded.
    ///
    /// # Errors
    ///
    /// Returns the first backend error; the store is untouched.
    pub async fn refresh(&self, now_ms: u64) -> ApiResult<SnapshotOutcome> {
        let (models, device) =
            future::try_join(self.api.list_models(), self.api.device()).await?;
        let mut outcome = SnapshotOutcome::default();
        self.store.reduce(|store| {
            outcome = state::apply_snapshot(&mut store.models, models, now_ms);
            store.device = Some(device);
        });
        if let Some(variant) = &outcome.auto_selected {
            info!(%variant, "following loaded model");
        }
        Ok(outcome)
    }

    /// One poll cycle: refresh (errors swallowed), then expire a stale optimistic load.
    pub async fn tick(&self, now_ms: u64) {
        if let Err(err) = self.refresh(now_ms).await {
            debug!(error = %err, "model poll failed");
        }
        self.expire_pending(now_ms);
    }

    /// Roll back the optimistic load if its deadline passed.
    pub fn expire_pending(&self, now_ms: u64) -> Option<ModelVariant> {
        let mut expired = None;
        self.store.reduce(|store| {
            expired = state::expire_pending_load(&mut store.models, now_ms);
        });
        if let Some(variant) = &expired {
            warn!(%variant, "load request was never confirmed; restoring previous state");
        }
        expired
    }

    /// Select `variant`, mark it downloading, and ask the backend to load it.
    ///
    /// # Errors
    ///
    /// Returns the backend error. The optimistic state stays in place until a push,
    /// a poll, or the rollback deadline settles it.
    pub async fn select_and_load(&self, variant: &ModelVariant, now_ms: u64) -> ApiResult<()> {
        let timeout = self.optimistic_timeout_ms;
        self.store.reduce(|store| {
            state::begin_optimistic_load(&mut store.models, variant, now_ms, timeout);
        });
        info!(%variant, "load requested");
        self.api.load_model(variant).await.map(|_| ()).inspect_err(|err| {
            debug!(%variant, error = %err, "load request failed");
        })
    }

    /// Change the selection without loading.
    pub fn select(&self, variant: &ModelVariant) {
        self.store
            .reduce(|store| state::set_selected(&mut store.models, variant));
    }

    /// Ask the backend to unload its model, then refresh.
    ///
    /// # Errors
    ///
    /// Returns the shutdown error. A failing follow-up refresh is only logged.
    pub async fn shutdown(&self, now_ms: u64) -> ApiResult<()> {
        self.api.shutdown().await?;
        info!("model unloaded");
        if let Err(err) = self.refresh(now_ms).await {
            debug!(error = %err, "refresh after shutdown failed");
        }
        Ok(())
    }

    /// Poll forever: an immediate tick, then one every poll interval.
    pub async fn run_polling<T: Timer + ?Sized>(&self, timer: &T) {
        loop {
            self.tick(timer.now_ms()).await;
            timer.sleep_ms(self.poll_interval_ms).await;
        }
    }
}
