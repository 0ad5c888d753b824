//! Generation controller.

use super::state::{self, BlockedReason};
use crate::error::ApiError;
use crate::features::history::HistorySync;
use crate::store::StoreHandle;
use crate::transport::TtsApi;
use loqui_api_models::GenerateResponse;
use std::rc::Rc;
use thiserror::Error;
use tracing::{debug, info};

/// Failure of [`GenerationController::submit`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerateError {
    /// The form is not ready; nothing was sent.
    #[error(transparent)]
    Blocked(#[from] BlockedReason),
    /// The backend rejected or never answered the request.
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Submits the generation form and refreshes history on success.
pub struct GenerationController<A: ?Sized, S> {
    api: Rc<A>,
    store: S,
    history: HistorySync<A, S>,
}

impl<A: ?Sized, S: Clone> Clone for GenerationController<A, S> {
    fn clone(&self) -> Self {
        Self {
            api: Rc::clone(&self.api),
            store: self.store.clone(),
            history: self.history.clone(),
        }
    }
}

impl<A, S> GenerationController<A, S>
where
    A: TtsApi + ?Sized,
    S: StoreHandle,
{
    /// Controller that refreshes `history` after each success.
    pub const fn new(api: Rc<A>, store: S, history: HistorySync<A, S>) -> Self {
        Self {
            api,
            store,
            history,
        }
    }

    /// Send the current form.
    ///
    /// # Errors
    ///
    /// [`GenerateError::Blocked`] when the form is not ready (no request is made),
    /// [`GenerateError::Api`] when the backend call fails; its message is also
    /// written to the generation error slot.
    pub async fn submit(&self) -> Result<GenerateResponse, GenerateError> {
        let request = self.store.read(state::prepare_request)?;
        self.store
            .reduce(|store| state::begin(&mut store.generation));
        info!(variant = %request.variant, chars = request.text.chars().count(), "generating");

        match self.api.generate(&request).await {
            Ok(response) => {
                info!(
                    id = %response.id,
                    duration = response.duration_seconds,
                    took = response.generation_time_seconds,
                    "generation finished"
                );
                let result = response.clone();
                self.store
                    .reduce(|store| state::succeed(&mut store.generation, result));
                if let Err(err) = self.history.refresh().await {
                    debug!(error = %err, "history refresh after generation failed");
                }
                Ok(response)
            }
            Err(err) => {
                let message = err.to_string();
                self.store
                    .reduce(|store| state::fail(&mut store.generation, message));
                Err(err.into())
            }
        }
    }

    /// Drop the last result and error.
    pub fn clear_generation(&self) {
        self.store
            .reduce(|store| state::clear(&mut store.generation));
    }

    /// Restore the form defaults.
    pub fn reset_form(&self) {
        self.store.reduce(|store| state::reset_form(&mut store.form));
    }
}
