//! yewdux wrapper around the shared [`AppStore`].
//!
//! # Design
//! - The UI keeps exactly one [`UiStore`] in the yewdux context; controllers reach
//!   it through [`DispatchHandle`], which implements the core [`StoreHandle`].
//! - yewdux notifies subscribers only when the reduced value differs, matching the
//!   core's notify-on-change contract.

use loqui_sync::{AppStore, StoreHandle};
use yewdux::prelude::Dispatch;
use yewdux::store::Store;

/// App store as registered with yewdux.
#[derive(Clone, Debug, Default, PartialEq, Store)]
pub struct UiStore {
    /// Shared client state.
    pub app: AppStore,
}

/// [`StoreHandle`] over the global yewdux dispatch.
#[derive(Clone)]
pub struct DispatchHandle {
    dispatch: Dispatch<UiStore>,
}

impl DispatchHandle {
    /// Handle bound to the global [`UiStore`].
    #[must_use]
    pub fn new() -> Self {
        Self {
            dispatch: Dispatch::new(),
        }
    }
}

impl Default for DispatchHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for DispatchHandle {
    fn eq(&self, _other: &Self) -> bool {
        true
    }
}

impl StoreHandle for DispatchHandle {
    fn reduce<F>(&self, f: F)
    where
        F: FnOnce(&mut AppStore),
    {
        self.dispatch.reduce_mut(|store| f(&mut store.app));
    }

    fn read<R, F>(&self, f: F) -> R
    where
        F: FnOnce(&AppStore) -> R,
    {
        f(&self.dispatch.get().app)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use loqui_api_models::ModelVariant;

    #[test]
    fn reduce_is_visible_through_every_handle() {
        let writer = DispatchHandle::new();
        let reader = DispatchHandle::default();
        let qwen = ModelVariant::from("qwen-1.7b");

        writer.reduce(|store| store.models.selected = qwen.clone());

        assert_eq!(reader.read(|store| store.models.selected.clone()), qwen);
        assert_eq!(reader.snapshot().models.selected, qwen);
    }
}
