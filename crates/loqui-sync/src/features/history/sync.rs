//! History controller: paging and server-confirmed deletions.

use super::state;
use crate::error::{ApiError, ApiResult};
use crate::store::StoreHandle;
use crate::transport::TtsApi;
use std::rc::Rc;
use tracing::debug;

/// Keeps the history slice in line with the backend.
pub struct HistorySync<A: ?Sized, S> {
    api: Rc<A>,
    store: S,
    page_size: u32,
}

impl<A: ?Sized, S: Clone> Clone for HistorySync<A, S> {
    fn clone(&self) -> Self {
        Self {
            api: Rc::clone(&self.api),
            store: self.store.clone(),
            page_size: self.page_size,
        }
    }
}

impl<A, S> HistorySync<A, S>
where
    A: TtsApi + ?Sized,
    S: StoreHandle,
{
    /// Controller fetching `page_size` entries per request.
    pub const fn new(api: Rc<A>, store: S, page_size: u32) -> Self {
        Self {
            api,
            store,
            page_size,
        }
    }

    /// Replace the list with the newest page.
    ///
    /// # Errors
    ///
    /// Returns the backend error; the list is left untouched.
    pub async fn refresh(&self) -> ApiResult<()> {
        let page = self.api.history(self.page_size, 0).await?;
        debug!(items = page.items.len(), total = page.total, "history page loaded");
        self.store
            .reduce(|store| state::set_page(&mut store.history, page.items, page.total));
        Ok(())
    }

    /// Append the next page. Returns how many new entries arrived.
    ///
    /// # Errors
    ///
    /// Returns the backend error; the list is left untouched.
    pub async fn load_more(&self) -> ApiResult<usize> {
        let offset = self.store.read(|store| store.history.next_offset());
        let page = self.api.history(self.page_size, offset).await?;
        let mut added = 0;
        self.store.reduce(|store| {
            added = state::append_page(&mut store.history, page.items, page.total);
        });
        Ok(added)
    }

    /// Delete one entry; the local list changes only after the server confirms.
    ///
    /// # Errors
    ///
    /// Returns the backend error, or a server error when the backend answers
    /// without confirming.
    pub async fn delete_entry(&self, id: &str) -> ApiResult<()> {
        let ack = self.api.delete_history_entry(id).await?;
        if !ack.ok {
            return Err(unconfirmed("deletion"));
        }
        self.store
            .reduce(|store| state::remove_entry(&mut store.history, id));
        Ok(())
    }

    /// Delete every entry. Returns the server's deleted count.
    ///
    /// # Errors
    ///
    /// Returns the backend error, or a server error when the backend answers
    /// without confirming. The list is untouched on failure.
    pub async fn clear_all(&self) -> ApiResult<u64> {
        let response = self.api.clear_history().await?;
        if !response.ok {
            return Err(unconfirmed("clear"));
        }
        debug!(deleted = response.deleted, "history cleared");
        self.store.reduce(|store| state::clear(&mut store.history));
        Ok(response.deleted)
    }
}

fn unconfirmed(action: &str) -> ApiError {
    ApiError::Server {
        status: 200,
        detail: format!("server did not confirm the {action}"),
    }
}
