//! Pure history-slice reducers.

use loqui_api_models::HistoryEntry;
use std::collections::HashSet;

/// History slice of the app store. Entries are newest first.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct HistoryState {
    /// Entries fetched so far.
    pub entries: Vec<HistoryEntry>,
    /// Server-side total.
    pub total: u64,
    /// Whether the first page has arrived.
    pub loaded: bool,
}

impl HistoryState {
    /// Whether the server holds entries beyond the loaded ones.
    #[must_use]
    pub fn has_more(&self) -> bool {
        (self.entries.len() as u64) < self.total
    }

    /// Offset for the next page request.
    #[must_use]
    pub fn next_offset(&self) -> u32 {
        u32::try_from(self.entries.len()).unwrap_or(u32::MAX)
    }
}

/// Replace the list with a freshly fetched first page.
pub fn set_page(state: &mut HistoryState, items: Vec<HistoryEntry>, total: u64) {
    state.entries = items;
    state.total = total;
    state.loaded = true;
}

/// Append a later page, skipping ids already present. Returns how many were added.
pub fn append_page(state: &mut HistoryState, items: Vec<HistoryEntry>, total: u64) -> usize {
    let known: HashSet<String> = state.entries.iter().map(|entry| entry.id.clone()).collect();
    let before = state.entries.len();
    state
        .entries
        .extend(items.into_iter().filter(|entry| !known.contains(&entry.id)));
    state.total = total;
    state.loaded = true;
    state.entries.len() - before
}

/// Drop the entry with `id` after the server confirmed its deletion.
pub fn remove_entry(state: &mut HistoryState, id: &str) {
    state.entries.retain(|entry| entry.id != id);
    state.total = state.total.saturating_sub(1);
}

/// Empty the list after the server confirmed a clear.
pub fn clear(state: &mut HistoryState) {
    state.entries.clear();
    state.total = 0;
    state.loaded = true;
}
