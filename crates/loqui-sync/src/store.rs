//! App-wide state snapshot and the handle writers go through.
//!
//! # Design
//! - Keep shared state in one snapshot so views never observe half-applied changes.
//! - Writers hand a closure to [`StoreHandle::reduce`]; the handle swaps in the
//!   result in one step and notifies subscribers only when something changed.
//! - The browser wraps the same [`AppStore`] in its yewdux store; other hosts use
//!   [`SessionStore`].

use crate::features::generation::state::{GenerationForm, GenerationState};
use crate::features::history::state::HistoryState;
use crate::features::models::state::ModelsState;
use crate::push::ConnectionStatus;
use loqui_api_models::{DeviceInfo, SystemInfo};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Everything the client knows about the backend and the current session.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AppStore {
    /// Compute device reported by the backend.
    pub device: Option<DeviceInfo>,
    /// Latest host facts.
    pub system: Option<SystemInfo>,
    /// Model records and selection.
    pub models: ModelsState,
    /// Generation form inputs.
    pub form: GenerationForm,
    /// In-flight flag, last result, and error slot for generation.
    pub generation: GenerationState,
    /// Loaded history page(s).
    pub history: HistoryState,
    /// Push channel status.
    pub connection: ConnectionStatus,
}

/// Access to a shared [`AppStore`].
pub trait StoreHandle {
    /// Apply `f` to a copy of the state and publish the result.
    fn reduce<F>(&self, f: F)
    where
        F: FnOnce(&mut AppStore);

    /// Read from the current state.
    fn read<R, F>(&self, f: F) -> R
    where
        F: FnOnce(&AppStore) -> R;

    /// Clone of the current state.
    fn snapshot(&self) -> AppStore {
        self.read(Clone::clone)
    }
}

type Listener = Rc<dyn Fn(&AppStore)>;

/// Single-threaded store for hosts without yewdux.
#[derive(Clone, Default)]
pub struct SessionStore {
    inner: Rc<SessionInner>,
}

#[derive(Default)]
struct SessionInner {
    state: RefCell<AppStore>,
    listeners: RefCell<Vec<Listener>>,
}

impl SessionStore {
    /// Fresh store with default state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with `state`.
    #[must_use]
    pub fn with_state(state: AppStore) -> Self {
        Self {
            inner: Rc::new(SessionInner {
                state: RefCell::new(state),
                listeners: RefCell::default(),
            }),
        }
    }

    /// Call `listener` after every change.
    pub fn subscribe(&self, listener: impl Fn(&AppStore) + 'static) {
        self.inner.listeners.borrow_mut().push(Rc::new(listener));
    }
}

impl StoreHandle for SessionStore {
    fn reduce<F>(&self, f: F)
    where
        F: FnOnce(&mut AppStore),
    {
        let mut next = self.inner.state.borrow().clone();
        f(&mut next);
        {
            let mut current = self.inner.state.borrow_mut();
            if *current == next {
                return;
            }
            *current = next;
        }
        let listeners: Vec<Listener> = self.inner.listeners.borrow().clone();
        if listeners.is_empty() {
            return;
        }
        let snapshot = self.snapshot();
        for listener in listeners {
            listener(&snapshot);
        }
    }

    fn read<R, F>(&self, f: F) -> R
    where
        F: FnOnce(&AppStore) -> R,
    {
        f(&self.inner.state.borrow())
    }
}

impl fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionStore")
            .field("state", &self.inner.state.borrow())
            .field("listeners", &self.inner.listeners.borrow().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn reduce_notifies_only_on_change() {
        let store = SessionStore::new();
        let calls = Rc::new(Cell::new(0));
        let seen = calls.clone();
        store.subscribe(move |_| seen.set(seen.get() + 1));

        store.reduce(|state| state.form.text = "hello".into());
        store.reduce(|state| state.form.text = "hello".into());
        assert_eq!(calls.get(), 1);
        assert_eq!(store.read(|state| state.form.text.clone()), "hello");
    }

    #[test]
    fn listener_may_write_back() {
        let store = SessionStore::new();
        let inner = store.clone();
        store.subscribe(move |state| {
            if state.form.text == "ping" {
                inner.reduce(|next| next.form.text = "pong".into());
            }
        });
        store.reduce(|state| state.form.text = "ping".into());
        assert_eq!(store.snapshot().form.text, "pong");
    }

    #[test]
    fn clones_share_state() {
        let store = SessionStore::new();
        let other = store.clone();
        other.reduce(|state| state.history.total = 7);
        assert_eq!(store.read(|state| state.history.total), 7);
    }
}
