//! UI-only view models.

/// Toast variants used across the UI.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ToastKind {
    /// Informational toast.
    Info,
    /// Success toast.
    Success,
    /// Error toast.
    Error,
}

impl ToastKind {
    /// CSS modifier.
    #[must_use]
    pub const fn class(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Success => "success",
            Self::Error => "error",
        }
    }
}

/// Toast payload used by the host and app state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Toast {
    /// Monotonic toast identifier.
    pub id: u64,
    /// Display message for the toast.
    pub message: String,
    /// Severity classification.
    pub kind: ToastKind,
}

/// Visible toasts, newest last, capped at [`ToastQueue::LIMIT`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ToastQueue {
    next_id: u64,
    items: Vec<Toast>,
}

impl ToastQueue {
    /// Most toasts shown at once; older ones drop off.
    pub const LIMIT: usize = 4;

    /// Queue a message and return its id.
    pub fn push(&mut self, kind: ToastKind, message: impl Into<String>) -> u64 {
        self.next_id += 1;
        let id = self.next_id;
        self.items.push(Toast {
            id,
            message: message.into(),
            kind,
        });
        if self.items.len() > Self::LIMIT {
            let excess = self.items.len() - Self::LIMIT;
            self.items.drain(..excess);
        }
        id
    }

    /// Remove a toast by id.
    pub fn dismiss(&mut self, id: u64) {
        self.items.retain(|toast| toast.id != id);
    }

    /// Toasts in display order.
    #[must_use]
    pub fn items(&self) -> &[Toast] {
        &self.items
    }
}

/// Which panel the main area shows.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Panel {
    /// Text entry and playback.
    #[default]
    Generate,
    /// Past generations.
    History,
    /// Usage charts and host gauges.
    Stats,
}

impl Panel {
    /// Tabs in display order.
    #[must_use]
    pub const fn all() -> [Self; 3] {
        [Self::Generate, Self::History, Self::Stats]
    }

    /// Tab label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Generate => "Generate",
            Self::History => "History",
            Self::Stats => "Statistics",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queue_caps_and_dismisses() {
        let mut queue = ToastQueue::default();
        let first = queue.push(ToastKind::Info, "one");
        for n in 0..ToastQueue::LIMIT {
            queue.push(ToastKind::Success, format!("more {n}"));
        }
        assert_eq!(queue.items().len(), ToastQueue::LIMIT);
        assert!(queue.items().iter().all(|toast| toast.id != first));

        let last = queue.items()[ToastQueue::LIMIT - 1].id;
        queue.dismiss(last);
        assert_eq!(queue.items().len(), ToastQueue::LIMIT - 1);
    }
}
