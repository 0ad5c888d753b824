//! Process-level span carrying the command name and build.

use crate::init::build_sha;
use tracing::span::EnteredSpan;

/// Keeps the command span entered until dropped.
pub struct CommandSpanGuard {
    _entered: EnteredSpan,
}

impl CommandSpanGuard {
    /// Enter a span tagged with `command` and the build SHA.
    #[must_use]
    pub fn enter(command: &str) -> Self {
        let span = tracing::info_span!("loqui", command = %command, build_sha = %build_sha());
        Self {
            _entered: span.entered(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guard_can_be_created_without_subscriber() {
        let guard = CommandSpanGuard::enter("models");
        drop(guard);
    }
}
