//! Clock and sleep abstraction for the background loops.

use async_trait::async_trait;

/// Wall clock plus async sleep, supplied by the host runtime.
#[async_trait(?Send)]
pub trait Timer {
    /// Milliseconds since the Unix epoch.
    fn now_ms(&self) -> u64;

    /// Suspend the calling task for `ms` milliseconds.
    async fn sleep_ms(&self, ms: u64);

    /// Jitter ratio in `[0, 1)` applied to backoff delays.
    fn jitter(&self) -> f64 {
        0.0
    }
}
