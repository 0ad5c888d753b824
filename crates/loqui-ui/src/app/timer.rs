use async_trait::async_trait;
use gloo_timers::future::TimeoutFuture;
use js_sys::{Date, Math};
use loqui_sync::Timer;

/// Browser clock backed by `Date.now()` and `setTimeout`.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct BrowserTimer;

#[async_trait(?Send)]
impl Timer for BrowserTimer {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn now_ms(&self) -> u64 {
        Date::now() as u64
    }

    async fn sleep_ms(&self, ms: u64) {
        TimeoutFuture::new(u32::try_from(ms).unwrap_or(u32::MAX)).await;
    }

    fn jitter(&self) -> f64 {
        Math::random()
    }
}
