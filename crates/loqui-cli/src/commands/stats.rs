use loqui_sync::{StoreHandle, TtsApi};
use tracing::debug;

use crate::cli::{OutputFormat, StatsArgs};
use crate::client::{AppContext, CliResult};
use crate::output::{render_stats, render_system};

pub(crate) async fn handle_stats(
    ctx: &AppContext,
    args: StatsArgs,
    format: OutputFormat,
) -> CliResult<()> {
    let history = ctx.history();
    history.refresh().await?;
    if args.all {
        while ctx.store.read(|store| store.history.has_more()) {
            let added = history.load_more().await?;
            if added == 0 {
                debug!("history page added nothing; stopping");
                break;
            }
        }
    }
    if !ctx.system().refresh().await {
        debug!("system info unavailable; omitting pressure figures");
    }
    let store = ctx.store.snapshot();
    render_stats(&store.history, store.system.as_ref(), format)
}

pub(crate) async fn handle_system(ctx: &AppContext, format: OutputFormat) -> CliResult<()> {
    let info = ctx.api.system_info().await?;
    ctx.store.reduce(|store| store.system = Some(info.clone()));
    render_system(&info, format)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::test_support::context_with;
    use httpmock::MockServer;
    use httpmock::prelude::*;
    use serde_json::{Value, json};

    fn entry(id: &str) -> Value {
        json!({
            "id": id,
            "text": "one two three",
            "model_variant": "turbo-4bit",
            "language": "en",
            "duration_seconds": 3.0,
            "generation_time_seconds": 1.5,
            "audio_url": format!("/audio/{id}.wav"),
            "created_at": "2026-05-01T12:00:00Z"
        })
    }

    #[tokio::test]
    async fn stats_all_pages_through_history() {
        let server = MockServer::start_async().await;
        let first = server.mock(|when, then| {
            when.method(GET)
                .path("/api/history/")
                .query_param("offset", "0");
            then.status(200)
                .json_body(json!({"items": [entry("a"), entry("b")], "total": 3}));
        });
        let second = server.mock(|when, then| {
            when.method(GET)
                .path("/api/history/")
                .query_param("offset", "2");
            then.status(200)
                .json_body(json!({"items": [entry("c")], "total": 3}));
        });
        server.mock(|when, then| {
            when.method(GET).path("/api/system/info");
            then.status(500);
        });
        let ctx = context_with(&server);

        handle_stats(&ctx, StatsArgs { all: true }, OutputFormat::Json)
            .await
            .expect("stats");

        first.assert();
        second.assert();
        assert_eq!(ctx.store.read(|store| store.history.entries.len()), 3);
    }

    #[tokio::test]
    async fn system_failure_is_reported() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/api/system/info");
            then.status(503).json_body(json!({"detail": "busy"}));
        });
        let ctx = context_with(&server);

        let err = handle_system(&ctx, OutputFormat::Table)
            .await
            .expect_err("unavailable");
        assert_eq!(err.exit_code(), 3);
    }
}
