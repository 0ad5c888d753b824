use std::time::Duration;

use anyhow::anyhow;
use loqui_api_models::{ModelStatus, ModelVariant};
use loqui_sync::catalog;
use loqui_sync::StoreHandle;
use tracing::debug;

use crate::cli::{LoadArgs, OutputFormat};
use crate::client::{AppContext, CliError, CliResult, timestamp_now_ms};
use crate::output::render_models;

pub(crate) async fn handle_models_list(ctx: &AppContext, format: OutputFormat) -> CliResult<()> {
    ctx.models().refresh(timestamp_now_ms()).await?;
    render_models(&ctx.store.snapshot(), format)
}

pub(crate) async fn handle_models_load(ctx: &AppContext, args: LoadArgs) -> CliResult<()> {
    let variant = parse_variant(&args.variant)?;
    let models = ctx.models();
    models.select_and_load(&variant, timestamp_now_ms()).await?;
    if args.wait {
        wait_for_loaded(ctx, &variant, Duration::from_secs(args.wait_timeout_secs)).await?;
        println!("{} is loaded", catalog::variant_label(&variant));
    } else {
        println!("Load requested for {}", catalog::variant_label(&variant));
    }
    Ok(())
}

pub(crate) async fn handle_models_unload(ctx: &AppContext) -> CliResult<()> {
    ctx.models().shutdown(timestamp_now_ms()).await?;
    println!("Model unloaded");
    Ok(())
}

/// Poll until `variant` reports loaded, fails, or `timeout` elapses.
pub(crate) async fn wait_for_loaded(
    ctx: &AppContext,
    variant: &ModelVariant,
    timeout: Duration,
) -> CliResult<()> {
    let models = ctx.models();
    let started = tokio::time::Instant::now();
    loop {
        if let Err(err) = models.refresh(timestamp_now_ms()).await {
            debug!(error = %err, "status poll failed while waiting");
        }
        let status = ctx.store.read(|store| {
            store
                .models
                .by_variant
                .get(variant)
                .map(|entry| (entry.status.clone(), entry.error.clone()))
        });
        match status {
            Some((ModelStatus::Loaded, _)) => return Ok(()),
            Some((ModelStatus::Error, error)) => {
                return Err(CliError::failure(anyhow!(
                    "loading {variant} failed: {}",
                    error.unwrap_or_else(|| "unknown error".to_string())
                )));
            }
            Some((status, _)) => debug!(%variant, %status, "still waiting"),
            None => debug!(%variant, "variant not reported yet"),
        }
        if started.elapsed() >= timeout {
            return Err(CliError::failure(anyhow!(
                "timed out waiting for {variant} to load"
            )));
        }
        tokio::time::sleep(Duration::from_millis(ctx.config.poll_interval_ms)).await;
    }
}

pub(crate) fn parse_variant(raw: &str) -> CliResult<ModelVariant> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(CliError::validation("variant must not be empty"));
    }
    Ok(ModelVariant::from(trimmed))
}
