use std::path::Path;
use std::time::Duration;

use anyhow::anyhow;
use loqui_api_models::{ModelStatus, ReferenceAudio};
use loqui_sync::features::generation::state as form;
use loqui_sync::StoreHandle;
use tracing::info;

use crate::cli::{GenerateArgs, OutputFormat};
use crate::client::{AppContext, CliError, CliResult, timestamp_now_ms};
use crate::commands::models::{parse_variant, wait_for_loaded};
use crate::output::render_generation;

const LOAD_WAIT: Duration = Duration::from_secs(900);

pub(crate) async fn handle_generate(
    ctx: &AppContext,
    args: GenerateArgs,
    format: OutputFormat,
) -> CliResult<()> {
    let text = read_text(&args)?;
    let reference = args.reference.as_deref().map(read_reference).transpose()?;

    let models = ctx.models();
    models.refresh(timestamp_now_ms()).await?;
    if let Some(raw) = args.variant.as_deref() {
        let variant = parse_variant(raw)?;
        let loaded = ctx.store.read(|store| {
            store
                .models
                .by_variant
                .get(&variant)
                .is_some_and(|entry| entry.status == ModelStatus::Loaded)
        });
        if loaded || !args.load {
            models.select(&variant);
        } else {
            models.select_and_load(&variant, timestamp_now_ms()).await?;
            wait_for_loaded(ctx, &variant, LOAD_WAIT).await?;
        }
    }

    ctx.store.reduce(|store| {
        let inputs = &mut store.form;
        form::set_text(inputs, text);
        if let Some(language) = args.language {
            form::set_language(inputs, language);
        }
        if let Some(value) = args.exaggeration {
            form::set_exaggeration(inputs, value);
        }
        if let Some(value) = args.cfg_weight {
            form::set_cfg_weight(inputs, value);
        }
        if let Some(value) = args.temperature {
            form::set_temperature(inputs, value);
        }
        if let Some(value) = args.speed {
            form::set_speed(inputs, value);
        }
        form::set_reference(inputs, reference);
        if let Some(ref_text) = args.ref_text {
            form::set_ref_text(inputs, ref_text);
        }
    });

    let response = ctx.generation().submit().await?;
    if let Some(path) = &args.save {
        let audio = ctx.api.download(&response.audio_url).await?;
        tokio::fs::write(path, &audio).await.map_err(|err| {
            CliError::failure(anyhow!("failed to write '{}': {err}", path.display()))
        })?;
        info!(path = %path.display(), bytes = audio.len(), "audio saved");
    }
    render_generation(&response, format)
}

fn read_text(args: &GenerateArgs) -> CliResult<String> {
    match (&args.text, &args.text_file) {
        (Some(text), _) => Ok(text.clone()),
        (None, Some(path)) => std::fs::read_to_string(path).map_err(|err| {
            CliError::failure(anyhow!("failed to read '{}': {err}", path.display()))
        }),
        (None, None) => Err(CliError::validation(
            "provide the text to speak or --file <path>",
        )),
    }
}

fn read_reference(path: &Path) -> CliResult<ReferenceAudio> {
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string)
        .ok_or_else(|| CliError::validation(format!("invalid reference path '{}'", path.display())))?;
    let content_type = audio_mime(&file_name);
    if !form::is_audio_file(&file_name, content_type) {
        return Err(CliError::validation(format!(
            "'{file_name}' is not an audio file"
        )));
    }
    let bytes = std::fs::read(path).map_err(|err| {
        CliError::failure(anyhow!("failed to read '{}': {err}", path.display()))
    })?;
    Ok(ReferenceAudio {
        file_name,
        content_type: content_type.map(str::to_string),
        bytes,
    })
}

fn audio_mime(file_name: &str) -> Option<&'static str> {
    let (_, ext) = file_name.rsplit_once('.')?;
    match ext.to_ascii_lowercase().as_str() {
        "wav" => Some("audio/wav"),
        "mp3" => Some("audio/mpeg"),
        "flac" => Some("audio/flac"),
        "ogg" => Some("audio/ogg"),
        "m4a" => Some("audio/mp4"),
        _ => None,
    }
}
