//! Output renderers and formatting helpers for CLI commands.

use anyhow::anyhow;
use chrono::Utc;
use loqui_api_models::{GenerateResponse, SystemInfo};
use loqui_sync::catalog;
use loqui_sync::features::history::HistoryState;
use loqui_sync::features::models::state::ordered;
use loqui_sync::format::{
    format_duration, format_progress, format_stat_time, format_time_ago, truncate_text,
};
use loqui_sync::stats::{self, SPEED_WINDOW, TOP_LANGUAGES};
use loqui_sync::AppStore;
use serde::Serialize;
use serde_json::json;

use crate::cli::OutputFormat;
use crate::client::{CliError, CliResult};

const HISTORY_TEXT_WIDTH: usize = 48;

fn print_json<T: Serialize + ?Sized>(value: &T) -> CliResult<()> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|err| CliError::failure(anyhow!("failed to format JSON: {err}")))?;
    println!("{text}");
    Ok(())
}

pub(crate) fn render_models(store: &AppStore, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(&json!({
            "device": store.device,
            "selected": store.models.selected,
            "models": ordered(&store.models),
        })),
        OutputFormat::Table => {
            if let Some(device) = &store.device {
                println!("device: {} ({})", device.label, device.name);
            }
            for line in model_rows(store) {
                println!("{line}");
            }
            Ok(())
        }
    }
}

pub(crate) fn model_rows(store: &AppStore) -> Vec<String> {
    let mut lines = vec![format!(
        "  {:<14} {:<16} {:<16} {:>6}",
        "VARIANT", "LABEL", "STATUS", "SIZE"
    )];
    for entry in ordered(&store.models) {
        let marker = if entry.variant == store.models.selected {
            '*'
        } else {
            ' '
        };
        let info = catalog::variant_info(&entry.variant);
        let mut status = entry.status.to_string();
        if entry.download_progress > 0.0 && entry.status.is_busy() {
            status = format!("{status} {}", format_progress(entry.download_progress));
        }
        lines.push(format!(
            "{marker} {:<14} {:<16} {:<16} {:>6}",
            entry.variant,
            catalog::variant_label(&entry.variant),
            status,
            info.map_or("?", |info| info.size),
        ));
        if let Some(error) = &entry.error {
            lines.push(format!("    error: {error}"));
        }
    }
    lines
}

pub(crate) fn render_generation(response: &GenerateResponse, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(response),
        OutputFormat::Table => {
            println!("id: {}", response.id);
            println!("model: {}", catalog::variant_label(&response.model_variant));
            if let Some(language) = &response.language {
                println!(
                    "language: {}",
                    catalog::language_name(language).unwrap_or(language.as_str())
                );
            }
            println!("duration: {}", format_duration(response.duration_seconds));
            println!(
                "generated in: {}",
                format_stat_time(response.generation_time_seconds)
            );
            println!("sample rate: {} Hz", response.sample_rate);
            println!("audio: {}", response.audio_url);
            Ok(())
        }
    }
}

pub(crate) fn render_history(
    history: &HistoryState,
    offset: u32,
    format: OutputFormat,
) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(&json!({
            "total": history.total,
            "offset": offset,
            "items": history.entries,
        })),
        OutputFormat::Table => {
            if history.entries.is_empty() {
                println!("no generations");
                return Ok(());
            }
            let now = Utc::now();
            println!(
                "{:<36} {:<10} {:<14} {:>6} TEXT",
                "ID", "AGE", "VARIANT", "DUR"
            );
            for entry in &history.entries {
                println!(
                    "{:<36} {:<10} {:<14} {:>6} {}",
                    entry.id,
                    format_time_ago(entry.created_at, now),
                    entry.model_variant,
                    format_duration(entry.duration_seconds),
                    truncate_text(&entry.text, HISTORY_TEXT_WIDTH)
                );
            }
            let first = u64::from(offset) + 1;
            let last = u64::from(offset) + history.entries.len() as u64;
            println!("showing {first}-{last} of {}", history.total);
            Ok(())
        }
    }
}

pub(crate) fn render_stats(
    history: &HistoryState,
    system: Option<&SystemInfo>,
    format: OutputFormat,
) -> CliResult<()> {
    let entries = &history.entries;
    let summary = stats::summarize(entries);
    let memory = system
        .and_then(|info| info.memory.percent)
        .map(stats::memory_pressure);
    let disk = system
        .and_then(|info| info.disk.percent)
        .map(stats::disk_pressure);
    match format {
        OutputFormat::Json => print_json(&json!({
            "analysed": entries.len(),
            "total": history.total,
            "summary": summary,
            "realtime_factor": summary.as_ref().and_then(stats::HistorySummary::realtime_factor),
            "models": stats::model_usage(entries),
            "languages": stats::language_usage(entries, Some(TOP_LANGUAGES)),
            "activity": stats::activity_by_day(entries),
            "durations": stats::duration_buckets(entries),
            "speed": stats::speed_trend(entries, SPEED_WINDOW),
            "memory_pressure": memory,
            "disk_pressure": disk,
        })),
        OutputFormat::Table => {
            let Some(summary) = summary else {
                println!("no generations yet");
                return Ok(());
            };
            println!("generations: {} of {}", summary.count, history.total);
            println!(
                "audio: {} (avg {})",
                format_stat_time(summary.total_audio_seconds),
                format_duration(summary.avg_duration_seconds)
            );
            println!(
                "compute: {} (avg {})",
                format_stat_time(summary.total_generation_seconds),
                format_stat_time(summary.avg_generation_seconds)
            );
            if let Some(factor) = summary.realtime_factor() {
                println!("realtime factor: {factor:.2}x");
            }
            println!(
                "words: {} (avg {}), characters: {}",
                summary.total_words, summary.avg_words, summary.total_chars
            );
            println!("models:");
            for usage in stats::model_usage(entries) {
                println!("  {:<20} {}", usage.label, usage.count);
            }
            println!("languages:");
            for usage in stats::language_usage(entries, Some(TOP_LANGUAGES)) {
                println!("  {:<20} {}", usage.label, usage.count);
            }
            println!("durations:");
            for bucket in stats::duration_buckets(entries) {
                println!("  {:<8} {}", bucket.label, bucket.count);
            }
            if let Some(level) = memory {
                println!("memory pressure: {level:?}");
            }
            if let Some(level) = disk {
                println!("disk pressure: {level:?}");
            }
            Ok(())
        }
    }
}

pub(crate) fn render_system(info: &SystemInfo, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(info),
        OutputFormat::Table => {
            println!("chip: {}", info.chip.as_deref().unwrap_or("unknown"));
            println!("os: {}", info.os.as_deref().unwrap_or("unknown"));
            println!(
                "cpu: {} cores ({} logical), {} busy",
                optional(info.cpu.cores_physical),
                optional(info.cpu.cores_logical),
                percent(info.cpu.usage_percent)
            );
            println!(
                "memory: {} used of {} ({})",
                gigabytes(info.memory.used_gb),
                gigabytes(info.memory.total_gb),
                percent(info.memory.percent)
            );
            println!(
                "disk: {} free of {} ({})",
                gigabytes(info.disk.free_gb),
                gigabytes(info.disk.total_gb),
                percent(info.disk.percent)
            );
            if let Some(cores) = info.gpu.cores {
                println!(
                    "gpu: {cores} cores, {} active, {} peak",
                    gigabytes(info.gpu.metal_active_gb),
                    gigabytes(info.gpu.metal_peak_gb)
                );
            }
            println!(
                "loaded model: {}",
                info.model
                    .loaded_variant
                    .as_ref()
                    .map_or_else(|| "none".to_string(), catalog::variant_label)
            );
            for (name, version) in &info.software {
                println!("  {name} {version}");
            }
            Ok(())
        }
    }
}

fn optional(value: Option<u32>) -> String {
    value.map_or_else(|| "?".to_string(), |value| value.to_string())
}

fn percent(value: Option<f64>) -> String {
    value.map_or_else(|| "?".to_string(), |value| format!("{value:.0}%"))
}

fn gigabytes(value: Option<f64>) -> String {
    value.map_or_else(|| "?".to_string(), |value| format!("{value:.1} GB"))
}

/// Human-readable lines for what changed between two snapshots.
pub(crate) fn describe_changes(prev: &AppStore, next: &AppStore) -> Vec<String> {
    let mut lines = Vec::new();
    for entry in ordered(&next.models) {
        let before = prev.models.by_variant.get(&entry.variant);
        let changed = before.is_none_or(|old| old.status != entry.status || old.error != entry.error);
        if !changed {
            continue;
        }
        let label = catalog::variant_label(&entry.variant);
        match &entry.error {
            Some(error) => lines.push(format!("{label}: {} ({error})", entry.status)),
            None => lines.push(format!("{label}: {}", entry.status)),
        }
    }
    if prev.models.selected != next.models.selected {
        lines.push(format!(
            "selected: {}",
            catalog::variant_label(&next.models.selected)
        ));
    }
    if prev.connection.state != next.connection.state {
        let state = next.connection.state.label();
        match &next.connection.last_error {
            Some(error) => lines.push(format!("push: {state} ({error})")),
            None => lines.push(format!("push: {state}")),
        }
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use loqui_api_models::{ModelStatus, ModelVariant};
    use loqui_sync::features::models::state::{ModelPatch, update_model_state};
    use loqui_sync::push::reconnect::ConnectionState;

    #[test]
    fn describe_changes_reports_status_selection_and_connection() {
        let prev = AppStore::default();
        let mut next = prev.clone();
        let qwen = ModelVariant::from("qwen-1.7b");
        update_model_state(
            &mut next.models,
            &qwen,
            ModelPatch::status(ModelStatus::Loaded),
        );
        next.models.selected = qwen;
        next.connection.state = ConnectionState::Connected;

        let lines = describe_changes(&prev, &next);
        assert_eq!(
            lines,
            vec![
                "Qwen 1.7B: loaded".to_string(),
                "selected: Qwen 1.7B".to_string(),
                format!("push: {}", ConnectionState::Connected.label()),
            ]
        );
    }

    #[test]
    fn describe_changes_includes_error_text() {
        let prev = AppStore::default();
        let mut next = prev.clone();
        let variant = ModelVariant::from("multilingual");
        update_model_state(
            &mut next.models,
            &variant,
            ModelPatch::status(ModelStatus::Error).with_error(Some("disk full".into())),
        );
        let lines = describe_changes(&prev, &next);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].ends_with("error (disk full)"));
        assert!(describe_changes(&next, &next).is_empty());
    }

    #[test]
    fn model_rows_mark_selection_and_progress() {
        let mut store = AppStore::default();
        let variant = ModelVariant::from(catalog::DEFAULT_VARIANT);
        update_model_state(
            &mut store.models,
            &variant,
            ModelPatch::status(ModelStatus::Downloading).with_progress(0.42),
        );
        let rows = model_rows(&store);
        let selected: Vec<&String> = rows.iter().filter(|row| row.starts_with('*')).collect();
        assert_eq!(selected.len(), 1);
        assert!(selected[0].contains("turbo-4bit"));
        assert!(selected[0].contains("downloading 42%"));
        assert_eq!(rows.len(), catalog::VARIANTS.len() + 1);
    }
}
