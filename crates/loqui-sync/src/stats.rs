//! Aggregations over the loaded history for the statistics views.
//!
//! Entries arrive newest first, as the history endpoint returns them.

use crate::catalog::{self, DEFAULT_LANGUAGE};
use chrono::NaiveDate;
use loqui_api_models::HistoryEntry;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// Entries plotted on the generation speed chart.
pub const SPEED_WINDOW: usize = 20;

/// Languages shown on the compact history dashboard.
pub const TOP_LANGUAGES: usize = 5;

/// Totals and averages across a set of entries.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct HistorySummary {
    /// Number of entries.
    pub count: usize,
    /// Sum of audio durations, in seconds.
    pub total_audio_seconds: f64,
    /// Sum of generation times, in seconds.
    pub total_generation_seconds: f64,
    /// Sum of whitespace-separated words.
    pub total_words: usize,
    /// Sum of characters.
    pub total_chars: usize,
    /// Mean words per entry, rounded.
    pub avg_words: usize,
    /// Mean audio duration.
    pub avg_duration_seconds: f64,
    /// Mean generation time.
    pub avg_generation_seconds: f64,
}

impl HistorySummary {
    /// Seconds of audio produced per second of compute, when any compute was spent.
    #[must_use]
    pub fn realtime_factor(&self) -> Option<f64> {
        (self.total_generation_seconds > 0.0)
            .then(|| self.total_audio_seconds / self.total_generation_seconds)
    }
}

/// A labelled tally.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct UsageCount {
    /// Raw key (variant id or language code).
    pub key: String,
    /// Display label.
    pub label: String,
    /// Occurrences.
    pub count: usize,
}

/// Generations on one UTC calendar day.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DayActivity {
    /// Day, UTC.
    pub day: NaiveDate,
    /// Generations that day.
    pub count: usize,
    /// Audio produced, rounded to a tenth of a second.
    pub audio_seconds: f64,
    /// Compute spent.
    pub generation_seconds: f64,
}

/// One bar of the duration histogram.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DurationBucket {
    /// Bar label.
    pub label: &'static str,
    /// Entries whose duration falls in the bucket.
    pub count: usize,
}

/// One point on the speed chart.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SpeedPoint {
    /// 1-based position, oldest first.
    pub index: usize,
    /// Generation time, rounded to a tenth.
    pub generation_seconds: f64,
    /// Audio duration, rounded to a tenth.
    pub duration_seconds: f64,
    /// Word count of the prompt.
    pub words: usize,
}

/// Load level for the system gauges.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Pressure {
    /// Comfortable.
    Normal,
    /// Worth watching.
    Elevated,
    /// Close to exhaustion.
    Critical,
}

const BUCKETS: [(&str, f64, f64); 5] = [
    ("0-5s", 0.0, 5.0),
    ("5-10s", 5.0, 10.0),
    ("10-20s", 10.0, 20.0),
    ("20-30s", 20.0, 30.0),
    ("30s+", 30.0, f64::INFINITY),
];

/// Whitespace-separated word count.
#[must_use]
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

fn round_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[allow(clippy::cast_precision_loss)]
fn ratio(total: f64, count: usize) -> f64 {
    total / count as f64
}

/// Totals and averages, or `None` for an empty history.
#[must_use]
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn summarize(entries: &[HistoryEntry]) -> Option<HistorySummary> {
    let count = entries.len();
    if count == 0 {
        return None;
    }
    let total_audio_seconds: f64 = entries.iter().map(|e| e.duration_seconds).sum();
    let total_generation_seconds: f64 = entries.iter().map(|e| e.generation_time_seconds).sum();
    let total_words: usize = entries.iter().map(|e| word_count(&e.text)).sum();
    let total_chars: usize = entries.iter().map(|e| e.text.chars().count()).sum();
    Some(HistorySummary {
        count,
        total_audio_seconds,
        total_generation_seconds,
        total_words,
        total_chars,
        avg_words: (total_words as f64 / count as f64).round() as usize,
        avg_duration_seconds: ratio(total_audio_seconds, count),
        avg_generation_seconds: ratio(total_generation_seconds, count),
    })
}

fn ranked(counts: HashMap<String, usize>, label: impl Fn(&str) -> String) -> Vec<UsageCount> {
    let mut rows: Vec<UsageCount> = counts
        .into_iter()
        .map(|(key, count)| UsageCount {
            label: label(&key),
            key,
            count,
        })
        .collect();
    rows.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.key.cmp(&b.key)));
    rows
}

/// Generations per model variant, most used first.
#[must_use]
pub fn model_usage(entries: &[HistoryEntry]) -> Vec<UsageCount> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for entry in entries {
        *counts.entry(entry.model_variant.to_string()).or_default() += 1;
    }
    ranked(counts, |key| catalog::variant_label(&key.into()))
}

/// Generations per language, most used first. Entries without a language count as
/// English. `top` keeps only the leading rows.
#[must_use]
pub fn language_usage(entries: &[HistoryEntry], top: Option<usize>) -> Vec<UsageCount> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for entry in entries {
        let code = entry
            .language
            .as_deref()
            .filter(|code| !code.is_empty())
            .unwrap_or(DEFAULT_LANGUAGE);
        *counts.entry(code.to_string()).or_default() += 1;
    }
    let mut rows = ranked(counts, |code| {
        catalog::language_name(code).map_or_else(|| code.to_string(), str::to_string)
    });
    if let Some(limit) = top {
        rows.truncate(limit);
    }
    rows
}

/// Per-day activity, oldest day first.
#[must_use]
pub fn activity_by_day(entries: &[HistoryEntry]) -> Vec<DayActivity> {
    let mut days: BTreeMap<NaiveDate, (usize, f64, f64)> = BTreeMap::new();
    for entry in entries {
        let slot = days.entry(entry.created_at.date_naive()).or_default();
        slot.0 += 1;
        slot.1 += entry.duration_seconds;
        slot.2 += entry.generation_time_seconds;
    }
    days.into_iter()
        .map(|(day, (count, audio, generation))| DayActivity {
            day,
            count,
            audio_seconds: round_tenth(audio),
            generation_seconds: generation,
        })
        .collect()
}

/// Duration histogram with fixed buckets.
#[must_use]
pub fn duration_buckets(entries: &[HistoryEntry]) -> Vec<DurationBucket> {
    let mut counts = [0usize; BUCKETS.len()];
    for entry in entries {
        if let Some(index) = BUCKETS
            .iter()
            .position(|(_, min, max)| entry.duration_seconds >= *min && entry.duration_seconds < *max)
        {
            counts[index] += 1;
        }
    }
    BUCKETS
        .iter()
        .zip(counts)
        .map(|((label, _, _), count)| DurationBucket {
            label: *label,
            count,
        })
        .collect()
}

/// The most recent `window` entries, oldest first, for the speed chart.
#[must_use]
pub fn speed_trend(entries: &[HistoryEntry], window: usize) -> Vec<SpeedPoint> {
    let take = entries.len().min(window);
    entries[..take]
        .iter()
        .rev()
        .enumerate()
        .map(|(index, entry)| SpeedPoint {
            index: index + 1,
            generation_seconds: round_tenth(entry.generation_time_seconds),
            duration_seconds: round_tenth(entry.duration_seconds),
            words: word_count(&entry.text),
        })
        .collect()
}

/// Memory gauge level: above 85% critical, above 70% elevated.
#[must_use]
pub fn memory_pressure(percent: f64) -> Pressure {
    pressure(percent, 70.0, 85.0)
}

/// Disk gauge level: above 90% critical, above 75% elevated.
#[must_use]
pub fn disk_pressure(percent: f64) -> Pressure {
    pressure(percent, 75.0, 90.0)
}

fn pressure(percent: f64, elevated: f64, critical: f64) -> Pressure {
    if percent > critical {
        Pressure::Critical
    } else if percent > elevated {
        Pressure::Elevated
    } else {
        Pressure::Normal
    }
}
