//! Display formatting shared by the views and the CLI.

use chrono::{DateTime, Utc};

/// `m:ss` for an audio duration in seconds. Negative or NaN input renders `0:00`.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn format_duration(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    };
    format!("{}:{:02}", total / 60, total % 60)
}

/// Relative age of a timestamp: `just now`, `5m ago`, `3h ago`, `2d ago`.
#[must_use]
pub fn format_time_ago(created_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let minutes = (now - created_at).num_minutes();
    if minutes < 1 {
        return "just now".to_string();
    }
    if minutes < 60 {
        return format!("{minutes}m ago");
    }
    let hours = minutes / 60;
    if hours < 24 {
        return format!("{hours}h ago");
    }
    format!("{}d ago", hours / 24)
}

/// Clip `text` to `max` characters, appending `...` when shortened.
#[must_use]
pub fn truncate_text(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut clipped: String = text.chars().take(max).collect();
    clipped.push_str("...");
    clipped
}

/// Compact seconds label for stat tiles: `4.2s`, `3m 12s`, `2h 5m`.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn format_stat_time(seconds: f64) -> String {
    if !seconds.is_finite() || seconds < 60.0 {
        return format!("{:.1}s", seconds.max(0.0));
    }
    let minutes = (seconds / 60.0).floor() as u64;
    let secs = (seconds % 60.0).round() as u64;
    if minutes < 60 {
        return format!("{minutes}m {secs}s");
    }
    format!("{}h {}m", minutes / 60, minutes % 60)
}

/// Download progress label from a `[0, 1]` fraction: `0.42` renders `42%`.
#[must_use]
pub fn format_progress(fraction: f64) -> String {
    let fraction = if fraction.is_finite() { fraction.clamp(0.0, 1.0) } else { 0.0 };
    format!("{:.0}%", fraction * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn durations_render_minutes_and_seconds() {
        assert_eq!(format_duration(0.0), "0:00");
        assert_eq!(format_duration(7.9), "0:07");
        assert_eq!(format_duration(125.2), "2:05");
        assert_eq!(format_duration(-3.0), "0:00");
        assert_eq!(format_duration(f64::NAN), "0:00");
    }

    #[test]
    fn ages_bucket_by_unit() {
        let now = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).single().expect("now");
        assert_eq!(format_time_ago(now - Duration::seconds(30), now), "just now");
        assert_eq!(format_time_ago(now - Duration::minutes(5), now), "5m ago");
        assert_eq!(format_time_ago(now - Duration::minutes(185), now), "3h ago");
        assert_eq!(format_time_ago(now - Duration::hours(50), now), "2d ago");
        assert_eq!(format_time_ago(now + Duration::minutes(2), now), "just now");
    }

    #[test]
    fn truncation_counts_characters() {
        assert_eq!(truncate_text("short", 60), "short");
        assert_eq!(truncate_text("héllo wörld", 5), "héllo...");
    }

    #[test]
    fn stat_time_switches_to_minutes() {
        assert_eq!(format_stat_time(4.24), "4.2s");
        assert_eq!(format_stat_time(192.0), "3m 12s");
        assert_eq!(format_stat_time(7_500.0), "2h 5m");
    }

    #[test]
    fn progress_scales_fraction_to_percent() {
        assert_eq!(format_progress(0.0), "0%");
        assert_eq!(format_progress(0.42), "42%");
        assert_eq!(format_progress(0.374), "37%");
        assert_eq!(format_progress(1.0), "100%");
        assert_eq!(format_progress(3.0), "100%");
        assert_eq!(format_progress(f64::NAN), "0%");
    }
}
