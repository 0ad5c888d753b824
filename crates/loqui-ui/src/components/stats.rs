use crate::logic::pressure_class;
use crate::store::UiStore;
use loqui_api_models::SystemInfo;
use loqui_sync::format::{format_duration, format_stat_time};
use loqui_sync::stats::{self, SPEED_WINDOW, TOP_LANGUAGES, UsageCount};
use yew::prelude::*;
use yewdux::prelude::use_selector;

#[function_component(StatsPanel)]
pub(crate) fn stats_panel() -> Html {
    let history = use_selector(|store: &UiStore| store.app.history.clone());
    let system = use_selector(|store: &UiStore| store.app.system.clone());
    let entries = &history.entries;

    let tiles = stats::summarize(entries).map_or_else(
        || html! { <p class="muted">{"Generate something to see statistics."}</p> },
        |summary| {
            let factor = summary
                .realtime_factor()
                .map_or_else(|| "-".to_string(), |factor| format!("{factor:.2}x"));
            html! {
                <div class="tiles">
                    {tile("Generations", summary.count.to_string())}
                    {tile("Audio", format_stat_time(summary.total_audio_seconds))}
                    {tile("Compute", format_stat_time(summary.total_generation_seconds))}
                    {tile("Realtime factor", factor)}
                    {tile("Avg clip", format_duration(summary.avg_duration_seconds))}
                    {tile("Avg words", summary.avg_words.to_string())}
                    {tile("Characters", summary.total_chars.to_string())}
                </div>
            }
        },
    );

    let speed = stats::speed_trend(entries, SPEED_WINDOW);
    let slowest = speed
        .iter()
        .map(|point| point.generation_seconds)
        .fold(0.0_f64, f64::max);

    html! {
        <div class="stats-panel">
            {tiles}
            <section>
                <h3>{"Models"}</h3>
                {bars(&stats::model_usage(entries))}
            </section>
            <section>
                <h3>{"Languages"}</h3>
                {bars(&stats::language_usage(entries, Some(TOP_LANGUAGES)))}
            </section>
            <section>
                <h3>{"Clip length"}</h3>
                <ul class="bars">
                    {for stats::duration_buckets(entries).iter().map(|bucket| {
                        bar(bucket.label, bucket.count, entries.len())
                    })}
                </ul>
            </section>
            <section>
                <h3>{"Daily activity"}</h3>
                <ul class="activity">
                    {for stats::activity_by_day(entries).iter().map(|day| html! {
                        <li>{format!("{} · {} clip(s) · {}", day.day, day.count, format_stat_time(day.audio_seconds))}</li>
                    })}
                </ul>
            </section>
            <section>
                <h3>{"Generation speed"}</h3>
                <div class="speed-chart">
                    {for speed.iter().map(|point| {
                        let height = if slowest > 0.0 { point.generation_seconds / slowest * 100.0 } else { 0.0 };
                        html! {
                            <span
                                class="speed-bar"
                                style={format!("height: {height:.0}%")}
                                title={format!("#{}: {:.1}s for {:.1}s of audio ({} words)", point.index, point.generation_seconds, point.duration_seconds, point.words)}
                            />
                        }
                    })}
                </div>
            </section>
            {(*system).as_ref().map_or_else(Html::default, system_gauges)}
        </div>
    }
}

fn tile(label: &'static str, value: String) -> Html {
    html! {
        <div class="tile">
            <span class="muted">{label}</span>
            <strong>{value}</strong>
        </div>
    }
}

fn bars(usage: &[UsageCount]) -> Html {
    let total: usize = usage.iter().map(|entry| entry.count).sum();
    html! {
        <ul class="bars">
            {for usage.iter().map(|entry| bar(&entry.label, entry.count, total))}
        </ul>
    }
}

#[allow(clippy::cast_precision_loss)]
fn bar(label: &str, count: usize, total: usize) -> Html {
    let width = if total == 0 {
        0.0
    } else {
        count as f64 / total as f64 * 100.0
    };
    html! {
        <li>
            <span class="bar-label">{label.to_string()}</span>
            <span class="bar" style={format!("width: {width:.0}%")} />
            <span class="bar-count">{count}</span>
        </li>
    }
}

fn system_gauges(info: &SystemInfo) -> Html {
    let gauge = |label: &'static str, percent: Option<f64>, level: fn(f64) -> stats::Pressure| {
        percent.map_or_else(Html::default, |percent| {
            html! {
                <div class={classes!("gauge", pressure_class(level(percent)))}>
                    <span>{label}</span>
                    <progress max="100" value={percent.to_string()} />
                    <span>{format!("{percent:.0}%")}</span>
                </div>
            }
        })
    };
    html! {
        <section class="system">
            <h3>{"System"}</h3>
            <p class="muted">
                {format!(
                    "{} · {}",
                    info.chip.as_deref().unwrap_or("unknown chip"),
                    info.os.as_deref().unwrap_or("unknown OS"),
                )}
            </p>
            {gauge("Memory", info.memory.percent, stats::memory_pressure)}
            {gauge("Disk", info.disk.percent, stats::disk_pressure)}
        </section>
    }
}
