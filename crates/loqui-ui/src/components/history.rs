use crate::app::UiCtx;
use crate::logic::audio_src;
use crate::models::ToastKind;
use crate::store::UiStore;
use chrono::Utc;
use loqui_api_models::HistoryEntry;
use loqui_sync::catalog;
use loqui_sync::format::{format_duration, format_time_ago, truncate_text};
use yew::prelude::*;
use yewdux::prelude::use_selector;

const PREVIEW_CHARS: usize = 120;

#[function_component(HistoryPanel)]
pub(crate) fn history_panel() -> Html {
    let ctx = use_context::<UiCtx>();
    let history = use_selector(|store: &UiStore| store.app.history.clone());
    let loading = use_state(|| false);
    let Some(ctx) = ctx else {
        return Html::default();
    };

    let on_delete = {
        let ctx = ctx.clone();
        Callback::from(move |id: String| {
            let ctx = ctx.clone();
            yew::platform::spawn_local(async move {
                if let Err(err) = ctx.history().delete_entry(&id).await {
                    ctx.error(format!("Could not delete: {err}"));
                }
            });
        })
    };
    let on_more = {
        let ctx = ctx.clone();
        let loading = loading.clone();
        Callback::from(move |_| {
            let ctx = ctx.clone();
            let loading = loading.clone();
            loading.set(true);
            yew::platform::spawn_local(async move {
                if let Err(err) = ctx.history().load_more().await {
                    ctx.error(format!("Could not load more: {err}"));
                }
                loading.set(false);
            });
        })
    };
    let on_refresh = {
        let ctx = ctx.clone();
        Callback::from(move |_| {
            let ctx = ctx.clone();
            yew::platform::spawn_local(async move {
                if let Err(err) = ctx.history().refresh().await {
                    ctx.error(format!("Could not refresh history: {err}"));
                }
            });
        })
    };
    let on_clear = {
        let ctx = ctx.clone();
        Callback::from(move |_| {
            if !gloo::dialogs::confirm("Delete every generation? This cannot be undone.") {
                return;
            }
            let ctx = ctx.clone();
            yew::platform::spawn_local(async move {
                match ctx.history().clear_all().await {
                    Ok(deleted) => {
                        ctx.toast(ToastKind::Success, format!("Deleted {deleted} generation(s)"));
                    }
                    Err(err) => ctx.error(format!("Could not clear history: {err}")),
                }
            });
        })
    };

    let now = Utc::now();
    let api_base = ctx.config.api_base.clone();
    html! {
        <div class="history-panel">
            <div class="toolbar">
                <span class="muted">{format!("{} of {}", history.entries.len(), history.total)}</span>
                <button class="ghost" onclick={on_refresh}>{"Refresh"}</button>
                if !history.entries.is_empty() {
                    <button class="ghost danger" onclick={on_clear}>{"Clear all"}</button>
                }
            </div>
            if history.entries.is_empty() {
                <p class="muted">{"No generations yet."}</p>
            }
            <ul class="history-list">
                {for history.entries.iter().map(|entry| render_entry(entry, &api_base, now, &on_delete))}
            </ul>
            if history.has_more() {
                <button onclick={on_more} disabled={*loading}>
                    {if *loading { "Loading..." } else { "Load more" }}
                </button>
            }
        </div>
    }
}

fn render_entry(
    entry: &HistoryEntry,
    api_base: &str,
    now: chrono::DateTime<Utc>,
    on_delete: &Callback<String>,
) -> Html {
    let delete = {
        let on_delete = on_delete.clone();
        let id = entry.id.clone();
        Callback::from(move |_| on_delete.emit(id.clone()))
    };
    let language = entry
        .language
        .as_deref()
        .map(|code| catalog::language_name(code).unwrap_or(code));
    let mut meta = vec![
        catalog::variant_label(&entry.model_variant),
        format_duration(entry.duration_seconds),
        format_time_ago(entry.created_at, now),
    ];
    if let Some(language) = language {
        meta.insert(1, language.to_string());
    }

    html! {
        <li class="history-entry">
            <p title={entry.text.clone()}>{truncate_text(&entry.text, PREVIEW_CHARS)}</p>
            <p class="muted">{meta.join(" · ")}</p>
            <audio controls=true preload="none" src={audio_src(api_base, &entry.audio_url)} />
            <button class="ghost danger" onclick={delete}>{"Delete"}</button>
        </li>
    }
}
