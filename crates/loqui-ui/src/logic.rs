//! Pure view logic shared by the components.

use loqui_api_models::{ModelState, ModelStatus};
use loqui_sync::catalog::MAX_TEXT_LENGTH;
use loqui_sync::config::DEFAULT_API_BASE;
use loqui_sync::format::format_progress;
use loqui_sync::features::generation::state::prepare_request;
use loqui_sync::push::ConnectionStatus;
use loqui_sync::push::reconnect::ConnectionState;
use loqui_sync::stats::Pressure;
use loqui_sync::transport::paths;
use loqui_sync::AppStore;

/// API base to use: a stored override when non-blank, else the same-origin default.
#[must_use]
pub fn resolve_api_base(stored: Option<&str>) -> String {
    stored
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map_or_else(|| DEFAULT_API_BASE.to_string(), |value| value.trim_end_matches('/').to_string())
}

/// WebSocket URL for the push channel.
///
/// Absolute bases keep their own host; relative bases are resolved against the
/// page's `protocol` (`http:`/`https:`) and `host`.
#[must_use]
pub fn push_url_for(protocol: &str, host: &str, api_base: &str) -> String {
    if let Some(url) = paths::push_url(api_base) {
        return url;
    }
    let scheme = if protocol.trim_end_matches(':') == "https" {
        "wss"
    } else {
        "ws"
    };
    let base = if api_base.starts_with('/') {
        api_base.to_string()
    } else {
        format!("/{api_base}")
    };
    paths::join(&format!("{scheme}://{host}{base}"), paths::PUSH)
}

/// Playable URL for a generated clip.
///
/// Root-relative URLs resolve against the API origin when the base is absolute.
#[must_use]
pub fn audio_src(api_base: &str, audio_url: &str) -> String {
    if audio_url.contains("://") || !audio_url.starts_with('/') {
        return audio_url.to_string();
    }
    let Some((scheme, rest)) = api_base.split_once("://") else {
        return audio_url.to_string();
    };
    let host = rest.split('/').next().unwrap_or(rest);
    format!("{scheme}://{host}{audio_url}")
}

/// Why the generate button is disabled, if it is.
#[must_use]
pub fn generate_hint(store: &AppStore) -> Option<String> {
    prepare_request(store).err().map(|reason| reason.to_string())
}

/// Character counter text and whether the limit is exceeded.
#[must_use]
pub fn char_counter(text: &str) -> (String, bool) {
    let len = text.chars().count();
    (format!("{len} / {MAX_TEXT_LENGTH}"), len > MAX_TEXT_LENGTH)
}

/// CSS modifier and label for a model status badge.
#[must_use]
pub fn status_badge(model: &ModelState) -> (&'static str, String) {
    let class = match model.status {
        ModelStatus::Loaded => "ok",
        ModelStatus::Error => "error",
        ModelStatus::Downloading | ModelStatus::Loading | ModelStatus::Unloading => "busy",
        ModelStatus::NotDownloaded | ModelStatus::Downloaded | ModelStatus::Unknown(_) => "idle",
    };
    let label = match model.status {
        ModelStatus::Downloading if model.download_progress > 0.0 => {
            format!("downloading {}", format_progress(model.download_progress))
        }
        ref status => status.as_str().replace('_', " "),
    };
    (class, label)
}

/// CSS modifier and label for the push connection badge.
#[must_use]
pub fn connection_badge(status: &ConnectionStatus) -> (&'static str, &'static str) {
    let class = match status.state {
        ConnectionState::Connected => "ok",
        ConnectionState::Connecting | ConnectionState::Waiting { .. } => "busy",
        ConnectionState::Disconnected | ConnectionState::Closed => "error",
    };
    (class, status.state.label())
}

/// CSS modifier for a resource gauge.
#[must_use]
pub const fn pressure_class(level: Pressure) -> &'static str {
    match level {
        Pressure::Normal => "ok",
        Pressure::Elevated => "busy",
        Pressure::Critical => "error",
    }
}

/// Whether a model row should offer a load action.
#[must_use]
pub fn can_load(model: &ModelState) -> bool {
    !model.status.is_busy() && model.status != ModelStatus::Loaded
}

#[cfg(test)]
mod tests {
    use super::*;
    use loqui_api_models::ModelVariant;
    use loqui_sync::features::models::state::{ModelPatch, update_model_state};

    #[test]
    fn api_base_falls_back_to_same_origin() {
        assert_eq!(resolve_api_base(None), "/api");
        assert_eq!(resolve_api_base(Some("  ")), "/api");
        assert_eq!(
            resolve_api_base(Some("http://studio.local:8000/api/")),
            "http://studio.local:8000/api"
        );
    }

    #[test]
    fn push_url_follows_page_scheme() {
        assert_eq!(
            push_url_for("https:", "tts.example", "/api"),
            "wss://tts.example/api/ws"
        );
        assert_eq!(
            push_url_for("http:", "localhost:5173", "api"),
            "ws://localhost:5173/api/ws"
        );
        assert_eq!(
            push_url_for("https:", "ignored", "http://10.0.0.2:8000/api"),
            "ws://10.0.0.2:8000/api/ws"
        );
    }

    #[test]
    fn audio_src_resolves_against_api_origin() {
        assert_eq!(audio_src("/api", "/audio/a.wav"), "/audio/a.wav");
        assert_eq!(
            audio_src("http://studio.local:8000/api", "/audio/a.wav"),
            "http://studio.local:8000/audio/a.wav"
        );
        assert_eq!(
            audio_src("http://studio.local:8000/api", "https://cdn.example/a.wav"),
            "https://cdn.example/a.wav"
        );
    }

    #[test]
    fn generate_hint_explains_blocked_form() {
        let mut store = AppStore::default();
        assert!(generate_hint(&store).is_some());

        let variant = store.models.selected.clone();
        update_model_state(
            &mut store.models,
            &variant,
            ModelPatch::status(ModelStatus::Loaded),
        );
        store.form.text = "Hello".into();
        assert_eq!(generate_hint(&store), None);
    }

    #[test]
    fn counter_flags_overflow() {
        assert_eq!(char_counter("abc"), ("3 / 5000".to_string(), false));
        assert!(char_counter(&"x".repeat(MAX_TEXT_LENGTH + 1)).1);
    }

    #[test]
    fn badges_reflect_status() {
        let mut model = ModelState::new(ModelVariant::from("turbo-8bit"));
        assert_eq!(status_badge(&model), ("idle", "not downloaded".to_string()));
        assert!(can_load(&model));

        model.status = ModelStatus::Downloading;
        model.download_progress = 0.374;
        assert_eq!(status_badge(&model), ("busy", "downloading 37%".to_string()));
        assert!(!can_load(&model));

        model.status = ModelStatus::Loaded;
        assert_eq!(status_badge(&model).0, "ok");
        assert!(!can_load(&model));

        let status = ConnectionStatus::default();
        assert_eq!(connection_badge(&status), ("error", "offline"));
        assert_eq!(pressure_class(Pressure::Critical), "error");
    }
}
