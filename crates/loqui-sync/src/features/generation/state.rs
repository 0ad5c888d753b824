//! Generation form inputs and the pure readiness check.

use crate::catalog::{self, DEFAULT_LANGUAGE, MAX_TEXT_LENGTH};
use crate::store::AppStore;
use loqui_api_models::{GenerateRequest, GenerateResponse, ModelStatus, ModelVariant, ReferenceAudio};
use thiserror::Error;

/// Slider bounds for exaggeration.
pub const EXAGGERATION_RANGE: (f64, f64) = (0.25, 2.0);
/// Slider bounds for classifier-free guidance weight.
pub const CFG_WEIGHT_RANGE: (f64, f64) = (0.0, 1.0);
/// Slider bounds for sampling temperature.
pub const TEMPERATURE_RANGE: (f64, f64) = (0.05, 2.0);
/// Slider bounds for playback speed.
pub const SPEED_RANGE: (f64, f64) = (0.5, 2.0);

/// User inputs for the next generation.
#[derive(Clone, Debug, PartialEq)]
pub struct GenerationForm {
    /// Prompt text.
    pub text: String,
    /// Language code, used by multilingual variants only.
    pub language: String,
    /// Emotion exaggeration.
    pub exaggeration: f64,
    /// Guidance weight.
    pub cfg_weight: f64,
    /// Sampling temperature.
    pub temperature: f64,
    /// Speed factor.
    pub speed: f64,
    /// Reference voice clip.
    pub reference: Option<ReferenceAudio>,
    /// Transcript of the reference clip.
    pub ref_text: String,
}

impl Default for GenerationForm {
    fn default() -> Self {
        Self {
            text: String::new(),
            language: DEFAULT_LANGUAGE.to_string(),
            exaggeration: 0.5,
            cfg_weight: 0.5,
            temperature: 0.8,
            speed: 1.0,
            reference: None,
            ref_text: String::new(),
        }
    }
}

/// Submission status.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GenerationState {
    /// A request is in flight.
    pub in_flight: bool,
    /// Most recent successful result.
    pub last: Option<GenerateResponse>,
    /// Message from the most recent failure.
    pub error: Option<String>,
}

/// Why the form cannot be submitted right now.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BlockedReason {
    /// Prompt is blank.
    #[error("enter some text to speak")]
    EmptyText,
    /// Prompt is over the limit.
    #[error("text is {len} characters; the limit is {max}")]
    TextTooLong {
        /// Prompt length in characters.
        len: usize,
        /// Limit.
        max: usize,
    },
    /// Selected model is not loaded.
    #[error("model {0} is not loaded")]
    ModelNotLoaded(ModelVariant),
    /// A request is already in flight.
    #[error("a generation is already running")]
    AlreadyGenerating,
    /// Variant needs a reference clip and none is attached.
    #[error("model {0} needs a reference voice clip")]
    ReferenceRequired(ModelVariant),
}

/// Build the request for the current form, or explain why it cannot be sent.
///
/// # Errors
///
/// Returns the first [`BlockedReason`] that applies.
pub fn prepare_request(store: &AppStore) -> Result<GenerateRequest, BlockedReason> {
    let form = &store.form;
    let text = form.text.trim();
    if text.is_empty() {
        return Err(BlockedReason::EmptyText);
    }
    let len = text.chars().count();
    if len > MAX_TEXT_LENGTH {
        return Err(BlockedReason::TextTooLong {
            len,
            max: MAX_TEXT_LENGTH,
        });
    }
    if store.generation.in_flight {
        return Err(BlockedReason::AlreadyGenerating);
    }
    let variant = store.models.selected.clone();
    let loaded = store
        .models
        .by_variant
        .get(&variant)
        .is_some_and(|entry| entry.status == ModelStatus::Loaded);
    if !loaded {
        return Err(BlockedReason::ModelNotLoaded(variant));
    }
    if catalog::requires_reference(&variant) && form.reference.is_none() {
        return Err(BlockedReason::ReferenceRequired(variant));
    }
    let language = catalog::supports_language(&variant).then(|| form.language.clone());
    let ref_text = Some(form.ref_text.trim())
        .filter(|value| !value.is_empty() && form.reference.is_some())
        .map(str::to_string);
    Ok(GenerateRequest {
        text: text.to_string(),
        variant,
        language,
        exaggeration: form.exaggeration,
        cfg_weight: form.cfg_weight,
        temperature: form.temperature,
        speed: form.speed,
        reference_audio: form.reference.clone(),
        ref_text,
    })
}

/// Whether the generate button should be enabled.
#[must_use]
pub fn can_generate(store: &AppStore) -> bool {
    prepare_request(store).is_ok()
}

/// Mark a request as started.
pub fn begin(state: &mut GenerationState) {
    state.in_flight = true;
    state.error = None;
}

/// Record a successful result.
pub fn succeed(state: &mut GenerationState, response: GenerateResponse) {
    state.in_flight = false;
    state.last = Some(response);
}

/// Record a failure message.
pub fn fail(state: &mut GenerationState, message: String) {
    state.in_flight = false;
    state.error = Some(message);
}

/// Forget the last result and error.
pub fn clear(state: &mut GenerationState) {
    state.last = None;
    state.error = None;
}

/// Restore the form defaults.
pub fn reset_form(form: &mut GenerationForm) {
    *form = GenerationForm::default();
}

fn clamp(value: f64, (min, max): (f64, f64)) -> f64 {
    if value.is_nan() { min } else { value.clamp(min, max) }
}

/// Set the prompt text.
pub fn set_text(form: &mut GenerationForm, text: impl Into<String>) {
    form.text = text.into();
}

/// Set the language code.
pub fn set_language(form: &mut GenerationForm, code: impl Into<String>) {
    form.language = code.into();
}

/// Set exaggeration, clamped to its slider range.
pub fn set_exaggeration(form: &mut GenerationForm, value: f64) {
    form.exaggeration = clamp(value, EXAGGERATION_RANGE);
}

/// Set guidance weight, clamped to its slider range.
pub fn set_cfg_weight(form: &mut GenerationForm, value: f64) {
    form.cfg_weight = clamp(value, CFG_WEIGHT_RANGE);
}

/// Set temperature, clamped to its slider range.
pub fn set_temperature(form: &mut GenerationForm, value: f64) {
    form.temperature = clamp(value, TEMPERATURE_RANGE);
}

/// Set speed, clamped to its slider range.
pub fn set_speed(form: &mut GenerationForm, value: f64) {
    form.speed = clamp(value, SPEED_RANGE);
}

/// Attach or remove the reference clip.
pub fn set_reference(form: &mut GenerationForm, reference: Option<ReferenceAudio>) {
    form.reference = reference;
}

/// Set the reference transcript.
pub fn set_ref_text(form: &mut GenerationForm, text: impl Into<String>) {
    form.ref_text = text.into();
}

/// Whether a file looks like audio, by MIME type or extension.
#[must_use]
pub fn is_audio_file(file_name: &str, content_type: Option<&str>) -> bool {
    if content_type.is_some_and(|mime| mime.starts_with("audio/")) {
        return true;
    }
    file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .is_some_and(|ext| matches!(ext.as_str(), "wav" | "mp3" | "flac" | "ogg" | "m4a"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::models::state::{ModelPatch, update_model_state};

    fn ready_store(variant: &str) -> AppStore {
        let mut store = AppStore::default();
        let variant = ModelVariant::from(variant);
        update_model_state(
            &mut store.models,
            &variant,
            ModelPatch::status(ModelStatus::Loaded),
        );
        store.models.selected = variant;
        store.form.text = "  Hello world  ".into();
        store
    }

    fn clip() -> ReferenceAudio {
        ReferenceAudio {
            file_name: "me.wav".into(),
            content_type: Some("audio/wav".into()),
            bytes: vec![0; 4],
        }
    }

    #[test]
    fn ready_form_builds_trimmed_request() {
        let request = prepare_request(&ready_store("turbo-4bit")).expect("request");
        assert_eq!(request.text, "Hello world");
        assert_eq!(request.language, None);
        assert!((request.temperature - 0.8).abs() < f64::EPSILON);
    }

    #[test]
    fn language_only_for_multilingual_variants() {
        let mut store = ready_store("qwen-1.7b");
        store.form.language = "fr".into();
        let request = prepare_request(&store).expect("request");
        assert_eq!(request.language.as_deref(), Some("fr"));
    }

    #[test]
    fn guards_block_in_order() {
        let mut store = ready_store("turbo-4bit");
        store.form.text = "   ".into();
        assert_eq!(prepare_request(&store), Err(BlockedReason::EmptyText));

        store.form.text = "x".repeat(MAX_TEXT_LENGTH + 1);
        assert!(matches!(
            prepare_request(&store),
            Err(BlockedReason::TextTooLong { .. })
        ));

        store.form.text = "hi".into();
        store.generation.in_flight = true;
        assert_eq!(prepare_request(&store), Err(BlockedReason::AlreadyGenerating));

        store.generation.in_flight = false;
        store.models.selected = ModelVariant::from("turbo-8bit");
        assert_eq!(
            prepare_request(&store),
            Err(BlockedReason::ModelNotLoaded(ModelVariant::from("turbo-8bit")))
        );
    }

    #[test]
    fn multilingual_requires_reference() {
        let mut store = ready_store("multilingual");
        assert!(!can_generate(&store));
        store.form.reference = Some(clip());
        store.form.ref_text = " transcript ".into();
        let request = prepare_request(&store).expect("request");
        assert_eq!(request.ref_text.as_deref(), Some("transcript"));
        assert_eq!(request.language.as_deref(), Some("en"));
    }

    #[test]
    fn lifecycle_and_reset() {
        let mut state = GenerationState {
            error: Some("old".into()),
            ..GenerationState::default()
        };
        begin(&mut state);
        assert!(state.in_flight);
        assert!(state.error.is_none());
        fail(&mut state, "boom".into());
        assert!(!state.in_flight);
        assert_eq!(state.error.as_deref(), Some("boom"));
        clear(&mut state);
        assert!(state.error.is_none());

        let mut form = GenerationForm::default();
        set_text(&mut form, "abc");
        set_temperature(&mut form, 9.0);
        set_exaggeration(&mut form, f64::NAN);
        assert!((form.temperature - 2.0).abs() < f64::EPSILON);
        assert!((form.exaggeration - 0.25).abs() < f64::EPSILON);
        reset_form(&mut form);
        assert_eq!(form, GenerationForm::default());
    }

    #[test]
    fn audio_detection() {
        assert!(is_audio_file("voice.WAV", None));
        assert!(is_audio_file("clip", Some("audio/ogg")));
        assert!(!is_audio_file("notes.txt", Some("text/plain")));
    }
}
